//! Line parsers for msh 4.1 ascii files
//!
//! Every section of a msh file is made of whitespace separated fields, one
//! record per line. The parsers here only look at the start of a line, so any
//! trailing fields the reader does not care about (bounding surfaces,
//! parametric coordinates, etc...) are simply left unconsumed.

// internal modules
use crate::mesh::Tag;

// external crates
use nom::bytes::complete::{take_till1, take_until};
use nom::character::complete::{char, i32, i64, space0, space1, u32, u64};
use nom::combinator::{map, opt};
use nom::multi::count;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;

/// $MeshFormat open marker
pub const MESH_FORMAT: &str = "$MeshFormat";
/// $MeshFormat close marker
pub const END_MESH_FORMAT: &str = "$EndMeshFormat";
/// $Entities open marker
pub const ENTITIES: &str = "$Entities";
/// $Entities close marker
pub const END_ENTITIES: &str = "$EndEntities";
/// $PhysicalNames open marker
pub const PHYSICAL_NAMES: &str = "$PhysicalNames";
/// $PhysicalNames close marker
pub const END_PHYSICAL_NAMES: &str = "$EndPhysicalNames";
/// $Nodes open marker
pub const NODES: &str = "$Nodes";
/// $Nodes close marker
pub const END_NODES: &str = "$EndNodes";
/// $Elements open marker
pub const ELEMENTS: &str = "$Elements";
/// $Elements close marker
pub const END_ELEMENTS: &str = "$EndElements";

/// Gmsh element type code for 4-node tetrahedra
pub const TETRAHEDRON_TYPE: i32 = 4;

/// Quick check for a section marker, ignoring trailing whitespace
pub fn is_marker(line: &str, marker: &str) -> bool {
    line.trim_end() == marker
}

/// Any whitespace separated token
fn token(i: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(i)
}

/// `<version> <file-type> <data-size>`
///
/// The version is kept as text so that anything unexpected can be reported
/// exactly as written.
pub fn mesh_format(i: &str) -> IResult<&str, (&str, i32, i32)> {
    tuple((
        preceded(space0, token),
        preceded(space1, i32),
        preceded(space1, i32),
    ))(i)
}

/// `<numPoints> <numCurves> <numSurfaces> <numVolumes>`
pub fn entity_counts(i: &str) -> IResult<&str, [i64; 4]> {
    map(
        tuple((
            preceded(space0, i64),
            preceded(space1, i64),
            preceded(space1, i64),
            preceded(space1, i64),
        )),
        |(p, c, s, v)| [p, c, s, v],
    )(i)
}

/// Leading fields of a 3D entity
///
/// `<tag> <minX> <minY> <minZ> <maxX> <maxY> <maxZ> <numPhysicalTags> <physicalTag> ...`
///
/// The bounding box is discarded. Only the first physical tag is returned,
/// and only if there is one to read.
pub fn volume_entity(i: &str) -> IResult<&str, (Tag, u64, Option<Tag>)> {
    map(
        tuple((
            preceded(space0, u32),
            count(preceded(space1, double), 6),
            preceded(space1, u64),
            opt(preceded(space1, u32)),
        )),
        |(tag, _, n_groups, group)| (tag, n_groups, group),
    )(i)
}

/// `<numPhysicalNames>`
pub fn physical_name_count(i: &str) -> IResult<&str, u64> {
    preceded(space0, u64)(i)
}

/// Leading `<dimension> <tag>` of a physical name line
pub fn physical_name_dim_tag(i: &str) -> IResult<&str, (i32, Tag)> {
    tuple((preceded(space0, i32), preceded(space1, u32)))(i)
}

/// Text between the first pair of double quotes
///
/// Fails if there is no opening or no closing quote. An empty name parses
/// fine and is left for the caller to reject.
pub fn quoted_name(i: &str) -> IResult<&str, &str> {
    preceded(
        take_until("\""),
        delimited(char('"'), take_until("\""), char('"')),
    )(i)
}

/// `<numEntityBlocks> <numRecords> <minTag> <maxTag>`
///
/// Shared by the $Nodes and $Elements section headers.
pub fn bloc_section_header(i: &str) -> IResult<&str, (u64, u64, u64, u64)> {
    tuple((
        preceded(space0, u64),
        preceded(space1, u64),
        preceded(space1, u64),
        preceded(space1, u64),
    ))(i)
}

/// `<entityDim> <entityTag> <parametric|elementType> <numRecordsInBlock>`
///
/// Node blocs put the parametric flag third, element blocs the element type.
pub fn bloc_header(i: &str) -> IResult<&str, (i32, i32, i32, u64)> {
    tuple((
        preceded(space0, i32),
        preceded(space1, i32),
        preceded(space1, i32),
        preceded(space1, u64),
    ))(i)
}

/// `<nodeTag>`
pub fn node_tag(i: &str) -> IResult<&str, u64> {
    preceded(space0, u64)(i)
}

/// `<x> <y> <z>`, ignoring any trailing parametric coordinates
pub fn coordinates(i: &str) -> IResult<&str, [f64; 3]> {
    map(
        tuple((
            preceded(space0, double),
            preceded(space1, double),
            preceded(space1, double),
        )),
        |(x, y, z)| [x, y, z],
    )(i)
}

/// `<elementTag> <nodeTag> <nodeTag> <nodeTag> <nodeTag>`
pub fn tetrahedron(i: &str) -> IResult<&str, (Tag, [Tag; 4])> {
    map(
        tuple((
            preceded(space0, u32),
            preceded(space1, u32),
            preceded(space1, u32),
            preceded(space1, u32),
            preceded(space1, u32),
        )),
        |(tag, a, b, c, d)| (tag, [a, b, c, d]),
    )(i)
}
