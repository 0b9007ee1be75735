// internal modules
use crate::error::MshError;
use crate::mesh::{Element, Medium, Mesh, Node, Tag};
use crate::readers::parsers::{self, *};
use crate::utils::*;

// standard library
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

// external crates
use anyhow::{anyhow, bail, Context, Result};
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, trace, warn};
use nom::IResult;

/// A reader for Gmsh msh 4.1 ascii files of tetrahedral meshes
///
/// The reader makes a single pass over the file:
///     - Check the $MeshFormat header is version 4.1 ascii
///     - Route each section marker to the matching section parser
///     - Cross check the sections and assemble the final [Mesh]
///
/// Notes:
///     - Sections may come in any order after the header
///     - Only 3D volumes, 3D physical groups and tetrahedra are kept
///     - 0D/1D/2D entities and element blocs are skipped
///     - Any 3D element other than a 4-node tetrahedron is an error
///     - A second $MeshFormat marker ends the pass without error
///
/// Example:
/// ```ignore
///     let path = Path::new(path);
///     let mut reader = MshReader::new();
///     let mesh = reader.parse(path).unwrap();
/// ```
#[derive(Debug)]
pub struct MshReader {
    /// 3D entities from $Entities
    volumes: Vec<Volume>,
    /// 3D groups from $PhysicalNames
    groups: Vec<PhysicalGroup>,
    /// Every node from $Nodes
    nodes: Vec<Node>,
    /// Tetrahedra from $Elements, still referencing volumes
    elements: Vec<RawTetrahedron>,
    /// Disable progress bar?
    disable_progress: bool,
}

impl Default for MshReader {
    fn default() -> Self {
        Self {
            volumes: Vec::new(),
            groups: Vec::new(),
            nodes: Vec::new(),
            elements: Vec::new(),
            disable_progress: false,
        }
    }
}

/// High level methods
impl MshReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Parses a complete mesh from the msh file at `path`
    pub fn parse(&mut self, path: &Path) -> Result<Mesh> {
        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        debug!("Reading {}", path.display());
        self.parse_reader(BufReader::new(file))
    }

    /// Parses a complete mesh from anything line-readable
    ///
    /// Either a fully validated [Mesh] comes back, or nothing does.
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<Mesh> {
        self.clear();
        let mut lines = LineSource::new(reader, self.init_progress_bar()?);

        if !self.disable_progress {
            lines.progress.refresh()?;
        }

        let version = Self::read_version(&mut lines)?;

        let mesh = match version {
            MshVersion::V41 => self
                .read_body(&mut lines)
                .and_then(|_| self.assemble())
                .context("msh 4.1 parsing failed")?,
        };

        // need an extra line for clean spacing if the progress bar is printed
        if !self.disable_progress {
            eprintln!()
        };

        debug!(
            "Mesh assembled: {} tetrahedra, {} nodes, {} media",
            mesh.elements.len(),
            mesh.nodes.len(),
            mesh.media.len()
        );

        Ok(mesh)
    }

    /// Do not print the kdam progress indicators
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    /// Forget anything left over from a previous parse
    fn clear(&mut self) {
        self.volumes.clear();
        self.groups.clear();
        self.nodes.clear();
        self.elements.clear();
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self) -> Result<Bar> {
        BarBuilder::default()
            .delay(0.0)
            .unit(" lines")
            .unit_scale(true)
            .disable(self.disable_progress)
            .build()
            .map_err(|e| anyhow!(e))
    }
}

/// Header and section dispatch
impl MshReader {
    /// Check the $MeshFormat block at the very start of the file
    fn read_version<R: BufRead>(lines: &mut LineSource<R>) -> Result<MshVersion> {
        lines.expect_header_marker(MESH_FORMAT)?;

        let line = lines.expect_header_line("msh version")?;
        let (version, file_type, data_size) = match parsers::mesh_format(&line) {
            Ok((_, fields)) => fields,
            Err(_) => {
                return Err(lines.fail(MshError::MalformedHeader(f!(
                    "failed to parse msh version from `{}`",
                    line.trim_end()
                ))))
            }
        };

        if version != "4.1" {
            bail!(MshError::UnsupportedVersion(version.to_string()));
        }

        match file_type {
            0 => (),
            1 => bail!(MshError::BinaryEncoding),
            other => bail!(MshError::UnknownFileType(other)),
        }

        if data_size != 8 {
            bail!(MshError::UnsupportedDataSize(data_size));
        }

        lines.expect_header_marker(END_MESH_FORMAT)?;

        debug!("Found msh {version} ascii header");
        Ok(MshVersion::V41)
    }

    /// Single pass over the rest of the file, routing sections to parsers
    fn read_body<R: BufRead>(&mut self, lines: &mut LineSource<R>) -> Result<()> {
        while let Some(line) = lines.next_line()? {
            match line.trim_end() {
                // stop reading if we hit another mesh file
                MESH_FORMAT => {
                    debug!("Second {MESH_FORMAT} on line {}, stopping", lines.number);
                    break;
                }
                ENTITIES => {
                    let volumes =
                        Self::read_entities(lines).context("$Entities section parsing failed")?;
                    Self::replace_section(&mut self.volumes, volumes, ENTITIES);
                }
                PHYSICAL_NAMES => {
                    let groups = Self::read_physical_names(lines)
                        .context("$PhysicalNames section parsing failed")?;
                    Self::replace_section(&mut self.groups, groups, PHYSICAL_NAMES);
                }
                NODES => {
                    let nodes = Self::read_nodes(lines).context("$Nodes section parsing failed")?;
                    Self::replace_section(&mut self.nodes, nodes, NODES);
                }
                ELEMENTS => {
                    let elements =
                        Self::read_elements(lines).context("$Elements section parsing failed")?;
                    Self::replace_section(&mut self.elements, elements, ELEMENTS);
                }
                other => trace!("[Ignored] {other}"),
            }
        }
        Ok(())
    }

    /// The last occurrence of a section wins
    fn replace_section<T>(current: &mut Vec<T>, new: Vec<T>, marker: &str) {
        if !current.is_empty() {
            warn!("Repeated {marker} section, replacing the earlier one");
        }
        *current = new;
    }
}

/// $Entities and $PhysicalNames
impl MshReader {
    /// Returns the 3D volumes, each with exactly one physical group
    fn read_entities<R: BufRead>(lines: &mut LineSource<R>) -> Result<Vec<Volume>> {
        let line = lines.expect_line("entity counts")?;
        let counts = lines.parse(&line, "entity counts", parsers::entity_counts)?;

        for (what, count) in ["point", "curve", "surface", "volume"].into_iter().zip(counts) {
            if count < 0 {
                return Err(lines.fail(MshError::NegativeCount { what, count }));
            }
        }

        let [n_points, n_curves, n_surfaces, n_volumes] = counts;
        if n_volumes == 0 {
            return Err(lines.fail(MshError::NoVolumes));
        }

        let n_lower = n_points
            .checked_add(n_curves)
            .and_then(|n| n.checked_add(n_surfaces))
            .ok_or_else(|| {
                lines.fail(MshError::CountOverflow {
                    what: "entity",
                    counts,
                })
            })?;

        // skip to 3d entities
        for _ in 0..n_lower {
            lines.expect_line("lower dimensional entity")?;
        }

        let mut volumes = Vec::new();
        loop {
            let line = lines.expect_line(END_ENTITIES)?;
            if is_marker(&line, END_ENTITIES) {
                break;
            }

            let (tag, n_groups, group) = lines.parse(&line, "3D volume", parsers::volume_entity)?;
            let group = match (n_groups, group) {
                (0, _) => return Err(lines.fail(MshError::VolumeWithoutGroup(tag))),
                (1, Some(group)) => group,
                (1, None) => return Err(lines.malformed("volume physical group", &line)),
                _ => return Err(lines.fail(MshError::VolumeWithManyGroups(tag))),
            };

            trace!("[Volume] {tag} -> group {group}");
            volumes.push(Volume { tag, group });
        }

        if volumes.len() != n_volumes as usize {
            bail!(MshError::CountMismatch {
                what: "volumes",
                expected: n_volumes as usize,
                found: volumes.len(),
            });
        }

        if let Some(tag) = first_duplicate_tag(&volumes) {
            bail!(MshError::DuplicateTag { kind: "volume", tag });
        }

        debug!("Read {} volumes", volumes.len());
        Ok(volumes)
    }

    /// Returns the 3D physical groups, any other dimension is skipped
    fn read_physical_names<R: BufRead>(lines: &mut LineSource<R>) -> Result<Vec<PhysicalGroup>> {
        // this is the total number of groups, not just 3D groups
        let line = lines.expect_line("physical name count")?;
        let n_names = lines.parse(&line, "physical name count", parsers::physical_name_count)?;

        let mut groups = Vec::new();
        let mut n_read: u64 = 0;
        loop {
            let line = lines.expect_line(END_PHYSICAL_NAMES)?;
            if is_marker(&line, END_PHYSICAL_NAMES) {
                break;
            }
            n_read += 1;

            let (dim, tag) = lines.parse(&line, "physical group", parsers::physical_name_dim_tag)?;
            if dim != 3 {
                trace!("[Skipped] {line}");
                continue;
            }

            let name = Self::group_name(&line).map_err(|e| lines.fail(e))?;
            trace!("[Group] {tag} \"{name}\"");
            groups.push(PhysicalGroup {
                tag,
                name: name.to_string(),
            });
        }

        if n_read != n_names {
            warn!("Expected {n_names} physical names, found {n_read}");
        }

        if let Some(tag) = first_duplicate_tag(&groups) {
            bail!(MshError::DuplicateTag {
                kind: "physical group",
                tag
            });
        }

        debug!("Read {} 3D physical groups", groups.len());
        Ok(groups)
    }

    /// The name between the first pair of double quotes, which can't be empty
    fn group_name(line: &str) -> std::result::Result<&str, MshError> {
        if !line.contains('"') {
            return Err(MshError::UnquotedGroupName(line.to_string()));
        }
        match parsers::quoted_name(line) {
            Ok((_, "")) => Err(MshError::EmptyGroupName(line.to_string())),
            Ok((_, name)) => Ok(name),
            Err(_) => Err(MshError::UnterminatedGroupName(line.to_string())),
        }
    }
}

/// $Nodes
impl MshReader {
    /// Returns every node of every bloc, node tags are unique
    fn read_nodes<R: BufRead>(lines: &mut LineSource<R>) -> Result<Vec<Node>> {
        let line = lines.expect_line("$Nodes metadata")?;
        let (n_blocs, n_nodes, _, max_tag) =
            lines.parse(&line, "$Nodes metadata", parsers::bloc_section_header)?;

        if max_tag > Tag::MAX as u64 {
            return Err(lines.fail(MshError::TagOverflow(max_tag)));
        }

        let mut nodes = Vec::new();
        for _ in 0..n_blocs {
            let mut bloc = Self::read_node_bloc(lines)?;
            nodes.append(&mut bloc);
        }

        if nodes.len() as u64 != n_nodes {
            bail!(MshError::CountMismatch {
                what: "nodes",
                expected: n_nodes as usize,
                found: nodes.len(),
            });
        }

        lines.expect_marker(END_NODES)?;

        if let Some(tag) = first_duplicate_tag(&nodes) {
            bail!(MshError::DuplicateTag { kind: "node", tag });
        }

        debug!("Read {} nodes", nodes.len());
        Ok(nodes)
    }

    /// A bloc header followed by all node tags, then all coordinates
    fn read_node_bloc<R: BufRead>(lines: &mut LineSource<R>) -> Result<Vec<Node>> {
        let line = lines.expect_line("node bloc header")?;
        let (dim, entity, _, n_nodes) = lines.parse(&line, "node bloc header", parsers::bloc_header)?;

        if !(0..=3).contains(&dim) {
            return Err(lines.fail(MshError::InvalidDimension { dim, entity }));
        }

        Self::read_node_records(lines, n_nodes)
            .with_context(|| f!("Node bloc parsing failed for entity {entity} (dimension {dim})"))
    }

    /// Two-phase layout, the n tag lines come before the n coordinate lines
    fn read_node_records<R: BufRead>(lines: &mut LineSource<R>, n_nodes: u64) -> Result<Vec<Node>> {
        let mut bloc = Vec::new();
        for _ in 0..n_nodes {
            let line = lines.expect_line("node tag")?;
            let tag = lines.parse(&line, "node tag", parsers::node_tag)?;
            let tag = Tag::try_from(tag).map_err(|_| lines.fail(MshError::TagOverflow(tag)))?;
            bloc.push(Node::new(tag, 0.0, 0.0, 0.0));
        }

        for node in bloc.iter_mut() {
            let line = lines.expect_line("node coordinates")?;
            let [x, y, z] = lines.parse(&line, "node coordinates", parsers::coordinates)?;
            node.x = x;
            node.y = y;
            node.z = z;
        }

        trace!("[Node bloc] {} nodes", bloc.len());
        Ok(bloc)
    }
}

/// $Elements
impl MshReader {
    /// Returns the tetrahedra of all 3D blocs, element tags are unique
    fn read_elements<R: BufRead>(lines: &mut LineSource<R>) -> Result<Vec<RawTetrahedron>> {
        let line = lines.expect_line("$Elements metadata")?;
        let (n_blocs, n_elements, _, _) =
            lines.parse(&line, "$Elements metadata", parsers::bloc_section_header)?;

        let mut elements = Vec::new();
        for _ in 0..n_blocs {
            let mut bloc = Self::read_element_bloc(lines)?;
            elements.append(&mut bloc);
        }

        // can't check against n_elements because it counts every dimension
        lines.expect_marker(END_ELEMENTS)?;

        if elements.is_empty() {
            bail!(MshError::EmptySection("tetrahedral elements"));
        }

        if let Some(tag) = first_duplicate_tag(&elements) {
            bail!(MshError::DuplicateTag {
                kind: "tetrahedron",
                tag
            });
        }

        debug!(
            "Read {} tetrahedra out of {} elements",
            elements.len(),
            n_elements
        );
        Ok(elements)
    }

    /// Tetrahedra of a 3D bloc, nothing for lower dimensional blocs
    fn read_element_bloc<R: BufRead>(lines: &mut LineSource<R>) -> Result<Vec<RawTetrahedron>> {
        let line = lines.expect_line("element bloc header")?;
        let (dim, entity, element_type, n_elements) =
            lines.parse(&line, "element bloc header", parsers::bloc_header)?;

        if !(0..=3).contains(&dim) {
            return Err(lines.fail(MshError::InvalidDimension { dim, entity }));
        }

        // skip 0, 1, 2d element blocs
        if dim != 3 {
            for _ in 0..n_elements {
                lines.expect_line("element")?;
            }
            trace!("[Skipped] {n_elements} elements of {dim}D entity {entity}");
            return Ok(Vec::new());
        }

        // a partial mesh would silently leave holes in the geometry
        if element_type != TETRAHEDRON_TYPE {
            return Err(lines.fail(MshError::UnsupportedElementType {
                element_type,
                entity,
            }));
        }

        let volume = Tag::try_from(entity).map_err(|_| lines.malformed("volume entity tag", &line))?;

        Self::read_tetrahedron_records(lines, volume, n_elements)
            .with_context(|| f!("Element bloc parsing failed for entity {entity}"))
    }

    /// One `<tag> <a> <b> <c> <d>` line per tetrahedron
    fn read_tetrahedron_records<R: BufRead>(
        lines: &mut LineSource<R>,
        volume: Tag,
        n_elements: u64,
    ) -> Result<Vec<RawTetrahedron>> {
        let mut bloc = Vec::new();
        for _ in 0..n_elements {
            let line = lines.expect_line("tetrahedron")?;
            let (tag, nodes) = lines.parse(&line, "tetrahedron", parsers::tetrahedron)?;
            bloc.push(RawTetrahedron { tag, volume, nodes });
        }
        trace!("[Tetrahedra] {} in volume {volume}", bloc.len());
        Ok(bloc)
    }
}

/// Mesh assembly
impl MshReader {
    /// Cross check the sections and flatten element -> volume -> group
    fn assemble(&mut self) -> Result<Mesh> {
        let volumes = std::mem::take(&mut self.volumes);
        let groups = std::mem::take(&mut self.groups);
        let nodes = std::mem::take(&mut self.nodes);
        let raw_elements = std::mem::take(&mut self.elements);

        for (is_empty, section) in [
            (volumes.is_empty(), "volumes"),
            (nodes.is_empty(), "nodes"),
            (groups.is_empty(), "groups"),
            (raw_elements.is_empty(), "tetrahedrons"),
        ] {
            if is_empty {
                bail!(MshError::EmptySection(section));
            }
        }

        // ensure each volume has a valid group
        let group_tags: HashSet<Tag> = groups.iter().map(|g| g.tag).collect();
        let mut volume_groups: HashMap<Tag, Tag> = HashMap::with_capacity(volumes.len());
        for v in &volumes {
            if !group_tags.contains(&v.group) {
                bail!(MshError::UnknownGroup {
                    volume: v.tag,
                    group: v.group,
                });
            }
            volume_groups.insert(v.tag, v.group);
        }

        // ensure each element has a valid volume and only known nodes
        let node_tags: HashSet<Tag> = nodes.iter().map(|n| n.tag).collect();
        let elements = raw_elements
            .iter()
            .map(|e| {
                let medium = *volume_groups
                    .get(&e.volume)
                    .ok_or(MshError::UnknownVolume {
                        element: e.tag,
                        volume: e.volume,
                    })?;
                if let Some(node) = e.nodes.iter().find(|n| !node_tags.contains(*n)) {
                    return Err(MshError::UnknownNode {
                        element: e.tag,
                        node: *node,
                    });
                }
                Ok(Element::new(medium, e.nodes))
            })
            .collect::<std::result::Result<Vec<Element>, MshError>>()?;

        let media: Vec<Medium> = groups
            .into_iter()
            .map(|g| Medium::new(g.tag, g.name))
            .collect();

        for medium in &media {
            if !elements.iter().any(|e| e.medium == medium.tag) {
                warn!(
                    "Physical group {} \"{}\" is not used by any tetrahedron",
                    medium.tag, medium.name
                );
            }
        }

        Ok(Mesh::new(elements, nodes, media))
    }
}

/// Supported msh file versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MshVersion {
    /// Version 4.1, ascii
    V41,
}

/// Line-by-line access to the input with position tracking
///
/// Keeps the current line number for error messages and ticks the progress
/// bar for every line read.
struct LineSource<R> {
    lines: Lines<R>,
    /// Number of the last line read, 1-based
    number: usize,
    progress: Bar,
}

impl<R: BufRead> LineSource<R> {
    fn new(reader: R, progress: Bar) -> Self {
        Self {
            lines: reader.lines(),
            number: 0,
            progress,
        }
    }

    /// Next line, or `None` at the end of the input
    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(line) => {
                self.number += 1;
                self.progress.update(1)?;
                let line = line
                    .map_err(MshError::from)
                    .with_context(|| f!("Could not read line {}", self.number))?;
                Ok(Some(line))
            }
        }
    }

    /// Next line, where running out of input is an error
    fn expect_line(&mut self, expecting: &'static str) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.fail(MshError::UnexpectedEof(expecting))),
        }
    }

    /// Next line must be exactly `marker`, ignoring trailing whitespace
    fn expect_marker(&mut self, marker: &'static str) -> Result<()> {
        let line = self.expect_line(marker)?;
        if !is_marker(&line, marker) {
            return Err(self.fail(MshError::UnexpectedMarker {
                expected: marker,
                found: line.trim_end().to_string(),
            }));
        }
        Ok(())
    }

    /// Next line inside the $MeshFormat block
    fn expect_header_line(&mut self, expecting: &str) -> Result<String> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.fail(MshError::MalformedHeader(f!(
                "unexpected end of input, expected {expecting}"
            )))),
        }
    }

    /// Next line must be the $MeshFormat open or close marker
    fn expect_header_marker(&mut self, marker: &str) -> Result<()> {
        let line = self.expect_header_line(marker)?;
        if !is_marker(&line, marker) {
            return Err(self.fail(MshError::MalformedHeader(f!(
                "expected {marker}, got `{}`",
                line.trim_end()
            ))));
        }
        Ok(())
    }

    /// Run a line parser, reporting the line on failure
    fn parse<'a, T, P>(&self, line: &'a str, what: &'static str, mut parser: P) -> Result<T>
    where
        P: FnMut(&'a str) -> IResult<&'a str, T>,
    {
        match parser(line) {
            Ok((_, value)) => Ok(value),
            Err(_) => Err(self.malformed(what, line)),
        }
    }

    /// Line could not be split into the expected fields
    fn malformed(&self, what: &'static str, line: &str) -> anyhow::Error {
        self.fail(MshError::MalformedLine {
            what,
            line: line.trim_end().to_string(),
        })
    }

    /// Attach the current line number to an error
    fn fail(&self, err: MshError) -> anyhow::Error {
        anyhow!(err).context(f!("line {}", self.number))
    }
}

/// A 3D model volume and the physical group it belongs to
#[derive(Debug, Clone, PartialEq)]
struct Volume {
    tag: Tag,
    group: Tag,
}

impl Tagged for Volume {
    fn tag(&self) -> Tag {
        self.tag
    }
}

/// A named 3D physical group
#[derive(Debug, Clone, PartialEq)]
struct PhysicalGroup {
    tag: Tag,
    name: String,
}

impl Tagged for PhysicalGroup {
    fn tag(&self) -> Tag {
        self.tag
    }
}

/// A tetrahedron as written in the file, before its volume is resolved
#[derive(Debug, Clone, PartialEq)]
struct RawTetrahedron {
    tag: Tag,
    volume: Tag,
    nodes: [Tag; 4],
}

impl Tagged for RawTetrahedron {
    fn tag(&self) -> Tag {
        self.tag
    }
}
