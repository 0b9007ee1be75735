//! Error types for msh parsing and neighbour construction
//!
//! Every failure in the crate starts life as an [MshError]. The readers wrap
//! these in `anyhow` context as they propagate, so the final error reads as a
//! chain from the offending field up to the section being parsed. The
//! original variant is always recoverable with `downcast_ref`.
//!
//! ```rust
//! # use tetmesh::error::{ErrorKind, MshError};
//! let input = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n";
//! let err = tetmesh::read_msh_from(input.as_bytes()).unwrap_err();
//! let cause = err.downcast_ref::<MshError>().unwrap();
//! assert_eq!(cause.kind(), ErrorKind::MalformedHeader);
//! ```

// internal modules
use crate::mesh::Tag;

// external crates
use thiserror::Error;

/// Everything that can go wrong reading a mesh or building its neighbours
#[derive(Debug, Error)]
pub enum MshError {
    /// A section marker was expected but something else was found
    #[error("expected {expected}, got `{found}`")]
    UnexpectedMarker {
        expected: &'static str,
        found: String,
    },

    /// The $MeshFormat block is missing, truncated, or unparseable
    #[error("malformed $MeshFormat header, {0}")]
    MalformedHeader(String),

    /// Only msh 4.1 is supported
    #[error("unsupported msh version `{0}`, the only supported version is 4.1")]
    UnsupportedVersion(String),

    /// The binary flag was set in the $MeshFormat header
    #[error("binary msh files are unsupported, please convert this file to ascii and try again")]
    BinaryEncoding,

    /// File type flag other than 0 (ascii) or 1 (binary)
    #[error("unknown msh file type `{0}`, expected 0 for ascii")]
    UnknownFileType(i32),

    /// Data size in the header is not 8 bytes
    #[error("msh file size_t must be 8, got {0}")]
    UnsupportedDataSize(i32),

    /// Ran out of lines part way through a section
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),

    /// A line could not be parsed into the expected fields
    #[error("failed to parse {what} from `{line}`")]
    MalformedLine { what: &'static str, line: String },

    /// A declared count does not match the number of records read
    #[error("expected {expected} {what} but read {found}")]
    CountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// An entity count in a section header is negative
    #[error("negative {what} count {count}")]
    NegativeCount { what: &'static str, count: i64 },

    /// Declared record counts add up to more than can be read
    #[error("{what} counts overflow, got {counts:?}")]
    CountOverflow { what: &'static str, counts: [i64; 4] },

    /// A section header declares no 3D entities at all
    #[error("no volumes found")]
    NoVolumes,

    /// Bloc dimension outside 0..=3
    #[error("got dimension {dim} for entity {entity}, expected 0, 1, 2, or 3")]
    InvalidDimension { dim: i32, entity: i32 },

    /// The largest node tag does not fit into a [Tag]
    #[error("max node tag is too large ({0}), limit is {limit}", limit = Tag::MAX)]
    TagOverflow(u64),

    /// Physical group line without an opening quote
    #[error("physical group names must be quoted: {0}")]
    UnquotedGroupName(String),

    /// Physical group line without a closing quote
    #[error("couldn't find closing quote for physical group: {0}")]
    UnterminatedGroupName(String),

    /// Physical group line with `""` as the name
    #[error("empty physical group name: {0}")]
    EmptyGroupName(String),

    /// Volume entity with no physical group
    #[error("volume {0} was not assigned a physical group")]
    VolumeWithoutGroup(Tag),

    /// Volume entity with more than one physical group
    #[error("volume {0} has more than one physical group")]
    VolumeWithManyGroups(Tag),

    /// Two records of the same kind share a tag
    #[error("found duplicate {kind} tag {tag}")]
    DuplicateTag { kind: &'static str, tag: Tag },

    /// Volume points at a physical group that was never parsed
    #[error("volume {volume} had unknown physical group tag {group}")]
    UnknownGroup { volume: Tag, group: Tag },

    /// Tetrahedron points at a volume that was never parsed
    #[error("tetrahedron {element} had unknown volume tag {volume}")]
    UnknownVolume { element: Tag, volume: Tag },

    /// Tetrahedron points at a node that was never parsed
    #[error("tetrahedron {element} had unknown node tag {node}")]
    UnknownNode { element: Tag, node: Tag },

    /// 3D element bloc of anything other than 4-node tetrahedra
    #[error("got non-tetrahedral mesh element type {element_type} for entity {entity}")]
    UnsupportedElementType { element_type: i32, entity: i32 },

    /// A required section was missing or produced nothing
    #[error("no {0} were parsed")]
    EmptySection(&'static str),

    /// Negative node tag handed to the neighbour algorithm
    #[error("negative node {0}")]
    NegativeNode(i64),

    /// Repeated node tag within a single tetrahedron
    #[error("duplicate node {0}")]
    DuplicateNode(i64),

    /// More than two tetrahedra share a face
    #[error(
        "face {face} of tetrahedron {element} is also shared by tetrahedra {first} and {second} \
         (non-manifold mesh)"
    )]
    NonManifoldFace {
        element: usize,
        face: usize,
        first: usize,
        second: usize,
    },

    /// Problem with the underlying reader
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Broad classification of an [MshError]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Anything wrong inside the $MeshFormat block
    MalformedHeader,
    /// Missing markers, count mismatches, unparseable fields
    SectionStructure,
    /// Duplicate tags or dangling references between sections
    ReferentialIntegrity,
    /// Valid msh content that this crate deliberately rejects
    UnsupportedContent,
    /// A required section yielded no records
    EmptySection,
    /// Tetrahedron unusable for neighbour construction
    InvalidElement,
    /// Reader failure
    Io,
}

impl MshError {
    /// The taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        use MshError::*;
        match self {
            MalformedHeader(_)
            | UnsupportedVersion(_)
            | UnknownFileType(_)
            | UnsupportedDataSize(_) => ErrorKind::MalformedHeader,
            UnexpectedMarker { .. }
            | UnexpectedEof(_)
            | MalformedLine { .. }
            | CountMismatch { .. }
            | NegativeCount { .. }
            | CountOverflow { .. }
            | InvalidDimension { .. }
            | TagOverflow(_)
            | UnquotedGroupName(_)
            | UnterminatedGroupName(_)
            | EmptyGroupName(_)
            | VolumeWithoutGroup(_)
            | VolumeWithManyGroups(_) => ErrorKind::SectionStructure,
            DuplicateTag { .. }
            | UnknownGroup { .. }
            | UnknownVolume { .. }
            | UnknownNode { .. } => ErrorKind::ReferentialIntegrity,
            BinaryEncoding | UnsupportedElementType { .. } => ErrorKind::UnsupportedContent,
            NoVolumes | EmptySection(_) => ErrorKind::EmptySection,
            NegativeNode(_) | DuplicateNode(_) | NonManifoldFace { .. } => {
                ErrorKind::InvalidElement
            }
            Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MshError::BinaryEncoding, ErrorKind::UnsupportedContent)]
    #[case(MshError::UnsupportedVersion("2.2".into()), ErrorKind::MalformedHeader)]
    #[case(MshError::MalformedHeader("x".into()), ErrorKind::MalformedHeader)]
    #[case(MshError::UnexpectedMarker { expected: "$EndMeshFormat", found: "x".into() }, ErrorKind::SectionStructure)]
    #[case(MshError::UnexpectedEof("$MeshFormat"), ErrorKind::SectionStructure)]
    #[case(MshError::CountOverflow { what: "entity", counts: [i64::MAX, 1, 0, 1] }, ErrorKind::SectionStructure)]
    #[case(MshError::UnexpectedMarker { expected: "$EndNodes", found: "x".into() }, ErrorKind::SectionStructure)]
    #[case(MshError::DuplicateTag { kind: "node", tag: 3 }, ErrorKind::ReferentialIntegrity)]
    #[case(MshError::EmptySection("nodes"), ErrorKind::EmptySection)]
    #[case(MshError::DuplicateNode(4), ErrorKind::InvalidElement)]
    fn kinds(#[case] err: MshError, #[case] kind: ErrorKind) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = MshError::UnknownVolume {
            element: 12,
            volume: 4,
        };
        assert_eq!(err.to_string(), "tetrahedron 12 had unknown volume tag 4");
        assert_eq!(
            MshError::VolumeWithManyGroups(7).to_string(),
            "volume 7 has more than one physical group"
        );
    }
}
