//! Tetrahedral elements and the media they are made of
//!
//! These are the flattened forms of the Gmsh element/volume/physical group
//! chain. Raw parse records that still reference volumes never leave the
//! readers module.

// internal modules
use crate::mesh::Tag;
use crate::utils::*;

// external crates
use serde::Serialize;

/// A single tetrahedral mesh element
///
/// The element tag itself is not kept. Elements are identified by their
/// position in [Mesh::elements](crate::mesh::Mesh), which is also the index
/// used by the neighbour table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Tag of the [Medium] this element is made of
    pub medium: Tag,
    /// The four node tags, in file order
    pub nodes: [Tag; 4],
}

impl Element {
    /// Construct an element from its medium tag and node tags
    pub fn new(medium: Tag, nodes: [Tag; 4]) -> Self {
        Self { medium, nodes }
    }

    /// Largest node tag referenced by the element
    ///
    /// ```rust
    /// # use tetmesh::mesh::Element;
    /// let element = Element::new(1, [142, 223, 130, 353]);
    /// assert_eq!(element.max_node(), 353);
    /// ```
    pub fn max_node(&self) -> Tag {
        // four entries, never empty
        self.nodes.iter().copied().fold(0, Tag::max)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let [a, b, c, d] = self.nodes;
        write!(f, "medium {:<5} nodes {a} {b} {c} {d}", self.medium)
    }
}

/// A physical medium, i.e. a named 3D physical group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medium {
    /// Physical group tag
    pub tag: Tag,
    /// Name given to the group in the $PhysicalNames section
    pub name: String,
}

impl Medium {
    /// Construct a medium from its physical group tag and name
    pub fn new(tag: Tag, name: String) -> Self {
        Self { tag, name }
    }
}

impl Tagged for Medium {
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl std::fmt::Display for Medium {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:<5} \"{}\"", self.tag, self.name)
    }
}
