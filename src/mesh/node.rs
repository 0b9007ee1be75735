//! Representation of mesh nodes

// internal modules
use crate::mesh::Tag;
use crate::utils::*;

// external crates
use serde::Serialize;

/// A single point of the mesh in 3D space
///
/// Nodes are identified by their Gmsh tag, which is unique across the whole
/// $Nodes section. Coordinates are kept exactly as written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Node {
    /// Unique node tag
    pub tag: Tag,
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
    /// z coordinate
    pub z: f64,
}

impl Node {
    /// Construct a node from its tag and coordinates
    pub fn new(tag: Tag, x: f64, y: f64, z: f64) -> Self {
        Self { tag, x, y, z }
    }

    /// Coordinates as an `[x, y, z]` array
    ///
    /// ```rust
    /// # use tetmesh::mesh::Node;
    /// let node = Node::new(3, 1.0, 2.0, 3.0);
    /// assert_eq!(node.coordinates(), [1.0, 2.0, 3.0]);
    /// ```
    pub fn coordinates(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Tagged for Node {
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{:<8}{:>14}{:>14}{:>14}",
            self.tag,
            self.x.sci(5, 2),
            self.y.sci(5, 2),
            self.z.sci(5, 2)
        )
    }
}
