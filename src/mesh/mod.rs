//! Core mesh library
//!
//! # Overview
//!
//! Module for storing the assembled tetrahedral mesh handed over to the
//! simulation geometry. All of the parsing and reader logic is re-exported to
//! make reading files very simple.
//!
//! ```rust
//! // Read a Gmsh 4.1 ascii file into a Mesh
//! let mesh = tetmesh::read_msh("./data/cube.msh").unwrap();
//!
//! assert_eq!(mesh.elements.len(), 6);
//! assert_eq!(mesh.media[0].name, "Water");
//! ```
//!
//! A [Mesh] is deliberately flat. Gmsh files attach elements to volumes and
//! volumes to physical groups, but every [Element] here carries its medium
//! tag directly so nothing downstream has to resolve the indirection again.
//!
//! # Neighbours
//!
//! The face-neighbour table needed for particle transport is built on demand.
//!
//! ```rust
//! let mesh = tetmesh::read_msh("./data/cube.msh").unwrap();
//! let neighbours = mesh.neighbours().unwrap();
//!
//! // the cube is split into six tetrahedra around its main diagonal, so
//! // every tetrahedron has two neighbours and two faces on the boundary
//! assert_eq!(neighbours.n_boundary_faces(), 12);
//! ```

// Split into subfiles for development, but anything important is re-exported
mod core;
mod element;
mod node;

/// Integer type used for every Gmsh tag
///
/// Node, volume, physical group and element tags are all positive integers.
pub type Tag = u32;

// inline important the mesh-related modules for a nice public API
#[doc(inline)]
pub use crate::mesh::core::Mesh;

#[doc(inline)]
pub use crate::mesh::element::{Element, Medium};

#[doc(inline)]
pub use crate::mesh::node::Node;

#[doc(inline)]
pub use crate::readers::{read_msh, read_msh_from};
