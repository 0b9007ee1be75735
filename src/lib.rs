//! # The Tetmesh crate
//!
//! Reader for Gmsh msh 4.1 ascii tetrahedral meshes, and the face-neighbour
//! table needed to track particles through them
//!
//! ## Installation
//!
//! Direct install from github:
//!
//! ```shell
//! cargo install --git https://github.com/repositony/tetmesh.git
//! ```
//!
//! ## Overview
//!
//! The crate turns a Gmsh file into a flat [Mesh](crate::mesh::Mesh) of
//! tetrahedra, nodes and media, ready to be handed over as simulation
//! geometry.
//!
//! | Command line | Description                                          |
//! | ------------ | ---------------------------------------------------- |
//! | `mshinfo`    | Summarise an msh file and optionally dump neighbours |
//!
//! ### Supported files
//!
//! Only the version 4.1 ascii format is read. Anything else in the file that
//! is not needed to describe the tetrahedral volume is skipped.
//!
//! | Section          | Kept                                          |
//! | ---------------- | --------------------------------------------- |
//! | `$MeshFormat`    | Must be `4.1 0 8`                             |
//! | `$PhysicalNames` | 3D groups only, these become media            |
//! | `$Entities`      | 3D volumes only, each with one physical group |
//! | `$Nodes`         | Every node of every bloc                      |
//! | `$Elements`      | 4-node tetrahedra of 3D blocs                 |
//! | anything else    | Ignored                                       |
//!
//! Any 3D element that is not a 4-node tetrahedron is an error rather than
//! being silently dropped, since that would leave holes in the geometry.
//!
//! ## Advanced use
//!
//! Reading a mesh is a one-liner, after which the neighbour table can be
//! built whenever it is needed.
//!
//! ```rust
//! // import the crate
//! use tetmesh::read_msh;
//!
//! // read the mesh from an msh file
//! let mesh = read_msh("./data/cube.msh").unwrap();
//!
//! // find which tetrahedron is across each face of every tetrahedron
//! let neighbours = mesh.neighbours().unwrap();
//! assert_eq!(neighbours.len(), mesh.elements.len());
//! ```
//!
//! As an overview:
//! - The [mesh] module contains the assembled mesh structures.
//! - The [neighbours] module builds face-neighbour tables from any list of
//! tetrahedra, whether or not they came from an msh file.
//! - The [error] module describes every way reading or connecting a mesh can
//! fail.
//!
//! In the background, the `nom` parser combinator library does the line
//! parsing, `clap` is used for the command line interface, and `rayon` can
//! optionally spread the neighbour search over every core with the
//! `parallel` feature.
//!
//! The neighbour search avoids the naive all-pairs comparison by first
//! building an elements-around-nodes index, so very large meshes stay fast.
//! Each tetrahedron then only compares faces with the handful of elements
//! sharing one of its nodes.

// Public facing modules
pub mod error;
pub mod mesh;
pub mod neighbours;
pub mod utils;

// note that docs are hidden to prevent confusing the current simple API
pub mod readers;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::readers::{read_msh, read_msh_from};

#[doc(inline)]
pub use crate::mesh::Mesh;

#[doc(inline)]
pub use crate::error::{ErrorKind, MshError};
