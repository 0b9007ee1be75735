#![doc(hidden)]
//! Library of readers and common functions for the msh file format

// internal modules
use crate::mesh::Mesh;

// standard library
use std::io::BufRead;
use std::path::Path;

// external crates
use anyhow::Result;

// files under the readers module
mod msh_file;
pub mod parsers;

// inline important the mesh-related modules for a nice API
#[doc(inline)]
pub use crate::readers::msh_file::{MshReader, MshVersion};

/// Read a tetrahedral mesh from a Gmsh msh 4.1 ascii file
///
/// Returns a result containing the [Mesh] assembled from the file at `path`.
/// Nothing is returned for a file that is only partly valid.
///
/// - `path` - Path to the msh file, can be [&str], [String], [Path], etc...
///
/// Example
/// ```ignore
/// // Read every tetrahedron, node and medium in the file
/// let mesh: Mesh = tetmesh::read_msh("path/to/mesh.msh")?;
/// ```
pub fn read_msh<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path: &Path = Path::new(path.as_ref());
    let mut reader = MshReader::new();
    reader.disable_progress();
    reader.parse(path)
}

/// Read a tetrahedral mesh from any buffered source of msh 4.1 ascii text
///
/// Same rules as [read_msh], useful for meshes held in memory or piped in.
///
/// Example
/// ```ignore
/// let text = std::fs::read_to_string("path/to/mesh.msh")?;
/// let mesh: Mesh = tetmesh::read_msh_from(text.as_bytes())?;
/// ```
pub fn read_msh_from<R: BufRead>(reader: R) -> Result<Mesh> {
    let mut msh = MshReader::new();
    msh.disable_progress();
    msh.parse_reader(reader)
}
