//! Face neighbours of tetrahedral elements
//!
//! # Overview
//!
//! Particle transport needs to know which element a particle crosses into
//! at every face. Comparing every face against every other face is O(n²), so
//! the neighbours are instead found through an index of the elements around
//! each node:
//!
//! 1. Build [ElementsAroundNodes] from the flattened element node tags
//! 2. For every face not already matched, pick one of its nodes and only
//!    compare against the elements touching that node
//! 3. Record a match on both elements at once
//!
//! Adapted from the element-neighbour construction in Löhner, *Applied CFD
//! Techniques*, section 2.2.3.
//!
//! ```rust
//! # use tetmesh::neighbours::{tetrahedron_neighbours, Tetrahedron};
//! let elements = vec![
//!     Tetrahedron::new(1, 2, 3, 4).unwrap(),
//!     Tetrahedron::new(5, 4, 3, 2).unwrap(),
//! ];
//! let table = tetrahedron_neighbours(&elements).unwrap();
//!
//! // the face opposite node 1 is shared with the face opposite node 5
//! assert_eq!(table.get(0, 0), Some(1));
//! assert_eq!(table.get(1, 0), Some(0));
//! assert_eq!(table.get(0, 1), None);
//! ```
//!
//! # Faces
//!
//! Local face `f` of a [Tetrahedron] is the face opposite its `f`-th node, in
//! the order the nodes were given. Faces match when their three node tags
//! are the same set, whatever order they were written in.

// internal modules
use crate::error::MshError;
use crate::mesh::Element;

// standard library
use std::borrow::Cow;

// external crates
use anyhow::{bail, Result};
use log::{debug, trace};
use serde::Serialize;

// files under the neighbours module
mod csr;
mod renumber;

#[doc(inline)]
pub use crate::neighbours::csr::ElementsAroundNodes;

#[doc(inline)]
pub use crate::neighbours::renumber::{is_densely_numbered, renumber_sparse_nodes};

/// Nodes per tetrahedron
pub const NODES_PER_ELT: usize = 4;

/// Faces per tetrahedron
pub const FACES_PER_ELT: usize = 4;

/// Three node tags of a triangular face, sorted ascending
pub type Face = [usize; 3];

/// A tetrahedron reduced to what the neighbour search needs
///
/// Construction fails for negative or repeated node tags, since neither can
/// describe a real tetrahedron.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tetrahedron {
    nodes: [usize; NODES_PER_ELT],
    faces: [Face; FACES_PER_ELT],
}

impl Tetrahedron {
    /// Make a tetrahedron from four node tags
    ///
    /// ```rust
    /// # use tetmesh::neighbours::Tetrahedron;
    /// assert!(Tetrahedron::new(1, 2, 3, 4).is_ok());
    /// assert!(Tetrahedron::new(1, 2, 3, 1).is_err());
    /// assert!(Tetrahedron::new(-1, 2, 3, 4).is_err());
    /// ```
    pub fn new(a: i64, b: i64, c: i64, d: i64) -> Result<Self> {
        let nodes = [a, b, c, d];
        if let Some(negative) = nodes.iter().find(|n| **n < 0) {
            bail!(MshError::NegativeNode(*negative));
        }
        for (i, node) in nodes.iter().enumerate() {
            if nodes[i + 1..].contains(node) {
                bail!(MshError::DuplicateNode(*node));
            }
        }
        Ok(Self::from_nodes(nodes.map(|n| n as usize)))
    }

    /// Node tags already known to be distinct
    fn from_nodes(nodes: [usize; NODES_PER_ELT]) -> Self {
        let [a, b, c, d] = nodes;
        Self {
            nodes,
            faces: [
                sorted_face([b, c, d]),
                sorted_face([a, c, d]),
                sorted_face([a, b, d]),
                sorted_face([a, b, c]),
            ],
        }
    }

    /// The four node tags in the order they were given
    pub fn nodes(&self) -> [usize; NODES_PER_ELT] {
        self.nodes
    }

    /// Largest node tag of the element
    pub fn max_node(&self) -> usize {
        self.nodes.iter().copied().fold(0, usize::max)
    }

    /// The four faces, face `f` being opposite node `f`
    pub fn faces(&self) -> [Face; FACES_PER_ELT] {
        self.faces
    }

    /// Local index of a face on this element, if it has it
    pub fn face_index(&self, face: &Face) -> Option<usize> {
        self.faces.iter().position(|f| f == face)
    }

    /// Same element with node tags swapped through a renumbering map
    fn renumbered(&self, map: &std::collections::HashMap<usize, usize>) -> Self {
        Self::from_nodes(self.nodes.map(|n| map[&n]))
    }
}

impl TryFrom<&Element> for Tetrahedron {
    type Error = anyhow::Error;

    fn try_from(element: &Element) -> Result<Self> {
        let [a, b, c, d] = element.nodes.map(i64::from);
        Self::new(a, b, c, d)
    }
}

fn sorted_face(mut face: Face) -> Face {
    face.sort_unstable();
    face
}

/// Flatten node tags, four per element
fn flatten_tetrahedrons(elements: &[Tetrahedron]) -> Vec<usize> {
    elements.iter().flat_map(|e| e.nodes()).collect()
}

/// Neighbouring element for every face of every element
///
/// Slot `(i, f)` holds the index of the element sharing face `f` of element
/// `i`, or `None` if the face is on the mesh boundary. The table is symmetric:
/// if `(i, f)` holds `j` then some face of `j` holds `i`.
///
/// Face slots follow the node order each [Tetrahedron] was built with, so
/// slot `f` is the face opposite the `f`-th node as written in the file, not
/// the `f`-th smallest node tag. Consumers that number faces by ascending
/// node tag have to remap, e.g. through [Tetrahedron::faces] and
/// [Tetrahedron::face_index].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighbourTable {
    slots: Vec<[Option<usize>; FACES_PER_ELT]>,
}

impl NeighbourTable {
    /// Number of elements in the table
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for a table built from no elements
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Neighbour across face `face` of element `element`
    ///
    /// `None` for a boundary face, and also for indices outside the table.
    pub fn get(&self, element: usize, face: usize) -> Option<usize> {
        self.slots
            .get(element)
            .and_then(|slots| slots.get(face).copied().flatten())
    }

    /// All four neighbour slots of an element
    pub fn neighbours_of(&self, element: usize) -> Option<&[Option<usize>; FACES_PER_ELT]> {
        self.slots.get(element)
    }

    /// Iterate over the neighbour slots of every element in order
    pub fn iter(&self) -> impl Iterator<Item = &[Option<usize>; FACES_PER_ELT]> + '_ {
        self.slots.iter()
    }

    /// Every `(element, face)` pair without a neighbour
    pub fn boundary_faces(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots.iter().enumerate().flat_map(|(i, slots)| {
            slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_none())
                .map(move |(f, _)| (i, f))
        })
    }

    /// Number of faces on the mesh boundary
    pub fn n_boundary_faces(&self) -> usize {
        self.boundary_faces().count()
    }

    /// The raw slots, one array of four per element
    pub fn as_slice(&self) -> &[[Option<usize>; FACES_PER_ELT]] {
        &self.slots
    }
}

/// Elements with node tags squeezed down to `1..=n` where needed
fn densely_numbered(elements: &[Tetrahedron]) -> Cow<'_, [Tetrahedron]> {
    let nodes = flatten_tetrahedrons(elements);
    if is_densely_numbered(&nodes) {
        Cow::Borrowed(elements)
    } else {
        debug!("Renumbering sparse node tags");
        let map = renumber_sparse_nodes(&nodes);
        Cow::Owned(elements.iter().map(|e| e.renumbered(&map)).collect())
    }
}

/// Find the neighbouring element across every face of every tetrahedron
///
/// Element identities in the returned [NeighbourTable] are indices into
/// `elements`. A face shared by more than two tetrahedra is an error.
pub fn tetrahedron_neighbours(elements: &[Tetrahedron]) -> Result<NeighbourTable> {
    let elements = densely_numbered(elements);
    let index = ElementsAroundNodes::from_flat_nodes(&flatten_tetrahedrons(&elements))?;

    let mut slots = vec![[None; FACES_PER_ELT]; elements.len()];

    for (i, element) in elements.iter().enumerate() {
        for (f, face) in element.faces().iter().enumerate() {
            // already matched from the other side
            if slots[i][f].is_some() {
                continue;
            }

            // any node of the face will do, a neighbour has to touch all three
            for &j in index.elements_around(face[0]) {
                if j == i {
                    continue;
                }
                let Some(g) = elements[j].face_index(face) else {
                    continue;
                };
                if let Some(existing) = slots[j][g] {
                    bail!(MshError::NonManifoldFace {
                        element: i,
                        face: f,
                        first: j,
                        second: existing,
                    });
                }
                slots[i][f] = Some(j);
                slots[j][g] = Some(i);
                break;
            }
        }
    }

    let table = NeighbourTable { slots };
    trace!(
        "{} elements, {} boundary faces",
        table.len(),
        table.n_boundary_faces()
    );
    Ok(table)
}

/// Sharded version of [tetrahedron_neighbours]
///
/// Every element searches all four of its faces independently against the
/// shared read-only index, so no slot is ever written by two workers. The
/// result is identical to [tetrahedron_neighbours] for any manifold mesh.
#[cfg(feature = "parallel")]
pub fn tetrahedron_neighbours_par(elements: &[Tetrahedron]) -> Result<NeighbourTable> {
    use rayon::prelude::*;

    let elements = densely_numbered(elements);
    let index = ElementsAroundNodes::from_flat_nodes(&flatten_tetrahedrons(&elements))?;

    let slots = elements
        .par_iter()
        .enumerate()
        .map(|(i, element)| -> Result<[Option<usize>; FACES_PER_ELT]> {
            let mut row = [None; FACES_PER_ELT];
            for (f, face) in element.faces().iter().enumerate() {
                let mut matches = index
                    .elements_around(face[0])
                    .iter()
                    .copied()
                    .filter(|&j| j != i && elements[j].face_index(face).is_some());
                row[f] = matches.next();
                if let (Some(first), Some(second)) = (row[f], matches.next()) {
                    bail!(MshError::NonManifoldFace {
                        element: i,
                        face: f,
                        first,
                        second,
                    });
                }
            }
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NeighbourTable { slots })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use itertools::Itertools;
    use rstest::rstest;

    /// Unit cubes split into six tetrahedra around their main diagonal
    ///
    /// Every cube is cut the same way, so faces line up across cubes and the
    /// result is a conforming mesh of `6 * n^3` elements.
    pub(crate) fn structured_mesh(n: usize) -> Vec<Tetrahedron> {
        let tag = |i: usize, j: usize, k: usize| 1 + i + (n + 1) * (j + (n + 1) * k);
        let mut elements = Vec::with_capacity(6 * n * n * n);
        for (i, j, k) in (0..n).cartesian_product(0..n).cartesian_product(0..n).map(|((i, j), k)| (i, j, k)) {
            for axes in (0..3).permutations(3) {
                let mut corner = [i, j, k];
                let mut nodes = vec![tag(i, j, k) as i64];
                for axis in axes {
                    corner[axis] += 1;
                    nodes.push(tag(corner[0], corner[1], corner[2]) as i64);
                }
                elements.push(Tetrahedron::new(nodes[0], nodes[1], nodes[2], nodes[3]).unwrap());
            }
        }
        elements
    }

    /// Compare every face against every other face
    pub(crate) fn brute_force_neighbours(elements: &[Tetrahedron]) -> NeighbourTable {
        let mut slots = vec![[None; FACES_PER_ELT]; elements.len()];
        for i in 0..elements.len() {
            for f in 0..FACES_PER_ELT {
                if slots[i][f].is_some() {
                    continue;
                }
                let face = elements[i].faces()[f];
                for j in (0..elements.len()).filter(|j| *j != i) {
                    if let Some(g) = elements[j].face_index(&face) {
                        slots[i][f] = Some(j);
                        slots[j][g] = Some(i);
                        break;
                    }
                }
            }
        }
        NeighbourTable { slots }
    }

    #[rstest]
    #[case(1, -2, 3, 4, "negative node -2")]
    #[case(1, 2, 3, 1, "duplicate node 1")]
    #[case(1, 2, 3, 3, "duplicate node 3")]
    #[case(7, 2, 7, 7, "duplicate node 7")]
    fn invalid_tetrahedrons(
        #[case] a: i64,
        #[case] b: i64,
        #[case] c: i64,
        #[case] d: i64,
        #[case] message: &str,
    ) {
        let err = Tetrahedron::new(a, b, c, d).unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn faces_are_opposite_nodes() {
        let tet = Tetrahedron::new(9, 3, 7, 1).unwrap();
        assert_eq!(tet.nodes(), [9, 3, 7, 1]);
        assert_eq!(tet.max_node(), 9);
        assert_eq!(tet.faces(), [[1, 3, 7], [1, 7, 9], [1, 3, 9], [3, 7, 9]]);
        assert_eq!(tet.face_index(&[1, 3, 9]), Some(2));
        assert_eq!(tet.face_index(&[1, 2, 3]), None);
    }

    #[test]
    fn slots_follow_input_node_order() {
        let neighbour = Tetrahedron::new(2, 3, 4, 5).unwrap();

        let ascending = [Tetrahedron::new(1, 2, 3, 4).unwrap(), neighbour];
        let table = tetrahedron_neighbours(&ascending).unwrap();
        assert_eq!(table.neighbours_of(0), Some(&[Some(1), None, None, None]));

        // same element, node 1 written last, so the shared face moves to slot 3
        let reversed = [Tetrahedron::new(4, 3, 2, 1).unwrap(), neighbour];
        let table = tetrahedron_neighbours(&reversed).unwrap();
        assert_eq!(table.neighbours_of(0), Some(&[None, None, None, Some(1)]));
        assert_eq!(table.get(1, 3), Some(0));
    }

    #[test]
    fn single_element_is_all_boundary() {
        let table = tetrahedron_neighbours(&[Tetrahedron::new(1, 2, 3, 4).unwrap()]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.neighbours_of(0), Some(&[None; 4]));
        assert_eq!(table.n_boundary_faces(), 4);
    }

    #[test]
    fn no_elements() {
        let table = tetrahedron_neighbours(&[]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn sparse_tags() {
        let elements = vec![
            Tetrahedron::new(142, 223, 130, 353).unwrap(),
            Tetrahedron::new(223, 130, 353, 9_000_000).unwrap(),
        ];
        let table = tetrahedron_neighbours(&elements).unwrap();
        assert_eq!(table.get(0, 0), Some(1));
        assert_eq!(table.get(1, 3), Some(0));
        assert_eq!(table, brute_force_neighbours(&elements));
    }

    #[test]
    fn non_manifold_face() {
        // three tetrahedra hanging off the face {1, 2, 3}
        let elements = vec![
            Tetrahedron::new(1, 2, 3, 4).unwrap(),
            Tetrahedron::new(1, 2, 3, 5).unwrap(),
            Tetrahedron::new(1, 2, 3, 6).unwrap(),
        ];
        let err = tetrahedron_neighbours(&elements).unwrap_err();
        match err.downcast_ref::<MshError>() {
            Some(MshError::NonManifoldFace { element, face, .. }) => {
                assert_eq!((*element, *face), (2, 3));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(4)]
    fn matches_brute_force(#[case] n: usize) {
        let elements = structured_mesh(n);
        let table = tetrahedron_neighbours(&elements).unwrap();
        assert_eq!(table, brute_force_neighbours(&elements));
        // two triangles on each of the 6 n*n cube sides
        assert_eq!(table.n_boundary_faces(), 12 * n * n);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn symmetric(#[case] n: usize) {
        let elements = structured_mesh(n);
        let table = tetrahedron_neighbours(&elements).unwrap();
        for (i, slots) in table.iter().enumerate() {
            for (f, slot) in slots.iter().enumerate() {
                if let Some(j) = slot {
                    let face = elements[i].faces()[f];
                    let g = elements[*j].face_index(&face).unwrap();
                    assert_eq!(table.get(*j, g), Some(i));
                }
            }
        }
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    fn no_orphans(#[case] n: usize) {
        let table = tetrahedron_neighbours(&structured_mesh(n)).unwrap();
        assert!(table.iter().all(|slots| slots.iter().any(|s| s.is_some())));
    }

    #[test]
    fn node_order_does_not_matter() {
        let elements = vec![
            Tetrahedron::new(1, 2, 3, 4).unwrap(),
            Tetrahedron::new(3, 5, 2, 4).unwrap(),
        ];
        let table = tetrahedron_neighbours(&elements).unwrap();
        assert_eq!(table.get(0, 0), Some(1));
        assert_eq!(table.get(1, 1), Some(0));
        assert_eq!(table.boundary_faces().count(), 6);
    }

    #[cfg(feature = "parallel")]
    #[rstest]
    #[case(1)]
    #[case(3)]
    fn parallel_matches_serial(#[case] n: usize) {
        let elements = structured_mesh(n);
        assert_eq!(
            tetrahedron_neighbours_par(&elements).unwrap(),
            tetrahedron_neighbours(&elements).unwrap()
        );
    }
}
