//! Elements around nodes in compressed sparse row form
//!
//! Adapted from the elements-surrounding-points construction in Löhner,
//! *Applied CFD Techniques*, section 2.2.1.

// internal modules
use crate::neighbours::NODES_PER_ELT;

// external crates
use anyhow::{ensure, Result};
use log::trace;

/// Every element touching each node, as an offsets/elements pair
///
/// For a node tag `t` in `1..=n_nodes()`, the elements touching it are
/// `elements[offsets[t - 1]..offsets[t]]`, in ascending element order.
///
/// Node tags must be densely numbered from 1. A sparse numbering still works
/// but wastes an offset slot for every unused tag below the maximum, see
/// [renumber_sparse_nodes](crate::neighbours::renumber_sparse_nodes).
///
/// ```rust
/// # use tetmesh::neighbours::ElementsAroundNodes;
/// // two tetrahedra sharing the face {2, 3, 4}
/// let index = ElementsAroundNodes::from_flat_nodes(&[1, 2, 3, 4, 2, 3, 4, 5]).unwrap();
/// assert_eq!(index.elements_around(1), &[0]);
/// assert_eq!(index.elements_around(3), &[0, 1]);
/// assert_eq!(index.elements_around(5), &[1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementsAroundNodes {
    offsets: Vec<usize>,
    elements: Vec<usize>,
}

impl ElementsAroundNodes {
    /// Build the index from flattened element node tags, four per element
    ///
    /// Three linear passes over the node references: count the references to
    /// each node, prefix-sum the counts into offsets, then scatter the element
    /// ids into place.
    pub fn from_flat_nodes(nodes: &[usize]) -> Result<Self> {
        ensure!(
            nodes.len() % NODES_PER_ELT == 0,
            "expected {} node tags per element, got {} tags in total",
            NODES_PER_ELT,
            nodes.len()
        );
        ensure!(!nodes.contains(&0), "node tags must be numbered from 1");

        let max_node = nodes.iter().copied().max().unwrap_or(0);

        // offsets[t] counts references to node t, offsets[0] is always zero
        let mut offsets = vec![0_usize; max_node + 1];
        for &node in nodes {
            offsets[node] += 1;
        }

        // offsets[t] becomes the end of node t, i.e. the start of node t + 1
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        // offsets[t - 1] is the write cursor for node t
        let mut elements = vec![0_usize; nodes.len()];
        for (position, &node) in nodes.iter().enumerate() {
            let cursor = &mut offsets[node - 1];
            elements[*cursor] = position / NODES_PER_ELT;
            *cursor += 1;
        }

        // cursors have moved on to the end of each node, shift back right
        offsets.rotate_right(1);
        offsets[0] = 0;

        trace!(
            "Elements around nodes: {} nodes, {} references",
            max_node,
            elements.len()
        );

        Ok(Self { offsets, elements })
    }

    /// Elements touching node tag `node`, empty for unknown tags
    pub fn elements_around(&self, node: usize) -> &[usize] {
        if node == 0 || node >= self.offsets.len() {
            return &[];
        }
        &self.elements[self.offsets[node - 1]..self.offsets[node]]
    }

    /// Largest node tag covered by the index
    pub fn n_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Raw offsets, `n_nodes() + 1` long
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Raw flattened element ids, grouped by node
    pub fn elements(&self) -> &[usize] {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn offsets_and_elements() {
        let index = ElementsAroundNodes::from_flat_nodes(&[1, 2, 3, 4, 2, 3, 4, 5]).unwrap();
        assert_eq!(index.offsets(), &[0, 1, 3, 5, 7, 8]);
        assert_eq!(index.elements(), &[0, 0, 1, 0, 1, 0, 1, 1]);
        assert_eq!(index.n_nodes(), 5);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(1000)]
    fn outside_the_index(#[case] node: usize) {
        let index = ElementsAroundNodes::from_flat_nodes(&[1, 2, 3, 4, 2, 3, 4, 5]).unwrap();
        assert!(index.elements_around(node).is_empty());
    }

    #[test]
    fn unused_tags_are_empty() {
        let index = ElementsAroundNodes::from_flat_nodes(&[1, 2, 3, 7]).unwrap();
        assert_eq!(index.n_nodes(), 7);
        for node in 4..7 {
            assert!(index.elements_around(node).is_empty());
        }
        assert_eq!(index.elements_around(7), &[0]);
    }

    #[test]
    fn every_reference_is_indexed() {
        let nodes = [4, 1, 2, 3, 3, 2, 5, 4, 6, 5, 4, 3];
        let index = ElementsAroundNodes::from_flat_nodes(&nodes).unwrap();
        for (position, node) in nodes.iter().enumerate() {
            assert!(index.elements_around(*node).contains(&(position / 4)));
        }
        let total: usize = (1..=index.n_nodes())
            .map(|n| index.elements_around(n).len())
            .sum();
        assert_eq!(total, nodes.len());
    }

    #[test]
    fn empty_input() {
        let index = ElementsAroundNodes::from_flat_nodes(&[]).unwrap();
        assert_eq!(index.n_nodes(), 0);
        assert!(index.elements().is_empty());
    }

    #[rstest]
    #[case(&[1, 2, 3])]
    #[case(&[0, 1, 2, 3])]
    fn bad_input(#[case] nodes: &[usize]) {
        assert!(ElementsAroundNodes::from_flat_nodes(nodes).is_err());
    }
}
