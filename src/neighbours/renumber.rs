//! Sparse to dense node renumbering
//!
//! Gmsh is free to leave gaps in the node numbering, for example after
//! removing duplicate nodes or merging meshes. The elements-around-nodes
//! index is sized by the largest tag, so gaps are squeezed out first.

// standard library
use std::collections::HashMap;

// external crates
use itertools::Itertools;

/// Map every distinct node tag to a dense tag starting from 1
///
/// Dense tags follow the ascending order of the original tags.
///
/// ```rust
/// # use tetmesh::neighbours::renumber_sparse_nodes;
/// let map = renumber_sparse_nodes(&[40, 10, 30, 10]);
/// assert_eq!(map[&10], 1);
/// assert_eq!(map[&30], 2);
/// assert_eq!(map[&40], 3);
/// ```
pub fn renumber_sparse_nodes(nodes: &[usize]) -> HashMap<usize, usize> {
    nodes
        .iter()
        .copied()
        .sorted_unstable()
        .dedup()
        .enumerate()
        .map(|(i, node)| (node, i + 1))
        .collect()
}

/// Check node tags are exactly `1..=max` with no gaps
///
/// ```rust
/// # use tetmesh::neighbours::is_densely_numbered;
/// assert!(is_densely_numbered(&[3, 1, 2, 2]));
/// assert!(!is_densely_numbered(&[1, 2, 4]));
/// assert!(!is_densely_numbered(&[0, 1, 2]));
/// ```
pub fn is_densely_numbered(nodes: &[usize]) -> bool {
    let max = match nodes.iter().max() {
        Some(max) => *max,
        None => return true,
    };

    // more distinct tags than references is impossible
    if max > nodes.len() {
        return false;
    }

    let mut seen = vec![false; max + 1];
    for &node in nodes {
        if node == 0 {
            return false;
        }
        seen[node] = true;
    }
    seen.iter().skip(1).all(|s| *s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], true)]
    #[case(&[1, 2, 3, 4], true)]
    #[case(&[4, 3, 2, 1, 1, 2, 3, 5], true)]
    #[case(&[1, 2, 3, 5], false)]
    #[case(&[1_000_000, 1, 2, 3], false)]
    #[case(&[0, 1, 2, 3], false)]
    fn density(#[case] nodes: &[usize], #[case] expected: bool) {
        assert_eq!(is_densely_numbered(nodes), expected);
    }

    #[test]
    fn renumbered_tags_are_dense() {
        let nodes = [142, 223, 130, 353, 223, 130, 353, 7];
        let map = renumber_sparse_nodes(&nodes);
        assert_eq!(map.len(), 5);
        let dense: Vec<usize> = nodes.iter().map(|n| map[n]).collect();
        assert!(is_densely_numbered(&dense));
        assert_eq!(dense, vec![3, 4, 2, 5, 4, 2, 5, 1]);
    }
}
