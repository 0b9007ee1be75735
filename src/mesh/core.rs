// internal modules
use crate::mesh::{Element, Medium, Node, Tag};
use crate::neighbours::{self, NeighbourTable, Tetrahedron};
use crate::utils::*;

// external crates
use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

/// The assembled tetrahedral mesh
///
/// This is the terminal artifact of the reader and is handed over by value
/// to whatever owns the simulation geometry. Every element, node and medium
/// has passed the referential checks of the reader:
///
/// - node, element, volume and group tags were unique within their kind
/// - every element medium is the tag of one of the `media`
/// - every element node tag is the tag of one of the `nodes`
///
/// Elements are in file order, and their index in `elements` is the element
/// identity used by [NeighbourTable].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh {
    /// Tetrahedra with their medium tag resolved
    pub elements: Vec<Element>,
    /// All nodes in file order
    pub nodes: Vec<Node>,
    /// 3D physical groups
    pub media: Vec<Medium>,
}

impl Mesh {
    /// Construct a mesh directly from its parts
    ///
    /// No validation is done here, this is the job of the readers.
    pub fn new(elements: Vec<Element>, nodes: Vec<Node>, media: Vec<Medium>) -> Self {
        Self {
            elements,
            nodes,
            media,
        }
    }

    /// Find a medium by its physical group tag
    pub fn medium(&self, tag: Tag) -> Option<&Medium> {
        self.media.iter().find(|m| m.tag == tag)
    }

    /// Find a node by its tag
    ///
    /// Gmsh almost always writes nodes sorted and densely numbered, so the
    /// direct index is tried before falling back to a full search.
    pub fn node(&self, tag: Tag) -> Option<&Node> {
        match tag
            .checked_sub(1)
            .and_then(|i| self.nodes.get(i as usize))
        {
            Some(node) if node.tag == tag => Some(node),
            _ => self.nodes.iter().find(|n| n.tag == tag),
        }
    }

    /// All element node tags as one flat list, four per element
    pub fn element_nodes(&self) -> Vec<Tag> {
        self.elements.iter().flat_map(|e| e.nodes).collect()
    }

    /// Axis aligned bounding box of the nodes as `[min, max]`
    ///
    /// Returns `None` for a mesh without nodes.
    pub fn bounds(&self) -> Option<[[f64; 3]; 2]> {
        let first = self.nodes.first()?.coordinates();
        Some(self.nodes.iter().fold([first, first], |[lo, hi], n| {
            let c = n.coordinates();
            [
                [lo[0].min(c[0]), lo[1].min(c[1]), lo[2].min(c[2])],
                [hi[0].max(c[0]), hi[1].max(c[1]), hi[2].max(c[2])],
            ]
        }))
    }

    /// Number of elements made of each medium, in the order of `media`
    pub fn elements_per_medium(&self) -> Vec<(Tag, usize)> {
        self.media
            .iter()
            .map(|m| {
                let n = self.elements.iter().filter(|e| e.medium == m.tag).count();
                (m.tag, n)
            })
            .collect()
    }

    /// Build the face-neighbour table for every element
    ///
    /// Node tags do not need to be densely numbered, any renumbering is done
    /// internally and the table is indexed by element position. With the
    /// `parallel` feature the search is spread over every core.
    pub fn neighbours(&self) -> Result<NeighbourTable> {
        debug!("Building neighbours for {} tetrahedra", self.elements.len());
        let tetrahedrons = self
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| {
                Tetrahedron::try_from(e).with_context(|| f!("Invalid tetrahedron at index {i}"))
            })
            .collect::<Result<Vec<Tetrahedron>>>()?;

        #[cfg(feature = "parallel")]
        return neighbours::tetrahedron_neighbours_par(&tetrahedrons);

        #[cfg(not(feature = "parallel"))]
        neighbours::tetrahedron_neighbours(&tetrahedrons)
    }
}

impl std::fmt::Display for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = "Mesh {\n".to_string();
        s += &f!("    elements: {}\n", self.elements.len());
        s += &f!("    nodes: {}\n", self.nodes.len());
        s += &f!("    media: {}\n", self.media.len());
        for (medium, (_, n)) in self.media.iter().zip(self.elements_per_medium()) {
            s += &f!("      {medium} ({n} elements)\n");
        }
        if let Some([lo, hi]) = self.bounds() {
            s += &f!(
                "    bounds: [{}, {}, {}] -> [{}, {}, {}]\n",
                lo[0].sci(5, 2),
                lo[1].sci(5, 2),
                lo[2].sci(5, 2),
                hi[0].sci(5, 2),
                hi[1].sci(5, 2),
                hi[2].sci(5, 2)
            );
        }
        s += "}";
        write!(f, "{}", s)
    }
}
