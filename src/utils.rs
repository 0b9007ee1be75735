//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user. For example
//! checking any list of tagged records for duplicates, or using prettier
//! formatting for scientific numbers.

// internal modules
use crate::mesh::Tag;

// standard library
use std::collections::HashSet;
use std::fmt::LowerExp;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Anything identified by a Gmsh tag
///
/// Tags are only required to be unique within their own kind, so nodes,
/// volumes, physical groups and elements each form a separate registry.
pub trait Tagged {
    /// The Gmsh tag of the record
    fn tag(&self) -> Tag;
}

/// Find the first repeated tag in a list of tagged records
///
/// Returns `None` if every tag is unique, or the offending tag otherwise.
///
/// ```rust
/// # use tetmesh::mesh::Node;
/// # use tetmesh::utils::first_duplicate_tag;
/// let nodes = vec![
///     Node::new(1, 0.0, 0.0, 0.0),
///     Node::new(2, 1.0, 0.0, 0.0),
///     Node::new(1, 0.0, 1.0, 0.0),
/// ];
/// assert_eq!(first_duplicate_tag(&nodes), Some(1));
/// assert_eq!(first_duplicate_tag(&nodes[..2]), None);
/// ```
pub fn first_duplicate_tag<T: Tagged>(values: &[T]) -> Option<Tag> {
    let mut tags: HashSet<Tag> = HashSet::with_capacity(values.len());
    values
        .iter()
        .map(|v| v.tag())
        .find(|tag| !tags.insert(*tag))
}

/// Extends primitives with more specific formatting options
pub trait NumberFmt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// Works for anything that can be represented as scientific using the
    /// LowerExp trait.
    ///
    /// ```rust
    /// # use tetmesh::utils::NumberFmt;
    /// let number = -1.0;
    /// assert_eq!(number.sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((1.0).sci(5, 2), "1.00000e+00".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl<T: LowerExp> NumberFmt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let num = f!("{:.precision$e}", &self, precision = precision);
        // LowerExp always writes an 'e', split the mantissa from the exponent
        let (mantissa, exp) = num.split_at(num.find('e').unwrap_or(num.len()));
        let exp = exp.trim_start_matches('e');
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix('-') {
            Some(exp) => ('-', exp),
            None => ('+', exp),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        f!("{mantissa}e{}{:0>pad$}", sign, exp, pad = exp_pad)
    }
}
