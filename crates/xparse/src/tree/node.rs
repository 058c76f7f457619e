//! Arena node.

use indexmap::IndexMap;

/// One element in the in-memory arena.
///
/// Relations are arena indices; `None` marks a vacant relation. Text
/// fragments are kept in document order, one entry per run of character
/// data between child elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub depth: u32,
    pub contents: Vec<String>,
    /// Attributes in source order; names are unique within a node.
    pub attributes: IndexMap<String, String>,
    pub parent: Option<usize>,
    pub first_child: Option<usize>,
    pub prev_sibling: Option<usize>,
    pub next_sibling: Option<usize>,
}

impl Node {
    pub(crate) fn new(name: String, depth: u32) -> Self {
        Self {
            name,
            depth,
            ..Self::default()
        }
    }
}
