//! Read-side contract shared by both document backends.

use crate::error::Result;

/// The four structural relations recorded for every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Parent,
    FirstChild,
    PrevSibling,
    NextSibling,
}

impl Relation {
    /// All relations, in persisted order.
    pub const ALL: [Self; 4] = [
        Self::Parent,
        Self::FirstChild,
        Self::PrevSibling,
        Self::NextSibling,
    ];
}

/// Uniform read access to a parsed document.
///
/// Implemented by the in-memory arena and the file-backed store, so the
/// query engine, the serializer, and the binary codec run against either.
/// Accessors return owned strings: the file-backed store materializes
/// each field from disk on demand.
pub trait DocumentRead {
    /// Number of nodes in the document, in document order.
    fn node_count(&self) -> usize;

    fn name(&self, node: usize) -> Result<String>;

    fn depth(&self, node: usize) -> Result<u32>;

    fn content_count(&self, node: usize) -> Result<usize>;

    /// The `item`-th text fragment of `node`.
    fn content(&self, node: usize, item: usize) -> Result<String>;

    fn attribute_count(&self, node: usize) -> Result<usize>;

    fn attribute_name(&self, node: usize, item: usize) -> Result<String>;

    fn attribute_value(&self, node: usize, item: usize) -> Result<String>;

    /// Value of the attribute named `name`, if present.
    fn attribute(&self, node: usize, name: &str) -> Result<Option<String>>;

    /// Index of the related node, or `None` when the relation is vacant.
    fn relation(&self, node: usize, relation: Relation) -> Result<Option<usize>>;
}
