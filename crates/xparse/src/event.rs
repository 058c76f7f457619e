//! Structural events emitted by the scanner and the sink contract
//! both tree backends implement

use crate::error::Result;

/// Events emitted by the streaming scanner, in document order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new element opened at the given nesting depth
    Open { name: String, depth: u32 },
    /// Attribute name inside the most recently opened element
    AttrName { name: String },
    /// Attribute value belonging to the most recent attribute name
    AttrValue { value: String },
    /// One text fragment; `depth` is the scanner depth where it appeared,
    /// so the owning element is the one still open at `depth - 1`
    Text { text: String, depth: u32 },
}

/// Consumer of scanner events.
///
/// The scanner depends only on this trait; the in-memory arena and the
/// file-backed store both implement it.
pub trait TreeSink {
    fn event(&mut self, event: Event) -> Result<()>;
}
