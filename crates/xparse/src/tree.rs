//! In-memory document model: arena nodes and the shared read contract.

mod document;
mod node;
mod read;

pub use document::Document;
pub use node::Node;
pub use read::{DocumentRead, Relation};
