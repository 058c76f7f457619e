//! Persisted document backend: one record file per node field.

mod document;
mod store;

pub use document::FileDocument;
pub use store::Property;
