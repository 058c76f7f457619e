//! Streaming XML parser with a dual-backend document model.
//!
//! The scanner walks its input exactly once, byte by byte, and feeds
//! structural events into a [`TreeSink`]. Two sinks ship with the crate:
//! the in-memory arena [`Document`] and the file-backed [`FileDocument`],
//! which keeps every node field in its own record file and holds only
//! O(depth) state in memory. Queries, the text serializer, and the binary
//! codec all run against the common [`DocumentRead`] trait, so they work
//! with either backend.
//!
//! The grammar is a strict subset of XML: one root element, ASCII names,
//! character entity references, comments, CDATA, and a skipped
//! `<?...?>` declaration. Anything outside the subset fails fast with a
//! positioned [`Error`].
//!
//! # Examples
//!
//! ```
//! use xparse::{parse_str, Direction, DocumentRead, Query};
//!
//! let doc = parse_str(r#"<library><book id="7">Dune</book></library>"#)?;
//! assert_eq!(doc.name(0)?, "library");
//!
//! let hits = xparse::find(&doc, &Query::new().tag_name("book"), Direction::Forward)?;
//! assert_eq!(hits, vec![1]);
//! assert_eq!(doc.content(hits[0], 0)?, "Dune");
//! # Ok::<(), xparse::Error>(())
//! ```

pub mod binary;
mod cursor;
mod disk;
mod error;
mod event;
mod names;
mod query;
mod scan;
mod tree;
mod writer;

use std::path::Path;

pub use cursor::Cursor;
pub use disk::{FileDocument, Property};
pub use error::{Error, ErrorKind, Pos, Result, Span};
pub use event::{Event, TreeSink};
pub use query::{find, Direction, Query};
pub use scan::Scanner;
pub use tree::{Document, DocumentRead, Node, Relation};
pub use writer::{write_file, WriteOptions, MAX_STEP};

/// Parse a byte slice into an in-memory [`Document`].
pub fn parse_bytes(input: &[u8]) -> Result<Document> {
    let doc = Scanner::new(input, Document::new()).run()?;
    if doc.node_count() == 0 {
        return Err(Error::bare(ErrorKind::EmptyDocument));
    }
    Ok(doc)
}

/// Parse a string into an in-memory [`Document`].
pub fn parse_str(input: &str) -> Result<Document> {
    parse_bytes(input.as_bytes())
}

/// Read and parse a file into an in-memory [`Document`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(&e, path))?;
    parse_bytes(&bytes)
}

/// Read and parse a file into a [`FileDocument`] persisted under `dir`.
///
/// `dir` must already exist. The returned document cleans its record
/// files up on [`FileDocument::release`] or drop.
pub fn parse_file_backed(path: impl AsRef<Path>, dir: impl AsRef<Path>) -> Result<FileDocument> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(&e, path))?;
    let doc = Scanner::new(&bytes, FileDocument::create(dir)?).run()?;
    if doc.node_count() == 0 {
        return Err(Error::bare(ErrorKind::EmptyDocument));
    }
    Ok(doc)
}
