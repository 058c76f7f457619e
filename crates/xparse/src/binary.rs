//! Fixed-width binary codec.
//!
//! Everything is a 16-bit little-endian field: the node count, per-node
//! scalars, string lengths, and the relation tuples. Relations are
//! 1-based with 0 marking a vacant slot, so the node limit is one short
//! of the field range. Files carry the `.xpb` suffix, appended when the
//! given path lacks it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::tree::{Document, DocumentRead, Node, Relation};

const SUFFIX: &str = "xpb";

/// Largest node count and string byte length one field can address.
pub const MAX_FIELD: usize = u16::MAX as usize;

fn with_suffix(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == SUFFIX) {
        return path.to_path_buf();
    }
    let mut os = OsString::from(path.as_os_str());
    os.push(".");
    os.push(SUFFIX);
    PathBuf::from(os)
}

fn put_u16(buf: &mut Vec<u8>, value: usize) {
    // callers bound-check against MAX_FIELD first
    buf.extend_from_slice(&(value as u16).to_le_bytes());
}

fn put_str(buf: &mut Vec<u8>, value: &str) -> Result<()> {
    if value.len() > MAX_FIELD {
        return Err(Error::bare(ErrorKind::ValueTooLong { max: MAX_FIELD }));
    }
    put_u16(buf, value.len());
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn put_relation(buf: &mut Vec<u8>, target: Option<usize>) {
    put_u16(buf, target.map_or(0, |index| index + 1));
}

/// Encode `doc` to `path` (suffix appended when absent), returning the
/// path actually written.
pub fn encode_file<D: DocumentRead + ?Sized>(doc: &D, path: impl AsRef<Path>) -> Result<PathBuf> {
    let count = doc.node_count();
    if count > MAX_FIELD {
        return Err(Error::bare(ErrorKind::TooManyNodes { max: MAX_FIELD }));
    }

    let mut buf = Vec::new();
    put_u16(&mut buf, count);
    for node in 0..count {
        let contents = doc.content_count(node)?;
        let attrs = doc.attribute_count(node)?;
        if contents > MAX_FIELD || attrs > MAX_FIELD {
            return Err(Error::bare(ErrorKind::ValueTooLong { max: MAX_FIELD }));
        }
        put_u16(&mut buf, doc.depth(node)? as usize);
        put_u16(&mut buf, contents);
        put_u16(&mut buf, attrs);
        put_str(&mut buf, &doc.name(node)?)?;
        for item in 0..contents {
            put_str(&mut buf, &doc.content(node, item)?)?;
        }
        for item in 0..attrs {
            put_str(&mut buf, &doc.attribute_name(node, item)?)?;
            put_str(&mut buf, &doc.attribute_value(node, item)?)?;
        }
    }
    for node in 0..count {
        for relation in Relation::ALL {
            put_relation(&mut buf, doc.relation(node, relation)?);
        }
    }

    let path = with_suffix(path.as_ref());
    fs::write(&path, &buf).map_err(|e| Error::io(&e, &path))?;
    debug!(path = %path.display(), nodes = count, bytes = buf.len(), "binary encoded");
    Ok(path)
}

struct Reader<'a> {
    buf: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    fn fail(message: &str) -> Error {
        Error::bare(ErrorKind::InvalidBinary {
            message: message.into(),
        })
    }

    fn take_u16(&mut self) -> Result<usize> {
        let end = self.at + 2;
        let bytes = self
            .buf
            .get(self.at..end)
            .ok_or_else(|| Self::fail("truncated field"))?;
        self.at = end;
        Ok(usize::from(u16::from_le_bytes([bytes[0], bytes[1]])))
    }

    fn take_str(&mut self) -> Result<String> {
        let len = self.take_u16()?;
        let end = self.at + len;
        let bytes = self
            .buf
            .get(self.at..end)
            .ok_or_else(|| Self::fail("truncated string"))?;
        self.at = end;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::bare(ErrorKind::InvalidUtf8))
    }

    fn take_relation(&mut self, count: usize) -> Result<Option<usize>> {
        let value = self.take_u16()?;
        if value > count {
            return Err(Self::fail("relation index out of range"));
        }
        Ok(value.checked_sub(1))
    }

    fn done(&self) -> bool {
        self.at == self.buf.len()
    }
}

/// Decode a binary document file back into an in-memory [`Document`].
pub fn decode_file(path: impl AsRef<Path>) -> Result<Document> {
    let path = with_suffix(path.as_ref());
    let buf = fs::read(&path).map_err(|e| Error::io(&e, &path))?;
    let mut reader = Reader { buf: &buf, at: 0 };

    let count = reader.take_u16()?;
    let mut doc = Document::new();
    for _ in 0..count {
        let depth = reader.take_u16()? as u32;
        let contents = reader.take_u16()?;
        let attrs = reader.take_u16()?;
        let mut node = Node::new(reader.take_str()?, depth);
        for _ in 0..contents {
            node.contents.push(reader.take_str()?);
        }
        for _ in 0..attrs {
            let name = reader.take_str()?;
            let value = reader.take_str()?;
            if node.attributes.insert(name.clone(), value).is_some() {
                return Err(Error::bare(ErrorKind::DuplicateAttribute { name }));
            }
        }
        doc.push_node(node);
    }
    for index in 0..count {
        let parent = reader.take_relation(count)?;
        let first_child = reader.take_relation(count)?;
        let prev_sibling = reader.take_relation(count)?;
        let next_sibling = reader.take_relation(count)?;
        if let Some(node) = doc.node_mut(index) {
            node.parent = parent;
            node.first_child = first_child;
            node.prev_sibling = prev_sibling;
            node.next_sibling = next_sibling;
        }
    }
    if !reader.done() {
        return Err(Reader::fail("trailing bytes"));
    }
    debug!(path = %path.display(), nodes = count, "binary decoded");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Scanner;

    fn parse(input: &str) -> Document {
        Scanner::new(input.as_bytes(), Document::new())
            .run()
            .expect("parse")
    }

    #[test]
    fn test_suffix_appended_once() {
        assert_eq!(with_suffix(Path::new("/t/doc")), Path::new("/t/doc.xpb"));
        assert_eq!(with_suffix(Path::new("/t/doc.xpb")), Path::new("/t/doc.xpb"));
        assert_eq!(
            with_suffix(Path::new("/t/doc.xml")),
            Path::new("/t/doc.xml.xpb")
        );
    }

    #[test]
    fn test_round_trip() {
        let doc = parse(r#"<a k="v" l="w">one<b>x</b>two<c/></a>"#);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = encode_file(&doc, dir.path().join("doc")).expect("encode");
        assert!(path.extension().is_some_and(|e| e == "xpb"));
        let back = decode_file(&path).expect("decode");
        assert_eq!(back.node_count(), doc.node_count());
        for node in 0..doc.node_count() {
            assert_eq!(back.node(node), doc.node(node));
        }
    }

    #[test]
    fn test_relations_survive() {
        let doc = parse("<a><b/><c><d/></c></a>");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = encode_file(&doc, dir.path().join("t")).expect("encode");
        let back = decode_file(&path).expect("decode");
        assert_eq!(back.relation(2, Relation::PrevSibling).unwrap(), Some(1));
        assert_eq!(back.relation(2, Relation::FirstChild).unwrap(), Some(3));
        assert_eq!(back.relation(3, Relation::Parent).unwrap(), Some(2));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = parse("<a>hello</a>");
        let path = encode_file(&doc, dir.path().join("t")).expect("encode");
        let bytes = fs::read(&path).expect("read");
        let cut = dir.path().join("cut.xpb");
        fs::write(&cut, &bytes[..bytes.len() - 3]).expect("write");
        let err = decode_file(&cut).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBinary { .. }));
    }

    #[test]
    fn test_relation_out_of_range_rejected() {
        // one node, no strings beyond the name, parent points past the end
        let mut buf = Vec::new();
        put_u16(&mut buf, 1); // count
        put_u16(&mut buf, 0); // depth
        put_u16(&mut buf, 0); // contents
        put_u16(&mut buf, 0); // attrs
        put_str(&mut buf, "a").unwrap();
        put_u16(&mut buf, 9); // parent: out of range
        put_u16(&mut buf, 0);
        put_u16(&mut buf, 0);
        put_u16(&mut buf, 0);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.xpb");
        fs::write(&path, &buf).expect("write");
        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBinary { .. }));
    }

    #[test]
    fn test_oversized_string_rejected() {
        let mut doc = Document::new();
        doc.push_node(Node::new("a".into(), 0));
        if let Some(node) = doc.node_mut(0) {
            node.contents.push("x".repeat(MAX_FIELD + 1));
        }
        let dir = tempfile::tempdir().expect("tempdir");
        let err = encode_file(&doc, dir.path().join("t")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValueTooLong { max: MAX_FIELD });
    }

    #[test]
    fn test_encode_from_persisted_backend() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = tmp.path().join("store");
        fs::create_dir(&store).expect("mkdir");
        let file_doc = crate::disk::FileDocument::create(&store).expect("create");
        let file_doc = Scanner::new(br#"<a k="v"><b>x</b></a>"#.as_slice(), file_doc)
            .run()
            .expect("parse");
        let path = encode_file(&file_doc, tmp.path().join("doc")).expect("encode");
        let back = decode_file(&path).expect("decode");
        assert_eq!(back.node_count(), 2);
        assert_eq!(back.name(1).unwrap(), "b");
        assert_eq!(back.attribute(0, "k").unwrap().as_deref(), Some("v"));
        assert_eq!(back.relation(0, Relation::FirstChild).unwrap(), Some(1));
    }
}
