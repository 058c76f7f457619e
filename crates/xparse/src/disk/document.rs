//! File-backed document: the persisted counterpart of the arena.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::event::{Event, TreeSink};
use crate::tree::{DocumentRead, Relation};

use super::store::{Property, RecordStore};

/// Document whose every field lives in its own record file.
///
/// Only the node count and the last node opened at each depth stay
/// resident; everything else is written as it streams in and read back
/// on demand, so memory use is bounded by nesting depth, not document
/// size. [`release`](Self::release) deletes all records; dropping the
/// value releases best-effort.
#[derive(Debug)]
pub struct FileDocument {
    store: RecordStore,
    count: usize,
    /// Last node opened at each depth.
    open: Vec<usize>,
    released: bool,
}

fn encode_relation(target: Option<usize>) -> String {
    match target {
        Some(index) => (index + 1).to_string(),
        None => "0".into(),
    }
}

fn decode_relation(record: &str, node: usize) -> Result<Option<usize>> {
    let value: usize = record
        .trim()
        .parse()
        .map_err(|_| Error::bare(ErrorKind::NodeOutOfRange { index: node }))?;
    Ok(value.checked_sub(1))
}

impl FileDocument {
    /// Open an empty persisted document inside `dir`, which must exist.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            store: RecordStore::open(dir)?,
            count: 0,
            open: Vec::new(),
            released: false,
        })
    }

    /// Raw access to one persisted field, exactly as stored.
    ///
    /// `item` is required for the indexed properties (content and
    /// attribute items) and rejected for the scalar ones.
    pub fn property(&self, node: usize, property: Property, item: Option<usize>) -> Result<String> {
        if node >= self.count {
            return Err(Error::bare(ErrorKind::NodeOutOfRange { index: node }));
        }
        if property.indexed() != item.is_some() {
            return Err(Error::bare(ErrorKind::InvalidOptions {
                message: "this property does not take that item addressing".into(),
            }));
        }
        self.store.read(node, property, item)
    }

    /// Delete every record this document created. Idempotent.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.store.remove_all(self.count)?;
        self.released = true;
        debug!(nodes = self.count, "persisted document released");
        Ok(())
    }

    fn last_node(&self) -> Result<usize> {
        self.count
            .checked_sub(1)
            .ok_or_else(|| Error::bare(ErrorKind::OutOfOrderEvent))
    }

    fn open_element(&mut self, name: &str, depth: u32) -> Result<()> {
        if depth == 0 && self.count > 0 {
            return Err(Error::bare(ErrorKind::SecondRootElement));
        }
        let index = self.count;
        let depth_ix = depth as usize;
        let parent = depth_ix
            .checked_sub(1)
            .and_then(|d| self.open.get(d).copied());
        let prev = self.open.get(depth_ix).copied();

        self.store.write(index, Property::Name, None, name)?;
        self.store
            .write(index, Property::Depth, None, &depth.to_string())?;
        self.store.write(index, Property::ContentCount, None, "0")?;
        self.store.write(index, Property::AttributeCount, None, "0")?;
        self.store
            .write(index, Property::Parent, None, &encode_relation(parent))?;
        self.store
            .write(index, Property::FirstChild, None, &encode_relation(None))?;
        self.store
            .write(index, Property::PrevSibling, None, &encode_relation(prev))?;
        self.store
            .write(index, Property::NextSibling, None, &encode_relation(None))?;

        if let Some(prev) = prev {
            self.store
                .write(prev, Property::NextSibling, None, &encode_relation(Some(index)))?;
        }
        if let Some(parent) = parent {
            let first = self.store.read(parent, Property::FirstChild, None)?;
            if decode_relation(&first, parent)?.is_none() {
                self.store.write(
                    parent,
                    Property::FirstChild,
                    None,
                    &encode_relation(Some(index)),
                )?;
            }
        }

        self.open.truncate(depth_ix);
        self.open.push(index);
        self.count += 1;
        Ok(())
    }

    fn add_attribute_name(&mut self, name: &str) -> Result<()> {
        let node = self.last_node()?;
        let n = self.store.read_count(node, Property::AttributeCount)?;
        for item in 0..n {
            if self.store.read(node, Property::AttributeName, Some(item))? == name {
                return Err(Error::bare(ErrorKind::DuplicateAttribute {
                    name: name.into(),
                }));
            }
        }
        self.store
            .write(node, Property::AttributeName, Some(n), name)?;
        self.store.write(node, Property::AttributeValue, Some(n), "")?;
        self.store
            .write(node, Property::AttributeCount, None, &(n + 1).to_string())
    }

    fn add_attribute_value(&mut self, value: &str) -> Result<()> {
        let node = self.last_node()?;
        let n = self.store.read_count(node, Property::AttributeCount)?;
        let item = n
            .checked_sub(1)
            .ok_or_else(|| Error::bare(ErrorKind::OutOfOrderEvent))?;
        self.store
            .write(node, Property::AttributeValue, Some(item), value)
    }

    fn add_content(&mut self, text: &str, depth: u32) -> Result<()> {
        let owner = (depth as usize)
            .checked_sub(1)
            .and_then(|d| self.open.get(d).copied())
            .ok_or_else(|| Error::bare(ErrorKind::OutOfOrderEvent))?;
        let n = self.store.read_count(owner, Property::ContentCount)?;
        self.store.write(owner, Property::Content, Some(n), text)?;
        self.store
            .write(owner, Property::ContentCount, None, &(n + 1).to_string())
    }

    fn checked(&self, node: usize) -> Result<()> {
        if node >= self.count {
            return Err(Error::bare(ErrorKind::NodeOutOfRange { index: node }));
        }
        Ok(())
    }
}

impl TreeSink for FileDocument {
    fn event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Open { name, depth } => self.open_element(&name, depth),
            Event::AttrName { name } => self.add_attribute_name(&name),
            Event::AttrValue { value } => self.add_attribute_value(&value),
            Event::Text { text, depth } => self.add_content(&text, depth),
        }
    }
}

impl DocumentRead for FileDocument {
    fn node_count(&self) -> usize {
        self.count
    }

    fn name(&self, node: usize) -> Result<String> {
        self.checked(node)?;
        self.store.read(node, Property::Name, None)
    }

    fn depth(&self, node: usize) -> Result<u32> {
        self.checked(node)?;
        let record = self.store.read(node, Property::Depth, None)?;
        record
            .trim()
            .parse()
            .map_err(|_| Error::bare(ErrorKind::NodeOutOfRange { index: node }))
    }

    fn content_count(&self, node: usize) -> Result<usize> {
        self.checked(node)?;
        self.store.read_count(node, Property::ContentCount)
    }

    fn content(&self, node: usize, item: usize) -> Result<String> {
        self.checked(node)?;
        self.store.read(node, Property::Content, Some(item))
    }

    fn attribute_count(&self, node: usize) -> Result<usize> {
        self.checked(node)?;
        self.store.read_count(node, Property::AttributeCount)
    }

    fn attribute_name(&self, node: usize, item: usize) -> Result<String> {
        self.checked(node)?;
        self.store.read(node, Property::AttributeName, Some(item))
    }

    fn attribute_value(&self, node: usize, item: usize) -> Result<String> {
        self.checked(node)?;
        self.store.read(node, Property::AttributeValue, Some(item))
    }

    fn attribute(&self, node: usize, name: &str) -> Result<Option<String>> {
        self.checked(node)?;
        let n = self.store.read_count(node, Property::AttributeCount)?;
        for item in 0..n {
            if self.store.read(node, Property::AttributeName, Some(item))? == name {
                return Ok(Some(self.store.read(
                    node,
                    Property::AttributeValue,
                    Some(item),
                )?));
            }
        }
        Ok(None)
    }

    fn relation(&self, node: usize, relation: Relation) -> Result<Option<usize>> {
        self.checked(node)?;
        let property = match relation {
            Relation::Parent => Property::Parent,
            Relation::FirstChild => Property::FirstChild,
            Relation::PrevSibling => Property::PrevSibling,
            Relation::NextSibling => Property::NextSibling,
        };
        let record = self.store.read(node, property, None)?;
        decode_relation(&record, node)
    }
}

impl Drop for FileDocument {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Scanner;

    fn parse_into(dir: &Path, input: &str) -> FileDocument {
        let doc = FileDocument::create(dir).expect("create");
        Scanner::new(input.as_bytes(), doc).run().expect("parse")
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).expect("read_dir").next().is_none()
    }

    #[test]
    fn test_fields_round_trip_through_disk() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let doc = parse_into(tmp.path(), r#"<a k="v">one<b/>two</a>"#);
        assert_eq!(doc.node_count(), 2);
        assert_eq!(doc.name(0).unwrap(), "a");
        assert_eq!(doc.depth(1).unwrap(), 1);
        assert_eq!(doc.content_count(0).unwrap(), 2);
        assert_eq!(doc.content(0, 1).unwrap(), "two");
        assert_eq!(doc.attribute(0, "k").unwrap().as_deref(), Some("v"));
        assert_eq!(doc.relation(1, Relation::Parent).unwrap(), Some(0));
        assert_eq!(doc.relation(0, Relation::FirstChild).unwrap(), Some(1));
        assert_eq!(doc.relation(1, Relation::NextSibling).unwrap(), None);
    }

    #[test]
    fn test_sibling_records() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let doc = parse_into(tmp.path(), "<a><b/><c/></a>");
        assert_eq!(doc.relation(1, Relation::NextSibling).unwrap(), Some(2));
        assert_eq!(doc.relation(2, Relation::PrevSibling).unwrap(), Some(1));
        // raw record is 1-based
        assert_eq!(doc.property(1, Property::NextSibling, None).unwrap(), "3");
        assert_eq!(doc.property(1, Property::Parent, None).unwrap(), "1");
        assert_eq!(doc.property(0, Property::Parent, None).unwrap(), "0");
    }

    #[test]
    fn test_property_addressing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let doc = parse_into(tmp.path(), "<a>x</a>");
        assert_eq!(doc.property(0, Property::Content, Some(0)).unwrap(), "x");
        assert!(doc.property(0, Property::Content, None).is_err());
        assert!(doc.property(0, Property::Name, Some(0)).is_err());
        assert!(doc.property(5, Property::Name, None).is_err());
    }

    #[test]
    fn test_release_empties_directory_and_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut doc = parse_into(tmp.path(), r#"<a k="v">txt<b/></a>"#);
        assert!(!dir_is_empty(tmp.path()));
        doc.release().expect("release");
        assert!(dir_is_empty(tmp.path()));
        doc.release().expect("release twice");
    }

    #[test]
    fn test_drop_cleans_up() {
        let tmp = tempfile::tempdir().expect("tempdir");
        {
            let _doc = parse_into(tmp.path(), "<a><b/></a>");
            assert!(!dir_is_empty(tmp.path()));
        }
        assert!(dir_is_empty(tmp.path()));
    }

    #[test]
    fn test_duplicate_attribute_detected_from_disk() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let doc = FileDocument::create(tmp.path()).expect("create");
        let err = Scanner::new(br#"<a x="1" x="2"/>"#.as_slice(), doc)
            .run()
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::DuplicateAttribute { name: "x".into() }
        );
        // the failed parse dropped its document and its records with it
        assert!(dir_is_empty(tmp.path()));
    }

    #[test]
    fn test_missing_directory_is_a_resource_error() {
        let err = FileDocument::create("/no/such/dir").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }
}
