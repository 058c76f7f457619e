//! Record files backing the persisted document.
//!
//! Every (node, field, item) triple lives in its own file named
//! `.{token}.{index}.{tag}` or `.{token}.{index}.{tag}.{item}` inside the
//! store directory. The token is ten random lowercase letters drawn when
//! the store opens, namespacing concurrent documents in one directory.

use std::fs;
use std::io::ErrorKind as IoKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Length of the random namespace token.
const TOKEN_LEN: usize = 10;

/// One persisted field of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
    /// Tag name (`nn`).
    Name,
    /// Nesting depth (`l`).
    Depth,
    /// Number of content fragments (`cN`).
    ContentCount,
    /// Number of attributes (`aN`).
    AttributeCount,
    /// One content fragment (`c`, indexed).
    Content,
    /// One attribute name (`an`, indexed).
    AttributeName,
    /// One attribute value (`av`, indexed).
    AttributeValue,
    /// Parent relation (`a`), 1-based, 0 = none.
    Parent,
    /// First-child relation (`d`), 1-based, 0 = none.
    FirstChild,
    /// Previous-sibling relation (`ps`), 1-based, 0 = none.
    PrevSibling,
    /// Next-sibling relation (`ns`), 1-based, 0 = none.
    NextSibling,
}

impl Property {
    pub(crate) const fn tag(self) -> &'static str {
        match self {
            Self::Name => "nn",
            Self::Depth => "l",
            Self::ContentCount => "cN",
            Self::AttributeCount => "aN",
            Self::Content => "c",
            Self::AttributeName => "an",
            Self::AttributeValue => "av",
            Self::Parent => "a",
            Self::FirstChild => "d",
            Self::PrevSibling => "ps",
            Self::NextSibling => "ns",
        }
    }

    /// Properties addressed with an item index.
    pub(crate) const fn indexed(self) -> bool {
        matches!(self, Self::Content | Self::AttributeName | Self::AttributeValue)
    }
}

/// Flat file store for one persisted document.
#[derive(Debug)]
pub(crate) struct RecordStore {
    dir: PathBuf,
    token: String,
}

fn random_token() -> String {
    (0..TOKEN_LEN)
        .map(|_| char::from(b'a' + rand::random::<u8>() % 26))
        .collect()
}

impl RecordStore {
    /// Open a store in `dir`, probing that the directory is writable.
    pub(crate) fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            dir: dir.as_ref().to_path_buf(),
            token: random_token(),
        };
        let probe = store.dir.join(format!(".{}.probe", store.token));
        fs::write(&probe, b"").map_err(|e| Error::io(&e, &probe))?;
        fs::remove_file(&probe).map_err(|e| Error::io(&e, &probe))?;
        debug!(dir = %store.dir.display(), token = %store.token, "record store opened");
        Ok(store)
    }

    pub(crate) fn path(&self, node: usize, property: Property, item: Option<usize>) -> PathBuf {
        let tag = property.tag();
        let name = match item {
            Some(item) => format!(".{}.{node}.{tag}.{item}", self.token),
            None => format!(".{}.{node}.{tag}", self.token),
        };
        self.dir.join(name)
    }

    pub(crate) fn write(
        &self,
        node: usize,
        property: Property,
        item: Option<usize>,
        value: &str,
    ) -> Result<()> {
        let path = self.path(node, property, item);
        fs::write(&path, value.as_bytes()).map_err(|e| Error::io(&e, &path))
    }

    pub(crate) fn read(&self, node: usize, property: Property, item: Option<usize>) -> Result<String> {
        let path = self.path(node, property, item);
        fs::read_to_string(&path).map_err(|e| {
            if e.kind() == IoKind::NotFound {
                Error::bare(ErrorKind::NodeOutOfRange { index: node })
            } else {
                Error::io(&e, &path)
            }
        })
    }

    /// Read a record that may legitimately be absent.
    pub(crate) fn read_opt(
        &self,
        node: usize,
        property: Property,
        item: Option<usize>,
    ) -> Result<Option<String>> {
        let path = self.path(node, property, item);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == IoKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&e, &path)),
        }
    }

    /// Read a decimal counter record.
    pub(crate) fn read_count(&self, node: usize, property: Property) -> Result<usize> {
        let value = self.read(node, property, None)?;
        value
            .trim()
            .parse()
            .map_err(|_| Error::bare(ErrorKind::NodeOutOfRange { index: node }))
    }

    /// Delete a record; a record that is already gone is not an error.
    pub(crate) fn remove(&self, node: usize, property: Property, item: Option<usize>) -> Result<()> {
        let path = self.path(node, property, item);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&e, &path)),
        }
    }

    /// Delete every record of the first `count` nodes.
    pub(crate) fn remove_all(&self, count: usize) -> Result<()> {
        for node in 0..count {
            let contents = self
                .read_opt(node, Property::ContentCount, None)?
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0usize);
            let attrs = self
                .read_opt(node, Property::AttributeCount, None)?
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0usize);
            for item in 0..contents {
                self.remove(node, Property::Content, Some(item))?;
            }
            for item in 0..attrs {
                self.remove(node, Property::AttributeName, Some(item))?;
                self.remove(node, Property::AttributeValue, Some(item))?;
            }
            for property in [
                Property::Name,
                Property::Depth,
                Property::ContentCount,
                Property::AttributeCount,
                Property::Parent,
                Property::FirstChild,
                Property::PrevSibling,
                Property::NextSibling,
            ] {
                self.remove(node, property, None)?;
            }
        }
        debug!(count, "record store cleaned");
        Ok(())
    }
}
