//! Text serializer.
//!
//! Serialization re-validates the tree: documents may have been decoded
//! from binary or assembled programmatically, so tag and attribute names
//! go through the same grammar the scanner enforces, and attribute names
//! are re-checked for uniqueness. On any failure the partially written
//! file is removed before the error returns.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::names::validate_name;
use crate::tree::{DocumentRead, Relation};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Largest accepted indent width and vertical spacing.
pub const MAX_STEP: u8 = 10;

/// Output shape: `indent` spaces per nesting level, `vertical_spacing`
/// extra blank lines between structural lines. Both at most [`MAX_STEP`].
/// Zero for both produces compact single-line output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub indent: u8,
    pub vertical_spacing: u8,
}

impl WriteOptions {
    fn validate(&self) -> Result<()> {
        if self.indent > MAX_STEP || self.vertical_spacing > MAX_STEP {
            return Err(Error::bare(ErrorKind::InvalidOptions {
                message: format!(
                    "indent and vertical spacing may not exceed {MAX_STEP}"
                ),
            }));
        }
        Ok(())
    }

    fn compact(&self) -> bool {
        self.indent == 0 && self.vertical_spacing == 0
    }
}

/// Serialize `doc` to `path`.
pub fn write_file<D: DocumentRead + ?Sized>(
    doc: &D,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<()> {
    options.validate()?;
    if doc.node_count() == 0 {
        return Err(Error::bare(ErrorKind::EmptyDocument));
    }
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(&e, path))?;
    let mut emitter = Emitter {
        out: BufWriter::new(file),
        options: *options,
        path,
    };
    let result = emitter
        .document(doc)
        .and_then(|()| emitter.out.flush().map_err(|e| Error::io(&e, path)));
    if result.is_err() {
        let _ = fs::remove_file(path);
    } else {
        debug!(path = %path.display(), "document serialized");
    }
    result
}

struct Emitter<'a, W: Write> {
    out: W,
    options: WriteOptions,
    path: &'a Path,
}

impl<W: Write> Emitter<'_, W> {
    fn raw(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| Error::io(&e, self.path))
    }

    /// Line separator plus indentation for the next line.
    fn newline(&mut self, depth: u32) -> Result<()> {
        if self.options.compact() {
            return Ok(());
        }
        for _ in 0..=self.options.vertical_spacing {
            self.raw("\n")?;
        }
        let pad = " ".repeat(usize::from(self.options.indent) * depth as usize);
        self.raw(&pad)
    }

    fn document<D: DocumentRead + ?Sized>(&mut self, doc: &D) -> Result<()> {
        self.raw(DECLARATION)?;
        self.newline(0)?;
        if self.options.compact() {
            // the declaration still sits on its own line
            self.raw("\n")?;
        }
        self.node(doc, 0, 0)
    }

    /// Children of `node` in sibling order.
    fn children<D: DocumentRead + ?Sized>(&self, doc: &D, node: usize) -> Result<Vec<usize>> {
        let mut children = Vec::new();
        let mut cursor = doc.relation(node, Relation::FirstChild)?;
        while let Some(child) = cursor {
            children.push(child);
            cursor = doc.relation(child, Relation::NextSibling)?;
        }
        Ok(children)
    }

    fn open_tag<D: DocumentRead + ?Sized>(
        &mut self,
        doc: &D,
        node: usize,
        empty: bool,
    ) -> Result<()> {
        let name = doc.name(node)?;
        validate_name(&name, false)?;
        self.raw("<")?;
        self.raw(&name)?;
        let attrs = doc.attribute_count(node)?;
        for item in 0..attrs {
            let attr = doc.attribute_name(node, item)?;
            validate_name(&attr, true)?;
            for earlier in 0..item {
                if doc.attribute_name(node, earlier)? == attr {
                    return Err(Error::bare(ErrorKind::DuplicateAttribute { name: attr }));
                }
            }
            let value = escape_attribute(&doc.attribute_value(node, item)?);
            self.raw(&format!(" {attr}=\"{value}\""))?;
        }
        self.raw(if empty { "/>" } else { ">" })
    }

    fn node<D: DocumentRead + ?Sized>(&mut self, doc: &D, node: usize, depth: u32) -> Result<()> {
        let children = self.children(doc, node)?;
        let contents = doc.content_count(node)?;

        if children.is_empty() && contents == 0 {
            return self.open_tag(doc, node, true);
        }

        // a leaf with a single fragment stays on one line
        if children.is_empty() && contents == 1 {
            self.open_tag(doc, node, false)?;
            self.raw(&escape_content(&doc.content(node, 0)?)?)?;
            return self.close_tag(doc, node);
        }

        self.open_tag(doc, node, false)?;
        let mut item = 0;
        if item < contents {
            self.newline(depth + 1)?;
            self.raw(&escape_content(&doc.content(node, item)?)?)?;
            item += 1;
        }
        for &child in &children {
            self.newline(depth + 1)?;
            self.node(doc, child, depth + 1)?;
            if item < contents {
                self.newline(depth + 1)?;
                self.raw(&escape_content(&doc.content(node, item)?)?)?;
                item += 1;
            }
        }
        // fragments beyond children + 1 (programmatic trees) trail here
        while item < contents {
            self.newline(depth + 1)?;
            self.raw(&escape_content(&doc.content(node, item)?)?)?;
            item += 1;
        }
        self.newline(depth)?;
        self.close_tag(doc, node)
    }

    fn close_tag<D: DocumentRead + ?Sized>(&mut self, doc: &D, node: usize) -> Result<()> {
        self.raw(&format!("</{}>", doc.name(node)?))
    }
}

fn escape_plain(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_plain(value, true)
}

/// Escape one content fragment, passing literal CDATA sections through
/// verbatim. An opener without its closer is an error.
fn escape_content(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(CDATA_OPEN) {
        out.push_str(&escape_plain(&rest[..at], false));
        let section = &rest[at..];
        let end = section
            .find(CDATA_CLOSE)
            .ok_or_else(|| Error::bare(ErrorKind::UnterminatedCdata))?;
        let end = end + CDATA_CLOSE.len();
        out.push_str(&section[..end]);
        rest = &section[end..];
    }
    out.push_str(&escape_plain(rest, false));
    Ok(out)
}
