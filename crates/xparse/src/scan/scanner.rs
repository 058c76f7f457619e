//! Single-pass streaming scanner.
//!
//! The scanner walks the input exactly once, byte by byte, with no
//! lookahead and no backtracking. Each byte either advances the current
//! [`Mode`], accumulates into the pending word, or is a structural
//! character that flushes the word as an [`Event`] into the sink.
//! The first offending byte aborts the parse.

use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Pos, Result};
use crate::event::{Event, TreeSink};
use crate::names::{is_name_char, is_name_start};

use super::entity::{self, MAX_ENTITY_BODY, MAX_ENTITY_LEN};
use super::state::{Flags, Mode, Quote};

/// Characters that collapse to a single space inside text content.
fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Expected bytes after `<!` on the way into a CDATA section. Progress
/// through this table is tracked by [`Mode::CdataOpen`].
const CDATA_OPEN: [u8; 7] = [b'[', b'C', b'D', b'A', b'T', b'A', b'['];

/// Streaming scanner over a byte slice, feeding structural events into
/// a [`TreeSink`].
pub struct Scanner<'a, S> {
    cursor: Cursor<'a>,
    sink: S,
    mode: Mode,
    flags: Flags,
    /// Pending tag name, attribute name, or text fragment.
    word: Vec<u8>,
    /// Body of an in-flight character entity reference, `Some` between
    /// the `&` and the `;`.
    entity: Option<Vec<u8>>,
    /// Nesting depth: number of currently open elements.
    depth: u32,
    /// The pending word holds text content rather than a name.
    pcdata: bool,
    /// Position of the byte being processed, for error spans.
    pos: Pos,
}

impl<'a, S: TreeSink> Scanner<'a, S> {
    pub fn new(input: &'a [u8], sink: S) -> Self {
        Self {
            cursor: Cursor::new(input),
            sink,
            mode: Mode::Text,
            flags: Flags::default(),
            word: Vec::new(),
            entity: None,
            depth: 0,
            pcdata: false,
            pos: Pos::new(0, 1, 1),
        }
    }

    /// Consume the entire input, returning the sink on success.
    pub fn run(mut self) -> Result<S> {
        debug!(mode = ?self.mode, "scan start");
        while let Some(b) = {
            self.pos = self.cursor.position();
            self.cursor.next()
        } {
            match self.mode {
                Mode::Text => self.on_text(b)?,
                Mode::Heading => self.on_heading(b),
                Mode::CommentOpen => self.on_comment_open(b)?,
                Mode::Comment => self.on_comment(b)?,
                Mode::CdataOpen(step) => self.on_cdata_open(b, step)?,
                Mode::Cdata => self.on_cdata(b),
                Mode::Tag => self.on_tag(b)?,
                Mode::Attributes => self.on_attributes(b)?,
                Mode::AttrValue => self.on_attr_value(b)?,
            }
        }
        self.at_eof()?;
        debug!("scan complete");
        Ok(self.sink)
    }

    fn fail(&self, kind: ErrorKind) -> Error {
        Error::at(kind, self.pos)
    }

    fn emit(&mut self, event: Event) -> Result<()> {
        let pos = self.pos;
        self.sink.event(event).map_err(|e| e.at_pos(pos))
    }

    /// Take the pending word as a `String`.
    fn take_word(&mut self) -> Result<String> {
        String::from_utf8(std::mem::take(&mut self.word))
            .map_err(|_| self.fail(ErrorKind::InvalidUtf8))
    }

    /// Flush the pending text fragment, if any, trimming the trailing
    /// collapsed space.
    fn flush_text(&mut self) -> Result<()> {
        if self.word.last() == Some(&b' ') && self.flags.ws_pending {
            self.word.pop();
        }
        self.pcdata = false;
        self.flags.ws_pending = false;
        if self.word.is_empty() {
            return Ok(());
        }
        let text = self.take_word()?;
        let depth = self.depth;
        self.emit(Event::Text { text, depth })
    }

    /// Decode the buffered entity body and append the character to the
    /// pending word.
    fn finish_entity(&mut self) -> Result<()> {
        let buf = self.entity.take().unwrap_or_default();
        let body =
            String::from_utf8(buf).map_err(|_| self.fail(ErrorKind::InvalidUtf8))?;
        let ch = entity::decode(&body).map_err(|e| e.at_pos(self.pos))?;
        let mut utf8 = [0u8; 4];
        self.word.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }

    /// Buffer one byte of an in-flight entity body, or finish it on `;`.
    /// Returns `true` when the byte was consumed by the entity.
    fn entity_byte(&mut self, b: u8) -> Result<bool> {
        let Some(buf) = &mut self.entity else {
            return Ok(false);
        };
        if b == b';' {
            self.finish_entity()?;
            return Ok(true);
        }
        if buf.len() == MAX_ENTITY_BODY {
            return Err(self.fail(ErrorKind::EntityTooLong { max: MAX_ENTITY_LEN }));
        }
        buf.push(b);
        Ok(true)
    }

    /// Track progress through a possible reserved `xml` name prefix and
    /// append one name byte to the pending word.
    fn push_name_byte(&mut self, b: u8, attribute: bool) -> Result<()> {
        match self.flags.xml_guard {
            1 if matches!(b, b'm' | b'M') => self.flags.xml_guard = 2,
            2 if matches!(b, b'l' | b'L') => {
                return Err(self.fail(ErrorKind::ReservedName));
            }
            _ => self.flags.xml_guard = 0,
        }
        if !is_name_char(b) {
            let kind = if attribute {
                ErrorKind::InvalidAttributeChar
            } else {
                ErrorKind::InvalidTagChar
            };
            return Err(self.fail(kind));
        }
        self.word.push(b);
        Ok(())
    }

    /// First byte of a name: validate it and arm the reserved-prefix guard.
    fn start_name_byte(&mut self, b: u8, attribute: bool) -> Result<()> {
        if !is_name_start(b) {
            let kind = if attribute {
                ErrorKind::InvalidAttributeStart
            } else {
                ErrorKind::InvalidTagStart
            };
            return Err(self.fail(kind));
        }
        self.flags.xml_guard = u8::from(matches!(b, b'x' | b'X'));
        self.word.push(b);
        Ok(())
    }

    fn on_text(&mut self, b: u8) -> Result<()> {
        if b == b'<' {
            if self.entity.is_some() {
                return Err(self.fail(ErrorKind::BareAmpersand));
            }
            self.mode = Mode::Tag;
            self.flags.enter_tag();
            return Ok(());
        }
        if is_ws(b) {
            if self.entity.is_some() {
                return Err(self.fail(ErrorKind::BareAmpersand));
            }
            if self.pcdata && !self.flags.ws_pending {
                self.word.push(b' ');
                self.flags.ws_pending = true;
            }
            return Ok(());
        }
        self.flags.ws_pending = false;
        if self.entity_byte(b)? {
            self.pcdata = true;
            return Ok(());
        }
        if self.depth == 0 {
            return Err(self.fail(ErrorKind::TextOutsideRoot));
        }
        if b == b'&' {
            self.entity = Some(Vec::new());
            return Ok(());
        }
        self.pcdata = true;
        self.word.push(b);
        Ok(())
    }

    fn on_heading(&mut self, b: u8) {
        if b == b'?' {
            self.flags.question = true;
        } else if b == b'>' && self.flags.question {
            self.flags.question = false;
            self.mode = Mode::Text;
        } else {
            self.flags.question = false;
        }
    }

    fn on_comment_open(&mut self, b: u8) -> Result<()> {
        if b != b'-' {
            return Err(self.fail(ErrorKind::InvalidTagStart));
        }
        self.flags.hyphens = 0;
        self.mode = Mode::Comment;
        Ok(())
    }

    fn on_comment(&mut self, b: u8) -> Result<()> {
        match b {
            b'-' => {
                if self.flags.hyphens == 2 {
                    return Err(self.fail(ErrorKind::DoubleHyphen));
                }
                self.flags.hyphens += 1;
            }
            b'>' if self.flags.hyphens == 2 => {
                self.flags.hyphens = 0;
                self.mode = Mode::Text;
            }
            _ => {
                if self.flags.hyphens == 2 {
                    return Err(self.fail(ErrorKind::DoubleHyphen));
                }
                self.flags.hyphens = 0;
            }
        }
        Ok(())
    }

    fn on_cdata_open(&mut self, b: u8, step: u8) -> Result<()> {
        if step == 1 && b == b'-' {
            self.mode = Mode::CommentOpen;
            return Ok(());
        }
        if b != CDATA_OPEN[usize::from(step) - 1] {
            return Err(self.fail(ErrorKind::InvalidTagStart));
        }
        if usize::from(step) == CDATA_OPEN.len() {
            if self.depth == 0 {
                return Err(self.fail(ErrorKind::TextOutsideRoot));
            }
            self.flags.brackets = 0;
            self.pcdata = true;
            self.mode = Mode::Cdata;
        } else {
            self.mode = Mode::CdataOpen(step + 1);
        }
        Ok(())
    }

    fn on_cdata(&mut self, b: u8) {
        if b == b']' {
            // held back until we know they are not part of `]]>`
            self.flags.brackets = self.flags.brackets.saturating_add(1);
            return;
        }
        if b == b'>' && self.flags.brackets == 2 {
            self.flags.brackets = 0;
            self.mode = Mode::Text;
            return;
        }
        for _ in 0..self.flags.brackets {
            self.word.push(b']');
        }
        self.flags.brackets = 0;
        self.flags.ws_pending = false;
        self.word.push(b);
    }

    fn on_tag(&mut self, b: u8) -> Result<()> {
        // Until a name byte arrives the word may still hold pending text:
        // `<!` keeps it (comments and CDATA sections do not split a text
        // fragment), any other tag kind flushes it first.
        let name_started = !self.pcdata && !self.word.is_empty();
        if !name_started && !self.flags.close_tag && !self.flags.self_close {
            match b {
                b'!' => {
                    self.mode = Mode::CdataOpen(1);
                    return Ok(());
                }
                b'?' => {
                    self.flush_text()?;
                    self.mode = Mode::Heading;
                    return Ok(());
                }
                b'/' => {
                    self.flush_text()?;
                    self.flags.close_tag = true;
                    return Ok(());
                }
                _ => self.flush_text()?,
            }
        }
        match b {
            b'>' => self.end_of_tag(),
            b'/' => {
                if self.flags.close_tag || self.flags.self_close {
                    return Err(self.fail(ErrorKind::DoubleSlash));
                }
                self.flags.self_close = true;
                Ok(())
            }
            _ if is_ws(b) => {
                if self.flags.close_tag {
                    if !self.word.is_empty() {
                        self.flags.end_name_done = true;
                    }
                    return Ok(());
                }
                if self.word.is_empty() {
                    // stray whitespace right after `<`
                    return Err(self.fail(ErrorKind::InvalidTagStart));
                }
                self.open_element()
            }
            _ => {
                if self.flags.self_close {
                    return Err(self.fail(ErrorKind::InvalidTagStart));
                }
                if self.flags.end_name_done {
                    return Err(self.fail(ErrorKind::EndTagAttributes));
                }
                if self.word.is_empty() {
                    self.start_name_byte(b, false)
                } else {
                    self.push_name_byte(b, false)
                }
            }
        }
    }

    /// Emit the element opened by the tag name in the pending word and
    /// switch to attribute scanning.
    fn open_element(&mut self) -> Result<()> {
        let name = self.take_word()?;
        let depth = self.depth;
        self.emit(Event::Open { name, depth })?;
        self.flags.reading_attr_name = false;
        self.mode = Mode::Attributes;
        Ok(())
    }

    /// `>` seen while still reading the tag name.
    fn end_of_tag(&mut self) -> Result<()> {
        if self.flags.close_tag {
            if self.depth == 0 {
                return Err(self.fail(ErrorKind::UnmatchedEndTag));
            }
            self.word.clear();
            self.depth -= 1;
            self.mode = Mode::Text;
            return Ok(());
        }
        if self.word.is_empty() {
            return Err(self.fail(ErrorKind::InvalidTagStart));
        }
        let name = self.take_word()?;
        let depth = self.depth;
        self.emit(Event::Open { name, depth })?;
        self.close_start_tag();
        Ok(())
    }

    /// Bookkeeping shared by both `>` handlers once the element has been
    /// emitted: one net depth increment, cancelled again by `/>`.
    fn close_start_tag(&mut self) {
        self.depth += 1;
        if self.flags.self_close {
            self.depth -= 1;
        }
        self.mode = Mode::Text;
    }

    fn on_attributes(&mut self, b: u8) -> Result<()> {
        match b {
            _ if is_ws(b) => Ok(()),
            b'>' => {
                if self.flags.equals {
                    return Err(self.fail(ErrorKind::MissingAttributeValue));
                }
                if self.flags.reading_attr_name || !self.word.is_empty() {
                    return Err(self.fail(ErrorKind::MissingAttributeValue));
                }
                self.close_start_tag();
                Ok(())
            }
            b'/' => {
                if self.flags.equals {
                    return Err(self.fail(ErrorKind::ExpectedQuote));
                }
                if self.flags.self_close {
                    return Err(self.fail(ErrorKind::DoubleSlash));
                }
                if self.flags.reading_attr_name || !self.word.is_empty() {
                    return Err(self.fail(ErrorKind::MissingAttributeValue));
                }
                self.flags.self_close = true;
                Ok(())
            }
            b'=' => {
                if self.word.is_empty() {
                    return Err(self.fail(ErrorKind::EmptyAttributeName));
                }
                let name = self.take_word()?;
                self.emit(Event::AttrName { name })?;
                self.flags.reading_attr_name = false;
                self.flags.equals = true;
                Ok(())
            }
            b'\'' | b'"' => {
                if !self.flags.equals {
                    return Err(self.fail(ErrorKind::InvalidAttributeStart));
                }
                self.flags.equals = false;
                self.flags.quote = Some(if b == b'\'' {
                    Quote::Single
                } else {
                    Quote::Double
                });
                self.entity = None;
                self.mode = Mode::AttrValue;
                Ok(())
            }
            _ => {
                if self.flags.equals {
                    return Err(self.fail(ErrorKind::ExpectedQuote));
                }
                if self.flags.self_close {
                    return Err(self.fail(ErrorKind::InvalidAttributeStart));
                }
                if self.word.is_empty() {
                    self.flags.reading_attr_name = true;
                    self.start_name_byte(b, true)
                } else {
                    self.push_name_byte(b, true)
                }
            }
        }
    }

    fn on_attr_value(&mut self, b: u8) -> Result<()> {
        if b == b'<' {
            return Err(self.fail(ErrorKind::IllegalLessThan));
        }
        if self.entity_byte(b)? {
            return Ok(());
        }
        if b == b'&' {
            self.entity = Some(Vec::new());
            return Ok(());
        }
        if self.flags.quote.map(Quote::byte) == Some(b) {
            self.flags.quote = None;
            let value = self.take_word()?;
            self.emit(Event::AttrValue { value })?;
            self.mode = Mode::Attributes;
            return Ok(());
        }
        self.word.push(b);
        Ok(())
    }

    fn at_eof(&mut self) -> Result<()> {
        match self.mode {
            Mode::Text => {
                if self.entity.is_some() {
                    return Err(self.fail(ErrorKind::BareAmpersand));
                }
                if self.depth != 0 {
                    return Err(self.fail(ErrorKind::UnterminatedElements {
                        count: self.depth,
                    }));
                }
                Ok(())
            }
            Mode::Cdata | Mode::CdataOpen(_) => {
                Err(self.fail(ErrorKind::UnterminatedCdata))
            }
            Mode::Comment | Mode::CommentOpen => {
                Err(self.fail(ErrorKind::UnterminatedComment))
            }
            Mode::AttrValue => Err(self.fail(ErrorKind::UnterminatedAttributeValue)),
            Mode::Tag | Mode::Attributes | Mode::Heading => {
                Err(self.fail(ErrorKind::UnterminatedElements {
                    count: self.depth + 1,
                }))
            }
        }
    }
}
