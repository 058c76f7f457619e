//! Error types for xparse

use std::fmt;
use thiserror::Error;

/// Position in the input markup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in the input markup
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.offset == 0
            && self.start.line == 0
            && self.end.offset == 0
            && self.end.line == 0
    }
}

/// Error kind for detailed categorization
///
/// Resource failures (`Io`, `InvalidOptions`) and grammar failures are kept
/// in one enum so every public operation returns the same error type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Underlying file or stream failure
    Io { message: String },
    /// Serializer options out of bounds
    InvalidOptions { message: String },
    InvalidTagStart,
    InvalidTagChar,
    InvalidAttributeStart,
    InvalidAttributeChar,
    ReservedName,
    DuplicateAttribute { name: String },
    EmptyAttributeName,
    MissingAttributeValue,
    ExpectedQuote,
    DoubleSlash,
    EndTagAttributes,
    IllegalLessThan,
    BareAmpersand,
    InvalidEntity { entity: String },
    EntityTooLong { max: usize },
    CodepointOutOfRange { value: u32 },
    DoubleHyphen,
    UnterminatedComment,
    UnterminatedCdata,
    UnterminatedAttributeValue,
    UnterminatedElements { count: u32 },
    UnmatchedEndTag,
    InvalidUtf8,
    TextOutsideRoot,
    SecondRootElement,
    OutOfOrderEvent,
    EmptyDocument,
    NodeOutOfRange { index: usize },
    TooManyNodes { max: usize },
    ValueTooLong { max: usize },
    InvalidBinary { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { message } => write!(f, "{message}"),
            Self::InvalidOptions { message } => write!(f, "{message}"),
            Self::InvalidTagStart => write!(
                f,
                "tag names must start with an alphabetical character [a-zA-Z] or underscore (_)"
            ),
            Self::InvalidTagChar => write!(
                f,
                "tag names may contain letters [a-zA-Z], digits [0-9], hyphens (-), \
                 underscores (_), and periods (.) only"
            ),
            Self::InvalidAttributeStart => write!(
                f,
                "attribute names must start with an alphabetical character [a-zA-Z] \
                 or underscore (_)"
            ),
            Self::InvalidAttributeChar => write!(
                f,
                "attribute names may contain letters [a-zA-Z], digits [0-9], hyphens (-), \
                 underscores (_), and periods (.) only"
            ),
            Self::ReservedName => write!(
                f,
                "names cannot start with 'xml' or any of its case variants like XML, Xml, etc."
            ),
            Self::DuplicateAttribute { name } => write!(
                f,
                "within a given tag, attributes cannot share the same name: {name}"
            ),
            Self::EmptyAttributeName => write!(
                f,
                "attribute names cannot be empty (a lone equal-to sign (=) is not allowed)"
            ),
            Self::MissingAttributeValue => write!(
                f,
                "if empty, attribute values must at least contain a pair of quotes"
            ),
            Self::ExpectedQuote => write!(
                f,
                "attribute assignment (=) must be followed by a single quote (') \
                 or a double quote (\")"
            ),
            Self::DoubleSlash => write!(f, "a tag cannot have more than one forward slash"),
            Self::EndTagAttributes => write!(f, "end tags cannot have any attributes"),
            Self::IllegalLessThan => {
                write!(f, "raw less-than (<) characters are not allowed here")
            }
            Self::BareAmpersand => write!(
                f,
                "ampersand (&) characters are allowed only as character entity references"
            ),
            Self::InvalidEntity { entity } => {
                write!(f, "invalid character entity reference: &{entity};")
            }
            Self::EntityTooLong { max } => write!(
                f,
                "character entity references may contain at most {max} characters"
            ),
            Self::CodepointOutOfRange { value } => {
                write!(f, "character entity codepoint out of range: {value}")
            }
            Self::DoubleHyphen => {
                write!(f, "a double hyphen (--) within comments is not allowed")
            }
            Self::UnterminatedComment => write!(f, "a comment does not terminate"),
            Self::UnterminatedCdata => write!(f, "a CDATA entity does not terminate"),
            Self::UnterminatedAttributeValue => {
                write!(f, "an attribute value is missing its closing quote")
            }
            Self::UnterminatedElements { count } => write!(
                f,
                "{count} start tag element(s) do not have their end tag counterparts"
            ),
            Self::UnmatchedEndTag => {
                write!(f, "an end tag appears without a matching start tag")
            }
            Self::InvalidUtf8 => write!(f, "the input is not valid UTF-8"),
            Self::TextOutsideRoot => write!(
                f,
                "parsed character data cannot be placed outside the outermost tag"
            ),
            Self::SecondRootElement => {
                write!(f, "there cannot be more than one outermost tag")
            }
            Self::OutOfOrderEvent => {
                write!(f, "a structural event arrived out of order")
            }
            Self::EmptyDocument => write!(f, "there must be exactly one outermost tag"),
            Self::NodeOutOfRange { index } => write!(f, "no node at index {index}"),
            Self::TooManyNodes { max } => {
                write!(f, "the binary encoding supports at most {max} nodes")
            }
            Self::ValueTooLong { max } => {
                write!(f, "the binary encoding supports strings of at most {max} bytes")
            }
            Self::InvalidBinary { message } => write!(f, "invalid binary document: {message}"),
        }
    }
}

/// Main error type for xparse
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create error at a specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::new(pos, pos))
    }

    /// Create error without position information
    pub fn bare(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }

    /// Create a resource error from an I/O failure
    pub fn io(err: &std::io::Error, path: impl AsRef<std::path::Path>) -> Self {
        Self::bare(ErrorKind::Io {
            message: format!("{}: {err}", path.as_ref().display()),
        })
    }

    /// Attach a position if the error has none yet
    pub fn at_pos(mut self, pos: Pos) -> Self {
        if self.span.is_empty() {
            self.span = Span::new(pos, pos);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "error: {}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

/// Result type alias for xparse
pub type Result<T> = std::result::Result<T, Error>;
