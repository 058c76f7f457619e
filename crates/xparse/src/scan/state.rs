//! Scanner modes and orthogonal sub-flags

/// Mutually exclusive parse modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Outside any markup; text content accumulates here
    Text,
    /// Inside `<? ... ?>`
    Heading,
    /// Saw `<!-`, expecting the second `-`
    CommentOpen,
    /// Inside a comment body
    Comment,
    /// Progress through `<![CDATA[`; the payload counts consumed
    /// characters after `!` (1 ⇒ expecting `[` or `-`)
    CdataOpen(u8),
    /// Inside a CDATA body
    Cdata,
    /// Inside `<...>`, reading the tag name
    Tag,
    /// Inside `<...>`, past the tag name
    Attributes,
    /// Inside a quoted attribute value
    AttrValue,
}

/// Active quote kind for attribute values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Quote {
    Single,
    Double,
}

impl Quote {
    pub(crate) const fn byte(self) -> u8 {
        match self {
            Self::Single => b'\'',
            Self::Double => b'"',
        }
    }
}

/// Orthogonal flags layered on top of [`Mode`]
#[derive(Debug, Default)]
pub(crate) struct Flags {
    /// Saw `</` — this tag is an end tag
    pub close_tag: bool,
    /// Saw `/` before `>` — this tag self-closes
    pub self_close: bool,
    /// Saw `=`, awaiting the opening quote
    pub equals: bool,
    /// Quote that opened the current attribute value
    pub quote: Option<Quote>,
    /// A whitespace run in text has already been collapsed to one space
    pub ws_pending: bool,
    /// Saw `?` inside the heading, the next `>` ends it
    pub question: bool,
    /// Consecutive `-` seen inside a comment body
    pub hyphens: u8,
    /// Consecutive `]` seen inside a CDATA body
    pub brackets: u8,
    /// Progress through a possible reserved `xml` name prefix
    pub xml_guard: u8,
    /// Currently accumulating an attribute name
    pub reading_attr_name: bool,
    /// An end tag name is complete; only whitespace and `>` may follow
    pub end_name_done: bool,
}

impl Flags {
    /// Reset the per-tag flags on entry into a new `<`
    pub(crate) fn enter_tag(&mut self) {
        self.close_tag = false;
        self.self_close = false;
        self.equals = false;
        self.quote = None;
        self.question = false;
        self.xml_guard = 0;
        self.reading_attr_name = false;
        self.end_name_done = false;
    }
}
