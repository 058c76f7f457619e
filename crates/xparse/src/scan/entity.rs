//! Character entity reference decoding

use crate::error::{Error, ErrorKind, Result};

/// Maximum length of a reference including the `&` and `;` delimiters
pub(crate) const MAX_ENTITY_LEN: usize = 10;

/// Maximum body length between the delimiters
pub(crate) const MAX_ENTITY_BODY: usize = MAX_ENTITY_LEN - 2;

/// First codepoint past the Unicode range
const CODEPOINT_CEILING: u32 = 1_114_112;

/// Decode the body of a character entity reference (the text between `&`
/// and `;`) into the character it names.
///
/// Decoded codepoints are returned as full `char`s; values at or above the
/// Unicode ceiling, surrogates, and malformed digits are rejected.
pub(crate) fn decode(body: &str) -> Result<char> {
    match body {
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "amp" => return Ok('&'),
        "apos" => return Ok('\''),
        "quot" => return Ok('"'),
        _ => {}
    }

    let invalid = || {
        Error::bare(ErrorKind::InvalidEntity {
            entity: body.to_string(),
        })
    };

    let digits = body.strip_prefix('#').ok_or_else(invalid)?;

    let value = if let Some(hex) = digits.strip_prefix(['x', 'X']) {
        u32::from_str_radix(hex, 16).map_err(|_| invalid())?
    } else {
        digits.parse::<u32>().map_err(|_| invalid())?
    };

    if value >= CODEPOINT_CEILING {
        return Err(Error::bare(ErrorKind::CodepointOutOfRange { value }));
    }

    char::from_u32(value).ok_or_else(|| Error::bare(ErrorKind::CodepointOutOfRange { value }))
}
