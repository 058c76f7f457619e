//! Name grammar shared by the scanner and the serializer

use crate::error::{Error, ErrorKind, Result};

/// Whether a byte may start a tag or attribute name
pub(crate) fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Whether a byte may appear in a tag or attribute name body
pub(crate) fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.')
}

/// Whether a name starts with any case variant of the reserved `xml` prefix
pub(crate) fn has_reserved_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 3
        && bytes[0].eq_ignore_ascii_case(&b'x')
        && bytes[1].eq_ignore_ascii_case(&b'm')
        && bytes[2].eq_ignore_ascii_case(&b'l')
}

/// Validate a complete tag or attribute name.
///
/// Used by the serializer, which cannot assume its input tree came out of
/// the scanner.
pub(crate) fn validate_name(name: &str, attribute: bool) -> Result<()> {
    let (start_kind, char_kind) = if attribute {
        (ErrorKind::InvalidAttributeStart, ErrorKind::InvalidAttributeChar)
    } else {
        (ErrorKind::InvalidTagStart, ErrorKind::InvalidTagChar)
    };

    let Some(&first) = name.as_bytes().first() else {
        return Err(Error::bare(start_kind));
    };
    if !is_name_start(first) {
        return Err(Error::bare(start_kind));
    }
    if has_reserved_prefix(name) {
        return Err(Error::bare(ErrorKind::ReservedName));
    }
    if name.bytes().any(|b| !is_name_char(b)) {
        return Err(Error::bare(char_kind));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_start() {
        assert!(is_name_start(b'a'));
        assert!(is_name_start(b'_'));
        assert!(!is_name_start(b'1'));
        assert!(!is_name_start(b'-'));
    }

    #[test]
    fn test_reserved_prefix() {
        assert!(has_reserved_prefix("xml"));
        assert!(has_reserved_prefix("Xml1"));
        assert!(has_reserved_prefix("XML-data"));
        assert!(!has_reserved_prefix("xm"));
        assert!(!has_reserved_prefix("axml"));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("note", false).is_ok());
        assert!(validate_name("_a-b.c1", false).is_ok());
        assert!(validate_name("", false).is_err());
        assert!(validate_name("1a", false).is_err());
        assert!(validate_name("a b", false).is_err());
        assert!(validate_name("Xml1", false).is_err());
        assert_eq!(
            validate_name("a=b", true).unwrap_err().kind(),
            &ErrorKind::InvalidAttributeChar
        );
    }
}
