//! Universal line splitting over raw file bytes.
//!
//! Lines end at `\n`, `\r\n`, `\r`, vertical tab, form feed, the file/group/record
//! separators (`\x1c`..`\x1e`), NEL (`\u{85}`), and the Unicode line and paragraph
//! separators. A trailing terminator does not start an extra empty line.
//!
//! Splitting happens before decoding. Every terminator is either a single ASCII
//! byte or a complete UTF-8 sequence whose lead byte can never be a continuation
//! byte, so a terminator found here is a terminator in the decoded text as well.

const NEL: [u8; 2] = [0xc2, 0x85];
const LINE_SEPARATOR: [u8; 3] = [0xe2, 0x80, 0xa8];
const PARAGRAPH_SEPARATOR: [u8; 3] = [0xe2, 0x80, 0xa9];

/// Splits the first line off `bytes`.
///
/// Returns the line without its terminator and the number of bytes consumed
/// including the terminator. `bytes` must not be empty.
pub(crate) fn split_line(bytes: &[u8]) -> (&[u8], usize) {
    let mut idx = 0;
    while idx < bytes.len() {
        let rest = &bytes[idx..];
        let terminator_len = match rest[0] {
            b'\r' if rest.get(1) == Some(&b'\n') => 2,
            b'\n' | b'\r' | b'\x0b' | b'\x0c' | b'\x1c' | b'\x1d' | b'\x1e' => 1,
            0xc2 if rest.starts_with(&NEL) => NEL.len(),
            0xe2 if rest.starts_with(&LINE_SEPARATOR) || rest.starts_with(&PARAGRAPH_SEPARATOR) => 3,
            _ => 0,
        };
        if terminator_len > 0 {
            return (&bytes[..idx], idx + terminator_len);
        }
        idx += 1;
    }
    (bytes, bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[u8]) -> Vec<&[u8]> {
        let mut rest = text;
        let mut out = Vec::new();
        while !rest.is_empty() {
            let (line, consumed) = split_line(rest);
            out.push(line);
            rest = &rest[consumed..];
        }
        out
    }

    #[test]
    fn test_common_terminators() {
        assert_eq!(lines(b"a\nb\r\nc\rd"), vec![&b"a"[..], b"b", b"c", b"d"]);
        assert_eq!(lines(b"a\n"), vec![&b"a"[..]]);
        assert_eq!(lines(b"a\n\nb"), vec![&b"a"[..], b"", b"b"]);
        assert_eq!(lines(b"\n"), vec![&b""[..]]);
        assert!(lines(b"").is_empty());
    }

    #[test]
    fn test_crlf_is_one_terminator() {
        assert_eq!(lines(b"a\r\n\r\nb"), vec![&b"a"[..], b"", b"b"]);
        assert_eq!(lines(b"a\n\r"), vec![&b"a"[..], b""]);
    }

    #[test]
    fn test_unicode_separators() {
        let text = "one\u{2028}two\u{85}three\x0cfour\u{2029}five";
        assert_eq!(
            lines(text.as_bytes()),
            vec![&b"one"[..], b"two", b"three", b"four", b"five"]
        );
    }

    #[test]
    fn test_lookalike_bytes_are_not_terminators() {
        // 'Å' is c3 85, '‧' is e2 80 a7
        let text = "Å‧x";
        assert_eq!(lines(text.as_bytes()), vec![text.as_bytes()]);
    }

    #[test]
    fn test_split_line_consumed_bytes() {
        assert_eq!(split_line(b"ab\r\ncd"), (&b"ab"[..], 4));
        assert_eq!(split_line("ab\u{2029}cd".as_bytes()), (&b"ab"[..], 5));
        assert_eq!(split_line(b"tail"), (&b"tail"[..], 4));
        assert_eq!(split_line(b"\xff\xfe\nx"), (&b"\xff\xfe"[..], 3));
    }
}
