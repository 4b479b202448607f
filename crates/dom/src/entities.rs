//! Entity decoding and comment source-width recovery.
//!
//! Comment data in the tree holds the *DOM-escaped* value. To learn how many
//! source characters produced a comment we undo the entity escaping and then
//! re-escape the one sequence (`-->`) that could not appear literally inside
//! a source comment.

use crate::data::Offset;
use crate::tree::char_len;
use memchr::memchr;

/// Width of `<!--` plus `-->`.
pub const COMMENT_DELIMITER_WIDTH: Offset = 7;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{00A0}'),
];

// Longest entity body we look at ("#x10FFFF" / "#1114111").
const MAX_ENTITY_BODY: usize = 8;

fn decode_one(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let (digits, radix) = match num.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16),
            None => (num, 10),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32);
    }
    NAMED.iter().find(|(n, _)| *n == body).map(|&(_, c)| c)
}

/// Decode the small set of entities the markup serializer emits.
///
/// Named `&amp; &lt; &gt; &quot; &apos; &nbsp;` and semicolon-terminated
/// decimal/hex references to valid scalars are decoded; anything else is
/// copied through unchanged.
pub fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    while let Some(rel) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + rel;
        out.push_str(&s[pos..amp]);
        let window_end = (amp + 2 + MAX_ENTITY_BODY).min(bytes.len());
        let decoded = memchr(b';', &bytes[amp + 1..window_end]).and_then(|semi| {
            let body = &s[amp + 1..amp + 1 + semi];
            decode_one(body).map(|ch| (ch, amp + 2 + semi))
        });
        match decoded {
            Some((ch, next)) => {
                out.push(ch);
                pos = next;
            }
            None => {
                out.push('&');
                pos = amp + 1;
            }
        }
    }
    out.push_str(&s[pos..]);
    out
}

/// Map DOM comment data to the text that sits between `<!--` and `-->` in source.
pub fn decode_comment(data: &str) -> String {
    let decoded = decode_entities(data);
    if !decoded.contains("--") {
        return decoded;
    }
    let mut out = String::with_capacity(decoded.len() + 8);
    let mut rest = decoded.as_str();
    while let Some(idx) = rest.find("--") {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx + 2..];
        if let Some(after) = tail.strip_prefix('>') {
            out.push_str("--&gt;");
            rest = after;
        } else if let Some(len) = escaped_gt_len(tail) {
            // "--&amp;...gt;" gains one more "amp;" so it cannot decode to "-->".
            out.push_str("--&amp;");
            out.push_str(&tail[1..len]);
            rest = &tail[len..];
        } else {
            out.push('-');
            rest = &rest[idx + 1..];
        }
    }
    out.push_str(rest);
    out
}

/// Length of a leading `&(amp;)*gt;` in `s`.
fn escaped_gt_len(s: &str) -> Option<usize> {
    let mut rest = s.strip_prefix('&')?;
    let mut len = 1;
    while let Some(r) = rest.strip_prefix("amp;") {
        rest = r;
        len += 4;
    }
    rest.strip_prefix("gt;").map(|_| len + 3)
}

/// Source width of a comment whose DOM data is `data`, delimiters included.
pub fn decoded_comment_len(data: &str) -> Offset {
    char_len(&decode_comment(data)) + COMMENT_DELIMITER_WIDTH
}
