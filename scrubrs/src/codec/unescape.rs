use std::borrow::Cow;
use std::cmp::Ordering;

use super::entities::{ENTITIES, MAX_LENGTH, MIN_LENGTH};

const MAX_DECIMAL_DIGITS: usize = 7;
const MAX_HEX_DIGITS: usize = 6;
/// Accumulated codepoints saturate here, one past the last scalar value.
const CODEPOINT_LIMIT: u32 = 0x11_0000;
const REPLACEMENT: u32 = 0xFFFD;

/// Decodes one character reference.
///
/// `src` starts right after the `&`. On success the expansion is appended to
/// `out` and the number of bytes consumed (including a trailing `;` if one
/// was present) is returned. A return of 0 means `src` does not start with a
/// valid reference; nothing is appended and the caller should keep the `&`
/// as literal text.
///
/// Numeric references accept up to 7 decimal or 6 hex digits. Values that
/// are 0, surrogates or beyond U+10FFFF decode to U+FFFD. Named references
/// must be terminated by `;`.
///
/// # Examples
///
/// ```
/// use scrubrs::codec::decode_entity;
///
/// let mut out = Vec::new();
/// assert_eq!(decode_entity(b"#x41; rest", &mut out), 5);
/// assert_eq!(decode_entity(b"amp;", &mut out), 4);
/// assert_eq!(decode_entity(b"ampp", &mut out), 0);
/// assert_eq!(out, b"A&");
/// ```
pub fn decode_entity(src: &[u8], out: &mut Vec<u8>) -> usize {
    if src.len() >= 3 && src[0] == b'#' {
        decode_numeric(src, out)
    } else {
        decode_named(src, out)
    }
}

fn decode_numeric(src: &[u8], out: &mut Vec<u8>) -> usize {
    let (start, radix, max_digits) = match src.get(1) {
        Some(b) if b.is_ascii_digit() => (1, 10, MAX_DECIMAL_DIGITS),
        Some(b'x' | b'X') => (2, 16, MAX_HEX_DIGITS),
        _ => return 0,
    };

    let mut codepoint: u32 = 0;
    let mut end = start;
    while let Some(digit) = src.get(end).and_then(|&b| char::from(b).to_digit(radix)) {
        // Keep consuming digits past the limit so they are not re-read as text.
        codepoint = codepoint
            .saturating_mul(radix)
            .saturating_add(digit)
            .min(CODEPOINT_LIMIT);
        end += 1;
    }

    let digits = end - start;
    if digits == 0 || digits > max_digits {
        return 0;
    }

    if codepoint == 0 || (0xD800..0xE000).contains(&codepoint) || codepoint >= CODEPOINT_LIMIT {
        codepoint = REPLACEMENT;
    }
    encode_scalar(codepoint, out);

    if src.get(end) == Some(&b';') {
        end + 1
    } else {
        end
    }
}

fn decode_named(src: &[u8], out: &mut Vec<u8>) -> usize {
    let size = src.len().min(MAX_LENGTH);

    for i in MIN_LENGTH..size {
        match src[i] {
            b' ' => break,
            b';' => {
                if let Some(expansion) = lookup_entity(&src[..i]) {
                    out.extend_from_slice(expansion.as_bytes());
                    return i + 1;
                }
                break;
            }
            _ => {}
        }
    }

    0
}

/// Orders `name` against the leading `name.len()` bytes of `entity`, treating
/// a shorter entity as ending in a byte smaller than any name byte.
fn compare_prefix(name: &[u8], entity: &[u8]) -> Ordering {
    match entity.get(..name.len()) {
        Some(prefix) => name.cmp(prefix),
        None => name.cmp(entity),
    }
}

/// Looks `name` up in the entity table by recursive bisection.
///
/// The probe sequence starts in the middle and narrows towards `low` when the
/// name sorts at or before the probe, towards `high` otherwise. A name that
/// is a strict prefix of the probe therefore walks left.
pub(crate) fn lookup_entity(name: &[u8]) -> Option<&'static str> {
    let last = ENTITIES.len().checked_sub(1)?;
    let (mut low, mut high) = (0, last);
    let mut i = ENTITIES.len() / 2;

    loop {
        let (entity, expansion) = ENTITIES[i];
        let order = compare_prefix(name, entity.as_bytes());

        if order == Ordering::Equal && entity.len() == name.len() {
            return Some(expansion);
        } else if order != Ordering::Greater && i > low {
            let mut next = i - (i - low) / 2;
            if next == i {
                next -= 1;
            }
            high = i - 1;
            i = next;
        } else if order == Ordering::Greater && i < high {
            let mut next = i + (high - i) / 2;
            if next == i {
                next += 1;
            }
            low = i + 1;
            i = next;
        } else {
            return None;
        }
    }
}

/// Appends the UTF-8 encoding of `codepoint` to `out`.
///
/// Anything that is not a Unicode scalar value is written as U+FFFD.
pub fn encode_scalar(codepoint: u32, out: &mut Vec<u8>) {
    let ch = char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}

/// Decodes every character reference in `src`.
///
/// Each `&` is handed to [`decode_entity`]; if that fails the `&` is written
/// back and scanning resumes with the next byte. Input without any `&` is
/// returned unchanged.
pub fn unescape_all(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut rest = src;

    while let Some(amp) = rest.iter().position(|&b| b == b'&') {
        out.extend_from_slice(&rest[..amp]);
        let after = &rest[amp + 1..];
        let consumed = decode_entity(after, &mut out);
        if consumed == 0 {
            out.push(b'&');
        }
        rest = &after[consumed..];
    }

    out.extend_from_slice(rest);
    out
}

/// String form of [`unescape_all`]; borrows when there is nothing to decode.
///
/// # Examples
///
/// ```
/// use scrubrs::codec::unescape_html;
///
/// assert_eq!(unescape_html("Tom &amp; Jerry &#x263A;"), "Tom & Jerry \u{263A}");
/// assert_eq!(unescape_html("AT&T"), "AT&T");
/// ```
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    // Decoding only ever splits the input at ASCII bytes and writes whole
    // scalars, so valid UTF-8 in means valid UTF-8 out.
    match String::from_utf8(unescape_all(input.as_bytes())) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(err) => Cow::Owned(String::from_utf8_lossy(err.as_bytes()).into_owned()),
    }
}
