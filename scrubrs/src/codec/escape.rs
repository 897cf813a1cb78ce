/// Index into [`ESCAPES`] for every byte value; 0 means "copy through".
static ESCAPE_INDEX: [u8; 256] = build_escape_index();

static ESCAPES: [&str; 7] = ["", "&quot;", "&amp;", "&#39;", "&#47;", "&lt;", "&gt;"];

const SINGLE_QUOTE: u8 = 3;
const SLASH: u8 = 4;

const fn build_escape_index() -> [u8; 256] {
    let mut table = [0u8; 256];
    table[b'"' as usize] = 1;
    table[b'&' as usize] = 2;
    table[b'\'' as usize] = SINGLE_QUOTE;
    table[b'/' as usize] = SLASH;
    table[b'<' as usize] = 5;
    table[b'>' as usize] = 6;
    table
}

/// Bytes that may appear unescaped inside an `href` value.
static HREF_SAFE: [bool; 256] = build_href_safe();

const fn build_href_safe() -> [bool; 256] {
    let safe: &[u8] = b"!#$%()*+,-./0123456789:;=?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]_abcdefghijklmnopqrstuvwxyz~";
    let mut table = [false; 256];
    let mut i = 0;
    while i < safe.len() {
        table[safe[i] as usize] = true;
        i += 1;
    }
    table
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Escapes `input` for use as HTML text or a quoted attribute value.
///
/// `& < > "` are always replaced by their entity form. `'` and `/` are only
/// replaced when `secure` is set; otherwise they are copied as-is.
///
/// # Examples
///
/// ```
/// use scrubrs::codec::escape_html;
///
/// assert_eq!(escape_html("<a href='/x'>", true), "&lt;a href=&#39;&#47;x&#39;&gt;");
/// assert_eq!(escape_html("<a href='/x'>", false), "&lt;a href='/x'&gt;");
/// ```
pub fn escape_html(input: &str, secure: bool) -> String {
    let mut out = String::with_capacity(input.len());
    escape_html_into(&mut out, input, secure);
    out
}

/// Appending form of [`escape_html`].
pub fn escape_html_into(out: &mut String, input: &str, secure: bool) {
    let bytes = input.as_bytes();
    let mut copied = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let index = ESCAPE_INDEX[usize::from(byte)];
        if index == 0 || (!secure && (index == SINGLE_QUOTE || index == SLASH)) {
            continue;
        }
        // Every escaped byte is ASCII, so `i` always sits on a char boundary.
        out.push_str(&input[copied..i]);
        out.push_str(ESCAPES[usize::from(index)]);
        copied = i + 1;
    }

    out.push_str(&input[copied..]);
}

/// Escapes a URL for an `href` attribute.
///
/// Bytes outside the URL-safe set are percent-encoded, except `&` and `'`
/// which become `&amp;` and `&#x27;`. Existing `%XX` sequences are left
/// alone, so escaping an already-escaped URL is a no-op.
///
/// # Examples
///
/// ```
/// use scrubrs::codec::escape_href;
///
/// assert_eq!(escape_href("https://example.com/a b?x=1&y=2"),
///            "https://example.com/a%20b?x=1&amp;y=2");
/// ```
pub fn escape_href(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    escape_href_into(&mut out, input);
    out
}

/// Appending form of [`escape_href`].
pub fn escape_href_into(out: &mut String, input: &str) {
    for &byte in input.as_bytes() {
        if HREF_SAFE[usize::from(byte)] {
            out.push(char::from(byte));
            continue;
        }

        match byte {
            b'&' => out.push_str("&amp;"),
            b'\'' => out.push_str("&#x27;"),
            _ => {
                out.push('%');
                out.push(char::from(HEX_UPPER[usize::from(byte >> 4)]));
                out.push(char::from(HEX_UPPER[usize::from(byte & 0x0F)]));
            }
        }
    }
}
