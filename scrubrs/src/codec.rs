//! Entity codec.
//!
//! Escaping turns arbitrary text into something safe to splice into HTML
//! output, and unescaping turns numeric and named character references back
//! into the characters they stand for. Unescaping never fails: anything that
//! does not parse as a reference is kept as literal text.

pub use self::escape::{escape_href, escape_href_into, escape_html, escape_html_into};
pub use self::unescape::{decode_entity, encode_scalar, unescape_all, unescape_html};

mod entities;
mod escape;
mod unescape;
