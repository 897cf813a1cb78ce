#![doc = include_str!("../README.md")]
//!
//! ## API Guide
//!
//! ### For End Users
//!
//! Most applications only need the top-level functions:
//!
//! - [`sanitize`] - Strip markup down to text with the default policy
//! - [`sanitize_with`] - Sanitize with a policy of your own
//! - [`version`] - Library version information
//!
//! Policies are easiest to build from a [`SanitizerConfig`], either one of the
//! [`Preset`]s or a JSON document deserialized with serde.
//!
//! ### For Advanced Users
//!
//! - [`Html`] - A session that also runs user [`Handler`]s after sanitizing,
//!   with optional timing statistics and parser memory limits
//! - [`Sanitizer`] - The policy store, with fine-grained setters
//! - [`codec`] - HTML escaping and entity decoding on their own
//! - [`Tag`] - The tag vocabulary policies are expressed in

use std::str::Utf8Error;

use thiserror::Error;

pub mod codec;
pub mod html;
pub mod rewriter;
pub mod sanitizer;
pub mod tags;

#[cfg(test)]
mod tests;

pub use html::{Html, HtmlOptions, MemoryOptions};
pub use rewriter::{Capabilities, Handler, HandlerError, HandlerOutcome, Selector, Stat, Stats};
pub use sanitizer::{Preset, Sanitizer, SanitizerConfig, SanitizerFlags};
pub use tags::Tag;

/// Errors returned by configuration calls and by the pipeline.
///
/// Malformed entities and invalid handler selectors are not errors: the
/// former decode as literal text, the latter register nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The input was not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] Utf8Error),
    /// A configuration call named a tag outside the vocabulary.
    #[error("unknown tag: {0}")]
    UnknownTag(String),
    /// The markup rewriter could not be built or failed mid-pass.
    #[error("rewriter error: {0}")]
    EventSource(String),
    /// A handler stopped the rewrite.
    #[error("handler {handler} failed: {message}")]
    Handler { handler: String, message: String },
    /// A configuration document could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Sanitizes `html` with the default policy, which keeps text only.
///
/// Elements are unwrapped, block-level ones padded with spaces, and
/// `script`, `style` and friends are dropped with their content.
///
/// # Examples
///
/// ```
/// use scrubrs::sanitize;
///
/// let clean = sanitize("<b>bold</b><script>alert(1)</script>").unwrap();
/// assert_eq!(clean, "bold");
///
/// let clean = sanitize("foo<div>bar</div>baz").unwrap();
/// assert_eq!(clean, "foo bar baz");
/// ```
pub fn sanitize(html: &str) -> Result<String, Error> {
    sanitize_with(html, &Sanitizer::default())
}

/// Sanitizes `html` with the given policy.
///
/// # Examples
///
/// ```
/// use scrubrs::{sanitize_with, Preset, Sanitizer};
///
/// let sanitizer = Sanitizer::from_config(&Preset::Basic.config()).unwrap();
/// let clean = sanitize_with(r#"<a href="javascript:alert(1)">x</a>"#, &sanitizer).unwrap();
/// assert_eq!(clean, "<a>x</a>");
/// ```
pub fn sanitize_with(html: &str, sanitizer: &Sanitizer) -> Result<String, Error> {
    Html::new(Some(sanitizer.clone()), Vec::new(), HtmlOptions::default())?.rewrite(html)
}

/// Returns the version of the library.
///
/// # Examples
///
/// ```
/// use scrubrs::version;
///
/// println!("scrubrs version: {}", version());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
