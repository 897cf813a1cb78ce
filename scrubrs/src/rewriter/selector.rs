use std::borrow::Cow;

use tracing::warn;

/// Where a handler wants to be called.
///
/// `match_element` picks the elements passed to
/// [`Handler::handle_element`](super::Handler::handle_element);
/// `match_text_within` picks the elements whose text chunks are passed to
/// [`Handler::handle_text`](super::Handler::handle_text). Both are CSS
/// selectors, compiled when a rewrite starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    match_element: Option<String>,
    match_text_within: Option<String>,
    ignore_text_within: Vec<String>,
}

impl Selector {
    /// Matches elements.
    pub fn element(css: impl Into<String>) -> Self {
        Self {
            match_element: Some(css.into()),
            ..Self::default()
        }
    }

    /// Matches the text inside elements.
    pub fn text(css: impl Into<String>) -> Self {
        Self {
            match_text_within: Some(css.into()),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, css: impl Into<String>) -> Self {
        self.match_element = Some(css.into());
        self
    }

    pub fn with_text(mut self, css: impl Into<String>) -> Self {
        self.match_text_within = Some(css.into());
        self
    }

    /// Skips text whose innermost open element is one of `tags`, for
    /// example `["pre", "code"]`.
    pub fn ignore_text_within<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_text_within = tags
            .into_iter()
            .map(|tag| tag.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn match_element(&self) -> Option<&str> {
        self.match_element.as_deref()
    }

    pub fn match_text_within(&self) -> Option<&str> {
        self.match_text_within.as_deref()
    }

    pub fn ignored_text_containers(&self) -> &[String] {
        &self.ignore_text_within
    }
}

/// Compiles a CSS selector; invalid syntax is logged and yields `None`.
pub(crate) fn compile(css: &str, handler: &str) -> Option<Cow<'static, lol_html::Selector>> {
    match css.parse::<lol_html::Selector>() {
        Ok(selector) => Some(Cow::Owned(selector)),
        Err(err) => {
            warn!(handler, selector = css, error = %err, "invalid selector, handler not registered");
            None
        }
    }
}
