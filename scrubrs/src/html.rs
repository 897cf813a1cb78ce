//! The pipeline orchestrator.
//!
//! [`Html`] owns a sanitizer policy and borrows a list of handlers. Each call
//! to [`Html::rewrite`] runs up to four independent passes over the markup,
//! each one parsing the serialized output of the one before:
//!
//! 1. structural: doctype, comments and element removal;
//! 2. attributes: structural decision again, then attribute filtering;
//! 3. text (opt-in): every text chunk re-escaped;
//! 4. handlers: the [`DispatchChain`] built from the registered handlers;
//! 5. tagfilter: disallowed raw-text and RCDATA tags that came back
//!    through the handlers are removed again.

use std::borrow::Cow;
use std::rc::Rc;
use std::time::Instant;

use lol_html::errors::RewritingError;
use lol_html::html_content::{Comment, Doctype, Element, TextChunk};
use lol_html::{
    DocumentContentHandlers, ElementContentHandlers, HandlerResult, HtmlRewriter, MemorySettings, Selector, Settings,
};
use tracing::debug;

use crate::rewriter::{DispatchChain, Handler, HandlerFailure, Stats};
use crate::sanitizer::Sanitizer;
use crate::Error;

type ElementHandlers<'h> = Vec<(Cow<'static, Selector>, ElementContentHandlers<'h>)>;

/// Parser memory limits forwarded to every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOptions {
    /// Bytes reserved for the parsing buffer up front.
    pub preallocated_parsing_buffer_size: usize,
    /// Ceiling for the parser's buffers; exceeding it fails the pass.
    pub max_allowed_memory_usage: usize,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            preallocated_parsing_buffer_size: 1024,
            max_allowed_memory_usage: usize::MAX,
        }
    }
}

impl MemoryOptions {
    fn validate(&self) -> Result<(), Error> {
        if self.preallocated_parsing_buffer_size > self.max_allowed_memory_usage {
            return Err(Error::EventSource(format!(
                "preallocated parsing buffer ({} bytes) exceeds the memory limit ({} bytes)",
                self.preallocated_parsing_buffer_size, self.max_allowed_memory_usage
            )));
        }
        Ok(())
    }

    fn settings(&self) -> MemorySettings {
        let mut settings = MemorySettings::default();
        settings.preallocated_parsing_buffer_size = self.preallocated_parsing_buffer_size;
        settings.max_allowed_memory_usage = self.max_allowed_memory_usage;
        settings
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Collect timing statistics, see [`Html::stats`].
    pub measure: bool,
    pub memory: MemoryOptions,
    /// Run the text pass after the attribute pass.
    pub escape_text: bool,
}

/// A sanitization session.
///
/// ```
/// use scrubrs::html::{Html, HtmlOptions};
/// use scrubrs::sanitizer::{Preset, Sanitizer};
///
/// let sanitizer = Sanitizer::from_config(&Preset::Basic.config()).unwrap();
/// let mut html = Html::new(Some(sanitizer), Vec::new(), HtmlOptions::default()).unwrap();
/// let out = html.rewrite("<p onclick=\"x()\">hi <script>x()</script></p>").unwrap();
/// assert_eq!(out, "<p>hi </p>");
/// ```
pub struct Html {
    sanitizer: Option<Sanitizer>,
    handlers: Vec<Rc<dyn Handler>>,
    options: HtmlOptions,
    stats: Option<Stats>,
}

impl Html {
    /// Creates a session. Fails if the memory options are inconsistent.
    ///
    /// Without a sanitizer only the handler pass runs. Handlers are shared
    /// so that end-tag callbacks can outlive the element that queued them.
    pub fn new(
        sanitizer: Option<Sanitizer>,
        handlers: Vec<Rc<dyn Handler>>,
        options: HtmlOptions,
    ) -> Result<Self, Error> {
        options.memory.validate()?;
        Ok(Self {
            sanitizer,
            handlers,
            options,
            stats: None,
        })
    }

    pub fn sanitizer(&self) -> Option<&Sanitizer> {
        self.sanitizer.as_ref()
    }

    pub fn options(&self) -> &HtmlOptions {
        &self.options
    }

    /// Timings of the last successful [`rewrite`](Html::rewrite), if
    /// `measure` was set.
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// Runs the pipeline over `input`, which must be UTF-8.
    pub fn rewrite(&mut self, input: impl AsRef<[u8]>) -> Result<String, Error> {
        let mut stats = self.options.measure.then(Stats::new);
        let started = clock(&stats);
        let input = std::str::from_utf8(input.as_ref())?;
        let mut html = Cow::Borrowed(input.as_bytes());

        if let Some(sanitizer) = &self.sanitizer {
            let pass = clock(&stats);
            html = Cow::Owned(self.run_pass(
                "structural",
                &html,
                structural_document_handlers(sanitizer),
                structural_element_handlers(sanitizer)?,
            )?);
            record(&mut stats, "Sanitizer#structural", pass);

            let pass = clock(&stats);
            html = Cow::Owned(self.run_pass("attributes", &html, Vec::new(), attribute_handlers(sanitizer)?)?);
            record(&mut stats, "Sanitizer#attributes", pass);

            if self.options.escape_text {
                let pass = clock(&stats);
                html = Cow::Owned(self.run_pass("text", &html, text_handlers(sanitizer), Vec::new())?);
                record(&mut stats, "Codec#text", pass);
            }
        }

        if !self.handlers.is_empty() {
            let pass = clock(&stats);
            let chain = DispatchChain::new(&self.handlers, self.options.measure);
            html = Cow::Owned(self.run_pass("handlers", &html, Vec::new(), chain.content_handlers())?);
            if let Some(stats) = stats.as_mut() {
                stats.extend(chain.stats());
            }
            record(&mut stats, "Rewriter#handlers", pass);
        }

        if let Some(sanitizer) = self.sanitizer.as_ref().filter(|sanitizer| sanitizer.escape_tagfilter()) {
            let pass = clock(&stats);
            html = Cow::Owned(self.run_pass("tagfilter", &html, Vec::new(), tagfilter_handlers(sanitizer)?)?);
            record(&mut stats, "Sanitizer#tagfilter", pass);
        }

        let output = String::from_utf8(html.into_owned()).map_err(|err| Error::InvalidEncoding(err.utf8_error()))?;
        record(&mut stats, "Html#rewrite", started);
        self.stats = stats;
        Ok(output)
    }

    /// One invocation of the streaming rewriter with a pass-scoped sink.
    fn run_pass<'a>(
        &self,
        pass: &str,
        input: &[u8],
        document_content_handlers: Vec<DocumentContentHandlers<'a>>,
        element_content_handlers: ElementHandlers<'a>,
    ) -> Result<Vec<u8>, Error> {
        let mut output = Vec::with_capacity(input.len());
        let mut rewriter = HtmlRewriter::new(
            Settings {
                document_content_handlers,
                element_content_handlers,
                memory_settings: self.options.memory.settings(),
                ..Settings::default()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );
        rewriter.write(input).map_err(rewrite_error)?;
        rewriter.end().map_err(rewrite_error)?;

        debug!(pass, input = input.len(), output = output.len(), "pass complete");
        Ok(output)
    }
}

/// Reads the clock only when stats are being collected.
fn clock(stats: &Option<Stats>) -> Option<Instant> {
    stats.as_ref().map(|_| Instant::now())
}

fn record(stats: &mut Option<Stats>, label: &str, started: Option<Instant>) {
    if let (Some(stats), Some(started)) = (stats.as_mut(), started) {
        stats.record(label, 1, started.elapsed());
    }
}

fn any_element() -> Result<Cow<'static, Selector>, Error> {
    "*".parse::<Selector>()
        .map(Cow::Owned)
        .map_err(|err| Error::EventSource(err.to_string()))
}

fn structural_document_handlers(sanitizer: &Sanitizer) -> Vec<DocumentContentHandlers<'_>> {
    vec![DocumentContentHandlers::default()
        .doctype(move |doctype: &mut Doctype<'_>| -> HandlerResult {
            sanitizer.sanitize_doctype(doctype);
            Ok(())
        })
        .comments(move |comment: &mut Comment<'_>| -> HandlerResult {
            sanitizer.sanitize_comment(comment);
            Ok(())
        })]
}

fn structural_element_handlers(sanitizer: &Sanitizer) -> Result<ElementHandlers<'_>, Error> {
    Ok(vec![(
        any_element()?,
        ElementContentHandlers::default().element(move |el: &mut Element<'_, '_>| -> HandlerResult {
            sanitizer.try_remove_element(el);
            Ok(())
        }),
    )])
}

fn attribute_handlers(sanitizer: &Sanitizer) -> Result<ElementHandlers<'_>, Error> {
    Ok(vec![(
        any_element()?,
        ElementContentHandlers::default().element(move |el: &mut Element<'_, '_>| -> HandlerResult {
            sanitizer.sanitize_attributes(el);
            Ok(())
        }),
    )])
}

fn tagfilter_handlers(sanitizer: &Sanitizer) -> Result<ElementHandlers<'_>, Error> {
    Ok(vec![(
        any_element()?,
        ElementContentHandlers::default().element(move |el: &mut Element<'_, '_>| -> HandlerResult {
            sanitizer.filter_escapeworthy(el);
            Ok(())
        }),
    )])
}

fn text_handlers(sanitizer: &Sanitizer) -> Vec<DocumentContentHandlers<'_>> {
    vec![DocumentContentHandlers::default().text(move |chunk: &mut TextChunk<'_>| -> HandlerResult {
        sanitizer.sanitize_text(chunk);
        Ok(())
    })]
}

fn rewrite_error(err: RewritingError) -> Error {
    match err {
        RewritingError::ContentHandlerError(err) => match err.downcast::<HandlerFailure>() {
            Ok(failure) => Error::Handler {
                handler: failure.handler,
                message: failure.source.to_string(),
            },
            Err(err) => Error::EventSource(err.to_string()),
        },
        err => Error::EventSource(err.to_string()),
    }
}

/// Runs the attribute pass alone, for fixed-point checks.
#[cfg(test)]
pub(crate) fn attribute_pass(sanitizer: &Sanitizer, input: &str) -> Result<String, Error> {
    let html = Html::new(None, Vec::new(), HtmlOptions::default())?;
    let output = html.run_pass("attributes", input.as_bytes(), Vec::new(), attribute_handlers(sanitizer)?)?;
    String::from_utf8(output).map_err(|err| Error::InvalidEncoding(err.utf8_error()))
}
