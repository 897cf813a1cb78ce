use std::error::Error as StdError;
use std::fmt;

use bitflags::bitflags;
use lol_html::html_content::{Element, EndTag};

use super::Selector;

/// Error type handlers return to abort the rewrite.
pub type HandlerError = Box<dyn StdError + Send + Sync>;

bitflags! {
    /// The callbacks a [`Handler`] actually implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const ELEMENT = 1 << 0;
        const TEXT = 1 << 1;
        /// [`Handler::handle_end_tag`], for elements matched by `match_element`.
        const END_TAG = 1 << 2;
    }
}

/// What an element handler did with its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Keep going; later handlers see the (possibly mutated) element.
    Continue,
    /// Replace the element with this HTML. No later handler sees it.
    Replaced(String),
}

/// User code plugged into the rewrite pass.
///
/// A handler declares the callbacks it implements through
/// [`capabilities`](Handler::capabilities); the dispatch chain never calls
/// the others. Handlers are shared through [`Rc`](std::rc::Rc) with the
/// rewrite, so any state they keep needs interior mutability.
///
/// ```
/// use scrubrs::rewriter::{Capabilities, Handler, HandlerError, HandlerOutcome, Selector};
/// use lol_html::html_content::{Element, EndTag};
///
/// struct NoFollow(Selector);
///
/// impl Handler for NoFollow {
///     fn selector(&self) -> Option<&Selector> {
///         Some(&self.0)
///     }
///
///     fn capabilities(&self) -> Capabilities {
///         Capabilities::ELEMENT
///     }
///
///     fn handle_element(&self, element: &mut Element<'_, '_>, _ancestors: &[String])
///         -> Result<HandlerOutcome, HandlerError>
///     {
///         element.set_attribute("rel", "nofollow")?;
///         Ok(HandlerOutcome::Continue)
///     }
/// }
/// # let _ = NoFollow(Selector::element("a[href]"));
/// ```
pub trait Handler {
    /// Label used in timing statistics.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Where to call this handler. `None` registers nothing.
    fn selector(&self) -> Option<&Selector>;

    fn capabilities(&self) -> Capabilities;

    /// Called for each element matched by the selector's `match_element`.
    /// `ancestors` lists the open elements around it, outermost first.
    fn handle_element(
        &self,
        element: &mut Element<'_, '_>,
        ancestors: &[String],
    ) -> Result<HandlerOutcome, HandlerError> {
        let _ = (element, ancestors);
        Ok(HandlerOutcome::Continue)
    }

    /// Called for each text chunk inside `match_text_within`. The return
    /// value replaces the chunk and is inserted as HTML.
    fn handle_text(&self, text: &str) -> Result<String, HandlerError> {
        Ok(text.to_string())
    }

    /// Called at the end tag of each element matched by `match_element`,
    /// unless the element was replaced or removed. Void elements have no
    /// end tag.
    fn handle_end_tag(&self, end_tag: &mut EndTag<'_>) -> Result<(), HandlerError> {
        let _ = end_tag;
        Ok(())
    }
}

/// A handler error tagged with the handler that raised it.
#[derive(Debug)]
pub(crate) struct HandlerFailure {
    pub(crate) handler: String,
    pub(crate) source: HandlerError,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.handler, self.source)
    }
}

impl StdError for HandlerFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}
