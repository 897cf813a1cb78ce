//! Handler dispatch chain.
//!
//! A [`DispatchChain`] turns an ordered list of shared [`Handler`]s into
//! the element, end-tag and text callbacks of one rewrite pass. Handlers
//! run in registration order; an element handler that returns
//! [`HandlerOutcome::Replaced`] ends the chain for that element.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use lol_html::html_content::{ContentType, Element, EndTag, TextChunk};
use lol_html::{ElementContentHandlers, HandlerResult, Selector as CompiledSelector};
use tracing::debug;

pub use self::handler::{Capabilities, Handler, HandlerError, HandlerOutcome};
pub use self::selector::Selector;
pub use self::stats::{Stat, Stats};

pub(crate) use self::handler::HandlerFailure;
pub(crate) use self::stats::CallTimer;

mod handler;
mod selector;
mod stats;

#[cfg(test)]
mod tests;

type ContentHandlers<'h> = Vec<(Cow<'static, CompiledSelector>, ElementContentHandlers<'h>)>;

type Timer = Rc<Cell<CallTimer>>;

/// Ordered, shared handlers plus optional per-handler timing.
pub struct DispatchChain {
    handlers: Vec<Rc<dyn Handler>>,
    timers: Option<Vec<Timer>>,
}

impl DispatchChain {
    pub fn new(handlers: &[Rc<dyn Handler>], measure: bool) -> Self {
        Self {
            handlers: handlers.to_vec(),
            timers: measure.then(|| handlers.iter().map(|_| Timer::default()).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Builds the rewriter callbacks for every handler, in order.
    ///
    /// Selectors are compiled here and owned by the returned list. A handler
    /// whose selector fails to compile registers nothing.
    pub(crate) fn content_handlers<'c>(&'c self) -> ContentHandlers<'c> {
        let mut registrations = ContentHandlers::new();

        for (index, handler) in self.handlers.iter().enumerate() {
            let Some(scope) = handler.selector() else {
                debug!(handler = handler.name(), "handler has no selector");
                continue;
            };
            let capabilities = handler.capabilities();
            let timer = self.timers.as_ref().and_then(|timers| timers.get(index));
            let stack = Rc::new(RefCell::new(Vec::<String>::new()));
            let before = registrations.len();

            if capabilities.intersects(Capabilities::ELEMENT | Capabilities::END_TAG) {
                if let Some(compiled) = scope
                    .match_element()
                    .and_then(|css| selector::compile(css, handler.name()))
                {
                    let stack = Rc::clone(&stack);
                    registrations.push((
                        compiled,
                        ElementContentHandlers::default().element(move |el: &mut Element<'_, '_>| -> HandlerResult {
                            dispatch_element(handler, capabilities, timer, el, &stack.borrow())
                        }),
                    ));
                }
            }

            if capabilities.contains(Capabilities::TEXT) {
                if let Some(compiled) = scope
                    .match_text_within()
                    .and_then(|css| selector::compile(css, handler.name()))
                {
                    let stack = Rc::clone(&stack);
                    let ignored = scope.ignored_text_containers();
                    registrations.push((
                        compiled,
                        ElementContentHandlers::default().text(move |chunk: &mut TextChunk<'_>| -> HandlerResult {
                            let skip = stack
                                .borrow()
                                .last()
                                .is_some_and(|innermost| ignored.contains(innermost));
                            if skip {
                                return Ok(());
                            }
                            dispatch_text(&**handler, timer, chunk)
                        }),
                    ));
                }
            }

            if registrations.len() > before {
                let Some(any) = selector::compile("*", handler.name()) else {
                    continue;
                };
                registrations.push((
                    any,
                    ElementContentHandlers::default().element(move |el: &mut Element<'_, '_>| -> HandlerResult {
                        track_ancestors(&stack, el)
                    }),
                ));
            }
        }

        registrations
    }

    /// Per-handler totals for handlers that ran at least once, in
    /// registration order.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats::new();
        let Some(timers) = &self.timers else {
            return stats;
        };
        for (handler, timer) in self.handlers.iter().zip(timers) {
            let timer = timer.get();
            if timer.calls > 0 {
                stats.record(format!("{}#call", handler.name()), timer.calls, timer.elapsed);
            }
        }
        stats
    }
}

/// Runs `f`, adding its duration to `timer` when timing is on.
fn timed<T>(timer: Option<&Timer>, f: impl FnOnce() -> T) -> T {
    match timer {
        None => f(),
        Some(cell) => {
            let start = Instant::now();
            let result = f();
            let mut totals = cell.get();
            totals.add(start.elapsed());
            cell.set(totals);
            result
        }
    }
}

fn failure(handler: &dyn Handler, source: HandlerError) -> HandlerError {
    Box::new(HandlerFailure {
        handler: handler.name().to_string(),
        source,
    })
}

fn dispatch_element(
    handler: &Rc<dyn Handler>,
    capabilities: Capabilities,
    timer: Option<&Timer>,
    element: &mut Element<'_, '_>,
    ancestors: &[String],
) -> HandlerResult {
    // An earlier handler replaced or removed this element.
    if element.removed() {
        return Ok(());
    }

    if capabilities.contains(Capabilities::ELEMENT) {
        match timed(timer, || handler.handle_element(element, ancestors)) {
            Ok(HandlerOutcome::Continue) => {}
            Ok(HandlerOutcome::Replaced(html)) => {
                element.replace(&html, ContentType::Html);
                return Ok(());
            }
            Err(err) => return Err(failure(&**handler, err)),
        }
    }

    if capabilities.contains(Capabilities::END_TAG) && !element.removed() {
        let handler = Rc::clone(handler);
        let timer = timer.cloned();
        if let Some(handlers) = element.end_tag_handlers() {
            handlers.push(Box::new(move |end: &mut EndTag<'_>| -> HandlerResult {
                timed(timer.as_ref(), || handler.handle_end_tag(end)).map_err(|err| failure(&*handler, err))
            }));
        }
    }
    Ok(())
}

fn dispatch_text(handler: &dyn Handler, timer: Option<&Timer>, chunk: &mut TextChunk<'_>) -> HandlerResult {
    if chunk.as_str().is_empty() || chunk.removed() {
        return Ok(());
    }

    let replacement = timed(timer, || handler.handle_text(chunk.as_str())).map_err(|err| failure(handler, err))?;
    chunk.replace(&replacement, ContentType::Html);
    Ok(())
}

/// Keeps `stack` in sync with the open elements. Void and removed elements
/// never see their end tag, so they are not pushed.
fn track_ancestors(stack: &Rc<RefCell<Vec<String>>>, element: &mut Element<'_, '_>) -> HandlerResult {
    if element.removed() || !element.can_have_content() {
        return Ok(());
    }

    stack.borrow_mut().push(element.tag_name());
    let stack = Rc::clone(stack);
    if let Some(handlers) = element.end_tag_handlers() {
        handlers.push(Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
            stack.borrow_mut().pop();
            Ok(())
        }));
    }
    Ok(())
}
