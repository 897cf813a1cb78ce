#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lol_html::html_content::{ContentType, Element, EndTag};

use super::*;
use crate::html::{Html, HtmlOptions};
use crate::sanitizer::{Preset, Sanitizer};
use crate::Error;

/// Appends its mark to `data-order` and counts its calls.
struct Marker {
    selector: Selector,
    mark: &'static str,
    calls: Cell<usize>,
}

impl Marker {
    fn new(css: &str, mark: &'static str) -> Self {
        Self {
            selector: Selector::element(css),
            mark,
            calls: Cell::new(0),
        }
    }
}

impl Handler for Marker {
    fn selector(&self) -> Option<&Selector> {
        Some(&self.selector)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ELEMENT
    }

    fn handle_element(&self, element: &mut Element<'_, '_>, _: &[String]) -> Result<HandlerOutcome, HandlerError> {
        self.calls.set(self.calls.get() + 1);
        let order = element.get_attribute("data-order").unwrap_or_default();
        element.set_attribute("data-order", &format!("{order}{}", self.mark))?;
        Ok(HandlerOutcome::Continue)
    }
}

struct Replacer(Selector);

impl Handler for Replacer {
    fn selector(&self) -> Option<&Selector> {
        Some(&self.0)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ELEMENT
    }

    fn handle_element(&self, _: &mut Element<'_, '_>, _: &[String]) -> Result<HandlerOutcome, HandlerError> {
        Ok(HandlerOutcome::Replaced("<em>gone</em>".to_string()))
    }
}

/// Rewrites text with a plain function.
struct TextMap {
    selector: Selector,
    map: fn(&str) -> String,
}

impl Handler for TextMap {
    fn name(&self) -> &str {
        "text-map"
    }

    fn selector(&self) -> Option<&Selector> {
        Some(&self.selector)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::TEXT
    }

    fn handle_text(&self, text: &str) -> Result<String, HandlerError> {
        Ok((self.map)(text))
    }
}

#[derive(Default)]
struct Ancestry {
    selector: Option<Selector>,
    seen: RefCell<Vec<Vec<String>>>,
}

impl Handler for Ancestry {
    fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ELEMENT
    }

    fn handle_element(&self, _: &mut Element<'_, '_>, ancestors: &[String]) -> Result<HandlerOutcome, HandlerError> {
        self.seen.borrow_mut().push(ancestors.to_vec());
        Ok(HandlerOutcome::Continue)
    }
}

struct Failing(Selector);

impl Handler for Failing {
    fn selector(&self) -> Option<&Selector> {
        Some(&self.0)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ELEMENT
    }

    fn handle_element(&self, _: &mut Element<'_, '_>, _: &[String]) -> Result<HandlerOutcome, HandlerError> {
        Err("boom".into())
    }
}

/// Records end tags and appends a marker after each one.
struct Closer {
    selector: Selector,
    capabilities: Capabilities,
    closed: RefCell<Vec<String>>,
}

impl Closer {
    fn new(css: &str, capabilities: Capabilities) -> Self {
        Self {
            selector: Selector::element(css),
            capabilities,
            closed: RefCell::default(),
        }
    }
}

impl Handler for Closer {
    fn selector(&self) -> Option<&Selector> {
        Some(&self.selector)
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn handle_end_tag(&self, end_tag: &mut EndTag<'_>) -> Result<(), HandlerError> {
        self.closed.borrow_mut().push(end_tag.name());
        end_tag.after("<!--closed-->", ContentType::Html);
        Ok(())
    }
}

struct FailingEndTag(Selector);

impl Handler for FailingEndTag {
    fn selector(&self) -> Option<&Selector> {
        Some(&self.0)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::END_TAG
    }

    fn handle_end_tag(&self, _: &mut EndTag<'_>) -> Result<(), HandlerError> {
        Err("late".into())
    }
}

fn shared<H: Handler + 'static>(handler: &Rc<H>) -> Rc<dyn Handler> {
    Rc::clone(handler) as Rc<dyn Handler>
}

fn rewrite(handlers: Vec<Rc<dyn Handler>>, input: &str) -> String {
    Html::new(None, handlers, HtmlOptions::default())
        .unwrap()
        .rewrite(input)
        .unwrap()
}

fn labels(stats: &Stats) -> Vec<&str> {
    stats.entries().iter().map(|stat| stat.label.as_str()).collect()
}

#[test]
fn test_handlers_run_in_registration_order() {
    let first = Rc::new(Marker::new("p", "1"));
    let second = Rc::new(Marker::new("p", "2"));

    assert_eq!(
        rewrite(vec![shared(&first), shared(&second)], "<p>x</p>"),
        r#"<p data-order="12">x</p>"#
    );
    assert_eq!(
        rewrite(vec![shared(&second), shared(&first)], "<p>x</p>"),
        r#"<p data-order="21">x</p>"#
    );
}

#[test]
fn test_replacement_halts_the_chain() {
    let replacer = Rc::new(Replacer(Selector::element("p")));
    let marker = Rc::new(Marker::new("p", "1"));

    assert_eq!(
        rewrite(vec![shared(&replacer), shared(&marker)], "<div><p>x</p></div>"),
        "<div><em>gone</em></div>"
    );
    assert_eq!(marker.calls.get(), 0);
}

#[test]
fn test_text_handler_replaces_chunks() {
    let shout = Rc::new(TextMap {
        selector: Selector::text("p"),
        map: |text| text.replace("Wow", "MEOW!"),
    });

    assert_eq!(
        rewrite(vec![shared(&shout)], "<p>Wow!</p><div>Wow</div>"),
        "<p>MEOW!!</p><div>Wow</div>"
    );
}

#[test]
fn test_text_within_ignored_containers_is_skipped() {
    let upper = Rc::new(TextMap {
        selector: Selector::text("div").ignore_text_within(["CODE"]),
        map: str::to_uppercase,
    });

    assert_eq!(
        rewrite(vec![shared(&upper)], "<div>a<code>b</code>c</div>"),
        "<div>A<code>b</code>C</div>"
    );
}

#[test]
fn test_capabilities_gate_callbacks() {
    let text_only = Rc::new(TextMap {
        selector: Selector::element("p").with_text("p"),
        map: |_| "t".to_string(),
    });
    let element_only = Rc::new(Marker::new("p", "1"));
    let mut element_only_with_text = Marker::new("p", "2");
    element_only_with_text.selector = element_only_with_text.selector.with_text("p");
    let element_only_with_text = Rc::new(element_only_with_text);

    assert_eq!(
        rewrite(
            vec![shared(&text_only), shared(&element_only), shared(&element_only_with_text)],
            "<p>x</p>"
        ),
        r#"<p data-order="12">t</p>"#
    );
}

#[test]
fn test_invalid_selector_registers_nothing() {
    let broken = Rc::new(Marker::new("p[", "x"));
    let working = Rc::new(Marker::new("p", "1"));

    assert_eq!(
        rewrite(vec![shared(&broken), shared(&working)], "<p>x</p>"),
        r#"<p data-order="1">x</p>"#
    );
    assert_eq!(broken.calls.get(), 0);
}

#[test]
fn test_handler_without_selector_registers_nothing() {
    let ancestry = Rc::new(Ancestry::default());
    assert_eq!(rewrite(vec![shared(&ancestry)], "<p>x</p>"), "<p>x</p>");
    assert!(ancestry.seen.borrow().is_empty());
}

#[test]
fn test_ancestors_exclude_void_and_closed_elements() {
    let ancestry = Rc::new(Ancestry {
        selector: Some(Selector::element("span")),
        ..Ancestry::default()
    });

    rewrite(
        vec![shared(&ancestry)],
        "<div><br><p><span>a</span></p><section><span>b</span></section></div><span>c</span>",
    );
    assert_eq!(
        *ancestry.seen.borrow(),
        vec![
            vec!["div".to_string(), "p".to_string()],
            vec!["div".to_string(), "section".to_string()],
            vec![],
        ]
    );
}

#[test]
fn test_handler_error_stops_the_rewrite() {
    let failing: Rc<dyn Handler> = Rc::new(Failing(Selector::element("p")));
    let err = Html::new(None, vec![failing], HtmlOptions::default())
        .unwrap()
        .rewrite("<p>x</p>")
        .unwrap_err();

    assert_eq!(
        err,
        Error::Handler {
            handler: "Failing".into(),
            message: "boom".into(),
        }
    );
}

#[test]
fn test_default_handler_name_is_the_type_name() {
    assert_eq!(Failing(Selector::element("p")).name(), "Failing");
}

#[test]
fn test_stats_order_and_counts() {
    let sanitizer = Sanitizer::from_config(&Preset::Basic.config()).unwrap();
    let marker = Rc::new(Marker::new("p", "1"));
    let unused = Rc::new(Marker::new("table", "2"));
    let shout = Rc::new(TextMap {
        selector: Selector::text("p"),
        map: str::to_uppercase,
    });
    let options = HtmlOptions {
        measure: true,
        ..HtmlOptions::default()
    };

    let handlers = vec![shared(&marker), shared(&unused), shared(&shout)];
    let mut html = Html::new(Some(sanitizer), handlers, options).unwrap();
    let out = html.rewrite("<p>a</p><p>b</p>").unwrap();
    assert_eq!(out, r#"<p data-order="1">A</p><p data-order="1">B</p>"#);

    let stats = html.stats().unwrap();
    assert_eq!(
        labels(stats),
        vec![
            "Sanitizer#structural",
            "Sanitizer#attributes",
            "Marker#call",
            "text-map#call",
            "Rewriter#handlers",
            "Sanitizer#tagfilter",
            "Html#rewrite",
        ]
    );
    assert_eq!(stats.get("Marker#call").unwrap().count, 2);
    assert_eq!(stats.get("text-map#call").unwrap().count, 2);
    assert!(stats.entries().iter().all(|stat| stat.millis >= 0.0));
}

#[test]
fn test_stats_absent_unless_measured() {
    let marker = Rc::new(Marker::new("p", "1"));
    let mut html = Html::new(None, vec![shared(&marker)], HtmlOptions::default()).unwrap();
    html.rewrite("<p>x</p>").unwrap();
    assert!(html.stats().is_none());
}

#[test]
fn test_dispatch_chain_stats_without_timing() {
    let marker = Rc::new(Marker::new("p", "1"));
    let chain = DispatchChain::new(&[shared(&marker)], false);
    assert!(!chain.is_empty());
    assert!(chain.stats().is_empty());
}

#[test]
fn test_end_tags_are_dispatched() {
    let closer = Rc::new(Closer::new("p, div", Capabilities::END_TAG));

    assert_eq!(
        rewrite(vec![shared(&closer)], "<div><p>a</p><br><span>b</span></div>"),
        "<div><p>a</p><!--closed--><br><span>b</span></div><!--closed-->"
    );
    assert_eq!(*closer.closed.borrow(), vec!["p".to_string(), "div".to_string()]);
}

#[test]
fn test_end_tag_needs_its_capability() {
    let closer = Rc::new(Closer::new("p", Capabilities::ELEMENT));

    assert_eq!(rewrite(vec![shared(&closer)], "<p>a</p>"), "<p>a</p>");
    assert!(closer.closed.borrow().is_empty());
}

#[test]
fn test_replaced_element_gets_no_end_tag() {
    let replacer = Rc::new(Replacer(Selector::element("p")));
    let closer = Rc::new(Closer::new("p", Capabilities::END_TAG));

    assert_eq!(
        rewrite(vec![shared(&replacer), shared(&closer)], "<p>a</p>"),
        "<em>gone</em>"
    );
    assert!(closer.closed.borrow().is_empty());
}

#[test]
fn test_end_tag_error_stops_the_rewrite() {
    let failing: Rc<dyn Handler> = Rc::new(FailingEndTag(Selector::element("p")));
    let err = Html::new(None, vec![failing], HtmlOptions::default())
        .unwrap()
        .rewrite("<p>x</p>")
        .unwrap_err();

    assert_eq!(
        err,
        Error::Handler {
            handler: "FailingEndTag".into(),
            message: "late".into(),
        }
    );
}

#[test]
fn test_end_tag_calls_are_timed() {
    let closer = Rc::new(Closer::new("p", Capabilities::END_TAG));
    let options = HtmlOptions {
        measure: true,
        ..HtmlOptions::default()
    };

    let mut html = Html::new(None, vec![shared(&closer)], options).unwrap();
    html.rewrite("<p>a</p><p>b</p>").unwrap();
    assert_eq!(html.stats().unwrap().get("Closer#call").unwrap().count, 2);
}
