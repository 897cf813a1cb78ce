//! Sanitizer callbacks for the events of one markup pass.

use std::borrow::Cow;

use lol_html::html_content::{Comment, ContentType, Doctype, Element, EndTag, TextChunk};
use lol_html::HandlerResult;
use smallvec::SmallVec;
use tracing::trace;

use super::policy::{ElementPolicy, Protocol, Sanitizer, SanitizerFlags, ANY_ATTRIBUTE};
use crate::codec::{escape_href, escape_html, unescape_html};
use crate::tags::Tag;

/// An attribute *named* like a comment opener means the tag was built to
/// smuggle a comment past the tokenizer.
const COMMENT_OPEN: &str = "<!--";
const UTF_8: &str = "utf-8";

/// Tags that switch the tokenizer into a raw-text, RCDATA or plaintext
/// state; the tagfilter pass removes them unless they are allowed.
const ESCAPEWORTHY: &[&str] = &[
    "iframe", "noembed", "noframes", "plaintext", "script", "style", "textarea", "title", "xmp",
];

/// Whitespace as the C locale's `isspace` sees it.
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Tags whose children are raw text or foreign content; unwrapping them
/// would leak that content as live markup or visible script.
fn has_text_content(tag: Tag) -> bool {
    matches!(tag.name(), "script" | "style" | "math" | "svg")
}

/// What happens to one element, derived from its tag's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalDecision {
    pub remove: bool,
    pub remove_contents: bool,
    pub wrap_with_space: bool,
}

impl RemovalDecision {
    fn from_flags(flags: SanitizerFlags) -> Self {
        Self {
            remove: !flags.contains(SanitizerFlags::ALLOW),
            remove_contents: flags.contains(SanitizerFlags::REMOVE_CONTENTS),
            wrap_with_space: flags.contains(SanitizerFlags::WRAP_WHITESPACE),
        }
    }
}

/// Outcome of the per-attribute policy check.
enum Verdict<'a> {
    Drop,
    Keep(Cow<'a, str>),
    /// A URL value: `href`, or any attribute with a protocol allow-list.
    KeepUrl(Cow<'a, str>),
}

impl Sanitizer {
    /// Removal flags for a tag name seen in markup; unknown tags get none.
    fn flags_for(&self, tag: Option<Tag>) -> SanitizerFlags {
        tag.map(|tag| self.flags(tag)).unwrap_or_default()
    }

    /// The structural decision for an element, before the special cases
    /// for raw-text tags are applied.
    pub fn removal_decision(&self, tag_name: &str) -> RemovalDecision {
        RemovalDecision::from_flags(self.flags_for(Tag::lookup(tag_name)))
    }

    pub fn sanitize_doctype(&self, doctype: &mut Doctype<'_>) {
        if !self.allow_doctype {
            doctype.remove();
        }
    }

    pub fn sanitize_comment(&self, comment: &mut Comment<'_>) {
        if !self.allow_comments {
            comment.remove();
        }
    }

    /// Structural pass: removes `element` unless its tag is allowed.
    ///
    /// Returns `true` if the element was removed. Raw-text tags always lose
    /// their content. A kept `<iframe>` has its content replaced.
    pub fn try_remove_element(&self, element: &mut Element<'_, '_>) -> bool {
        let tag = Tag::lookup(&element.tag_name());
        let flags = self.flags_for(tag);
        let decision = RemovalDecision::from_flags(flags);

        if decision.remove {
            let decision = match tag {
                Some(tag) if has_text_content(tag) => RemovalDecision {
                    remove: true,
                    remove_contents: true,
                    wrap_with_space: false,
                },
                _ => decision,
            };
            remove_element(element, tag, decision);
            return true;
        }

        if tag.is_some_and(|tag| tag.name() == "iframe") {
            let filler = if flags.intersects(SanitizerFlags::REMOVE_CONTENTS | SanitizerFlags::WRAP_WHITESPACE) {
                " "
            } else {
                ""
            };
            element.set_inner_content(filler, ContentType::Text);
        }
        false
    }

    /// Tagfilter pass: removes an escape-worthy element whose tag is not
    /// allowed. Returns `true` if the element was removed.
    pub fn filter_escapeworthy(&self, element: &mut Element<'_, '_>) -> bool {
        let name = element.tag_name();
        if !ESCAPEWORTHY.contains(&name.as_str()) {
            return false;
        }
        if self.flags_for(Tag::lookup(&name)).contains(SanitizerFlags::ALLOW) {
            return false;
        }
        trace!(tag = %name, "tagfilter");
        self.force_remove_element(element);
        true
    }

    /// Removes `element` the way its tag's flags say, regardless of `ALLOW`.
    fn force_remove_element(&self, element: &mut Element<'_, '_>) {
        let tag = Tag::lookup(&element.tag_name());
        let decision = RemovalDecision::from_flags(self.flags_for(tag));
        remove_element(element, tag, decision);
    }

    /// Attribute pass: re-applies the structural decision, then decodes,
    /// filters and re-encodes every attribute of a surviving element.
    pub fn sanitize_attributes(&self, element: &mut Element<'_, '_>) {
        if self.try_remove_element(element) {
            return;
        }

        let tag = Tag::lookup(&element.tag_name());
        let policy = tag.and_then(|tag| self.element_policy(tag));
        let is_meta = tag.is_some_and(|tag| tag.name() == "meta");

        let attributes: Vec<(String, String)> = element
            .attributes()
            .iter()
            .map(|attr| (attr.name(), attr.value()))
            .collect();
        let mut removed: SmallVec<[String; 4]> = SmallVec::new();

        for (name, raw_value) in attributes {
            if name == COMMENT_OPEN {
                if !element.removed() {
                    trace!(tag = %element.tag_name(), "comment opener in attribute position");
                    self.force_remove_element(element);
                }
                continue;
            }

            let decoded = unescape_html(&raw_value);
            let value = decoded.trim_start_matches(is_space);
            if value.is_empty() {
                removed.push(name);
                continue;
            }

            let kept = match self.should_keep_attribute(policy, &name, value) {
                Verdict::Drop => None,
                Verdict::Keep(value) if is_meta && name == "charset" => {
                    if value.eq_ignore_ascii_case(UTF_8) {
                        Some(value.into_owned())
                    } else {
                        Some(UTF_8.to_string())
                    }
                }
                Verdict::KeepUrl(value) => Some(escape_href(&value)),
                Verdict::Keep(value) => Some(escape_html(&value, true)),
            };

            let accepted = match kept {
                Some(escaped) => element.set_attribute(&name, &escaped).is_ok(),
                None => false,
            };
            if !accepted {
                trace!(tag = %element.tag_name(), attribute = %name, "dropping attribute");
                removed.push(name);
            }
        }

        for name in &removed {
            element.remove_attribute(name);
        }

        if let Some(policy) = policy.filter(|_| !element.removed()) {
            if !Self::has_required_attribute(policy, element) {
                trace!(tag = %element.tag_name(), "missing required attribute");
                self.force_remove_element(element);
            }
        }
    }

    /// Text event: escapes the chunk with the secure profile.
    ///
    /// The chunk is decoded first so text that is already escaped comes out
    /// unchanged.
    pub fn sanitize_text(&self, chunk: &mut TextChunk<'_>) {
        if chunk.as_str().is_empty() {
            return;
        }
        let escaped = escape_html(&unescape_html(chunk.as_str()), true);
        chunk.replace(&escaped, ContentType::Html);
    }

    fn has_required_attribute(policy: &ElementPolicy, element: &Element<'_, '_>) -> bool {
        let required = &policy.required_attributes;
        required.is_empty()
            || required.contains(ANY_ATTRIBUTE)
            || element.attributes().iter().any(|attr| required.contains(&attr.name()))
    }

    /// Decides whether attribute `name` with decoded `value` survives, and
    /// with what value.
    fn should_keep_attribute<'v>(&self, policy: Option<&ElementPolicy>, name: &str, value: &'v str) -> Verdict<'v> {
        let allowed = policy.is_some_and(|policy| policy.allowed_attributes.contains(name))
            || self.allowed_attributes.contains(name);
        if !allowed {
            return Verdict::Drop;
        }

        let protocols = policy.and_then(|policy| policy.protocols.get(name));
        if let Some(protocols) = protocols {
            if !has_allowed_protocol(protocols.iter().map(String::as_str), value) {
                return Verdict::Drop;
            }
        }

        if protocols.is_some() || name == "href" {
            return Verdict::KeepUrl(Cow::Borrowed(value));
        }

        if name == "class" {
            return match self.sanitize_class_attribute(policy, value) {
                Some(classes) => Verdict::Keep(classes),
                None => Verdict::Drop,
            };
        }

        Verdict::Keep(Cow::Borrowed(value))
    }

    /// Filters a class list against the global and per-tag allow-lists.
    ///
    /// With neither list configured every class passes. Returns `None` when
    /// no class survives.
    fn sanitize_class_attribute<'v>(&self, policy: Option<&ElementPolicy>, value: &'v str) -> Option<Cow<'v, str>> {
        let local = policy
            .map(|policy| &policy.allowed_classes)
            .filter(|classes| !classes.is_empty());
        if self.allowed_classes.is_empty() && local.is_none() {
            return Some(Cow::Borrowed(value));
        }

        let kept: SmallVec<[&str; 8]> = value
            .split(is_space)
            .filter(|class| !class.is_empty())
            .filter(|class| self.allowed_classes.contains(*class) || local.is_some_and(|local| local.contains(*class)))
            .collect();

        if kept.is_empty() {
            None
        } else {
            Some(Cow::Owned(kept.join(" ")))
        }
    }
}

/// Checks the scheme of `value` against a protocol allow-list.
///
/// The scheme is everything before the first `:`, `/` or `#`. A `/` or `#`
/// reached first means a relative reference, matched against the sentinel
/// entries instead.
pub(crate) fn has_allowed_protocol<'a>(mut allowed: impl Iterator<Item = &'a str>, value: &str) -> bool {
    let end = value.find([':', '/', '#']).unwrap_or(value.len());
    let wanted = match value[end..].chars().next() {
        Some('/') => Cow::Borrowed(Protocol::ROOT_RELATIVE),
        Some('#') => Cow::Borrowed(Protocol::FRAGMENT_RELATIVE),
        _ => Cow::Owned(value[..end].to_ascii_lowercase()),
    };
    allowed.any(|protocol| protocol == wanted)
}

/// Removes an element, either outright or by unwrapping its content.
fn remove_element(element: &mut Element<'_, '_>, tag: Option<Tag>, decision: RemovalDecision) {
    if decision.remove_contents {
        element.remove();
    } else {
        if decision.wrap_with_space {
            let void = tag.is_some_and(Tag::is_void) || !element.can_have_content();
            if !void {
                element.before(" ", ContentType::Text);
            }
            element.after(" ", ContentType::Text);
        }
        element.remove_and_keep_content();
    }

    if let Some(handlers) = element.end_tag_handlers() {
        handlers.push(Box::new(|end: &mut EndTag<'_>| -> HandlerResult {
            end.remove();
            Ok(())
        }));
    }
    trace!(tag = %element.tag_name(), contents = decision.remove_contents, "removed element");
}
