use std::collections::{BTreeMap, BTreeSet, HashMap};

use bitflags::bitflags;

use crate::tags::{Tag, TAG_COUNT};
use crate::Error;

/// Pseudo tag name addressing the global allow-lists.
pub const ALL_ELEMENTS: &str = "all";

/// Required-attribute wildcard: any attribute at all satisfies the check.
pub const ANY_ATTRIBUTE: &str = "*";

bitflags! {
    /// Per-tag removal behaviour.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SanitizerFlags: u8 {
        /// The element itself may stay in the output.
        const ALLOW = 1 << 0;
        /// When removed, drop the whole subtree instead of unwrapping it.
        const REMOVE_CONTENTS = 1 << 1;
        /// When unwrapped, surround the promoted content with spaces.
        const WRAP_WHITESPACE = 1 << 2;
    }
}

/// An entry in a protocol allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// A URL scheme such as `https`; compared case-insensitively.
    Scheme(String),
    /// Root- and fragment-relative references (`/path`, `#anchor`).
    Relative,
}

impl Protocol {
    /// Sentinel entry for values starting with `/` (or containing one before any `:`).
    pub const ROOT_RELATIVE: &'static str = "/";
    /// Sentinel entry for values starting with `#`.
    pub const FRAGMENT_RELATIVE: &'static str = "#";

    fn entries(&self) -> Vec<String> {
        match self {
            Protocol::Scheme(scheme) => vec![scheme.to_ascii_lowercase()],
            Protocol::Relative => vec![
                Self::ROOT_RELATIVE.to_string(),
                Self::FRAGMENT_RELATIVE.to_string(),
            ],
        }
    }
}

impl From<&str> for Protocol {
    /// `"relative"` (with or without a leading `:`) is [`Protocol::Relative`];
    /// anything else is a scheme.
    fn from(name: &str) -> Self {
        match name.trim_start_matches(':') {
            "relative" => Protocol::Relative,
            scheme => Protocol::Scheme(scheme.to_string()),
        }
    }
}

/// Allow-lists that apply to a single tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPolicy {
    pub(crate) allowed_attributes: BTreeSet<String>,
    pub(crate) required_attributes: BTreeSet<String>,
    pub(crate) allowed_classes: BTreeSet<String>,
    pub(crate) protocols: BTreeMap<String, BTreeSet<String>>,
}

impl ElementPolicy {
    pub fn allowed_attributes(&self) -> impl Iterator<Item = &str> {
        self.allowed_attributes.iter().map(String::as_str)
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &str> {
        self.required_attributes.iter().map(String::as_str)
    }

    pub fn allowed_classes(&self) -> impl Iterator<Item = &str> {
        self.allowed_classes.iter().map(String::as_str)
    }

    /// Lowercase schemes and sentinels allowed for `attribute`, if it has a
    /// protocol allow-list at all.
    pub fn allowed_protocols(&self, attribute: &str) -> Option<impl Iterator<Item = &str>> {
        self.protocols
            .get(attribute)
            .map(|set| set.iter().map(String::as_str))
    }
}

/// The policy store: every allow-list and flag the sanitizer consults.
///
/// A freshly created `Sanitizer` allows nothing: every element is unwrapped,
/// every attribute dropped, comments and doctypes removed. Build a useful
/// policy with the setters, or start from a [`SanitizerConfig`].
///
/// Setters that take tag names validate them against the tag vocabulary and
/// fail with [`Error::UnknownTag`] without changing anything.
///
/// [`SanitizerConfig`]: crate::sanitizer::SanitizerConfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitizer {
    pub(crate) flags: [SanitizerFlags; TAG_COUNT],
    pub(crate) allowed_attributes: BTreeSet<String>,
    pub(crate) allowed_classes: BTreeSet<String>,
    pub(crate) element_policies: HashMap<Tag, ElementPolicy>,
    pub(crate) allow_comments: bool,
    pub(crate) allow_doctype: bool,
    pub(crate) escape_tagfilter: bool,
}

impl Sanitizer {
    /// Creates a policy that allows nothing.
    pub fn new() -> Self {
        Self {
            flags: [SanitizerFlags::empty(); TAG_COUNT],
            allowed_attributes: BTreeSet::new(),
            allowed_classes: BTreeSet::new(),
            element_policies: HashMap::new(),
            allow_comments: false,
            allow_doctype: false,
            escape_tagfilter: true,
        }
    }

    /// Sets or clears `flag` on one tag.
    pub fn set_flag(&mut self, tag: &str, flag: SanitizerFlags, set: bool) -> Result<(), Error> {
        self.set_flags(&[tag], flag, set)
    }

    /// Sets or clears `flag` on several tags. Either every tag is updated or,
    /// if any name is unknown, none is.
    pub fn set_flags(&mut self, tags: &[&str], flag: SanitizerFlags, set: bool) -> Result<(), Error> {
        let tags = tags
            .iter()
            .map(|name| Tag::from_name(name))
            .collect::<Result<Vec<_>, _>>()?;
        for tag in tags {
            self.flags[tag.index()].set(flag, set);
        }
        Ok(())
    }

    /// Sets or clears `flag` on every known tag.
    pub fn set_all_flags(&mut self, flag: SanitizerFlags, set: bool) {
        for flags in self.flags.iter_mut() {
            flags.set(flag, set);
        }
    }

    pub fn set_allow_comments(&mut self, allow: bool) {
        self.allow_comments = allow;
    }

    pub fn set_allow_doctype(&mut self, allow: bool) {
        self.allow_doctype = allow;
    }

    /// Enables the final pass that removes disallowed tagfilter tags
    /// (`title`, `textarea`, `style`, `xmp`, `iframe`, `noembed`,
    /// `noframes`, `script`, `plaintext`). On by default.
    pub fn set_escape_tagfilter(&mut self, escape: bool) {
        self.escape_tagfilter = escape;
    }

    /// Allows or disallows attribute `name` on `tag`, or on every element
    /// when `tag` is [`ALL_ELEMENTS`].
    pub fn set_allowed_attribute(&mut self, tag: &str, name: &str, allow: bool) -> Result<(), Error> {
        let set = match Self::scope(tag)? {
            None => &mut self.allowed_attributes,
            Some(tag) => &mut self.element_policy_mut(tag).allowed_attributes,
        };
        toggle(set, &name.to_ascii_lowercase(), allow);
        Ok(())
    }

    /// Allows or disallows class `name` on `tag`, or on every element when
    /// `tag` is [`ALL_ELEMENTS`].
    pub fn set_allowed_class(&mut self, tag: &str, name: &str, allow: bool) -> Result<(), Error> {
        let set = match Self::scope(tag)? {
            None => &mut self.allowed_classes,
            Some(tag) => &mut self.element_policy_mut(tag).allowed_classes,
        };
        toggle(set, name, allow);
        Ok(())
    }

    /// Adds `protocols` to, or removes them from, the allow-list for
    /// `attribute` on `tag`. Once an attribute has a protocol allow-list its
    /// values must match it, even if the list later becomes empty.
    pub fn set_allowed_protocols(
        &mut self,
        tag: &str,
        attribute: &str,
        protocols: &[Protocol],
        allow: bool,
    ) -> Result<(), Error> {
        let tag = Tag::from_name(tag)?;
        let set = self
            .element_policy_mut(tag)
            .protocols
            .entry(attribute.to_ascii_lowercase())
            .or_default();
        for entry in protocols.iter().flat_map(Protocol::entries) {
            toggle(set, &entry, allow);
        }
        Ok(())
    }

    /// Marks `name` as required on `tag`: unless at least one required
    /// attribute survives sanitization, the element is removed.
    /// [`ANY_ATTRIBUTE`] accepts any element.
    pub fn set_required_attribute(&mut self, tag: &str, name: &str, required: bool) -> Result<(), Error> {
        let tag = Tag::from_name(tag)?;
        toggle(
            &mut self.element_policy_mut(tag).required_attributes,
            &name.to_ascii_lowercase(),
            required,
        );
        Ok(())
    }

    pub fn flags(&self, tag: Tag) -> SanitizerFlags {
        self.flags[tag.index()]
    }

    pub fn allow_comments(&self) -> bool {
        self.allow_comments
    }

    pub fn allow_doctype(&self) -> bool {
        self.allow_doctype
    }

    pub fn escape_tagfilter(&self) -> bool {
        self.escape_tagfilter
    }

    /// Attributes allowed on every element.
    pub fn allowed_attributes(&self) -> impl Iterator<Item = &str> {
        self.allowed_attributes.iter().map(String::as_str)
    }

    /// Classes allowed on every element.
    pub fn allowed_classes(&self) -> impl Iterator<Item = &str> {
        self.allowed_classes.iter().map(String::as_str)
    }

    /// The per-tag overrides for `tag`, if any were configured.
    pub fn element_policy(&self, tag: Tag) -> Option<&ElementPolicy> {
        self.element_policies.get(&tag)
    }

    fn element_policy_mut(&mut self, tag: Tag) -> &mut ElementPolicy {
        self.element_policies.entry(tag).or_default()
    }

    /// `None` for the global scope, otherwise the validated tag.
    fn scope(tag: &str) -> Result<Option<Tag>, Error> {
        if tag == ALL_ELEMENTS {
            Ok(None)
        } else {
            Tag::from_name(tag).map(Some)
        }
    }
}

impl Default for Sanitizer {
    /// The [`Preset::Default`](crate::sanitizer::Preset::Default) policy.
    fn default() -> Self {
        // The default configuration names only tags from the vocabulary.
        crate::sanitizer::SanitizerConfig::default()
            .build_policy()
            .unwrap_or_else(|_| Self::new())
    }
}

fn toggle(set: &mut BTreeSet<String>, name: &str, present: bool) {
    if present {
        set.insert(name.to_string());
    } else {
        set.remove(name);
    }
}
