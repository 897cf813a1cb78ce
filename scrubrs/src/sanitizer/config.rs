//! Declarative sanitizer configuration and the built-in presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::policy::{Protocol, Sanitizer, SanitizerFlags, ALL_ELEMENTS, ANY_ATTRIBUTE};
use crate::tags::Tag;
use crate::Error;

/// Which removed elements lose their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoveContents {
    /// `true` applies to every tag, `false` to none.
    All(bool),
    /// Only these tags.
    Elements(Vec<String>),
}

impl Default for RemoveContents {
    fn default() -> Self {
        RemoveContents::Elements(Vec::new())
    }
}

/// A serializable description of a [`Sanitizer`] policy.
///
/// Missing fields take their value from [`Preset::Default`], so a JSON
/// document only needs to list what it changes:
///
/// ```
/// use scrubrs::sanitizer::{Sanitizer, SanitizerConfig};
///
/// let config: SanitizerConfig = serde_json::from_str(r#"{
///     "elements": ["a", "b"],
///     "attributes": { "a": ["href"] },
///     "protocols": { "a": { "href": ["https", "relative"] } }
/// }"#).unwrap();
/// let sanitizer = Sanitizer::from_config(&config).unwrap();
/// # let _ = sanitizer;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizerConfig {
    /// Tags that may stay in the output.
    pub elements: Vec<String>,
    /// Allowed attributes per tag; the key `"all"` applies to every tag.
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Allowed URL protocols per tag and attribute. `"relative"` stands for
    /// root- and fragment-relative references.
    pub protocols: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub remove_contents: RemoveContents,
    /// Tags whose content is padded with spaces when they are unwrapped.
    pub whitespace_elements: Vec<String>,
    /// Attributes of which at least one must be present for the tag to be
    /// kept. An empty list accepts any attributes.
    pub required_attributes: BTreeMap<String, Vec<String>>,
    /// Allowed classes per tag; the key `"all"` applies to every tag.
    pub allowed_classes: BTreeMap<String, Vec<String>>,
    pub allow_comments: bool,
    pub allow_doctype: bool,
    /// Run a last pass that removes disallowed raw-text and RCDATA tags
    /// (`title`, `textarea`, `script` and friends) that reappear after the
    /// handler pass.
    pub escape_tagfilter: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            attributes: BTreeMap::new(),
            protocols: BTreeMap::new(),
            remove_contents: RemoveContents::Elements(strings(&[
                "iframe", "math", "noembed", "noframes", "noscript", "plaintext", "script", "style",
                "svg", "xmp",
            ])),
            whitespace_elements: strings(&[
                "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
                "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "li", "nav", "ol", "p",
                "pre", "section", "ul",
            ]),
            required_attributes: BTreeMap::new(),
            allowed_classes: BTreeMap::new(),
            allow_comments: false,
            allow_doctype: false,
            escape_tagfilter: true,
        }
    }
}

/// Built-in policies, from most to least strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Strips all markup, keeping only text.
    Default,
    /// Simple inline formatting: `b`, `em`, `i`, `strong`, `u`.
    Restricted,
    /// Inline and block formatting plus links.
    Basic,
    /// Basic plus headings, tables, images and global presentation attributes.
    Relaxed,
}

impl Preset {
    pub fn config(self) -> SanitizerConfig {
        match self {
            Preset::Default => SanitizerConfig::default(),
            Preset::Restricted => restricted(),
            Preset::Basic => basic(),
            Preset::Relaxed => relaxed(),
        }
    }
}

impl SanitizerConfig {
    /// Checks every tag name the configuration mentions.
    pub fn validate(&self) -> Result<(), Error> {
        let scoped = |name: &&String| name.as_str() != ALL_ELEMENTS;
        let removal_tags = match &self.remove_contents {
            RemoveContents::All(_) => &[][..],
            RemoveContents::Elements(tags) => tags.as_slice(),
        };

        self.elements
            .iter()
            .chain(self.whitespace_elements.iter())
            .chain(removal_tags)
            .chain(self.attributes.keys().filter(scoped))
            .chain(self.allowed_classes.keys().filter(scoped))
            .chain(self.protocols.keys())
            .chain(self.required_attributes.keys())
            .try_for_each(|name| Tag::from_name(name).map(drop))
    }

    /// Builds the policy. Fails on the first unknown tag name.
    pub(crate) fn build_policy(&self) -> Result<Sanitizer, Error> {
        let mut sanitizer = Sanitizer::new();

        for tag in tags(&self.elements)? {
            sanitizer.flags[tag.index()] |= SanitizerFlags::ALLOW;
        }

        for (scope, names) in &self.attributes {
            for name in names {
                sanitizer.set_allowed_attribute(scope, name, true)?;
            }
        }

        for (tag, attributes) in &self.protocols {
            for (attribute, protocols) in attributes {
                let protocols = protocols.iter().map(|p| Protocol::from(p.as_str())).collect::<Vec<_>>();
                sanitizer.set_allowed_protocols(tag, attribute, &protocols, true)?;
            }
        }

        match &self.remove_contents {
            RemoveContents::All(set) => sanitizer.set_all_flags(SanitizerFlags::REMOVE_CONTENTS, *set),
            RemoveContents::Elements(names) => {
                for tag in tags(names)? {
                    sanitizer.flags[tag.index()] |= SanitizerFlags::REMOVE_CONTENTS;
                }
            }
        }

        for tag in tags(&self.whitespace_elements)? {
            sanitizer.flags[tag.index()] |= SanitizerFlags::WRAP_WHITESPACE;
        }

        for (tag, names) in &self.required_attributes {
            if names.is_empty() {
                sanitizer.set_required_attribute(tag, ANY_ATTRIBUTE, true)?;
            }
            for name in names {
                sanitizer.set_required_attribute(tag, name, true)?;
            }
        }

        for (scope, names) in &self.allowed_classes {
            for name in names {
                sanitizer.set_allowed_class(scope, name, true)?;
            }
        }

        sanitizer.set_allow_comments(self.allow_comments);
        sanitizer.set_allow_doctype(self.allow_doctype);
        sanitizer.set_escape_tagfilter(self.escape_tagfilter);
        Ok(sanitizer)
    }
}

impl Sanitizer {
    /// Builds a policy from a configuration.
    ///
    /// Fails with [`Error::UnknownTag`] if the configuration names a tag
    /// outside the vocabulary; nothing is built in that case.
    pub fn from_config(config: &SanitizerConfig) -> Result<Self, Error> {
        config.validate()?;
        config.build_policy()
    }
}

fn tags(names: &[String]) -> Result<Vec<Tag>, Error> {
    names.iter().map(|name| Tag::from_name(name)).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn restricted() -> SanitizerConfig {
    SanitizerConfig {
        elements: strings(&["b", "em", "i", "strong", "u"]),
        ..SanitizerConfig::default()
    }
}

const BASIC_ELEMENTS: &[&str] = &[
    "a", "abbr", "blockquote", "br", "cite", "code", "dd", "dfn", "dl", "dt", "em", "i", "kbd",
    "li", "mark", "ol", "p", "pre", "q", "s", "samp", "small", "strike", "strong", "sub", "sup",
    "time", "u", "ul", "var",
];

const BASIC_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("abbr", &["title"]),
    ("blockquote", &["cite"]),
    ("dfn", &["title"]),
    ("q", &["cite"]),
    ("time", &["datetime", "pubdate"]),
];

fn basic() -> SanitizerConfig {
    let mut config = SanitizerConfig {
        elements: strings(BASIC_ELEMENTS),
        ..SanitizerConfig::default()
    };

    for (tag, attributes) in BASIC_ATTRIBUTES {
        config.attributes.insert(tag.to_string(), strings(attributes));
    }

    let web = strings(&["http", "https", "relative"]);
    let mut link = web.clone();
    link.extend(strings(&["ftp", "mailto"]));
    config.protocols.insert("a".into(), BTreeMap::from([("href".into(), link)]));
    config.protocols.insert("blockquote".into(), BTreeMap::from([("cite".into(), web.clone())]));
    config.protocols.insert("q".into(), BTreeMap::from([("cite".into(), web)]));
    config
}

const RELAXED_ATTRIBUTES: &[(&str, &[&str])] = &[
    (ALL_ELEMENTS, &["class", "dir", "hidden", "id", "lang", "tabindex", "title", "translate"]),
    ("a", &["href", "hreflang", "name", "rel"]),
    ("col", &["span", "width"]),
    ("colgroup", &["span", "width"]),
    ("data", &["value"]),
    ("del", &["cite", "datetime"]),
    ("img", &["align", "alt", "border", "height", "src", "srcset", "width"]),
    ("ins", &["cite", "datetime"]),
    ("li", &["value"]),
    ("ol", &["reversed", "start", "type"]),
    ("table", &["align", "border", "cellpadding", "cellspacing", "summary", "width"]),
    ("td", &["abbr", "align", "colspan", "headers", "rowspan", "valign", "width"]),
    ("th", &["abbr", "align", "colspan", "headers", "rowspan", "scope", "valign", "width"]),
    ("ul", &["type"]),
];

fn relaxed() -> SanitizerConfig {
    let mut config = basic();

    config.elements.extend(strings(&[
        "address", "article", "aside", "bdi", "bdo", "caption", "col", "colgroup", "data", "del",
        "div", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
        "hgroup", "hr", "img", "ins", "main", "nav", "rp", "rt", "ruby", "section", "span",
        "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "wbr",
    ]));

    for (tag, attributes) in RELAXED_ATTRIBUTES {
        config
            .attributes
            .entry(tag.to_string())
            .or_default()
            .extend(strings(attributes));
    }

    let web = strings(&["http", "https", "relative"]);
    for (tag, attribute) in [("del", "cite"), ("img", "src"), ("ins", "cite")] {
        config
            .protocols
            .entry(tag.into())
            .or_default()
            .insert(attribute.into(), web.clone());
    }
    config
}
