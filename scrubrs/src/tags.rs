//! The HTML tag vocabulary.
//!
//! Policies are keyed by [`Tag`], a small index into a static table of the
//! element names the sanitizer knows about. Names outside the table are
//! "unknown": configuring them is an error, and encountering them in markup
//! means "no policy, not allowed".

use core::fmt;
use core::str::FromStr;

use crate::Error;

#[derive(Debug, Clone, Copy)]
struct TagInfo {
    name: &'static str,
    void: bool,
}

/// Known tags, sorted by name.
const TAGS: &[TagInfo] = &[
    TagInfo { name: "a", void: false },
    TagInfo { name: "abbr", void: false },
    TagInfo { name: "acronym", void: false },
    TagInfo { name: "address", void: false },
    TagInfo { name: "annotation-xml", void: false },
    TagInfo { name: "applet", void: false },
    TagInfo { name: "area", void: true },
    TagInfo { name: "article", void: false },
    TagInfo { name: "aside", void: false },
    TagInfo { name: "audio", void: false },
    TagInfo { name: "b", void: false },
    TagInfo { name: "base", void: true },
    TagInfo { name: "basefont", void: true },
    TagInfo { name: "bdi", void: false },
    TagInfo { name: "bdo", void: false },
    TagInfo { name: "bgsound", void: true },
    TagInfo { name: "big", void: false },
    TagInfo { name: "blink", void: false },
    TagInfo { name: "blockquote", void: false },
    TagInfo { name: "body", void: false },
    TagInfo { name: "br", void: true },
    TagInfo { name: "button", void: false },
    TagInfo { name: "canvas", void: false },
    TagInfo { name: "caption", void: false },
    TagInfo { name: "center", void: false },
    TagInfo { name: "cite", void: false },
    TagInfo { name: "code", void: false },
    TagInfo { name: "col", void: true },
    TagInfo { name: "colgroup", void: false },
    TagInfo { name: "data", void: false },
    TagInfo { name: "datalist", void: false },
    TagInfo { name: "dd", void: false },
    TagInfo { name: "del", void: false },
    TagInfo { name: "desc", void: false },
    TagInfo { name: "details", void: false },
    TagInfo { name: "dfn", void: false },
    TagInfo { name: "dir", void: false },
    TagInfo { name: "div", void: false },
    TagInfo { name: "dl", void: false },
    TagInfo { name: "dt", void: false },
    TagInfo { name: "em", void: false },
    TagInfo { name: "embed", void: true },
    TagInfo { name: "fieldset", void: false },
    TagInfo { name: "figcaption", void: false },
    TagInfo { name: "figure", void: false },
    TagInfo { name: "font", void: false },
    TagInfo { name: "footer", void: false },
    TagInfo { name: "foreignobject", void: false },
    TagInfo { name: "form", void: false },
    TagInfo { name: "frame", void: true },
    TagInfo { name: "frameset", void: false },
    TagInfo { name: "h1", void: false },
    TagInfo { name: "h2", void: false },
    TagInfo { name: "h3", void: false },
    TagInfo { name: "h4", void: false },
    TagInfo { name: "h5", void: false },
    TagInfo { name: "h6", void: false },
    TagInfo { name: "head", void: false },
    TagInfo { name: "header", void: false },
    TagInfo { name: "hgroup", void: false },
    TagInfo { name: "hr", void: true },
    TagInfo { name: "html", void: false },
    TagInfo { name: "i", void: false },
    TagInfo { name: "iframe", void: false },
    TagInfo { name: "image", void: false },
    TagInfo { name: "img", void: true },
    TagInfo { name: "input", void: true },
    TagInfo { name: "ins", void: false },
    TagInfo { name: "isindex", void: false },
    TagInfo { name: "kbd", void: false },
    TagInfo { name: "keygen", void: true },
    TagInfo { name: "label", void: false },
    TagInfo { name: "legend", void: false },
    TagInfo { name: "li", void: false },
    TagInfo { name: "link", void: true },
    TagInfo { name: "listing", void: false },
    TagInfo { name: "main", void: false },
    TagInfo { name: "malignmark", void: false },
    TagInfo { name: "map", void: false },
    TagInfo { name: "mark", void: false },
    TagInfo { name: "marquee", void: false },
    TagInfo { name: "math", void: false },
    TagInfo { name: "menu", void: false },
    TagInfo { name: "menuitem", void: true },
    TagInfo { name: "meta", void: true },
    TagInfo { name: "meter", void: false },
    TagInfo { name: "mglyph", void: false },
    TagInfo { name: "mi", void: false },
    TagInfo { name: "mn", void: false },
    TagInfo { name: "mo", void: false },
    TagInfo { name: "ms", void: false },
    TagInfo { name: "mtext", void: false },
    TagInfo { name: "multicol", void: false },
    TagInfo { name: "nav", void: false },
    TagInfo { name: "nextid", void: false },
    TagInfo { name: "nobr", void: false },
    TagInfo { name: "noembed", void: false },
    TagInfo { name: "noframes", void: false },
    TagInfo { name: "noscript", void: false },
    TagInfo { name: "object", void: false },
    TagInfo { name: "ol", void: false },
    TagInfo { name: "optgroup", void: false },
    TagInfo { name: "option", void: false },
    TagInfo { name: "output", void: false },
    TagInfo { name: "p", void: false },
    TagInfo { name: "param", void: true },
    TagInfo { name: "plaintext", void: false },
    TagInfo { name: "pre", void: false },
    TagInfo { name: "progress", void: false },
    TagInfo { name: "q", void: false },
    TagInfo { name: "rb", void: false },
    TagInfo { name: "rp", void: false },
    TagInfo { name: "rt", void: false },
    TagInfo { name: "rtc", void: false },
    TagInfo { name: "ruby", void: false },
    TagInfo { name: "s", void: false },
    TagInfo { name: "samp", void: false },
    TagInfo { name: "script", void: false },
    TagInfo { name: "section", void: false },
    TagInfo { name: "select", void: false },
    TagInfo { name: "small", void: false },
    TagInfo { name: "source", void: true },
    TagInfo { name: "spacer", void: false },
    TagInfo { name: "span", void: false },
    TagInfo { name: "strike", void: false },
    TagInfo { name: "strong", void: false },
    TagInfo { name: "style", void: false },
    TagInfo { name: "sub", void: false },
    TagInfo { name: "summary", void: false },
    TagInfo { name: "sup", void: false },
    TagInfo { name: "svg", void: false },
    TagInfo { name: "table", void: false },
    TagInfo { name: "tbody", void: false },
    TagInfo { name: "td", void: false },
    TagInfo { name: "template", void: false },
    TagInfo { name: "textarea", void: false },
    TagInfo { name: "tfoot", void: false },
    TagInfo { name: "th", void: false },
    TagInfo { name: "thead", void: false },
    TagInfo { name: "time", void: false },
    TagInfo { name: "title", void: false },
    TagInfo { name: "tr", void: false },
    TagInfo { name: "track", void: true },
    TagInfo { name: "tt", void: false },
    TagInfo { name: "u", void: false },
    TagInfo { name: "ul", void: false },
    TagInfo { name: "var", void: false },
    TagInfo { name: "video", void: false },
    TagInfo { name: "wbr", void: true },
    TagInfo { name: "xmp", void: false },
];

/// Number of tags in the vocabulary.
pub const TAG_COUNT: usize = TAGS.len();

/// A tag from the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(usize);

impl Tag {
    /// Looks up a tag by name, ignoring ASCII case.
    ///
    /// Returns `None` for names outside the vocabulary.
    pub fn lookup(name: &str) -> Option<Tag> {
        let found = if name.bytes().any(|b| b.is_ascii_uppercase()) {
            let lower = name.to_ascii_lowercase();
            TAGS.binary_search_by(|info| info.name.cmp(lower.as_str()))
        } else {
            TAGS.binary_search_by(|info| info.name.cmp(name))
        };
        found.ok().map(Tag)
    }

    /// Like [`Tag::lookup`], but an unknown name is an [`Error::UnknownTag`].
    pub fn from_name(name: &str) -> Result<Tag, Error> {
        Self::lookup(name).ok_or_else(|| Error::UnknownTag(name.to_string()))
    }

    /// Every tag in the vocabulary, in name order.
    pub fn all() -> impl Iterator<Item = Tag> {
        (0..TAG_COUNT).map(Tag)
    }

    /// The lowercase tag name.
    pub fn name(self) -> &'static str {
        TAGS[self.0].name
    }

    /// Whether the element has no end tag and no content (`br`, `img`, ...).
    pub fn is_void(self) -> bool {
        TAGS[self.0].void
    }

    /// Position in the vocabulary, usable as a dense array index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::from_name(s)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_table_is_sorted() {
        for pair in TAGS.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} >= {}", pair[0].name, pair[1].name);
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(Tag::lookup("DIV"), Tag::lookup("div"));
        assert_eq!(Tag::lookup("Script").unwrap().name(), "script");
    }

    #[test]
    fn test_unknown_tags() {
        assert_eq!(Tag::lookup("blink-tag"), None);
        assert!(matches!(Tag::from_name("custom"), Err(Error::UnknownTag(name)) if name == "custom"));
        assert!("notatag".parse::<Tag>().is_err());
    }

    #[test]
    fn test_void_elements() {
        for name in ["br", "img", "hr", "meta", "wbr", "input"] {
            assert!(Tag::from_name(name).unwrap().is_void(), "{name}");
        }
        for name in ["div", "p", "script", "iframe"] {
            assert!(!Tag::from_name(name).unwrap().is_void(), "{name}");
        }
    }

    #[test]
    fn test_all_covers_vocabulary() {
        assert_eq!(Tag::all().count(), TAG_COUNT);
        assert!(Tag::all().all(|tag| Tag::lookup(tag.name()) == Some(tag)));
    }
}
