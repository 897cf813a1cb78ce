#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]

use super::*;
use crate::html::attribute_pass;
use crate::tags::Tag;
use crate::{sanitize, sanitize_with, Error};

/// A policy that allows nothing, adjusted by `build`.
fn policy(build: impl FnOnce(&mut Sanitizer)) -> Sanitizer {
    let mut sanitizer = Sanitizer::new();
    build(&mut sanitizer);
    sanitizer
}

fn clean(html: &str, sanitizer: &Sanitizer) -> String {
    sanitize_with(html, sanitizer).unwrap()
}

fn links(protocols: &[Protocol]) -> Sanitizer {
    policy(|s| {
        s.set_flag("a", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("a", "href", true).unwrap();
        s.set_allowed_protocols("a", "href", protocols, true).unwrap();
    })
}

// Structural pass

#[test]
fn test_default_policy_keeps_text_only() {
    assert_eq!(sanitize("<b>hi</b> <i>there</i>").unwrap(), "hi there");
}

#[test]
fn test_script_removed_with_contents_by_default() {
    let sanitizer = Sanitizer::from_config(&SanitizerConfig {
        elements: vec!["div".into()],
        attributes: [("div".to_string(), vec!["class".to_string()])].into(),
        allowed_classes: [("div".to_string(), vec!["safe".to_string()])].into(),
        ..SanitizerConfig::default()
    })
    .unwrap();

    assert_eq!(
        clean(r#"<div class="safe evil"><script>x()</script></div>"#, &sanitizer),
        r#"<div class="safe"></div>"#
    );
}

#[test]
fn test_raw_text_tags_lose_contents_without_flags() {
    let sanitizer = policy(|s| s.set_flag("div", SanitizerFlags::ALLOW, true).unwrap());

    assert_eq!(clean("<div><script>x()</script></div>", &sanitizer), "<div></div>");
    assert_eq!(clean("<div><style>p{}</style></div>", &sanitizer), "<div></div>");
    assert_eq!(clean("a<svg><circle r=\"1\"></circle></svg>b", &sanitizer), "ab");
    assert_eq!(clean("a<math><mi>x</mi></math>b", &sanitizer), "ab");
}

#[test]
fn test_unknown_tag_is_unwrapped() {
    assert_eq!(clean("<foo>bar</foo>", &Sanitizer::new()), "bar");
    assert_eq!(sanitize("<custom-element>x</custom-element>").unwrap(), "x");
}

#[test]
fn test_whitespace_wrapping() {
    assert_eq!(sanitize("foo<div>bar</div>baz").unwrap(), "foo bar baz");
    assert_eq!(sanitize("a<br>b").unwrap(), "a b");
    assert_eq!(sanitize("<span>a</span><span>b</span>").unwrap(), "ab");
}

#[test]
fn test_remove_contents_flag() {
    let sanitizer = policy(|s| s.set_flag("span", SanitizerFlags::REMOVE_CONTENTS, true).unwrap());
    assert_eq!(clean("a<span>secret</span>b", &sanitizer), "ab");
}

#[test]
fn test_comments() {
    assert_eq!(sanitize("a<!-- note -->b").unwrap(), "ab");

    let sanitizer = policy(|s| s.set_allow_comments(true));
    assert_eq!(clean("a<!-- note -->b", &sanitizer), "a<!-- note -->b");
}

#[test]
fn test_doctype() {
    assert_eq!(sanitize("<!DOCTYPE html>x").unwrap(), "x");

    let sanitizer = policy(|s| s.set_allow_doctype(true));
    assert_eq!(clean("<!DOCTYPE html>x", &sanitizer), "<!DOCTYPE html>x");
}

#[test]
fn test_kept_iframe_is_emptied() {
    let sanitizer = policy(|s| s.set_flag("iframe", SanitizerFlags::ALLOW, true).unwrap());
    assert_eq!(
        clean(r#"<iframe src="https://evil.example">fallback</iframe>"#, &sanitizer),
        "<iframe></iframe>"
    );

    let sanitizer = policy(|s| {
        s.set_flag("iframe", SanitizerFlags::ALLOW | SanitizerFlags::REMOVE_CONTENTS, true)
            .unwrap()
    });
    assert_eq!(clean("<iframe>fallback</iframe>", &sanitizer), "<iframe> </iframe>");
}

// Attribute pass

#[test]
fn test_disallowed_attributes_dropped() {
    let sanitizer = policy(|s| {
        s.set_flag("p", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("p", "title", true).unwrap();
    });
    assert_eq!(
        clean(r#"<p title="t" onclick="x()" style="color:red">hi</p>"#, &sanitizer),
        r#"<p title="t">hi</p>"#
    );
}

#[test]
fn test_global_attribute_allow_list() {
    let sanitizer = policy(|s| {
        s.set_flags(&["p", "span"], SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute(ALL_ELEMENTS, "ID", true).unwrap();
    });
    assert_eq!(
        clean(r#"<p id="a"><span id="b">x</span></p>"#, &sanitizer),
        r#"<p id="a"><span id="b">x</span></p>"#
    );
}

#[test]
fn test_attribute_values_are_decoded_and_re_escaped() {
    let sanitizer = policy(|s| {
        s.set_flag("div", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("div", "title", true).unwrap();
    });
    assert_eq!(
        clean(r#"<div title="  a&amp;b &lt;c&gt; 'q'">x</div>"#, &sanitizer),
        r#"<div title="a&amp;b &lt;c&gt; &#39;q&#39;">x</div>"#
    );
}

#[test]
fn test_empty_attribute_values_dropped() {
    let sanitizer = policy(|s| {
        s.set_flag("div", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("div", "title", true).unwrap();
    });
    assert_eq!(clean(r#"<div title="   ">x</div>"#, &sanitizer), "<div>x</div>");
    assert_eq!(clean(r#"<div title="&#32;">x</div>"#, &sanitizer), "<div>x</div>");
}

#[test]
fn test_javascript_href_dropped() {
    let sanitizer = links(&[Protocol::from("http"), Protocol::from("https")]);
    assert_eq!(clean(r#"<a href="javascript:alert(1)">x</a>"#, &sanitizer), "<a>x</a>");
    assert_eq!(clean(r#"<a href="jav&#x09;ascript:alert(1)">x</a>"#, &sanitizer), "<a>x</a>");
    assert_eq!(
        clean(r#"<a href="https://example.com/">x</a>"#, &sanitizer),
        r#"<a href="https://example.com/">x</a>"#
    );
}

#[test]
fn test_protocol_match_is_case_insensitive() {
    let sanitizer = links(&[Protocol::from("https")]);
    assert_eq!(
        clean(r#"<a href="HTTPS://example.com">x</a>"#, &sanitizer),
        r#"<a href="HTTPS://example.com">x</a>"#
    );
}

#[test]
fn test_relative_protocols() {
    let sanitizer = links(&[Protocol::Relative]);
    assert_eq!(clean(r#"<a href="/path">x</a>"#, &sanitizer), r#"<a href="/path">x</a>"#);
    assert_eq!(clean(r##"<a href="#top">x</a>"##, &sanitizer), r##"<a href="#top">x</a>"##);
    assert_eq!(clean(r#"<a href="mailto:a@b.c">x</a>"#, &sanitizer), "<a>x</a>");
}

#[test]
fn test_href_uses_href_escaping() {
    let sanitizer = links(&[Protocol::from("https")]);
    assert_eq!(
        clean(r#"<a href="https://e.com/a b?q=1&amp;r='2'">x</a>"#, &sanitizer),
        r#"<a href="https://e.com/a%20b?q=1&amp;r=&#x27;2&#x27;">x</a>"#
    );
}

#[test]
fn test_protocol_checked_attributes_use_href_escaping() {
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();
    assert_eq!(
        clean(r#"<img src="https://e.com/a b.png" alt="a/b">"#, &sanitizer),
        r#"<img src="https://e.com/a%20b.png" alt="a&#47;b">"#
    );
    assert_eq!(
        clean(r#"<q cite="https://e.com/q?a=1&amp;b=2">x</q>"#, &sanitizer),
        r#"<q cite="https://e.com/q?a=1&amp;b=2">x</q>"#
    );
}

#[test]
fn test_img_src_is_a_fixed_point() {
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();
    let once = clean(r#"<img src="https://e.com/i.png?w=1&amp;h=2" alt="i">"#, &sanitizer);
    assert_eq!(once, r#"<img src="https://e.com/i.png?w=1&amp;h=2" alt="i">"#);
    assert_eq!(attribute_pass(&sanitizer, &once).unwrap(), once);
}

#[test]
fn test_class_filtering() {
    let sanitizer = policy(|s| {
        s.set_flag("div", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute(ALL_ELEMENTS, "class", true).unwrap();
        s.set_allowed_class(ALL_ELEMENTS, "a", true).unwrap();
        s.set_allowed_class("div", "b", true).unwrap();
    });
    assert_eq!(
        clean("<div class=\"a \t b  c\">x</div>", &sanitizer),
        r#"<div class="a b">x</div>"#
    );
    assert_eq!(clean(r#"<div class="c">x</div>"#, &sanitizer), "<div>x</div>");
}

#[test]
fn test_classes_unfiltered_without_allow_lists() {
    let sanitizer = policy(|s| {
        s.set_flag("div", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("div", "class", true).unwrap();
    });
    assert_eq!(clean(r#"<div class="x y">z</div>"#, &sanitizer), r#"<div class="x y">z</div>"#);
}

#[test]
fn test_meta_charset_forced_to_utf8() {
    let sanitizer = policy(|s| {
        s.set_flag("meta", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("meta", "charset", true).unwrap();
    });
    assert_eq!(clean(r#"<meta charset="latin1">"#, &sanitizer), r#"<meta charset="utf-8">"#);
    assert_eq!(clean(r#"<meta charset="UTF-8">"#, &sanitizer), r#"<meta charset="UTF-8">"#);
}

#[test]
fn test_comment_opener_attribute_removes_element() {
    let sanitizer = policy(|s| {
        s.set_flag("div", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("div", "title", true).unwrap();
    });
    assert_eq!(clean(r#"<div <!--="x" title="t">text</div>"#, &sanitizer), "text");
}

#[test]
fn test_missing_required_attribute_drops_element() {
    let sanitizer = policy(|s| {
        s.set_flag("a", SanitizerFlags::ALLOW, true).unwrap();
        s.set_allowed_attribute("a", "href", true).unwrap();
        s.set_required_attribute("a", "href", true).unwrap();
    });
    assert_eq!(clean("<a>x</a>", &sanitizer), "x");
    assert_eq!(clean(r#"<a title="t">x</a>"#, &sanitizer), "x");
    assert_eq!(clean(r#"<a href="/y">x</a>"#, &sanitizer), r#"<a href="/y">x</a>"#);
}

#[test]
fn test_required_wildcard_accepts_anything() {
    let sanitizer = policy(|s| {
        s.set_flag("a", SanitizerFlags::ALLOW, true).unwrap();
        s.set_required_attribute("a", "href", true).unwrap();
        s.set_required_attribute("a", ANY_ATTRIBUTE, true).unwrap();
    });
    assert_eq!(clean("<a>x</a>", &sanitizer), "<a>x</a>");
}

#[test]
fn test_attribute_pass_is_a_fixed_point() {
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();
    let inputs = [
        r#"<p title="a &amp; b" class="x" onclick="y()">hi <a href="https://e.com/?q=1&amp;r=2">l</a></p>"#,
        r#"<img src="/i.png" alt="&quot;q&quot; &#39;s&#39;" onerror="x()">"#,
        r#"<div id=" spaced" lang="en"><span title="&lt;b&gt;">t</span></div>"#,
        r#"<a href="https://e.com/a b">x</a><a href="data:text/html,x">y</a>"#,
    ];

    for input in inputs {
        let once = clean(input, &sanitizer);
        assert_eq!(attribute_pass(&sanitizer, &once).unwrap(), once, "input: {input}");
    }
}

#[test]
fn test_removal_decision() {
    let sanitizer = Sanitizer::default();
    assert_eq!(
        sanitizer.removal_decision("DIV"),
        RemovalDecision { remove: true, remove_contents: false, wrap_with_space: true }
    );
    assert_eq!(
        sanitizer.removal_decision("script"),
        RemovalDecision { remove: true, remove_contents: true, wrap_with_space: false }
    );
    assert_eq!(
        sanitizer.removal_decision("not-a-tag"),
        RemovalDecision { remove: true, remove_contents: false, wrap_with_space: false }
    );
}

// Policy store

#[test]
fn test_unknown_tag_rejected_without_mutation() {
    let mut sanitizer = Sanitizer::new();
    let err = sanitizer
        .set_flags(&["div", "notatag"], SanitizerFlags::ALLOW, true)
        .unwrap_err();

    assert_eq!(err, Error::UnknownTag("notatag".into()));
    assert_eq!(sanitizer.flags(Tag::from_name("div").unwrap()), SanitizerFlags::empty());
    assert_eq!(sanitizer, Sanitizer::new());
}

#[test]
fn test_setters_are_idempotent() {
    let mut once = Sanitizer::new();
    once.set_allowed_attribute("a", "href", true).unwrap();

    let mut twice = once.clone();
    twice.set_allowed_attribute("a", "href", true).unwrap();
    assert_eq!(once, twice);

    twice.set_allowed_attribute("a", "href", false).unwrap();
    let a = Tag::from_name("a").unwrap();
    assert_eq!(twice.element_policy(a).unwrap().allowed_attributes().count(), 0);
}

#[test]
fn test_set_all_flags() {
    let mut sanitizer = Sanitizer::new();
    sanitizer.set_all_flags(SanitizerFlags::ALLOW, true);
    assert!(Tag::all().all(|tag| sanitizer.flags(tag).contains(SanitizerFlags::ALLOW)));

    sanitizer.set_all_flags(SanitizerFlags::ALLOW, false);
    assert!(Tag::all().all(|tag| sanitizer.flags(tag).is_empty()));
}

#[test]
fn test_relative_protocol_expands_to_sentinels() {
    assert_eq!(Protocol::from(":relative"), Protocol::Relative);
    assert_eq!(Protocol::from("relative"), Protocol::Relative);
    assert_eq!(Protocol::from("HTTP"), Protocol::Scheme("HTTP".into()));

    let sanitizer = links(&[Protocol::from(":relative"), Protocol::from("HTTP")]);
    let a = Tag::from_name("a").unwrap();
    let protocols: Vec<&str> = sanitizer
        .element_policy(a)
        .unwrap()
        .allowed_protocols("href")
        .unwrap()
        .collect();
    assert_eq!(protocols, vec!["#", "/", "http"]);
}

#[test]
fn test_has_allowed_protocol() {
    use super::events::has_allowed_protocol;

    let allowed = ["http", "/", "#"];
    assert!(has_allowed_protocol(allowed.into_iter(), "http://x"));
    assert!(has_allowed_protocol(allowed.into_iter(), "Http://x"));
    assert!(has_allowed_protocol(allowed.into_iter(), "/x:y"));
    assert!(has_allowed_protocol(allowed.into_iter(), "#frag"));
    assert!(!has_allowed_protocol(allowed.into_iter(), "https://x"));
    assert!(!has_allowed_protocol(allowed.into_iter(), "x"));
}

// Configuration

#[test]
fn test_presets_only_name_known_tags() {
    for preset in [Preset::Default, Preset::Restricted, Preset::Basic, Preset::Relaxed] {
        assert_eq!(preset.config().validate(), Ok(()), "{preset:?}");
    }
}

#[test]
fn test_default_preset_matches_default_sanitizer() {
    let sanitizer = Sanitizer::default();
    let flags = |name: &str| sanitizer.flags(Tag::from_name(name).unwrap());

    assert_eq!(flags("script"), SanitizerFlags::REMOVE_CONTENTS);
    assert_eq!(flags("p"), SanitizerFlags::WRAP_WHITESPACE);
    assert_eq!(flags("b"), SanitizerFlags::empty());
    assert!(!sanitizer.allow_comments());
    assert!(!sanitizer.allow_doctype());
    assert_eq!(sanitizer.allowed_attributes().count(), 0);
}

#[test]
fn test_restricted_preset() {
    let sanitizer = Sanitizer::from_config(&Preset::Restricted.config()).unwrap();
    assert_eq!(
        clean(r#"<p><b title="x">bold</b> <a href="/">link</a></p>"#, &sanitizer),
        " <b>bold</b> link "
    );
}

#[test]
fn test_relaxed_preset_keeps_images() {
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();
    assert_eq!(
        clean(r#"<img src="https://e.com/i.png" alt="i">"#, &sanitizer),
        r#"<img src="https://e.com/i.png" alt="i">"#
    );
    assert_eq!(clean(r#"<img src="javascript:x()" alt="i">"#, &sanitizer), r#"<img alt="i">"#);
}

#[test]
fn test_config_from_json() {
    let config: SanitizerConfig = serde_json::from_str(
        r#"{
            "elements": ["a", "p"],
            "attributes": { "all": ["title"], "a": ["href"] },
            "protocols": { "a": { "href": ["https", "relative"] } },
            "required_attributes": { "a": [] },
            "remove_contents": true,
            "allow_comments": true
        }"#,
    )
    .unwrap();
    let sanitizer = Sanitizer::from_config(&config).unwrap();

    assert!(sanitizer.allow_comments());
    assert!(sanitizer.allowed_attributes().eq(["title"]));
    assert_eq!(
        sanitizer.flags(Tag::from_name("em").unwrap()),
        SanitizerFlags::REMOVE_CONTENTS
    );
    let a = sanitizer.element_policy(Tag::from_name("a").unwrap()).unwrap();
    assert!(a.required_attributes().eq([ANY_ATTRIBUTE]));
    assert_eq!(clean("<p>a<em>b</em></p>", &sanitizer), "<p>a</p>");
}

#[test]
fn test_config_rejects_unknown_fields() {
    let result: Result<SanitizerConfig, _> = serde_json::from_str(r#"{ "elementz": [] }"#);
    assert!(result.is_err());
}

#[test]
fn test_config_with_unknown_tag_fails() {
    let config = SanitizerConfig {
        elements: vec!["div".into(), "marquee2".into()],
        ..SanitizerConfig::default()
    };
    assert_eq!(Sanitizer::from_config(&config), Err(Error::UnknownTag("marquee2".into())));
}

#[test]
fn test_preset_names_deserialize() {
    let preset: Preset = serde_json::from_str(r#""relaxed""#).unwrap();
    assert_eq!(preset, Preset::Relaxed);
}

#[test]
fn test_build_policy_reports_unknown_tags() {
    assert_eq!(SanitizerConfig::default().build_policy(), Ok(Sanitizer::default()));

    let config = SanitizerConfig {
        whitespace_elements: vec!["p".into(), "nope".into()],
        ..SanitizerConfig::default()
    };
    assert_eq!(config.build_policy(), Err(Error::UnknownTag("nope".into())));
}

#[test]
fn test_escape_tagfilter_config() {
    assert!(Sanitizer::default().escape_tagfilter());
    assert!(Sanitizer::new().escape_tagfilter());

    let config: SanitizerConfig = serde_json::from_str(r#"{ "escape_tagfilter": false }"#).unwrap();
    assert!(!Sanitizer::from_config(&config).unwrap().escape_tagfilter());
}
