#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use crate::*;

fn relaxed(html: &str) -> String {
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();
    sanitize_with(html, &sanitizer).unwrap()
}

#[test]
fn test_conditional_comments() {
    assert_eq!(relaxed("<!--[if gte IE 4]>\n<script>alert('XSS');</script>\n<![endif]-->"), "");
}

#[test]
fn test_unquoted_javascript_src() {
    assert_eq!(relaxed(r#"<img src=javascript:alert("XSS")>"#), "<img>");
    assert_eq!(relaxed(r#"<img src=`javascript:alert("XSS")`>"#), "<img>");
}

#[test]
fn test_entity_encoded_javascript_src() {
    assert_eq!(
        relaxed("<img src=&#106;&#97;&#118;&#97;&#115;&#99;&#114;&#105;&#112;&#116;&#58;&#97;&#108;&#101;&#114;&#116;&#40;&#39;&#88;&#83;&#83;&#39;&#41;>"),
        "<img>"
    );
    assert_eq!(
        relaxed("<img src=&#0000106&#0000097&#0000118&#0000097&#0000115&#0000099&#0000114&#0000105&#0000112&#0000116&#0000058&#0000097&#0000108&#0000101&#0000114&#0000116&#0000040&#0000039&#0000088&#0000083&#0000083&#0000039&#0000041>"),
        "<img>"
    );
    assert_eq!(
        relaxed("<img src=&#x6A&#x61&#x76&#x61&#x73&#x63&#x72&#x69&#x70&#x74&#x3A&#x61&#x6C&#x65&#x72&#x74&#x28&#x27&#x58&#x53&#x53&#x27&#x29>"),
        "<img>"
    );
}

#[test]
fn test_whitespace_inside_scheme() {
    for src in ["jav&#x09;ascript", "jav&#x0A;ascript", "jav&#x0D;ascript", "jav\tascript", " &#14;  javascript"] {
        let html = format!("<img src=\"{src}:alert('XSS');\">");
        assert_eq!(relaxed(&html), "<img>", "{html}");
    }
}

#[test]
fn test_malformed_script_tag_name() {
    assert_eq!(relaxed(r#"<script/xss src="http://ha.ckers.org/xss.js">alert(1)</script>"#), "");
}

#[test]
fn test_event_handlers_never_survive() {
    assert_eq!(
        relaxed(r#"<div onmouseover="x()" id="d"><span onclick='y()'>t</span></div>"#),
        r#"<div id="d"><span>t</span></div>"#
    );
}
