#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use crate::*;

fn preset(preset: Preset) -> Sanitizer {
    Sanitizer::from_config(&preset.config()).unwrap()
}

#[test]
fn test_sanitize_plain_text_is_unchanged() {
    assert_eq!(sanitize("just text").unwrap(), "just text");
    assert_eq!(sanitize("").unwrap(), "");
}

#[test]
fn test_sanitize_keeps_entities_in_text() {
    assert_eq!(sanitize("<b>a &lt; b &amp;&amp; c</b>").unwrap(), "a &lt; b &amp;&amp; c");
}

#[test]
fn test_basic_preset() {
    let sanitizer = preset(Preset::Basic);
    assert_eq!(
        sanitize_with(
            r#"<p>See <a href="https://example.com" target="_blank">this</a> <img src="x.png"></p>"#,
            &sanitizer,
        )
        .unwrap(),
        r#"<p>See <a href="https://example.com">this</a> </p>"#
    );
    assert_eq!(
        sanitize_with(r#"<a href="mailto:me@example.com">mail</a>"#, &sanitizer).unwrap(),
        r#"<a href="mailto:me@example.com">mail</a>"#
    );
}

#[test]
fn test_relaxed_preset_tables() {
    let sanitizer = preset(Preset::Relaxed);
    let table = r#"<table border="1"><tr><td colspan="2" class="c">x</td></tr></table>"#;
    assert_eq!(sanitize_with(table, &sanitizer).unwrap(), table);
}

#[test]
fn test_sanitize_is_idempotent() {
    let sanitizer = preset(Preset::Relaxed);
    let input = r#"<div title="&quot;x&quot;"><a href="/a b">l</a><script>s()</script><b>t</b></div>"#;

    let once = sanitize_with(input, &sanitizer).unwrap();
    let twice = sanitize_with(&once, &sanitizer).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_error_messages() {
    assert_eq!(Error::UnknownTag("blinky".into()).to_string(), "unknown tag: blinky");
    assert_eq!(
        Error::Handler {
            handler: "h".into(),
            message: "m".into(),
        }
        .to_string(),
        "handler h failed: m"
    );
}

#[test]
fn test_version() {
    assert_eq!(version(), env!("CARGO_PKG_VERSION"));
}
