#![no_main]
use libfuzzer_sys::fuzz_target;
use scrubrs::{Html, HtmlOptions, Preset, Sanitizer};

fuzz_target!(|data: &[u8]| {
    let Ok(sanitizer) = Sanitizer::from_config(&Preset::Relaxed.config()) else {
        return;
    };
    let options = HtmlOptions {
        escape_text: data.first().is_some_and(|b| b & 1 == 1),
        ..HtmlOptions::default()
    };
    let Ok(mut html) = Html::new(Some(sanitizer), Vec::new(), options) else {
        return;
    };

    // Rewriter errors are fine, panics are not.
    let _ = html.rewrite(data);
});
