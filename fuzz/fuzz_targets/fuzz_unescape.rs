#![no_main]
use libfuzzer_sys::fuzz_target;
use scrubrs::codec::{escape_html, unescape_all, unescape_html};

fuzz_target!(|data: &[u8]| {
    let decoded = unescape_all(data);
    if !data.contains(&b'&') {
        assert_eq!(decoded, data);
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let escaped = escape_html(text, true);
        assert_eq!(unescape_html(&escaped), text);
    }
});
