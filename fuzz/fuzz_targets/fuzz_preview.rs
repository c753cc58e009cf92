#![no_main]
//! Fuzz target for preview extraction
//!
//! Random bytes are treated as a fetched preview page. Extraction may
//! fail, but must not panic on unbalanced tags or odd URLs.

use libfuzzer_sys::fuzz_target;

use desktop::preview::extract_preview;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);
    if let Ok(content) = extract_preview(&html, "/projects/fuzz/index.html", "https://example.com/") {
        let _ = content.to_html();
    }
});
