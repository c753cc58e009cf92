#![no_main]
//! Fuzz target for site config parsing
//!
//! Feeds random text as `config.toml`; parsing and validation of the
//! visitor-count and restore-policy fields must never panic.

use libfuzzer_sys::fuzz_target;

use desktop::config::Config;
use desktop::counter::format_count;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = toml::from_str::<Config>(text) else {
        return;
    };
    if config.validate().is_ok() {
        assert_eq!(format_count(&config.default_visitor_count).chars().count(), 6);
    }
});
