//! Test harness for retrodesk
//!
//! Provides infrastructure for testing the page model without a browser.
//!
//! # Modules
//!
//! - `headless`: Project grid with a dock allocator, addressed by window label
//! - `assertions`: Common test assertions
//! - `fixtures`: Sample site configs, in memory or on disk

pub mod assertions;
pub mod fixtures;
pub mod headless;

pub use headless::{GridSnapshot, TestDesktop};
