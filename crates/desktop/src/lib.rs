//! Retro desktop page library
//!
//! An element tree modelling a single retro-desktop page, the builders that
//! fill it from JSON config documents, and the window/dock/dialog state
//! machines driven by [`page::PageController`].

pub mod chrome;
pub mod config;
pub mod counter;
pub mod dialog;
pub mod dock;
pub mod document;
pub mod fetch;
pub mod linkify;
pub mod page;
pub mod preview;
pub mod project;
pub mod render;
pub mod tree;
pub mod window;
