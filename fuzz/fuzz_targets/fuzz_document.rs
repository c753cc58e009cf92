#![no_main]
//! Fuzz target for document rendering
//!
//! Parses random JSON as a document config, renders it into a container
//! and runs the auto-linkify pass over the result.

use libfuzzer_sys::fuzz_target;

use desktop::document::{render_document, DocumentConfig};
use desktop::linkify::auto_linkify;
use desktop::tree::Tree;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<DocumentConfig>(data) else {
        return;
    };

    let mut tree = Tree::new();
    let root = tree.root();
    let container = tree.append_new(root, "section", &[]);
    tree.set_attr(container, "id", "doc");

    if render_document(&mut tree, "doc", &doc).is_some() {
        auto_linkify(&mut tree);
        let _ = tree.to_html(root);
    }
});
