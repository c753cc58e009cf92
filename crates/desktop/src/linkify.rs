//! `Link:` auto-linking
//!
//! Content authors write links inline as
//!
//! ```text
//! Link: https://github.com Label: "View on GitHub"
//! Link: https://github.com
//! ```
//!
//! and they are turned into anchors opening in a new tab. Quotes and
//! backslashes inside a label are escaped as `\"` and `\\`.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::tree::{escape, Tree};

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"Link:\s*(https?://[^\s<]+)(?:\s+Label:\s*"((?:[^"\\]|\\"|\\\\)*)")?"#)
            .expect("link pattern is valid")
    })
}

fn unescape_label(label: &str) -> String {
    label.replace("\\\"", "\"").replace("\\\\", "\\")
}

fn anchor(url: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        escape(url),
        escape(text)
    )
}

/// Replace `Link:` markers in HTML or markdown source with anchors.
///
/// Surrounding text is left untouched so it can still carry markup.
pub fn linkify_text(text: &str) -> String {
    link_pattern()
        .replace_all(text, |caps: &Captures| {
            let url = &caps[1];
            let display = caps
                .get(2)
                .map(|label| unescape_label(label.as_str()))
                .unwrap_or_else(|| url.to_string());
            anchor(url, &display)
        })
        .into_owned()
}

/// Linkify a plain-text line, escaping everything that is not a link
pub fn linkify_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in link_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape(&text[last..whole.start()]));
        let url = &caps[1];
        let display = caps
            .get(2)
            .map(|label| unescape_label(label.as_str()))
            .unwrap_or_else(|| url.to_string());
        out.push_str(&anchor(url, &display));
        last = whole.end();
    }
    out.push_str(&escape(&text[last..]));
    out
}

/// Whether a string carries a `Link:` marker worth rewriting
pub fn has_link_marker(text: &str) -> bool {
    link_pattern().is_match(text)
}

/// Classes whose content is scanned for `Link:` markers
const LINKIFY_CLASSES: &[&str] = &["markdown-block", "code-block", "auto-linkify"];

/// Site-wide auto-linking pass.
///
/// Rewrites `Link:` markers inside markdown blocks, code blocks and
/// `.auto-linkify` lists, then makes every external anchor without a
/// target open in a new tab. Returns the number of elements rewritten.
pub fn auto_linkify(tree: &mut Tree) -> usize {
    let root = tree.root();
    let mut rewritten = 0;

    for class in LINKIFY_CLASSES {
        for scope in tree.find_all_by_class(root, class) {
            let mut targets = vec![scope];
            targets.extend(tree.descendants(scope));
            for node in targets {
                if !tree.is_alive(node) {
                    continue;
                }
                if let Some(html) = tree.inner_html(node) {
                    if has_link_marker(html) {
                        let updated = linkify_text(html);
                        tree.set_inner_html(node, updated);
                        rewritten += 1;
                    }
                } else if tree.children(node).is_empty() {
                    let text = tree.text(node);
                    if has_link_marker(&text) {
                        tree.set_inner_html(node, linkify_plain(&text));
                        rewritten += 1;
                    }
                }
            }
        }
    }

    for link in tree.find_all_by_tag(root, "a") {
        let external = tree.attr(link, "href").is_some_and(|h| h.starts_with("http"));
        if external && tree.attr(link, "target").is_none() {
            tree.set_attr(link, "target", "_blank");
            tree.set_attr(link, "rel", "noopener noreferrer");
        }
    }

    rewritten
}
