//! Mac-style dialog boxes
//!
//! Modal dialogs share a single `#overlay` element; the overlay exists only
//! while at least one modal dialog is open, and the body carries the
//! `dialog-open` class for the same span. Commentary dialogs are modeless:
//! at most one is shown, it has no overlay, and a click outside closes it.
//!
//! ```text
//! div.mac-dialog.active
//!   div.window-title-bar
//!     div.window-controls > button.window-button.close-button
//!     div.window-title
//!   div.content
//! ```

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::{Captures, Regex};

use crate::render::markdown_to_html;
use crate::tree::{escape, NodeId, Tree};
use crate::window;

/// Title of a dialog created without one
pub const DEFAULT_TITLE: &str = "Error";

/// Body of a dialog created without content
pub const DEFAULT_MESSAGE: &str = "Oops! Something went wrong.";

const OVERLAY_ID: &str = "overlay";
const DIALOG_CLASS: &str = "mac-dialog";
const COMMENTARY_CLASS: &str = "commentary-dialog";
const BODY_OPEN_CLASS: &str = "dialog-open";

/// Handle to an open modal dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId(pub u32);

/// What a dialog shows
#[derive(Debug, Clone, PartialEq)]
pub enum DialogContent {
    /// Plain text, escaped on output
    Text(String),
    /// Trusted markup
    Html(String),
    /// Optional intro paragraph followed by a `p.protected-content` value
    Protected { intro: Option<String>, value: String },
}

/// Follow-up the page must perform once a dialog closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Hide and clear the project preview overlay
    HidePreview,
}

#[derive(Debug, Clone)]
pub struct DialogOptions {
    pub title: String,
    pub content: DialogContent,
    /// Base64-decode `.protected-content` values before display
    pub is_encoded: bool,
    pub on_close: Option<CloseAction>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            content: DialogContent::Text(DEFAULT_MESSAGE.to_string()),
            is_encoded: false,
            on_close: None,
        }
    }
}

impl DialogOptions {
    pub fn new(title: impl Into<String>, content: DialogContent) -> Self {
        Self {
            title: title.into(),
            content,
            ..Self::default()
        }
    }

    pub fn encoded(mut self, is_encoded: bool) -> Self {
        self.is_encoded = is_encoded;
        self
    }

    pub fn on_close(mut self, action: CloseAction) -> Self {
        self.on_close = Some(action);
        self
    }
}

/// Decode a base64 value, returning the input unchanged when it is not
/// valid base64 or not UTF-8
pub fn decode_protected(value: &str) -> String {
    let trimmed = value.trim();
    match STANDARD.decode(trimmed) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "decoded value is not UTF-8");
                trimmed.to_string()
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "failed to decode base64");
            trimmed.to_string()
        }
    }
}

fn protected_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(<[a-zA-Z][^>]*class="[^"]*\bprotected-content\b[^"]*"[^>]*>)([^<]*)"#)
            .expect("protected-content pattern is valid")
    })
}

/// Decode every `.protected-content` element's text inside trusted markup
pub fn decode_protected_html(html: &str) -> String {
    protected_pattern()
        .replace_all(html, |caps: &Captures| {
            format!("{}{}", &caps[1], escape(&decode_protected(&caps[2])))
        })
        .into_owned()
}

#[derive(Debug, Clone, Copy)]
struct ActiveDialog {
    id: DialogId,
    node: NodeId,
    close_button: NodeId,
    on_close: Option<CloseAction>,
}

/// Owns the dialogs and the shared overlay of a page
#[derive(Debug, Default)]
pub struct DialogManager {
    active: Vec<ActiveDialog>,
    overlay: Option<NodeId>,
    commentary: Option<NodeId>,
    next_id: u32,
}

impl DialogManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and show a modal dialog
    pub fn create_dialog(&mut self, tree: &mut Tree, options: DialogOptions) -> DialogId {
        let body = tree.root();
        let node = tree.create_with_classes("div", &[DIALOG_CLASS]);
        tree.set_attr(node, "role", "dialog");
        tree.set_attr(node, "aria-modal", "true");

        let bar = window::title_bar(tree, node, &options.title);
        let close_button = window::control_button(tree, bar.controls, "close-button", "Close dialog");
        let content = tree.append_new(node, "div", &["content"]);

        match options.content {
            DialogContent::Text(text) => tree.set_text(content, text),
            DialogContent::Html(html) => {
                let html = if options.is_encoded {
                    decode_protected_html(&html)
                } else {
                    html
                };
                tree.set_inner_html(content, html);
            }
            DialogContent::Protected { intro, value } => {
                if let Some(intro) = intro {
                    let p = tree.append_new(content, "p", &[]);
                    tree.set_text(p, intro);
                }
                let p = tree.append_new(content, "p", &["protected-content"]);
                let value = if options.is_encoded {
                    decode_protected(&value)
                } else {
                    value
                };
                tree.set_text(p, value);
            }
        }

        if self.overlay.is_none() {
            let overlay = tree.create_element("div");
            tree.set_attr(overlay, "id", OVERLAY_ID);
            tree.append_child(body, overlay);
            self.overlay = Some(overlay);
        }

        tree.append_child(body, node);
        tree.add_class(body, BODY_OPEN_CLASS);
        tree.add_class(node, "active");

        let id = DialogId(self.next_id);
        self.next_id += 1;
        self.active.push(ActiveDialog {
            id,
            node,
            close_button,
            on_close: options.on_close,
        });

        tracing::debug!(dialog = id.0, title = %options.title, "dialog opened");
        id
    }

    /// Default error dialog
    pub fn show_error(&mut self, tree: &mut Tree) -> DialogId {
        self.create_dialog(tree, DialogOptions::default())
    }

    /// Close one dialog. Returns its close action, if any.
    pub fn close_dialog(&mut self, tree: &mut Tree, id: DialogId) -> Option<CloseAction> {
        let Some(index) = self.active.iter().position(|d| d.id == id) else {
            tracing::debug!(dialog = id.0, "dialog already closed");
            return None;
        };
        let dialog = self.active.remove(index);
        tree.remove(dialog.node);

        if self.active.is_empty() {
            if let Some(overlay) = self.overlay.take() {
                tree.remove(overlay);
            }
            let body = tree.root();
            tree.remove_class(body, BODY_OPEN_CLASS);
        }

        tracing::debug!(dialog = id.0, "dialog closed");
        dialog.on_close
    }

    /// Close every modal dialog (Escape, overlay click)
    pub fn close_all(&mut self, tree: &mut Tree) -> Vec<CloseAction> {
        let ids: Vec<DialogId> = self.active.iter().map(|d| d.id).collect();
        ids.into_iter()
            .filter_map(|id| self.close_dialog(tree, id))
            .collect()
    }

    pub fn is_open(&self, id: DialogId) -> bool {
        self.active.iter().any(|d| d.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Open dialogs, oldest first
    pub fn active(&self) -> Vec<DialogId> {
        self.active.iter().map(|d| d.id).collect()
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    pub fn dialog_node(&self, id: DialogId) -> Option<NodeId> {
        self.active.iter().find(|d| d.id == id).map(|d| d.node)
    }

    /// Dialog whose close button is `node`
    pub fn close_button_owner(&self, node: NodeId) -> Option<DialogId> {
        self.active.iter().find(|d| d.close_button == node).map(|d| d.id)
    }

    // ========== commentary ==========

    /// Show a commentary dialog, replacing any existing one
    pub fn open_commentary(&mut self, tree: &mut Tree, markdown: &str) -> NodeId {
        self.close_commentary(tree);

        let node = tree.create_with_classes("div", &[DIALOG_CLASS, COMMENTARY_CLASS]);
        let bar = window::title_bar(tree, node, "Commentary");
        window::control_button(tree, bar.controls, "close-button", "Close dialog");
        let content = tree.append_new(node, "div", &["content"]);
        tree.set_inner_html(content, markdown_to_html(markdown));

        let body = tree.root();
        tree.append_child(body, node);
        tree.add_class(node, "active");
        self.commentary = Some(node);
        node
    }

    /// Close the commentary dialog. Returns whether one was open.
    pub fn close_commentary(&mut self, tree: &mut Tree) -> bool {
        match self.commentary.take() {
            Some(node) => {
                tree.remove(node);
                true
            }
            None => false,
        }
    }

    pub fn commentary(&self) -> Option<NodeId> {
        self.commentary
    }

    /// A click landed on `target`; close the commentary dialog unless the
    /// click was inside it or on `trigger`
    pub fn outside_click(&mut self, tree: &mut Tree, target: NodeId, trigger: Option<NodeId>) -> bool {
        let Some(dialog) = self.commentary else {
            return false;
        };
        let inside = tree.contains(dialog, target)
            || trigger.is_some_and(|t| tree.contains(t, target));
        if inside {
            return false;
        }
        self.close_commentary(tree)
    }
}
