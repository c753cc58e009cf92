//! Document windows
//!
//! A document is a JSON config holding a title, optional commentary and a
//! list of content blocks. It is rendered as a window that replaces the
//! children of a container element.
//!
//! # Invariants
//!
//! - The minimize toggle is locked for [`TRANSITION_DURATION`] after each
//!   flip; toggles inside that window are ignored
//! - Two title-bar clicks less than [`DOUBLE_CLICK_THRESHOLD`] apart
//!   toggle once; the click history is then reset so a third click starts
//!   a new pair

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::fetch::ConfigFetcher;
use crate::render::{render_blocks, Block};
use crate::tree::{NodeId, Tree};
use crate::window::{self, WindowState, MINIMIZED_CLASS, WINDOW_CLASS, WINDOW_ID_ATTR};

/// Lock after a toggle, matching the CSS transition
pub const TRANSITION_DURATION: Duration = Duration::from_millis(300);

/// Maximum gap between the two clicks of a title-bar double-click
pub const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(300);

/// Message shown when a document cannot be loaded
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load document. Please try refreshing the page.";

const DOCUMENT_WINDOW_CLASS: &str = "document-window";

/// Document config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub title: String,
    #[serde(default)]
    pub commentary: Option<String>,
    #[serde(default)]
    pub content: Vec<Block>,
}

/// A rendered document window and its interaction state
#[derive(Debug, Clone)]
pub struct DocumentWindow {
    pub container_id: String,
    pub node: NodeId,
    pub title_bar: NodeId,
    pub minimize_button: NodeId,
    pub commentary_button: Option<NodeId>,
    pub commentary: Option<String>,
    locked_until: Option<Instant>,
    last_click: Option<Instant>,
}

impl DocumentWindow {
    pub fn state(&self, tree: &Tree) -> WindowState {
        WindowState::of(tree, self.node)
    }

    /// Flip minimized/expanded unless a transition is still running.
    ///
    /// Returns the new state, or `None` when the toggle was ignored.
    pub fn toggle(&mut self, tree: &mut Tree, now: Instant) -> Option<WindowState> {
        if self.locked_until.is_some_and(|until| now < until) {
            tracing::debug!(container = %self.container_id, "toggle ignored during transition");
            return None;
        }
        self.locked_until = Some(now + TRANSITION_DURATION);

        let minimized = tree.toggle_class(self.node, MINIMIZED_CLASS);
        let state = if minimized {
            WindowState::Minimized
        } else {
            WindowState::Expanded
        };
        window::set_button_state(tree, self.minimize_button, state);
        Some(state)
    }

    /// Register a title-bar click; the second of two quick clicks toggles
    pub fn title_click(&mut self, tree: &mut Tree, now: Instant) -> Option<WindowState> {
        match self.last_click {
            Some(previous) if now.saturating_duration_since(previous) < DOUBLE_CLICK_THRESHOLD => {
                self.last_click = None;
                self.toggle(tree, now)
            }
            _ => {
                self.last_click = Some(now);
                None
            }
        }
    }
}

fn build_window(tree: &mut Tree, container_id: &str, doc: &DocumentConfig) -> DocumentWindow {
    let node = tree.create_with_classes("div", &[WINDOW_CLASS, DOCUMENT_WINDOW_CLASS]);
    tree.set_attr(node, WINDOW_ID_ATTR, container_id);

    let bar = window::title_bar(tree, node, &doc.title);
    let state = WindowState::Expanded;
    let minimize_button = window::control_button(tree, bar.controls, state.button_class(), state.button_label());
    let commentary_button = doc.commentary.as_ref().map(|_| {
        let button = window::control_button(tree, bar.controls, "commentary-button", "View commentary");
        tree.set_text(button, "?");
        button
    });

    let content = tree.append_new(node, "div", &["content", "document-content"]);
    render_blocks(tree, content, &doc.content);

    DocumentWindow {
        container_id: container_id.to_string(),
        node,
        title_bar: bar.bar,
        minimize_button,
        commentary_button,
        commentary: doc.commentary.clone(),
        locked_until: None,
        last_click: None,
    }
}

/// Render a document into the element with id `container_id`
pub fn render_document(tree: &mut Tree, container_id: &str, doc: &DocumentConfig) -> Option<DocumentWindow> {
    let Some(container) = tree.find_by_id(container_id) else {
        tracing::error!(container = container_id, "container not found");
        return None;
    };
    let window = build_window(tree, container_id, doc);
    tree.clear_children(container);
    tree.append_child(container, window.node);
    Some(window)
}

/// Replace the container's children with the load-failure window
pub fn render_document_error(tree: &mut Tree, container_id: &str) {
    let Some(container) = tree.find_by_id(container_id) else {
        return;
    };
    tree.clear_children(container);

    let node = tree.append_new(container, "div", &[WINDOW_CLASS, DOCUMENT_WINDOW_CLASS]);
    let bar = window::title_bar(tree, node, "Error");
    window::control_button(tree, bar.controls, "close-button", "Close window");
    let content = tree.append_new(node, "div", &["content", "document-content"]);
    let message = tree.append_new(content, "div", &["error-message"]);
    tree.set_text(message, LOAD_ERROR_MESSAGE);
}

/// Fetch a document config and render it into `container_id`.
///
/// Any failure (fetch, parse, missing container) leaves an error window in
/// the container when it exists.
pub fn load_document(
    tree: &mut Tree,
    fetcher: &ConfigFetcher,
    config_path: &str,
    container_id: &str,
) -> Option<DocumentWindow> {
    tracing::info!(path = config_path, container = container_id, "loading document");

    let doc = match fetcher.fetch::<DocumentConfig>(config_path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(path = config_path, error = %e, "error loading document");
            render_document_error(tree, container_id);
            return None;
        }
    };

    let window = render_document(tree, container_id, &doc)?;
    tracing::info!(container = container_id, blocks = doc.content.len(), "document loaded");
    Some(window)
}
