//! Window chrome and the minimize toggle
//!
//! Every panel on the page (project windows, document windows, docks,
//! dialogs) shares the same title bar structure:
//!
//! ```text
//! div.window-title-bar
//!   div.window-controls   (buttons)
//!   div.window-title      (text)
//! ```
//!
//! The toggle here is the only caller of the dock allocator: it flips a
//! window between expanded and minimized and hands it to (or takes it back
//! from) a dock.

use std::fmt;

use crate::dock::DockAllocator;
use crate::tree::{NodeId, Tree};

/// Class marking a window element
pub const WINDOW_CLASS: &str = "mac-window";

/// Class present on minimized windows
pub const MINIMIZED_CLASS: &str = "minimized";

/// Attribute carrying a window's stable identifier
pub const WINDOW_ID_ATTR: &str = "data-window-id";

/// Stable window identifier (project or document id)
///
/// Position records are keyed by this rather than by node identity, so a
/// window rebuilt from the same record keeps its slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Read the stable identifier of a window element
pub fn window_id(tree: &Tree, window: NodeId) -> Option<WindowId> {
    tree.attr(window, WINDOW_ID_ATTR).map(WindowId::new)
}

/// Two-state machine per window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    #[default]
    Expanded,
    Minimized,
}

impl WindowState {
    /// Current state of a window element
    pub fn of(tree: &Tree, window: NodeId) -> Self {
        if tree.has_class(window, MINIMIZED_CLASS) {
            Self::Minimized
        } else {
            Self::Expanded
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Expanded => Self::Minimized,
            Self::Minimized => Self::Expanded,
        }
    }

    /// Control button class shown in this state
    pub fn button_class(self) -> &'static str {
        match self {
            Self::Expanded => "minimize-button",
            Self::Minimized => "maximize-button",
        }
    }

    /// Accessible label of the control button in this state
    pub fn button_label(self) -> &'static str {
        match self {
            Self::Expanded => "Minimize window",
            Self::Minimized => "Maximize window",
        }
    }
}

/// Handles into a freshly built title bar
#[derive(Debug, Clone, Copy)]
pub struct TitleBar {
    pub bar: NodeId,
    pub controls: NodeId,
    pub title: NodeId,
}

/// Append a title bar with an empty controls area to `parent`
pub fn title_bar(tree: &mut Tree, parent: NodeId, title: &str) -> TitleBar {
    let bar = tree.append_new(parent, "div", &["window-title-bar"]);
    let controls = tree.append_new(bar, "div", &["window-controls"]);
    let title_node = tree.append_new(bar, "div", &["window-title"]);
    tree.set_text(title_node, title);
    TitleBar {
        bar,
        controls,
        title: title_node,
    }
}

/// Append a `button.window-button` to a controls area
pub fn control_button(tree: &mut Tree, controls: NodeId, class: &str, label: &str) -> NodeId {
    let button = tree.append_new(controls, "button", &["window-button", class]);
    tree.set_attr(button, "aria-label", label);
    button
}

/// The minimize/maximize control: first button of the window's controls
pub fn min_max_button(tree: &Tree, window: NodeId) -> Option<NodeId> {
    let controls = tree.find_by_class(window, "window-controls")?;
    tree.children(controls).first().copied()
}

/// Set the control button's affordance for a state
pub fn set_button_state(tree: &mut Tree, button: NodeId, state: WindowState) {
    tree.remove_class(button, state.toggled().button_class());
    tree.add_class(button, state.button_class());
    tree.set_attr(button, "aria-label", state.button_label());
}

/// Flip a window between expanded and minimized.
///
/// Minimizing hands the window to the dock allocator; maximizing takes it
/// back into the grid. Returns the new state.
pub fn toggle_minimize(tree: &mut Tree, docks: &mut DockAllocator, window: NodeId) -> WindowState {
    let next = WindowState::of(tree, window).toggled();
    match next {
        WindowState::Minimized => tree.add_class(window, MINIMIZED_CLASS),
        WindowState::Expanded => tree.remove_class(window, MINIMIZED_CLASS),
    }
    if let Some(button) = min_max_button(tree, window) {
        set_button_state(tree, button, next);
    }

    tracing::debug!(window = ?window_id(tree, window), ?next, "toggled window");

    match next {
        WindowState::Minimized => docks.add_minimized_window(tree, window),
        WindowState::Expanded => docks.remove_minimized_window(tree, window),
    }
    next
}

/// Restore every minimized window held by a dock, in display order.
///
/// Goes through [`toggle_minimize`] so each window gets the same
/// treatment as a user click. Returns the number of windows restored.
pub fn restore_all_in_dock(tree: &mut Tree, docks: &mut DockAllocator, dock: NodeId) -> usize {
    let minimized: Vec<NodeId> = docks
        .dock_members(tree, dock)
        .into_iter()
        .filter(|&w| WindowState::of(tree, w) == WindowState::Minimized)
        .collect();

    if minimized.is_empty() {
        tracing::info!("no minimized windows found in dock");
        return 0;
    }

    tracing::info!(count = minimized.len(), "maximizing all windows in dock");
    for &window in &minimized {
        toggle_minimize(tree, docks, window);
    }
    minimized.len()
}
