//! Minimized-window dock allocator
//!
//! Minimized windows are collected into "docks": fixed-capacity windows
//! that always trail the regular windows of the project grid.
//!
//! # Responsibilities
//!
//! - First-fit placement of minimized windows into docks of
//!   [`WINDOWS_PER_DOCK`] slots, creating docks on demand
//! - Recording each window's original grid slot and restoring it there
//! - Deleting docks that become empty and renumbering the rest
//! - Keeping every dock after every non-dock window in the grid
//!
//! # NOT Responsible For
//!
//! - Window state classes and button affordances (see `window.rs`)
//! - Building project windows (see `project.rs`)
//!
//! # Invariants
//!
//! - A dock never holds more than [`WINDOWS_PER_DOCK`] windows
//! - Every minimized window is a child of exactly one dock's content area
//! - After every mutation, docks are the last children of the grid, in
//!   creation order

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, Tree};
use crate::window::{self, WindowId};

/// Slots per dock
pub const WINDOWS_PER_DOCK: usize = 4;

/// Class of a dock element
pub const DOCK_CLASS: &str = "dock-window";

/// Class of a dock's content area
pub const DOCK_CONTENT_CLASS: &str = "dock-content";

/// Where a restored window goes back into the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Back to the index recorded at minimize time, among the current
    /// non-dock windows (clamped to the end of the regular windows)
    #[default]
    OriginalIndex,
    /// Directly before the first dock, after every regular window
    BeforeDocks,
}

/// A live dock and the elements the allocator touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dock {
    /// The dock window itself (child of the grid)
    pub node: NodeId,
    /// Container holding the docked windows
    pub content: NodeId,
    /// Title element ("Minimized Windows (i/n)")
    pub title: NodeId,
    /// "Maximize all" control
    pub maximize_button: NodeId,
}

/// Title shown on the dock at `index` (0-based) out of `total`
pub fn dock_title(index: usize, total: usize) -> String {
    format!("Minimized Windows ({}/{})", index + 1, total)
}

/// Groups minimized windows into docks and restores them on demand
#[derive(Debug)]
pub struct DockAllocator {
    /// The project grid that holds regular windows and docks
    grid: NodeId,

    /// Live docks in creation order (the Dock Set)
    docks: Vec<Dock>,

    /// Index among the grid's non-dock children at first minimize
    original_positions: HashMap<WindowId, usize>,

    policy: RestorePolicy,
}

impl DockAllocator {
    pub fn new(grid: NodeId) -> Self {
        Self::with_policy(grid, RestorePolicy::default())
    }

    pub fn with_policy(grid: NodeId, policy: RestorePolicy) -> Self {
        Self {
            grid,
            docks: Vec::new(),
            original_positions: HashMap::new(),
            policy,
        }
    }

    pub fn grid(&self) -> NodeId {
        self.grid
    }

    pub fn policy(&self) -> RestorePolicy {
        self.policy
    }

    /// Live docks in display order
    pub fn docks(&self) -> &[Dock] {
        &self.docks
    }

    /// Whether a grid child is a dock
    pub fn is_dock(&self, node: NodeId) -> bool {
        self.docks.iter().any(|d| d.node == node)
    }

    /// The grid's children that are not docks, in order
    pub fn grid_windows(&self, tree: &Tree) -> Vec<NodeId> {
        tree.children(self.grid)
            .iter()
            .copied()
            .filter(|&c| !self.is_dock(c))
            .collect()
    }

    /// Index of the dock holding `window`
    pub fn dock_index_of(&self, tree: &Tree, window: NodeId) -> Option<usize> {
        let parent = tree.parent(window)?;
        self.docks.iter().position(|d| d.content == parent)
    }

    /// Dock holding `window`
    pub fn dock_of(&self, tree: &Tree, window: NodeId) -> Option<Dock> {
        self.dock_index_of(tree, window).map(|i| self.docks[i])
    }

    /// Windows held by the dock whose element is `dock`
    pub fn dock_members(&self, tree: &Tree, dock: NodeId) -> Vec<NodeId> {
        self.docks
            .iter()
            .find(|d| d.node == dock)
            .map(|d| tree.children(d.content).to_vec())
            .unwrap_or_default()
    }

    /// Recorded original index of a window, if it is currently docked
    pub fn recorded_position(&self, id: &WindowId) -> Option<usize> {
        self.original_positions.get(id).copied()
    }

    /// Move a window from the grid into a dock.
    ///
    /// Records the window's index among the grid's non-dock children (once
    /// per minimize episode), places it in the first dock with a free slot
    /// (creating one when all are full), then refreshes titles and moves
    /// the docks back to the end of the grid.
    pub fn add_minimized_window(&mut self, tree: &mut Tree, window: NodeId) {
        if self.dock_index_of(tree, window).is_some() {
            tracing::debug!(?window, "window already docked, ignoring");
            return;
        }

        match window::window_id(tree, window) {
            Some(id) => {
                if !self.original_positions.contains_key(&id) {
                    let windows = self.grid_windows(tree);
                    let position = windows
                        .iter()
                        .position(|&w| w == window)
                        .unwrap_or(windows.len());
                    tracing::debug!(window = %id, position, "recorded original position");
                    self.original_positions.insert(id, position);
                }
            }
            None => tracing::debug!(?window, "window has no id, position not recorded"),
        }

        let dock = match self.find_available_dock(tree) {
            Some(dock) => dock,
            None => self.create_new_dock(tree),
        };
        tree.append_child(dock.content, window);

        self.update_dock_titles(tree);
        self.move_docks_to_end(tree);
    }

    /// Move a docked window back into the grid.
    ///
    /// No-op when the window is not inside a dock. Consumes the window's
    /// position record, deletes the owning dock if it is left empty, then
    /// refreshes titles and moves the remaining docks to the end.
    pub fn remove_minimized_window(&mut self, tree: &mut Tree, window: NodeId) {
        let Some(dock_index) = self.dock_index_of(tree, window) else {
            tracing::debug!(?window, "window is not in a dock, ignoring");
            return;
        };
        let dock = self.docks[dock_index];

        let recorded = window::window_id(tree, window)
            .and_then(|id| self.original_positions.remove(&id));

        let first_dock = self.docks.first().map(|d| d.node);
        let reference = match self.policy {
            RestorePolicy::OriginalIndex => {
                let windows = self.grid_windows(tree);
                recorded
                    .and_then(|index| windows.get(index).copied())
                    .or(first_dock)
            }
            RestorePolicy::BeforeDocks => first_dock,
        };
        tree.insert_before(self.grid, window, reference);

        if tree.children(dock.content).is_empty() {
            tracing::debug!(dock = dock_index, "removing empty dock");
            tree.remove(dock.node);
            self.docks.remove(dock_index);
        }

        self.update_dock_titles(tree);
        self.move_docks_to_end(tree);
    }

    /// Re-append every dock to the grid so docks trail regular windows
    pub fn move_docks_to_end(&self, tree: &mut Tree) {
        for dock in &self.docks {
            tree.append_child(self.grid, dock.node);
        }
    }

    /// Set every dock title to its ordinal among the live docks
    pub fn update_dock_titles(&self, tree: &mut Tree) {
        let total = self.docks.len();
        for (index, dock) in self.docks.iter().enumerate() {
            tree.set_text(dock.title, dock_title(index, total));
        }
    }

    fn find_available_dock(&self, tree: &Tree) -> Option<Dock> {
        self.docks
            .iter()
            .find(|d| tree.children(d.content).len() < WINDOWS_PER_DOCK)
            .copied()
    }

    fn create_new_dock(&mut self, tree: &mut Tree) -> Dock {
        let node = tree.create_with_classes("div", &[window::WINDOW_CLASS, DOCK_CLASS]);
        let bar = window::title_bar(tree, node, "Minimized Windows");
        let maximize_button =
            window::control_button(tree, bar.controls, "maximize-button", "Maximize all windows");
        let content = tree.append_new(node, "div", &[DOCK_CONTENT_CLASS]);

        let dock = Dock {
            node,
            content,
            title: bar.title,
            maximize_button,
        };
        self.docks.push(dock);
        tree.append_child(self.grid, node);
        self.update_dock_titles(tree);

        tracing::debug!(docks = self.docks.len(), "created dock");
        dock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WINDOW_ID_ATTR;

    fn grid_with(names: &[&str]) -> (Tree, NodeId, Vec<NodeId>) {
        let mut tree = Tree::new();
        let grid = tree.append_new(tree.root(), "div", &["project-grid"]);
        let windows = names
            .iter()
            .map(|name| {
                let w = tree.append_new(grid, "div", &[window::WINDOW_CLASS]);
                tree.set_attr(w, WINDOW_ID_ATTR, *name);
                w
            })
            .collect();
        (tree, grid, windows)
    }

    #[test]
    fn title_format() {
        assert_eq!(dock_title(0, 1), "Minimized Windows (1/1)");
        assert_eq!(dock_title(1, 2), "Minimized Windows (2/2)");
    }

    #[test]
    fn first_minimize_creates_dock_at_end() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c"]);
        let mut docks = DockAllocator::new(grid);

        docks.add_minimized_window(&mut tree, w[0]);

        assert_eq!(docks.docks().len(), 1);
        let dock = docks.docks()[0];
        assert_eq!(tree.children(grid), &[w[1], w[2], dock.node]);
        assert_eq!(tree.children(dock.content), &[w[0]]);
        assert_eq!(tree.text(dock.title), "Minimized Windows (1/1)");
    }

    #[test]
    fn records_index_among_non_dock_children() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c"]);
        let mut docks = DockAllocator::new(grid);

        docks.add_minimized_window(&mut tree, w[0]);
        docks.add_minimized_window(&mut tree, w[2]);

        assert_eq!(docks.recorded_position(&"a".into()), Some(0));
        // After a left, c sits at index 1 among [b, c]
        assert_eq!(docks.recorded_position(&"c".into()), Some(1));
    }

    #[test]
    fn fifth_window_opens_second_dock() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c", "d", "e"]);
        let mut docks = DockAllocator::new(grid);

        for &window in &w {
            docks.add_minimized_window(&mut tree, window);
        }

        assert_eq!(docks.docks().len(), 2);
        assert_eq!(tree.children(docks.docks()[0].content).len(), 4);
        assert_eq!(tree.children(docks.docks()[1].content), &[w[4]]);
        assert_eq!(tree.text(docks.docks()[0].title), "Minimized Windows (1/2)");
        assert_eq!(tree.text(docks.docks()[1].title), "Minimized Windows (2/2)");
    }

    #[test]
    fn first_fit_reuses_freed_slot() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c", "d", "e", "f"]);
        let mut docks = DockAllocator::new(grid);
        for &window in &w[..5] {
            docks.add_minimized_window(&mut tree, window);
        }

        docks.remove_minimized_window(&mut tree, w[1]);
        docks.add_minimized_window(&mut tree, w[5]);

        assert_eq!(tree.children(docks.docks()[0].content), &[w[0], w[2], w[3], w[5]]);
        assert_eq!(tree.children(docks.docks()[1].content), &[w[4]]);
    }

    #[test]
    fn restore_uses_recorded_index() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c"]);
        let mut docks = DockAllocator::new(grid);

        docks.add_minimized_window(&mut tree, w[1]);
        docks.remove_minimized_window(&mut tree, w[1]);

        assert_eq!(tree.children(grid), &[w[0], w[1], w[2]]);
        assert!(docks.docks().is_empty());
        assert_eq!(docks.recorded_position(&"b".into()), None);
    }

    #[test]
    fn restore_clamps_to_end_of_windows() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c"]);
        let mut docks = DockAllocator::new(grid);

        docks.add_minimized_window(&mut tree, w[2]); // recorded 2
        docks.add_minimized_window(&mut tree, w[0]); // recorded 0
        docks.remove_minimized_window(&mut tree, w[2]);

        // Only b is left in the grid; index 2 clamps to after b, before the dock
        let dock = docks.docks()[0].node;
        assert_eq!(tree.children(grid), &[w[1], w[2], dock]);
    }

    #[test]
    fn before_docks_policy_ignores_recorded_index() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c"]);
        let mut docks = DockAllocator::with_policy(grid, RestorePolicy::BeforeDocks);

        docks.add_minimized_window(&mut tree, w[0]);
        docks.add_minimized_window(&mut tree, w[1]);
        docks.remove_minimized_window(&mut tree, w[0]);

        let dock = docks.docks()[0].node;
        assert_eq!(tree.children(grid), &[w[2], w[0], dock]);
        assert_eq!(docks.recorded_position(&"a".into()), None);
    }

    #[test]
    fn removing_undocked_window_is_noop() {
        let (mut tree, grid, w) = grid_with(&["a", "b"]);
        let mut docks = DockAllocator::new(grid);

        docks.remove_minimized_window(&mut tree, w[0]);
        assert_eq!(tree.children(grid), &[w[0], w[1]]);
        assert!(docks.docks().is_empty());
    }

    #[test]
    fn adding_docked_window_twice_is_noop() {
        let (mut tree, grid, w) = grid_with(&["a", "b"]);
        let mut docks = DockAllocator::new(grid);

        docks.add_minimized_window(&mut tree, w[0]);
        docks.add_minimized_window(&mut tree, w[0]);

        assert_eq!(docks.docks().len(), 1);
        assert_eq!(tree.children(docks.docks()[0].content), &[w[0]]);
    }

    #[test]
    fn emptied_dock_is_removed_and_titles_renumber() {
        let (mut tree, grid, w) = grid_with(&["a", "b", "c", "d", "e"]);
        let mut docks = DockAllocator::new(grid);
        for &window in &w {
            docks.add_minimized_window(&mut tree, window);
        }
        let second = docks.docks()[1].node;

        docks.remove_minimized_window(&mut tree, w[4]);

        assert_eq!(docks.docks().len(), 1);
        assert!(!tree.is_alive(second));
        assert_eq!(tree.text(docks.docks()[0].title), "Minimized Windows (1/1)");
    }

    #[test]
    fn window_without_id_still_docks_and_restores() {
        let mut tree = Tree::new();
        let grid = tree.append_new(tree.root(), "div", &["project-grid"]);
        let a = tree.append_new(grid, "div", &[window::WINDOW_CLASS]);
        let b = tree.append_new(grid, "div", &[window::WINDOW_CLASS]);
        let mut docks = DockAllocator::new(grid);

        docks.add_minimized_window(&mut tree, a);
        docks.remove_minimized_window(&mut tree, a);

        assert_eq!(tree.children(grid), &[b, a]);
    }

    #[test]
    fn minimize_restore_cycles_do_not_grow_the_tree() {
        let (mut tree, grid, w) = grid_with(&["a"]);
        let mut docks = DockAllocator::new(grid);
        docks.add_minimized_window(&mut tree, w[0]);
        docks.remove_minimized_window(&mut tree, w[0]);
        let slots = tree.slot_count();
        let live = tree.live_count();

        for _ in 0..10_000 {
            docks.add_minimized_window(&mut tree, w[0]);
            docks.remove_minimized_window(&mut tree, w[0]);
        }

        assert_eq!(tree.slot_count(), slots);
        assert_eq!(tree.live_count(), live);
        assert_eq!(tree.children(grid), &[w[0]]);
    }

    #[test]
    fn restore_policy_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: RestorePolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"before_docks\"").unwrap();
        assert_eq!(parsed.policy, RestorePolicy::BeforeDocks);
    }
}
