//! Test assertions for grid and page state

use desktop::dock::{dock_title, WINDOWS_PER_DOCK};
use desktop::page::PageController;
use desktop::window::WindowState;

use crate::headless::{GridSnapshot, TestDesktop};

/// Assert that no dock holds more than the per-dock limit
pub fn assert_dock_capacity(snapshot: &GridSnapshot) {
    for (i, size) in snapshot.dock_sizes.iter().enumerate() {
        assert!(
            *size <= WINDOWS_PER_DOCK,
            "dock {} holds {} windows (limit {})",
            i + 1,
            size,
            WINDOWS_PER_DOCK
        );
    }
}

/// Assert that every dock follows every regular window
pub fn assert_docks_trail(snapshot: &GridSnapshot) {
    assert!(
        snapshot.docks_trail,
        "docks must follow all windows, grid is {:?}",
        snapshot.labels
    );
}

/// Assert that dock titles are numbered 1..n in order
pub fn assert_dock_titles_sequential(snapshot: &GridSnapshot) {
    let total = snapshot.dock_titles.len();
    for (i, title) in snapshot.dock_titles.iter().enumerate() {
        assert_eq!(*title, dock_title(i, total), "dock {} has wrong title", i + 1);
    }
}

/// Assert that no dock is empty
pub fn assert_no_empty_docks(snapshot: &GridSnapshot) {
    assert!(
        snapshot.dock_sizes.iter().all(|&s| s > 0),
        "empty dock left in grid: {:?}",
        snapshot.labels
    );
}

/// All structural dock invariants at once
pub fn assert_dock_invariants(desktop: &TestDesktop) {
    let snapshot = desktop.snapshot();
    assert_dock_capacity(&snapshot);
    assert_docks_trail(&snapshot);
    assert_dock_titles_sequential(&snapshot);
    assert_no_empty_docks(&snapshot);

    // Docked windows are exactly the minimized ones
    for label in desktop.labels() {
        let node = desktop.window(&label).unwrap_or_else(|e| panic!("{e}"));
        let docked = desktop.docks().dock_index_of(desktop.tree(), node).is_some();
        let minimized = desktop.state(&label).ok() == Some(WindowState::Minimized);
        assert_eq!(docked, minimized, "window {label}: docked={docked} minimized={minimized}");
    }
}

/// Assert the grid reads exactly `expected`
pub fn assert_grid(desktop: &TestDesktop, expected: &[&str]) {
    let actual = desktop.grid_labels();
    assert_eq!(actual, expected, "unexpected grid layout");
}

/// Assert the page HTML contains `needle`
pub fn assert_page_contains(page: &PageController, needle: &str) {
    let html = page.to_html();
    assert!(html.contains(needle), "page HTML should contain {needle:?}");
}
