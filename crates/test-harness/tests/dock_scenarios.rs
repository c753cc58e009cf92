//! Scenario tests for dock placement and restore order

use desktop::dock::RestorePolicy;
use desktop::window::WindowState;
use test_harness::assertions::{assert_dock_invariants, assert_grid};
use test_harness::fixtures::five_windows;
use test_harness::TestDesktop;

#[test]
fn minimize_and_restore_three_windows() {
    let mut desktop = TestDesktop::with_windows(&["A", "B", "C"]);

    desktop.minimize("A").unwrap();
    assert_grid(&desktop, &["B", "C", "Dock1[A]"]);
    assert_eq!(desktop.snapshot().dock_titles, vec!["Minimized Windows (1/1)"]);

    desktop.minimize("B").unwrap();
    assert_grid(&desktop, &["C", "Dock1[A,B]"]);

    desktop.restore("A").unwrap();
    assert_grid(&desktop, &["A", "C", "Dock1[B]"]);
    assert_dock_invariants(&desktop);
}

#[test]
fn five_minimized_windows_need_two_docks() {
    let mut desktop = five_windows();
    for label in ["A", "B", "C", "D", "E"] {
        desktop.minimize(label).unwrap();
    }

    assert_grid(&desktop, &["Dock1[A,B,C,D]", "Dock2[E]"]);
    let snapshot = desktop.snapshot();
    assert_eq!(snapshot.dock_sizes, vec![4, 1]);
    assert_eq!(
        snapshot.dock_titles,
        vec!["Minimized Windows (1/2)", "Minimized Windows (2/2)"]
    );
}

#[test]
fn fifth_minimize_creates_exactly_one_dock() {
    let mut desktop = five_windows();
    for label in ["A", "B", "C", "D"] {
        desktop.minimize(label).unwrap();
    }
    assert_eq!(desktop.docks().docks().len(), 1);

    desktop.minimize("E").unwrap();
    assert_eq!(desktop.docks().docks().len(), 2);
    assert_eq!(desktop.snapshot().dock_sizes[0], 4);
}

#[test]
fn emptied_dock_is_deleted_and_titles_renumber() {
    let mut desktop = five_windows();
    for label in ["A", "B", "C", "D", "E"] {
        desktop.minimize(label).unwrap();
    }

    for label in ["A", "B", "C", "D"] {
        desktop.restore(label).unwrap();
    }
    let snapshot = desktop.snapshot();
    assert_eq!(snapshot.dock_sizes, vec![1]);
    assert_eq!(snapshot.dock_titles, vec!["Minimized Windows (1/1)"]);
    assert_dock_invariants(&desktop);
}

#[test]
fn freed_slot_is_reused_first_fit() {
    let mut desktop = five_windows();
    for label in ["A", "B", "C", "D", "E"] {
        desktop.minimize(label).unwrap();
    }

    desktop.restore("B").unwrap();
    desktop.add_window("F");
    desktop.minimize("F").unwrap();
    assert_grid(&desktop, &["B", "Dock1[A,C,D,F]", "Dock2[E]"]);
}

#[test]
fn add_then_remove_restores_exact_order() {
    for label in ["A", "C", "E"] {
        let mut desktop = five_windows();
        let before = desktop.grid_labels();
        desktop.minimize(label).unwrap();
        desktop.restore(label).unwrap();
        assert_eq!(desktop.grid_labels(), before, "after toggling {label}");
    }
}

#[test]
fn before_docks_policy_appends_restored_windows() {
    let mut desktop = TestDesktop::with_policy(RestorePolicy::BeforeDocks);
    for label in ["A", "B", "C"] {
        desktop.add_window(label);
    }

    desktop.minimize("A").unwrap();
    desktop.minimize("B").unwrap();
    desktop.restore("A").unwrap();
    assert_grid(&desktop, &["C", "A", "Dock1[B]"]);
}

#[test]
fn maximize_all_empties_dock() {
    let mut desktop = five_windows();
    for label in ["B", "D"] {
        desktop.minimize(label).unwrap();
    }

    assert_eq!(desktop.maximize_all(0).unwrap(), 2);
    assert!(desktop.docks().docks().is_empty());
    assert_eq!(desktop.state("B").unwrap(), WindowState::Expanded);
    assert_eq!(desktop.state("D").unwrap(), WindowState::Expanded);
    assert!(desktop.maximize_all(0).is_err());
}

#[test]
fn new_windows_are_added_before_docks() {
    let mut desktop = TestDesktop::with_windows(&["A", "B"]);
    desktop.minimize("A").unwrap();
    desktop.add_window("C");
    assert_grid(&desktop, &["B", "C", "Dock1[A]"]);
}
