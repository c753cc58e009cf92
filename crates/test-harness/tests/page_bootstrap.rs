//! Page bootstrap and interaction tests against the sample site

use std::time::Instant;

use desktop::config::Config;
use desktop::fetch::{ConfigFetcher, MemorySource};
use desktop::page::{Event, Navigation, PageController};
use desktop::window::{WindowId, WindowState};
use test_harness::assertions::assert_page_contains;
use test_harness::fixtures::{self, bootstrapped_page};

fn labels(page: &PageController) -> Vec<String> {
    let tree = page.tree();
    let docks = page.docks().unwrap();
    tree.children(docks.grid())
        .iter()
        .map(|&child| {
            if docks.is_dock(child) {
                "dock".to_string()
            } else {
                tree.attr(child, "data-window-id").unwrap_or("?").to_string()
            }
        })
        .collect()
}

#[test]
fn sample_site_bootstraps_every_region() {
    let page = bootstrapped_page();
    let tree = page.tree();
    let root = tree.root();

    assert_eq!(tree.find_all_by_class(root, "menu-item").len(), 3);
    assert_eq!(tree.find_all_by_class(root, "desktop-icon").len(), 2);
    assert_eq!(tree.find_all_by_class(root, "social-link").len(), 2);
    assert_eq!(page.project_windows().len(), 6);
    assert_eq!(page.documents().len(), 1);

    assert_page_contains(&page, "Jane Doe");
    assert_page_contains(&page, r#"src="/img/me.png""#);
    assert_page_contains(&page, "Last updated: 2024-06-01");
}

#[test]
fn default_minimized_projects_share_one_dock() {
    let page = bootstrapped_page();
    assert_eq!(labels(&page), vec!["os", "web", "chat", "cli", "dock"]);

    let docks = page.docks().unwrap();
    assert_eq!(docks.docks().len(), 1);
    let members = docks.dock_members(page.tree(), docks.docks()[0].node);
    assert_eq!(members.len(), 2);
    assert_page_contains(&page, "Minimized Windows (1/1)");
}

#[test]
fn no_window_is_left_loading() {
    let page = bootstrapped_page();
    for &window in page.project_windows() {
        assert!(!page.tree().has_class(window, "loading"));
    }
}

#[test]
fn restoring_default_minimized_window_puts_it_back_in_place() {
    let mut page = bootstrapped_page();
    page.handle(Event::ToggleMinimize(WindowId::from("db")));

    // db was at index 1 among the grid windows when it was docked
    assert_eq!(labels(&page), vec!["os", "db", "web", "chat", "cli", "dock"]);
    let db = page.project_window(&WindowId::from("db")).unwrap();
    assert_eq!(WindowState::of(page.tree(), db), WindowState::Expanded);
}

#[test]
fn github_spec_link_is_external() {
    let page = bootstrapped_page();
    let os = page.project_window(&WindowId::from("os")).unwrap();
    let html = page.tree().to_html(os);
    assert!(html.contains(r#"href="https://github.com/jane/os""#));
    assert!(html.contains(">Source</a>"));
}

#[test]
fn protected_email_is_decoded_in_dialog() {
    let mut page = bootstrapped_page();
    page.handle(Event::OpenSocialDialog("email".to_string()));

    let id = page.dialogs().active()[0];
    let node = page.dialogs().dialog_node(id).unwrap();
    let text = page.tree().text(node);
    assert!(text.contains("Reach me at:"));
    assert!(text.contains("jane@example.com"));
    assert!(page.tree().has_class(page.tree().root(), "dialog-open"));

    page.handle(Event::Escape);
    assert_eq!(page.dialogs().active_count(), 0);
    assert!(!page.tree().has_class(page.tree().root(), "dialog-open"));
}

#[test]
fn desktop_icons_navigate() {
    let mut page = bootstrapped_page();
    assert_eq!(
        page.handle(Event::OpenIcon("#projects".to_string())),
        Some(Navigation::ScrollTo("projects".to_string()))
    );

    let root = page.tree().root();
    let resume = page.tree().find_by_class(root, "desktop-resume").unwrap();
    assert_eq!(page.tree().attr(resume, "aria-label"), Some("Open resume"));
    assert_eq!(
        page.click(resume, Instant::now()),
        Some(Navigation::Url("/resume.pdf".to_string()))
    );
}

#[test]
fn empty_site_degrades_without_panicking() {
    let mut page = PageController::new(ConfigFetcher::new(MemorySource::new()), Config::default());
    page.bootstrap();
    page.run_deferred();

    let tree = page.tree();
    let root = tree.root();
    assert!(tree.find_all_by_class(root, "menu-item").is_empty());
    assert!(tree.find_all_by_class(root, "social-link").is_empty());
    assert_page_contains(&page, "Error Loading Projects");
    // Counter still shows the default count
    assert_page_contains(&page, r#"<span class="counter-digit">1</span>"#);
}

#[test]
fn sample_site_from_disk_matches_memory() {
    let dir = fixtures::temp_site().unwrap();
    let from_disk = fixtures::page_from_dir(dir.path());
    let in_memory = bootstrapped_page();
    assert_eq!(from_disk.to_html(), in_memory.to_html());
}
