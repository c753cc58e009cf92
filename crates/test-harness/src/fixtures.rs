//! Test fixtures for common site setups

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use desktop::config::Config;
use desktop::fetch::{ConfigFetcher, FsSource, MemorySource};
use desktop::page::PageController;
use tempfile::TempDir;

use crate::headless::TestDesktop;

pub const HEADER_JSON: &str = r#"{
    "window_title": "Welcome",
    "last_update": "Last updated: 2024-06-01",
    "headshot": {"src": "/img/me.png", "alt": "Me", "width": 96, "height": 96},
    "title": "Jane Doe",
    "subtitle": "Systems engineer"
}"#;

pub const MENUBAR_JSON: &str = r#"{
    "apple_menu": {"icon": "", "aria_label": "Apple menu"},
    "menu_items": [{"label": "File"}, {"label": "Edit"}, {"label": "View", "role": "menu"}]
}"#;

pub const DESKTOP_JSON: &str = r##"{
    "projects": {"icon": "<svg></svg>", "label": "Projects", "url": "#projects"},
    "resume": {"icon": "<svg></svg>", "label": "Resume", "url": "/resume.pdf", "aria_label": "Open resume"},
    "broken": {"label": "No icon"}
}"##;

pub const SOCIALS_JSON: &str = r#"{
    "github": {"type": "link", "icon": "gh", "label": "GitHub", "url": "https://github.com/jane"},
    "email": {"type": "dialog", "icon": "@", "label": "Email", "value": "amFuZUBleGFtcGxlLmNvbQ==",
              "encrypt": true, "dialogContent": "Reach me at:"},
    "nourl": {"type": "link", "icon": "x", "label": "Broken"}
}"#;

/// Six projects: the second and fifth start minimized, `os` has a preview
pub const PROJECTS_JSON: &str = r#"{
    "projects": [
        {"id": "os", "title": "Tiny OS", "subtitle": "Kernel", "description": "Boots on x86.",
         "specs": ["Rust", "Link: https://github.com/jane/os Label: \"Source\""],
         "buttons": {"github": "https://github.com/jane/os", "link": "/projects/os", "preview": "/projects/os/"}},
        {"id": "db", "title": "Tiny DB", "defaultMinimized": true},
        {"id": "web", "title": "Web"},
        {"id": "chat", "title": "Chat"},
        {"id": "game", "title": "Game", "defaultMinimized": true},
        {"id": "cli", "title": "CLI"}
    ]
}"#;

pub const RESUME_JSON: &str = r##"{
    "title": "Resume",
    "commentary": "Updated *monthly*.",
    "content": [
        {"type": "markdown", "content": "# Jane\nLine one\nLine two"},
        {"type": "code", "content": "fn main() {}", "language": "rust", "style": {"theme": "dark"}},
        {"type": "table", "headers": ["Year", "Role"], "rows": [["2024", "Engineer"]]},
        {"type": "flex-container", "style": {"gap": 2}, "content": [{"type": "markdown", "content": "left", "style": {"flex": 1}}]},
        {"type": "hologram"}
    ]
}"##;

pub const PREVIEW_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="style.css">
  <script src="app.js"></script>
</head>
<body>
  <main class="mac-window os-preview">
    <img src="screens/boot.png" alt="boot">
    <a href="#specs">Specs</a>
  </main>
</body>
</html>"##;

/// Path and contents of every document in the sample site
pub const SITE_FILES: &[(&str, &str)] = &[
    ("config/header.json", HEADER_JSON),
    ("config/menubar.json", MENUBAR_JSON),
    ("config/desktop.json", DESKTOP_JSON),
    ("config/socials.json", SOCIALS_JSON),
    ("config/projects.json", PROJECTS_JSON),
    ("config/resume.json", RESUME_JSON),
    ("projects/os/index.html", PREVIEW_HTML),
];

/// The sample site as an in-memory source
pub fn memory_site() -> MemorySource {
    SITE_FILES.iter().fold(MemorySource::new(), |source, (path, text)| {
        source.with(format!("./{path}"), *text).with(format!("/{path}"), *text)
    })
}

/// Write the sample site into `root`
pub fn write_site(root: &Path) -> Result<()> {
    for (rel, text) in SITE_FILES {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// The sample site in a temporary directory
pub fn temp_site() -> Result<TempDir> {
    let dir = tempfile::tempdir().context("failed to create temp dir")?;
    write_site(dir.path())?;
    Ok(dir)
}

/// Config with the `resume` document container
pub fn site_config() -> Config {
    let mut config = Config::default();
    config
        .documents
        .insert("resume".to_string(), "./config/resume.json".to_string());
    config
}

/// Bootstrapped page over the in-memory sample site
pub fn bootstrapped_page() -> PageController {
    let mut page = PageController::new(ConfigFetcher::new(memory_site()), site_config());
    page.bootstrap();
    page.run_deferred();
    page
}

/// Bootstrapped page over a site directory
pub fn page_from_dir(root: &Path) -> PageController {
    let mut page = PageController::new(ConfigFetcher::new(FsSource::new(root)), site_config());
    page.bootstrap();
    page.run_deferred();
    page
}

/// Grid with windows `A`..`E`
pub fn five_windows() -> TestDesktop {
    TestDesktop::with_windows(&["A", "B", "C", "D", "E"])
}
