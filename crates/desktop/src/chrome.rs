//! Page chrome builders: menu bar, header, desktop icons, social links
//!
//! Each builder takes an already-resolved config document and writes into a
//! container found by class. A missing container is logged and the builder
//! does nothing; a malformed entry is logged and skipped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tree::{NodeId, Tree};

// ========== Menu bar ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppleMenu {
    pub icon: String,
    #[serde(default)]
    pub aria_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub label: String,
    #[serde(default = "default_menu_role")]
    pub role: String,
}

fn default_menu_role() -> String {
    "menuitem".to_string()
}

/// `menubar.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuBarConfig {
    pub apple_menu: AppleMenu,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
}

/// Rebuild `.global-menu-bar` from config
pub fn build_menu_bar(tree: &mut Tree, config: &MenuBarConfig) -> Option<NodeId> {
    let Some(menu_bar) = tree.find_by_class(tree.root(), "global-menu-bar") else {
        tracing::error!("no menu bar found, skipping menu generation");
        return None;
    };
    tree.clear_children(menu_bar);

    let apple = tree.append_new(menu_bar, "span", &["apple-menu"]);
    tree.set_attr(apple, "aria-label", config.apple_menu.aria_label.as_str());
    tree.set_text(apple, config.apple_menu.icon.as_str());

    let divider = tree.append_new(menu_bar, "div", &["menu-divider"]);
    tree.set_attr(divider, "aria-hidden", "true");

    for item in &config.menu_items {
        let node = tree.append_new(menu_bar, "span", &["menu-item"]);
        tree.set_attr(node, "role", item.role.as_str());
        tree.set_text(node, item.label.as_str());
    }

    tracing::debug!(items = config.menu_items.len(), "menu bar built");
    Some(menu_bar)
}

// ========== Header ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headshot {
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// `header.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderConfig {
    pub window_title: String,
    #[serde(default)]
    pub last_update: String,
    pub headshot: Option<Headshot>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

/// Fill the hero window from config; absent elements are left alone
pub fn apply_header(tree: &mut Tree, config: &HeaderConfig) {
    let root = tree.root();

    if let Some(title) = tree.find_by_class(root, "window-title") {
        tree.set_text(title, config.window_title.as_str());
    }

    let date = tree
        .find_by_class(root, "date")
        .and_then(|d| tree.find_by_class(d, "typewriter"));
    if let Some(date) = date {
        tree.set_text(date, config.last_update.as_str());
    }

    if let (Some(img), Some(headshot)) = (tree.find_by_class(root, "headshot"), &config.headshot) {
        tree.set_attr(img, "src", headshot.src.as_str());
        tree.set_attr(img, "alt", headshot.alt.as_str());
        if let Some(width) = headshot.width {
            tree.set_attr(img, "width", width.to_string());
        }
        if let Some(height) = headshot.height {
            tree.set_attr(img, "height", height.to_string());
        }
    }

    if let Some(hero) = tree.find_by_id("hero-title") {
        tree.set_text(hero, config.title.as_str());
    }

    if let Some(subtitle) = tree.find_by_class(root, "subtitle") {
        tree.set_text(subtitle, config.subtitle.as_str());
    }
}

// ========== Desktop icons ==========

/// One entry of `desktop.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopIcon {
    pub icon: Option<String>,
    pub label: Option<String>,
    pub url: Option<String>,
    pub aria_label: Option<String>,
}

/// `desktop.json`: icons keyed by identifier, in file order
pub type DesktopConfig = IndexMap<String, DesktopIcon>;

/// Rebuild `.desktop-icons`. Returns the number of icons created.
pub fn build_desktop_icons(tree: &mut Tree, config: &DesktopConfig) -> usize {
    let Some(container) = tree.find_by_class(tree.root(), "desktop-icons") else {
        tracing::error!("no desktop-icons container found, skipping desktop icons");
        return 0;
    };
    tree.clear_children(container);

    let mut created = 0;
    for (key, entry) in config {
        let (Some(icon), Some(label), Some(url)) = (&entry.icon, &entry.label, &entry.url) else {
            tracing::warn!(key, "skipping desktop icon: missing required properties");
            continue;
        };

        let class = format!("desktop-{key}");
        let link = tree.append_new(container, "a", &["desktop-icon", &class]);
        tree.set_attr(link, "href", url.as_str());
        tree.set_attr(
            link,
            "aria-label",
            entry.aria_label.as_deref().unwrap_or(label.as_str()),
        );
        if let Some(target) = url.strip_prefix('#') {
            tree.set_attr(link, "data-scroll-target", target);
        }

        let image = tree.append_new(link, "div", &["icon-image"]);
        tree.set_attr(image, "aria-hidden", "true");
        tree.set_inner_html(image, icon.as_str());
        let text = tree.append_new(link, "div", &["icon-label"]);
        tree.set_text(text, label.as_str());

        created += 1;
    }

    tracing::debug!(created, "desktop icons built");
    created
}

/// Mobile menu toggle: flips `.desktop-icons.active` and mirrors it in the
/// toggle's `aria-expanded`. Returns the new expanded state.
pub fn toggle_mobile_menu(tree: &mut Tree) -> Option<bool> {
    let root = tree.root();
    let icons = tree.find_by_class(root, "desktop-icons")?;
    let toggle = tree.find_by_class(root, "menu-toggle")?;
    let expanded = tree.toggle_class(icons, "active");
    tree.set_attr(toggle, "aria-expanded", expanded.to_string());
    Some(expanded)
}

// ========== Social links ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialKind {
    Link,
    Dialog,
}

/// One entry of `socials.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    #[serde(rename = "type")]
    pub kind: Option<SocialKind>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default)]
    pub dialog_content: Option<String>,
}

/// `socials.json`: links keyed by identifier, in file order
pub type SocialsConfig = IndexMap<String, SocialLink>;

/// Rebuild `.social-grid[role=list]`. Returns the keys of the socials that
/// were created, in order.
pub fn build_social_links(tree: &mut Tree, config: &SocialsConfig) -> Vec<String> {
    let grid = tree
        .find_all_by_class(tree.root(), "social-grid")
        .into_iter()
        .find(|&g| tree.attr(g, "role") == Some("list"));
    let Some(grid) = grid else {
        tracing::error!("no social-grid found on this page, skipping socials");
        return Vec::new();
    };
    tree.clear_children(grid);

    let mut created = Vec::new();
    for (key, social) in config {
        let (Some(kind), Some(icon), Some(label)) = (social.kind, &social.icon, &social.label) else {
            tracing::warn!(key, "skipping social: missing required properties");
            continue;
        };
        if kind == SocialKind::Link && social.url.is_none() {
            tracing::warn!(key, "skipping social: missing URL for link type");
            continue;
        }

        let class = format!("social-{key}");
        let tag = match kind {
            SocialKind::Link => "a",
            SocialKind::Dialog => "button",
        };
        let element = tree.append_new(grid, tag, &["social-link", &class]);
        tree.set_attr(element, "role", "listitem");
        tree.set_attr(element, "aria-label", label.as_str());
        match kind {
            SocialKind::Link => {
                tree.set_attr(element, "aria-haspopup", "false");
                if let Some(url) = &social.url {
                    tree.set_attr(element, "href", url.as_str());
                }
                tree.set_attr(element, "target", "_blank");
                tree.set_attr(element, "rel", "noopener noreferrer");
            }
            SocialKind::Dialog => {
                tree.set_attr(element, "aria-haspopup", "dialog");
                tree.set_attr(element, "data-social", key.as_str());
            }
        }

        let icon_node = tree.append_new(element, "span", &["social-icon"]);
        tree.set_attr(icon_node, "aria-hidden", "true");
        tree.set_inner_html(icon_node, icon.as_str());
        let label_node = tree.append_new(element, "span", &["social-label"]);
        tree.set_text(label_node, label.as_str());

        created.push(key.clone());
    }

    tracing::debug!(created = created.len(), "social links built");
    created
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.append_new(root, "nav", &["global-menu-bar"]);
        let hero = tree.append_new(root, "div", &["mac-window"]);
        let bar = tree.append_new(hero, "div", &["window-title-bar"]);
        tree.append_new(bar, "div", &["window-title"]);
        let date = tree.append_new(hero, "p", &["date"]);
        tree.append_new(date, "span", &["typewriter"]);
        tree.append_new(hero, "img", &["headshot"]);
        let h1 = tree.append_new(hero, "h1", &[]);
        tree.set_attr(h1, "id", "hero-title");
        tree.append_new(hero, "p", &["subtitle"]);
        tree.append_new(root, "button", &["menu-toggle"]);
        tree.append_new(root, "nav", &["desktop-icons"]);
        let grid = tree.append_new(root, "div", &["social-grid"]);
        tree.set_attr(grid, "role", "list");
        tree
    }

    // ========== menu bar tests ==========

    #[test]
    fn menu_bar_structure() {
        let mut tree = page();
        let config: MenuBarConfig = serde_json::from_str(
            r#"{
                "apple_menu": {"icon": "", "aria_label": "Apple Menu"},
                "menu_items": [{"label": "File", "role": "menuitem"}, {"label": "Edit", "role": "menuitem"}]
            }"#,
        )
        .unwrap();

        let bar = build_menu_bar(&mut tree, &config).unwrap();
        let children = tree.children(bar).to_vec();
        assert_eq!(children.len(), 4);
        assert!(tree.has_class(children[0], "apple-menu"));
        assert_eq!(tree.attr(children[0], "aria-label"), Some("Apple Menu"));
        assert!(tree.has_class(children[1], "menu-divider"));
        assert_eq!(tree.text(children[2]), "File");
        assert_eq!(tree.attr(children[3], "role"), Some("menuitem"));
    }

    #[test]
    fn menu_bar_missing_container_is_skipped() {
        let mut tree = Tree::new();
        let config = MenuBarConfig {
            apple_menu: AppleMenu {
                icon: "x".into(),
                aria_label: String::new(),
            },
            menu_items: vec![],
        };
        assert!(build_menu_bar(&mut tree, &config).is_none());
    }

    // ========== header tests ==========

    #[test]
    fn header_updates_present_elements() {
        let mut tree = page();
        let config: HeaderConfig = serde_json::from_str(
            r#"{
                "window_title": "about.txt",
                "last_update": "2024-01-01",
                "headshot": {"src": "/img/me.png", "alt": "Me", "width": 120, "height": 120},
                "title": "Hello",
                "subtitle": "Engineer"
            }"#,
        )
        .unwrap();
        apply_header(&mut tree, &config);

        let root = tree.root();
        let title = tree.find_by_class(root, "window-title").unwrap();
        assert_eq!(tree.text(title), "about.txt");
        let date = tree.find_by_class(root, "typewriter").unwrap();
        assert_eq!(tree.text(date), "2024-01-01");
        let img = tree.find_by_class(root, "headshot").unwrap();
        assert_eq!(tree.attr(img, "src"), Some("/img/me.png"));
        assert_eq!(tree.attr(img, "width"), Some("120"));
        assert_eq!(tree.text(tree.find_by_id("hero-title").unwrap()), "Hello");
        assert_eq!(tree.text(tree.find_by_class(root, "subtitle").unwrap()), "Engineer");
    }

    // ========== desktop icon tests ==========

    #[test]
    fn desktop_icons_skip_incomplete_entries() {
        let mut tree = page();
        let config: DesktopConfig = serde_json::from_str(
            r##"{
                "projects": {"icon": "📁", "label": "Projects", "url": "#projects"},
                "broken": {"icon": "x", "label": "No URL"},
                "blog": {"icon": "📝", "label": "Blog", "url": "/blog", "aria_label": "Read the blog"}
            }"##,
        )
        .unwrap();

        assert_eq!(build_desktop_icons(&mut tree, &config), 2);
        let container = tree.find_by_class(tree.root(), "desktop-icons").unwrap();
        let icons = tree.children(container).to_vec();
        assert!(tree.has_class(icons[0], "desktop-projects"));
        assert_eq!(tree.attr(icons[0], "data-scroll-target"), Some("projects"));
        assert_eq!(tree.attr(icons[0], "aria-label"), Some("Projects"));
        assert_eq!(tree.attr(icons[1], "aria-label"), Some("Read the blog"));
        assert_eq!(tree.attr(icons[1], "data-scroll-target"), None);
    }

    #[test]
    fn mobile_menu_toggle_flips_state() {
        let mut tree = page();
        assert_eq!(toggle_mobile_menu(&mut tree), Some(true));
        let toggle = tree.find_by_class(tree.root(), "menu-toggle").unwrap();
        assert_eq!(tree.attr(toggle, "aria-expanded"), Some("true"));
        assert_eq!(toggle_mobile_menu(&mut tree), Some(false));
        assert_eq!(tree.attr(toggle, "aria-expanded"), Some("false"));
    }

    // ========== social tests ==========

    #[test]
    fn socials_build_links_and_dialog_buttons() {
        let mut tree = page();
        let config: SocialsConfig = serde_json::from_str(
            r#"{
                "github": {"type": "link", "icon": "gh", "label": "GitHub", "url": "https://github.com/x"},
                "email": {"type": "dialog", "icon": "@", "label": "Email", "value": "aGk=", "encrypt": true, "dialogContent": "Write to:"},
                "nolink": {"type": "link", "icon": "?", "label": "Broken"},
                "noicon": {"type": "link", "label": "Broken", "url": "https://e.com"}
            }"#,
        )
        .unwrap();

        let created = build_social_links(&mut tree, &config);
        assert_eq!(created, vec!["github", "email"]);

        let root = tree.root();
        let github = tree.find_by_class(root, "social-github").unwrap();
        assert_eq!(tree.tag(github), "a");
        assert_eq!(tree.attr(github, "target"), Some("_blank"));
        let email = tree.find_by_class(root, "social-email").unwrap();
        assert_eq!(tree.tag(email), "button");
        assert_eq!(tree.attr(email, "aria-haspopup"), Some("dialog"));
        assert_eq!(tree.attr(email, "data-social"), Some("email"));
        assert_eq!(config["email"].dialog_content.as_deref(), Some("Write to:"));
    }

    #[test]
    fn socials_need_list_role() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.append_new(root, "div", &["social-grid"]);
        let config: SocialsConfig = IndexMap::new();
        assert!(build_social_links(&mut tree, &config).is_empty());
    }
}
