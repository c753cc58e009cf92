//! Project windows
//!
//! `projects.json` lists the projects shown in the dynamic project grid.
//! Each becomes a window with a min/max control, a quick-link control, an
//! optional GitHub link, a spec list and Preview/Link actions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::linkify::linkify_plain;
use crate::tree::{NodeId, Tree};
use crate::window::{self, WindowState, MINIMIZED_CLASS, WINDOW_CLASS, WINDOW_ID_ATTR};

/// Target of project buttons without an explicit URL
pub const UNDER_CONSTRUCTION: &str = "/projects/under-construction";

/// Preview shown for projects without a preview page
pub const PREVIEW_FALLBACK: &str = "/desktop/infra/under-construction";

/// Default single-path location of the projects document
pub const DEFAULT_PROJECTS_PATH: &str = "./config/projects.json";

/// Class of the grid project windows are rendered into
pub const PROJECT_GRID_CLASS: &str = "project-grid";

/// Marker class for grids populated from config
pub const DYNAMIC_GRID_CLASS: &str = "dynamic-projects";

const PROJECT_WINDOW_CLASS: &str = "project-window";
const LOADING_CLASS: &str = "loading";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectButtons {
    pub github: Option<String>,
    pub github_text: Option<String>,
    pub link: Option<String>,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub buttons: ProjectButtons,
    #[serde(default)]
    pub default_minimized: bool,
}

fn default_title() -> String {
    "Untitled Project".to_string()
}

impl Project {
    /// Target of the Link action and the quick-link control
    pub fn link_url(&self) -> &str {
        self.buttons.link.as_deref().unwrap_or(UNDER_CONSTRUCTION)
    }

    pub fn github_label(&self) -> &str {
        self.buttons.github_text.as_deref().unwrap_or("Github")
    }
}

/// `projects.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectsConfig {
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl ProjectsConfig {
    pub fn find(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}

/// Build a detached project window.
///
/// Default-minimized projects start with the `minimized` class and the
/// maximize affordance; they are handed to a dock later by the page's
/// deferred pass.
pub fn create_project_window(tree: &mut Tree, project: &Project) -> NodeId {
    let node = tree.create_with_classes("div", &[WINDOW_CLASS, PROJECT_WINDOW_CLASS, LOADING_CLASS]);
    if project.default_minimized {
        tree.add_class(node, MINIMIZED_CLASS);
    }
    tree.set_attr(node, "data-project", project.id.as_str());
    tree.set_attr(node, WINDOW_ID_ATTR, project.id.as_str());

    let state = if project.default_minimized {
        WindowState::Minimized
    } else {
        WindowState::Expanded
    };

    let bar = window::title_bar(tree, node, &project.title);
    window::control_button(tree, bar.controls, state.button_class(), state.button_label());
    let quick = window::control_button(tree, bar.controls, "quick-link-button", "Quick link to project");
    tree.set_attr(quick, "data-link", project.link_url());

    if let Some(github) = &project.buttons.github {
        let link = tree.append_new(bar.bar, "a", &["project-link-button"]);
        tree.set_attr(link, "href", github.as_str());
        tree.set_text(link, project.github_label());
    }

    let content = tree.append_new(node, "div", &["content"]);
    let subtitle = tree.append_new(content, "h3", &[]);
    tree.set_text(subtitle, project.subtitle.as_str());
    let description = tree.append_new(content, "p", &[]);
    tree.set_text(description, project.description.as_str());

    let specs = tree.append_new(content, "ul", &["auto-linkify"]);
    for spec in &project.specs {
        let item = tree.append_new(specs, "li", &[]);
        tree.set_inner_html(item, linkify_plain(spec));
    }

    let actions = tree.append_new(content, "div", &["project-actions"]);
    let preview = tree.append_new(actions, "button", &["project-button", "preview"]);
    tree.set_attr(preview, "data-project", project.id.as_str());
    tree.set_text(preview, "Preview");
    let link = tree.append_new(actions, "a", &["project-button", "link"]);
    tree.set_attr(link, "href", project.link_url());
    tree.set_text(link, "Link");

    node
}

/// Find the grid project windows go into
pub fn find_project_grid(tree: &Tree) -> Option<NodeId> {
    tree.find_by_classes(tree.root(), &[PROJECT_GRID_CLASS, DYNAMIC_GRID_CLASS])
}

/// Replace the grid's children with one window per unique project id.
///
/// Returns the created windows in order.
pub fn render_projects(tree: &mut Tree, grid: NodeId, config: &ProjectsConfig) -> Vec<NodeId> {
    tree.clear_children(grid);

    let mut seen = HashSet::new();
    let mut windows = Vec::with_capacity(config.projects.len());
    for project in &config.projects {
        if !seen.insert(project.id.as_str()) {
            tracing::warn!(id = %project.id, "duplicate project id found");
            continue;
        }
        let node = create_project_window(tree, project);
        tree.append_child(grid, node);
        windows.push(node);
    }

    tracing::info!(count = windows.len(), "projects rendered");
    windows
}

/// Replace the grid's children with the load-failure message
pub fn render_projects_error(tree: &mut Tree, grid: NodeId) {
    tree.clear_children(grid);
    let message = tree.append_new(grid, "div", &["error-message"]);
    let heading = tree.append_new(message, "h3", &[]);
    tree.set_text(heading, "Error Loading Projects");
    let hint = tree.append_new(message, "p", &[]);
    tree.set_text(hint, "Please try refreshing the page.");
}

/// Finish the entrance transition of a project window
pub fn finish_loading(tree: &mut Tree, window: NodeId) {
    tree.remove_class(window, LOADING_CLASS);
}

/// Preview URL of a project, falling back to the under-construction page
pub fn preview_url(config: Option<&ProjectsConfig>, id: &str) -> String {
    match config.and_then(|c| c.find(id)).and_then(|p| p.buttons.preview.as_deref()) {
        Some(url) => {
            tracing::debug!(id, url, "using preview URL from project data");
            url.to_string()
        }
        None => {
            tracing::debug!(id, "no preview URL found, using fallback");
            PREVIEW_FALLBACK.to_string()
        }
    }
}
