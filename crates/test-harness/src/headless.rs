//! Headless project grid for testing dock behavior

use desktop::dock::{DockAllocator, RestorePolicy};
use desktop::project::{self, Project, ProjectButtons, PROJECT_GRID_CLASS};
use desktop::tree::{NodeId, Tree};
use desktop::window::{self, WindowId, WindowState};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error("no window labelled {0}")]
    UnknownWindow(String),

    #[error("no dock at index {0}")]
    UnknownDock(usize),
}

/// Snapshot of grid state for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    /// Grid children in order: window labels, docks as `DockN[A,B]`
    pub labels: Vec<String>,

    /// Title of each dock, in order
    pub dock_titles: Vec<String>,

    /// Number of windows held by each dock
    pub dock_sizes: Vec<usize>,

    /// Whether every dock follows every non-dock window
    pub docks_trail: bool,
}

/// A project grid holding labelled windows
pub struct TestDesktop {
    tree: Tree,
    grid: NodeId,
    docks: DockAllocator,
    windows: Vec<(String, NodeId)>,
}

impl Default for TestDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDesktop {
    pub fn new() -> Self {
        Self::with_policy(RestorePolicy::default())
    }

    pub fn with_policy(policy: RestorePolicy) -> Self {
        let mut tree = Tree::new();
        let root = tree.root();
        let grid = tree.append_new(root, "div", &[PROJECT_GRID_CLASS, project::DYNAMIC_GRID_CLASS]);
        Self {
            tree,
            grid,
            docks: DockAllocator::with_policy(grid, policy),
            windows: Vec::new(),
        }
    }

    /// Desktop with one expanded window per label, in order
    pub fn with_windows(labels: &[&str]) -> Self {
        let mut desktop = Self::new();
        for label in labels {
            desktop.add_window(label);
        }
        desktop
    }

    /// Append a project window labelled `label` to the grid
    pub fn add_window(&mut self, label: &str) -> NodeId {
        let project = Project {
            id: label.to_string(),
            title: label.to_string(),
            subtitle: String::new(),
            description: String::new(),
            specs: Vec::new(),
            buttons: ProjectButtons::default(),
            default_minimized: false,
        };
        let node = project::create_project_window(&mut self.tree, &project);
        // New windows go before any docks
        let first_dock = self.docks.docks().first().map(|d| d.node);
        self.tree.insert_before(self.grid, node, first_dock);
        project::finish_loading(&mut self.tree, node);
        self.windows.push((label.to_string(), node));
        node
    }

    pub fn window(&self, label: &str) -> Result<NodeId, TestError> {
        self.windows
            .iter()
            .find(|(l, _)| l == label)
            .map(|&(_, node)| node)
            .ok_or_else(|| TestError::UnknownWindow(label.to_string()))
    }

    pub fn state(&self, label: &str) -> Result<WindowState, TestError> {
        Ok(WindowState::of(&self.tree, self.window(label)?))
    }

    /// Flip a window, as a click on its min/max control would
    pub fn toggle(&mut self, label: &str) -> Result<WindowState, TestError> {
        let node = self.window(label)?;
        Ok(window::toggle_minimize(&mut self.tree, &mut self.docks, node))
    }

    /// Minimize a window; no-op when already minimized
    pub fn minimize(&mut self, label: &str) -> Result<(), TestError> {
        if self.state(label)? == WindowState::Expanded {
            self.toggle(label)?;
        }
        Ok(())
    }

    /// Restore a window; no-op when already expanded
    pub fn restore(&mut self, label: &str) -> Result<(), TestError> {
        if self.state(label)? == WindowState::Minimized {
            self.toggle(label)?;
        }
        Ok(())
    }

    /// "Maximize all" on the dock at `index`
    pub fn maximize_all(&mut self, index: usize) -> Result<usize, TestError> {
        let dock = self
            .docks
            .docks()
            .get(index)
            .map(|d| d.node)
            .ok_or(TestError::UnknownDock(index))?;
        Ok(window::restore_all_in_dock(&mut self.tree, &mut self.docks, dock))
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn docks(&self) -> &DockAllocator {
        &self.docks
    }

    pub fn grid(&self) -> NodeId {
        self.grid
    }

    pub fn labels(&self) -> Vec<String> {
        self.windows.iter().map(|(l, _)| l.clone()).collect()
    }

    fn label_of(&self, node: NodeId) -> String {
        window::window_id(&self.tree, node)
            .map(|WindowId(id)| id)
            .unwrap_or_else(|| "?".to_string())
    }

    /// Grid children in order, e.g. `["C", "Dock1[A,B]"]`
    pub fn grid_labels(&self) -> Vec<String> {
        let mut dock_number = 0;
        self.tree
            .children(self.grid)
            .iter()
            .map(|&child| {
                if self.docks.is_dock(child) {
                    dock_number += 1;
                    let members: Vec<String> = self
                        .docks
                        .dock_members(&self.tree, child)
                        .into_iter()
                        .map(|w| self.label_of(w))
                        .collect();
                    format!("Dock{}[{}]", dock_number, members.join(","))
                } else {
                    self.label_of(child)
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let children = self.tree.children(self.grid);
        let first_dock = children.iter().position(|&c| self.docks.is_dock(c));
        let docks_trail = match first_dock {
            Some(first) => children[first..].iter().all(|&c| self.docks.is_dock(c)),
            None => true,
        };

        GridSnapshot {
            labels: self.grid_labels(),
            dock_titles: self
                .docks
                .docks()
                .iter()
                .map(|d| self.tree.text(d.title))
                .collect(),
            dock_sizes: self
                .docks
                .docks()
                .iter()
                .map(|d| self.tree.children(d.content).len())
                .collect(),
            docks_trail,
        }
    }
}
