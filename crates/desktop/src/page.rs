//! Page bootstrap and interaction
//!
//! # Responsibilities
//!
//! - Building the default page shell
//! - Running every content builder at startup, each isolated from the
//!   others' failures
//! - Owning the dock allocator, dialogs, preview overlay and loaded data
//! - Applying user interactions ([`Event`]) to the element tree
//!
//! # NOT Responsible For
//!
//! - Dock placement rules (see `dock.rs`)
//! - Markup of individual components (see the builder modules)
//!
//! # Design Contract
//!
//! Nothing propagates out of [`PageController::bootstrap`]: a failing step
//! logs and leaves its region empty or showing an error message. Deferred
//! work (clearing the `loading` class, docking default-minimized windows)
//! runs in [`PageController::run_deferred`], after the dock set exists.

use std::time::Instant;

use crate::chrome::{self, DesktopConfig, HeaderConfig, MenuBarConfig, SocialsConfig};
use crate::config::Config;
use crate::counter::{self, CounterStore, JsonFileStore, VisitorCounter, DIGIT_COUNT};
use crate::dialog::{CloseAction, DialogContent, DialogId, DialogManager, DialogOptions};
use crate::dock::DockAllocator;
use crate::document::{self, DocumentWindow};
use crate::fetch::ConfigFetcher;
use crate::linkify;
use crate::preview::{self, PreviewOverlay};
use crate::project::{self, ProjectsConfig, PROJECT_GRID_CLASS};
use crate::tree::{NodeId, Tree};
use crate::window::{self, WindowId, WindowState};

/// Default location of the socials document
pub const DEFAULT_SOCIALS_PATH: &str = "./config/socials.json";

/// Builds the default page structure every builder writes into
pub struct ShellLayout;

impl ShellLayout {
    /// Build the shell, with one container per configured document
    pub fn build(config: &Config) -> Tree {
        let mut tree = Tree::new();
        let body = tree.root();

        tree.append_new(body, "nav", &["global-menu-bar"]);
        let toggle = tree.append_new(body, "button", &["menu-toggle"]);
        tree.set_attr(toggle, "aria-expanded", "false");
        tree.set_attr(toggle, "aria-label", "Toggle menu");
        tree.append_new(body, "nav", &["desktop-icons"]);

        let main = tree.append_new(body, "main", &[]);

        let hero = tree.append_new(main, "div", &[window::WINDOW_CLASS, "hero-window"]);
        window::title_bar(&mut tree, hero, "");
        let content = tree.append_new(hero, "div", &["content"]);
        let date = tree.append_new(content, "p", &["date"]);
        tree.append_new(date, "span", &["typewriter"]);
        tree.append_new(content, "img", &["headshot"]);
        let title = tree.append_new(content, "h1", &[]);
        tree.set_attr(title, "id", "hero-title");
        tree.append_new(content, "p", &["subtitle"]);

        let projects = tree.append_new(main, "section", &[]);
        tree.set_attr(projects, "id", "projects");
        tree.append_new(projects, "div", &[PROJECT_GRID_CLASS, project::DYNAMIC_GRID_CLASS]);

        for container in config.documents.keys() {
            let section = tree.append_new(main, "section", &["document-container"]);
            tree.set_attr(section, "id", container.as_str());
        }

        let socials = tree.append_new(main, "div", &["social-grid"]);
        tree.set_attr(socials, "role", "list");

        let counter = tree.append_new(main, "div", &["visitor-counter"]);
        let badge = tree.append_new(counter, "img", &[]);
        tree.set_attr(badge, "id", "visitor-badge");
        tree.set_attr(badge, "alt", "Visitor count");
        for _ in 0..DIGIT_COUNT {
            tree.append_new(counter, "span", &["counter-digit"]);
        }

        let preview = tree.append_new(body, "div", &["project-preview"]);
        let exit = tree.append_new(preview, "button", &["exit-button"]);
        tree.set_attr(exit, "aria-label", "Exit preview");
        tree.append_new(preview, "div", &["preview-content"]);

        tree
    }
}

/// A user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Min/max control of a project window
    ToggleMinimize(WindowId),
    /// "Maximize all" control of the dock at this index
    MaximizeAllInDock(usize),
    /// Quick-link control of a project window
    QuickLink(WindowId),
    /// Preview button of a project
    OpenPreview(String),
    ExitPreview,
    /// Dialog-type social button
    OpenSocialDialog(String),
    CloseDialog(DialogId),
    OverlayClick,
    /// Click anywhere; closes the commentary dialog when outside it
    OutsideClick(NodeId),
    Escape,
    MenuToggle,
    /// Minimize control of the document in this container
    DocumentMinimize { container: String, at: Instant },
    DocumentTitleClick { container: String, at: Instant },
    ShowCommentary(String),
    CloseCommentary,
    /// Desktop icon with this `href`
    OpenIcon(String),
}

/// Where the browser should go after an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Url(String),
    /// Scroll the element with this id into view
    ScrollTo(String),
}

/// Owns the page tree and every piece of interactive state
pub struct PageController {
    tree: Tree,
    fetcher: ConfigFetcher,
    config: Config,
    docks: Option<DockAllocator>,
    dialogs: DialogManager,
    preview: Option<PreviewOverlay>,
    projects: Option<ProjectsConfig>,
    project_windows: Vec<NodeId>,
    documents: Vec<DocumentWindow>,
    commentary_trigger: Option<NodeId>,
    socials: SocialsConfig,
    counter: Option<VisitorCounter>,
    store: Option<Box<dyn CounterStore>>,
}

impl PageController {
    /// Controller over the default shell
    pub fn new(fetcher: ConfigFetcher, config: Config) -> Self {
        let tree = ShellLayout::build(&config);
        Self::with_tree(tree, fetcher, config)
    }

    /// Controller over an existing tree
    pub fn with_tree(tree: Tree, fetcher: ConfigFetcher, config: Config) -> Self {
        let store = config
            .counter_store
            .as_ref()
            .map(|path| Box::new(JsonFileStore::new(path)) as Box<dyn CounterStore>);
        Self {
            tree,
            fetcher,
            config,
            docks: None,
            dialogs: DialogManager::new(),
            preview: None,
            projects: None,
            project_windows: Vec::new(),
            documents: Vec::new(),
            commentary_trigger: None,
            socials: SocialsConfig::new(),
            counter: None,
            store,
        }
    }

    /// Replace the visit counter store
    pub fn set_counter_store(&mut self, store: Box<dyn CounterStore>) {
        self.store = Some(store);
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn docks(&self) -> Option<&DockAllocator> {
        self.docks.as_ref()
    }

    pub fn dialogs(&self) -> &DialogManager {
        &self.dialogs
    }

    pub fn preview(&self) -> Option<&PreviewOverlay> {
        self.preview.as_ref()
    }

    pub fn projects(&self) -> Option<&ProjectsConfig> {
        self.projects.as_ref()
    }

    pub fn project_windows(&self) -> &[NodeId] {
        &self.project_windows
    }

    pub fn documents(&self) -> &[DocumentWindow] {
        &self.documents
    }

    pub fn socials(&self) -> &SocialsConfig {
        &self.socials
    }

    /// Project window with the given id
    pub fn project_window(&self, id: &WindowId) -> Option<NodeId> {
        self.project_windows
            .iter()
            .copied()
            .find(|&w| self.tree.is_alive(w) && window::window_id(&self.tree, w).as_ref() == Some(id))
    }

    /// Serialize the whole page body
    pub fn to_html(&self) -> String {
        self.tree.to_html(self.tree.root())
    }

    // ========== bootstrap ==========

    /// Run every startup builder in order
    pub fn bootstrap(&mut self) {
        tracing::info!("initializing page");
        self.init_docks();
        self.load_header();
        self.load_menu_bar();
        self.load_desktop_icons();
        self.load_socials();
        self.load_projects();
        self.load_documents();
        self.init_counter();
        let rewritten = linkify::auto_linkify(&mut self.tree);
        tracing::debug!(rewritten, "auto-linkify complete");
    }

    fn init_docks(&mut self) {
        let grid = project::find_project_grid(&self.tree)
            .or_else(|| self.tree.find_by_class(self.tree.root(), PROJECT_GRID_CLASS));
        match grid {
            Some(grid) => {
                self.docks = Some(DockAllocator::with_policy(grid, self.config.restore_policy));
            }
            None => tracing::info!("no project grid, docking disabled"),
        }
    }

    fn load_header(&mut self) {
        let explicit = self.config.page_configs.header.clone();
        match self.fetcher.resolve::<HeaderConfig>(explicit.as_deref(), "header") {
            Some(header) => chrome::apply_header(&mut self.tree, &header),
            None => tracing::error!("no header config loaded"),
        }
    }

    fn load_menu_bar(&mut self) {
        let explicit = self.config.page_configs.menubar.clone();
        match self.fetcher.resolve::<MenuBarConfig>(explicit.as_deref(), "menubar") {
            Some(menu) => {
                chrome::build_menu_bar(&mut self.tree, &menu);
            }
            None => tracing::error!("no menu config loaded"),
        }
    }

    fn load_desktop_icons(&mut self) {
        let explicit = self.config.page_configs.desktop.clone();
        match self.fetcher.resolve::<DesktopConfig>(explicit.as_deref(), "desktop") {
            Some(icons) => {
                chrome::build_desktop_icons(&mut self.tree, &icons);
            }
            None => tracing::error!("no desktop config loaded"),
        }
    }

    fn load_socials(&mut self) {
        let path = self
            .config
            .page_configs
            .socials
            .clone()
            .unwrap_or_else(|| DEFAULT_SOCIALS_PATH.to_string());
        match self.fetcher.load::<SocialsConfig>(&path) {
            Some(socials) => {
                chrome::build_social_links(&mut self.tree, &socials);
                self.socials = socials;
            }
            None => tracing::error!("no social config loaded"),
        }
    }

    fn load_projects(&mut self) {
        let path = self
            .config
            .page_configs
            .projects
            .clone()
            .unwrap_or_else(|| project::DEFAULT_PROJECTS_PATH.to_string());
        tracing::info!(path = %path, "loading projects");

        let result = self.fetcher.fetch::<ProjectsConfig>(&path);
        let grid = project::find_project_grid(&self.tree);

        match result {
            Ok(projects) => {
                match grid {
                    Some(grid) => {
                        self.project_windows = project::render_projects(&mut self.tree, grid, &projects);
                        self.preview = PreviewOverlay::attach(&self.tree);
                    }
                    None => {
                        tracing::info!("no dynamic project grid found, skipping project rendering");
                    }
                }
                self.projects = Some(projects);
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "error loading projects");
                if let Some(grid) = grid {
                    project::render_projects_error(&mut self.tree, grid);
                }
            }
        }
    }

    fn load_documents(&mut self) {
        let documents: Vec<(String, String)> = self
            .config
            .documents
            .iter()
            .map(|(container, path)| (container.clone(), path.clone()))
            .collect();
        for (container, path) in documents {
            if let Some(doc) = document::load_document(&mut self.tree, &self.fetcher, &path, &container) {
                self.documents.push(doc);
            }
        }
    }

    fn init_counter(&mut self) {
        let counter = match VisitorCounter::attach(&mut self.tree) {
            Ok(counter) => counter,
            Err(e) => {
                tracing::error!(error = %e, "visitor counter error");
                return;
            }
        };

        let count = match &self.store {
            Some(store) => match counter::increment_visit(store.as_ref()) {
                Ok(count) => count.to_string(),
                Err(e) => {
                    tracing::warn!(error = %e, "counter store failed, using default count");
                    self.config.default_visitor_count.clone()
                }
            },
            None => self.config.default_visitor_count.clone(),
        };
        counter.display(&mut self.tree, &count);
        self.counter = Some(counter);
    }

    /// Show the counter again (the periodic refresh)
    pub fn refresh_counter(&mut self) {
        let Some(counter) = &self.counter else {
            return;
        };
        let count = self
            .store
            .as_ref()
            .and_then(|store| store.load().ok())
            .map(|count| count.to_string())
            .unwrap_or_else(|| self.config.default_visitor_count.clone());
        counter.display(&mut self.tree, &count);
    }

    /// Work that waits for the dock set: finish window entrance and dock
    /// the windows that start minimized
    pub fn run_deferred(&mut self) {
        for &node in &self.project_windows {
            if !self.tree.is_alive(node) {
                continue;
            }
            project::finish_loading(&mut self.tree, node);
            if WindowState::of(&self.tree, node) == WindowState::Minimized {
                match self.docks.as_mut() {
                    Some(docks) => docks.add_minimized_window(&mut self.tree, node),
                    None => tracing::warn!(?node, "minimized window but no dock set"),
                }
            }
        }
    }

    // ========== events ==========

    /// Apply one interaction
    pub fn handle(&mut self, event: Event) -> Option<Navigation> {
        tracing::trace!(?event, "handling event");
        match event {
            Event::ToggleMinimize(id) => {
                let window = self.project_window(&id)?;
                let docks = self.docks.as_mut()?;
                window::toggle_minimize(&mut self.tree, docks, window);
                None
            }
            Event::MaximizeAllInDock(index) => {
                let docks = self.docks.as_mut()?;
                let dock = docks.docks().get(index)?.node;
                window::restore_all_in_dock(&mut self.tree, docks, dock);
                None
            }
            Event::QuickLink(id) => {
                let window = self.project_window(&id)?;
                let button = self.tree.find_by_class(window, "quick-link-button")?;
                match self.tree.attr(button, "data-link") {
                    Some(link) if !link.is_empty() && link != "#" => Some(Navigation::Url(link.to_string())),
                    _ => None,
                }
            }
            Event::OpenPreview(id) => {
                self.open_preview(&id);
                None
            }
            Event::ExitPreview => {
                self.hide_preview();
                None
            }
            Event::OpenSocialDialog(key) => {
                self.open_social_dialog(&key);
                None
            }
            Event::CloseDialog(id) => {
                let action = self.dialogs.close_dialog(&mut self.tree, id);
                self.apply_close_actions(action);
                None
            }
            Event::OverlayClick => {
                let actions = self.dialogs.close_all(&mut self.tree);
                self.apply_close_actions(actions);
                None
            }
            Event::OutsideClick(target) => {
                if self.dialogs.outside_click(&mut self.tree, target, self.commentary_trigger) {
                    self.commentary_trigger = None;
                }
                None
            }
            Event::Escape => {
                let actions = self.dialogs.close_all(&mut self.tree);
                self.apply_close_actions(actions);
                if self.preview.is_some_and(|p| p.is_open(&self.tree)) {
                    self.hide_preview();
                }
                None
            }
            Event::MenuToggle => {
                chrome::toggle_mobile_menu(&mut self.tree);
                None
            }
            Event::DocumentMinimize { container, at } => {
                let doc = self.documents.iter_mut().find(|d| d.container_id == container)?;
                doc.toggle(&mut self.tree, at);
                None
            }
            Event::DocumentTitleClick { container, at } => {
                let doc = self.documents.iter_mut().find(|d| d.container_id == container)?;
                doc.title_click(&mut self.tree, at);
                None
            }
            Event::CloseCommentary => {
                self.dialogs.close_commentary(&mut self.tree);
                self.commentary_trigger = None;
                None
            }
            Event::OpenIcon(href) => match href.strip_prefix('#') {
                Some(id) => Some(Navigation::ScrollTo(id.to_string())),
                None => Some(Navigation::Url(href.clone())),
            },
            Event::ShowCommentary(container) => {
                let doc = self.documents.iter().find(|d| d.container_id == container)?;
                let commentary = doc.commentary.clone()?;
                self.commentary_trigger = doc.commentary_button;
                self.dialogs.open_commentary(&mut self.tree, &commentary);
                None
            }
        }
    }

    /// Map a click on `target` to the interaction it triggers and apply it
    pub fn click(&mut self, target: NodeId, now: Instant) -> Option<Navigation> {
        if !self.tree.is_alive(target) {
            return None;
        }

        // Commentary closes on any click outside it, before the click's
        // own effect
        self.handle(Event::OutsideClick(target));

        let event = self.event_for(target, now)?;
        self.handle(event)
    }

    /// The interaction a click on `target` triggers, if any
    pub fn event_for(&self, target: NodeId, now: Instant) -> Option<Event> {
        let tree = &self.tree;

        if let Some(id) = self.dialogs.close_button_owner(target) {
            return Some(Event::CloseDialog(id));
        }
        if self.dialogs.overlay() == Some(target) {
            return Some(Event::OverlayClick);
        }
        if let Some(commentary) = self.dialogs.commentary() {
            if tree.contains(commentary, target) {
                return tree
                    .closest_with_class(target, "close-button")
                    .map(|_| Event::CloseCommentary);
            }
        }
        if let Some(preview) = self.preview {
            if tree.contains(preview.exit_button, target) {
                return Some(Event::ExitPreview);
            }
        }
        if tree.closest_with_class(target, "menu-toggle").is_some() {
            return Some(Event::MenuToggle);
        }

        if let Some(docks) = &self.docks {
            if let Some(index) = docks.docks().iter().position(|d| d.maximize_button == target) {
                return Some(Event::MaximizeAllInDock(index));
            }
        }

        if let Some(doc) = self
            .documents
            .iter()
            .find(|d| tree.is_alive(d.node) && tree.contains(d.node, target))
        {
            let container = doc.container_id.clone();
            if target == doc.minimize_button {
                return Some(Event::DocumentMinimize { container, at: now });
            }
            if doc.commentary_button == Some(target) {
                return Some(Event::ShowCommentary(container));
            }
            if tree.contains(doc.title_bar, target) {
                return Some(Event::DocumentTitleClick { container, at: now });
            }
            return None;
        }

        if let Some(window) = tree.closest_with_class(target, "project-window") {
            let id = window::window_id(tree, window)?;
            if window::min_max_button(tree, window) == Some(target) {
                return Some(Event::ToggleMinimize(id));
            }
            if tree.has_class(target, "quick-link-button") {
                return Some(Event::QuickLink(id));
            }
        }

        if let Some(button) = tree.closest_with_class(target, "preview") {
            if tree.has_class(button, "project-button") {
                let id = tree.attr(button, "data-project")?;
                return Some(Event::OpenPreview(id.to_string()));
            }
        }

        if let Some(social) = tree.closest_with_class(target, "social-link") {
            let key = tree.attr(social, "data-social")?;
            return Some(Event::OpenSocialDialog(key.to_string()));
        }

        if let Some(icon) = tree.closest_with_class(target, "desktop-icon") {
            let href = tree.attr(icon, "href")?;
            return Some(Event::OpenIcon(href.to_string()));
        }

        None
    }

    // ========== preview ==========

    fn open_preview(&mut self, project_id: &str) {
        let Some(overlay) = self.preview else {
            tracing::warn!("preview feature disabled");
            return;
        };

        let origin = self.config.site_origin.clone();
        match preview::load_preview(&self.fetcher, self.projects.as_ref(), project_id, &origin) {
            Ok(content) => overlay.show(&mut self.tree, &content),
            Err(e) => {
                tracing::error!(project = project_id, error = %e, "preview failed");
                self.dialogs.create_dialog(
                    &mut self.tree,
                    DialogOptions::new(
                        "Preview Error",
                        DialogContent::Text(format!("This project preview is not available yet. ({e})")),
                    )
                    .on_close(CloseAction::HidePreview),
                );
            }
        }
    }

    fn hide_preview(&mut self) {
        if let Some(overlay) = self.preview {
            overlay.hide(&mut self.tree);
        }
    }

    fn apply_close_actions(&mut self, actions: impl IntoIterator<Item = CloseAction>) {
        for action in actions {
            match action {
                CloseAction::HidePreview => self.hide_preview(),
            }
        }
    }

    // ========== socials ==========

    fn open_social_dialog(&mut self, key: &str) -> Option<DialogId> {
        let Some(social) = self.socials.get(key) else {
            tracing::warn!(key, "unknown social");
            return None;
        };
        let options = DialogOptions::new(
            social.label.clone().unwrap_or_default(),
            DialogContent::Protected {
                intro: social.dialog_content.clone(),
                value: social.value.clone().unwrap_or_default(),
            },
        )
        .encoded(social.encrypt);
        Some(self.dialogs.create_dialog(&mut self.tree, options))
    }
}
