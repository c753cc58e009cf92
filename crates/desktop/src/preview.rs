//! Project preview loading
//!
//! A project's preview page is a full HTML document whose interesting part
//! is its `<main class="mac-window">` element. The loader fetches the page,
//! pulls out that element plus the page's stylesheets and scripts, and
//! rewrites their URLs so they resolve against the preview page rather
//! than the host page.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;
use url::Url;

use crate::fetch::{ConfigFetcher, FetchError};
use crate::project::ProjectsConfig;
use crate::tree::{escape, NodeId, Tree};

pub use crate::project::{preview_url, PREVIEW_FALLBACK};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("invalid project content structure (no <main.mac-window>)")]
    MissingMainWindow,

    #[error("project content not found: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid preview URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// A script carried over from the preview page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewScript {
    /// Absolute source URL, for external scripts
    pub src: Option<String>,
    /// Inline body (empty for most external scripts)
    pub inline: String,
}

/// Everything needed to show a preview page inside the host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewContent {
    /// Directory URL the preview's relative links resolve against
    pub base: Url,
    /// Absolute stylesheet URLs, in document order
    pub styles: Vec<String>,
    pub scripts: Vec<PreviewScript>,
    /// The `<main class="mac-window">` element with absolute URLs
    pub main_html: String,
}

impl PreviewContent {
    /// Markup injected into the preview overlay
    pub fn to_html(&self) -> String {
        let mut out = format!("<base href=\"{}\">", escape(self.base.as_str()));
        for href in &self.styles {
            out.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">", escape(href)));
        }
        for script in &self.scripts {
            match &script.src {
                Some(src) => out.push_str(&format!("<script src=\"{}\">", escape(src))),
                None => out.push_str("<script>"),
            }
            out.push_str(&script.inline);
            out.push_str("</script>");
        }
        out.push_str(&self.main_html);
        out
    }
}

/// URL actually fetched for a preview: `.html` links are used as-is,
/// anything else is treated as a directory holding `index.html`
pub fn fetch_url(url: &str) -> String {
    if url.ends_with(".html") {
        url.to_string()
    } else if url.ends_with('/') {
        format!("{url}index.html")
    } else {
        format!("{url}/index.html")
    }
}

// ========== HTML scanning ==========

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("preview pattern is valid"))
}

fn main_tag_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)<(/?)main\b([^>]*)>")
}

fn link_tag_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)<link\b([^>]*)>")
}

fn script_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?is)<script\b([^>]*)>(.*?)</script\s*>")
}

fn attr_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(
        &CELL,
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
    )
}

fn url_attr_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(
        &CELL,
        r#"(?i)(\s)(href|src)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
    )
}

/// Value of an attribute inside a tag's attribute text
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    attr_pattern().captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
    })
}

fn has_class(attrs: &str, class: &str) -> bool {
    attribute(attrs, "class").is_some_and(|v| v.split_whitespace().any(|c| c == class))
}

/// Byte range of the first `<main>` element carrying `mac-window`,
/// matched against its balanced closing tag
fn find_main_window(html: &str) -> Option<(usize, usize)> {
    let tags: Vec<Captures> = main_tag_pattern().captures_iter(html).collect();
    let start_index = tags
        .iter()
        .position(|caps| caps[1].is_empty() && has_class(&caps[2], "mac-window"))?;
    let start = tags[start_index].get(0)?.start();

    let mut depth = 0usize;
    for caps in &tags[start_index..] {
        if caps[1].is_empty() {
            depth += 1;
        } else {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some((start, caps.get(0)?.end()));
            }
        }
    }
    // Unclosed: take the rest of the document
    Some((start, html.len()))
}

fn absolutize(base: &Url, value: &str) -> Option<String> {
    match base.join(value) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::warn!(value, error = %e, "invalid URL in preview content");
            None
        }
    }
}

/// Rewrite `href` and `src` attributes (double, single or unquoted) to
/// absolute, double-quoted URLs. Fragment-only links are left alone.
fn rewrite_urls(html: &str, base: &Url) -> String {
    url_attr_pattern()
        .replace_all(html, |caps: &Captures| {
            let value = caps
                .get(3)
                .or_else(|| caps.get(4))
                .or_else(|| caps.get(5))
                .map_or("", |m| m.as_str());
            if value.is_empty() || value.starts_with('#') {
                return caps[0].to_string();
            }
            match absolutize(base, value) {
                Some(url) => format!("{}{}=\"{}\"", &caps[1], &caps[2], url),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Extract the preview parts of a fetched page.
///
/// `fetch_url` is the (possibly root-relative) URL the page was fetched
/// from; `origin` resolves it to an absolute URL.
pub fn extract_preview(html: &str, fetch_url: &str, origin: &str) -> Result<PreviewContent, PreviewError> {
    let invalid = |source| PreviewError::InvalidUrl {
        url: fetch_url.to_string(),
        source,
    };
    let origin = Url::parse(origin).map_err(invalid)?;
    let page = origin.join(fetch_url).map_err(invalid)?;
    let base = page.join(".").map_err(invalid)?;

    let (start, end) = find_main_window(html).ok_or(PreviewError::MissingMainWindow)?;
    let main_html = rewrite_urls(&html[start..end], &base);

    let styles = link_tag_pattern()
        .captures_iter(html)
        .filter(|caps| {
            attribute(&caps[1], "rel").is_some_and(|rel| {
                rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet"))
            })
        })
        .filter_map(|caps| attribute(&caps[1], "href").map(str::to_string))
        .filter(|href| !href.is_empty())
        .filter_map(|href| absolutize(&base, &href))
        .collect();

    let mut scripts = Vec::new();
    for caps in script_pattern().captures_iter(html) {
        let src = match attribute(&caps[1], "src") {
            Some(src) => match absolutize(&base, src) {
                Some(url) => Some(url),
                None => continue,
            },
            None => None,
        };
        scripts.push(PreviewScript {
            src,
            inline: caps[2].to_string(),
        });
    }

    Ok(PreviewContent {
        base,
        styles,
        scripts,
        main_html,
    })
}

/// Resolve, fetch and extract a project's preview page
pub fn load_preview(
    fetcher: &ConfigFetcher,
    projects: Option<&ProjectsConfig>,
    project_id: &str,
    origin: &str,
) -> Result<PreviewContent, PreviewError> {
    let url = fetch_url(&preview_url(projects, project_id));
    tracing::info!(project = project_id, url = %url, "loading project preview");
    let html = fetcher.fetch_text(&url)?;
    extract_preview(&html, &url, origin)
}

// ========== Overlay ==========

const PREVIEW_OPEN_CLASS: &str = "preview-open";

/// The page's `.project-preview` overlay
#[derive(Debug, Clone, Copy)]
pub struct PreviewOverlay {
    pub node: NodeId,
    pub exit_button: NodeId,
    pub content: NodeId,
}

impl PreviewOverlay {
    /// Locate the overlay and its parts; `None` disables previews
    pub fn attach(tree: &Tree) -> Option<Self> {
        let found = tree.find_by_class(tree.root(), "project-preview").and_then(|node| {
            let exit_button = tree.find_by_class(node, "exit-button")?;
            let content = tree.find_by_class(node, "preview-content")?;
            Some(Self {
                node,
                exit_button,
                content,
            })
        });
        if found.is_none() {
            tracing::warn!("project preview elements not found, preview feature disabled");
        }
        found
    }

    pub fn is_open(&self, tree: &Tree) -> bool {
        tree.has_class(self.node, "active")
    }

    /// Show preview content, replacing whatever was shown before
    pub fn show(&self, tree: &mut Tree, content: &PreviewContent) {
        tree.add_class(self.node, "active");
        let body = tree.root();
        tree.add_class(body, PREVIEW_OPEN_CLASS);
        tree.set_inner_html(self.content, content.to_html());
    }

    pub fn hide(&self, tree: &mut Tree) {
        tree.remove_class(self.node, "active");
        let body = tree.root();
        tree.remove_class(body, PREVIEW_OPEN_CLASS);
        tree.clear_children(self.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="../../styles/main.css">
  <link rel="icon" href="favicon.ico">
  <link rel="stylesheet" href="style.css">
  <script src="app.js"></script>
</head>
<body>
  <main class="container mac-window">
    <img src="img/shot.png" alt="shot">
    <a href="#top">top</a>
    <main class="inner">nested</main>
    <a href="https://example.com/x">ext</a>
  </main>
  <script>console.log("hi")</script>
</body>
</html>"##;

    #[test]
    fn fetch_url_appends_index() {
        assert_eq!(fetch_url("/projects/a"), "/projects/a/index.html");
        assert_eq!(fetch_url("/projects/a/"), "/projects/a/index.html");
        assert_eq!(fetch_url("/projects/a/page.html"), "/projects/a/page.html");
    }

    #[test]
    fn extracts_main_window_with_balanced_tags() {
        let preview = extract_preview(PAGE, "/projects/a/index.html", "https://site.dev/").unwrap();

        assert_eq!(preview.base.as_str(), "https://site.dev/projects/a/");
        assert!(preview.main_html.starts_with("<main class=\"container mac-window\">"));
        assert!(preview.main_html.ends_with("</main>"));
        assert!(preview.main_html.contains("nested</main>"));
        assert!(preview.main_html.contains("ext</a>"));
    }

    #[test]
    fn rewrites_urls_against_preview_base() {
        let preview = extract_preview(PAGE, "/projects/a/index.html", "https://site.dev/").unwrap();

        assert_eq!(
            preview.styles,
            vec!["https://site.dev/styles/main.css", "https://site.dev/projects/a/style.css"]
        );
        assert!(preview.main_html.contains("src=\"https://site.dev/projects/a/img/shot.png\""));
        assert!(preview.main_html.contains("href=\"#top\""));
        assert!(preview.main_html.contains("href=\"https://example.com/x\""));
    }

    #[test]
    fn rewrites_single_quoted_and_unquoted_urls() {
        let html = "<main class='mac-window'><img src='img/a.png'><a href=docs/b.html>b</a>\
                    <img data-src=\"keep.png\"><a href='#x'>x</a></main>";
        let preview = extract_preview(html, "/projects/a/", "https://site.dev/").unwrap();

        assert!(preview.main_html.contains("src=\"https://site.dev/projects/a/img/a.png\""));
        assert!(preview.main_html.contains("href=\"https://site.dev/projects/a/docs/b.html\""));
        assert!(preview.main_html.contains("data-src=\"keep.png\""));
        assert!(preview.main_html.contains("href='#x'"));
    }

    #[test]
    fn collects_external_and_inline_scripts() {
        let preview = extract_preview(PAGE, "/projects/a/index.html", "https://site.dev/").unwrap();

        assert_eq!(preview.scripts.len(), 2);
        assert_eq!(
            preview.scripts[0].src.as_deref(),
            Some("https://site.dev/projects/a/app.js")
        );
        assert_eq!(preview.scripts[1].src, None);
        assert_eq!(preview.scripts[1].inline, "console.log(\"hi\")");
    }

    #[test]
    fn missing_main_window_is_an_error() {
        let html = "<html><body><main class=\"plain\">x</main></body></html>";
        assert!(matches!(
            extract_preview(html, "/a/index.html", "https://site.dev/"),
            Err(PreviewError::MissingMainWindow)
        ));
    }

    #[test]
    fn invalid_origin_is_an_error() {
        assert!(matches!(
            extract_preview(PAGE, "/a/index.html", "not a url"),
            Err(PreviewError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn overlay_show_and_hide() {
        let mut tree = Tree::new();
        let root = tree.root();
        let overlay = tree.append_new(root, "div", &["project-preview"]);
        tree.append_new(overlay, "button", &["exit-button"]);
        tree.append_new(overlay, "div", &["preview-content"]);
        let overlay = PreviewOverlay::attach(&tree).unwrap();

        let preview = extract_preview(PAGE, "/projects/a/index.html", "https://site.dev/").unwrap();
        overlay.show(&mut tree, &preview);
        assert!(overlay.is_open(&tree));
        assert!(tree.has_class(root, "preview-open"));
        let html = tree.inner_html(overlay.content).unwrap();
        assert!(html.starts_with("<base href=\"https://site.dev/projects/a/\">"));

        overlay.hide(&mut tree);
        assert!(!overlay.is_open(&tree));
        assert!(!tree.has_class(root, "preview-open"));
        assert_eq!(tree.inner_html(overlay.content), None);
    }
}
