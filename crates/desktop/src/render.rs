//! Content block rendering
//!
//! Documents are lists of typed blocks. Each block maps directly onto a
//! small element subtree; markdown is converted with `pulldown-cmark`.
//!
//! ```json
//! { "type": "markdown", "content": "# Hello", "style": { "span": 2 } }
//! { "type": "code", "language": "rust", "content": "fn main() {}" }
//! { "type": "table", "headers": ["a"], "rows": [["1"]] }
//! { "type": "flex-container", "style": { "justify": "between" }, "content": [ ... ] }
//! ```

use std::fmt;

use pulldown_cmark::{html, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

use crate::linkify::linkify_text;
use crate::tree::{NodeId, Tree};

/// A style value that may be written as a number or a string in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleToken {
    Number(i64),
    Text(String),
}

impl fmt::Display for StyleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Optional presentation hints on a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockStyle {
    /// Flex grow factor when inside a flex container
    pub flex: Option<StyleToken>,
    /// Grid column span
    pub span: Option<StyleToken>,
    pub justify: Option<StyleToken>,
    pub align: Option<StyleToken>,
    pub gap: Option<StyleToken>,
    /// Code block theme
    pub theme: Option<StyleToken>,
}

/// One content block of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Block {
    Markdown {
        content: String,
        #[serde(default)]
        style: BlockStyle,
    },
    Code {
        content: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        style: BlockStyle,
    },
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<String>>,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        style: BlockStyle,
    },
    FlexContainer {
        #[serde(default)]
        content: Vec<Block>,
        #[serde(default)]
        style: BlockStyle,
    },
    /// Any block kind this renderer does not know
    #[serde(other)]
    Unknown,
}

impl Block {
    pub fn style(&self) -> Option<&BlockStyle> {
        match self {
            Block::Markdown { style, .. }
            | Block::Code { style, .. }
            | Block::Table { style, .. }
            | Block::FlexContainer { style, .. } => Some(style),
            Block::Unknown => None,
        }
    }
}

/// Convert markdown to HTML.
///
/// GitHub-flavoured extensions are on and single newlines become `<br>`.
/// Raw HTML in the source is passed through.
pub fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new_ext(source, markdown_options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Rewrite `Link:` markers in markdown source, leaving code spans and
/// code blocks as written so their text is not turned into escaped markup.
pub fn linkify_markdown(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (event, range) in Parser::new_ext(source, markdown_options()).into_offset_iter() {
        let code = matches!(event, Event::Start(Tag::CodeBlock(_)) | Event::Code(_));
        if code && range.start >= last {
            out.push_str(&linkify_text(&source[last..range.start]));
            out.push_str(&source[range.start..range.end]);
            last = range.end;
        }
    }
    out.push_str(&linkify_text(&source[last..]));
    out
}

/// Render a block into a new detached element
pub fn render_block(tree: &mut Tree, block: &Block) -> NodeId {
    render_block_in(tree, block, false)
}

fn render_block_in(tree: &mut Tree, block: &Block, in_flex: bool) -> NodeId {
    let wrapper = tree.create_element("div");

    match block {
        Block::Markdown { content, style } => {
            tree.add_class(wrapper, "markdown-block");
            tree.set_inner_html(wrapper, markdown_to_html(&linkify_markdown(content)));
            if !in_flex && style.flex.is_none() {
                tree.set_attr(wrapper, "style", "grid-column: 1 / -1");
            }
        }
        Block::Code {
            content,
            language,
            style,
        } => {
            tree.add_class(wrapper, "code-block");
            if let Some(theme) = &style.theme {
                tree.add_class(wrapper, &format!("theme-{theme}"));
            }
            let pre = tree.append_new(wrapper, "pre", &[]);
            let code = tree.append_new(pre, "code", &[]);
            if let Some(language) = language {
                tree.add_class(code, &format!("language-{language}"));
            }
            tree.set_text(code, content.as_str());
        }
        Block::Table {
            headers,
            rows,
            caption,
            ..
        } => {
            tree.add_class(wrapper, "table-block");
            let table = tree.append_new(wrapper, "table", &[]);
            if let Some(caption) = caption {
                let node = tree.append_new(table, "caption", &[]);
                tree.set_text(node, caption.as_str());
            }
            if !headers.is_empty() {
                let thead = tree.append_new(table, "thead", &[]);
                let row = tree.append_new(thead, "tr", &[]);
                for header in headers {
                    let th = tree.append_new(row, "th", &[]);
                    tree.set_text(th, header.as_str());
                }
            }
            let tbody = tree.append_new(table, "tbody", &[]);
            for cells in rows {
                let row = tree.append_new(tbody, "tr", &[]);
                for cell in cells {
                    let td = tree.append_new(row, "td", &[]);
                    tree.set_text(td, cell.as_str());
                }
            }
        }
        Block::FlexContainer { content, style } => {
            tree.add_class(wrapper, "flex-container");
            if let Some(justify) = &style.justify {
                tree.add_class(wrapper, &format!("justify-{justify}"));
            }
            if let Some(align) = &style.align {
                tree.add_class(wrapper, &format!("align-{align}"));
            }
            if let Some(gap) = &style.gap {
                tree.add_class(wrapper, &format!("gap-{gap}"));
            }
            for child in content {
                let element = render_block_in(tree, child, true);
                if let Some(flex) = child.style().and_then(|s| s.flex.as_ref()) {
                    tree.add_class(element, &format!("flex-{flex}"));
                }
                tree.append_child(wrapper, element);
            }
        }
        Block::Unknown => {
            tracing::warn!("unknown block type");
            return wrapper;
        }
    }

    if let Some(span) = block.style().and_then(|s| s.span.as_ref()) {
        tree.add_class(wrapper, &format!("span-{span}"));
    }

    wrapper
}

/// Render a list of blocks as children of `parent`
pub fn render_blocks(tree: &mut Tree, parent: NodeId, blocks: &[Block]) {
    for block in blocks {
        let element = render_block(tree, block);
        tree.append_child(parent, element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Block {
        serde_json::from_str(json).expect("valid block json")
    }

    #[test]
    fn markdown_block_spans_grid() {
        let mut tree = Tree::new();
        let block = parse(r##"{"type": "markdown", "content": "# Title\n\nBody"}"##);
        let node = render_block(&mut tree, &block);

        assert!(tree.has_class(node, "markdown-block"));
        assert_eq!(tree.attr(node, "style"), Some("grid-column: 1 / -1"));
        let html = tree.inner_html(node).unwrap_or_default();
        assert!(html.contains("<h1>Title</h1>"), "got {html}");
        assert!(html.contains("<p>Body</p>"), "got {html}");
    }

    #[test]
    fn markdown_single_newline_becomes_break() {
        let html = markdown_to_html("line one\nline two");
        assert!(html.contains("<br />"), "got {html}");
    }

    #[test]
    fn markdown_links_are_processed_before_parsing() {
        let mut tree = Tree::new();
        let block = parse(r#"{"type": "markdown", "content": "Link: https://example.com Label: \"Site\""}"#);
        let node = render_block(&mut tree, &block);
        let html = tree.inner_html(node).unwrap_or_default();
        assert!(html.contains("<a href=\"https://example.com\""), "got {html}");
        assert!(html.contains(">Site</a>"), "got {html}");
    }

    #[test]
    fn markdown_code_keeps_link_marker_as_text() {
        let source = "Link: https://a.dev\n\n```\nLink: https://b.dev\n```\n\nRun `Link: https://c.dev` here";
        let html = markdown_to_html(&linkify_markdown(source));

        assert!(html.contains("<a href=\"https://a.dev\""), "got {html}");
        assert!(html.contains("<code>Link: https://b.dev\n</code>"), "got {html}");
        assert!(html.contains("<code>Link: https://c.dev</code>"), "got {html}");
        assert!(!html.contains("&lt;a"), "got {html}");
    }

    #[test]
    fn markdown_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "got {html}");
    }

    #[test]
    fn code_block_structure() {
        let mut tree = Tree::new();
        let block = parse(
            r#"{"type": "code", "language": "rust", "content": "fn main() {}", "style": {"theme": "dark"}}"#,
        );
        let node = render_block(&mut tree, &block);

        assert!(tree.has_class(node, "code-block"));
        assert!(tree.has_class(node, "theme-dark"));
        let pre = tree.children(node)[0];
        assert_eq!(tree.tag(pre), "pre");
        let code = tree.children(pre)[0];
        assert!(tree.has_class(code, "language-rust"));
        assert_eq!(tree.text(code), "fn main() {}");
    }

    #[test]
    fn table_block_structure() {
        let mut tree = Tree::new();
        let block = parse(r#"{"type": "table", "headers": ["Name", "Role"], "rows": [["Ada", "Eng"], ["Bob", "Ops"]]}"#);
        let node = render_block(&mut tree, &block);

        assert!(tree.has_class(node, "table-block"));
        assert_eq!(tree.find_all_by_tag(node, "th").len(), 2);
        assert_eq!(tree.find_all_by_tag(node, "tr").len(), 3);
        assert_eq!(tree.find_all_by_tag(node, "td").len(), 4);
    }

    #[test]
    fn flex_container_children_get_flex_classes() {
        let mut tree = Tree::new();
        let block = parse(
            r#"{
                "type": "flex-container",
                "style": {"justify": "between", "align": "center", "gap": 2},
                "content": [
                    {"type": "markdown", "content": "left", "style": {"flex": 2}},
                    {"type": "markdown", "content": "right"}
                ]
            }"#,
        );
        let node = render_block(&mut tree, &block);

        assert!(tree.has_class(node, "flex-container"));
        assert!(tree.has_class(node, "justify-between"));
        assert!(tree.has_class(node, "align-center"));
        assert!(tree.has_class(node, "gap-2"));

        let children = tree.children(node).to_vec();
        assert_eq!(children.len(), 2);
        assert!(tree.has_class(children[0], "flex-2"));
        // Children of a flex container never span the grid
        assert_eq!(tree.attr(children[0], "style"), None);
        assert_eq!(tree.attr(children[1], "style"), None);
    }

    #[test]
    fn span_class_applied() {
        let mut tree = Tree::new();
        let block = parse(r#"{"type": "code", "content": "x", "style": {"span": "full"}}"#);
        let node = render_block(&mut tree, &block);
        assert!(tree.has_class(node, "span-full"));
    }

    #[test]
    fn unknown_block_renders_empty_div() {
        let mut tree = Tree::new();
        let block = parse(r#"{"type": "video", "src": "x.mp4"}"#);
        assert_eq!(block, Block::Unknown);

        let node = render_block(&mut tree, &block);
        assert_eq!(tree.tag(node), "div");
        assert!(tree.classes(node).is_empty());
        assert!(tree.children(node).is_empty());
    }
}
