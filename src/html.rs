//! HTML backend for [`DocNode`] trees.
//!
//! [`HtmlWriter`] implements [`Visitor`]: every node kind opens its markup in
//! `visit` and closes it in `depart`. [`PageRenderer`] wraps a rendered body in
//! the page template.

use log::warn;
use minijinja::{context, Environment};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::error::Result;
use crate::markup::markdown_to_html;
use crate::nodes::{walk, DocNode, NodeKind, VisitAction, Visitor};

pub const CSS_ASSET: &str = "sphinx_asdf.css";
pub const JS_ASSET: &str = "sphinx_asdf.js";

const PAGE_TEMPLATE_NAME: &str = "schema.html";
const PAGE_TEMPLATE: &str = include_str!("../templates/schema.html");
const DEFAULT_THEME: &str = "InspiredGitHub";

/// Syntax highlighting for literal blocks.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl Highlighter {
    /// Available themes: "InspiredGitHub", "Solarized (dark)", "Solarized (light)",
    /// "base16-ocean.dark", "base16-eighties.dark", "base16-mocha.dark", "base16-ocean.light"
    pub fn new(theme_name: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme_name = if theme_set.themes.contains_key(theme_name) {
            theme_name.to_string()
        } else {
            warn!("Unknown highlight theme '{}', using {}", theme_name, DEFAULT_THEME);
            DEFAULT_THEME.to_string()
        };
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme_name,
        }
    }

    /// Highlight code, falling back to plain text if the language is unknown.
    pub fn highlight(&self, code: &str, language: &str) -> String {
        let theme = &self.theme_set.themes[&self.theme_name];
        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(html) => html,
            Err(_) => format!("<pre><code>{}</code></pre>", html_escape::encode_text(code)),
        }
    }
}

/// Convert text to a URL-safe slug for section anchors.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' || c == '.' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Serializes a document tree into an HTML fragment.
pub struct HtmlWriter<'a> {
    highlighter: &'a Highlighter,
    body: String,
}

impl<'a> HtmlWriter<'a> {
    pub fn new(highlighter: &'a Highlighter) -> Self {
        Self {
            highlighter,
            body: String::new(),
        }
    }

    pub fn render(highlighter: &'a Highlighter, node: &DocNode) -> String {
        let mut writer = Self::new(highlighter);
        walk(node, &mut writer);
        writer.finish()
    }

    pub fn finish(self) -> String {
        self.body
    }

    fn push(&mut self, html: &str) {
        self.body.push_str(html);
    }
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).to_string()
}

fn attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).to_string()
}

impl Visitor for HtmlWriter<'_> {
    fn visit(&mut self, node: &DocNode) -> VisitAction {
        match &node.kind {
            NodeKind::SchemaDoc => {}
            NodeKind::SchemaTitle => self.push(r#"<div class="schema-title">"#),
            NodeKind::HeaderTitle { text } => {
                let html = format!("<h4>{}", escape(text));
                self.push(&html);
            }
            NodeKind::SectionHeader { text } => {
                let html = format!(r#"<h3 id="{}">{}"#, attr(&slugify(text)), escape(text));
                self.push(&html);
            }
            NodeKind::TocLink { text } => {
                let html = format!(
                    r##"<li><a class="toc-link" href="#{}">{}"##,
                    attr(&slugify(text)),
                    escape(text)
                );
                self.push(&html);
            }
            NodeKind::Description => self.push(r#"<div class="property-description">"#),
            NodeKind::Markdown { source } => {
                let html = markdown_to_html(source);
                self.push(&html);
            }
            NodeKind::Properties { id } => {
                let html = format!(r#"<div class="schema-properties" id="{}">"#, attr(id));
                self.push(&html);
            }
            NodeKind::Tree => self.push(r#"<ul class="asdf-tree">"#),
            NodeKind::Property { id } => {
                let html = format!(r#"<li class="schema-property" id="{}">"#, attr(id));
                self.push(&html);
            }
            NodeKind::PropertyName { text } => {
                let html = format!(r#"<div class="schema-property-name"><h4>{}"#, escape(text));
                self.push(&html);
            }
            NodeKind::PropertyDetails {
                type_name,
                required,
                reference,
            } => {
                let mut html = String::from("<table><tr><td><b>");
                match reference {
                    Some(href) => html.push_str(&format!(
                        r#"<a href="{}">{}</a>"#,
                        attr(href),
                        escape(type_name)
                    )),
                    None => html.push_str(&escape(type_name)),
                }
                html.push_str("</b></td>");
                if *required {
                    html.push_str("<td><em>Required</em></td>");
                }
                self.push(&html);
            }
            NodeKind::CombinerBody { id } => {
                let html = format!(r#"<div class="combiner-body" id="{}">"#, attr(id));
                self.push(&html);
            }
            NodeKind::CombinerList => self.push(r#"<ul class="combiner-list">"#),
            NodeKind::CombinerItem => self.push(r#"<li class="combiner-list-item">"#),
            NodeKind::Reference { text, href } => {
                let html = format!(
                    r#"<li><a class="asdf-ref" href="{}">{}"#,
                    attr(href),
                    escape(text)
                );
                self.push(&html);
            }
            NodeKind::Enumeration => self.push(r#"<div class="enumeration">"#),
            NodeKind::ExampleSection { .. } => self.push(r#"<div class="example-section">"#),
            NodeKind::ExampleItem => self.push(r#"<div class="example-item">"#),
            NodeKind::ExampleDescription => self.push(r#"<div class="example-description">"#),
            NodeKind::Compound { id } => {
                let html = match id {
                    Some(id) => format!(r#"<div class="compound" id="{}">"#, attr(id)),
                    None => r#"<div class="compound">"#.to_string(),
                };
                self.push(&html);
            }
            NodeKind::Paragraph { text } => {
                let html = format!("<p>{}", escape(text));
                self.push(&html);
            }
            NodeKind::Emphasis { text } => {
                let html = format!("<p><em>{}", escape(text));
                self.push(&html);
            }
            NodeKind::Strong { text } => {
                let html = format!("<strong>{}", escape(text));
                self.push(&html);
            }
            NodeKind::LiteralBlock { text, language } => {
                let html = format!(
                    r#"<div class="highlight-{} notranslate">{}"#,
                    attr(language),
                    self.highlighter.highlight(text, language)
                );
                self.push(&html);
            }
            NodeKind::BulletList => self.push(r#"<ul class="simple">"#),
            NodeKind::ListItem => self.push("<li>"),
            NodeKind::Admonition { title } => {
                let html = format!(
                    r#"<div class="admonition"><p class="admonition-title">{}</p>"#,
                    escape(title)
                );
                self.push(&html);
            }
            NodeKind::Toctree { entries } => {
                let mut html = String::from("<div class=\"toctree-wrapper\">\n<ul>\n");
                for entry in entries {
                    html.push_str(&format!(
                        "<li class=\"toctree-l1\"><a class=\"reference internal\" href=\"{}.html\">{}</a></li>\n",
                        attr(&entry.link),
                        escape(&entry.title)
                    ));
                }
                html.push_str("</ul>\n");
                self.push(&html);
            }
        }
        VisitAction::Continue
    }

    fn depart(&mut self, node: &DocNode) {
        let close = match &node.kind {
            NodeKind::SchemaDoc | NodeKind::Markdown { .. } => "",
            NodeKind::HeaderTitle { .. } => "</h4>\n",
            NodeKind::SectionHeader { text } => {
                let html = format!(
                    "<a class=\"headerlink\" href=\"#{}\" title=\"Link to this heading\">¶</a></h3>\n",
                    attr(&slugify(text))
                );
                self.push(&html);
                return;
            }
            NodeKind::TocLink { .. } => "</a></li>\n",
            NodeKind::PropertyName { .. } => "</h4></div>\n",
            NodeKind::PropertyDetails { .. } => "</tr></table>\n",
            NodeKind::Tree
            | NodeKind::CombinerList
            | NodeKind::BulletList => "</ul>\n",
            NodeKind::Property { .. }
            | NodeKind::CombinerItem
            | NodeKind::ListItem => "</li>\n",
            NodeKind::Reference { .. } => "</a></li>\n",
            NodeKind::Paragraph { .. } => "</p>\n",
            NodeKind::Emphasis { .. } => "</em></p>\n",
            NodeKind::Strong { .. } => "</strong>",
            NodeKind::Toctree { .. } => "</div>\n",
            NodeKind::SchemaTitle
            | NodeKind::Description
            | NodeKind::Properties { .. }
            | NodeKind::CombinerBody { .. }
            | NodeKind::Enumeration
            | NodeKind::ExampleSection { .. }
            | NodeKind::ExampleItem
            | NodeKind::ExampleDescription
            | NodeKind::Compound { .. }
            | NodeKind::LiteralBlock { .. }
            | NodeKind::Admonition { .. } => "</div>\n",
        };
        self.push(close);
    }
}

/// Wraps rendered bodies in the page template.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render a page stored at `docname` (e.g. `generated/core/ndarray`), so
    /// asset links are made relative to the output root.
    pub fn render_page(&self, docname: &str, title: &str, body: &str) -> Result<String> {
        let root = "../".repeat(docname.matches('/').count());
        let template = self.env.get_template(PAGE_TEMPLATE_NAME)?;
        let html = template.render(context! {
            title => title,
            body => body,
            css => format!("{}_static/{}", root, CSS_ASSET),
            js => format!("{}_static/{}", root, JS_ASSET),
            version => env!("CARGO_PKG_VERSION"),
        })?;
        Ok(html)
    }
}
