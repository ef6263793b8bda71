//! Document tree produced by the schema renderer.
//!
//! A [`DocNode`] is a [`NodeKind`] plus its ordered children. Output backends
//! implement [`Visitor`] with one `visit`/`depart` pair per kind and drive it
//! with [`walk`].

/// The kind of a document node and its attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of a rendered schema page.
    SchemaDoc,
    /// Schema title (children are markup).
    SchemaTitle,
    /// Small heading inside the page header (`Description`, `Outline`).
    HeaderTitle { text: String },
    /// Top-level section heading with a permalink.
    SectionHeader { text: String },
    /// Outline entry pointing at a section heading.
    TocLink { text: String },
    /// Wrapper around a rendered description.
    Description,
    /// Markdown source rendered by the backend.
    Markdown { source: String },
    /// Container for the rendering of one schema node.
    Properties { id: String },
    /// List of property items.
    Tree,
    /// One property of an object.
    Property { id: String },
    PropertyName { text: String },
    /// Type, required flag and optional link of a property.
    PropertyDetails {
        type_name: String,
        required: bool,
        reference: Option<String>,
    },
    /// Collapsible container for a nested combiner.
    CombinerBody { id: String },
    CombinerList,
    CombinerItem,
    /// Link to another schema or definition.
    Reference { text: String, href: String },
    /// Allowed values of an `enum`.
    Enumeration,
    ExampleSection { count: usize },
    ExampleItem,
    ExampleDescription,
    /// Generic grouping node; `id` is set when it anchors a path.
    Compound { id: Option<String> },
    Paragraph { text: String },
    Emphasis { text: String },
    Strong { text: String },
    LiteralBlock { text: String, language: String },
    BulletList,
    ListItem,
    /// Boxed block with a title, used for ASDF file dumps.
    Admonition { title: String },
    /// Table of contents linking generated schema pages.
    Toctree { entries: Vec<TocEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocNode {
    pub kind: NodeKind,
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<DocNode>) -> Self {
        Self { kind, children }
    }

    pub fn push(&mut self, child: DocNode) {
        self.children.push(child);
    }

    pub fn extend(&mut self, children: impl IntoIterator<Item = DocNode>) {
        self.children.extend(children);
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Paragraph { text: text.into() })
    }

    pub fn emphasis(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Emphasis { text: text.into() })
    }

    pub fn strong(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Strong { text: text.into() })
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(NodeKind::Markdown {
            source: source.into(),
        })
    }

    pub fn literal_block(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self::new(NodeKind::LiteralBlock {
            text: text.into(),
            language: language.into(),
        })
    }

    pub fn compound(children: Vec<DocNode>) -> Self {
        Self::with_children(NodeKind::Compound { id: None }, children)
    }

    /// Anchor id carried by this node, if any.
    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Properties { id }
            | NodeKind::Property { id }
            | NodeKind::CombinerBody { id } => Some(id.as_str()),
            NodeKind::Compound { id } => id.as_deref(),
            _ => None,
        }
    }

    /// Concatenated plain text of this node and its descendants.
    pub fn text(&self) -> String {
        let mut collector = TextCollector::default();
        walk(self, &mut collector);
        collector.text
    }

    /// All nodes of the subtree, depth-first, for which `predicate` holds.
    pub fn find_all<'a>(&'a self, predicate: impl Fn(&DocNode) -> bool) -> Vec<&'a DocNode> {
        let mut found = Vec::new();
        collect_matching(self, &predicate, &mut found);
        found
    }
}

fn collect_matching<'a>(
    node: &'a DocNode,
    predicate: &impl Fn(&DocNode) -> bool,
    found: &mut Vec<&'a DocNode>,
) {
    if predicate(node) {
        found.push(node);
    }
    for child in &node.children {
        collect_matching(child, predicate, found);
    }
}

/// Whether traversal should enter a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    SkipChildren,
}

pub trait Visitor {
    fn visit(&mut self, node: &DocNode) -> VisitAction;

    fn depart(&mut self, _node: &DocNode) {}
}

/// Depth-first traversal calling `visit` before and `depart` after children.
pub fn walk<V: Visitor + ?Sized>(node: &DocNode, visitor: &mut V) {
    if visitor.visit(node) == VisitAction::Continue {
        for child in &node.children {
            walk(child, visitor);
        }
    }
    visitor.depart(node);
}

#[derive(Default)]
struct TextCollector {
    text: String,
}

impl Visitor for TextCollector {
    fn visit(&mut self, node: &DocNode) -> VisitAction {
        let text = match &node.kind {
            NodeKind::HeaderTitle { text }
            | NodeKind::SectionHeader { text }
            | NodeKind::TocLink { text }
            | NodeKind::PropertyName { text }
            | NodeKind::Reference { text, .. }
            | NodeKind::Paragraph { text }
            | NodeKind::Emphasis { text }
            | NodeKind::Strong { text }
            | NodeKind::LiteralBlock { text, .. } => Some(text.as_str()),
            NodeKind::Markdown { source } => Some(source.as_str()),
            NodeKind::PropertyDetails { type_name, .. } => Some(type_name.as_str()),
            _ => None,
        };
        if let Some(text) = text {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(text);
        }
        VisitAction::Continue
    }
}

/// Collects every anchor id in document order.
#[derive(Debug, Default)]
pub struct IdCollector {
    pub ids: Vec<String>,
}

impl Visitor for IdCollector {
    fn visit(&mut self, node: &DocNode) -> VisitAction {
        if let Some(id) = node.id() {
            if !id.is_empty() {
                self.ids.push(id.to_string());
            }
        }
        VisitAction::Continue
    }
}
