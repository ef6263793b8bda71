//! reStructuredText directives understood by the builder.
//!
//! - `asdf-autoschemas` lists schemas to document. In discovery mode it
//!   yields [`SchemaDef`]s for stub generation, in build mode a toctree.
//! - `asdf-schema` renders one schema.
//! - `asdf` dumps the header, tree and blocks of an ASDF file.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::asdf_file::AsdfFile;
use crate::config::AsdfConfig;
use crate::error::{AsdfError, Result};
use crate::markup::markdown_to_plain_text;
use crate::nodes::{DocNode, NodeKind, TocEntry};
use crate::renderer::SchemaRenderer;
use crate::schema::{LoadedSchema, SchemaNode, SchemaSource};

pub const AUTOSCHEMAS_DIRECTIVE: &str = "asdf-autoschemas";
pub const SCHEMA_DIRECTIVE: &str = "asdf-schema";
pub const ASDF_FILE_DIRECTIVE: &str = "asdf";

/// Directory, relative to the source directory, holding generated stubs.
pub const GENERATED_DIR: &str = "generated";

lazy_static! {
    static ref DIRECTIVE_REGEX: Regex =
        Regex::new(r"^([ \t]*)\.\. ([a-zA-Z][a-zA-Z0-9_-]*)::(.*)$").unwrap();

    static ref OPTION_REGEX: Regex =
        Regex::new(r"^[ \t]+:([a-zA-Z][a-zA-Z0-9_-]*):(?: (.*))?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

/// A directive occurrence found in a source document.
#[derive(Debug, Clone)]
pub struct ParsedDirective {
    pub name: String,
    pub arguments: Vec<String>,
    pub options: HashMap<String, String>,
    /// Body lines with the common indentation removed.
    pub content: Vec<String>,
    pub location: SourceLocation,
}

impl ParsedDirective {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(|v| v.trim())
    }

    /// Non-blank content lines, trimmed.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.content
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
    }
}

/// Scan a reST document for directives, including indented (nested) ones.
pub fn scan_directives(source: &str, file: &str) -> Vec<ParsedDirective> {
    let lines: Vec<&str> = source.lines().collect();
    let mut directives = Vec::new();

    for (line_num, line) in lines.iter().enumerate() {
        let Some(captures) = DIRECTIVE_REGEX.captures(line) else {
            continue;
        };
        let indent = captures[1].len();
        let arguments = captures[3]
            .split_whitespace()
            .map(|s| s.to_string())
            .collect();
        let (options, content) = parse_directive_body(&lines[line_num + 1..], indent);

        directives.push(ParsedDirective {
            name: captures[2].to_string(),
            arguments,
            options,
            content,
            location: SourceLocation {
                file: file.to_string(),
                line: line_num + 1,
            },
        });
    }

    directives
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn parse_directive_body(
    lines: &[&str],
    directive_indent: usize,
) -> (HashMap<String, String>, Vec<String>) {
    let body_len = lines
        .iter()
        .position(|line| !line.trim().is_empty() && indentation(line) <= directive_indent)
        .unwrap_or(lines.len());
    let body = &lines[..body_len];

    let mut options = HashMap::new();
    let mut rest = 0;
    for line in body {
        match OPTION_REGEX.captures(line) {
            Some(captures) => {
                let value = captures.get(2).map_or("", |m| m.as_str());
                options.insert(captures[1].to_string(), value.to_string());
                rest += 1;
            }
            None => break,
        }
    }

    let content_lines = &body[rest..];
    let common = content_lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indentation(line))
        .min()
        .unwrap_or(0);
    let mut content: Vec<String> = content_lines
        .iter()
        .map(|line| line.get(common..).unwrap_or("").trim_end().to_string())
        .collect();
    while content.first().is_some_and(|l| l.is_empty()) {
        content.remove(0);
    }
    while content.last().is_some_and(|l| l.is_empty()) {
        content.pop();
    }

    (options, content)
}

/// Whether directives are being read to discover schemas or to build pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveMode {
    Discovery,
    Build,
}

/// A schema named by an `asdf-autoschemas` directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaDef {
    pub name: String,
    pub standard_prefix: String,
    pub schema_root: String,
}

/// Output of `asdf-autoschemas` for the requested mode.
#[derive(Debug, Clone)]
pub enum AutoschemasOutput {
    Definitions(Vec<SchemaDef>),
    Toctree(DocNode),
}

#[derive(Debug, Clone)]
pub struct AutoschemasDirective {
    pub schema_root: Option<String>,
    pub standard_prefix: Option<String>,
    pub schemas: Vec<String>,
}

impl AutoschemasDirective {
    pub fn from_parsed(directive: &ParsedDirective) -> Self {
        Self {
            schema_root: directive.option("schema_root").map(str::to_string),
            standard_prefix: directive.option("standard_prefix").map(str::to_string),
            schemas: directive
                .entries()
                .filter_map(|line| line.split_whitespace().next())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn run(&self, mode: DirectiveMode, config: &AsdfConfig) -> AutoschemasOutput {
        let standard_prefix = self
            .standard_prefix
            .clone()
            .unwrap_or_else(|| config.standard_prefix.clone());

        match mode {
            DirectiveMode::Discovery => {
                let schema_root = self
                    .schema_root
                    .clone()
                    .unwrap_or_else(|| config.schema_path.clone());
                AutoschemasOutput::Definitions(
                    self.schemas
                        .iter()
                        .map(|name| SchemaDef {
                            name: name.clone(),
                            standard_prefix: standard_prefix.clone(),
                            schema_root: schema_root.clone(),
                        })
                        .collect(),
                )
            }
            DirectiveMode::Build => {
                let entries = self
                    .schemas
                    .iter()
                    .map(|name| TocEntry {
                        title: name.clone(),
                        link: generated_docname(&standard_prefix, name),
                    })
                    .collect();
                AutoschemasOutput::Toctree(DocNode::new(NodeKind::Toctree { entries }))
            }
        }
    }
}

/// Docname of the stub page generated for a schema.
pub fn generated_docname(standard_prefix: &str, name: &str) -> String {
    [GENERATED_DIR, standard_prefix, name]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}

/// A rendered `asdf-schema` directive.
#[derive(Debug, Clone)]
pub struct RenderedSchema {
    pub title: String,
    pub schema_file: PathBuf,
    pub document: DocNode,
}

#[derive(Debug, Clone)]
pub struct SchemaDirective {
    pub name: String,
    pub schema_root: Option<String>,
    pub standard_prefix: Option<String>,
}

impl SchemaDirective {
    /// `None` when the directive names no schema.
    pub fn from_parsed(directive: &ParsedDirective) -> Option<Self> {
        let name = directive.entries().next()?.to_string();
        Some(Self {
            name,
            schema_root: directive.option("schema_root").map(str::to_string),
            standard_prefix: directive.option("standard_prefix").map(str::to_string),
        })
    }

    pub fn source(&self, srcdir: &Path, config: &AsdfConfig) -> SchemaSource {
        let schema_root = self.schema_root.as_deref().unwrap_or(&config.schema_path);
        let standard_prefix = self
            .standard_prefix
            .as_deref()
            .unwrap_or(&config.standard_prefix);
        SchemaSource::new(srcdir.join(schema_root), standard_prefix, self.name.as_str())
    }

    pub fn run(
        &self,
        srcdir: &Path,
        config: &AsdfConfig,
        renderer: &SchemaRenderer,
    ) -> Result<RenderedSchema> {
        let source = self.source(srcdir, config);
        let schema = LoadedSchema::load(&source)?;
        debug!("Rendering schema {}", schema.path.display());

        let title = SchemaNode::new(&schema.tree)
            .get_str("title")
            .map(markdown_to_plain_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.name.clone());

        Ok(RenderedSchema {
            title,
            schema_file: schema.path.clone(),
            document: renderer.render_schema(&schema),
        })
    }
}

/// `asdf` directive: an admonition listing an ASDF file.
#[derive(Debug, Clone)]
pub struct AsdfFileDirective {
    pub filename: String,
    pub show_header: bool,
    pub show_blocks: bool,
}

impl AsdfFileDirective {
    pub fn from_parsed(directive: &ParsedDirective) -> Option<Self> {
        let filename = directive.arguments.first()?.clone();
        let flags = &directive.arguments[1..];
        let has_flag = |flag: &str| flags.iter().any(|f| f == flag);
        Some(Self {
            filename,
            show_header: !has_flag("no_header"),
            show_blocks: !has_flag("no_blocks"),
        })
    }

    /// Relative filenames are resolved against `base_dir`.
    pub fn run(&self, base_dir: &Path) -> Result<DocNode> {
        let path = base_dir.join(&self.filename);
        let file = AsdfFile::open(&path)?;

        let mut admonition = DocNode::new(NodeKind::Admonition {
            title: self.filename.clone(),
        });
        if self.show_header {
            admonition.push(DocNode::literal_block(file.tree_listing(), "yaml"));
        }
        if self.show_blocks {
            for index in 0..file.blocks.len() {
                if let Some(listing) = file.block_listing(index) {
                    admonition.push(DocNode::literal_block(listing, "yaml"));
                }
            }
            if let Some(block_index) = file.block_index() {
                admonition.push(DocNode::literal_block(block_index, "yaml"));
            }
        }
        Ok(admonition)
    }
}

/// Run every `asdf` directive of a document, warning on failures.
pub fn render_asdf_files(directives: &[ParsedDirective], base_dir: &Path) -> Vec<Result<DocNode>> {
    directives
        .iter()
        .filter(|d| d.name == ASDF_FILE_DIRECTIVE)
        .map(|d| {
            AsdfFileDirective::from_parsed(d)
                .ok_or_else(|| {
                    warn!("{}:{}: asdf directive without a filename", d.location.file, d.location.line);
                    AsdfError::malformed(&d.location.file, "asdf directive requires a filename")
                })
                .and_then(|directive| directive.run(base_dir))
        })
        .collect()
}
