use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::autogen;
use crate::config::AsdfConfig;
use crate::directives::{
    scan_directives, AsdfFileDirective, AutoschemasDirective, AutoschemasOutput, DirectiveMode,
    SchemaDirective, ASDF_FILE_DIRECTIVE, AUTOSCHEMAS_DIRECTIVE, SCHEMA_DIRECTIVE,
};
use crate::html::{HtmlWriter, Highlighter, PageRenderer, CSS_ASSET, JS_ASSET};
use crate::labels::LabelRegistry;
use crate::matching::{self, SourceDocument};
use crate::nodes::{DocNode, NodeKind};
use crate::reference::ReferenceResolver;
use crate::renderer::SchemaRenderer;
use crate::schema::LoadedSchema;

pub const LABELS_FILE: &str = "asdf-labels.json";
pub const INDEX_DOCNAME: &str = "schemas";
const STATIC_DIR: &str = "_static";
const STATIC_ASSETS: [(&str, &str); 2] = [
    (CSS_ASSET, include_str!("../static/sphinx_asdf.css")),
    (JS_ASSET, include_str!("../static/sphinx_asdf.js")),
];

/// A problem attached to one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIssue {
    pub docname: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct BuildStats {
    pub sources: usize,
    pub pages_rendered: usize,
    pub stubs_written: usize,
    pub labels: usize,
    pub errors: usize,
    pub warnings: usize,
    pub build_time: Duration,
    pub error_details: Vec<BuildIssue>,
    pub warning_details: Vec<BuildIssue>,
}

/// A page produced from one source document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub docname: String,
    pub title: String,
    pub document: DocNode,
    pub output_path: PathBuf,
}

pub struct SchemaDocBuilder {
    config: AsdfConfig,
    source_dir: PathBuf,
    output_dir: PathBuf,
    renderer: SchemaRenderer,
    highlighter: Highlighter,
    pages: PageRenderer,
    parallel_jobs: usize,
    warnings: Arc<Mutex<Vec<BuildIssue>>>,
    errors: Arc<Mutex<Vec<BuildIssue>>>,
}

impl SchemaDocBuilder {
    pub fn new(config: AsdfConfig, source_dir: PathBuf, output_dir: PathBuf) -> Result<Self> {
        let parallel_jobs = config.parallel_jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        });
        let renderer = SchemaRenderer::new(ReferenceResolver::new(config.reference_mappings.clone()));
        let highlighter = Highlighter::new(&config.highlight_theme);
        let pages = PageRenderer::new().context("Failed to load page template")?;

        Ok(Self {
            config,
            source_dir,
            output_dir,
            renderer,
            highlighter,
            pages,
            parallel_jobs,
            warnings: Arc::new(Mutex::new(Vec::new())),
            errors: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn set_parallel_jobs(&mut self, jobs: usize) {
        self.parallel_jobs = jobs.max(1);
    }

    pub fn config(&self) -> &AsdfConfig {
        &self.config
    }

    fn add_warning(&self, docname: &str, message: impl Into<String>) {
        let message = message.into();
        warn!("{}: {}", docname, message);
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BuildIssue {
                docname: docname.to_string(),
                message,
            });
    }

    fn add_error(&self, docname: &str, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}: {}", docname, message);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BuildIssue {
                docname: docname.to_string(),
                message,
            });
    }

    pub async fn clean(&self) -> Result<()> {
        if self.output_dir.exists() {
            tokio::fs::remove_dir_all(&self.output_dir)
                .await
                .with_context(|| format!("Failed to remove {}", self.output_dir.display()))?;
        }
        Ok(())
    }

    pub fn discover_sources(&self) -> Result<Vec<SourceDocument>> {
        let sources = matching::find_sources(
            &self.source_dir,
            &self.config,
            std::slice::from_ref(&self.output_dir),
        )
        .with_context(|| format!("Failed to scan {}", self.source_dir.display()))?;
        debug!("Discovered {} source files", sources.len());
        Ok(sources)
    }

    /// Discovery pass: write a stub for every schema listed by an
    /// `asdf-autoschemas` directive that has none yet.
    pub fn generate_stubs(&self, sources: &[SourceDocument]) -> Result<Vec<PathBuf>> {
        let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
        let defs = autogen::discover_schema_defs(&paths, &self.config)
            .context("Failed to read sources for schema discovery")?;
        debug!("Found {} schema definitions", defs.len());
        let written = autogen::write_stubs(&self.source_dir, &defs)
            .context("Failed to write schema stubs")?;
        Ok(written)
    }

    pub async fn build(&self) -> Result<BuildStats> {
        let start_time = Instant::now();
        info!("Starting build process...");

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", self.output_dir.display()))?;

        let mut sources = self.discover_sources()?;
        let stubs = self.generate_stubs(&sources)?;
        if !stubs.is_empty() {
            sources = self.discover_sources()?;
        }
        info!("Discovered {} source files", sources.len());

        let pages = self.render_pages(&sources)?;

        let mut labels = LabelRegistry::new(&self.config.standard_prefix);
        for page in &pages {
            labels.register_document(&page.docname, &page.document);
        }
        let labels_json = labels.to_json()?;
        tokio::fs::write(self.output_dir.join(LABELS_FILE), labels_json)
            .await
            .context("Failed to write label inventory")?;

        self.write_schema_index(&sources).await?;
        self.copy_static_assets().await?;

        let build_time = start_time.elapsed();
        let warnings = self.warnings.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let errors = self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone();

        let stats = BuildStats {
            sources: sources.len(),
            pages_rendered: pages.len(),
            stubs_written: stubs.len(),
            labels: labels.len(),
            errors: errors.len(),
            warnings: warnings.len(),
            build_time,
            error_details: errors,
            warning_details: warnings,
        };

        info!("Build completed in {:?}", build_time);
        Ok(stats)
    }

    /// Build pass: render every document holding schema or file directives.
    fn render_pages(&self, sources: &[SourceDocument]) -> Result<Vec<RenderedPage>> {
        info!(
            "Rendering {} sources with {} parallel jobs",
            sources.len(),
            self.parallel_jobs
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_jobs)
            .build()?;

        let pages: Vec<RenderedPage> = pool.install(|| {
            sources
                .par_iter()
                .filter_map(|source| match self.render_source(source) {
                    Ok(page) => page,
                    Err(e) => {
                        self.add_error(&source.docname, format!("{:#}", e));
                        None
                    }
                })
                .collect()
        });

        Ok(pages)
    }

    fn render_source(&self, source: &SourceDocument) -> Result<Option<RenderedPage>> {
        let content = std::fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read source file: {}", source.path.display()))?;
        let file = source.path.to_string_lossy();
        let base_dir = source.path.parent().unwrap_or(self.source_dir.as_path());

        let mut body = DocNode::compound(Vec::new());
        let mut title = None;

        for directive in scan_directives(&content, &file) {
            match directive.name.as_str() {
                SCHEMA_DIRECTIVE => {
                    let Some(schema) = SchemaDirective::from_parsed(&directive) else {
                        self.add_warning(
                            &source.docname,
                            format!("line {}: asdf-schema without a schema name", directive.location.line),
                        );
                        continue;
                    };
                    let rendered = schema
                        .run(&self.source_dir, &self.config, &self.renderer)
                        .with_context(|| format!("Failed to render schema '{}'", schema.name))?;
                    title.get_or_insert(rendered.title);
                    body.push(rendered.document);
                }
                ASDF_FILE_DIRECTIVE => {
                    let Some(asdf) = AsdfFileDirective::from_parsed(&directive) else {
                        self.add_warning(
                            &source.docname,
                            format!("line {}: asdf directive without a filename", directive.location.line),
                        );
                        continue;
                    };
                    let listing = asdf
                        .run(base_dir)
                        .with_context(|| format!("Failed to read ASDF file '{}'", asdf.filename))?;
                    body.push(listing);
                }
                _ => {}
            }
        }

        if body.children.is_empty() {
            return Ok(None);
        }

        let title = title.unwrap_or_else(|| source.docname.clone());
        let output_path = self.output_dir.join(format!("{}.html", source.docname));
        let html = self
            .pages
            .render_page(&source.docname, &title, &HtmlWriter::render(&self.highlighter, &body))?;
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
        std::fs::write(&output_path, html)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
        debug!("Wrote {}", output_path.display());

        Ok(Some(RenderedPage {
            docname: source.docname.clone(),
            title,
            document: body,
            output_path,
        }))
    }

    /// `schemas.html`: the toctrees of every `asdf-autoschemas` directive,
    /// grouped by the document declaring them.
    async fn write_schema_index(&self, sources: &[SourceDocument]) -> Result<()> {
        if sources.iter().any(|s| s.docname == INDEX_DOCNAME) {
            self.add_warning(
                INDEX_DOCNAME,
                format!("source document '{}' exists; schema index not written", INDEX_DOCNAME),
            );
            return Ok(());
        }

        let mut index = DocNode::new(NodeKind::SchemaDoc);

        for source in sources {
            let content = tokio::fs::read_to_string(&source.path)
                .await
                .with_context(|| format!("Failed to read source file: {}", source.path.display()))?;
            let toctrees: Vec<DocNode> = scan_directives(&content, &source.docname)
                .iter()
                .filter(|d| d.name == AUTOSCHEMAS_DIRECTIVE)
                .filter_map(|d| {
                    match AutoschemasDirective::from_parsed(d).run(DirectiveMode::Build, &self.config) {
                        AutoschemasOutput::Toctree(node) => Some(node),
                        AutoschemasOutput::Definitions(_) => None,
                    }
                })
                .collect();
            if toctrees.is_empty() {
                continue;
            }
            index.push(DocNode::new(NodeKind::SectionHeader {
                text: source.docname.clone(),
            }));
            index.extend(toctrees);
        }

        if index.children.is_empty() {
            return Ok(());
        }

        let body = HtmlWriter::render(&self.highlighter, &index);
        let html = self.pages.render_page(INDEX_DOCNAME, "Schemas", &body)?;
        tokio::fs::write(self.output_dir.join(format!("{}.html", INDEX_DOCNAME)), html)
            .await
            .context("Failed to write schema index")?;
        Ok(())
    }

    async fn copy_static_assets(&self) -> Result<()> {
        info!("Copying static assets");
        let static_dir = self.output_dir.join(STATIC_DIR);
        tokio::fs::create_dir_all(&static_dir)
            .await
            .with_context(|| format!("Failed to create static directory: {}", static_dir.display()))?;

        for (name, contents) in STATIC_ASSETS {
            tokio::fs::write(static_dir.join(name), contents)
                .await
                .with_context(|| format!("Failed to write static asset {}", name))?;
        }
        Ok(())
    }
}

/// Render a single schema file to a standalone HTML page.
pub fn render_schema_file(path: &Path, config: &AsdfConfig) -> Result<String> {
    let schema = LoadedSchema::load_path(path)
        .with_context(|| format!("Failed to load schema {}", path.display()))?;
    let renderer = SchemaRenderer::new(ReferenceResolver::new(config.reference_mappings.clone()));
    let highlighter = Highlighter::new(&config.highlight_theme);
    let document = renderer.render_schema(&schema);

    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let body = HtmlWriter::render(&highlighter, &document);
    Ok(PageRenderer::new()?.render_page("", &title, &body)?)
}
