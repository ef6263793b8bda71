//! sphinx-asdf
//!
//! Documentation builder for ASDF schemas: renders schema files into
//! navigable HTML pages, generates stub pages for listed schemas and lists
//! the contents of ASDF files.

pub mod asdf_file;
pub mod autogen;
pub mod builder;
pub mod config;
pub mod directives;
pub mod error;
pub mod html;
pub mod labels;
pub mod markup;
pub mod matching;
pub mod nodes;
pub mod path;
pub mod reference;
pub mod renderer;
pub mod schema;

pub use asdf_file::AsdfFile;
pub use builder::{render_schema_file, BuildIssue, BuildStats, SchemaDocBuilder};
pub use config::AsdfConfig;
pub use directives::{DirectiveMode, SchemaDef};
pub use error::{AsdfError, Result};
pub use html::{HtmlWriter, Highlighter, PageRenderer};
pub use labels::LabelRegistry;
pub use nodes::{DocNode, NodeKind, Visitor};
pub use reference::{ReferenceMapping, ReferenceResolver, ResolvedReference};
pub use renderer::{Example, SchemaRenderer};
pub use schema::{LoadedSchema, SchemaNode, SchemaSource};
