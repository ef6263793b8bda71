use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use sphinx_asdf::{render_schema_file, AsdfConfig, AsdfFile, SchemaDocBuilder};

#[derive(Parser)]
#[command(name = "sphinx-asdf")]
#[command(about = "Documentation builder for ASDF schemas")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to sphinx-asdf.{toml,yaml,json} in the source directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate stubs and render every schema page
    Build {
        /// Source directory
        #[arg(default_value = ".")]
        source: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "_build/html")]
        output: PathBuf,
        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Remove the output directory first
        #[arg(long)]
        clean: bool,
    },

    /// Only write stub pages for schemas listed by asdf-autoschemas
    Autogen {
        #[arg(default_value = ".")]
        source: PathBuf,
    },

    /// Render one schema file to a standalone HTML page
    Render {
        schema: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the header, tree and blocks of an ASDF file
    Inspect {
        file: PathBuf,
        #[arg(long)]
        no_header: bool,
        #[arg(long)]
        no_blocks: bool,
    },
}

fn load_config(source: &std::path::Path, explicit: Option<&std::path::Path>) -> Result<AsdfConfig> {
    AsdfConfig::load(source, explicit).context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Build {
            source,
            output,
            jobs,
            clean,
        } => {
            let config = load_config(&source, cli.config.as_deref())?;
            let mut builder = SchemaDocBuilder::new(config, source, output)?;
            if let Some(jobs) = jobs {
                builder.set_parallel_jobs(jobs);
            }
            if clean {
                builder.clean().await?;
            }

            let stats = builder.build().await?;
            info!(
                "{} page(s) from {} source(s), {} stub(s) written, {} label(s)",
                stats.pages_rendered, stats.sources, stats.stubs_written, stats.labels
            );
            if stats.warnings > 0 {
                info!("{} warning(s)", stats.warnings);
            }
            if stats.errors > 0 {
                anyhow::bail!("Build finished with {} error(s)", stats.errors);
            }
        }
        Command::Autogen { source } => {
            let config = load_config(&source, cli.config.as_deref())?;
            let builder = SchemaDocBuilder::new(config, source, PathBuf::from("_build"))?;
            let sources = builder.discover_sources()?;
            let written = builder.generate_stubs(&sources)?;
            for path in &written {
                println!("{}", path.display());
            }
        }
        Command::Render { schema, output } => {
            let base = schema.parent().map(PathBuf::from).unwrap_or_default();
            let config = load_config(&base, cli.config.as_deref())?;
            let html = render_schema_file(&schema, &config)?;
            match output {
                Some(path) => tokio::fs::write(&path, html)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", html),
            }
        }
        Command::Inspect {
            file,
            no_header,
            no_blocks,
        } => {
            let asdf = AsdfFile::open(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            if !no_header {
                print!("{}", asdf.tree_listing());
            }
            if !no_blocks {
                for index in 0..asdf.blocks.len() {
                    if let Some(listing) = asdf.block_listing(index) {
                        print!("{}", listing);
                    }
                }
                if let Some(block_index) = asdf.block_index() {
                    print!("{}", block_index);
                }
            }
        }
    }

    Ok(())
}
