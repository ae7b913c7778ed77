//! Invent Builder
//!
//! Generates Python from block documents and packages Invent apps.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use invent_builder::block_codegen::{GeneratorConfig, GeneratorContext};
use invent_builder::block_types::BlockDocument;
use invent_builder::export::{ExportOptions, Exporter};
use invent_builder::project::{DocumentFormat, ProjectLoader, ProjectWatcher};

/// Invent Block Builder
#[derive(Parser, Debug)]
#[command(name = "invent-builder")]
#[command(about = "Generate Python from Invent block documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Python code for a block document
    Generate {
        /// Path to the document
        document: PathBuf,

        /// Read the document as a block editor workspace
        #[arg(long)]
        workspace: bool,

        /// Seed for generated identifiers
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check a block document for integrity and shape problems
    Check {
        /// Path to the document
        document: PathBuf,

        /// Read the document as a block editor workspace
        #[arg(long)]
        workspace: bool,
    },

    /// Convert a document between the flat and workspace formats
    Convert {
        /// Path to the document
        document: PathBuf,

        /// Read the document as a block editor workspace
        #[arg(long)]
        workspace: bool,

        /// Output format
        #[arg(long, value_enum)]
        to: Target,
    },

    /// Print the built-in block palette as JSON
    Palette,

    /// Export a project as a PyScript app
    Export {
        /// Path to the project directory
        #[arg(short, long, default_value = "./project")]
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./dist")]
        out: PathBuf,

        /// Use the runtime from a local checkout
        #[arg(long)]
        local: bool,
    },

    /// Export a project, then export again whenever it changes
    Watch {
        /// Path to the project directory
        #[arg(short, long, default_value = "./project")]
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./dist")]
        out: PathBuf,

        /// Use the runtime from a local checkout
        #[arg(long)]
        local: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    Flat,
    Workspace,
}

impl From<Target> for DocumentFormat {
    fn from(target: Target) -> Self {
        match target {
            Target::Flat => DocumentFormat::Flat,
            Target::Workspace => DocumentFormat::Workspace,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so generated code can be piped
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("invent_builder=info,block_codegen=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let context = GeneratorContext::builtin();

    match args.command {
        Command::Generate {
            document,
            workspace,
            seed,
        } => {
            let doc = read_document(&document, workspace, &context).await?;
            let context = context.with_config(GeneratorConfig::default().with_seed(seed));
            let code = context
                .generate(&doc)
                .with_context(|| format!("Failed to generate code for {}", document.display()))?;
            print!("{}", code.source());
        }

        Command::Check { document, workspace } => {
            let doc = read_document(&document, workspace, &context).await?;
            check(&doc, &context)?;
        }

        Command::Convert {
            document,
            workspace,
            to,
        } => {
            let doc = read_document(&document, workspace, &context).await?;
            let text = DocumentFormat::from(to).render(&doc)?;
            println!("{}", text);
        }

        Command::Palette => {
            println!("{}", serde_json::to_string_pretty(&context.blocks().palette())?);
        }

        Command::Export { project, out, local } => {
            info!("Starting Invent builder v{}", env!("CARGO_PKG_VERSION"));

            let loaded = ProjectLoader::load(&project, context.blocks()).await?;
            info!("Loaded project: {} ({})", loaded.name(), loaded.id());

            let exporter = Exporter::new(context).with_options(ExportOptions { local });
            for path in exporter.export(&loaded, &out).await? {
                info!("  - {}", path.display());
            }
        }

        Command::Watch { project, out, local } => {
            info!("Starting Invent builder v{}", env!("CARGO_PKG_VERSION"));

            let exporter = Exporter::new(context).with_options(ExportOptions { local });
            let watcher = ProjectWatcher::new(&project, &out, exporter)?;
            info!("File watcher started");

            tokio::select! {
                _ = watcher.run() => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!("Failed to listen for Ctrl+C: {}", e);
                    }
                    info!("Received Ctrl+C, shutting down...");
                }
            }
        }
    }

    Ok(())
}

/// Read a document, as a workspace when asked or when the file name says so
async fn read_document(path: &Path, workspace: bool, context: &GeneratorContext) -> Result<BlockDocument> {
    let format = if workspace {
        DocumentFormat::Workspace
    } else {
        DocumentFormat::detect(path)
    };

    let document = ProjectLoader::load_document(path, format, context.blocks())
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(document)
}

/// Report integrity errors (fatal) and shape problems (warnings)
fn check(document: &BlockDocument, context: &GeneratorContext) -> Result<()> {
    if let Err(e) = document.validate() {
        bail!("Document is invalid: {}", e);
    }

    let violations = context.blocks().check_document(document);
    for violation in &violations {
        println!("{}", violation);
    }

    let inert = document.inert_ids();
    if !inert.is_empty() {
        info!("{} blocks are not connected to any root", inert.len());
    }

    println!(
        "{} blocks, {} roots, {} shape problems",
        document.blocks.len(),
        document.roots.len(),
        violations.len()
    );
    Ok(())
}
