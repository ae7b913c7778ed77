//! Project Loader
//!
//! Loads the project manifest and its block documents from disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use block_types::{BlockDocument, BlockRegistry, DocumentError};
use tokio::fs;
use tracing::{debug, info};

use super::config::*;

/// Directory holding the block documents
pub const BLOCKS_DIR: &str = "blocks";

/// Error type for project loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Project path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Project manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Invalid block document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

/// Project loader
pub struct ProjectLoader;

impl ProjectLoader {
    /// Load a project from the given path
    ///
    /// Workspace documents are imported with `registry` so statement inputs
    /// can be told apart from value inputs.
    pub async fn load(path: impl AsRef<Path>, registry: &BlockRegistry) -> Result<Project, LoadError> {
        let path = path.as_ref();

        // Check path exists
        if !path.exists() {
            return Err(LoadError::PathNotFound(path.to_path_buf()));
        }

        info!("Loading project from: {}", path.display());

        let manifest = Self::load_manifest(path).await?;
        info!("Loaded project manifest: {} ({})", manifest.project.name, manifest.project.id);

        let documents = Self::load_documents(path, registry).await?;
        info!("Loaded {} block documents", documents.len());

        Ok(Project {
            path: path.to_path_buf(),
            manifest,
            documents,
        })
    }

    /// Load project.toml
    pub async fn load_manifest(project_path: &Path) -> Result<ProjectManifest, LoadError> {
        let manifest_path = project_path.join("project.toml");
        if !manifest_path.exists() {
            return Err(LoadError::ManifestNotFound(manifest_path));
        }

        let content = fs::read_to_string(&manifest_path).await?;
        let manifest: ProjectManifest = toml::from_str(&content)?;
        Ok(manifest)
    }

    /// Load all documents from the blocks/ directory
    async fn load_documents(
        project_path: &Path,
        registry: &BlockRegistry,
    ) -> Result<BTreeMap<String, ProjectDocument>, LoadError> {
        let blocks_dir = project_path.join(BLOCKS_DIR);
        let mut documents = BTreeMap::new();

        if !blocks_dir.exists() {
            debug!("No blocks directory found");
            return Ok(documents);
        }

        let mut entries = fs::read_dir(&blocks_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            // Only process *.blocks.json and *.workspace.json files
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((name, format)) = DocumentFormat::from_file_name(file_name) else {
                continue;
            };

            let document = Self::load_document(&path, format, registry).await?;
            debug!("Loaded document: {} ({} blocks)", name, document.blocks.len());
            documents.insert(
                name.to_string(),
                ProjectDocument {
                    name: name.to_string(),
                    format,
                    document,
                },
            );
        }

        Ok(documents)
    }

    /// Load a single document file
    pub async fn load_document(
        path: &Path,
        format: DocumentFormat,
        registry: &BlockRegistry,
    ) -> Result<BlockDocument, LoadError> {
        let content = fs::read_to_string(path).await?;
        format
            .parse(&content, registry)
            .map_err(|source| LoadError::InvalidDocument {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Reload a specific document; `None` when it no longer exists
    pub async fn reload_document(
        project_path: &Path,
        name: &str,
        registry: &BlockRegistry,
    ) -> Result<Option<ProjectDocument>, LoadError> {
        for format in [DocumentFormat::Flat, DocumentFormat::Workspace] {
            let path = document_path(project_path, name, format);
            if !path.exists() {
                continue;
            }

            let document = Self::load_document(&path, format, registry).await?;
            return Ok(Some(ProjectDocument {
                name: name.to_string(),
                format,
                document,
            }));
        }

        Ok(None)
    }

    /// Save a document to disk in its own format
    pub async fn save_document(project_path: &Path, document: &ProjectDocument) -> Result<(), LoadError> {
        let path = document_path(project_path, &document.name, document.format);

        // Ensure blocks directory exists
        let blocks_dir = project_path.join(BLOCKS_DIR);
        if !blocks_dir.exists() {
            fs::create_dir_all(&blocks_dir).await?;
        }

        let content = document
            .format
            .render(&document.document)
            .map_err(|source| LoadError::InvalidDocument {
                path: path.clone(),
                source,
            })?;
        fs::write(&path, content).await?;

        debug!("Saved document: {}", document.name);
        Ok(())
    }
}

/// Path of a named document in the given format
pub fn document_path(project_path: &Path, name: &str, format: DocumentFormat) -> PathBuf {
    project_path
        .join(BLOCKS_DIR)
        .join(format!("{}{}", name, format.extension()))
}
