//! Project Configuration Types
//!
//! Defines the structure of project files on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use block_codegen::{GeneratorConfig, quote};
use block_types::{BlockDocument, BlockRegistry, DocumentError};
use serde::{Deserialize, Serialize};

/// Runtime version pinned by exported apps
pub const DEFAULT_PYSCRIPT_VERSION: &str = "2024.1.1";

/// Stylesheet linked by exported apps
pub const DEFAULT_STYLESHEET: &str = "https://unpkg.com/papercss@1.9.2/dist/paper.min.css";

/// Project manifest (project.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub project: ProjectInfo,
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub export: ExportConfig,
    /// Initial datastore values
    #[serde(default)]
    pub datastore: toml::Table,
}

/// Project information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub description: Option<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Code generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Spaces per indentation level
    #[serde(default = "default_indent")]
    pub indent: usize,
    /// Fixes generated identifier suffixes
    pub seed: Option<u64>,
    /// Statement placed at the top of every loop body
    pub loop_trap: Option<String>,
}

fn default_indent() -> usize {
    4
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            seed: None,
            loop_trap: None,
        }
    }
}

impl GeneratorSettings {
    pub fn to_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_indent_width(self.indent)
            .with_seed(self.seed)
            .with_loop_trap(self.loop_trap.clone())
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where the exported app fetches the runtime from
    pub invent_src: Option<String>,
    /// Use the runtime from a local checkout
    #[serde(default)]
    pub local: bool,
    #[serde(default = "default_pyscript_version")]
    pub pyscript_version: String,
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,
    /// Python file with the app's user interface, relative to the project
    pub ui: Option<PathBuf>,
}

fn default_pyscript_version() -> String {
    DEFAULT_PYSCRIPT_VERSION.to_string()
}

fn default_stylesheet() -> String {
    DEFAULT_STYLESHEET.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            invent_src: None,
            local: false,
            pyscript_version: default_pyscript_version(),
            stylesheet: default_stylesheet(),
            ui: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Documents
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk format of a block document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Flat document (`*.blocks.json`)
    Flat,
    /// Block editor workspace (`*.workspace.json`)
    Workspace,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Flat => ".blocks.json",
            DocumentFormat::Workspace => ".workspace.json",
        }
    }

    /// Split a file name into document name and format
    pub fn from_file_name(file_name: &str) -> Option<(&str, DocumentFormat)> {
        [DocumentFormat::Flat, DocumentFormat::Workspace]
            .into_iter()
            .find_map(|format| {
                file_name
                    .strip_suffix(format.extension())
                    .filter(|name| !name.is_empty())
                    .map(|name| (name, format))
            })
    }

    /// Format of a path, defaulting to flat for unknown names
    pub fn detect(path: &Path) -> DocumentFormat {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_file_name)
            .map(|(_, format)| format)
            .unwrap_or(DocumentFormat::Flat)
    }

    /// Parse document text. Workspaces need the registry to classify inputs.
    pub fn parse(&self, text: &str, registry: &BlockRegistry) -> Result<BlockDocument, DocumentError> {
        match self {
            DocumentFormat::Flat => block_types::deserialize(text),
            DocumentFormat::Workspace => block_types::import_workspace_str(text, registry),
        }
    }

    pub fn render(&self, document: &BlockDocument) -> Result<String, DocumentError> {
        match self {
            DocumentFormat::Flat => block_types::serialize(document),
            DocumentFormat::Workspace => block_types::export_workspace_string(document),
        }
    }
}

/// A block document loaded from the project's blocks/ directory
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    pub name: String,
    pub format: DocumentFormat,
    pub document: BlockDocument,
}

/// Loaded project with all documents
#[derive(Debug, Clone)]
pub struct Project {
    /// Project root path
    pub path: PathBuf,
    /// Project manifest
    pub manifest: ProjectManifest,
    /// Block documents by name
    pub documents: BTreeMap<String, ProjectDocument>,
}

impl Project {
    /// Get project ID
    pub fn id(&self) -> &str {
        &self.manifest.project.id
    }

    /// Get project name
    pub fn name(&self) -> &str {
        &self.manifest.project.name
    }

    /// Get a document by name
    pub fn get_document(&self, name: &str) -> Option<&ProjectDocument> {
        self.documents.get(name)
    }

    /// Absolute path of the configured UI file
    pub fn ui_path(&self) -> Option<PathBuf> {
        self.manifest.export.ui.as_ref().map(|ui| self.path.join(ui))
    }

    /// `invent.datastore.setdefault(...)` lines for the initial datastore values
    pub fn datastore_defaults(&self) -> String {
        self.manifest
            .datastore
            .iter()
            .map(|(key, value)| format!("invent.datastore.setdefault({}, {})\n", quote(key), python_literal(value)))
            .collect()
    }
}

/// Render a TOML value as a Python literal
pub fn python_literal(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => quote(s),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) if f.is_nan() => "float(\"nan\")".to_string(),
        toml::Value::Float(f) if f.is_infinite() => {
            if f.is_sign_positive() { "float(\"inf\")".to_string() } else { "float(\"-inf\")".to_string() }
        }
        toml::Value::Float(f) if f.fract() == 0.0 => format!("{:.1}", f),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(true) => "True".to_string(),
        toml::Value::Boolean(false) => "False".to_string(),
        toml::Value::Datetime(d) => quote(&d.to_string()),
        toml::Value::Array(items) => {
            let items: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", items.join(", "))
        }
        toml::Value::Table(table) => {
            let entries: Vec<String> = table
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), python_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
