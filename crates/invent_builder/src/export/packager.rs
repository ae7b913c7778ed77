//! Export Packager
//!
//! Turns a loaded project into the three files of a PyScript app and writes
//! them to an output directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use block_codegen::{GenerateError, GeneratorContext};
use tokio::fs;
use tracing::{debug, info};

use super::templates;
use crate::project::Project;

/// Error type for exporting
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write file: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to read UI file {path}: {source}")]
    UiReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to generate code for document '{document}' (block '{}'): {source}", .source.block_id())]
    GenerationError {
        document: String,
        #[source]
        source: GenerateError,
    },

    #[error("Documents '{first}' and '{second}' both define '{name}'")]
    DuplicateDeclaration { name: String, first: String, second: String },
}

/// Export options that override the project manifest
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Use the runtime from a local checkout
    pub local: bool,
}

/// File contents of an exported app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub index_html: String,
    pub main_py: String,
    pub pyscript_toml: String,
}

impl Bundle {
    pub fn files(&self) -> [(&'static str, &str); 3] {
        [
            ("index.html", self.index_html.as_str()),
            ("main.py", self.main_py.as_str()),
            ("pyscript.toml", self.pyscript_toml.as_str()),
        ]
    }
}

/// Builds and writes PyScript bundles
#[derive(Debug, Clone)]
pub struct Exporter {
    context: GeneratorContext,
    options: ExportOptions,
}

impl Exporter {
    /// Create an exporter around a context holding the block rules
    pub fn new(context: GeneratorContext) -> Self {
        Self {
            context,
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// Generate the code of every document, in name order. Hoisted names
    /// share one module, so they must be distinct across documents.
    pub fn generate_code(&self, project: &Project) -> Result<String, ExportError> {
        let config = project.manifest.generator.to_config();
        let project_seed = config.seed;
        let mut context = self.context.clone().with_config(config);

        let mut sources = Vec::new();
        let mut declared: HashMap<String, String> = HashMap::new();
        for (name, document) in &project.documents {
            context.config_mut().seed = project_seed.map(|seed| document_seed(seed, name));
            let code = context
                .generate(&document.document)
                .map_err(|source| ExportError::GenerationError {
                    document: name.clone(),
                    source,
                })?;
            debug!("Generated document {} ({} declarations)", name, code.declarations.len());

            for declaration in &code.declarations {
                if let Some(first) = declared.insert(declaration.name.clone(), name.clone()) {
                    return Err(ExportError::DuplicateDeclaration {
                        name: declaration.name.clone(),
                        first,
                        second: name.clone(),
                    });
                }
            }

            let source = code.source();
            if !source.is_empty() {
                sources.push(source);
            }
        }

        Ok(sources.join("\n"))
    }

    /// Build the bundle for a project
    pub async fn build(&self, project: &Project) -> Result<Bundle, ExportError> {
        let export = &project.manifest.export;

        let app = match project.ui_path() {
            Some(path) => fs::read_to_string(&path)
                .await
                .map_err(|source| ExportError::UiReadError { path, source })?,
            None => templates::empty_app(project.name()),
        };

        let main_py = templates::main_py(&project.datastore_defaults(), &self.generate_code(project)?, &app);

        let invent_src = if self.options.local || export.local {
            templates::LOCAL_INVENT_SRC
        } else {
            export.invent_src.as_deref().unwrap_or(templates::HOSTED_INVENT_SRC)
        };

        Ok(Bundle {
            index_html: templates::index_html(&export.pyscript_version, &export.stylesheet),
            main_py,
            pyscript_toml: templates::pyscript_toml(invent_src),
        })
    }

    /// Write a bundle into `out_dir`, creating it if needed
    pub async fn write(bundle: &Bundle, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(out_dir).await?;

        let mut written = Vec::new();
        for (name, content) in bundle.files() {
            let path = out_dir.join(name);
            fs::write(&path, content).await?;
            written.push(path);
        }
        Ok(written)
    }

    /// Build and write a project's bundle
    pub async fn export(&self, project: &Project, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let bundle = self.build(project).await?;
        let written = Self::write(&bundle, out_dir).await?;

        info!(
            "Exported {} ({} documents) to {}",
            project.name(),
            project.documents.len(),
            out_dir.display()
        );
        Ok(written)
    }
}

/// Identifier seed for one document: the project seed mixed with the
/// document name (FNV-1a), so documents sharing a seed draw different names
fn document_seed(seed: u64, document: &str) -> u64 {
    document
        .bytes()
        .fold(seed ^ 0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{DocumentFormat, ProjectDocument, ProjectLoader};
    use block_types::{BlockDocument, BlockInstance};
    use tempfile::TempDir;

    fn exporter() -> Exporter {
        Exporter::new(GeneratorContext::builtin())
    }

    async fn create_test_project(ui: bool) -> TempDir {
        let dir = TempDir::new().unwrap();
        let path = dir.path();

        let mut manifest = String::from(
            r#"
[project]
id = "farmyard"
name = "Farmyard"

[generator]
seed = 42

[datastore]
number_of_honks = 0
"#,
        );
        if ui {
            manifest.push_str("\n[export]\nui = \"ui.py\"\n");
            fs::write(path.join("ui.py"), "App(name='Farmyard', content=[Page(name='Honk')])\n")
                .await
                .unwrap();
        }
        fs::write(path.join("project.toml"), manifest).await.unwrap();

        let mut honk = BlockDocument::new();
        honk.add_block(BlockInstance::with_id("sub", "channels_subscribe").field("channel", "honk").field("subjects", "press"))
            .add_root("sub");
        let mut speech = BlockDocument::new();
        speech
            .add_block(BlockInstance::with_id("say", "say").input("text", "t"))
            .add_block(BlockInstance::with_id("t", "inline_string").field("value", "hello"))
            .add_root("say");

        for (name, document) in [("honk", honk), ("speech", speech)] {
            let doc = ProjectDocument {
                name: name.to_string(),
                format: DocumentFormat::Flat,
                document,
            };
            ProjectLoader::save_document(path, &doc).await.unwrap();
        }

        dir
    }

    async fn load(dir: &TempDir) -> Project {
        ProjectLoader::load(dir.path(), GeneratorContext::builtin().blocks())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_main_py_contents() {
        let dir = create_test_project(false).await;
        let project = load(&dir).await;
        let bundle = exporter().build(&project).await.unwrap();

        let main = &bundle.main_py;
        assert!(main.starts_with("import invent\nfrom invent.ui import *\n"));
        assert!(main.contains("invent.datastore.setdefault(\"number_of_honks\", 0)\n"));
        assert!(main.contains("App(\n    name='Farmyard',"));

        // Hoisted handler before its registration, documents in name order
        let def = main.find("def subscribe_").unwrap();
        let registration = main.find("invent.subscribe(subscribe_").unwrap();
        let say = main.find("invent.say(\"hello\")").unwrap();
        assert!(def < registration && registration < say);
    }

    #[tokio::test]
    async fn test_export_is_reproducible_with_seed() {
        let dir = create_test_project(false).await;
        let project = load(&dir).await;

        let first = exporter().build(&project).await.unwrap();
        let second = exporter().build(&project).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ui_file_and_local_runtime() {
        let dir = create_test_project(true).await;
        let project = load(&dir).await;

        let bundle = exporter()
            .with_options(ExportOptions { local: true })
            .build(&project)
            .await
            .unwrap();

        assert!(bundle.main_py.contains("App(name='Farmyard', content=[Page(name='Honk')])"));
        assert!(bundle.pyscript_toml.contains(&format!("\"{{INVENT}}\" = \"{}\"", templates::LOCAL_INVENT_SRC)));

        let hosted = exporter().build(&project).await.unwrap();
        assert!(hosted.pyscript_toml.contains(templates::HOSTED_INVENT_SRC));
    }

    #[tokio::test]
    async fn test_missing_ui_file() {
        let dir = create_test_project(true).await;
        fs::remove_file(dir.path().join("ui.py")).await.unwrap();
        let project = load(&dir).await;

        let result = exporter().build(&project).await;
        assert!(matches!(result, Err(ExportError::UiReadError { .. })));
    }

    #[tokio::test]
    async fn test_write_bundle() {
        let dir = create_test_project(false).await;
        let out = TempDir::new().unwrap();
        let project = load(&dir).await;

        let written = exporter().export(&project, &out.path().join("dist")).await.unwrap();
        assert_eq!(written.len(), 3);
        for name in ["index.html", "main.py", "pyscript.toml"] {
            assert!(out.path().join("dist").join(name).exists());
        }
    }

    fn insert_document(project: &mut Project, name: &str, document: BlockDocument) {
        project.documents.insert(
            name.to_string(),
            ProjectDocument {
                name: name.to_string(),
                format: DocumentFormat::Flat,
                document,
            },
        );
    }

    /// `widgets_when` handler saying a summary of `files`
    fn summarizing_handler(files: &str) -> BlockDocument {
        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("when", "widgets_when").statement("function_body", "say"))
            .add_block(BlockInstance::with_id("say", "say").input("text", "sum"))
            .add_block(BlockInstance::with_id("sum", "summarize").input("files", "files"))
            .add_block(BlockInstance::with_id("files", "inline_string").field("value", files))
            .add_root("when");
        doc
    }

    #[tokio::test]
    async fn test_documents_sharing_a_seed_get_distinct_helpers() {
        let dir = create_test_project(false).await;
        let mut project = load(&dir).await;
        insert_document(&mut project, "a", summarizing_handler("a.txt"));
        insert_document(&mut project, "b", summarizing_handler("b.txt"));

        let code = exporter().generate_code(&project).unwrap();

        let helpers: Vec<&str> = code
            .lines()
            .filter_map(|line| line.strip_prefix("async def summarize_"))
            .collect();
        assert_eq!(helpers.len(), 2);
        assert_ne!(helpers[0], helpers[1]);

        // Still reproducible under the project seed
        assert_eq!(code, exporter().generate_code(&project).unwrap());
    }

    #[tokio::test]
    async fn test_same_function_in_two_documents_fails() {
        let dir = create_test_project(false).await;
        let mut project = load(&dir).await;
        for name in ["a", "b"] {
            let mut doc = BlockDocument::new();
            doc.add_block(BlockInstance::with_id("def", "functions_define").field("function_name", "honk"))
                .add_root("def");
            insert_document(&mut project, name, doc);
        }

        match exporter().generate_code(&project) {
            Err(ExportError::DuplicateDeclaration { name, first, second }) => {
                assert_eq!(name, "honk");
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("expected duplicate declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_document_seed_depends_on_name() {
        assert_ne!(document_seed(42, "a"), document_seed(42, "b"));
        assert_ne!(document_seed(1, "a"), document_seed(2, "a"));
        assert_eq!(document_seed(42, "a"), document_seed(42, "a"));
    }

    #[tokio::test]
    async fn test_generation_error_names_document() {
        let dir = create_test_project(false).await;
        let mut project = load(&dir).await;

        let mut broken = BlockDocument::new();
        broken.add_block(BlockInstance::with_id("x", "not_a_real_type")).add_root("x");
        project.documents.insert(
            "broken".to_string(),
            ProjectDocument {
                name: "broken".to_string(),
                format: DocumentFormat::Flat,
                document: broken,
            },
        );

        match exporter().build(&project).await {
            Err(ExportError::GenerationError { document, source }) => {
                assert_eq!(document, "broken");
                assert_eq!(source.block_id(), "x");
            }
            other => panic!("expected generation error, got {:?}", other),
        }
    }
}
