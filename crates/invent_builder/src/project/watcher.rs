//! Project File Watcher
//!
//! Watches project files for changes and re-exports the app.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::config::{DocumentFormat, Project, ProjectDocument};
use super::loader::{BLOCKS_DIR, LoadError, ProjectLoader};
use crate::export::Exporter;

/// File change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// The project manifest was modified
    ManifestChanged,
    /// The UI file was modified
    UiChanged,
    /// A block document was created, modified or removed
    DocumentChanged(String),
}

/// Project file watcher
pub struct ProjectWatcher {
    /// Path to the project
    project_path: PathBuf,
    /// Where bundles are written
    out_dir: PathBuf,
    exporter: Exporter,
    /// Last successfully loaded project
    project: Option<Project>,
    /// Channel receiver for changed paths, relative to the project
    rx: mpsc::Receiver<PathBuf>,
    /// The underlying watcher (kept alive)
    _watcher: RecommendedWatcher,
}

impl ProjectWatcher {
    /// Create a new project watcher
    pub fn new(
        project_path: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
        exporter: Exporter,
    ) -> Result<Self, notify::Error> {
        // Canonicalize the path to get absolute path for reliable comparison
        let project_path = project_path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| project_path.as_ref().to_path_buf());
        let (tx, rx) = mpsc::channel(100);

        let project_path_clone = project_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if let Some(path) = Self::event_path(&project_path_clone, &event) {
                    let _ = tx.blocking_send(path);
                }
            }
            Err(e) => {
                error!("File watcher error: {}", e);
            }
        })?;

        // Watch the project directory
        watcher.watch(&project_path, RecursiveMode::Recursive)?;
        info!("Watching project directory: {}", project_path.display());

        Ok(Self {
            project_path,
            out_dir: out_dir.as_ref().to_path_buf(),
            exporter,
            project: None,
            rx,
            _watcher: watcher,
        })
    }

    /// Path of a notify event relative to the project root
    fn event_path(project_path: &Path, event: &Event) -> Option<PathBuf> {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {}
            _ => {
                debug!("Ignoring event kind: {:?}", event.kind);
                return None;
            }
        }

        let path = event.paths.first()?;
        path.strip_prefix(project_path).ok().map(Path::to_path_buf)
    }

    /// Decide what a changed path (relative to the project root) means
    pub fn classify(rel_path: &Path, ui_path: Option<&Path>) -> Option<FileChange> {
        if rel_path == Path::new("project.toml") {
            return Some(FileChange::ManifestChanged);
        }

        if ui_path == Some(rel_path) {
            return Some(FileChange::UiChanged);
        }

        if rel_path.parent() == Some(Path::new(BLOCKS_DIR)) {
            let file_name = rel_path.file_name()?.to_str()?;
            let (name, _) = DocumentFormat::from_file_name(file_name)?;
            return Some(FileChange::DocumentChanged(name.to_string()));
        }

        None
    }

    /// Export once, then again after every relevant change
    pub async fn run(mut self) {
        info!("Starting file watcher loop");
        self.reload_project().await;
        self.export().await;

        while let Some(path) = self.rx.recv().await {
            // Editors often write several events per save; one rebuild covers them
            let mut changes = Vec::new();
            let mut next = Some(path);
            while let Some(path) = next {
                if let Some(change) = Self::classify(&path, self.ui_path()) {
                    if !changes.contains(&change) {
                        changes.push(change);
                    }
                }
                next = self.rx.try_recv().ok();
            }

            if changes.is_empty() {
                continue;
            }
            for change in &changes {
                info!("Project changed: {:?}", change);
            }

            let documents_only = changes.iter().all(|c| matches!(c, FileChange::DocumentChanged(_)));
            if documents_only && self.project.is_some() {
                for change in &changes {
                    if let FileChange::DocumentChanged(name) = change {
                        self.reload_document(name).await;
                    }
                }
            } else {
                self.reload_project().await;
            }
            self.export().await;
        }

        info!("File watcher loop ended");
    }

    /// UI file of the last loaded manifest, relative to the project
    fn ui_path(&self) -> Option<&Path> {
        self.project.as_ref()?.manifest.export.ui.as_deref()
    }

    /// Load the whole project again; on failure the previous one is kept
    async fn reload_project(&mut self) {
        match ProjectLoader::load(&self.project_path, self.exporter.context().blocks()).await {
            Ok(project) => self.project = Some(project),
            Err(e) => error!("Failed to reload project: {}", e),
        }
    }

    /// Reload one document into the loaded project
    async fn reload_document(&mut self, name: &str) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let result = ProjectLoader::reload_document(&self.project_path, name, self.exporter.context().blocks()).await;
        apply_reload(project, name, result);
    }

    /// Export the loaded project
    async fn export(&self) {
        let Some(project) = &self.project else {
            return;
        };
        if let Err(e) = self.exporter.export(project, &self.out_dir).await {
            error!("Failed to export project: {}", e);
        }
    }
}

/// Apply the outcome of reloading one document: replace it, drop it when its
/// file is gone, or keep the old version when it no longer parses
fn apply_reload(project: &mut Project, name: &str, result: Result<Option<ProjectDocument>, LoadError>) {
    match result {
        Ok(Some(document)) => {
            debug!("Reloaded document: {}", name);
            project.documents.insert(name.to_string(), document);
        }
        Ok(None) => {
            info!("Document removed: {}", name);
            project.documents.remove(name);
        }
        Err(e) => error!("Failed to reload document {}: {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_codegen::GeneratorContext;
    use block_types::{BlockDocument, BlockInstance};
    use tempfile::TempDir;
    use tokio::fs;

    fn classify(path: &str) -> Option<FileChange> {
        ProjectWatcher::classify(Path::new(path), Some(Path::new("ui/app.py")))
    }

    #[test]
    fn test_classify_paths() {
        assert_eq!(classify("project.toml"), Some(FileChange::ManifestChanged));
        assert_eq!(
            classify("blocks/main.workspace.json"),
            Some(FileChange::DocumentChanged("main".to_string()))
        );
        assert_eq!(
            classify("blocks/speech.blocks.json"),
            Some(FileChange::DocumentChanged("speech".to_string()))
        );
        assert_eq!(classify("ui/app.py"), Some(FileChange::UiChanged));
        assert_eq!(classify("blocks/notes.txt"), None);
    }

    #[test]
    fn test_exported_files_are_ignored() {
        // An output directory inside the project must not retrigger a rebuild
        assert_eq!(classify("dist/main.py"), None);
        assert_eq!(classify("dist/index.html"), None);
        assert_eq!(ProjectWatcher::classify(Path::new("ui.py"), None), None);
    }

    async fn project_with_document() -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("project.toml"), "[project]\nid = \"geese\"\nname = \"Geese\"\n")
            .await
            .unwrap();

        let mut doc = BlockDocument::new();
        doc.add_block(BlockInstance::with_id("say", "say")).add_root("say");
        let document = ProjectDocument {
            name: "speech".to_string(),
            format: DocumentFormat::Flat,
            document: doc,
        };
        ProjectLoader::save_document(dir.path(), &document).await.unwrap();

        let project = ProjectLoader::load(dir.path(), GeneratorContext::builtin().blocks())
            .await
            .unwrap();
        (dir, project)
    }

    async fn reload(dir: &TempDir, project: &mut Project, name: &str) {
        let result = ProjectLoader::reload_document(dir.path(), name, GeneratorContext::builtin().blocks()).await;
        apply_reload(project, name, result);
    }

    #[tokio::test]
    async fn test_document_change_updates_project() {
        let (dir, mut project) = project_with_document().await;

        let mut changed = project.get_document("speech").unwrap().clone();
        changed.document.add_block(BlockInstance::with_id("listen", "listen")).add_root("listen");
        ProjectLoader::save_document(dir.path(), &changed).await.unwrap();

        reload(&dir, &mut project, "speech").await;
        assert!(project.get_document("speech").unwrap().document.structurally_eq(&changed.document));
    }

    #[tokio::test]
    async fn test_removed_document_is_dropped_and_broken_one_kept() {
        let (dir, mut project) = project_with_document().await;
        let path = dir.path().join("blocks/speech.blocks.json");

        fs::write(&path, "{ not json").await.unwrap();
        reload(&dir, &mut project, "speech").await;
        assert!(project.get_document("speech").is_some());

        fs::remove_file(&path).await.unwrap();
        reload(&dir, &mut project, "speech").await;
        assert!(project.get_document("speech").is_none());
    }
}
