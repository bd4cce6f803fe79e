use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use crate::core::{Comparer, Culture, QueryError};
use crate::parser::VariableDecl;
use crate::provider::ProviderFactory;
use super::execution::ExecutionState;
use super::options::OutputOptions;
use super::variables::Variables;
use super::views::{ViewDefinition, ViewSource, Views};

type DirectoryListener = Box<dyn Fn(&Path) + Send + Sync>;

/// Session-wide state that outlives individual queries
pub struct SessionState {
    pub variables: Variables,
    pub views: Views,
    pub output: OutputOptions,
    pub execution: ExecutionState,
    /// Whether `@@Line` reads pre-projection values
    pub use_original_columns: bool,
    current_directory: PathBuf,
    temp_directory: Option<TempDir>,
    comparer: Comparer,
    warnings: Vec<QueryError>,
    directory_listeners: Vec<DirectoryListener>,
}

impl SessionState {
    /// Creates the session and its scratch directory.
    pub fn new(current_directory: PathBuf, comparer: Comparer) -> Result<Self, QueryError> {
        let mut session = Self {
            variables: Variables::new(),
            views: Views::default(),
            output: OutputOptions::default(),
            execution: ExecutionState::new(),
            use_original_columns: true,
            current_directory,
            temp_directory: None,
            comparer,
            warnings: Vec::new(),
            directory_listeners: Vec::new(),
        };
        session.recreate_temp_directory()?;
        Ok(session)
    }

    #[must_use]
    pub fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    /// Changes the current directory and notifies subscribers.
    pub fn set_current_directory(&mut self, directory: PathBuf) {
        if directory == self.current_directory {
            return;
        }
        log::info!("current directory -> {}", directory.display());
        self.current_directory = directory;
        for listener in &self.directory_listeners {
            listener(&self.current_directory);
        }
    }

    pub fn on_directory_changed(&mut self, listener: impl Fn(&Path) + Send + Sync + 'static) {
        self.directory_listeners.push(Box::new(listener));
    }

    #[must_use]
    pub fn temp_directory(&self) -> Option<&Path> {
        self.temp_directory.as_ref().map(TempDir::path)
    }

    pub fn recreate_temp_directory(&mut self) -> Result<(), QueryError> {
        self.remove_temp_directory();
        let dir = tempfile::Builder::new().prefix("logquery-").tempdir()?;
        log::debug!("temp directory {}", dir.path().display());
        self.temp_directory = Some(dir);
        Ok(())
    }

    /// Best effort: a failed delete is logged, never returned.
    pub fn remove_temp_directory(&mut self) {
        if let Some(dir) = self.temp_directory.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("failed to remove temp directory {}: {e}", path.display());
            }
        }
    }

    #[must_use]
    pub const fn comparer(&self) -> &Comparer {
        &self.comparer
    }

    #[must_use]
    pub const fn culture(&self) -> &Culture {
        self.comparer.culture()
    }

    /// Registers a host-implemented view.
    pub fn register_native_view(&mut self, name: &str, factory: Arc<dyn ProviderFactory>) {
        self.views.insert(ViewDefinition {
            name: name.to_string(),
            parameters: Vec::<VariableDecl>::new(),
            source: ViewSource::Native(factory),
        });
    }

    #[must_use]
    pub fn warnings(&self) -> &[QueryError] {
        &self.warnings
    }

    pub fn add_warnings(&mut self, warnings: impl IntoIterator<Item = QueryError>) {
        self.warnings.extend(warnings);
    }

    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    /// Drops variables and views and starts over with a fresh temp directory.
    pub fn reset(&mut self) -> Result<(), QueryError> {
        self.variables.clear();
        self.views.clear();
        self.warnings.clear();
        self.execution.reset();
        self.recreate_temp_directory()
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        self.remove_temp_directory();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session() -> SessionState {
        SessionState::new(PathBuf::from("/tmp"), Comparer::default()).unwrap()
    }

    #[test]
    fn test_temp_directory_lifecycle() {
        let mut session = session();
        let first = session.temp_directory().unwrap().to_path_buf();
        assert!(first.is_dir());

        session.reset().unwrap();
        let second = session.temp_directory().unwrap().to_path_buf();
        assert!(!first.exists());
        assert!(second.is_dir());

        drop(session);
        assert!(!second.exists());
    }

    #[test]
    fn test_directory_change_notifies() {
        let mut session = session();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        session.on_directory_changed(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        session.set_current_directory(PathBuf::from("/var/log"));
        session.set_current_directory(PathBuf::from("/var/log"));
        session.set_current_directory(PathBuf::from("/srv"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.current_directory(), Path::new("/srv"));
    }
}
