/// Engine orchestration
///
/// An `Engine` owns one `SessionState` for its whole lifetime. Each call to
/// `execute` parses a batch and runs its commands in order, stopping at the
/// first failure.

// Module declarations
pub mod config;
pub mod logfile;

// Re-exports
pub use config::EngineConfig;
pub use logfile::LogFile;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use crate::core::{Comparer, Culture, QueryError};
use crate::executor::{CommandExecutor, CommandOutcome, OutputSink};
use crate::parser::{CommandParser, SqlParser};
use crate::state::{ExecutionState, HeadingMode, OutputOptions, SessionState};

type SharedLogFile = Arc<Mutex<Option<LogFile>>>;

/// Durations of the last `execute` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timings {
    pub parse: Duration,
    pub execute: Duration,
}

pub struct Engine {
    session: SessionState,
    parser: Box<dyn CommandParser>,
    log_file: SharedLogFile,
    timings: Timings,
}

impl Engine {
    /// Creates an engine using the built-in SQL parser.
    pub fn new(config: &EngineConfig) -> Result<Self, QueryError> {
        Self::with_parser(config, Box::new(SqlParser))
    }

    pub fn with_parser(config: &EngineConfig, parser: Box<dyn CommandParser>) -> Result<Self, QueryError> {
        let culture = Culture::from_name(&config.culture)?;
        let directory = match &config.current_directory {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        let mut session = SessionState::new(directory, Comparer::new(culture, config.case_sensitive))?;
        session.output = OutputOptions {
            delimiter: config.delimiter.clone(),
            heading: HeadingMode::from_name(&config.heading)?,
            auto_size: config.auto_size,
        };
        session.use_original_columns = config.use_original_columns;

        let log_file: SharedLogFile = Arc::new(Mutex::new(None));
        if let Some(path) = &config.log_file {
            let opened = LogFile::open(
                resolve(session.current_directory(), path),
                config.log_max_bytes,
                config.log_backups,
            )?;
            *lock(&log_file) = Some(opened);

            // USE moves a relative log file along with the current directory
            let shared = Arc::clone(&log_file);
            let path = path.clone();
            let (max_bytes, backups) = (config.log_max_bytes, config.log_backups);
            session.on_directory_changed(move |dir| {
                let mut guard = lock(&shared);
                if let Some(mut old) = guard.take() {
                    old.close();
                }
                match LogFile::open(resolve(dir, &path), max_bytes, backups) {
                    Ok(reopened) => *guard = Some(reopened),
                    Err(e) => log::warn!("failed to reopen log file in {}: {e}", dir.display()),
                }
            });
        }

        log::info!("engine started in {}", session.current_directory().display());
        Ok(Self {
            session,
            parser,
            log_file,
            timings: Timings::default(),
        })
    }

    /// Parses and runs a batch, writing SELECT rows to `output`.
    pub fn execute(&mut self, text: &str, output: &mut dyn OutputSink) -> Result<Vec<CommandOutcome>, QueryError> {
        self.execute_with_log(text, output, None)
    }

    /// As `execute`, with every output line also sent to `log`.
    ///
    /// Commands that completed before a failure keep their effects.
    pub fn execute_with_log<'o>(
        &mut self,
        text: &str,
        output: &mut dyn OutputSink,
        mut log: Option<&mut (dyn OutputSink + 'o)>,
    ) -> Result<Vec<CommandOutcome>, QueryError> {
        self.session.execution.reset();
        self.session.clear_warnings();
        self.timings = Timings::default();
        self.write_log(text);

        let started = Instant::now();
        let commands = match self.parser.parse(text, &self.session) {
            Ok(commands) => commands,
            Err(e) => {
                self.timings.parse = started.elapsed();
                self.write_log(&format!("ERROR: {e}"));
                return Err(e);
            }
        };
        self.timings.parse = started.elapsed();
        log::debug!("parsed {} command(s) in {:?}", commands.len(), self.timings.parse);

        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in &commands {
            match CommandExecutor::execute(command, &mut self.session, output, log.as_deref_mut()) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    self.timings.execute = started.elapsed();
                    log::debug!("{} failed: {e}", command.kind());
                    self.write_log(&format!("ERROR: {e}"));
                    return Err(e);
                }
            }
        }
        self.timings.execute = started.elapsed();

        for warning in self.session.warnings() {
            log::debug!("warning: {warning}");
        }
        Ok(outcomes)
    }

    /// Requests that the running query stop after the current row.
    pub fn interrupt(&self) {
        self.session.execution.interrupt();
    }

    /// Handle for interrupting from another thread.
    #[must_use]
    pub fn interrupt_handle(&self) -> ExecutionState {
        self.session.execution.clone()
    }

    /// Drops variables and views, recreates the temp directory and clears timings.
    pub fn reset(&mut self) -> Result<(), QueryError> {
        log::info!("engine reset");
        self.timings = Timings::default();
        self.session.reset()
    }

    /// Row-level warnings of the last `execute` call.
    #[must_use]
    pub fn warnings(&self) -> &[QueryError] {
        self.session.warnings()
    }

    #[must_use]
    pub const fn timings(&self) -> Timings {
        self.timings
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Path of the active log file, if one is configured.
    #[must_use]
    pub fn log_file_path(&self) -> Option<PathBuf> {
        lock(&self.log_file).as_ref().map(|f| f.path().to_path_buf())
    }

    fn write_log(&self, text: &str) {
        if let Some(file) = lock(&self.log_file).as_mut()
            && let Err(e) = file.write(text)
        {
            log::warn!("failed to write log file {}: {e}", file.path().display());
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(mut file) = lock(&self.log_file).take() {
            file.close();
        }
        self.session.remove_temp_directory();
        log::info!("engine disposed");
    }
}

fn lock(log_file: &SharedLogFile) -> MutexGuard<'_, Option<LogFile>> {
    log_file.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resolve(directory: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        directory.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> EngineConfig {
        EngineConfig {
            current_directory: Some(dir.path().to_path_buf()),
            heading: "off".into(),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_execute_batch() {
        let dir = TempDir::new().unwrap();
        let mut engine = Engine::new(&config(&dir)).unwrap();
        let mut out: Vec<String> = Vec::new();
        let outcomes = engine
            .execute("DECLARE @x INT; SET @x = 5; SELECT @x * 2", &mut out)
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[2], CommandOutcome::Rows(1));
        assert_eq!(out, vec!["10"]);
    }

    #[test]
    fn test_first_failure_stops_batch() {
        let dir = TempDir::new().unwrap();
        let mut engine = Engine::new(&config(&dir)).unwrap();
        let mut out: Vec<String> = Vec::new();
        let result = engine.execute("DECLARE @a INT; SET @b = 1; DECLARE @c INT", &mut out);
        assert!(matches!(result, Err(QueryError::VariableNotDeclared(_))));
        assert!(engine.session().variables.contains("@a"));
        assert!(!engine.session().variables.contains("@c"));
    }

    #[test]
    fn test_reset_clears_session() {
        let dir = TempDir::new().unwrap();
        let mut engine = Engine::new(&config(&dir)).unwrap();
        let mut out: Vec<String> = Vec::new();
        engine.execute("DECLARE @a INT; CREATE VIEW v AS SELECT 1", &mut out).unwrap();
        let temp = engine.session().temp_directory().unwrap().to_path_buf();

        engine.reset().unwrap();
        assert!(engine.session().variables.is_empty());
        assert!(engine.session().views.is_empty());
        assert!(!temp.exists());
        assert!(engine.session().temp_directory().unwrap().exists());
        engine.execute("DECLARE @a INT", &mut out).unwrap();
    }

    #[test]
    fn test_log_file_follows_current_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut engine = Engine::new(&EngineConfig {
            log_file: Some(PathBuf::from("lq.log")),
            ..config(&dir)
        })
        .unwrap();
        let mut out: Vec<String> = Vec::new();
        engine.execute("SELECT 1", &mut out).unwrap();
        engine.execute("USE 'sub'", &mut out).unwrap();
        engine.execute("SELECT 2", &mut out).unwrap();
        let moved = engine.log_file_path().unwrap();
        drop(engine);

        let first = fs::read_to_string(dir.path().join("lq.log")).unwrap();
        assert!(first.contains("SELECT 1"));
        assert!(first.contains("session closed"));
        assert_eq!(moved.file_name().unwrap(), "lq.log");
        let second = fs::read_to_string(moved).unwrap();
        assert!(second.contains("SELECT 2"));
        assert!(!second.contains("SELECT 1"));
    }

    #[test]
    fn test_errors_are_logged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lq.log");
        let mut engine = Engine::new(&EngineConfig {
            log_file: Some(path.clone()),
            ..config(&dir)
        })
        .unwrap();
        let mut out: Vec<String> = Vec::new();
        assert!(engine.execute("SET @missing = 1", &mut out).is_err());
        drop(engine);
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("ERROR: "));
    }

    #[test]
    fn test_timings_and_warnings_reset_per_execute() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("n.log"), "1\nx\n").unwrap();
        let mut engine = Engine::new(&config(&dir)).unwrap();
        let mut out: Vec<String> = Vec::new();
        engine.execute("SELECT TO_INT(Line) FROM TEXT('n.log')", &mut out).unwrap();
        assert_eq!(engine.warnings().len(), 1);
        engine.execute("SELECT 1", &mut out).unwrap();
        assert!(engine.warnings().is_empty());
        assert!(engine.timings().parse <= Duration::from_secs(5));
    }
}
