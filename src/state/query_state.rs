use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use crate::core::{Comparer, Culture, QueryError};
use super::execution::ExecutionState;
use super::session::SessionState;
use super::variables::Variables;

/// Identity of one node in one expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinKey {
    pub tree: u64,
    pub node: usize,
}

/// Per-execution memo cache keyed by expression node.
#[derive(Default)]
pub struct StateBin {
    entries: HashMap<BinKey, Box<dyn Any>>,
}

impl StateBin {
    #[must_use]
    pub fn get<T: 'static>(&self, key: BinKey) -> Option<&T> {
        self.entries.get(&key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn insert<T: 'static>(&mut self, key: BinKey, value: T) {
        self.entries.insert(key, Box::new(value));
    }

    #[must_use]
    pub fn contains(&self, key: BinKey) -> bool {
        self.entries.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for StateBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBin").field("entries", &self.entries.len()).finish()
    }
}

/// Context of one query execution. Providers and expressions receive it on
/// every call; the row being evaluated is passed alongside it.
#[derive(Debug)]
pub struct QueryState {
    pub current_directory: PathBuf,
    pub temp_directory: Option<PathBuf>,
    pub execution: ExecutionState,
    pub variables: Variables,
    pub comparer: Comparer,
    /// Rows delivered so far by the outermost provider
    pub total_line_number: u64,
    pub use_original_columns: bool,
    /// Set when the current row must be dropped without failing the query
    pub skip_line: bool,
    pub bin: StateBin,
    warnings: Vec<QueryError>,
}

impl QueryState {
    /// State for a top-level query. Variables are shared with the session.
    #[must_use]
    pub fn new(session: &SessionState) -> Self {
        Self {
            current_directory: session.current_directory().to_path_buf(),
            temp_directory: session.temp_directory().map(std::path::Path::to_path_buf),
            execution: session.execution.clone(),
            variables: session.variables.share(),
            comparer: session.comparer().clone(),
            total_line_number: 0,
            use_original_columns: session.use_original_columns,
            skip_line: false,
            bin: StateBin::default(),
            warnings: Vec::new(),
        }
    }

    /// Session-less state used for constant folding.
    #[must_use]
    pub fn detached(comparer: Comparer) -> Self {
        Self {
            current_directory: PathBuf::new(),
            temp_directory: None,
            execution: ExecutionState::new(),
            variables: Variables::new(),
            comparer,
            total_line_number: 0,
            use_original_columns: true,
            skip_line: false,
            bin: StateBin::default(),
            warnings: Vec::new(),
        }
    }

    /// Child state for a nested execution (subquery, view). The memo cache
    /// always starts empty; with `new_scope` the variables are copied so
    /// declarations made inside never reach the parent.
    #[must_use]
    pub fn branch(&self, new_scope: bool) -> Self {
        Self {
            current_directory: self.current_directory.clone(),
            temp_directory: self.temp_directory.clone(),
            execution: self.execution.clone(),
            variables: if new_scope {
                self.variables.fork()
            } else {
                self.variables.share()
            },
            comparer: self.comparer.clone(),
            total_line_number: 0,
            use_original_columns: self.use_original_columns,
            skip_line: false,
            bin: StateBin::default(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn culture(&self) -> &Culture {
        self.comparer.culture()
    }

    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.execution.is_interrupted()
    }

    /// Marks the current row as skipped if `err` only concerns this row;
    /// otherwise hands the error back.
    pub fn ignore_line(&mut self, err: QueryError, line: u64) -> Result<(), QueryError> {
        if !err.is_row_recoverable() {
            return Err(err);
        }
        let warning = err.ignore_line(line);
        log::warn!("{warning}");
        self.warnings.push(warning);
        self.skip_line = true;
        Ok(())
    }

    pub fn take_skip_line(&mut self) -> bool {
        std::mem::take(&mut self.skip_line)
    }

    #[must_use]
    pub fn warnings(&self) -> &[QueryError] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<QueryError> {
        std::mem::take(&mut self.warnings)
    }

    /// Collects the warnings of a finished child state.
    pub fn absorb(&mut self, mut child: Self) {
        self.collect_warnings(&mut child);
    }

    /// Moves the warnings a live child state has gathered so far.
    pub fn collect_warnings(&mut self, child: &mut Self) {
        self.warnings.append(&mut child.warnings);
    }
}
