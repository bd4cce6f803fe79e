/// Row providers
///
/// Every data source and every query stage is a `Provider`: it is
/// initialized once per execution, pulled one row at a time and
/// uninitialized. Stages wrap their input provider instead of inheriting
/// from it.

// Module declarations
pub mod directory;
pub mod text;
pub mod memory;
pub mod filter;
pub mod projection;
pub mod sort;
pub mod top;
pub mod view;
pub mod materialize;

use std::fmt::Debug;
use crate::core::{column_ordinal, Column, DataType, ProviderRecord, QueryError};
use crate::state::QueryState;

// Re-exports
pub use directory::{DirectoryProvider, FileSearch};
pub use text::TextProvider;
pub use memory::MemoryProvider;
pub use filter::FilterProvider;
pub use projection::ProjectionProvider;
pub use sort::SortProvider;
pub use top::TopProvider;
pub use view::ViewProvider;
pub use materialize::materialize_column;

/// Pull-based row source.
///
/// `next_record` must not be called before `initialize`. Once it returns
/// `false` it keeps returning `false`. `uninitialize` releases resources and
/// may be called any number of times, including after a failed
/// `initialize`.
pub trait Provider {
    /// Schema; fixed for the provider's lifetime.
    fn columns(&self) -> &[Column];

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError>;

    /// Advances to the next row. Returns `false` when exhausted.
    fn next_record(&mut self, state: &mut QueryState) -> Result<bool, QueryError>;

    /// Current row; only meaningful after `next_record` returned `true`.
    fn record(&self) -> &ProviderRecord;

    fn uninitialize(&mut self);

    /// Names the provider can be qualified with.
    fn aliases(&self) -> &[String] {
        &[]
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name.clone()).collect()
    }

    fn column_types(&self) -> Vec<DataType> {
        self.columns().iter().map(|c| c.data_type).collect()
    }

    fn column_ordinal(&self, name: &str) -> Option<usize> {
        column_ordinal(self.columns(), name)
    }
}

/// Host-supplied view. A fresh provider is created for every reference.
pub trait ProviderFactory: Debug + Send + Sync {
    fn columns(&self) -> Vec<Column>;

    fn create(&self) -> Result<Box<dyn Provider>, QueryError>;
}

/// Drops the current row if `err` only concerns that row, recording the
/// warning on the state. Other errors are returned.
pub(crate) fn skip_row(state: &mut QueryState, err: QueryError, line: u64) -> Result<(), QueryError> {
    state.ignore_line(err, line)?;
    state.take_skip_line();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Comparer;

    #[test]
    fn test_schema_accessors() {
        let provider = MemoryProvider::new(
            vec![Column::new("Name", DataType::String), Column::new("Size", DataType::Integer)],
            Vec::new(),
        );
        assert_eq!(provider.column_names(), vec!["Name", "Size"]);
        assert_eq!(provider.column_types(), vec![DataType::String, DataType::Integer]);
        assert_eq!(provider.column_ordinal("size"), Some(1));
        assert!(provider.aliases().is_empty());
    }

    #[test]
    fn test_skip_row_only_swallows_row_errors() {
        let mut state = QueryState::detached(Comparer::default());
        let conversion = QueryError::run_time(DataType::String, DataType::Integer, "x");
        assert!(skip_row(&mut state, conversion, 3).is_ok());
        assert!(!state.skip_line);
        assert_eq!(state.warnings().len(), 1);

        let fatal = QueryError::VariableNotDeclared("@x".into());
        assert!(skip_row(&mut state, fatal, 4).is_err());
    }
}
