use crate::core::{Column, ProviderRecord, QueryError, Value};
use crate::state::QueryState;
use super::Provider;

/// Fixed rows held in memory.
pub struct MemoryProvider {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    source: String,
    position: usize,
    record: ProviderRecord,
}

impl MemoryProvider {
    #[must_use]
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            source: String::new(),
            position: 0,
            record: ProviderRecord::default(),
        }
    }

    /// Sets the `Source` reported with every row.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

impl Provider for MemoryProvider {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn initialize(&mut self, _state: &mut QueryState) -> Result<(), QueryError> {
        self.position = 0;
        self.record.clear();
        self.record.source.clone_from(&self.source);
        Ok(())
    }

    fn next_record(&mut self, _state: &mut QueryState) -> Result<bool, QueryError> {
        let Some(row) = self.rows.get(self.position) else {
            self.record.clear();
            return Ok(false);
        };
        self.position += 1;
        self.record.columns.clone_from(row);
        self.record.original_columns.clone_from(row);
        self.record.line_no += 1;
        self.record.total_line_no += 1;
        Ok(true)
    }

    fn record(&self) -> &ProviderRecord {
        &self.record
    }

    fn uninitialize(&mut self) {
        self.position = self.rows.len();
    }
}
