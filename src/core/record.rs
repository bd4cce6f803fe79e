use super::value::Value;

/// The current row of a provider. Owned by the provider and overwritten on
/// every successful pull.
#[derive(Debug, Clone, Default)]
pub struct ProviderRecord {
    pub columns: Vec<Value>,
    /// Values before any projection, used by `@@Line` and friends.
    pub original_columns: Vec<Value>,
    /// 1-based row counter within the providing source
    pub line_no: u64,
    /// Cumulative counter across all sources of a provider
    pub total_line_no: u64,
    /// Originating file path (or view/table name)
    pub source: String,
}

impl ProviderRecord {
    #[must_use]
    pub fn new(columns: Vec<Value>) -> Self {
        Self {
            original_columns: columns.clone(),
            columns,
            line_no: 0,
            total_line_no: 0,
            source: String::new(),
        }
    }

    /// Copies counters and source from the record this one was derived from.
    pub fn inherit_position(&mut self, from: &Self) {
        self.line_no = from.line_no;
        self.total_line_no = from.total_line_no;
        self.source.clone_from(&from.source);
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.original_columns.clear();
        self.line_no = 0;
        self.total_line_no = 0;
        self.source.clear();
    }
}
