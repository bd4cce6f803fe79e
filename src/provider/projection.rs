use crate::core::{Column, ProviderRecord, QueryError, Value};
use crate::expression::Expression;
use crate::state::QueryState;
use super::{skip_row, Provider};

/// Select list: evaluates one expression per output column against each
/// input row. The input row's values are kept as the original columns.
pub struct ProjectionProvider {
    input: Box<dyn Provider>,
    columns: Vec<Column>,
    items: Vec<Expression>,
    record: ProviderRecord,
}

impl ProjectionProvider {
    #[must_use]
    pub fn new(input: Box<dyn Provider>, columns: Vec<Column>, items: Vec<Expression>) -> Self {
        Self {
            input,
            columns,
            items,
            record: ProviderRecord::default(),
        }
    }

    fn project(&self, state: &mut QueryState) -> Result<Vec<Value>, QueryError> {
        let source = self.input.record();
        self.items.iter().map(|item| item.evaluate(state, source)).collect()
    }
}

impl Provider for ProjectionProvider {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn aliases(&self) -> &[String] {
        self.input.aliases()
    }

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        self.record.clear();
        self.input.initialize(state)
    }

    fn next_record(&mut self, state: &mut QueryState) -> Result<bool, QueryError> {
        while self.input.next_record(state)? {
            match self.project(state) {
                Ok(values) => {
                    let source = self.input.record();
                    self.record.columns = values;
                    if source.original_columns.is_empty() {
                        self.record.original_columns.clone_from(&source.columns);
                    } else {
                        self.record.original_columns.clone_from(&source.original_columns);
                    }
                    self.record.inherit_position(source);
                    return Ok(true);
                }
                Err(e) => skip_row(state, e, self.input.record().line_no)?,
            }
        }
        Ok(false)
    }

    fn record(&self) -> &ProviderRecord {
        &self.record
    }

    fn uninitialize(&mut self) {
        self.input.uninitialize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparer, DataType};
    use crate::provider::MemoryProvider;

    #[test]
    fn test_projection_keeps_original_columns() {
        let input = MemoryProvider::new(
            vec![Column::new("a", DataType::Integer), Column::new("b", DataType::String)],
            vec![vec![Value::Integer(1), Value::String("x".into())]],
        );
        let mut provider = ProjectionProvider::new(
            Box::new(input),
            vec![Column::new("b", DataType::String)],
            vec![Expression::column(1, DataType::String)],
        );
        let mut state = QueryState::detached(Comparer::default());
        provider.initialize(&mut state).unwrap();
        assert!(provider.next_record(&mut state).unwrap());
        let record = provider.record();
        assert_eq!(record.columns, vec![Value::String("x".into())]);
        assert_eq!(record.original_columns, vec![Value::Integer(1), Value::String("x".into())]);
        assert_eq!(record.line_no, 1);
        assert!(!provider.next_record(&mut state).unwrap());
        provider.uninitialize();
    }
}
