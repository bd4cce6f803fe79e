use crate::core::{Column, ProviderRecord, QueryError};
use crate::expression::Expression;
use crate::state::QueryState;
use super::{skip_row, Provider};

/// WHERE: passes through the input rows the predicate accepts. A row whose
/// predicate fails with a row-level error is dropped with a warning.
pub struct FilterProvider {
    input: Box<dyn Provider>,
    predicate: Expression,
}

impl FilterProvider {
    #[must_use]
    pub fn new(input: Box<dyn Provider>, predicate: Expression) -> Self {
        Self { input, predicate }
    }
}

impl Provider for FilterProvider {
    fn columns(&self) -> &[Column] {
        self.input.columns()
    }

    fn aliases(&self) -> &[String] {
        self.input.aliases()
    }

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        self.input.initialize(state)
    }

    fn next_record(&mut self, state: &mut QueryState) -> Result<bool, QueryError> {
        while self.input.next_record(state)? {
            let record = self.input.record();
            match self.predicate.evaluate_bool(state, record) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => skip_row(state, e, record.line_no)?,
            }
        }
        Ok(false)
    }

    fn record(&self) -> &ProviderRecord {
        self.input.record()
    }

    fn uninitialize(&mut self) {
        self.input.uninitialize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparer, DataType, Value};
    use crate::provider::MemoryProvider;

    fn input() -> Box<dyn Provider> {
        let rows = ["1", "x", "3", "4"]
            .iter()
            .map(|s| vec![Value::String((*s).to_string())])
            .collect();
        Box::new(MemoryProvider::new(vec![Column::new("v", DataType::String)], rows))
    }

    #[test]
    fn test_constant_predicate() {
        let mut state = QueryState::detached(Comparer::default());
        let mut provider = FilterProvider::new(input(), Expression::constant(Value::Boolean(false)));
        provider.initialize(&mut state).unwrap();
        assert!(!provider.next_record(&mut state).unwrap());
        provider.uninitialize();
    }

    #[test]
    fn test_non_boolean_predicate_is_fatal() {
        let mut state = QueryState::detached(Comparer::default());
        let mut provider = FilterProvider::new(input(), Expression::column(0, DataType::String));
        provider.initialize(&mut state).unwrap();
        assert!(matches!(provider.next_record(&mut state), Err(QueryError::TypeMismatch(_))));
        assert!(state.warnings().is_empty());
    }
}
