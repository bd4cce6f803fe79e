use crate::core::{Column, ProviderRecord, QueryError};
use crate::expression::Expression;
use crate::parser::VariableDecl;
use crate::state::QueryState;
use super::Provider;

/// Expands a view. The body runs in its own variable scope where every
/// parameter is declared and assigned from the matching argument, so
/// parameters never leak into the caller.
pub struct ViewProvider {
    name: String,
    parameters: Vec<VariableDecl>,
    arguments: Vec<Expression>,
    body: Box<dyn Provider>,
    aliases: Vec<String>,
    scope: Option<QueryState>,
}

impl ViewProvider {
    #[must_use]
    pub fn new(
        name: String,
        parameters: Vec<VariableDecl>,
        arguments: Vec<Expression>,
        body: Box<dyn Provider>,
        aliases: Vec<String>,
    ) -> Self {
        Self {
            name,
            parameters,
            arguments,
            body,
            aliases,
            scope: None,
        }
    }

    fn enter(&self, state: &mut QueryState) -> Result<QueryState, QueryError> {
        if self.arguments.len() != self.parameters.len() {
            return Err(QueryError::ViewArgumentCount {
                name: self.name.clone(),
                expected: self.parameters.len(),
                actual: self.arguments.len(),
            });
        }
        let scope = state.branch(true);
        for (parameter, argument) in self.parameters.iter().zip(&self.arguments) {
            let value = argument.evaluate(state, &ProviderRecord::default())?;
            scope.variables.redeclare(&parameter.name, parameter.data_type);
            scope.variables.set(&parameter.name, &value, state.culture())?;
        }
        Ok(scope)
    }
}

impl Provider for ViewProvider {
    fn columns(&self) -> &[Column] {
        self.body.columns()
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        log::debug!("expanding view {}", self.name);
        let mut scope = self.enter(state)?;
        let result = self.body.initialize(&mut scope);
        state.collect_warnings(&mut scope);
        self.scope = Some(scope);
        result
    }

    fn next_record(&mut self, state: &mut QueryState) -> Result<bool, QueryError> {
        let Some(scope) = self.scope.as_mut() else {
            return Ok(false);
        };
        let more = self.body.next_record(scope);
        state.collect_warnings(scope);
        more
    }

    fn record(&self) -> &ProviderRecord {
        self.body.record()
    }

    fn uninitialize(&mut self) {
        self.body.uninitialize();
        self.scope = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparer, DataType, Value};
    use crate::provider::MemoryProvider;

    #[test]
    fn test_parameters_are_scoped() {
        let mut state = QueryState::detached(Comparer::default());
        let body = MemoryProvider::new(vec![Column::new("x", DataType::Integer)], vec![vec![Value::Integer(1)]]);
        let mut view = ViewProvider::new(
            "v".to_string(),
            vec![VariableDecl {
                name: "@limit".to_string(),
                data_type: DataType::Integer,
            }],
            vec![Expression::constant(Value::String("42".into()))],
            Box::new(body),
            vec!["v".to_string()],
        );
        view.initialize(&mut state).unwrap();
        let scope = view.scope.as_ref().unwrap();
        assert_eq!(scope.variables.value("@limit").unwrap(), Value::Integer(42));
        assert!(!state.variables.contains("@limit"));
        assert!(view.next_record(&mut state).unwrap());
        view.uninitialize();
        assert!(!view.next_record(&mut state).unwrap());
    }

    #[test]
    fn test_argument_count_checked() {
        let mut state = QueryState::detached(Comparer::default());
        let body = MemoryProvider::new(Vec::new(), Vec::new());
        let mut view = ViewProvider::new(
            "v".to_string(),
            vec![VariableDecl {
                name: "@a".to_string(),
                data_type: DataType::Integer,
            }],
            Vec::new(),
            Box::new(body),
            Vec::new(),
        );
        assert!(matches!(
            view.initialize(&mut state),
            Err(QueryError::ViewArgumentCount { expected: 1, actual: 0, .. })
        ));
        view.uninitialize();
    }
}
