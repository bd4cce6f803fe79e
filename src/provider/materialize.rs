use crate::core::{DataType, QueryError, Value};
use crate::executor::planner::QueryPlan;
use crate::state::QueryState;
use super::{skip_row, Provider};

/// Runs a one-column plan to exhaustion and returns its values, converted to
/// `convert_to` when given. The run gets its own variable scope and memo
/// cache; its warnings end up on `state`.
pub fn materialize_column(
    plan: &QueryPlan,
    state: &mut QueryState,
    convert_to: Option<DataType>,
) -> Result<Vec<Value>, QueryError> {
    let mut provider = plan.build()?;
    let mut scope = state.branch(true);
    let result = drain(provider.as_mut(), &mut scope, convert_to);
    provider.uninitialize();
    state.absorb(scope);
    if let Ok(values) = &result {
        log::debug!("materialized {} subquery value(s)", values.len());
    }
    result
}

fn drain(provider: &mut dyn Provider, state: &mut QueryState, convert_to: Option<DataType>) -> Result<Vec<Value>, QueryError> {
    provider.initialize(state)?;
    let mut values = Vec::new();
    while !state.is_interrupted() && provider.next_record(state)? {
        let record = provider.record();
        let Some(value) = record.columns.first() else {
            return Err(QueryError::SubqueryColumnCount(record.columns.len()));
        };
        match convert_to {
            None => values.push(value.clone()),
            Some(target) => match value.convert(target, state.culture(), None) {
                Ok(converted) => values.push(converted),
                Err(e) => {
                    let line = record.line_no;
                    skip_row(state, e, line)?;
                }
            },
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, Comparer};

    fn plan(values: &[&str]) -> QueryPlan {
        QueryPlan::Memory {
            columns: vec![Column::new("v", DataType::String)],
            rows: values.iter().map(|v| vec![Value::String((*v).to_string())]).collect(),
        }
    }

    #[test]
    fn test_materialize_with_conversion() {
        let mut state = QueryState::detached(Comparer::default());
        let values = materialize_column(&plan(&["1", "two", "3"]), &mut state, Some(DataType::Integer)).unwrap();
        assert_eq!(values, vec![Value::Integer(1), Value::Integer(3)]);
        assert_eq!(state.warnings().len(), 1);
    }

    #[test]
    fn test_materialize_as_is() {
        let mut state = QueryState::detached(Comparer::default());
        let values = materialize_column(&plan(&["a", "b"]), &mut state, None).unwrap();
        assert_eq!(values.len(), 2);
        assert!(state.warnings().is_empty());
    }
}
