use std::cmp::Ordering;
use crate::core::{Column, Comparer, ProviderRecord, QueryError, Value};
use crate::expression::Expression;
use crate::parser::SortOrder;
use crate::state::QueryState;
use super::{skip_row, Provider};

/// ORDER BY: drains the input on the first pull and replays it sorted.
/// Rows with equal keys keep their input order.
pub struct SortProvider {
    input: Box<dyn Provider>,
    keys: Vec<(Expression, SortOrder)>,
    rows: Vec<(Vec<Value>, ProviderRecord)>,
    loaded: bool,
    position: usize,
    record: ProviderRecord,
}

impl SortProvider {
    #[must_use]
    pub fn new(input: Box<dyn Provider>, keys: Vec<(Expression, SortOrder)>) -> Self {
        Self {
            input,
            keys,
            rows: Vec::new(),
            loaded: false,
            position: 0,
            record: ProviderRecord::default(),
        }
    }

    fn load(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        while self.input.next_record(state)? {
            if state.is_interrupted() {
                break;
            }
            let record = self.input.record();
            let keys: Result<Vec<Value>, QueryError> = self.keys.iter().map(|(k, _)| k.evaluate(state, record)).collect();
            match keys {
                Ok(keys) => self.rows.push((keys, record.clone())),
                Err(e) => skip_row(state, e, record.line_no)?,
            }
        }

        let mut failure = None;
        let orders: Vec<SortOrder> = self.keys.iter().map(|(_, o)| *o).collect();
        self.rows.sort_by(|(a, _), (b, _)| {
            compare_keys(&state.comparer, &orders, a, b).unwrap_or_else(|e| {
                failure.get_or_insert(e);
                Ordering::Equal
            })
        });
        if let Some(e) = failure {
            return Err(e);
        }
        log::debug!("sorted {} row(s)", self.rows.len());
        Ok(())
    }
}

fn compare_keys(comparer: &Comparer, orders: &[SortOrder], a: &[Value], b: &[Value]) -> Result<Ordering, QueryError> {
    for ((x, y), order) in a.iter().zip(b).zip(orders) {
        let ordering = comparer.compare(x, y)?;
        let ordering = if *order == SortOrder::Desc { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

impl Provider for SortProvider {
    fn columns(&self) -> &[Column] {
        self.input.columns()
    }

    fn aliases(&self) -> &[String] {
        self.input.aliases()
    }

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        self.rows.clear();
        self.loaded = false;
        self.position = 0;
        self.input.initialize(state)
    }

    fn next_record(&mut self, state: &mut QueryState) -> Result<bool, QueryError> {
        if !self.loaded {
            self.loaded = true;
            self.load(state)?;
        }
        let Some((_, record)) = self.rows.get_mut(self.position) else {
            return Ok(false);
        };
        self.position += 1;
        self.record = std::mem::take(record);
        Ok(true)
    }

    fn record(&self) -> &ProviderRecord {
        &self.record
    }

    fn uninitialize(&mut self) {
        self.rows.clear();
        self.input.uninitialize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::provider::MemoryProvider;

    fn rows() -> Box<dyn Provider> {
        let data = [("b", 2), ("a", 2), ("c", 1), ("A", 3)];
        Box::new(MemoryProvider::new(
            vec![Column::new("name", DataType::String), Column::new("n", DataType::Integer)],
            data.iter()
                .map(|(s, n)| vec![Value::String((*s).to_string()), Value::Integer(*n)])
                .collect(),
        ))
    }

    fn collect(mut provider: SortProvider) -> Vec<Vec<Value>> {
        let mut state = QueryState::detached(Comparer::default());
        provider.initialize(&mut state).unwrap();
        let mut out = Vec::new();
        while provider.next_record(&mut state).unwrap() {
            out.push(provider.record().columns.clone());
        }
        provider.uninitialize();
        out
    }

    fn first_column(rows: &[Vec<Value>]) -> Vec<String> {
        rows.iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn test_sort_is_stable() {
        let sorted = collect(SortProvider::new(
            rows(),
            vec![(Expression::column(1, DataType::Integer), SortOrder::Asc)],
        ));
        assert_eq!(first_column(&sorted), vec!["c", "b", "a", "A"]);
    }

    #[test]
    fn test_multiple_keys_and_descending() {
        let sorted = collect(SortProvider::new(
            rows(),
            vec![
                (Expression::column(1, DataType::Integer), SortOrder::Desc),
                (Expression::column(0, DataType::String), SortOrder::Asc),
            ],
        ));
        assert_eq!(first_column(&sorted), vec!["A", "a", "b", "c"]);
    }
}
