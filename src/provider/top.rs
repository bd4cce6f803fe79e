use crate::core::{Column, ProviderRecord, QueryError};
use crate::state::QueryState;
use super::Provider;

/// TOP n: stops pulling from the input after `limit` rows.
pub struct TopProvider {
    input: Box<dyn Provider>,
    limit: u64,
    delivered: u64,
}

impl TopProvider {
    #[must_use]
    pub fn new(input: Box<dyn Provider>, limit: u64) -> Self {
        Self {
            input,
            limit,
            delivered: 0,
        }
    }
}

impl Provider for TopProvider {
    fn columns(&self) -> &[Column] {
        self.input.columns()
    }

    fn aliases(&self) -> &[String] {
        self.input.aliases()
    }

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        self.delivered = 0;
        self.input.initialize(state)
    }

    fn next_record(&mut self, state: &mut QueryState) -> Result<bool, QueryError> {
        if self.delivered >= self.limit || !self.input.next_record(state)? {
            return Ok(false);
        }
        self.delivered += 1;
        Ok(true)
    }

    fn record(&self) -> &ProviderRecord {
        self.input.record()
    }

    fn uninitialize(&mut self) {
        self.input.uninitialize();
    }
}
