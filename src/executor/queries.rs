/// Query execution
///
/// Plans a SELECT, drives the provider chain to exhaustion and streams every
/// row through the formatter.

use crate::core::QueryError;
use crate::parser::SelectQuery;
use crate::provider::Provider;
use crate::state::{QueryState, SessionState};
use super::output::{OutputSink, RowFormatter};
use super::planner::Planner;

pub struct QueryRunner;

impl QueryRunner {
    /// Runs `query` and returns the number of rows written.
    ///
    /// An interrupt ends the row loop early without an error. The provider
    /// chain is uninitialized on every path; row-level warnings are added to
    /// the session.
    pub fn run<'o>(
        query: &SelectQuery,
        session: &mut SessionState,
        output: &mut dyn OutputSink,
        log: Option<&mut (dyn OutputSink + 'o)>,
    ) -> Result<u64, QueryError> {
        let plan = Planner::new(session).plan_select(query)?;
        let mut provider = plan.build()?;
        let mut state = QueryState::new(session);
        let mut formatter = RowFormatter::new(&session.output, provider.column_names());

        let result = Self::drive(provider.as_mut(), &mut state, &mut formatter, output, log);
        provider.uninitialize();
        session.add_warnings(state.take_warnings());

        if let Ok(rows) = &result {
            log::debug!("query returned {rows} row(s)");
        }
        result
    }

    fn drive<'o>(
        provider: &mut dyn Provider,
        state: &mut QueryState,
        formatter: &mut RowFormatter,
        output: &mut dyn OutputSink,
        mut log: Option<&mut (dyn OutputSink + 'o)>,
    ) -> Result<u64, QueryError> {
        provider.initialize(state)?;
        let mut rows = 0;
        loop {
            if state.is_interrupted() {
                log::info!("query interrupted after {rows} row(s)");
                break;
            }
            if !provider.next_record(state)? {
                break;
            }
            state.total_line_number += 1;
            formatter.write_record(provider.record(), state.culture(), output, log.as_deref_mut())?;
            rows += 1;
        }
        formatter.finish(output, log)?;
        Ok(rows)
    }
}
