/// Executor module - turns parsed commands into effects on the session
///
/// Structure:
/// - planner: SELECT and view references to provider plans
/// - queries: row loop over a planned SELECT
/// - output: delimited row formatting and output sinks
/// - ddl: CREATE/ALTER/DROP VIEW
/// - variables: USE, DECLARE, SET
/// - dispatcher: per-command routing

// Module declarations
pub mod planner;
pub mod output;
pub mod queries;
pub mod ddl;
pub mod variables;
pub mod dispatcher;

// Re-exports
pub use planner::{Planner, QueryPlan};
pub use output::{OutputSink, RowFormatter, WriterSink};
pub use queries::QueryRunner;
pub use ddl::DdlExecutor;
pub use variables::SessionExecutor;
pub use dispatcher::{CommandExecutor, CommandOutcome};
