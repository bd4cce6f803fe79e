use crate::core::QueryError;
use crate::parser::Command;
use crate::state::SessionState;

// Import modular executors
use super::ddl::DdlExecutor;
use super::output::OutputSink;
use super::queries::QueryRunner;
use super::variables::SessionExecutor;

pub struct CommandExecutor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success(String),
    /// Rows written by a SELECT
    Rows(u64),
}

impl CommandOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Success(message) => message.clone(),
            Self::Rows(1) => "1 row".to_string(),
            Self::Rows(n) => format!("{n} rows"),
        }
    }
}

impl CommandExecutor {
    /// Executes a single command against the session.
    ///
    /// Only SELECT writes to `output`; the optional `log` sink receives a
    /// copy of every output line.
    pub fn execute<'o>(
        command: &Command,
        session: &mut SessionState,
        output: &mut dyn OutputSink,
        log: Option<&mut (dyn OutputSink + 'o)>,
    ) -> Result<CommandOutcome, QueryError> {
        log::debug!("executing {}", command.kind());
        match command {
            // Session commands - delegate to SessionExecutor
            Command::Use(path) => SessionExecutor::use_directory(session, path),
            Command::Declare(declarations) => SessionExecutor::declare(session, declarations),
            Command::Set { name, value } => SessionExecutor::set(session, name, value),

            // View definitions - delegate to DdlExecutor
            Command::CreateView { name, parameters, query } => {
                DdlExecutor::create_view(session, name, parameters, query)
            }
            Command::AlterView { name, parameters, query } => {
                DdlExecutor::alter_view(session, name, parameters, query)
            }
            Command::DropView { name } => Ok(DdlExecutor::drop_view(session, name)),

            Command::Select(query) => QueryRunner::run(query, session, output, log).map(CommandOutcome::Rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparer, Value};
    use crate::parser::parse_commands;
    use std::path::PathBuf;

    fn run(session: &mut SessionState, text: &str) -> Vec<Result<CommandOutcome, QueryError>> {
        let mut out: Vec<String> = Vec::new();
        parse_commands(text)
            .unwrap()
            .iter()
            .map(|c| CommandExecutor::execute(c, session, &mut out, None))
            .collect()
    }

    #[test]
    fn test_dispatch_batch() {
        let mut session = SessionState::new(PathBuf::from("."), Comparer::default()).unwrap();
        let results = run(
            &mut session,
            "DECLARE @n INT; SET @n = 2 + 3; CREATE VIEW v AS SELECT @n; SELECT * FROM v",
        );
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(session.variables.value("@n").unwrap(), Value::Integer(5));
        assert_eq!(results[3].as_ref().unwrap(), &CommandOutcome::Rows(1));
    }

    #[test]
    fn test_outcome_message() {
        assert_eq!(CommandOutcome::Rows(1).message(), "1 row");
        assert_eq!(CommandOutcome::Rows(3).message(), "3 rows");
        assert_eq!(CommandOutcome::Success("ok".into()).message(), "ok");
    }
}
