/// View definitions
///
/// CREATE VIEW, ALTER VIEW, DROP VIEW

use crate::core::QueryError;
use crate::parser::{SelectQuery, VariableDecl};
use crate::state::{SessionState, ViewDefinition, ViewSource};
use super::dispatcher::CommandOutcome;

pub struct DdlExecutor;

impl DdlExecutor {
    /// Registers a view. An existing view with the same name is replaced.
    pub fn create_view(
        session: &mut SessionState,
        name: &str,
        parameters: &[VariableDecl],
        query: &SelectQuery,
    ) -> Result<CommandOutcome, QueryError> {
        Self::check_parameters(name, parameters)?;
        if session.views.contains(name) {
            log::debug!("view {name} replaced by CREATE VIEW");
        }
        session.views.insert(Self::definition(name, parameters, query));
        Ok(CommandOutcome::Success(format!("View '{name}' created")))
    }

    /// Replaces the definition of an existing view.
    pub fn alter_view(
        session: &mut SessionState,
        name: &str,
        parameters: &[VariableDecl],
        query: &SelectQuery,
    ) -> Result<CommandOutcome, QueryError> {
        Self::check_parameters(name, parameters)?;
        if !session.views.replace(Self::definition(name, parameters, query)) {
            return Err(QueryError::ViewNotFound(name.to_string()));
        }
        Ok(CommandOutcome::Success(format!("View '{name}' altered")))
    }

    /// Removes a view; dropping an unknown name does nothing.
    pub fn drop_view(session: &mut SessionState, name: &str) -> CommandOutcome {
        match session.views.remove(name) {
            Some(view) => CommandOutcome::Success(format!("View '{}' dropped", view.name)),
            None => {
                log::debug!("DROP VIEW {name}: no such view");
                CommandOutcome::Success(format!("View '{name}' does not exist"))
            }
        }
    }

    fn definition(name: &str, parameters: &[VariableDecl], query: &SelectQuery) -> ViewDefinition {
        ViewDefinition {
            name: name.to_string(),
            parameters: parameters.to_vec(),
            source: ViewSource::Query(query.clone()),
        }
    }

    // Parameter names are variables of one scope
    fn check_parameters(view: &str, parameters: &[VariableDecl]) -> Result<(), QueryError> {
        for (i, parameter) in parameters.iter().enumerate() {
            if parameters[..i].iter().any(|p| p.name.eq_ignore_ascii_case(&parameter.name)) {
                log::debug!("duplicate parameter in view {view}");
                return Err(QueryError::VariableAlreadyDeclared(parameter.name.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Comparer, DataType};
    use crate::parser::{parse_commands, Command};
    use std::path::PathBuf;

    fn session() -> SessionState {
        SessionState::new(PathBuf::from("."), Comparer::default()).unwrap()
    }

    fn query(text: &str) -> SelectQuery {
        match parse_commands(text).unwrap().remove(0) {
            Command::Select(q) => q,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_create_overwrites() {
        let mut session = session();
        DdlExecutor::create_view(&mut session, "v", &[], &query("SELECT 1")).unwrap();
        DdlExecutor::create_view(&mut session, "V", &[], &query("SELECT 2")).unwrap();
        assert_eq!(session.views.len(), 1);
        let view = session.views.get("v").unwrap();
        assert!(matches!(&view.source, ViewSource::Query(q) if *q == query("SELECT 2")));
    }

    #[test]
    fn test_alter_requires_existing_view() {
        let mut session = session();
        let result = DdlExecutor::alter_view(&mut session, "v", &[], &query("SELECT 1"));
        assert!(matches!(result, Err(QueryError::ViewNotFound(_))));
        assert!(session.views.is_empty());
    }

    #[test]
    fn test_drop_missing_is_noop() {
        let mut session = session();
        DdlExecutor::drop_view(&mut session, "nothing");
        DdlExecutor::create_view(&mut session, "v", &[], &query("SELECT 1")).unwrap();
        DdlExecutor::drop_view(&mut session, "V");
        assert!(session.views.is_empty());
    }

    #[test]
    fn test_duplicate_parameters() {
        let mut session = session();
        let parameters = vec![
            VariableDecl {
                name: "@a".into(),
                data_type: DataType::Integer,
            },
            VariableDecl {
                name: "@A".into(),
                data_type: DataType::String,
            },
        ];
        let result = DdlExecutor::create_view(&mut session, "v", &parameters, &query("SELECT 1"));
        assert!(matches!(result, Err(QueryError::VariableAlreadyDeclared(_))));
    }
}
