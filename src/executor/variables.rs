/// Session commands
///
/// USE, DECLARE, SET

use std::fs;
use crate::core::{ProviderRecord, QueryError, Value};
use crate::parser::{Expr, VariableDecl};
use crate::state::{QueryState, SessionState};
use super::dispatcher::CommandOutcome;
use super::planner::Planner;

pub struct SessionExecutor;

impl SessionExecutor {
    /// Evaluates a standalone expression against the session.
    pub fn evaluate(session: &mut SessionState, expr: &Expr) -> Result<Value, QueryError> {
        let expression = Planner::new(session).plan_expression(expr)?;
        let mut state = QueryState::new(session);
        let value = expression.evaluate(&mut state, &ProviderRecord::default());
        session.add_warnings(state.take_warnings());
        value
    }

    /// Joins the evaluated path onto the current directory. A path that
    /// does not exist is accepted; it fails on the next file access.
    pub fn use_directory(session: &mut SessionState, path: &Expr) -> Result<CommandOutcome, QueryError> {
        let text = Self::evaluate(session, path)?.to_text(session.culture(), None)?;
        let joined = session.current_directory().join(text);
        let directory = fs::canonicalize(&joined).unwrap_or(joined);
        let message = format!("Current directory is {}", directory.display());
        session.set_current_directory(directory);
        Ok(CommandOutcome::Success(message))
    }

    pub fn declare(session: &mut SessionState, declarations: &[VariableDecl]) -> Result<CommandOutcome, QueryError> {
        for decl in declarations {
            session.variables.declare(&decl.name, decl.data_type)?;
            log::debug!("declared {} {}", decl.name, decl.data_type);
        }
        Ok(CommandOutcome::Success(format!("{} variable(s) declared", declarations.len())))
    }

    pub fn set(session: &mut SessionState, name: &str, value: &Expr) -> Result<CommandOutcome, QueryError> {
        if !session.variables.contains(name) {
            return Err(QueryError::VariableNotDeclared(name.to_string()));
        }
        let value = Self::evaluate(session, value)?;
        session.variables.set(name, &value, session.culture())?;
        Ok(CommandOutcome::Success(format!("{name} set")))
    }
}
