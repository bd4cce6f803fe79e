// Module declarations
mod statement;
mod common;
mod expr;
mod queries;
mod ddl;
mod session;

// Re-export all public types
pub use statement::{
    Command,
    VariableDecl,
    SelectQuery,
    SelectItem,
    OrderItem,
    OrderKey,
    SortOrder,
    SourceRef,
    SourceKind,
    DirectoryOrder,
    Expr,
    AnyTarget,
    UnaryOp,
    BinaryOp,
};

use crate::core::QueryError;
use crate::state::SessionState;
use nom::branch::alt;
use nom::combinator::map;
use nom::IResult;

/// Turns query text into the ordered list of commands to execute.
pub trait CommandParser: Send + Sync {
    fn parse(&self, text: &str, session: &SessionState) -> Result<Vec<Command>, QueryError>;
}

/// The built-in SQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlParser;

impl CommandParser for SqlParser {
    fn parse(&self, text: &str, _session: &SessionState) -> Result<Vec<Command>, QueryError> {
        parse_commands(text)
    }
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        session::session_command,
        ddl::view_command,
        map(queries::select_query, Command::Select),
    ))(input)
}

// Whitespace, comments and empty statements
fn skip_separators(mut input: &str) -> &str {
    loop {
        input = common::sp(input).map_or(input, |(rest, ())| rest);
        match input.strip_prefix(';') {
            Some(rest) => input = rest,
            None => return input,
        }
    }
}

/// 1-based line and column of `rest` within `source`.
fn position(source: &str, rest: &str) -> (usize, usize) {
    let offset = source.len().saturating_sub(rest.len());
    let consumed = &source[..offset];
    let line = consumed.matches('\n').count() + 1;
    let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
    let column = consumed[line_start..].chars().count() + 1;
    (line, column)
}

fn syntax_error(source: &str, rest: &str, message: String) -> QueryError {
    let (line, column) = position(source, rest);
    QueryError::Parse { line, column, message }
}

fn near(rest: &str) -> String {
    let snippet: String = rest.lines().next().unwrap_or_default().chars().take(24).collect();
    if snippet.is_empty() {
        "Unexpected end of input".to_string()
    } else {
        format!("Unexpected input near '{snippet}'")
    }
}

/// Parses a `;`-separated batch.
pub fn parse_commands(text: &str) -> Result<Vec<Command>, QueryError> {
    let mut commands = Vec::new();
    let mut rest = skip_separators(text);

    while !rest.is_empty() {
        let (after, cmd) = command(rest).map_err(|e| match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => syntax_error(text, e.input, near(e.input)),
            nom::Err::Incomplete(_) => syntax_error(text, "", near("")),
        })?;

        let after = common::sp(after).map_or(after, |(r, ())| r);
        if !after.is_empty() && !after.starts_with(';') {
            return Err(syntax_error(text, after, format!("{}; expected ';'", near(after))));
        }

        commands.push(cmd);
        rest = skip_separators(after);
    }

    Ok(commands)
}
