use thiserror::Error;
use super::data_type::DataType;

#[derive(Error, Debug)]
pub enum QueryError {
    /// A conversion that can never succeed for this pair of kinds.
    #[error("Cannot convert {from} to {to}")]
    ParseTimeConversion { from: DataType, to: DataType },
    /// A legal conversion that failed on this particular value.
    #[error("Unable to convert {from} value '{value}' to {to}")]
    RunTimeConversion {
        from: DataType,
        to: DataType,
        value: String,
    },
    /// Raised by the explicit `Value::cast` helper.
    #[error("Conversion from {from} to {to} is not supported")]
    Conversion { from: DataType, to: DataType },
    #[error("Line {line} ignored: {source}")]
    LineIgnored {
        line: u64,
        #[source]
        source: Box<QueryError>,
    },
    #[error("Variable '{0}' is already declared")]
    VariableAlreadyDeclared(String),
    #[error("Variable '{0}' is not declared")]
    VariableNotDeclared(String),
    #[error("Variable '{0}' has no value")]
    VariableNotAssigned(String),
    #[error("View '{0}' not found")]
    ViewNotFound(String),
    #[error("View '{0}' references itself")]
    ViewRecursion(String),
    #[error("View '{name}' expects {expected} argument(s), got {actual}")]
    ViewArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Subquery should contain only 1 column, found {0}")]
    SubqueryColumnCount(usize),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Column '{0}' is ambiguous")]
    AmbiguousColumn(String),
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Function {name} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        name: String,
        expected: String,
        actual: usize,
    },
    #[error("Invalid format '{0}'")]
    InvalidFormat(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueryError {
    pub fn run_time(from: DataType, to: DataType, value: impl Into<String>) -> Self {
        Self::RunTimeConversion {
            from,
            to,
            value: value.into(),
        }
    }

    /// Conversion failures and ignored lines are warnings; everything else
    /// aborts the current command.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::ParseTimeConversion { .. }
                | Self::RunTimeConversion { .. }
                | Self::Conversion { .. }
                | Self::LineIgnored { .. }
        )
    }

    /// Errors that only invalidate the current row.
    #[must_use]
    pub const fn is_row_recoverable(&self) -> bool {
        matches!(self, Self::RunTimeConversion { .. } | Self::LineIgnored { .. })
    }

    /// Wraps a row-scoped failure so the row loop can skip the line.
    #[must_use]
    pub fn ignore_line(self, line: u64) -> Self {
        match self {
            already @ Self::LineIgnored { .. } => already,
            other => Self::LineIgnored {
                line,
                source: Box::new(other),
            },
        }
    }
}

impl From<config::ConfigError> for QueryError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
