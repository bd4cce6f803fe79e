use chrono::Local;
use crate::core::{DataType, ProviderRecord, QueryError, Value};
use crate::state::QueryState;
use super::system::join_columns;

/// Built-in scalar functions. Conversions (`TO_INT` and friends) are not
/// listed here; they become conversion nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Replace,
    Upper,
    Lower,
    Trim,
    Len,
    Substr,
    ExtractToken,
    ColumnList,
    Abs,
    Now,
}

/// Conversion functions and the kind they convert to. The flag says whether
/// a format argument is accepted.
#[must_use]
pub fn conversion_target(name: &str) -> Option<(DataType, bool)> {
    match name.to_ascii_uppercase().as_str() {
        "TO_STRING" => Some((DataType::String, true)),
        "TO_INT" | "TO_INTEGER" => Some((DataType::Integer, true)),
        "TO_FLOAT" => Some((DataType::Float, true)),
        "TO_BOOL" | "TO_BOOLEAN" => Some((DataType::Boolean, false)),
        "TO_DATETIME" => Some((DataType::DateTime, true)),
        _ => None,
    }
}

impl Function {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "REPLACE" => Self::Replace,
            "UPPER" => Self::Upper,
            "LOWER" => Self::Lower,
            "TRIM" => Self::Trim,
            "LEN" | "LENGTH" => Self::Len,
            "SUBSTR" | "SUBSTRING" => Self::Substr,
            "EXTRACT_TOKEN" => Self::ExtractToken,
            "COLUMN_LIST" => Self::ColumnList,
            "ABS" => Self::Abs,
            "NOW" => Self::Now,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::Upper => "UPPER",
            Self::Lower => "LOWER",
            Self::Trim => "TRIM",
            Self::Len => "LEN",
            Self::Substr => "SUBSTR",
            Self::ExtractToken => "EXTRACT_TOKEN",
            Self::ColumnList => "COLUMN_LIST",
            Self::Abs => "ABS",
            Self::Now => "NOW",
        }
    }

    const fn arity(self) -> (usize, usize) {
        match self {
            Self::Replace => (3, 3),
            Self::Upper | Self::Lower | Self::Trim | Self::Len | Self::Abs => (1, 1),
            Self::Substr | Self::ExtractToken => (2, 3),
            Self::ColumnList => (0, 1),
            Self::Now => (0, 0),
        }
    }

    /// Results depend on more than the arguments.
    #[must_use]
    pub const fn is_deterministic(self) -> bool {
        !matches!(self, Self::Now | Self::ColumnList)
    }

    /// Parameter kinds the arguments are converted to, and the result kind.
    pub fn signature(self, args: &[DataType]) -> Result<(Vec<DataType>, DataType), QueryError> {
        let (min, max) = self.arity();
        if args.len() < min || args.len() > max {
            let expected = if min == max { min.to_string() } else { format!("{min} to {max}") };
            return Err(QueryError::ArgumentCount {
                name: self.name().to_string(),
                expected,
                actual: args.len(),
            });
        }

        let params = match self {
            Self::Replace => vec![DataType::String; 3],
            Self::Upper | Self::Lower | Self::Trim | Self::Len | Self::ColumnList => {
                vec![DataType::String; args.len()]
            }
            Self::Substr => [DataType::String, DataType::Integer, DataType::Integer][..args.len()].to_vec(),
            Self::ExtractToken => [DataType::String, DataType::Integer, DataType::String][..args.len()].to_vec(),
            Self::Abs => {
                if !args[0].is_numeric() {
                    return Err(QueryError::TypeMismatch(format!("ABS expects a number, found {}", args[0])));
                }
                vec![args[0]]
            }
            Self::Now => Vec::new(),
        };
        let result = match self {
            Self::Len => DataType::Integer,
            Self::Abs => args[0],
            Self::Now => DataType::DateTime,
            _ => DataType::String,
        };
        Ok((params, result))
    }

    /// Arguments arrive already converted to the signature's kinds.
    pub fn evaluate(self, args: &[Value], state: &QueryState, record: &ProviderRecord) -> Result<Value, QueryError> {
        let text = |i: usize| args.get(i).and_then(Value::as_str).unwrap_or_default();
        let int = |i: usize| args.get(i).and_then(Value::as_int);

        Ok(match self {
            Self::Replace => {
                let (s, from, to) = (text(0), text(1), text(2));
                Value::String(if from.is_empty() { s.to_string() } else { s.replace(from, to) })
            }
            Self::Upper => Value::String(state.culture().to_upper(text(0))),
            Self::Lower => Value::String(state.culture().to_lower(text(0))),
            Self::Trim => Value::String(text(0).trim().to_string()),
            Self::Len => Value::Integer(i64::try_from(text(0).chars().count()).unwrap_or(i64::MAX)),
            Self::Substr => Value::String(substring(text(0), int(1).unwrap_or(1), int(2))),
            Self::ExtractToken => {
                let separator = if args.len() > 2 { text(2) } else { " " };
                Value::String(extract_token(text(0), int(1).unwrap_or(0), separator))
            }
            Self::ColumnList => {
                let separator = if args.is_empty() { "\t" } else { text(0) };
                Value::String(join_columns(&record.columns, state, separator)?)
            }
            Self::Abs => match args.first() {
                Some(Value::Integer(i)) => Value::Integer(i.wrapping_abs()),
                Some(Value::Float(x)) => Value::Float(x.abs()),
                _ => return Err(QueryError::TypeMismatch("ABS expects a number".to_string())),
            },
            Self::Now => Value::DateTime(Local::now().naive_local()),
        })
    }
}

// 1-based start; starts before 1 are clamped
fn substring(s: &str, start: i64, len: Option<i64>) -> String {
    let skip = usize::try_from(start.saturating_sub(1)).unwrap_or(0);
    let chars = s.chars().skip(skip);
    match len {
        Some(n) => chars.take(usize::try_from(n).unwrap_or(0)).collect(),
        None => chars.collect(),
    }
}

// 0-based token index; out of range yields an empty string
fn extract_token(s: &str, index: i64, separator: &str) -> String {
    let Ok(index) = usize::try_from(index) else {
        return String::new();
    };
    if separator.is_empty() {
        return if index == 0 { s.to_string() } else { String::new() };
    }
    s.split(separator).nth(index).unwrap_or_default().to_string()
}
