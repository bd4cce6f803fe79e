use std::path::Path;
use crate::core::{DataType, ProviderRecord, QueryError, Value};
use crate::state::QueryState;

/// `@@` variables. Each reads the current record instead of keeping its own
/// copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemVariable {
    LineNo,
    TotalLineNo,
    Line,
    FileName,
    FullFileName,
}

impl SystemVariable {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lineno" => Some(Self::LineNo),
            "totallineno" => Some(Self::TotalLineNo),
            "line" => Some(Self::Line),
            "filename" => Some(Self::FileName),
            "fullfilename" => Some(Self::FullFileName),
            _ => None,
        }
    }

    #[must_use]
    pub const fn data_type(self) -> DataType {
        match self {
            Self::LineNo | Self::TotalLineNo => DataType::Integer,
            Self::Line | Self::FileName | Self::FullFileName => DataType::String,
        }
    }

    pub fn evaluate(self, state: &QueryState, record: &ProviderRecord) -> Result<Value, QueryError> {
        Ok(match self {
            Self::LineNo => Value::Integer(counter(record.line_no)),
            Self::TotalLineNo => Value::Integer(counter(record.total_line_no)),
            Self::Line => {
                let columns = if state.use_original_columns && !record.original_columns.is_empty() {
                    &record.original_columns
                } else {
                    &record.columns
                };
                Value::String(join_columns(columns, state, "\t")?)
            }
            Self::FileName => Value::String(
                Path::new(&record.source)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            Self::FullFileName => Value::String(record.source.clone()),
        })
    }
}

fn counter(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Columns as culture-formatted text, joined with `separator`.
pub fn join_columns(columns: &[Value], state: &QueryState, separator: &str) -> Result<String, QueryError> {
    let parts = columns
        .iter()
        .map(|v| v.to_text(state.culture(), None))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Comparer;

    fn record() -> ProviderRecord {
        let mut record = ProviderRecord::new(vec![Value::String("raw".into()), Value::Integer(7)]);
        record.columns = vec![Value::String("projected".into())];
        record.line_no = 4;
        record.total_line_no = 14;
        record.source = "/var/log/app/server.log".into();
        record
    }

    #[test]
    fn test_position_and_file_names() {
        let state = QueryState::detached(Comparer::default());
        let record = record();
        assert_eq!(SystemVariable::LineNo.evaluate(&state, &record).unwrap(), Value::Integer(4));
        assert_eq!(SystemVariable::TotalLineNo.evaluate(&state, &record).unwrap(), Value::Integer(14));
        assert_eq!(SystemVariable::FileName.evaluate(&state, &record).unwrap(), Value::String("server.log".into()));
        assert_eq!(
            SystemVariable::FullFileName.evaluate(&state, &record).unwrap(),
            Value::String("/var/log/app/server.log".into())
        );
    }

    #[test]
    fn test_line_honours_original_columns() {
        let mut state = QueryState::detached(Comparer::default());
        let record = record();
        assert_eq!(SystemVariable::Line.evaluate(&state, &record).unwrap(), Value::String("raw\t7".into()));
        state.use_original_columns = false;
        assert_eq!(SystemVariable::Line.evaluate(&state, &record).unwrap(), Value::String("projected".into()));
    }

    #[test]
    fn test_names_ignore_case() {
        assert_eq!(SystemVariable::from_name("LINENO"), Some(SystemVariable::LineNo));
        assert_eq!(SystemVariable::from_name("nope"), None);
    }
}
