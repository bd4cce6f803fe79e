use serde::{Deserialize, Serialize};
use super::error::QueryError;

/// The closed set of scalar kinds a column, variable or expression can have.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
}

impl DataType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::DateTime => "DATETIME",
        }
    }

    /// Resolves a type name as written in DECLARE / view parameter lists.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "STRING" | "TEXT" | "VARCHAR" => Some(Self::String),
            "INT" | "INTEGER" | "BIGINT" => Some(Self::Integer),
            "FLOAT" | "REAL" | "DOUBLE" => Some(Self::Float),
            "BOOL" | "BOOLEAN" => Some(Self::Boolean),
            "DATETIME" | "TIMESTAMP" => Some(Self::DateTime),
            _ => None,
        }
    }

    /// Whether a value of this kind can ever be converted to `target`.
    ///
    /// String conversions are always structurally legal (they may still fail
    /// on the actual text at run time).
    #[must_use]
    pub fn can_convert_to(self, target: Self) -> bool {
        use DataType::{Boolean, Float, Integer, String};

        if self == target {
            return true;
        }
        matches!(
            (self, target),
            (String, _) | (_, String) | (Integer, Float | Boolean) | (Float | Boolean, Integer)
        )
    }

    /// Parse-time check for a conversion node.
    pub fn check_conversion(self, target: Self) -> Result<(), QueryError> {
        if self.can_convert_to(target) {
            Ok(())
        } else {
            Err(QueryError::ParseTimeConversion { from: self, to: target })
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
