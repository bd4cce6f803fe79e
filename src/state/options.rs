use serde::{Deserialize, Serialize};
use crate::core::QueryError;

/// Whether a heading row is written before the first data row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeadingMode {
    Off,
    #[default]
    On,
    /// Heading followed by a rule of dashes
    Rule,
}

impl HeadingMode {
    pub fn from_name(name: &str) -> Result<Self, QueryError> {
        match name.to_ascii_lowercase().as_str() {
            "off" | "false" => Ok(Self::Off),
            "on" | "true" => Ok(Self::On),
            "rule" | "on-with-rule" => Ok(Self::Rule),
            other => Err(QueryError::Config(format!("Unknown heading mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub delimiter: String,
    pub heading: HeadingMode,
    pub auto_size: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            heading: HeadingMode::On,
            auto_size: false,
        }
    }
}
