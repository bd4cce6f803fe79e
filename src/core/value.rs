use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use super::culture::Culture;
use super::data_type::DataType;
use super::error::QueryError;

/// A tagged scalar. Values are immutable; every conversion produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Integer(_) => DataType::Integer,
            Self::Float(_) => DataType::Float,
            Self::Boolean(_) => DataType::Boolean,
            Self::DateTime(_) => DataType::DateTime,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// String conversion. Always succeeds for a valid format.
    pub fn to_text(&self, culture: &Culture, format: Option<&str>) -> Result<String, QueryError> {
        match self {
            Self::String(s) => Ok(s.clone()),
            Self::Integer(i) => match format {
                None => Ok(i.to_string()),
                Some(fmt) => format_integer(*i, fmt),
            },
            Self::Float(x) => format_float(*x, culture, format),
            Self::Boolean(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            Self::DateTime(dt) => {
                let items = strftime_items(format.unwrap_or_else(|| culture.date_format()))?;
                Ok(dt.format_with_items(items.iter()).to_string())
            }
        }
    }

    pub fn to_integer(&self, _culture: &Culture, format: Option<&str>) -> Result<i64, QueryError> {
        match self {
            Self::String(s) => {
                let text = s.trim();
                let parsed = match format {
                    Some(fmt) if fmt.eq_ignore_ascii_case("x") => {
                        let digits = text.trim_start_matches("0x").trim_start_matches("0X");
                        u64::from_str_radix(digits, 16).ok().map(|v| v as i64)
                    }
                    _ => text.parse::<i64>().ok(),
                };
                parsed.ok_or_else(|| QueryError::run_time(DataType::String, DataType::Integer, s.as_str()))
            }
            Self::Integer(i) => Ok(*i),
            Self::Float(x) => {
                let truncated = x.trunc();
                if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
                    Ok(truncated as i64)
                } else {
                    Err(QueryError::run_time(DataType::Float, DataType::Integer, x.to_string()))
                }
            }
            Self::Boolean(b) => Ok(i64::from(*b)),
            Self::DateTime(_) => Err(QueryError::ParseTimeConversion {
                from: DataType::DateTime,
                to: DataType::Integer,
            }),
        }
    }

    pub fn to_float(&self, culture: &Culture, _format: Option<&str>) -> Result<f64, QueryError> {
        match self {
            Self::String(s) => {
                let text = s.trim();
                let normalized = if culture.decimal_separator() == '.' {
                    text.to_string()
                } else {
                    text.replace(culture.decimal_separator(), ".")
                };
                normalized
                    .parse::<f64>()
                    .map_err(|_| QueryError::run_time(DataType::String, DataType::Float, s.as_str()))
            }
            Self::Integer(i) => Ok(*i as f64),
            Self::Float(x) => Ok(*x),
            other => Err(QueryError::ParseTimeConversion {
                from: other.data_type(),
                to: DataType::Float,
            }),
        }
    }

    pub fn to_boolean(&self, _culture: &Culture, _format: Option<&str>) -> Result<bool, QueryError> {
        match self {
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(QueryError::run_time(DataType::String, DataType::Boolean, s.as_str())),
            },
            Self::Integer(i) => Ok(*i != 0),
            Self::Boolean(b) => Ok(*b),
            other => Err(QueryError::ParseTimeConversion {
                from: other.data_type(),
                to: DataType::Boolean,
            }),
        }
    }

    pub fn to_datetime(&self, culture: &Culture, format: Option<&str>) -> Result<NaiveDateTime, QueryError> {
        match self {
            Self::String(s) => {
                let text = s.trim();
                let parsed = match format {
                    Some(fmt) => parse_datetime(text, fmt),
                    None => culture
                        .input_date_formats()
                        .iter()
                        .find_map(|fmt| parse_datetime(text, fmt)),
                };
                parsed.ok_or_else(|| QueryError::run_time(DataType::String, DataType::DateTime, s.as_str()))
            }
            Self::DateTime(dt) => Ok(*dt),
            other => Err(QueryError::ParseTimeConversion {
                from: other.data_type(),
                to: DataType::DateTime,
            }),
        }
    }

    /// Converts to `target`, reporting structural impossibility as a
    /// parse-time error.
    pub fn convert(&self, target: DataType, culture: &Culture, format: Option<&str>) -> Result<Self, QueryError> {
        if self.data_type() == target && format.is_none() {
            return Ok(self.clone());
        }
        Ok(match target {
            DataType::String => Self::String(self.to_text(culture, format)?),
            DataType::Integer => Self::Integer(self.to_integer(culture, format)?),
            DataType::Float => Self::Float(self.to_float(culture, format)?),
            DataType::Boolean => Self::Boolean(self.to_boolean(culture, format)?),
            DataType::DateTime => Self::DateTime(self.to_datetime(culture, format)?),
        })
    }

    /// Explicit conversion helper used when assigning to typed slots
    /// (variables, view parameters).
    pub fn cast(&self, target: DataType, culture: &Culture) -> Result<Self, QueryError> {
        if !self.data_type().can_convert_to(target) {
            return Err(QueryError::Conversion {
                from: self.data_type(),
                to: target,
            });
        }
        self.convert(target, culture, None)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

fn strftime_items(format: &str) -> Result<Vec<Item<'_>>, QueryError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(QueryError::InvalidFormat(format.to_string()));
    }
    Ok(items)
}

fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// Splits `D5` into (`'D'`, `Some(5)`).
fn split_format(format: &str) -> Result<(char, Option<usize>), QueryError> {
    let mut chars = format.chars();
    let kind = chars
        .next()
        .ok_or_else(|| QueryError::InvalidFormat(format.to_string()))?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Ok((kind, None));
    }
    rest.parse::<usize>()
        .map(|n| (kind, Some(n)))
        .map_err(|_| QueryError::InvalidFormat(format.to_string()))
}

fn format_integer(value: i64, format: &str) -> Result<String, QueryError> {
    match split_format(format)? {
        ('D' | 'd', width) => {
            let width = width.unwrap_or(0);
            if value < 0 {
                Ok(format!("-{:0width$}", value.unsigned_abs()))
            } else {
                Ok(format!("{value:0width$}"))
            }
        }
        ('X', width) => Ok(format!("{value:0width$X}", width = width.unwrap_or(0))),
        ('x', width) => Ok(format!("{value:0width$x}", width = width.unwrap_or(0))),
        _ => Err(QueryError::InvalidFormat(format.to_string())),
    }
}

fn format_float(value: f64, culture: &Culture, format: Option<&str>) -> Result<String, QueryError> {
    let text = match format {
        None => value.to_string(),
        Some(fmt) => match split_format(fmt)? {
            ('F' | 'f', digits) => format!("{value:.prec$}", prec = digits.unwrap_or(2)),
            ('E' | 'e', digits) => format!("{value:.prec$e}", prec = digits.unwrap_or(6)),
            _ => return Err(QueryError::InvalidFormat(fmt.to_string())),
        },
    };
    if culture.decimal_separator() == '.' {
        Ok(text)
    } else {
        Ok(text.replace('.', &culture.decimal_separator().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(13, 45, 7, 250)
            .unwrap()
    }

    #[test]
    fn test_round_trip_through_string() {
        for culture in [Culture::invariant(), Culture::from_name("de-DE").unwrap(), Culture::from_name("en-US").unwrap()] {
            let values = [
                Value::Integer(i64::MIN),
                Value::Integer(42),
                Value::Float(0.1),
                Value::Float(-12_345.678_9),
                Value::Float(1e-300),
                Value::Boolean(true),
                Value::Boolean(false),
                Value::DateTime(sample_datetime()),
            ];
            for value in values {
                let text = Value::String(value.to_text(&culture, None).unwrap());
                let back = text.convert(value.data_type(), &culture, None).unwrap();
                assert_eq!(back, value, "culture {}", culture.name());
            }
        }
    }

    #[test]
    fn test_culture_decimal_separator() {
        let de = Culture::from_name("de-DE").unwrap();
        assert_eq!(Value::Float(3.5).to_text(&de, None).unwrap(), "3,5");
        assert_eq!(Value::String("3,5".into()).to_float(&de, None).unwrap(), 3.5);
        assert_eq!(Value::Float(2.0).to_text(&de, Some("F2")).unwrap(), "2,00");
    }

    #[test]
    fn test_illegal_conversions_are_parse_time() {
        let c = Culture::invariant();
        let dt = Value::DateTime(sample_datetime());
        assert!(matches!(Value::Boolean(true).to_float(&c, None), Err(QueryError::ParseTimeConversion { .. })));
        assert!(matches!(Value::Boolean(false).to_datetime(&c, None), Err(QueryError::ParseTimeConversion { .. })));
        assert!(matches!(dt.to_integer(&c, None), Err(QueryError::ParseTimeConversion { .. })));
        assert!(matches!(dt.to_float(&c, None), Err(QueryError::ParseTimeConversion { .. })));
        assert!(matches!(Value::Float(1.0).to_boolean(&c, None), Err(QueryError::ParseTimeConversion { .. })));
        assert!(matches!(Value::Float(1.0).to_datetime(&c, None), Err(QueryError::ParseTimeConversion { .. })));
        assert!(matches!(Value::Integer(1).to_datetime(&c, None), Err(QueryError::ParseTimeConversion { .. })));
    }

    #[test]
    fn test_run_time_conversion_carries_value() {
        let err = Value::String("abc".into())
            .to_integer(&Culture::invariant(), None)
            .unwrap_err();
        match err {
            QueryError::RunTimeConversion { from, to, value } => {
                assert_eq!(from, DataType::String);
                assert_eq!(to, DataType::Integer);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_integer_formats() {
        let c = Culture::invariant();
        assert_eq!(Value::Integer(42).to_text(&c, Some("D5")).unwrap(), "00042");
        assert_eq!(Value::Integer(-42).to_text(&c, Some("D4")).unwrap(), "-0042");
        assert_eq!(Value::Integer(255).to_text(&c, Some("X")).unwrap(), "FF");
        assert_eq!(Value::String("ff".into()).to_integer(&c, Some("x")).unwrap(), 255);
        assert!(matches!(Value::Integer(1).to_text(&c, Some("Q")), Err(QueryError::InvalidFormat(_))));
    }

    #[test]
    fn test_datetime_formats() {
        let c = Culture::invariant();
        let dt = Value::DateTime(sample_datetime());
        assert_eq!(dt.to_text(&c, Some("%Y/%m/%d")).unwrap(), "2024/02/29");
        let parsed = Value::String("29.02.2024".into())
            .to_datetime(&Culture::from_name("de-DE").unwrap(), None)
            .unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(matches!(dt.to_text(&c, Some("%Q")), Err(QueryError::InvalidFormat(_))));
    }

    #[test]
    fn test_float_to_integer_truncates() {
        let c = Culture::invariant();
        assert_eq!(Value::Float(-3.9).to_integer(&c, None).unwrap(), -3);
        assert!(matches!(Value::Float(f64::NAN).to_integer(&c, None), Err(QueryError::RunTimeConversion { .. })));
    }

    #[test]
    fn test_cast_reports_conversion_kind() {
        let c = Culture::invariant();
        assert!(matches!(
            Value::DateTime(sample_datetime()).cast(DataType::Float, &c),
            Err(QueryError::Conversion { .. })
        ));
        assert_eq!(Value::Integer(5).cast(DataType::Float, &c).unwrap(), Value::Float(5.0));
    }
}
