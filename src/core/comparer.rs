/// Culture- and case-aware ordering over values
///
/// String comparison is linguistic rather than byte-wise: text is first
/// compared with accents and case folded away, then by accents, then (only
/// when case-sensitive) by case with lower case sorting first.

use std::cmp::Ordering;
use super::culture::Culture;
use super::error::QueryError;
use super::value::Value;

/// Relational operators. Each one is a three-way test plus a negation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
}

impl CompareOp {
    /// The ordering being tested and whether the test result is negated.
    #[must_use]
    pub const fn test_and_negate(self) -> (Ordering, bool) {
        match self {
            Self::Equal => (Ordering::Equal, false),
            Self::NotEqual => (Ordering::Equal, true),
            Self::Less => (Ordering::Less, false),
            Self::GreaterOrEqual => (Ordering::Less, true),
            Self::Greater => (Ordering::Greater, false),
            Self::LessOrEqual => (Ordering::Greater, true),
        }
    }

    #[must_use]
    pub fn matches(self, ordering: Ordering) -> bool {
        let (expected, negate) = self.test_and_negate();
        (ordering == expected) != negate
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Comparer {
    culture: Culture,
    case_sensitive: bool,
}

impl Comparer {
    #[must_use]
    pub const fn new(culture: Culture, case_sensitive: bool) -> Self {
        Self { culture, case_sensitive }
    }

    #[must_use]
    pub const fn culture(&self) -> &Culture {
        &self.culture
    }

    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Three-way comparison. Values of different kinds are only comparable
    /// when one side is a string (both are then compared as text) or both
    /// are numeric.
    pub fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, QueryError> {
        match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(self.compare_strings(a, b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                let a = left.to_text(&self.culture, None)?;
                let b = right.to_text(&self.culture, None)?;
                Ok(self.compare_strings(&a, &b))
            }
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
            (Value::Integer(a), Value::Float(b)) => Ok((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Integer(b)) => Ok(a.total_cmp(&(*b as f64))),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Ok(a.cmp(b)),
            _ => Err(QueryError::TypeMismatch(format!(
                "cannot compare {} with {}",
                left.data_type(),
                right.data_type()
            ))),
        }
    }

    pub fn test(&self, op: CompareOp, left: &Value, right: &Value) -> Result<bool, QueryError> {
        Ok(op.matches(self.compare(left, right)?))
    }

    #[must_use]
    pub fn compare_strings(&self, a: &str, b: &str) -> Ordering {
        if self.culture.is_ordinal() {
            return if self.case_sensitive {
                a.cmp(b)
            } else {
                a.to_lowercase().cmp(&b.to_lowercase())
            };
        }

        let primary = fold(&self.culture, a, true).cmp(&fold(&self.culture, b, true));
        if primary != Ordering::Equal {
            return primary;
        }
        let secondary = fold(&self.culture, a, false).cmp(&fold(&self.culture, b, false));
        if secondary != Ordering::Equal || !self.case_sensitive {
            return secondary;
        }
        tertiary(a, b)
    }
}

/// Lower-cases and optionally strips accents.
fn fold(culture: &Culture, text: &str, strip_accents: bool) -> Vec<char> {
    let lowered = culture.to_lower(text);
    if strip_accents {
        lowered.chars().filter_map(base_letter).collect()
    } else {
        lowered.chars().collect()
    }
}

fn base_letter(c: char) -> Option<char> {
    Some(match c {
        'à'..='å' => 'a',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        '\u{0300}'..='\u{036F}' => return None,
        other => other,
    })
}

/// Case tie-break: at the first differing character lower case wins.
fn tertiary(a: &str, b: &str) -> Ordering {
    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            return match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            };
        }
    }
    a.chars().count().cmp(&b.chars().count())
}
