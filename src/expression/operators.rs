use crate::core::{QueryError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Both operands must already be of the same numeric kind.
pub fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Result<Value, QueryError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer(op, *a, *b).map(Value::Integer),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float(op, *a, *b))),
        _ => Err(QueryError::TypeMismatch(format!(
            "{} {} {}",
            left.data_type(),
            op.symbol(),
            right.data_type()
        ))),
    }
}

// Division and remainder truncate toward zero
fn integer(op: ArithmeticOp, a: i64, b: i64) -> Result<i64, QueryError> {
    Ok(match op {
        ArithmeticOp::Add => a.wrapping_add(b),
        ArithmeticOp::Subtract => a.wrapping_sub(b),
        ArithmeticOp::Multiply => a.wrapping_mul(b),
        ArithmeticOp::Divide => {
            if b == 0 {
                return Err(QueryError::DivisionByZero);
            }
            a.wrapping_div(b)
        }
        ArithmeticOp::Modulo => {
            if b == 0 {
                return Err(QueryError::DivisionByZero);
            }
            a.wrapping_rem(b)
        }
    })
}

fn float(op: ArithmeticOp, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => a / b,
        ArithmeticOp::Modulo => a % b,
    }
}

pub fn negate(value: &Value) -> Result<Value, QueryError> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_neg())),
        Value::Float(x) => Ok(Value::Float(-x)),
        other => Err(QueryError::TypeMismatch(format!("cannot negate {}", other.data_type()))),
    }
}

pub fn expect_bool(value: &Value) -> Result<bool, QueryError> {
    value
        .as_bool()
        .ok_or_else(|| QueryError::TypeMismatch(format!("expected BOOLEAN, found {}", value.data_type())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(arithmetic(ArithmeticOp::Divide, &Value::Integer(7), &Value::Integer(2)).unwrap(), Value::Integer(3));
        assert_eq!(arithmetic(ArithmeticOp::Divide, &Value::Integer(-7), &Value::Integer(2)).unwrap(), Value::Integer(-3));
        assert_eq!(arithmetic(ArithmeticOp::Modulo, &Value::Integer(-7), &Value::Integer(2)).unwrap(), Value::Integer(-1));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            arithmetic(ArithmeticOp::Divide, &Value::Integer(1), &Value::Integer(0)),
            Err(QueryError::DivisionByZero)
        ));
        let inf = arithmetic(ArithmeticOp::Divide, &Value::Float(1.0), &Value::Float(0.0)).unwrap();
        assert_eq!(inf, Value::Float(f64::INFINITY));
    }

    #[test]
    fn test_no_cross_kind_arithmetic() {
        assert!(matches!(
            arithmetic(ArithmeticOp::Add, &Value::Integer(1), &Value::Float(1.0)),
            Err(QueryError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(&Value::Integer(5)).unwrap(), Value::Integer(-5));
        assert!(negate(&Value::Boolean(true)).is_err());
    }
}
