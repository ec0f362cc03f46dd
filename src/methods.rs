//! The closed set of operations a `Call` node may name.
//!
//! Dispatch is by operation name and the receiver's runtime type. Arguments
//! arrive already evaluated. Any combination not listed here fails with
//! [`EvalError::UnsupportedOperation`].

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    evaluator::{EvalError, compare_values, values_equal},
    value::Value,
};

/// Dispatch method calls to their implementations
pub(crate) fn dispatch(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match (method, receiver) {
        // Operators
        ("+" | "-" | "*" | "/" | "%", _) => {
            let rhs = single_arg(method, args)?;
            arithmetic(method, receiver, rhs)
        }
        ("and", Value::Boolean(a)) => Ok(Value::Boolean(*a && bool_arg(method, args)?)),
        ("or", Value::Boolean(a)) => Ok(Value::Boolean(*a || bool_arg(method, args)?)),
        ("not", Value::Boolean(a)) => {
            no_args(method, args)?;
            Ok(Value::Boolean(!a))
        }
        // Any value
        ("type", _) => {
            no_args(method, args)?;
            Ok(Value::String(receiver.type_name().to_string()))
        }
        (_, Value::String(s)) => string_method(s, method, args),
        (_, Value::Array(items)) => array_method(items, method, args),
        (_, Value::Record(record)) => match method {
            "keys" => {
                no_args(method, args)?;
                Ok(Value::Array(record.keys().map(Value::from).collect()))
            }
            "values" => {
                no_args(method, args)?;
                Ok(Value::Array(record.values().cloned().collect()))
            }
            "length" => {
                no_args(method, args)?;
                Ok(Value::Integer(record.len() as i64))
            }
            "contains" => {
                let key = string_arg(method, args)?;
                Ok(Value::Boolean(record.contains_key(key)))
            }
            _ => Err(unsupported(method, receiver)),
        },
        _ => Err(unsupported(method, receiver)),
    }
}

fn unsupported(method: &str, receiver: &Value) -> EvalError {
    EvalError::UnsupportedOperation {
        operation: method.to_string(),
        receiver: receiver.type_name(),
    }
}

fn no_args(method: &str, args: &[Value]) -> Result<(), EvalError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(EvalError::TypeMismatch(format!(
            ".{}() takes no arguments, got {}",
            method,
            args.len()
        )))
    }
}

fn single_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a Value, EvalError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(EvalError::TypeMismatch(format!(
            "'{}' takes exactly one argument, got {}",
            method,
            args.len()
        ))),
    }
}

fn bool_arg(method: &str, args: &[Value]) -> Result<bool, EvalError> {
    let arg = single_arg(method, args)?;
    arg.as_bool().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "'{}' requires a boolean argument, got {}",
            method,
            arg.type_name()
        ))
    })
}

fn string_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a str, EvalError> {
    let arg = single_arg(method, args)?;
    arg.as_str().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            ".{}() argument must be string, got {}",
            method,
            arg.type_name()
        ))
    })
}

// ========================================
// Arithmetic
// ========================================

fn arithmetic(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(op, *a, *b))),
        (Value::Integer(a), Value::Float(b)) => {
            Ok(mixed_arithmetic(op, Decimal::from_i64(*a), Decimal::from_f64(*b))
                .unwrap_or_else(|| Value::Float(float_op(op, *a as f64, *b))))
        }
        (Value::Float(a), Value::Integer(b)) => {
            Ok(mixed_arithmetic(op, Decimal::from_f64(*a), Decimal::from_i64(*b))
                .unwrap_or_else(|| Value::Float(float_op(op, *a, *b as f64))))
        }
        (Value::String(a), Value::String(b)) if op == "+" => Ok(Value::String(format!("{}{}", a, b))),
        (Value::Array(a), Value::Array(b)) if op == "+" => {
            Ok(Value::Array(a.iter().chain(b).cloned().collect()))
        }
        (Value::Integer(_) | Value::Float(_), other) => Err(EvalError::TypeMismatch(format!(
            "cannot apply {} to {} and {}",
            op,
            left.type_name(),
            other.type_name()
        ))),
        _ => Err(unsupported(op, left)),
    }
}

fn integer_arithmetic(op: &str, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::TypeMismatch(format!("integer overflow in {} {} {}", a, op, b));
    match op {
        "+" => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
        "-" => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
        "*" => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
        "/" | "%" if b == 0 => Err(EvalError::TypeMismatch(format!(
            "integer division by zero in {} {} {}",
            a, op, b
        ))),
        "/" => {
            let rem = a.checked_rem(b).ok_or_else(overflow)?;
            // Exact division stays integral
            if rem == 0 {
                a.checked_div(b).map(Value::Integer).ok_or_else(overflow)
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        _ => a.checked_rem(b).map(Value::Integer).ok_or_else(overflow),
    }
}

fn float_op(op: &str, a: f64, b: f64) -> f64 {
    match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        _ => a % b,
    }
}

/// Mixed integer/float arithmetic through `Decimal`, so that `100 * 1.1` is
/// exactly `110`. Whole results come back as integers.
fn mixed_arithmetic(op: &str, a: Option<Decimal>, b: Option<Decimal>) -> Option<Value> {
    let (a, b) = (a?, b?);
    let result = match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => a.checked_div(b),
        _ => a.checked_rem(b),
    }?;
    if result.is_integer()
        && let Some(n) = result.to_i64()
    {
        return Some(Value::Integer(n));
    }
    result.to_f64().map(Value::Float)
}

// ========================================
// String Methods
// ========================================

fn string_method(s: &str, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match method {
        "length" => {
            no_args(method, args)?;
            Ok(Value::Integer(s.chars().count() as i64))
        }
        "upper" => {
            no_args(method, args)?;
            Ok(Value::String(s.to_uppercase()))
        }
        "lower" => {
            no_args(method, args)?;
            Ok(Value::String(s.to_lowercase()))
        }
        "trim" => {
            no_args(method, args)?;
            Ok(Value::String(s.trim().to_string()))
        }
        "reverse" => {
            no_args(method, args)?;
            Ok(Value::String(s.chars().rev().collect()))
        }
        "contains" => Ok(Value::Boolean(s.contains(string_arg(method, args)?))),
        "startswith" => Ok(Value::Boolean(s.starts_with(string_arg(method, args)?))),
        "endswith" => Ok(Value::Boolean(s.ends_with(string_arg(method, args)?))),
        "matches" => {
            let pattern = string_arg(method, args)?;
            let re = regex::Regex::new(pattern)
                .map_err(|e| EvalError::TypeMismatch(format!("invalid regex: {e}")))?;
            Ok(Value::Boolean(re.is_match(s)))
        }
        "split" => {
            let delim = string_arg(method, args)?;
            let parts: Vec<Value> = if delim.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(delim).map(Value::from).collect()
            };
            Ok(Value::Array(parts))
        }
        _ => Err(EvalError::UnsupportedOperation {
            operation: method.to_string(),
            receiver: "string",
        }),
    }
}

// ========================================
// Array Methods
// ========================================

fn array_method(items: &[Value], method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match method {
        "length" => {
            no_args(method, args)?;
            Ok(Value::Integer(items.len() as i64))
        }
        "first" => {
            no_args(method, args)?;
            Ok(items.first().cloned().unwrap_or(Value::Null))
        }
        "last" => {
            no_args(method, args)?;
            Ok(items.last().cloned().unwrap_or(Value::Null))
        }
        "reverse" => {
            no_args(method, args)?;
            Ok(Value::Array(items.iter().rev().cloned().collect()))
        }
        "contains" => {
            let needle = single_arg(method, args)?;
            Ok(Value::Boolean(items.iter().any(|item| values_equal(item, needle))))
        }
        "sum" => {
            no_args(method, args)?;
            items
                .iter()
                .try_fold(Value::Integer(0), |acc, item| arithmetic("+", &acc, item))
        }
        "min" => {
            no_args(method, args)?;
            extreme(items, method, std::cmp::Ordering::Less)
        }
        "max" => {
            no_args(method, args)?;
            extreme(items, method, std::cmp::Ordering::Greater)
        }
        "sort" => {
            no_args(method, args)?;
            // Validate up front; sort_by itself cannot fail
            extreme(items, method, std::cmp::Ordering::Less)?;
            let mut sorted = items.to_vec();
            sorted.sort_by(|a, b| compare_values(a, b).unwrap_or(std::cmp::Ordering::Equal));
            Ok(Value::Array(sorted))
        }
        _ => Err(EvalError::UnsupportedOperation {
            operation: method.to_string(),
            receiver: "array",
        }),
    }
}

/// Picks the element that compares `wanted` against all others. Elements must
/// be mutually ordered.
fn extreme(items: &[Value], method: &str, wanted: std::cmp::Ordering) -> Result<Value, EvalError> {
    let mut best: Option<&Value> = None;
    for item in items {
        match best {
            None => best = Some(item),
            Some(current) => {
                let ordering = compare_values(item, current).ok_or_else(|| {
                    EvalError::TypeMismatch(format!(
                        ".{}() cannot order {} against {}",
                        method,
                        item.type_name(),
                        current.type_name()
                    ))
                })?;
                if ordering == wanted {
                    best = Some(item);
                }
            }
        }
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_arithmetic_is_decimal_exact() {
        assert_eq!(
            dispatch(&Value::Integer(100), "*", &[Value::Float(1.1)]),
            Ok(Value::Integer(110))
        );
        assert_eq!(
            dispatch(&Value::Float(0.1), "+", &[Value::Integer(1)]),
            Ok(Value::Float(1.1))
        );
    }

    #[test]
    fn inexact_integer_division_yields_float() {
        assert_eq!(
            dispatch(&Value::Integer(7), "/", &[Value::Integer(2)]),
            Ok(Value::Float(3.5))
        );
        assert_eq!(
            dispatch(&Value::Integer(8), "/", &[Value::Integer(2)]),
            Ok(Value::Integer(4))
        );
    }

    #[test]
    fn integer_division_by_zero_is_rejected() {
        assert!(matches!(
            dispatch(&Value::Integer(1), "%", &[Value::Integer(0)]),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn integer_min_over_minus_one_is_an_overflow() {
        for op in ["/", "%"] {
            assert_eq!(
                dispatch(&Value::Integer(i64::MIN), op, &[Value::Integer(-1)]),
                Err(EvalError::TypeMismatch(format!(
                    "integer overflow in {} {} -1",
                    i64::MIN,
                    op
                )))
            );
        }
    }

    #[test]
    fn sum_keeps_integers_until_a_float_appears() {
        let ints = Value::from(vec![99, 82, 81, 79]);
        assert_eq!(dispatch(&ints, "sum", &[]), Ok(Value::Integer(341)));

        let mixed = Value::Array(vec![Value::Integer(1), Value::Float(0.5)]);
        assert_eq!(dispatch(&mixed, "sum", &[]), Ok(Value::Float(1.5)));
    }

    #[test]
    fn min_and_max_need_ordered_elements() {
        let scores = Value::from(vec![35, 72, 91, 70]);
        assert_eq!(dispatch(&scores, "min", &[]), Ok(Value::Integer(35)));
        assert_eq!(dispatch(&scores, "max", &[]), Ok(Value::Integer(91)));

        let mixed = Value::Array(vec![Value::Integer(1), Value::from("a")]);
        assert!(matches!(
            dispatch(&mixed, "max", &[]),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn string_methods() {
        let name = Value::from("Svetlana");
        assert_eq!(dispatch(&name, "upper", &[]), Ok(Value::from("SVETLANA")));
        assert_eq!(dispatch(&name, "length", &[]), Ok(Value::Integer(8)));
        assert_eq!(
            dispatch(&name, "startswith", &[Value::from("Svet")]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            dispatch(&name, "matches", &[Value::from("^S.*a$")]),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn unknown_operations_are_unsupported() {
        assert_eq!(
            dispatch(&Value::Integer(1), "upper", &[]),
            Err(EvalError::UnsupportedOperation {
                operation: "upper".to_string(),
                receiver: "integer",
            })
        );
        assert_eq!(
            dispatch(&Value::from("x"), "and", &[Value::Boolean(true)]),
            Err(EvalError::UnsupportedOperation {
                operation: "and".to_string(),
                receiver: "string",
            })
        );
    }
}
