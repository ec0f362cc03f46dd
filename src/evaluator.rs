use std::cmp::Ordering;

use crate::{
    ast::{CmpOp, Expr},
    binding::Binding,
    methods,
    value::{Record, Value},
};

/// Errors that can occur while an expression is evaluated against an element.
///
/// All of them abort the enumeration in progress; none are retried.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A placeholder name is not the one bound for this element
    UnboundReference(String),

    /// The operation is not defined for the receiver's runtime type
    UnsupportedOperation {
        operation: String,
        receiver: &'static str,
    },

    /// Index out of range, of the wrong type, or with the wrong arity
    IndexError(String),

    /// Operands of incompatible types
    TypeMismatch(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnboundReference(name) => {
                write!(f, "Unbound reference: '{}' is not the bound item name", name)
            }
            EvalError::UnsupportedOperation {
                operation,
                receiver,
            } => write!(
                f,
                "Unsupported operation: '{}' is not defined for {}",
                operation, receiver
            ),
            EvalError::IndexError(msg) => write!(f, "Index error: {}", msg),
            EvalError::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
        }
    }
}

impl std::error::Error for EvalError {}

impl Expr {
    /// Evaluates this tree against a binding.
    ///
    /// Composite nodes evaluate their receiver or base first, then their
    /// arguments or indices left to right, then apply.
    ///
    /// ```
    /// use table_query::{Binding, Expr, Value};
    ///
    /// let predicate = Expr::reference("score").gt(80);
    /// let item = Value::from(92);
    ///
    /// let result = predicate.evaluate(&Binding::new("score", &item)).unwrap();
    /// assert_eq!(result, Value::Boolean(true));
    /// ```
    pub fn evaluate(&self, binding: &Binding<'_>) -> Result<Value, EvalError> {
        eval_expr(self, binding)
    }
}

fn eval_expr(expr: &Expr, binding: &Binding<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Constant(value) => Ok(value.clone()),
        Expr::FieldRef(name) => binding
            .lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::UnboundReference(name.clone())),
        Expr::Field { record, name } => {
            let value = eval_expr(record, binding)?;
            read_field(&value, name)
        }
        Expr::Index { base, indices } => {
            let base = eval_expr(base, binding)?;
            let indices = eval_all(indices, binding)?;
            apply_index(&base, &indices)
        }
        Expr::Call {
            receiver,
            method,
            args,
        } => {
            let receiver = eval_expr(receiver, binding)?;
            let args = eval_all(args, binding)?;
            methods::dispatch(&receiver, method, &args)
        }
        Expr::Comparison { op, left, right } => {
            let left = eval_expr(left, binding)?;
            let right = eval_expr(right, binding)?;
            apply_comparison(*op, &left, &right)
        }
        Expr::Record(fields) => {
            let mut record = Record::new();
            for (key, expr) in fields {
                record.insert(key.clone(), eval_expr(expr, binding)?);
            }
            Ok(Value::Record(record))
        }
    }
}

fn eval_all(exprs: &[Expr], binding: &Binding<'_>) -> Result<Vec<Value>, EvalError> {
    exprs.iter().map(|expr| eval_expr(expr, binding)).collect()
}

fn read_field(value: &Value, name: &str) -> Result<Value, EvalError> {
    value
        .as_record()
        .and_then(|record| record.get(name))
        .cloned()
        .ok_or_else(|| EvalError::UnsupportedOperation {
            operation: name.to_string(),
            receiver: value.type_name(),
        })
}

/// Resolves a possibly negative position against a length.
fn resolve_position(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = index.unsigned_abs() as usize;
        len.checked_sub(back)
    } else {
        Some(index as usize)
    }
}

fn integer_index(value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| {
        EvalError::IndexError(format!(
            "index must be an integer, got {}",
            value.type_name()
        ))
    })
}

pub(crate) fn apply_index(base: &Value, indices: &[Value]) -> Result<Value, EvalError> {
    match (base, indices) {
        (Value::Array(arr), [index]) => {
            let n = integer_index(index)?;
            resolve_position(n, arr.len())
                .and_then(|pos| arr.get(pos))
                .cloned()
                .ok_or_else(|| {
                    EvalError::IndexError(format!(
                        "index {} out of range for array of length {}",
                        n,
                        arr.len()
                    ))
                })
        }
        (Value::Array(arr), [start, len]) => {
            let range = slice_range(arr.len(), start, len)?;
            Ok(Value::Array(arr[range].to_vec()))
        }
        (Value::String(s), [index]) => {
            let n = integer_index(index)?;
            let chars: Vec<char> = s.chars().collect();
            resolve_position(n, chars.len())
                .and_then(|pos| chars.get(pos))
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| {
                    EvalError::IndexError(format!(
                        "index {} out of range for string of length {}",
                        n,
                        chars.len()
                    ))
                })
        }
        (Value::String(s), [start, len]) => {
            let chars: Vec<char> = s.chars().collect();
            let range = slice_range(chars.len(), start, len)?;
            Ok(Value::String(chars[range].iter().collect()))
        }
        (Value::Record(record), [Value::String(key)]) => {
            record.get(key).cloned().ok_or_else(|| {
                EvalError::IndexError(format!("record has no field '{}'", key))
            })
        }
        (Value::Record(_), [key]) => Err(EvalError::IndexError(format!(
            "record keys must be strings, got {}",
            key.type_name()
        ))),
        (Value::Array(_) | Value::String(_) | Value::Record(_), _) => {
            Err(EvalError::IndexError(format!(
                "wrong number of indices for {}: {}",
                base.type_name(),
                indices.len()
            )))
        }
        _ => Err(EvalError::IndexError(format!(
            "cannot index into {}",
            base.type_name()
        ))),
    }
}

/// `[start, len]` slicing: the slice is clipped at the end, but `start` must
/// lie within the sequence (or equal its length).
fn slice_range(
    total: usize,
    start: &Value,
    len: &Value,
) -> Result<std::ops::Range<usize>, EvalError> {
    let start_n = integer_index(start)?;
    let len_n = integer_index(len)?;
    let from = resolve_position(start_n, total)
        .filter(|pos| *pos <= total)
        .ok_or_else(|| {
            EvalError::IndexError(format!(
                "slice start {} out of range for length {}",
                start_n, total
            ))
        })?;
    if len_n < 0 {
        return Err(EvalError::IndexError(format!(
            "slice length must not be negative, got {}",
            len_n
        )));
    }
    let to = from.saturating_add(len_n as usize).min(total);
    Ok(from..to)
}

/// Orders two values when their types are mutually ordered: numbers with
/// numbers, strings with strings, booleans with booleans.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality used by `==`: numbers compare by magnitude across integer and
/// float, everything else structurally.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return compare_values(left, right) == Some(Ordering::Equal);
    }
    left == right
}

fn apply_comparison(op: CmpOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let wanted: &[Ordering] = match op {
        CmpOp::Equal => return Ok(Value::Boolean(values_equal(left, right))),
        CmpOp::NotEqual => return Ok(Value::Boolean(!values_equal(left, right))),
        CmpOp::LessThan => &[Ordering::Less],
        CmpOp::GreaterThan => &[Ordering::Greater],
        CmpOp::LessEqual => &[Ordering::Less, Ordering::Equal],
        CmpOp::GreaterEqual => &[Ordering::Greater, Ordering::Equal],
    };
    let ordering = compare_values(left, right).ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "cannot compare {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ))
    })?;
    Ok(Value::Boolean(wanted.contains(&ordering)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with(expr: &Expr, name: &str, item: Value) -> Result<Value, EvalError> {
        expr.evaluate(&Binding::new(name, &item))
    }

    #[test]
    fn negative_positions_count_from_the_end() {
        assert_eq!(resolve_position(-1, 4), Some(3));
        assert_eq!(resolve_position(-5, 4), None);
        assert_eq!(resolve_position(2, 4), Some(2));
    }

    #[test]
    fn nan_is_not_ordered() {
        let expr = Expr::reference("x").lt(1.0);
        assert_eq!(
            eval_with(&expr, "x", Value::Float(f64::NAN)),
            Err(EvalError::TypeMismatch("cannot compare float < float".to_string()))
        );
    }

    #[test]
    fn slice_start_at_length_is_empty() {
        let expr = Expr::reference("s").slice(5, 2);
        assert_eq!(eval_with(&expr, "s", Value::from("beans")), Ok(Value::from("")));
    }

    #[test]
    fn equality_is_numeric_across_integer_and_float() {
        let expr = Expr::reference("x").equals(2.0);
        assert_eq!(eval_with(&expr, "x", Value::from(2)), Ok(Value::Boolean(true)));
    }
}
