//! Construction-time DSL for expression trees.
//!
//! Stage builders receive the source placeholder as an [`Expr`] and return a
//! new tree made with the methods below. Nothing here touches data: every
//! method only allocates nodes, and the same inputs always produce
//! structurally identical trees.
//!
//! Operands are promoted with a fixed rule. Numbers and text become
//! [`Expr::Constant`], expressions are used as they are, and records become
//! [`Expr::Record`]. Any other literal is rejected with
//! [`BuildError::UnsupportedLiteralType`].
//!
//! ```
//! use table_query::Expr;
//!
//! let student = Expr::reference("student");
//! let predicate = student.field("exam_scores").at(1).gt(90);
//!
//! assert_eq!(predicate.to_string(), "student.exam_scores[1] > 90");
//! ```

use std::ops::{Add, Div, Mul, Rem, Sub};

use crate::{
    ast::{CmpOp, Expr},
    value::Value,
};

/// Errors raised while an expression is being built.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The value cannot be lifted into an expression (names its type)
    UnsupportedLiteralType(&'static str),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::UnsupportedLiteralType(type_name) => write!(
                f,
                "Unsupported literal type: {} (expected number, string, record or expression)",
                type_name
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// Promotion of a builder result into an expression tree.
///
/// Stage constructors accept anything that implements `Lift`, so a builder
/// closure may return an [`Expr`], a plain number or string, a dynamic
/// [`Value`], or a `Result` from a fallible conversion.
pub trait Lift {
    fn lift(self) -> Result<Expr, BuildError>;
}

impl Lift for Expr {
    fn lift(self) -> Result<Expr, BuildError> {
        Ok(self)
    }
}

impl Lift for &Expr {
    fn lift(self) -> Result<Expr, BuildError> {
        Ok(self.clone())
    }
}

impl Lift for Result<Expr, BuildError> {
    fn lift(self) -> Result<Expr, BuildError> {
        self
    }
}

impl Lift for Value {
    fn lift(self) -> Result<Expr, BuildError> {
        Expr::try_from(self)
    }
}

macro_rules! constant_operand {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Constant(Value::from(value))
                }
            }

            impl Lift for $ty {
                fn lift(self) -> Result<Expr, BuildError> {
                    Ok(Expr::from(self))
                }
            }
        )*
    };
}

constant_operand!(i32, i64, u32, f64, &str, String);

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl TryFrom<Value> for Expr {
    type Error = BuildError;

    /// Lifts a dynamic value. Record field values stay literal constants.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(_) | Value::Float(_) | Value::String(_) => Ok(Expr::Constant(value)),
            Value::Record(record) => Ok(Expr::Record(
                record
                    .into_iter()
                    .map(|(key, value)| (key, Expr::Constant(value)))
                    .collect(),
            )),
            other => Err(BuildError::UnsupportedLiteralType(other.type_name())),
        }
    }
}

impl Expr {
    /// Placeholder for the element bound to `name`.
    pub fn reference(name: impl Into<String>) -> Self {
        Expr::FieldRef(name.into())
    }

    /// Wraps any value as a constant, without the literal promotion check.
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// Record literal with keys in the given order.
    ///
    /// ```
    /// use table_query::Expr;
    ///
    /// let student = Expr::reference("student");
    /// let projection = Expr::record([
    ///     ("name", student.field("first_name")),
    ///     ("score", student.field("exam_scores").at(1)),
    /// ]);
    ///
    /// assert_eq!(
    ///     projection.to_string(),
    ///     "{name: student.first_name, score: student.exam_scores[1]}"
    /// );
    /// ```
    pub fn record<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Expr>,
        I: IntoIterator<Item = (K, V)>,
    {
        Expr::Record(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn field(&self, name: impl Into<String>) -> Expr {
        Expr::Field {
            record: Box::new(self.clone()),
            name: name.into(),
        }
    }

    /// Single index, e.g. `scores[1]` or `vegetable[0]`.
    pub fn at(&self, index: impl Into<Expr>) -> Expr {
        self.index([index.into()])
    }

    /// Two-index form `base[start, len]`.
    pub fn slice(&self, start: impl Into<Expr>, len: impl Into<Expr>) -> Expr {
        self.index([start.into(), len.into()])
    }

    pub fn index(&self, indices: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Index {
            base: Box::new(self.clone()),
            indices: indices.into_iter().collect(),
        }
    }

    /// Named operation on this receiver, resolved at evaluation time against
    /// the closed set of operations for the receiver's type.
    pub fn call<A>(&self, method: impl Into<String>, args: A) -> Expr
    where
        A: IntoIterator,
        A::Item: Into<Expr>,
    {
        Expr::Call {
            receiver: Box::new(self.clone()),
            method: method.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn compare(&self, op: CmpOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Comparison {
            op,
            left: Box::new(self.clone()),
            right: Box::new(rhs.into()),
        }
    }

    pub fn gt(&self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::GreaterThan, rhs)
    }

    pub fn ge(&self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::GreaterEqual, rhs)
    }

    pub fn lt(&self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::LessThan, rhs)
    }

    pub fn le(&self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::LessEqual, rhs)
    }

    pub fn equals(&self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::Equal, rhs)
    }

    pub fn not_equals(&self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CmpOp::NotEqual, rhs)
    }

    pub fn and(&self, rhs: impl Into<Expr>) -> Expr {
        let rhs: Expr = rhs.into();
        self.call("and", [rhs])
    }

    pub fn or(&self, rhs: impl Into<Expr>) -> Expr {
        let rhs: Expr = rhs.into();
        self.call("or", [rhs])
    }

    pub fn not(&self) -> Expr {
        self.call("not", Vec::<Expr>::new())
    }
}

macro_rules! operator_call {
    ($($trait:ident :: $fn:ident => $symbol:literal),*) => {
        $(
            impl<R: Into<Expr>> $trait<R> for Expr {
                type Output = Expr;

                fn $fn(self, rhs: R) -> Expr {
                    Expr::Call {
                        receiver: Box::new(self),
                        method: $symbol.to_string(),
                        args: vec![rhs.into()],
                    }
                }
            }

            impl<R: Into<Expr>> $trait<R> for &Expr {
                type Output = Expr;

                fn $fn(self, rhs: R) -> Expr {
                    let rhs: Expr = rhs.into();
                    self.call($symbol, [rhs])
                }
            }
        )*
    };
}

operator_call!(
    Add::add => "+",
    Sub::sub => "-",
    Mul::mul => "*",
    Div::div => "/",
    Rem::rem => "%"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    #[test]
    fn plain_literals_become_constants() {
        assert_eq!(80i64.lift(), Ok(Expr::Constant(Value::Integer(80))));
        assert_eq!("c".lift(), Ok(Expr::Constant(Value::from("c"))));
        assert_eq!(Value::Float(1.5).lift(), Ok(Expr::Constant(Value::Float(1.5))));
    }

    #[test]
    fn record_values_are_promoted_field_by_field() {
        let record: Record = [("a", Value::from(1)), ("b", Value::Boolean(true))]
            .into_iter()
            .collect();

        assert_eq!(
            Expr::try_from(Value::Record(record)),
            Ok(Expr::Record(vec![
                ("a".to_string(), Expr::Constant(Value::Integer(1))),
                ("b".to_string(), Expr::Constant(Value::Boolean(true))),
            ]))
        );
    }

    #[test]
    fn unsupported_literals_are_rejected() {
        assert_eq!(
            Value::Boolean(true).lift(),
            Err(BuildError::UnsupportedLiteralType("boolean"))
        );
        assert_eq!(
            Value::Null.lift(),
            Err(BuildError::UnsupportedLiteralType("null"))
        );
        assert_eq!(
            Value::from(vec![1, 2]).lift(),
            Err(BuildError::UnsupportedLiteralType("array"))
        );
    }

    #[test]
    fn builders_are_pure() {
        let score = Expr::reference("score");
        assert_eq!(score.gt(80), score.gt(80));
        assert_eq!(score.field("x").at(0), score.field("x").at(0));
    }

    #[test]
    fn operators_build_calls() {
        let score = Expr::reference("score");
        let sum = &score + 5;

        assert_eq!(
            sum,
            Expr::Call {
                receiver: Box::new(score.clone()),
                method: "+".to_string(),
                args: vec![Expr::Constant(Value::Integer(5))],
            }
        );
        assert_eq!((score * 2).to_string(), "(score * 2)");
    }

    #[test]
    fn rendering_reads_like_source() {
        let word = Expr::reference("word");
        assert_eq!(word.slice(1, 3).to_string(), "word[1, 3]");
        assert_eq!(word.call("upper", Vec::<Expr>::new()).to_string(), "word.upper()");
        assert_eq!(word.at(0).equals("c").to_string(), "word[0] == \"c\"");
        assert_eq!(word.equals("a").not().to_string(), "!(word == \"a\")");
    }
}
