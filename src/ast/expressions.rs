use std::fmt;

use crate::{ast::CmpOp, value::Value};

/// A node of an expression tree.
///
/// Trees are built once while a query is composed and evaluated later, once
/// per element, against a [`Binding`](crate::Binding). Building never
/// evaluates anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    ///
    /// # Example
    /// ```text
    /// 80
    /// "c"
    /// ```
    Constant(Value),

    /// Placeholder for the current element of the source
    ///
    /// Resolves to whatever the binding maps the name to.
    FieldRef(String),

    /// Named field of a record
    ///
    /// # Example
    /// ```text
    /// student.exam_scores
    /// ```
    Field { record: Box<Expr>, name: String },

    /// Array, string or record indexing
    ///
    /// # Examples
    /// ```text
    /// vegetable[0]
    /// student.exam_scores[exam]
    /// word[1, 3]
    /// ```
    Index { base: Box<Expr>, indices: Vec<Expr> },

    /// Named operation applied to a receiver
    ///
    /// Operators such as `+` are calls whose method is the operator symbol.
    ///
    /// # Examples
    /// ```text
    /// name.upper()
    /// (score + 5)
    /// ```
    Call {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Comparison of two sub-expressions
    Comparison {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Record literal, keys in declared order
    ///
    /// # Example
    /// ```text
    /// {name: student.first_name, score: student.exam_scores[1]}
    /// ```
    Record(Vec<(String, Expr)>),
}

const INFIX_METHODS: &[&str] = &["+", "-", "*", "/", "%", "and", "or"];

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::FieldRef(name) => f.write_str(name),
            Expr::Field { record, name } => write!(f, "{}.{}", record, name),
            Expr::Index { base, indices } => {
                write!(f, "{}[", base)?;
                write_list(f, indices)?;
                f.write_str("]")
            }
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                if method == "not" && args.is_empty() {
                    return write!(f, "!({})", receiver);
                }
                if INFIX_METHODS.contains(&method.as_str()) && args.len() == 1 {
                    return write!(f, "({} {} {})", receiver, method, args[0]);
                }
                write!(f, "{}.{}(", receiver, method)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Record(fields) => {
                f.write_str("{")?;
                for (i, (key, expr)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, expr)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", expr)?;
    }
    Ok(())
}
