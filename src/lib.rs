//! Composable, lazy queries over in-memory sequences.
//!
//! Predicates, projections and grouping keys are expression trees rather
//! than closures, so they can be built once, inspected and evaluated per
//! element against a fresh [`Binding`].
//!
//! ```
//! use table_query::Expr;
//! use serde_json::json;
//!
//! let students = vec![
//!     json!({"first_name": "Hanying", "exam_scores": [93, 92, 80, 87]}),
//!     json!({"first_name": "Cesar", "exam_scores": [97, 89, 85, 82]}),
//! ];
//!
//! let query = table_query::from("student", students)
//!     .filter(|student| student.field("exam_scores").at(1).gt(90))?
//!     .project(|student| {
//!         Expr::record([
//!             ("name", student.field("first_name")),
//!             ("score", student.field("exam_scores").at(1)),
//!         ])
//!     })?;
//!
//! let rows = query.to_vec()?;
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].to_string(), r#"{"name":"Hanying","score":92}"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod ast;
pub mod binding;
pub mod builder;
#[cfg(feature = "json")]
pub mod convert;
pub mod evaluator;
mod methods;
pub mod output;
pub mod query;
pub mod source;
pub mod value;

pub use ast::{CmpOp, Expr};
pub use binding::Binding;
pub use builder::{BuildError, Lift};
pub use evaluator::EvalError;
pub use output::{to_json, to_json_pretty};
pub use query::{Groups, Query, Rows};
pub use source::{Source, Stream};
pub use value::{Record, Value};

/// Starts a query over `items`, each element bound to `name`.
///
/// Shorthand for [`Query::from`].
pub fn from<I>(name: impl Into<String>, items: I) -> Query
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Query::from(name, items)
}
