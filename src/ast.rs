//! # Expression trees
//!
//! Predicates, projections and grouping keys are data, not closures. Each one
//! is an [`Expr`] tree built through the builder methods in
//! [`builder`](crate::builder) and evaluated per element by the
//! [`evaluator`](crate::evaluator).
//!
//! - **[expressions]** - Expression nodes (constants, references, access, calls, records)
//! - **[operators]** - Comparison operators
//!
//! ## Example
//!
//! The predicate `student.exam_scores[1] > 90` is the tree
//!
//! ```text
//! Comparison(>)
//! ├── Index
//! │   ├── Field(exam_scores)
//! │   │   └── FieldRef(student)
//! │   └── Constant(1)
//! └── Constant(90)
//! ```
pub mod expressions;
pub mod operators;

pub use expressions::Expr;
pub use operators::CmpOp;
