//! Lazy query pipelines.
//!
//! A [`Query`] is a linear chain of stages: a `Source` followed by any number
//! of `Filter`, `Project` and `GroupBy` stages. Each stage owns its upstream
//! stage and the expression it applies. Enumeration pulls elements through
//! the chain on demand, binding each one to the source's declared name before
//! evaluating a stage's expression against it.
//!
//! # Examples
//!
//! ```
//! use table_query::Value;
//!
//! let query = table_query::from("score", vec![97, 92, 81, 60])
//!     .filter(|score| score.gt(80))?
//!     .project(|score| score)?;
//!
//! assert_eq!(query.to_vec()?, vec![Value::from(97), Value::from(92), Value::from(81)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::{
    ast::Expr,
    binding::Binding,
    builder::{BuildError, Lift},
    evaluator::EvalError,
    source::{Source, Stream},
    value::Value,
};

/// Lazy sequence of stage output. The first error ends the useful part of the
/// sequence; consumers collecting into a `Result` stop there.
pub type Rows<'q> = Box<dyn Iterator<Item = Result<Value, EvalError>> + 'q>;

/// A composed query. See the [module documentation](self).
pub struct Query {
    stage: Stage,
}

enum Stage {
    Source {
        name: String,
        source: Box<dyn Source>,
    },
    Filter {
        upstream: Box<Stage>,
        predicate: Expr,
    },
    Project {
        upstream: Box<Stage>,
        projection: Expr,
    },
    GroupBy {
        upstream: Box<Stage>,
        key: Expr,
    },
}

impl Query {
    /// Wraps a collection in a re-iterable `Source` stage named `name`.
    pub fn from<I>(name: impl Into<String>, items: I) -> Query
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items: Vec<Value> = items.into_iter().map(Into::into).collect();
        Query::from_source(name, items)
    }

    pub fn from_source(name: impl Into<String>, source: impl Source + 'static) -> Query {
        let name = name.into();
        debug!(source = %name, "composed source stage");
        Query {
            stage: Stage::Source {
                name,
                source: Box::new(source),
            },
        }
    }

    /// Wraps a single-pass iterator. Only the first enumeration sees its
    /// elements.
    pub fn from_stream<I>(name: impl Into<String>, items: I) -> Query
    where
        I: IntoIterator,
        I::IntoIter: 'static,
        I::Item: Into<Value>,
    {
        Query::from_source(name, Stream::new(items.into_iter()))
    }

    /// The declared item name of the underlying source.
    pub fn name(&self) -> &str {
        self.stage.name()
    }

    /// Keeps the elements for which the predicate evaluates to `true`.
    ///
    /// `builder` receives the placeholder for the source's declared name.
    pub fn filter<F, E>(self, builder: F) -> Result<Query, BuildError>
    where
        F: FnOnce(Expr) -> E,
        E: Lift,
    {
        let predicate = self.build(builder)?;
        debug!(source = %self.name(), predicate = %predicate, "composed filter stage");
        Ok(Query {
            stage: Stage::Filter {
                upstream: Box::new(self.stage),
                predicate,
            },
        })
    }

    /// Replaces every element with the value of the projection.
    pub fn project<F, E>(self, builder: F) -> Result<Query, BuildError>
    where
        F: FnOnce(Expr) -> E,
        E: Lift,
    {
        let projection = self.build(builder)?;
        debug!(source = %self.name(), projection = %projection, "composed project stage");
        Ok(Query {
            stage: Stage::Project {
                upstream: Box::new(self.stage),
                projection,
            },
        })
    }

    /// Groups elements by key.
    ///
    /// The stage consumes its whole upstream before yielding anything. It
    /// yields one `[key, [members...]]` pair per distinct key, in order of each
    /// key's first appearance, with members in upstream order.
    pub fn group_by<F, E>(self, builder: F) -> Result<Query, BuildError>
    where
        F: FnOnce(Expr) -> E,
        E: Lift,
    {
        let key = self.build(builder)?;
        debug!(source = %self.name(), key = %key, "composed group_by stage");
        Ok(Query {
            stage: Stage::GroupBy {
                upstream: Box::new(self.stage),
                key,
            },
        })
    }

    fn build<F, E>(&self, builder: F) -> Result<Expr, BuildError>
    where
        F: FnOnce(Expr) -> E,
        E: Lift,
    {
        builder(Expr::reference(self.name())).lift()
    }

    /// Lazily runs the whole pipeline from the source.
    ///
    /// Every call starts over from the source; nothing is cached between
    /// enumerations. The first error is the last item yielded.
    pub fn enumerate(&self) -> Rows<'_> {
        Box::new(self.stage.enumerate().scan(false, |failed, row| {
            if *failed {
                return None;
            }
            *failed = row.is_err();
            Some(row)
        }))
    }

    pub fn to_vec(&self) -> Result<Vec<Value>, EvalError> {
        self.enumerate().collect()
    }

    /// Collects `[key, [members...]]` pairs, as produced by
    /// [`group_by`](Query::group_by), into an ordered mapping.
    ///
    /// ```
    /// use table_query::Value;
    ///
    /// let vegetables = vec!["carrots", "cabbage", "broccoli", "beans", "barley"];
    /// let groups = table_query::from("vegetable", vegetables)
    ///     .group_by(|vegetable| vegetable.at(0))?
    ///     .to_groups()?;
    ///
    /// assert_eq!(groups.len(), 2);
    /// assert_eq!(
    ///     groups.get(&Value::from("c")),
    ///     Some(&[Value::from("carrots"), Value::from("cabbage")][..])
    /// );
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn to_groups(&self) -> Result<Groups, EvalError> {
        let mut groups = Groups::default();
        for row in self.enumerate() {
            let (key, members) = split_pair(row?)?;
            groups.push(key, members);
        }
        Ok(groups)
    }
}

impl Stage {
    fn name(&self) -> &str {
        match self {
            Stage::Source { name, .. } => name,
            Stage::Filter { upstream, .. }
            | Stage::Project { upstream, .. }
            | Stage::GroupBy { upstream, .. } => upstream.name(),
        }
    }

    fn enumerate(&self) -> Rows<'_> {
        let name = self.name();
        match self {
            Stage::Source { source, .. } => Box::new(source.items().map(Ok)),
            Stage::Filter {
                upstream,
                predicate,
            } => Box::new(upstream.enumerate().filter_map(move |row| {
                let item = match row {
                    Ok(item) => item,
                    Err(e) => return Some(Err(e)),
                };
                match predicate.evaluate(&Binding::new(name, &item)) {
                    Ok(Value::Boolean(keep)) => {
                        trace!(item = %item, keep, "filter");
                        keep.then_some(Ok(item))
                    }
                    Ok(other) => Some(Err(EvalError::TypeMismatch(format!(
                        "filter predicate {} must produce a boolean, got {}",
                        predicate,
                        other.type_name()
                    )))),
                    Err(e) => Some(Err(e)),
                }
            })),
            Stage::Project {
                upstream,
                projection,
            } => Box::new(upstream.enumerate().map(move |row| {
                let item = row?;
                let value = projection.evaluate(&Binding::new(name, &item))?;
                trace!(item = %item, value = %value, "project");
                Ok(value)
            })),
            Stage::GroupBy { upstream, key } => {
                let grouped = std::iter::once_with(move || group_rows(upstream.enumerate(), name, key));
                Box::new(grouped.flat_map(|result| match result {
                    Ok(groups) => groups
                        .into_iter()
                        .map(|(key, members)| Ok(Value::Array(vec![key, Value::Array(members)])))
                        .collect::<Vec<_>>(),
                    Err(e) => vec![Err(e)],
                }))
            }
        }
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Source { name, .. } => write!(f, "from {}", name),
            Stage::Filter {
                upstream,
                predicate,
            } => {
                upstream.describe(f)?;
                write!(f, " | filter {}", predicate)
            }
            Stage::Project {
                upstream,
                projection,
            } => {
                upstream.describe(f)?;
                write!(f, " | project {}", projection)
            }
            Stage::GroupBy { upstream, key } => {
                upstream.describe(f)?;
                write!(f, " | group_by {}", key)
            }
        }
    }
}

/// Drains `rows`, grouping elements by key in first-seen key order.
fn group_rows(
    rows: Rows<'_>,
    name: &str,
    key: &Expr,
) -> Result<Vec<(Value, Vec<Value>)>, EvalError> {
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    let mut elements = 0usize;
    for row in rows {
        let item = row?;
        let group_key = key.evaluate(&Binding::new(name, &item))?;
        elements += 1;
        // Linear scan: `Value` has no `Hash` (floats), so keys can't go in a map
        match groups.iter_mut().find(|(existing, _)| *existing == group_key) {
            Some((_, members)) => members.push(item),
            None => groups.push((group_key, vec![item])),
        }
    }
    trace!(groups = groups.len(), elements, "group_by finalized");
    Ok(groups)
}

fn split_pair(row: Value) -> Result<(Value, Vec<Value>), EvalError> {
    match row {
        Value::Array(pair) if pair.len() == 2 => {
            let mut pair = pair.into_iter();
            match (pair.next(), pair.next()) {
                (Some(key), Some(Value::Array(members))) => Ok((key, members)),
                (_, other) => Err(EvalError::TypeMismatch(format!(
                    "group members must be an array, got {}",
                    other.map_or("nothing", |v| v.type_name())
                ))),
            }
        }
        other => Err(EvalError::TypeMismatch(format!(
            "expected a [key, members] pair, got {}",
            other.type_name()
        ))),
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.stage.describe(f)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({})", self)
    }
}

/// Ordered mapping from group key to the group's members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Groups {
    entries: Vec<(Value, Vec<Value>)>,
}

impl Groups {
    /// Appends members to `key`'s group, creating it at the end if new.
    fn push(&mut self, key: Value, members: Vec<Value>) {
        // Linear in the number of groups, as in `group_rows`
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => existing.extend(members),
            None => self.entries.push((key, members)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&[Value]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, members)| members.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &[Value])> {
        self.entries
            .iter()
            .map(|(key, members)| (key, members.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Groups {
    type Item = (Value, Vec<Value>);
    type IntoIter = std::vec::IntoIter<(Value, Vec<Value>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
