use crate::value::Value;

/// The per-element context an expression is evaluated against.
///
/// A binding maps exactly one name, the source's declared item name, to the
/// element currently being processed. Stages create a fresh binding for every
/// element and never mutate it.
///
/// ```
/// use table_query::{Binding, Value};
///
/// let item = Value::from(97);
/// let binding = Binding::new("score", &item);
///
/// assert_eq!(binding.lookup("score"), Some(&Value::Integer(97)));
/// assert_eq!(binding.lookup("student"), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    name: &'a str,
    item: &'a Value,
}

impl<'a> Binding<'a> {
    pub fn new(name: &'a str, item: &'a Value) -> Self {
        Binding { name, item }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        (name == self.name).then_some(self.item)
    }
}
