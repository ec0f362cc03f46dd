use std::cell::RefCell;

use crate::value::Value;

/// Data behind a `Source` stage.
///
/// `items` is called once per enumeration of the query. Re-iterable sources
/// yield the same elements every time; single-pass sources may yield nothing
/// after the first call.
pub trait Source {
    fn items(&self) -> Box<dyn Iterator<Item = Value> + '_>;
}

impl Source for Vec<Value> {
    fn items(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        Box::new(self.iter().cloned())
    }
}

/// A single-pass source over an arbitrary iterator.
///
/// The first enumeration drains the iterator lazily; later enumerations see
/// an empty source.
pub struct Stream<I> {
    inner: RefCell<Option<I>>,
}

impl<I> Stream<I> {
    pub fn new(iter: I) -> Self {
        Stream {
            inner: RefCell::new(Some(iter)),
        }
    }
}

impl<I> Source for Stream<I>
where
    I: Iterator,
    I::Item: Into<Value>,
{
    fn items(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match self.inner.borrow_mut().take() {
            Some(iter) => Box::new(iter.map(Into::into)),
            None => Box::new(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_is_re_iterable() {
        let source = vec![Value::from(1), Value::from(2)];
        let first: Vec<Value> = source.items().collect();
        let second: Vec<Value> = source.items().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn stream_is_single_pass() {
        let stream = Stream::new(vec![1, 2, 3].into_iter());
        assert_eq!(stream.items().count(), 3);
        assert_eq!(stream.items().count(), 0);
    }
}
