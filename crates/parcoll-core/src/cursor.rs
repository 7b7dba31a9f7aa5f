//! Read-only cursors and list formatting shared by both backends

use std::fmt;
use std::iter::FusedIterator;

/// Collections that can read one element at a time by index.
pub trait PointRead {
    type Item;

    fn len(&self) -> usize;

    /// Element at `index`, or `None` past the end.
    fn read_at(&self, index: usize) -> Option<Self::Item>;
}

/// Borrowing cursor over a collection. Each step is one point read.
#[derive(Debug)]
pub struct Cursor<'a, C: ?Sized> {
    collection: &'a C,
    front: usize,
    back: usize,
}

impl<'a, C: PointRead + ?Sized> Cursor<'a, C> {
    pub(crate) fn new(collection: &'a C) -> Self {
        Self {
            collection,
            front: 0,
            back: collection.len(),
        }
    }

    /// Index the next call to `next` reads.
    pub fn position(&self) -> usize {
        self.front
    }
}

impl<C: ?Sized> Clone for Cursor<'_, C> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection,
            front: self.front,
            back: self.back,
        }
    }
}

impl<C: PointRead + ?Sized> Iterator for Cursor<'_, C> {
    type Item = C::Item;

    fn next(&mut self) -> Option<C::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.collection.read_at(self.front)?;
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<C::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<C: PointRead + ?Sized> DoubleEndedIterator for Cursor<'_, C> {
    fn next_back(&mut self) -> Option<C::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.collection.read_at(self.back - 1)?;
        self.back -= 1;
        Some(item)
    }
}

impl<C: PointRead + ?Sized> ExactSizeIterator for Cursor<'_, C> {}

impl<C: PointRead + ?Sized> FusedIterator for Cursor<'_, C> {}

/// Write `items` as `[e0,e1,...]`.
pub(crate) fn write_list<I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    f.write_str("[")?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Squares(usize);

    impl PointRead for Squares {
        type Item = usize;

        fn len(&self) -> usize {
            self.0
        }

        fn read_at(&self, index: usize) -> Option<usize> {
            (index < self.0).then_some(index * index)
        }
    }

    struct Listed(Vec<i32>);

    impl fmt::Display for Listed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_list(f, &self.0)
        }
    }

    #[test]
    fn walks_both_ends() {
        let squares = Squares(5);
        let mut cursor = Cursor::new(&squares);
        assert_eq!(cursor.len(), 5);
        assert_eq!(cursor.next(), Some(0));
        assert_eq!(cursor.next_back(), Some(16));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.clone().collect::<Vec<_>>(), vec![1, 4, 9]);
        assert_eq!(cursor.rev().collect::<Vec<_>>(), vec![9, 4, 1]);
    }

    #[test]
    fn nth_stops_at_the_end() {
        let squares = Squares(3);
        let mut cursor = Cursor::new(&squares);
        assert_eq!(cursor.nth(1), Some(1));
        assert_eq!(cursor.nth(10), None);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn formats_brackets_and_commas() {
        assert_eq!(Listed(vec![1, 2, 3]).to_string(), "[1,2,3]");
        assert_eq!(Listed(vec![7]).to_string(), "[7]");
        assert_eq!(Listed(Vec::new()).to_string(), "[]");
    }
}
