//! Single-threaded reference backend
//!
//! Every call runs to completion on the calling thread in ascending index
//! order. Results from this backend are the oracle the device backend is
//! tested against.

pub mod ops;

use std::convert::Infallible;
use std::fmt;
use std::time::Instant;

use parcoll_backends::{Buffer, Element, Host};

use crate::cursor::{write_list, Cursor, PointRead};
use crate::error::{Error, Result};
use crate::instrumentation::OperationMetrics;
use crate::reduce::{self, Round, TreeStep};

/// Fixed-size collection in host memory.
pub struct Collection<T: Element> {
    buffer: Buffer<T, Host>,
}

impl<T: Element> Collection<T> {
    /// Build a collection of `size` elements with `element(i)` at index `i`.
    pub fn generate<F>(size: usize, mut element: F) -> Result<Self>
    where
        F: FnMut(usize) -> T,
    {
        let start = Instant::now();
        let mut buffer = Buffer::<T, Host>::allocate(size).map_err(Error::allocation("host", size))?;
        for (i, x) in buffer.as_mut_slice().iter_mut().enumerate() {
            *x = element(i);
        }
        OperationMetrics::new("generate", "host", size, start).log();
        Ok(Self { buffer })
    }

    /// Build a collection holding a copy of `values`.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        let mut buffer = Buffer::<T, Host>::allocate(values.len()).map_err(Error::allocation("host", values.len()))?;
        buffer.as_mut_slice().copy_from_slice(values);
        Ok(Self { buffer })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        self.buffer.as_slice()
    }

    /// New collection with `f(self[i])` at every index.
    pub fn map<U, F>(&self, mut f: F) -> Result<Collection<U>>
    where
        U: Element,
        F: FnMut(T) -> U,
    {
        let start = Instant::now();
        let src = self.as_slice();
        let mut buffer = Buffer::<U, Host>::allocate(src.len()).map_err(Error::allocation("host", src.len()))?;
        for (x, &a) in buffer.as_mut_slice().iter_mut().zip(src) {
            *x = f(a);
        }
        OperationMetrics::new("map", "host", src.len(), start).log();
        Ok(Collection { buffer })
    }

    /// New collection of `min(self.len(), other.len())` elements with
    /// `f(self[i], other[i])` at index `i`.
    pub fn zip<V, U, F>(&self, other: &Collection<V>, mut f: F) -> Result<Collection<U>>
    where
        V: Element,
        U: Element,
        F: FnMut(T, V) -> U,
    {
        let start = Instant::now();
        let n = self.len().min(other.len());
        let mut buffer = Buffer::<U, Host>::allocate(n).map_err(Error::allocation("host", n))?;
        for ((x, &a), &b) in buffer.as_mut_slice().iter_mut().zip(self.as_slice()).zip(other.as_slice()) {
            *x = f(a, b);
        }
        OperationMetrics::new("zip", "host", n, start).log();
        Ok(Collection { buffer })
    }

    pub fn get(&self, index: usize) -> Result<T> {
        Error::bounds("get", index, self.len())?;
        Ok(self.as_slice()[index])
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        Error::bounds("set", index, self.len())?;
        self.buffer.as_mut_slice()[index] = value;
        Ok(())
    }

    pub fn to_vector(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    /// Left fold: `f(...f(f(x0, x1), x2)..., xn)`.
    ///
    /// Returns [`Error::EmptyReduction`] on an empty collection.
    pub fn reduce<F>(&self, f: F) -> Result<T>
    where
        F: FnMut(T, T) -> T,
    {
        let start = Instant::now();
        let mut values = self.as_slice().iter().copied();
        let first = values.next().ok_or(Error::EmptyReduction)?;
        let result = values.fold(first, f);
        OperationMetrics::new("reduce", "host", self.len(), start).log();
        Ok(result)
    }

    /// Reduction in the same pairing order the device uses.
    ///
    /// Agrees with [`Collection::reduce`] for associative, commutative `f`
    /// up to floating-point rounding.
    pub fn reduce_tree<F>(&self, f: F) -> Result<T>
    where
        F: FnMut(T, T) -> T,
    {
        let start = Instant::now();
        let n = self.len();
        match n {
            0 => return Err(Error::EmptyReduction),
            1 => return self.get(0),
            _ => {}
        }

        let scratch_len = reduce::scratch_len(n);
        let mut scratch = Buffer::<T, Host>::allocate(scratch_len).map_err(Error::allocation("host", scratch_len))?;
        let mut rounds = HostRounds {
            src: self.as_slice(),
            scratch: scratch.as_mut_slice(),
            combine: f,
        };
        if let Err(never) = reduce::drive(n, &mut rounds) {
            match never {}
        }

        let result = scratch.as_slice()[0];
        OperationMetrics::new("reduce_tree", "host", n, start).log();
        Ok(result)
    }

    /// `reduce`, or `identity` when the collection is empty.
    pub fn reduce_or<F>(&self, identity: T, f: F) -> Result<T>
    where
        F: FnMut(T, T) -> T,
    {
        match self.reduce(f) {
            Err(Error::EmptyReduction) => Ok(identity),
            other => other,
        }
    }

    pub fn iter(&self) -> Cursor<'_, Self> {
        Cursor::new(self)
    }
}

struct HostRounds<'a, T, F> {
    src: &'a [T],
    scratch: &'a mut [T],
    combine: F,
}

impl<T: Element, F: FnMut(T, T) -> T> TreeStep for HostRounds<'_, T, F> {
    type Error = Infallible;

    fn step(&mut self, round: Round) -> std::result::Result<(), Infallible> {
        if round.index == 0 {
            for i in 0..round.span {
                self.scratch[i] = if round.pairs(i) {
                    (self.combine)(self.src[i], self.src[i + round.span])
                } else {
                    self.src[i]
                };
            }
        } else {
            // Partners sit at or above `span`, which this round never writes.
            for i in (0..round.span).filter(|&i| round.pairs(i)) {
                self.scratch[i] = (self.combine)(self.scratch[i], self.scratch[i + round.span]);
            }
        }
        Ok(())
    }
}

impl<T: Element> PointRead for Collection<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn read_at(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }
}

impl<'a, T: Element> IntoIterator for &'a Collection<T> {
    type Item = T;
    type IntoIter = Cursor<'a, Collection<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Element + fmt::Display> fmt::Display for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.as_slice())
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("host::Collection")
            .field("len", &self.len())
            .field("elements", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fib(n: usize) -> u64 {
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..n {
            (a, b) = (b, a + b);
        }
        a
    }

    #[test]
    fn generate_in_index_order() {
        let mut seen = Vec::new();
        let c = Collection::generate(4, |i| {
            seen.push(i);
            i as u32 * 10
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(c.to_vector(), vec![0, 10, 20, 30]);
    }

    #[test]
    fn fibonacci_generator() {
        let c = Collection::generate(10, fib).unwrap();
        assert_eq!(c.to_vector(), vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    }

    #[test]
    fn map_and_zip_sizes() {
        let a = Collection::generate(6, |i| i as i32).unwrap();
        let b = Collection::generate(4, |i| (i * 2) as f64).unwrap();

        let halves = a.map(|x| x as f32 / 2.0).unwrap();
        assert_eq!(halves.len(), 6);
        assert_eq!(halves.get(5).unwrap(), 2.5);

        let zipped = a.zip(&b, |x, y| x as f64 + y).unwrap();
        assert_eq!(zipped.len(), 4);
        assert_eq!(zipped.to_vector(), vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn get_and_set_respect_bounds() {
        let mut c = Collection::generate(3, |i| i as u8).unwrap();
        c.set(2, 9).unwrap();
        assert_eq!(c.get(2).unwrap(), 9);
        assert!(matches!(c.get(3), Err(Error::OutOfBounds { op: "get", index: 3, size: 3 })));
        assert!(matches!(c.set(3, 0), Err(Error::OutOfBounds { op: "set", .. })));
    }

    #[test]
    fn reduce_odd_sizes() {
        let c = Collection::from_slice(&[1i64, 2, 3, 4, 5]).unwrap();
        assert_eq!(c.reduce(|a, b| a + b).unwrap(), 15);
        assert_eq!(c.reduce_tree(|a, b| a + b).unwrap(), 15);
    }

    #[test]
    fn reduce_tree_uses_tree_pairing() {
        // Non-commutative combine exposes the order: [a,b,c] -> [(a,c), b] -> ((a,c),b)
        let c = Collection::from_slice(&[1i64, 2, 3]).unwrap();
        let trace = c.reduce_tree(|a, b| a * 10 + b).unwrap();
        assert_eq!(trace, 132);
        assert_eq!(c.reduce(|a, b| a * 10 + b).unwrap(), 123);
    }

    #[test]
    fn empty_reductions() {
        let c = Collection::<i32>::generate(0, |_| 1).unwrap();
        assert!(matches!(c.reduce(|a, b| a + b), Err(Error::EmptyReduction)));
        assert!(matches!(c.reduce_tree(|a, b| a + b), Err(Error::EmptyReduction)));
        assert_eq!(c.reduce_or(0, |a, b| a + b).unwrap(), 0);
        assert_eq!(c.to_string(), "[]");
    }

    #[test]
    fn single_element_reduces_to_itself() {
        let c = Collection::from_slice(&[42u16]).unwrap();
        assert_eq!(c.reduce(|a, b| a + b).unwrap(), 42);
        assert_eq!(c.reduce_tree(|a, b| a + b).unwrap(), 42);
    }

    #[test]
    fn iterates_and_displays() {
        let c = Collection::from_slice(&[3i32, -1, 4]).unwrap();
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![3, -1, 4]);
        assert_eq!((&c).into_iter().rev().collect::<Vec<_>>(), vec![4, -1, 3]);
        assert_eq!(c.to_string(), "[3,-1,4]");
    }

    #[test]
    fn oversized_generate_is_an_allocation_error() {
        let err = Collection::<u64>::generate(usize::MAX / 4, |_| 0).unwrap_err();
        assert!(matches!(err, Error::Allocation { substrate: "host", .. }));
    }
}
