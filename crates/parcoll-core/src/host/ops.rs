//! Elementwise arithmetic and reductions over host collections

use std::ops::{Add, Div, Mul, Sub};

use num_traits::{One, Zero};
use parcoll_backends::Element;

use super::Collection;
use crate::error::Result;

pub fn add<T: Element + Add<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x, y| x + y)
}

pub fn sub<T: Element + Sub<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x, y| x - y)
}

pub fn mul<T: Element + Mul<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x, y| x * y)
}

/// Elementwise quotient. Integer division by zero panics, as `/` does.
pub fn div<T: Element + Div<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x, y| x / y)
}

/// Sum of all elements; zero when empty.
pub fn sum<T: Element + Zero>(c: &Collection<T>) -> Result<T> {
    c.reduce_or(T::zero(), |x, y| x + y)
}

/// Product of all elements; one when empty.
pub fn prod<T: Element + One>(c: &Collection<T>) -> Result<T> {
    c.reduce_or(T::one(), |x, y| x * y)
}

/// Sum of elementwise products over the shorter length.
pub fn dot<T: Element + Zero + Mul<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<T> {
    sum(&mul(a, b)?)
}
