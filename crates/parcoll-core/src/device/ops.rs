//! Elementwise arithmetic and reductions over device collections
//!
//! Same contract as the host helpers; reductions run in tree order.

use std::ops::{Add, Div, Mul, Sub};

use num_traits::{One, Zero};
use parcoll_backends::Element;

use super::Collection;
use crate::error::Result;

pub fn add<T: Element + Add<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x: T, y: T| x + y)
}

pub fn sub<T: Element + Sub<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x: T, y: T| x - y)
}

pub fn mul<T: Element + Mul<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x: T, y: T| x * y)
}

/// Elementwise quotient. Integer division by zero is a device execution
/// fault and ends the process.
pub fn div<T: Element + Div<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<Collection<T>> {
    a.zip(b, |x: T, y: T| x / y)
}

pub fn sum<T: Element + Zero>(c: &Collection<T>) -> Result<T> {
    c.reduce_or(T::zero(), |x: T, y: T| x + y)
}

pub fn prod<T: Element + One>(c: &Collection<T>) -> Result<T> {
    c.reduce_or(T::one(), |x: T, y: T| x * y)
}

pub fn dot<T: Element + Zero + Mul<Output = T>>(a: &Collection<T>, b: &Collection<T>) -> Result<T> {
    sum(&mul(a, b)?)
}
