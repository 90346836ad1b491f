//! Dense batched storage.
//!
//! A [`Batch`] holds `numel` elements of identical event shape. Elements are
//! stored as the columns of a `DMatrix<f64>`, so each one is a contiguous
//! slice of `width` values. The logical shape is `batch_shape ++ event_shape`;
//! an empty batch shape denotes a single element and any zero in the batch
//! shape denotes an empty batch.

use crate::error::{LieError, Result};
use approx::{AbsDiffEq, RelativeEq};
use nalgebra::DMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Batched `f64` storage with separate batch and event shapes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Batch {
    data: DMatrix<f64>,
    batch_shape: Vec<usize>,
    event_shape: Vec<usize>,
}

fn numel_of(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl Batch {
    /// Wrap an existing matrix whose columns are the batch elements.
    pub fn new(batch_shape: &[usize], event_shape: &[usize], data: DMatrix<f64>) -> Result<Self> {
        let width = numel_of(event_shape);
        let numel = numel_of(batch_shape);
        if data.nrows() != width || data.ncols() != numel {
            return Err(LieError::dimension_mismatch(
                format!("{width}x{numel} storage"),
                format!("{}x{}", data.nrows(), data.ncols()),
            ));
        }
        Ok(Self {
            data,
            batch_shape: batch_shape.to_vec(),
            event_shape: event_shape.to_vec(),
        })
    }

    /// Build from row-major values whose last axis is the event axis.
    ///
    /// `shape` is the full logical shape, so `[5, 3, 4]` gives fifteen
    /// elements of width four.
    pub fn from_vec(shape: &[usize], values: Vec<f64>) -> Result<Self> {
        let (event, batch) = shape
            .split_last()
            .ok_or_else(|| LieError::dimension_mismatch("at least one axis", "scalar shape"))?;
        Self::from_elements(batch, &[*event], values)
    }

    /// Build from flat element-major values with an explicit event shape.
    pub fn from_elements(
        batch_shape: &[usize],
        event_shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self> {
        let width = numel_of(event_shape);
        let numel = numel_of(batch_shape);
        if values.len() != width * numel {
            return Err(LieError::dimension_mismatch(
                format!("{} values", width * numel),
                values.len(),
            ));
        }
        Self::new(
            batch_shape,
            event_shape,
            DMatrix::from_vec(width, numel, values),
        )
    }

    /// A batch filled with zeros.
    pub fn zeros(batch_shape: &[usize], event_shape: &[usize]) -> Self {
        Self::full(batch_shape, event_shape, 0.0)
    }

    /// A batch with every value set to `value`.
    pub fn full(batch_shape: &[usize], event_shape: &[usize], value: f64) -> Self {
        Self {
            data: DMatrix::from_element(numel_of(event_shape), numel_of(batch_shape), value),
            batch_shape: batch_shape.to_vec(),
            event_shape: event_shape.to_vec(),
        }
    }

    /// Every element a copy of `element`; the event shape is `[element.len()]`.
    pub fn repeat(batch_shape: &[usize], element: &[f64]) -> Self {
        let width = element.len();
        let numel = numel_of(batch_shape);
        Self {
            data: DMatrix::from_fn(width, numel, |r, _| element[r]),
            batch_shape: batch_shape.to_vec(),
            event_shape: vec![width],
        }
    }

    /// Fill each element through `f(index, out)`.
    ///
    /// With the `parallel` feature the elements are filled on the rayon pool.
    pub fn from_fn<F>(batch_shape: &[usize], event_shape: &[usize], f: F) -> Self
    where
        F: Fn(usize, &mut [f64]) + Sync + Send,
    {
        let mut out = Self::zeros(batch_shape, event_shape);
        let width = out.width();
        if width == 0 || out.numel() == 0 {
            return out;
        }

        #[cfg(feature = "parallel")]
        out.data
            .as_mut_slice()
            .par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(i, chunk)| f(i, chunk));

        #[cfg(not(feature = "parallel"))]
        out.data
            .as_mut_slice()
            .chunks_exact_mut(width)
            .enumerate()
            .for_each(|(i, chunk)| f(i, chunk));

        out
    }

    /// Batch axes.
    pub fn batch_shape(&self) -> &[usize] {
        &self.batch_shape
    }

    /// Trailing event axes.
    pub fn event_shape(&self) -> &[usize] {
        &self.event_shape
    }

    /// Full logical shape, batch axes followed by event axes.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = self.batch_shape.clone();
        shape.extend_from_slice(&self.event_shape);
        shape
    }

    /// Number of values per element.
    pub fn width(&self) -> usize {
        self.data.nrows()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.data.ncols()
    }

    /// Element `i` in flattened batch order.
    pub fn element(&self, i: usize) -> &[f64] {
        let w = self.width();
        &self.data.as_slice()[i * w..(i + 1) * w]
    }

    /// Mutable access to element `i`.
    pub fn element_mut(&mut self, i: usize) -> &mut [f64] {
        let w = self.width();
        &mut self.data.as_mut_slice()[i * w..(i + 1) * w]
    }

    /// Add `values` into element `i`.
    pub fn accumulate(&mut self, i: usize, values: &[f64]) {
        for (dst, src) in self.element_mut(i).iter_mut().zip(values) {
            *dst += src;
        }
    }

    /// Iterate over elements in flattened batch order.
    pub fn elements(&self) -> impl Iterator<Item = &[f64]> {
        let w = self.width().max(1);
        let take = if self.width() == 0 { 0 } else { self.numel() };
        self.data.as_slice().chunks_exact(w).take(take)
    }

    /// All values, element-major.
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    /// Underlying `width x numel` matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Consume into element-major values.
    pub fn into_vec(self) -> Vec<f64> {
        self.data.as_slice().to_vec()
    }

    /// Same elements under a new batch shape with the same element count.
    pub fn reshape_batch(&self, batch_shape: &[usize]) -> Result<Self> {
        if numel_of(batch_shape) != self.numel() {
            return Err(LieError::dimension_mismatch(
                format!("{} elements", self.numel()),
                format!("{} elements for batch shape {batch_shape:?}", numel_of(batch_shape)),
            ));
        }
        Ok(Self {
            data: self.data.clone(),
            batch_shape: batch_shape.to_vec(),
            event_shape: self.event_shape.clone(),
        })
    }

    /// Add another batch of identical shape in place.
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_same_shape(other)?;
        self.data += &other.data;
        Ok(())
    }

    /// Sum of element-wise products with a batch of identical shape.
    pub fn dot(&self, other: &Self) -> Result<f64> {
        self.check_same_shape(other)?;
        Ok(self.data.dot(&other.data))
    }

    /// Largest absolute element-wise difference; infinite on shape mismatch.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        if self.shape() != other.shape() {
            return f64::INFINITY;
        }
        self.as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(LieError::dimension_mismatch(
                format!("{:?}", self.shape()),
                format!("{:?}", other.shape()),
            ));
        }
        Ok(())
    }
}

impl AbsDiffEq for Batch {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.batch_shape == other.batch_shape
            && self.event_shape == other.event_shape
            && self.data.abs_diff_eq(&other.data, epsilon)
    }
}

impl RelativeEq for Batch {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.batch_shape == other.batch_shape
            && self.event_shape == other.event_shape
            && self.data.relative_eq(&other.data, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_vec_layout() {
        let b = Batch::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(b.batch_shape(), &[2]);
        assert_eq!(b.event_shape(), &[3]);
        assert_eq!(b.shape(), vec![2, 3]);
        assert_eq!(b.element(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_scalar_batch_has_one_element() {
        let b = Batch::from_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        assert!(b.batch_shape().is_empty());
        assert_eq!(b.numel(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let b = Batch::zeros(&[0], &[4]);
        assert_eq!(b.numel(), 0);
        assert_eq!(b.elements().count(), 0);
        let f = Batch::from_fn(&[0, 3], &[7], |_, _| unreachable!());
        assert_eq!(f.shape(), vec![0, 3, 7]);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            Batch::from_vec(&[2, 3], vec![0.0; 5]),
            Err(LieError::DimensionMismatch { .. })
        ));
        assert!(Batch::from_vec(&[], vec![]).is_err());
    }

    #[test]
    fn test_from_fn_and_accumulate() {
        let mut b = Batch::from_fn(&[4], &[2], |i, out| {
            out[0] = i as f64;
            out[1] = -(i as f64);
        });
        assert_eq!(b.element(3), &[3.0, -3.0]);
        b.accumulate(3, &[1.0, 1.0]);
        assert_eq!(b.element(3), &[4.0, -2.0]);
    }

    #[test]
    fn test_repeat_and_reshape() {
        let b = Batch::repeat(&[2, 3], &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(b.numel(), 6);
        assert!(b.elements().all(|e| e == [0.0, 0.0, 0.0, 1.0]));
        let r = b.reshape_batch(&[6]).unwrap();
        assert_eq!(r.shape(), vec![6, 4]);
        assert!(b.reshape_batch(&[5]).is_err());
    }

    #[test]
    fn test_dot_and_diff() {
        let a = Batch::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Batch::full(&[2], &[2], 1.0);
        assert_relative_eq!(a.dot(&b).unwrap(), 10.0);
        assert_relative_eq!(a.max_abs_diff(&b), 3.0);
        assert_relative_eq!(a, a.clone());
        assert!(a.max_abs_diff(&Batch::zeros(&[3], &[2])).is_infinite());
    }
}
