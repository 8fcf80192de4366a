// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use num_complex::Complex;

mod shaped;

pub use shaped::{ShapeError, ShapedArray};

/// Flat list of values of a single element type.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    Boolean(Vec<bool>),
    Integer64(Vec<i64>),
    Float64(Vec<f64>),
    Complex64(Vec<Complex<f64>>),
}

impl NumericArray {
    pub fn len(&self) -> usize {
        match self {
            NumericArray::Boolean(vec) => vec.len(),
            NumericArray::Integer64(vec) => vec.len(),
            NumericArray::Float64(vec) => vec.len(),
            NumericArray::Complex64(vec) => vec.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Real-valued copy of the array, `None` for complex data.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            NumericArray::Boolean(vec) => Some(vec.iter().map(|x| f64::from(u8::from(*x))).collect()),
            NumericArray::Integer64(vec) => Some(vec.iter().map(|x| *x as f64).collect()),
            NumericArray::Float64(vec) => Some(vec.clone()),
            NumericArray::Complex64(_) => None,
        }
    }

    /// Number of values of the integer range `[start, stop)`.
    ///
    /// `None` for a zero step or a count beyond `usize`.
    pub fn arange_len_i64(start: i64, stop: i64, step: i64) -> Option<usize> {
        if step == 0 {
            return None;
        }
        let span = i128::from(stop) - i128::from(start);
        let step = i128::from(step);
        if span == 0 || (span > 0) != (step > 0) {
            return Some(0);
        }
        usize::try_from((span.abs() + step.abs() - 1) / step.abs()).ok()
    }

    /// Number of values of the float range `[start, stop)`, i.e.
    /// `ceil((stop - start) / step)` clamped at zero.
    ///
    /// `None` for a zero or non-finite step, non-finite bounds, or a count
    /// that an `f64` no longer represents exactly.
    pub fn arange_len_f64(start: f64, stop: f64, step: f64) -> Option<usize> {
        if step == 0.0 || !(start.is_finite() && stop.is_finite() && step.is_finite()) {
            return None;
        }
        let count = ((stop - start) / step).ceil();
        if !count.is_finite() || count > MAX_EXACT_F64_COUNT {
            return None;
        }
        if count <= 0.0 {
            return Some(0);
        }
        usize::try_from(count as u64).ok()
    }

    /// Integer range `[start, stop)` with the given step, numpy `arange` convention.
    ///
    /// `None` when [`NumericArray::arange_len_i64`] is. The caller bounds the
    /// count before allocating.
    pub fn arange_i64(start: i64, stop: i64, step: i64) -> Option<Self> {
        let count = Self::arange_len_i64(start, stop, step)?;
        let (first, step) = (i128::from(start), i128::from(step));
        // Every value lies in [start, stop), so the narrowing is lossless.
        let values = (0..count).map(|i| (first + i as i128 * step) as i64).collect();
        Some(NumericArray::Integer64(values))
    }

    /// Float range `[start, stop)` with the given step, numpy `arange` convention.
    ///
    /// `None` when [`NumericArray::arange_len_f64`] is.
    pub fn arange_f64(start: f64, stop: f64, step: f64) -> Option<Self> {
        let count = Self::arange_len_f64(start, stop, step)?;
        Some(NumericArray::Float64(
            (0..count).map(|i| start + i as f64 * step).collect(),
        ))
    }
}

/// 2^53, the last integer up to which every count is an exact `f64`.
const MAX_EXACT_F64_COUNT: f64 = 9_007_199_254_740_992.0;

impl From<Vec<bool>> for NumericArray {
    fn from(value: Vec<bool>) -> Self {
        NumericArray::Boolean(value)
    }
}

impl From<Vec<i64>> for NumericArray {
    fn from(value: Vec<i64>) -> Self {
        NumericArray::Integer64(value)
    }
}

impl From<Vec<f64>> for NumericArray {
    fn from(value: Vec<f64>) -> Self {
        NumericArray::Float64(value)
    }
}

impl From<Vec<Complex<f64>>> for NumericArray {
    fn from(value: Vec<Complex<f64>>) -> Self {
        NumericArray::Complex64(value)
    }
}
