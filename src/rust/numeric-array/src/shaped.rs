// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("cannot reshape array of {len} elements into shape {shape:?}")]
    SizeMismatch { len: usize, shape: Vec<usize> },
}

/// Real-valued array with a row-major shape.
///
/// The last dimension varies fastest. An empty shape describes a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedArray {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl ShapedArray {
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self, ShapeError> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(ShapeError::SizeMismatch {
                len: data.len(),
                shape,
            });
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional array.
    pub fn flat(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn reshape(self, shape: &[usize]) -> Result<Self, ShapeError> {
        Self::new(self.data, shape.to_vec())
    }

    pub fn flatten(self) -> Vec<f64> {
        self.data
    }

    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (i, dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        self.data.get(offset).copied()
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|x| f(*x)).collect(),
        }
    }

    pub fn sqrt(&self) -> Self {
        self.map(f64::sqrt)
    }
}
