// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};

/// Count, per-point mean and per-point sum of squared deviations of a set of
/// repetitions.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMoments {
    pub count: u64,
    pub mean: Vec<f64>,
    pub m2: Vec<f64>,
}

impl BatchMoments {
    /// Moments of `samples`, laid out as consecutive rows of `points` values.
    pub fn from_rows(samples: &[f64], points: usize) -> Result<Self> {
        if points == 0 || samples.is_empty() || !samples.len().is_multiple_of(points) {
            return Err(Error::ShapeMismatch(format!(
                "{} values cannot be split into rows of {points}",
                samples.len()
            )));
        }
        let rows = samples.len() / points;
        let mut mean = vec![0.0; points];
        for row in samples.chunks_exact(points) {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= rows as f64;
        }
        let mut m2 = vec![0.0; points];
        for row in samples.chunks_exact(points) {
            for ((s, v), m) in m2.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        Ok(Self {
            count: rows as u64,
            mean,
            m2,
        })
    }

    /// Pairwise combination of two disjoint sets of repetitions.
    pub fn combine(&self, other: &BatchMoments) -> Result<BatchMoments> {
        if self.mean.len() != other.mean.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot combine moments of {} and {} points",
                self.mean.len(),
                other.mean.len()
            )));
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let count = self.count + other.count;
        let n = count as f64;
        let (mean, m2) = self
            .mean
            .iter()
            .zip(&self.m2)
            .zip(other.mean.iter().zip(&other.m2))
            .map(|((mean_a, m2_a), (mean_b, m2_b))| {
                let delta = mean_b - mean_a;
                (
                    mean_a + delta * n_b / n,
                    m2_a + m2_b + delta * delta * n_a * n_b / n,
                )
            })
            .unzip();
        Ok(BatchMoments { count, mean, m2 })
    }

    /// `sqrt(M2 / (n (n - 1)))`, undefined for a single repetition.
    pub fn std_err(&self) -> Option<Vec<f64>> {
        if self.count <= 1 {
            return None;
        }
        let n = self.count as f64;
        Some(self.m2.iter().map(|m2| (m2 / (n * (n - 1.0))).sqrt()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let moments = BatchMoments::from_rows(&[1.0, 4.0, 3.0, 8.0], 2).unwrap();
        assert_eq!(moments.count, 2);
        assert_eq!(moments.mean, vec![2.0, 6.0]);
        assert_eq!(moments.m2, vec![2.0, 8.0]);
        assert!(BatchMoments::from_rows(&[1.0, 2.0, 3.0], 2).is_err());
        assert!(BatchMoments::from_rows(&[1.0], 0).is_err());
    }

    #[test]
    fn test_combine_point_mismatch() {
        let a = BatchMoments::from_rows(&[1.0, 2.0], 2).unwrap();
        let b = BatchMoments::from_rows(&[1.0, 2.0], 1).unwrap();
        assert!(matches!(a.combine(&b), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_std_err() {
        let moments = BatchMoments::from_rows(&[1.0, 3.0], 1).unwrap();
        // mean 2, m2 2, n 2 -> sqrt(2 / 2)
        assert_eq!(moments.std_err(), Some(vec![1.0]));
        let single = BatchMoments::from_rows(&[1.0], 1).unwrap();
        assert_eq!(single.std_err(), None);
    }
}
