// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Running mean and standard error over batches of repetitions.
//!
//! Batches are reduced to their moments and merged into the running state
//! with the pairwise combination rule, so earlier shots are never revisited.

mod error;
mod moments;

pub use error::{Error, Result};
pub use moments::BatchMoments;

use sweeplab_log::diagnostic;

/// Running statistics of the per-point signal magnitude.
///
/// `m2` is the sum of squared deviations from the mean, i.e. `(count - 1)`
/// times the sample variance.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStats {
    pub count: u64,
    pub mean: Vec<f64>,
    pub m2: Vec<f64>,
    /// `None` while `count <= 1`.
    pub std_err: Option<Vec<f64>>,
}

impl RunningStats {
    fn from_moments(moments: BatchMoments) -> Self {
        let std_err = moments.std_err();
        let BatchMoments { count, mean, m2 } = moments;
        Self {
            count,
            mean,
            m2,
            std_err,
        }
    }

    fn moments(&self) -> BatchMoments {
        BatchMoments {
            count: self.count,
            mean: self.mean.clone(),
            m2: self.m2.clone(),
        }
    }

    pub fn points(&self) -> usize {
        self.mean.len()
    }
}

/// Fold a batch of squared magnitudes into the running statistics.
///
/// `raw_sq` holds one row of per-point squared magnitudes for every repetition
/// since the previous update, `new_count` is the total number of repetitions
/// after this batch. `avg_sq` carries the hardware running average of the
/// same quantity and must have the same length as `raw_sq`.
pub fn update(
    raw_sq: &[f64],
    avg_sq: &[f64],
    new_count: u64,
    prior: Option<&RunningStats>,
) -> Result<RunningStats> {
    let prior_count = prior.map_or(0, |p| p.count);
    if new_count <= prior_count {
        return Err(Error::EmptyBatch {
            count: new_count,
            prior_count,
        });
    }
    if avg_sq.len() != raw_sq.len() {
        return Err(Error::ShapeMismatch(format!(
            "running average has {} values, batch has {}",
            avg_sq.len(),
            raw_sq.len()
        )));
    }
    let batch_reps = new_count - prior_count;
    let points = points_per_row(raw_sq.len(), batch_reps)?;
    if let Some(prior) = prior.filter(|p| p.points() != points) {
        return Err(Error::ShapeMismatch(format!(
            "batch has {points} points per repetition, running state has {}",
            prior.points()
        )));
    }
    let magnitudes: Vec<f64> = raw_sq.iter().map(|v| v.sqrt()).collect();
    let batch = BatchMoments::from_rows(&magnitudes, points)?;
    let combined = match prior {
        Some(prior) => prior.moments().combine(&batch)?,
        None => batch,
    };
    if sweeplab_log::is_diagnostics_enabled() {
        let last_row = &avg_sq[avg_sq.len() - points..];
        let deviation = last_row
            .iter()
            .zip(&combined.mean)
            .map(|(avg, mean)| (avg.sqrt() - mean).abs())
            .fold(0.0, f64::max);
        diagnostic!(
            "Running mean after {} repetitions deviates from the hardware average by at most {}",
            combined.count,
            deviation
        );
    }
    Ok(RunningStats::from_moments(combined))
}

fn points_per_row(len: usize, rows: u64) -> Result<usize> {
    let rows = usize::try_from(rows)
        .map_err(|_| Error::ShapeMismatch(format!("{rows} repetitions do not fit in memory")))?;
    if len == 0 || !len.is_multiple_of(rows) {
        return Err(Error::ShapeMismatch(format!(
            "{len} values cannot be split into {rows} repetitions"
        )));
    }
    Ok(len / rows)
}

/// Standard error of a binomial proportion `p` estimated from `n` shots.
pub fn binomial_std_err(p: &[f64], n: u64) -> Option<Vec<f64>> {
    if n == 0 {
        return None;
    }
    let n = n as f64;
    Some(p.iter().map(|p| (p * (1.0 - p) / n).max(0.0).sqrt()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() <= 1e-9 * (1.0 + x.abs().max(y.abs())), "{x} != {y}");
        }
    }

    /// Squares of `magnitudes`, as streamed by the hardware.
    fn squared(magnitudes: &[f64]) -> Vec<f64> {
        magnitudes.iter().map(|m| m * m).collect()
    }

    #[test]
    fn test_single_batch() {
        // Two points, three repetitions.
        let rows = [1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        let raw = squared(&rows);
        let stats = update(&raw, &raw, 3, None).unwrap();
        assert_eq!(stats.count, 3);
        assert_close(&stats.mean, &[2.0, 20.0]);
        assert_close(&stats.m2, &[2.0, 200.0]);
        let std_err = stats.std_err.unwrap();
        assert_close(&std_err, &[(2.0f64 / 6.0).sqrt(), (200.0f64 / 6.0).sqrt()]);
    }

    #[test]
    fn test_first_repetition_has_no_error() {
        let raw = squared(&[4.0, 5.0]);
        let stats = update(&raw, &raw, 1, None).unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.std_err.is_none());
        assert_close(&stats.m2, &[0.0, 0.0]);
    }

    #[test]
    fn test_incremental_matches_single_batch() {
        let rows: Vec<f64> = (0..20).map(|i| (i as f64 * 0.37).sin().abs() + 0.1).collect();
        let raw = squared(&rows);
        let whole = update(&raw, &raw, 10, None).unwrap();

        let first = update(&raw[..6], &raw[..6], 3, None).unwrap();
        let second = update(&raw[6..], &raw[6..], 10, Some(&first)).unwrap();
        assert_eq!(second.count, 10);
        assert_close(&second.mean, &whole.mean);
        assert_close(&second.m2, &whole.m2);
        assert_close(&second.std_err.unwrap(), &whole.std_err.unwrap());
    }

    #[test]
    fn test_rejected_batches() {
        let raw = squared(&[1.0, 2.0, 3.0, 4.0]);
        let stats = update(&raw, &raw, 2, None).unwrap();
        assert!(matches!(
            update(&raw, &raw, 2, Some(&stats)),
            Err(Error::EmptyBatch { .. })
        ));
        // Two more repetitions of a single point each.
        assert!(matches!(
            update(&raw[..2], &raw[..2], 4, Some(&stats)),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            update(&raw[..3], &raw[..3], 2, None),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            update(&raw, &raw[..2], 2, None),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(update(&[], &[], 1, None), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_binomial_std_err() {
        assert_eq!(binomial_std_err(&[0.5], 0), None);
        let err = binomial_std_err(&[0.5, 0.0, 1.0], 100).unwrap();
        assert_close(&err, &[0.05, 0.0, 0.0]);
    }

    fn fold(batches: &[&[f64]], points: usize) -> RunningStats {
        let mut stats: Option<RunningStats> = None;
        let mut count = 0;
        for batch in batches {
            count += (batch.len() / points) as u64;
            let raw = squared(batch);
            stats = Some(update(&raw, &raw, count, stats.as_ref()).unwrap());
        }
        stats.unwrap()
    }

    proptest! {
        #[test]
        fn partition_does_not_change_result(
            rows in proptest::collection::vec(0.0f64..100.0, 6..60),
            cut_a in 0usize..100,
            cut_b in 0usize..100,
        ) {
            let points = 2;
            let reps = rows.len() / points;
            let rows = &rows[..reps * points];
            // Two cut points on repetition boundaries, each batch non-empty.
            let a = 1 + cut_a % (reps - 2);
            let b = a + 1 + cut_b % (reps - a - 1);
            let (a, b) = (a * points, b * points);

            let whole = fold(&[rows], points);
            let left = fold(&[&rows[..b], &rows[b..]], points);
            let right = fold(&[&rows[..a], &rows[a..]], points);
            let three = fold(&[&rows[..a], &rows[a..b], &rows[b..]], points);
            for other in [&left, &right, &three] {
                prop_assert_eq!(other.count, whole.count);
                for (x, y) in other.mean.iter().zip(&whole.mean) {
                    prop_assert!((x - y).abs() <= 1e-9 * (1.0 + y.abs()));
                }
                for (x, y) in other.m2.iter().zip(&whole.m2) {
                    prop_assert!((x - y).abs() <= 1e-7 * (1.0 + y.abs()));
                }
            }
        }

        #[test]
        fn equal_batches_commute(
            first in proptest::collection::vec(0.0f64..10.0, 8),
            second in proptest::collection::vec(0.0f64..10.0, 8),
        ) {
            let points = 4;
            let a = BatchMoments::from_rows(&first, points).unwrap();
            let b = BatchMoments::from_rows(&second, points).unwrap();
            let ab = a.combine(&b).unwrap();
            let ba = b.combine(&a).unwrap();
            prop_assert_eq!(ab.count, ba.count);
            for (x, y) in ab.mean.iter().zip(&ba.mean) {
                prop_assert!((x - y).abs() <= 1e-12 * (1.0 + y.abs()));
            }
            for (x, y) in ab.m2.iter().zip(&ba.m2) {
                prop_assert!((x - y).abs() <= 1e-9 * (1.0 + y.abs()));
            }
        }
    }
}
