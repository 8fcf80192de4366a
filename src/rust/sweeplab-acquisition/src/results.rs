// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Fetched result batches and their reshaping into the buffer shape.

use indexmap::IndexMap;
use num_complex::Complex64;
use numeric_array::ShapedArray;
use program_generator::stream_processing::tags;
use running_stats::{RunningStats, binomial_std_err};
use std::f64::consts::{PI, TAU};
use sweeplab_dsl::SweepPlan;

use crate::experiment::{Experiment, INTERNAL_SWEEP_KEY, PHASE_TAG};
use crate::{Error, Result};

/// Values of one poll of a running job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultBatch {
    /// Repetitions completed when the batch was fetched.
    pub count: u64,
    /// Flat values per stream tag. Streams that retain every shot only carry
    /// the repetitions since the previous fetch.
    pub values: IndexMap<String, Vec<f64>>,
}

impl ResultBatch {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            values: IndexMap::new(),
        }
    }

    pub fn with_values<S: Into<String>>(mut self, tag: S, values: Vec<f64>) -> Self {
        self.values.insert(tag.into(), values);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, tag: &str) -> Result<&[f64]> {
        self.values
            .get(tag)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::results(format!("Stream '{tag}' is missing from the fetched results")))
    }
}

/// A value persisted by the final save.
#[derive(Debug, Clone, PartialEq)]
pub enum SavedResult {
    Array(ShapedArray),
    Labels(Vec<String>),
}

/// Results of one poll, reshaped into the buffer shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultFrame {
    pub independent: IndexMap<String, ShapedArray>,
    pub dependent: IndexMap<String, ShapedArray>,
    /// Internal sweep labels repeated over the leading dimensions, row-major.
    pub internal_sweep: Option<Vec<String>>,
    /// Error bars of the first dependent result.
    pub error: Option<ShapedArray>,
}

impl ResultFrame {
    /// Dependent, independent and internal sweep results by result key.
    pub fn to_saved(&self) -> IndexMap<String, SavedResult> {
        let mut saved: IndexMap<String, SavedResult> = self
            .dependent
            .iter()
            .chain(&self.independent)
            .map(|(tag, data)| (tag.clone(), SavedResult::Array(data.clone())))
            .collect();
        if let Some(labels) = &self.internal_sweep {
            saved.insert(
                INTERNAL_SWEEP_KEY.to_string(),
                SavedResult::Labels(labels.clone()),
            );
        }
        saved
    }
}

/// Turns flat result batches into [`ResultFrame`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultShaper {
    shape: Vec<usize>,
    independent_tags: Vec<String>,
    dependent_tags: Vec<String>,
    internal_sweep: Option<Vec<String>>,
    single_shot: bool,
    plot_err: bool,
    cable_delay: f64,
}

impl ResultShaper {
    pub fn new(experiment: &Experiment, plan: &SweepPlan) -> Self {
        let (independent_tags, dependent_tags) = experiment.results_tags();
        Self {
            shape: plan.shape().dims().to_vec(),
            independent_tags,
            dependent_tags,
            internal_sweep: plan.internal_enumeration().map(<[String]>::to_vec),
            single_shot: experiment.is_single_shot(),
            plot_err: experiment.plot_setup().plot_err,
            cable_delay: experiment.cable_delay_s(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn buffer_len(&self) -> usize {
        self.shape.iter().product()
    }

    fn shaped(&self, data: Vec<f64>, tag: &str) -> Result<ShapedArray> {
        ShapedArray::flat(data)
            .reshape(&self.shape)
            .map_err(|err| Error::results(format!("Stream '{tag}': {err}")))
    }

    pub fn reshape(&self, batch: &ResultBatch, stats: Option<&RunningStats>) -> Result<ResultFrame> {
        let mut independent = IndexMap::new();
        for tag in &self.independent_tags {
            let data = self.shaped(batch.get(tag)?.to_vec(), tag)?;
            independent.insert(tag.clone(), data);
        }
        let mut dependent = IndexMap::new();
        for tag in &self.dependent_tags {
            let data = match tag.as_str() {
                // Squared magnitude in the stream processing.
                tags::Z_AVG => batch.get(tag)?.iter().map(|v| v.sqrt()).collect(),
                PHASE_TAG => self.phase(batch, independent.first().map(|(_, freqs)| freqs))?,
                _ => batch.get(tag)?.to_vec(),
            };
            dependent.insert(tag.clone(), self.shaped(data, tag)?);
        }
        let internal_sweep = self.internal_sweep.as_ref().map(|labels| {
            let repeats = self.buffer_len() / labels.len().max(1);
            (0..repeats).flat_map(|_| labels.iter().cloned()).collect()
        });
        let error = if !self.plot_err {
            None
        } else if self.single_shot {
            // Binomial error of the estimated state probability.
            dependent
                .first()
                .and_then(|(_, p)| binomial_std_err(p.data(), batch.count))
                .map(|err| self.shaped(err, "error"))
                .transpose()?
        } else {
            stats
                .and_then(|stats| stats.std_err.clone())
                .map(|err| self.shaped(err, "error"))
                .transpose()?
        };
        Ok(ResultFrame {
            independent,
            dependent,
            internal_sweep,
            error,
        })
    }

    /// Unwrapped phase of the batch-averaged signal, minus the cable delay
    /// times the swept frequency.
    fn phase(&self, batch: &ResultBatch, freqs: Option<&ShapedArray>) -> Result<Vec<f64>> {
        let i = batch.get("I")?;
        let q = batch.get("Q")?;
        let points = self.buffer_len();
        if i.len() != q.len() || i.is_empty() || !i.len().is_multiple_of(points) {
            return Err(Error::results(format!(
                "I and Q streams with {} and {} values do not fit {points} points",
                i.len(),
                q.len()
            )));
        }
        let mut sum = vec![Complex64::new(0.0, 0.0); points];
        for (row_i, row_q) in i.chunks_exact(points).zip(q.chunks_exact(points)) {
            for ((s, re), im) in sum.iter_mut().zip(row_i).zip(row_q) {
                *s += Complex64::new(*re, *im);
            }
        }
        let mut phase = unwrap_phase(&sum.iter().map(|z| z.arg()).collect::<Vec<_>>());
        if let Some(freqs) = freqs {
            for (p, f) in phase.iter_mut().zip(freqs.data()) {
                *p -= f * self.cable_delay;
            }
        }
        Ok(phase)
    }
}

/// Remove the jumps of more than pi between consecutive phases.
fn unwrap_phase(phases: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(phases.len());
    let mut correction = 0.0;
    for (k, p) in phases.iter().enumerate() {
        if k > 0 {
            let delta = p - phases[k - 1];
            let mut wrapped = (delta + PI).rem_euclid(TAU) - PI;
            if wrapped == -PI && delta > 0.0 {
                wrapped = PI;
            }
            if delta.abs() >= PI {
                correction += wrapped - delta;
            }
        }
        unwrapped.push(p + correction);
    }
    unwrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shaper(shape: Vec<usize>, dependent: &str) -> ResultShaper {
        ResultShaper {
            shape,
            independent_tags: vec!["x".to_string()],
            dependent_tags: vec![dependent.to_string()],
            internal_sweep: None,
            single_shot: false,
            plot_err: true,
            cable_delay: 0.0,
        }
    }

    #[test]
    fn test_reshape_magnitude_and_error() {
        let batch = ResultBatch::new(4)
            .with_values("x", vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0])
            .with_values("Z_AVG", vec![1.0, 4.0, 9.0, 16.0, 25.0, 36.0]);
        let stats = RunningStats {
            count: 4,
            mean: vec![0.0; 6],
            m2: vec![0.0; 6],
            std_err: Some(vec![0.1; 6]),
        };
        let frame = shaper(vec![2, 3], "Z_AVG").reshape(&batch, Some(&stats)).unwrap();
        let z = &frame.dependent["Z_AVG"];
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z.get(&[1, 0]), Some(4.0));
        assert_eq!(frame.independent["x"].get(&[0, 2]), Some(2.0));
        assert_eq!(frame.error.unwrap().shape(), &[2, 3]);
    }

    #[test]
    fn test_error_omitted() {
        let batch = ResultBatch::new(1)
            .with_values("x", vec![0.0, 1.0])
            .with_values("I_AVG", vec![0.5, 0.25]);
        let frame = shaper(vec![2], "I_AVG").reshape(&batch, None).unwrap();
        assert_eq!(frame.dependent["I_AVG"].data(), &[0.5, 0.25]);
        assert!(frame.error.is_none());

        let mut no_err = shaper(vec![2], "I_AVG");
        no_err.plot_err = false;
        let stats = RunningStats {
            count: 2,
            mean: vec![0.0; 2],
            m2: vec![0.0; 2],
            std_err: Some(vec![0.0; 2]),
        };
        assert!(no_err.reshape(&batch, Some(&stats)).unwrap().error.is_none());
    }

    #[test]
    fn test_single_shot_binomial_error() {
        let mut shaper = shaper(vec![2], "state");
        shaper.single_shot = true;
        let batch = ResultBatch::new(100)
            .with_values("x", vec![0.0, 1.0])
            .with_values("state", vec![0.5, 1.0]);
        let frame = shaper.reshape(&batch, None).unwrap();
        let err = frame.error.unwrap();
        assert!((err.data()[0] - 0.05).abs() < 1e-12);
        assert_eq!(err.data()[1], 0.0);
    }

    #[test]
    fn test_phase_with_cable_delay() {
        let mut shaper = shaper(vec![3], PHASE_TAG);
        shaper.cable_delay = 0.5;
        // Two identical rows.
        let angles = [0.0, PI / 2.0, 0.9 * PI];
        let i: Vec<f64> = angles.iter().chain(&angles).map(|a| a.cos()).collect();
        let q: Vec<f64> = angles.iter().chain(&angles).map(|a| a.sin()).collect();
        let batch = ResultBatch::new(2)
            .with_values("x", vec![0.0, 1.0, 2.0])
            .with_values("I", i)
            .with_values("Q", q);
        let frame = shaper.reshape(&batch, None).unwrap();
        let phase = frame.dependent[PHASE_TAG].data();
        let expected = [0.0, PI / 2.0 - 0.5, 0.9 * PI - 1.0];
        for (p, e) in phase.iter().zip(expected) {
            assert!((p - e).abs() < 1e-9, "{p} != {e}");
        }
    }

    #[test]
    fn test_unwrap_phase() {
        let unwrapped = unwrap_phase(&[0.9 * PI, -0.9 * PI, -0.1 * PI]);
        let expected = [0.9 * PI, 1.1 * PI, 1.9 * PI];
        for (u, e) in unwrapped.iter().zip(expected) {
            assert!((u - e).abs() < 1e-9, "{u} != {e}");
        }
        assert!(unwrap_phase(&[]).is_empty());
    }

    #[test]
    fn test_internal_sweep_and_saved_results() {
        let mut shaper = shaper(vec![2, 2], "Z_AVG");
        shaper.internal_sweep = Some(vec!["g".to_string(), "e".to_string()]);
        let batch = ResultBatch::new(1)
            .with_values("x", vec![1.0, 1.0, 2.0, 2.0])
            .with_values("Z_AVG", vec![1.0; 4]);
        let frame = shaper.reshape(&batch, None).unwrap();
        assert_eq!(
            frame.internal_sweep.as_deref(),
            Some(&["g", "e", "g", "e"].map(String::from)[..])
        );
        let saved = frame.to_saved();
        let keys: Vec<_> = saved.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Z_AVG", "x", "internal sweep"]);
    }

    #[test]
    fn test_reshape_errors() {
        let shaper = shaper(vec![3], "Z_AVG");
        let missing = ResultBatch::new(1).with_values("x", vec![0.0, 1.0, 2.0]);
        assert!(matches!(shaper.reshape(&missing, None), Err(Error::Results(_))));
        let short = ResultBatch::new(1)
            .with_values("x", vec![0.0, 1.0])
            .with_values("Z_AVG", vec![1.0; 3]);
        assert!(matches!(shaper.reshape(&short, None), Err(Error::Results(_))));
    }
}
