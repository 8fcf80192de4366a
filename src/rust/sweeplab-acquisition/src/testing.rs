// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Scripted collaborators for the acquisition tests.

use anyhow::bail;
use indexmap::IndexMap;
use program_generator::stream_processing::tags;
use program_generator::{Program, SequenceContext};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::collaborators::{
    DataSaver, FitParameters, Fitter, HardwareBackend, HardwareJob, PlotFrame, Plotter,
    PulseSequence,
};
use crate::results::{ResultBatch, SavedResult};

/// Rabi-like sequence: a pi pulse on `qubit` followed by a readout on `rr`.
pub(crate) struct Rabi {
    pub fit: Option<String>,
    pub internal: Option<Vec<String>>,
}

impl Default for Rabi {
    fn default() -> Self {
        Self {
            fit: Some("sine".to_string()),
            internal: None,
        }
    }
}

impl PulseSequence for Rabi {
    fn name(&self) -> &str {
        "rabi"
    }

    fn play(&self, ctx: &mut SequenceContext<'_>) -> program_generator::Result<()> {
        ctx.play("pi", "qubit")?;
        ctx.measure("readout", "rr", &["I", "Q"])?;
        ctx.stream_results();
        Ok(())
    }

    fn internal_sweep(&self) -> Option<Vec<String>> {
        self.internal.clone()
    }

    fn fit_fn(&self) -> Option<&str> {
        self.fit.as_deref()
    }
}

#[derive(Debug, Default)]
pub(crate) struct JobLog {
    pub fetches: usize,
    pub released: bool,
}

pub(crate) struct FakeJob {
    polls: VecDeque<ResultBatch>,
    endless: bool,
    log: Rc<RefCell<JobLog>>,
}

impl HardwareJob for FakeJob {
    fn is_fetching(&self) -> bool {
        self.endless || !self.polls.is_empty()
    }

    fn fetch(&mut self) -> anyhow::Result<ResultBatch> {
        self.log.borrow_mut().fetches += 1;
        Ok(self.polls.pop_front().unwrap_or_default())
    }

    fn execution_report(&self) -> String {
        format!("fake job after {} fetches", self.log.borrow().fetches)
    }

    fn release(&mut self) {
        self.log.borrow_mut().released = true;
    }
}

/// Backend whose job returns the scripted polls in order.
#[derive(Default)]
pub(crate) struct FakeBackend {
    polls: Vec<ResultBatch>,
    /// Keep fetching empty batches once the script is exhausted.
    pub endless: bool,
    pub fail: bool,
    pub executed: usize,
    pub last_program: Option<String>,
    pub log: Rc<RefCell<JobLog>>,
}

impl FakeBackend {
    pub fn new(polls: Vec<ResultBatch>) -> Self {
        Self {
            polls,
            ..Default::default()
        }
    }
}

impl HardwareBackend for FakeBackend {
    type Job = FakeJob;

    fn execute(&mut self, program: &Program) -> anyhow::Result<FakeJob> {
        self.executed += 1;
        if self.fail {
            bail!("controller unreachable");
        }
        self.last_program = Some(program.source());
        Ok(FakeJob {
            polls: self.polls.drain(..).collect(),
            endless: self.endless,
            log: Rc::clone(&self.log),
        })
    }
}

/// Results of repetitions `from..to` over the sweep points `x`.
///
/// Shot-resolved streams carry `to - from` rows, averaged streams one value
/// per point.
pub(crate) fn signal_batch(x: &[f64], from: u64, to: u64) -> ResultBatch {
    let points = x.len();
    let rows = (to - from) as usize;
    let mut i = Vec::with_capacity(rows * points);
    let mut q = Vec::with_capacity(rows * points);
    for rep in from..to {
        for k in 0..points {
            i.push(1.0 + 0.1 * ((rep as usize * 7 + k) % 5) as f64);
            q.push(0.5 * (k as f64 + 1.0));
        }
    }
    let raw_sq: Vec<f64> = i.iter().zip(&q).map(|(i, q)| i * i + q * q).collect();
    let mean = |values: &[f64]| -> Vec<f64> {
        (0..points)
            .map(|k| values.iter().skip(k).step_by(points).sum::<f64>() / rows as f64)
            .collect()
    };
    let i_avg = mean(&i);
    let q_avg = mean(&q);
    let z_avg = i_avg.iter().zip(&q_avg).map(|(i, q)| i * i + q * q).collect();
    ResultBatch::new(to)
        .with_values("I", i)
        .with_values("Q", q)
        .with_values("x", x.to_vec())
        .with_values(tags::Z_SQ_RAW, raw_sq.clone())
        .with_values(tags::Z_SQ_RAW_AVG, raw_sq)
        .with_values(tags::Z_AVG, z_avg)
        .with_values(tags::I_AVG, i_avg)
        .with_values(tags::Q_AVG, q_avg)
}

/// Least squares line, whatever model is requested.
#[derive(Debug, Default)]
pub(crate) struct LineFitter;

impl Fitter for LineFitter {
    fn fit(&self, _name: Option<&str>, x: &[f64], y: &[f64]) -> anyhow::Result<FitParameters> {
        if x.len() != y.len() || x.len() < 2 {
            bail!("cannot fit {} x and {} y values", x.len(), y.len());
        }
        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;
        let sxy: f64 = x.iter().zip(y).map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
        let sxx: f64 = x.iter().map(|x| (x - x_mean).powi(2)).sum();
        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
        Ok(IndexMap::from([
            ("slope".to_string(), slope),
            ("intercept".to_string(), y_mean - slope * x_mean),
        ]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlottedFrame {
    pub count: u64,
    pub shape: Vec<usize>,
    pub has_error: bool,
    pub fit_fn: Option<String>,
    pub zlabel: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingPlotter {
    pub frames: Vec<PlottedFrame>,
    pub fits: Vec<FitParameters>,
    pub fail: bool,
    pub(crate) fitter: LineFitter,
}

impl RecordingPlotter {
    pub fn counts(&self) -> Vec<u64> {
        self.frames.iter().map(|frame| frame.count).collect()
    }
}

impl Plotter for RecordingPlotter {
    fn live_plot(&mut self, frame: &PlotFrame<'_>) -> anyhow::Result<()> {
        if self.fail {
            bail!("plot window closed");
        }
        let Some((_, y)) = frame.results.dependent.first() else {
            bail!("nothing to plot");
        };
        if let Some((_, x)) = frame.results.independent.first() {
            self.fits.push(self.fitter.fit(frame.fit_fn, x.data(), y.data())?);
        }
        self.frames.push(PlottedFrame {
            count: frame.count,
            shape: y.shape().to_vec(),
            has_error: frame.results.error.is_some(),
            fit_fn: frame.fit_fn.map(str::to_string),
            zlabel: frame.setup.zlabel.clone(),
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSaver {
    pub began: bool,
    pub ended: bool,
    pub metadata: Option<Map<String, Value>>,
    /// Saved tags and group of every live update.
    pub live: Vec<(Vec<String>, String)>,
    pub final_save: Option<(Vec<String>, String)>,
}

impl DataSaver for RecordingSaver {
    fn begin(&mut self) -> anyhow::Result<()> {
        self.began = true;
        Ok(())
    }

    fn add_metadata(&mut self, metadata: &Map<String, Value>) -> anyhow::Result<()> {
        self.metadata = Some(metadata.clone());
        Ok(())
    }

    fn update_multiple_results(
        &mut self,
        results: &IndexMap<String, Vec<f64>>,
        save: &[String],
        group: &str,
    ) -> anyhow::Result<()> {
        let saved = save
            .iter()
            .filter(|tag| results.contains_key(tag.as_str()))
            .cloned()
            .collect();
        self.live.push((saved, group.to_string()));
        Ok(())
    }

    fn add_multiple_results(
        &mut self,
        results: &IndexMap<String, SavedResult>,
        save: &[String],
        group: &str,
    ) -> anyhow::Result<()> {
        if let Some(missing) = save.iter().find(|tag| !results.contains_key(tag.as_str())) {
            bail!("no result '{missing}' to save");
        }
        self.final_save = Some((save.to_vec(), group.to_string()));
        Ok(())
    }

    fn end(&mut self) {
        self.ended = true;
    }
}
