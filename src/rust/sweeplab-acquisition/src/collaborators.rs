// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Interfaces of the components the acquisition loop drives.

use indexmap::IndexMap;
use program_generator::{Program, SequenceContext};

use crate::experiment::PlotSetup;
use crate::results::{ResultBatch, ResultFrame, SavedResult};

/// Runs hardware programs.
pub trait HardwareBackend {
    type Job: HardwareJob;

    fn execute(&mut self, program: &Program) -> anyhow::Result<Self::Job>;
}

/// Handle of a program running on the hardware.
pub trait HardwareJob {
    /// `false` once the job has finished and every result was fetched.
    fn is_fetching(&self) -> bool;

    /// Results accumulated since the previous fetch. An empty mapping means
    /// that nothing new is available.
    fn fetch(&mut self) -> anyhow::Result<ResultBatch>;

    fn execution_report(&self) -> String;

    /// Free the hardware resources held by the job.
    fn release(&mut self) {}
}

/// Pulse sequence of one experiment type.
pub trait PulseSequence {
    fn name(&self) -> &str;

    /// Emit the instructions of one iteration of the innermost sweep loop.
    fn play(&self, ctx: &mut SequenceContext<'_>) -> program_generator::Result<()>;

    /// Labels of the sub-sequences executed within one iteration.
    fn internal_sweep(&self) -> Option<Vec<String>> {
        None
    }

    /// Name of the fit model applied to the plotted data.
    fn fit_fn(&self) -> Option<&str> {
        None
    }
}

pub type FitParameters = IndexMap<String, f64>;

/// Curve fitting, used by plotters only.
pub trait Fitter {
    fn fit(&self, name: Option<&str>, x: &[f64], y: &[f64]) -> anyhow::Result<FitParameters>;
}

/// Everything a plotter gets for one live update.
#[derive(Debug, Clone, Copy)]
pub struct PlotFrame<'a> {
    pub results: &'a ResultFrame,
    /// Repetitions completed so far.
    pub count: u64,
    pub fit_fn: Option<&'a str>,
    pub setup: &'a PlotSetup,
}

pub trait Plotter {
    fn live_plot(&mut self, frame: &PlotFrame<'_>) -> anyhow::Result<()>;
}

/// Persistence of a run.
///
/// `begin` and `end` bracket every run, `end` is called on error paths too.
pub trait DataSaver {
    fn begin(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn add_metadata(&mut self, metadata: &serde_json::Map<String, serde_json::Value>)
    -> anyhow::Result<()>;

    /// Incremental save of the raw streams listed in `save`.
    fn update_multiple_results(
        &mut self,
        results: &IndexMap<String, Vec<f64>>,
        save: &[String],
        group: &str,
    ) -> anyhow::Result<()>;

    /// Final save of the reshaped results listed in `save`.
    fn add_multiple_results(
        &mut self,
        results: &IndexMap<String, SavedResult>,
        save: &[String],
        group: &str,
    ) -> anyhow::Result<()>;

    fn end(&mut self) {}
}

/// Addressable hardware control channel of a mode.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HardwareChannel {
    pub name: String,
    pub element: String,
}

/// Maps mode names to hardware channels.
pub trait ChannelResolver {
    fn resolve(&self, name: &str) -> Option<HardwareChannel>;

    /// Names that can be resolved, for error messages.
    fn available(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: IndexMap<String, HardwareChannel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S1: Into<String>, S2: Into<String>>(&mut self, name: S1, element: S2) {
        let name = name.into();
        self.channels.insert(
            name.clone(),
            HardwareChannel {
                name,
                element: element.into(),
            },
        );
    }

    pub fn with_channel<S1: Into<String>, S2: Into<String>>(mut self, name: S1, element: S2) -> Self {
        self.register(name, element);
        self
    }
}

impl ChannelResolver for ChannelRegistry {
    fn resolve(&self, name: &str) -> Option<HardwareChannel> {
        self.channels.get(name).cloned()
    }

    fn available(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_registry() {
        let registry = ChannelRegistry::new()
            .with_channel("qubit", "qubit_element")
            .with_channel("rr", "rr_element");
        assert_eq!(
            registry.resolve("rr"),
            Some(HardwareChannel {
                name: "rr".to_string(),
                element: "rr_element".to_string(),
            })
        );
        assert_eq!(registry.resolve("cavity"), None);
        assert_eq!(registry.available(), vec!["qubit", "rr"]);
    }
}
