// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Live acquisition of swept experiments.
//!
//! An [`Experiment`] declares its variables, sweeps and pulse sequence. The
//! [`AcquisitionLoop`] turns it into a hardware program, runs it on a
//! [`HardwareBackend`] and polls the job until it completes, keeping running
//! statistics and handing reshaped results to the plotting and persistence
//! collaborators.

pub mod acquisition_loop;
pub mod collaborators;
pub mod error;
pub mod experiment;
pub mod results;
pub mod settings;

#[cfg(test)]
mod testing;

pub use acquisition_loop::{AcquisitionLoop, AcquisitionState, RunSummary};
pub use collaborators::{
    ChannelRegistry, ChannelResolver, DataSaver, FitParameters, Fitter, HardwareBackend,
    HardwareChannel, HardwareJob, PlotFrame, Plotter, PulseSequence,
};
pub use error::{Error, Result};
pub use experiment::{Experiment, PlotSetup, PlotType};
pub use results::{ResultBatch, ResultFrame, SavedResult};
pub use settings::{AcquisitionSettings, SanitizationChange};
