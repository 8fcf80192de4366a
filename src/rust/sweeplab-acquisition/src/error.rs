// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::acquisition_loop::AcquisitionState;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] sweeplab_dsl::Error),
    #[error("Program error: {0}")]
    Program(String),
    /// A mode of the experiment is not an addressable hardware channel.
    #[error("Resolution error: '{name}' is not a hardware channel, available channels: [{available}]")]
    Resolution { name: String, available: String },
    #[error("Connection error: {0:#}")]
    Connection(anyhow::Error),
    #[error("Backend error: {0:#}")]
    Backend(anyhow::Error),
    #[error(transparent)]
    Statistics(#[from] running_stats::Error),
    #[error("Result error: {0}")]
    Results(String),
    #[error("Collaborator error: {0:#}")]
    Collaborator(anyhow::Error),
    #[error("Settings error: {0}")]
    Settings(String),
    #[error("No new results within {0:?}")]
    IdleTimeout(Duration),
    #[error("Invalid state transition from {from:?} to {to:?}")]
    Transition {
        from: AcquisitionState,
        to: AcquisitionState,
    },
}

impl Error {
    pub fn results<T: std::fmt::Display>(msg: T) -> Self {
        Error::Results(msg.to_string())
    }
}

impl From<program_generator::Error> for Error {
    fn from(value: program_generator::Error) -> Self {
        match value {
            program_generator::Error::Configuration(err) => Error::Configuration(err),
            program_generator::Error::Program(msg) => Error::Program(msg),
            program_generator::Error::Anyhow(err) => Error::Program(format!("{err:#}")),
        }
    }
}

impl From<numeric_array::ShapeError> for Error {
    fn from(value: numeric_array::ShapeError) -> Self {
        Error::Results(value.to_string())
    }
}
