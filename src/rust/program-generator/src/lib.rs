// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod program;
pub mod program_generator;
pub mod program_statements;
pub mod sequence_builder;
pub mod stream_processing;

pub use program::Program;
pub use sequence_builder::{SequenceBuilder, SequenceContext};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] sweeplab_dsl::Error),
    #[error("Program error: {0}")]
    Program(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn program<T: std::fmt::Display>(msg: T) -> Self {
        Error::Program(msg.to_string())
    }

    pub fn configuration<T: std::fmt::Display>(msg: T) -> Self {
        Error::Configuration(sweeplab_dsl::Error::configuration(msg))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
