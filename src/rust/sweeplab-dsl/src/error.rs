// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Display;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A sweep axis is referenced without a usable descriptor, or a
    /// descriptor does not fit the variable it is bound to.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn configuration<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Configuration(msg.to_string())
    }
}
