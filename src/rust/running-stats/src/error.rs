// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The batch does not add any repetition to the running state.
    #[error("Empty batch: count {count} does not exceed the previous count {prior_count}")]
    EmptyBatch { count: u64, prior_count: u64 },
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}
