// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod builders;
pub mod error;
pub mod sweep_configurator;
pub mod types;
pub mod variable_set;
pub mod variable_spec;

pub use error::{Error, Result};
pub use sweep_configurator::{PlannedAxis, SweepConfigurator, SweepPlan};
pub use variable_set::VariableSet;
pub use variable_spec::{ConfiguredSweep, VariableSpec};
