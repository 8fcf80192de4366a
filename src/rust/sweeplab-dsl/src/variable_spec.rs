// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::types::{NumericType, SweepDescriptor, SweepMechanism};

/// A validated sweep descriptor and its number of values.
///
/// Linear sweeps run as counting loops and are never enumerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredSweep {
    pub descriptor: SweepDescriptor,
    pub mechanism: SweepMechanism,
    len: usize,
}

impl ConfiguredSweep {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One measured or swept quantity of an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Type of the hardware variable. Variables without a type are not declared.
    pub numeric_type: Option<NumericType>,
    /// Average streamed values over repetitions.
    pub is_averaged: bool,
    /// Buffer streamed values into the sweep shape.
    pub is_buffered: bool,
    /// Keep every streamed value instead of only the latest one.
    pub retains_all_shots: bool,
    /// Tag under which the stream is exposed to the host. Untagged variables
    /// have no stream.
    pub stream_tag: Option<String>,
    sweep: Option<ConfiguredSweep>,
}

impl Default for VariableSpec {
    fn default() -> Self {
        Self {
            numeric_type: None,
            is_averaged: true,
            is_buffered: true,
            retains_all_shots: true,
            stream_tag: None,
            sweep: None,
        }
    }
}

impl VariableSpec {
    pub fn sweep(&self) -> Option<&ConfiguredSweep> {
        self.sweep.as_ref()
    }

    /// Number of sweep values, `None` until a sweep is configured.
    pub fn buffer_length(&self) -> Option<usize> {
        self.sweep.as_ref().map(ConfiguredSweep::len)
    }

    pub fn has_stream(&self) -> bool {
        self.stream_tag.is_some()
    }

    /// Validate `descriptor` and attach it to this variable.
    ///
    /// The numeric type is inferred from the descriptor when none was declared.
    pub fn configure_sweep(&mut self, descriptor: SweepDescriptor) -> Result<&ConfiguredSweep> {
        let sweep_type = descriptor.numeric_type()?;
        if let Some(declared) = self.numeric_type.filter(|declared| *declared != sweep_type) {
            return Err(Error::configuration(format!(
                "Variable type '{declared}' does not match the '{sweep_type}' values of sweep {descriptor}"
            )));
        }
        let len = descriptor.count()?;
        self.numeric_type = Some(sweep_type);
        let sweep = self.sweep.insert(ConfiguredSweep {
            mechanism: descriptor.mechanism(),
            descriptor,
            len,
        });
        Ok(sweep)
    }
}
