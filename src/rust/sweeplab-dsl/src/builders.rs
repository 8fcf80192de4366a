// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::types::NumericType;
use crate::variable_spec::VariableSpec;

pub struct VariableSpecBuilder {
    spec: VariableSpec,
}

impl Default for VariableSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec: VariableSpec::default(),
        }
    }

    pub fn numeric_type(mut self, numeric_type: NumericType) -> Self {
        self.spec.numeric_type = Some(numeric_type);
        self
    }

    pub fn averaged(mut self, is_averaged: bool) -> Self {
        self.spec.is_averaged = is_averaged;
        self
    }

    pub fn buffered(mut self, is_buffered: bool) -> Self {
        self.spec.is_buffered = is_buffered;
        self
    }

    pub fn retain_all_shots(mut self, retains_all_shots: bool) -> Self {
        self.spec.retains_all_shots = retains_all_shots;
        self
    }

    pub fn stream_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.spec.stream_tag = Some(tag.into());
        self
    }

    pub fn build(self) -> VariableSpec {
        self.spec
    }
}
