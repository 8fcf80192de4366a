// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Assembly of the hardware program from a pulse sequence body.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use sweeplab_dsl::sweep_configurator::{PlannedAxis, SweepPlan};
use sweeplab_dsl::types::SweepDescriptor;
use sweeplab_dsl::variable_set::VariableSet;
use sweeplab_log::{debug, warn};

use crate::program::Program;
use crate::program_generator::ProgramGenerator;
use crate::program_statements::ProgramValue;
use crate::stream_processing::{StreamOptions, StreamProcessing, stream_name, tags};
use crate::{Error, Result};

/// Emission handle passed to the pulse sequence body.
///
/// Statements land in the innermost loop of the sweep.
pub struct SequenceContext<'a> {
    body: ProgramGenerator,
    variables: &'a VariableSet,
    sweep_variables: HashSet<&'a str>,
    channels: &'a IndexMap<String, String>,
    streamed: bool,
}

impl SequenceContext<'_> {
    /// Loop variable of an active sweep axis.
    pub fn sweep_variable(&self, name: &str) -> Result<ProgramValue> {
        if self.sweep_variables.contains(name) {
            Ok(ProgramValue::variable(name))
        } else {
            Err(Error::program(format!("'{name}' is not an active sweep variable")))
        }
    }

    /// Any declared hardware variable.
    pub fn variable(&self, name: &str) -> Result<ProgramValue> {
        self.declared(name)?;
        Ok(ProgramValue::variable(name))
    }

    /// Hardware element bound to the mode `name`.
    pub fn channel(&self, name: &str) -> Result<ProgramValue> {
        self.channels
            .get(name)
            .map(|element| ProgramValue::literal(element.as_str()))
            .ok_or_else(|| Error::program(format!("Mode '{name}' has no hardware channel")))
    }

    pub fn call<S: Into<String>>(&mut self, name: S, args: Vec<ProgramValue>) {
        self.body
            .add_function_call_statement(name, args, None::<String>);
    }

    pub fn call_assign<S: Into<String>>(
        &mut self,
        name: S,
        args: Vec<ProgramValue>,
        assign_to: &str,
    ) -> Result<()> {
        self.declared(assign_to)?;
        self.body
            .add_function_call_statement(name, args, Some(assign_to));
        Ok(())
    }

    pub fn play(&mut self, pulse: &str, mode: &str) -> Result<()> {
        let element = self.channel(mode)?;
        self.call("play", vec![ProgramValue::literal(pulse), element]);
        Ok(())
    }

    /// Play a readout pulse on `mode` and demodulate it into `outputs`.
    pub fn measure(&mut self, pulse: &str, mode: &str, outputs: &[&str]) -> Result<()> {
        let mut args = vec![ProgramValue::literal(pulse), self.channel(mode)?];
        for output in outputs {
            args.push(self.variable(output)?);
        }
        self.call("measure", args);
        Ok(())
    }

    pub fn assign(&mut self, variable: &str, value: ProgramValue) -> Result<()> {
        self.declared(variable)?;
        self.body.add_variable_assignment(variable, value);
        Ok(())
    }

    pub fn wait(&mut self, duration: ProgramValue, modes: &[&str]) -> Result<()> {
        let targets = modes
            .iter()
            .map(|mode| {
                self.channels
                    .get(*mode)
                    .cloned()
                    .ok_or_else(|| Error::program(format!("Mode '{mode}' has no hardware channel")))
            })
            .collect::<Result<Vec<_>>>()?;
        self.body.add_wait(duration, targets);
        Ok(())
    }

    pub fn comment<S: Into<String>>(&mut self, text: S) {
        self.body.add_comment(text);
    }

    /// Push the current value of every tagged variable to its stream.
    pub fn stream_results(&mut self) {
        for (name, tag, spec) in self.variables.tagged() {
            if spec.numeric_type.is_some() {
                self.body.add_save(name, stream_name(tag));
            }
        }
        self.streamed = true;
    }

    fn declared(&self, name: &str) -> Result<()> {
        match self.variables.get(name) {
            Some(spec) if spec.numeric_type.is_some() => Ok(()),
            _ => Err(Error::program(format!("'{name}' is not a declared hardware variable"))),
        }
    }
}

/// Builds the looped hardware program of an experiment.
pub struct SequenceBuilder<'a> {
    variables: &'a VariableSet,
    plan: &'a SweepPlan,
    channels: IndexMap<String, String>,
    signal_tags: (String, String),
}

impl<'a> SequenceBuilder<'a> {
    pub fn new(variables: &'a VariableSet, plan: &'a SweepPlan) -> Self {
        Self {
            variables,
            plan,
            channels: IndexMap::new(),
            signal_tags: ("I".to_string(), "Q".to_string()),
        }
    }

    /// Bind the mode `mode` to the hardware element `element`.
    pub fn channel<S1: Into<String>, S2: Into<String>>(mut self, mode: S1, element: S2) -> Self {
        self.channels.insert(mode.into(), element.into());
        self
    }

    /// Tags of the in-phase and quadrature streams.
    pub fn signal_tags<S1: Into<String>, S2: Into<String>>(mut self, i_tag: S1, q_tag: S2) -> Self {
        self.signal_tags = (i_tag.into(), q_tag.into());
        self
    }

    /// Build the program over the axes of the sweep plan.
    pub fn build<F>(&self, play_body: F) -> Result<Program>
    where
        F: FnOnce(&mut SequenceContext<'_>) -> Result<()>,
    {
        self.build_with_axes(play_body, self.plan.axes())
    }

    /// Build the program over `axes`, given outermost first.
    pub fn build_with_axes<F>(&self, play_body: F, axes: &[PlannedAxis]) -> Result<Program>
    where
        F: FnOnce(&mut SequenceContext<'_>) -> Result<()>,
    {
        for pair in axes.windows(2) {
            if pair[0].role.depth() >= pair[1].role.depth() {
                return Err(Error::configuration(format!(
                    "Sweep axes '{}' and '{}' are not in nesting order",
                    pair[0].name, pair[1].name
                )));
            }
        }
        let mut descriptors = Vec::with_capacity(axes.len());
        for axis in axes {
            let spec = self.variables.get(&axis.name).ok_or_else(|| {
                Error::configuration(format!("Sweep variable '{}' is not declared", axis.name))
            })?;
            let sweep = spec.sweep().ok_or_else(|| {
                Error::configuration(format!("Sweep variable '{}' has no configured sweep", axis.name))
            })?;
            descriptors.push((axis, sweep));
        }

        let mut program = ProgramGenerator::new();
        for (name, spec) in self.variables.iter() {
            if let Some(numeric_type) = spec.numeric_type {
                program.add_variable_declaration(name, numeric_type, None)?;
            }
        }
        let stream_processing = self.declare_streams(&mut program)?;

        let mut context = SequenceContext {
            body: ProgramGenerator::new(),
            variables: self.variables,
            sweep_variables: axes.iter().map(|axis| axis.name.as_str()).collect(),
            channels: &self.channels,
            streamed: false,
        };
        play_body(&mut context)?;
        if !context.streamed {
            warn!("Pulse sequence does not stream its results, streaming them after the body");
            context.stream_results();
        }

        let mut body = context.body;
        for (axis, sweep) in descriptors.into_iter().rev() {
            let mut outer = ProgramGenerator::new();
            match &sweep.descriptor {
                SweepDescriptor::Linear { start, stop, step } => {
                    outer.add_for(axis.name.as_str(), *start, *stop, *step, body);
                }
                SweepDescriptor::Explicit(values) => {
                    outer.add_for_each(axis.name.as_str(), Arc::clone(values), body);
                }
            }
            body = outer;
        }
        program.append_statements_from(body);
        debug!(
            "Built program with {} top-level statements over {} sweep axes",
            program.num_statements(),
            axes.len()
        );
        Ok(Program::new(
            program,
            stream_processing,
            self.plan.shape().clone(),
        ))
    }

    fn declare_streams(&self, program: &mut ProgramGenerator) -> Result<StreamProcessing> {
        let buffer_len = self.plan.buffer_len();
        let mut processing = StreamProcessing::new();
        let mut seen = HashSet::new();
        for (name, tag, spec) in self.variables.tagged() {
            if spec.numeric_type.is_none() {
                return Err(Error::configuration(format!(
                    "Variable '{name}' has stream tag '{tag}' but no type"
                )));
            }
            if tags::DERIVED.contains(&tag) {
                return Err(Error::configuration(format!(
                    "Stream tag '{tag}' of variable '{name}' is reserved"
                )));
            }
            if !seen.insert(tag) {
                return Err(Error::configuration(format!(
                    "Stream tag '{tag}' is used by more than one variable"
                )));
            }
            program.add_stream_declaration(stream_name(tag))?;
            processing.add_variable_stream(
                tag,
                StreamOptions {
                    is_buffered: spec.is_buffered,
                    is_averaged: spec.is_averaged,
                    retains_all_shots: spec.retains_all_shots,
                },
                buffer_len,
            );
        }
        let (i_tag, q_tag) = &self.signal_tags;
        for tag in [i_tag, q_tag] {
            if !seen.contains(tag.as_str()) {
                return Err(Error::configuration(format!(
                    "Signal stream '{tag}' is not declared"
                )));
            }
        }
        processing.add_signal_streams(i_tag, q_tag, buffer_len);
        Ok(processing)
    }
}
