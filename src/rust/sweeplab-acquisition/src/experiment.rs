// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use numeric_array::NumericArray;
use program_generator::stream_processing::tags;
use serde_json::{Map, Value, json};
use sweeplab_dsl::builders::VariableSpecBuilder;
use sweeplab_dsl::sweep_configurator::{SweepConfigurator, SweepPlan};
use sweeplab_dsl::types::{AxisRole, NumericLiteral, NumericType, SweepDescriptor};
use sweeplab_dsl::{VariableSet, VariableSpec};
use sweeplab_log::info;

use crate::Result;
use crate::collaborators::PulseSequence;

/// Tag of the phase of the averaged signal, computed on the host.
pub const PHASE_TAG: &str = "PHASE";
/// Tag of the single-shot state estimate.
pub const STATE_TAG: &str = "state";
/// Result key of the repeated internal sweep labels.
pub const INTERNAL_SWEEP_KEY: &str = "internal sweep";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PlotType {
    /// One trace per value of the outer axis.
    #[serde(rename = "1D")]
    OneD,
    /// Color mesh over both axes.
    #[serde(rename = "2D")]
    TwoD,
}

/// Parameters handed to the plotter.
///
/// Unset labels and limits are filled in by [`Experiment::plot_setup`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlotSetup {
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub zlabel: Option<String>,
    pub trace_labels: Vec<String>,
    pub title: Option<String>,
    pub skip_plot: bool,
    pub plot_type: PlotType,
    pub plot_err: bool,
    pub cmap: String,
    pub zlimits: Option<(f64, f64)>,
    pub zlog: bool,
}

impl Default for PlotSetup {
    fn default() -> Self {
        Self {
            xlabel: None,
            ylabel: None,
            zlabel: None,
            trace_labels: Vec::new(),
            title: None,
            skip_plot: false,
            plot_type: PlotType::OneD,
            plot_err: true,
            cmap: "viridis".to_string(),
            zlimits: None,
            zlog: false,
        }
    }
}

/// A swept experiment: modes, repetitions, sweeps and the pulse sequence
/// played in the innermost loop.
pub struct Experiment {
    sequence: Box<dyn PulseSequence>,
    modes: Vec<String>,
    reps: u64,
    /// Nanoseconds waited on every mode after each iteration.
    wait_time: u64,
    x_sweep: Option<SweepDescriptor>,
    y_sweep: Option<SweepDescriptor>,
    single_shot: bool,
    plot_quad: Option<String>,
    cable_delay: f64,
    plot_setup: PlotSetup,
    variables: VariableSet,
}

impl Experiment {
    pub fn new<S: Into<String>>(
        sequence: Box<dyn PulseSequence>,
        modes: impl IntoIterator<Item = S>,
        reps: u64,
    ) -> Self {
        let experiment = Self {
            sequence,
            modes: modes.into_iter().map(Into::into).collect(),
            reps,
            wait_time: 0,
            x_sweep: None,
            y_sweep: None,
            single_shot: false,
            plot_quad: None,
            cable_delay: 0.0,
            plot_setup: PlotSetup::default(),
            variables: standard_variables(),
        };
        info!("Created {}", experiment.sequence.name());
        experiment
    }

    pub fn wait_time(mut self, wait_time: u64) -> Self {
        self.wait_time = wait_time;
        self
    }

    pub fn x_sweep(mut self, descriptor: SweepDescriptor) -> Self {
        self.x_sweep = Some(descriptor);
        self
    }

    pub fn y_sweep(mut self, descriptor: SweepDescriptor) -> Self {
        self.y_sweep = Some(descriptor);
        self
    }

    /// Add the averaged `state` variable and plot the state estimate.
    pub fn single_shot(mut self, single_shot: bool) -> Self {
        self.single_shot = single_shot;
        if single_shot {
            self.variables.insert(STATE_TAG, state_variable());
        } else {
            self.variables.remove(STATE_TAG);
        }
        self
    }

    /// Plot the result stream `tag` (`I_AVG`, `Q_AVG`, `PHASE`, ...) instead
    /// of the signal magnitude.
    pub fn plot_quad<S: Into<String>>(mut self, tag: S) -> Self {
        self.plot_quad = Some(tag.into());
        self
    }

    /// Seconds of cable delay subtracted, times frequency, from the phase.
    pub fn cable_delay(mut self, cable_delay: f64) -> Self {
        self.cable_delay = cable_delay;
        self
    }

    pub fn setup_plot(mut self, setup: PlotSetup) -> Self {
        self.plot_setup = setup;
        self
    }

    /// Additional user variables. A variable with a standard name replaces it.
    pub fn extra_variables<S: Into<String>>(
        mut self,
        variables: impl IntoIterator<Item = (S, VariableSpec)>,
    ) -> Self {
        for (name, spec) in variables {
            self.variables.insert(name, spec);
        }
        self
    }

    pub fn name(&self) -> &str {
        self.sequence.name()
    }

    pub fn sequence(&self) -> &dyn PulseSequence {
        self.sequence.as_ref()
    }

    pub fn modes(&self) -> &[String] {
        &self.modes
    }

    pub fn reps(&self) -> u64 {
        self.reps
    }

    pub fn wait_time_ns(&self) -> u64 {
        self.wait_time
    }

    pub fn is_single_shot(&self) -> bool {
        self.single_shot
    }

    pub fn cable_delay_s(&self) -> f64 {
        self.cable_delay
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    pub fn fit_fn(&self) -> Option<&str> {
        self.sequence.fit_fn()
    }

    pub fn internal_sweep(&self) -> Option<Vec<String>> {
        self.sequence.internal_sweep()
    }

    /// Plot parameters with defaults filled in.
    pub fn plot_setup(&self) -> PlotSetup {
        let mut setup = self.plot_setup.clone();
        if setup.zlabel.is_none() {
            let zlabel = if self.single_shot { "P1" } else { "Signal (a.u.)" };
            setup.zlabel = Some(zlabel.to_string());
        }
        if setup.zlimits.is_none() && self.single_shot && !setup.zlog {
            setup.zlimits = Some((-0.05, 1.05));
        }
        if setup.title.is_none() {
            setup.title = Some(self.name().to_string());
        }
        setup
    }

    pub fn sweep_configurator(&self) -> SweepConfigurator {
        let mut configurator = SweepConfigurator::new(self.reps);
        if let Some(x) = &self.x_sweep {
            configurator = configurator.axis(AxisRole::Axis1, AxisRole::Axis1.default_name(), x.clone());
        }
        if let Some(y) = &self.y_sweep {
            configurator = configurator.axis(AxisRole::Axis2, AxisRole::Axis2.default_name(), y.clone());
        }
        if let Some(labels) = self.internal_sweep() {
            configurator = configurator.internal_enumeration(labels);
        }
        configurator
    }

    /// Configure the sweeps on the experiment variables.
    pub fn configure(&mut self) -> Result<SweepPlan> {
        let configurator = self.sweep_configurator();
        configurator
            .configure(&mut self.variables)
            .map_err(Into::into)
    }

    /// Tags of the independent and dependent results.
    ///
    /// Only meaningful once the sweeps are configured.
    pub fn results_tags(&self) -> (Vec<String>, Vec<String>) {
        let independent = [AxisRole::Axis1, AxisRole::Axis2]
            .iter()
            .filter_map(|role| self.variables.get(role.default_name()))
            .filter_map(|spec| spec.stream_tag.clone())
            .collect();
        let dependent = if let Some(tag) = &self.plot_quad {
            tag.clone()
        } else if self.single_shot {
            STATE_TAG.to_string()
        } else {
            tags::Z_AVG.to_string()
        };
        (independent, vec![dependent])
    }

    /// Run parameters recorded with the results.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("experiment".to_string(), json!(self.name()));
        metadata.insert("mode_names".to_string(), json!(self.modes));
        metadata.insert("reps".to_string(), json!(self.reps));
        metadata.insert("wait_time".to_string(), json!(self.wait_time));
        metadata.insert("single_shot".to_string(), json!(self.single_shot));
        metadata.insert("plot_quad".to_string(), json!(self.plot_quad));
        metadata.insert("cable_delay".to_string(), json!(self.cable_delay));
        metadata.insert(
            "x_sweep".to_string(),
            self.x_sweep.as_ref().map_or(Value::Null, descriptor_json),
        );
        metadata.insert(
            "y_sweep".to_string(),
            self.y_sweep.as_ref().map_or(Value::Null, descriptor_json),
        );
        if let Some(labels) = self.internal_sweep() {
            metadata.insert("internal_sweep".to_string(), json!(labels));
        }
        metadata.insert("fit_fn".to_string(), json!(self.fit_fn()));
        metadata
    }
}

fn standard_variables() -> VariableSet {
    let axis = || {
        VariableSpecBuilder::new()
            .averaged(false)
            .retain_all_shots(false)
            .build()
    };
    let quadrature = |tag: &str| {
        VariableSpecBuilder::new()
            .numeric_type(NumericType::Fixed)
            .averaged(false)
            .buffered(true)
            .stream_tag(tag)
            .build()
    };
    VariableSet::new()
        .with_variable(
            AxisRole::Repetition.default_name(),
            VariableSpecBuilder::new().numeric_type(NumericType::Int).build(),
        )
        .with_variable(AxisRole::Axis1.default_name(), axis())
        .with_variable(AxisRole::Axis2.default_name(), axis())
        .with_variable("I", quadrature("I"))
        .with_variable("Q", quadrature("Q"))
}

fn state_variable() -> VariableSpec {
    VariableSpecBuilder::new()
        .numeric_type(NumericType::Fixed)
        .averaged(true)
        .buffered(true)
        .retain_all_shots(false)
        .stream_tag(STATE_TAG)
        .build()
}

fn literal_json(literal: &NumericLiteral) -> Value {
    match literal {
        NumericLiteral::Int(i) => json!(i),
        NumericLiteral::Float(f) => json!(f),
    }
}

fn descriptor_json(descriptor: &SweepDescriptor) -> Value {
    match descriptor {
        SweepDescriptor::Linear { start, stop, step } => {
            json!([literal_json(start), literal_json(stop), literal_json(step)])
        }
        SweepDescriptor::Explicit(values) => match values.as_ref() {
            NumericArray::Boolean(v) => json!(v),
            NumericArray::Integer64(v) => json!(v),
            NumericArray::Float64(v) => json!(v),
            NumericArray::Complex64(v) => json!(v.iter().map(|c| [c.re, c.im]).collect::<Vec<_>>()),
        },
    }
}
