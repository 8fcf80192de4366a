// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Binding of sweep axes to experiment variables.
//!
//! The configurator resolves each axis descriptor on its variable, fixes the
//! loop nesting order and derives the buffering shape used to reshape the
//! streamed results.

use sweeplab_log::{info, warn};

use crate::error::{Error, Result};
use crate::types::{AxisRole, BufferShape, MAX_SWEEP_VALUES, SweepDescriptor, SweepMechanism};
use crate::variable_set::VariableSet;
use crate::variable_spec::VariableSpec;

/// A named sweep role bound to one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepAxis {
    pub role: AxisRole,
    pub name: String,
    pub descriptor: SweepDescriptor,
}

/// An axis after its variable has been configured.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAxis {
    pub role: AxisRole,
    pub name: String,
    pub mechanism: SweepMechanism,
    pub buffer_length: usize,
}

/// Outcome of sweep configuration: loop order and buffering shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    axes: Vec<PlannedAxis>,
    shape: BufferShape,
    internal_enumeration: Option<Vec<String>>,
    repetitions: u64,
}

impl SweepPlan {
    /// Configured axes in nesting order, repetition axis first.
    pub fn axes(&self) -> &[PlannedAxis] {
        &self.axes
    }

    pub fn axis(&self, role: AxisRole) -> Option<&PlannedAxis> {
        self.axes.iter().find(|axis| axis.role == role)
    }

    pub fn user_axes(&self) -> impl Iterator<Item = &PlannedAxis> {
        self.axes.iter().filter(|axis| axis.role.is_user_axis())
    }

    pub fn shape(&self) -> &BufferShape {
        &self.shape
    }

    pub fn buffer_len(&self) -> usize {
        self.shape.buffer_len()
    }

    pub fn internal_enumeration(&self) -> Option<&[String]> {
        self.internal_enumeration.as_deref()
    }

    pub fn repetitions(&self) -> u64 {
        self.repetitions
    }
}

pub struct SweepConfigurator {
    repetitions: u64,
    repetition_name: String,
    axes: Vec<SweepAxis>,
    internal_enumeration: Option<Vec<String>>,
}

impl SweepConfigurator {
    pub fn new(repetitions: u64) -> Self {
        Self {
            repetitions,
            repetition_name: AxisRole::Repetition.default_name().to_string(),
            axes: Vec::new(),
            internal_enumeration: None,
        }
    }

    pub fn repetition_name<S: Into<String>>(mut self, name: S) -> Self {
        self.repetition_name = name.into();
        self
    }

    /// Bind a user axis. A later call for the same role replaces the earlier one.
    pub fn axis<S: Into<String>>(mut self, role: AxisRole, name: S, descriptor: SweepDescriptor) -> Self {
        self.axes.retain(|axis| axis.role != role);
        self.axes.push(SweepAxis {
            role,
            name: name.into(),
            descriptor,
        });
        self
    }

    /// Fixed sub-sequence labels executed inside a single repetition.
    pub fn internal_enumeration(mut self, labels: Vec<String>) -> Self {
        self.internal_enumeration = Some(labels);
        self
    }

    /// Configure a single variable as sweep axis `axis_name`.
    ///
    /// Marks the variable as buffered, tags its stream with the axis name and
    /// returns the resolved number of values. Buffered axes hold at most
    /// [`MAX_SWEEP_VALUES`] values.
    pub fn configure_axis(
        spec: &mut VariableSpec,
        axis_name: &str,
        descriptor: SweepDescriptor,
    ) -> Result<usize> {
        let count = descriptor.count()?;
        if count > MAX_SWEEP_VALUES {
            return Err(Error::configuration(format!(
                "Sweep on '{axis_name}' has {count} values, at most {MAX_SWEEP_VALUES} can be buffered"
            )));
        }
        let sweep = spec.configure_sweep(descriptor)?;
        let buffer_length = sweep.len();
        match sweep.mechanism {
            SweepMechanism::Linear => {
                info!("Configured linear sweep on variable {}", axis_name);
            }
            SweepMechanism::Enumerated => {
                info!("Configured sweep with arbitrary values on variable {}", axis_name);
            }
        }
        spec.is_buffered = true;
        spec.stream_tag = Some(axis_name.to_string());
        Ok(buffer_length)
    }

    pub fn configure(&self, variables: &mut VariableSet) -> Result<SweepPlan> {
        if self.repetitions == 0 {
            return Err(Error::configuration("The repetition count must be positive"));
        }
        if let Some(axis) = self.axes.iter().find(|axis| !axis.role.is_user_axis()) {
            return Err(Error::configuration(format!(
                "Axis '{}' cannot take the repetition role, it is set by the repetition count",
                axis.name
            )));
        }
        let reps = i64::try_from(self.repetitions).map_err(|_| {
            Error::configuration(format!("Repetition count {} is too large", self.repetitions))
        })?;
        let mut planned = Vec::with_capacity(AxisRole::NESTING_ORDER.len());
        let mut dims = Vec::new();
        for role in AxisRole::NESTING_ORDER {
            if role == AxisRole::Repetition {
                let spec = lookup(variables, &self.repetition_name, role)?;
                let sweep = spec.configure_sweep(SweepDescriptor::linear(0, reps, 1))?;
                planned.push(PlannedAxis {
                    role,
                    name: self.repetition_name.clone(),
                    mechanism: sweep.mechanism,
                    buffer_length: sweep.len(),
                });
                continue;
            }
            let Some(axis) = self.axes.iter().find(|axis| axis.role == role) else {
                continue;
            };
            if planned.iter().any(|p: &PlannedAxis| p.name == axis.name) {
                return Err(Error::configuration(format!(
                    "Variable '{}' is bound to more than one sweep axis",
                    axis.name
                )));
            }
            let spec = lookup(variables, &axis.name, role)?;
            let buffer_length = Self::configure_axis(spec, &axis.name, axis.descriptor.clone())?;
            planned.push(PlannedAxis {
                role,
                name: axis.name.clone(),
                mechanism: axis.descriptor.mechanism(),
                buffer_length,
            });
            dims.push(buffer_length);
        }
        if let Some(labels) = &self.internal_enumeration {
            if labels.is_empty() {
                return Err(Error::configuration("The internal sweep has no labels"));
            }
            dims.push(labels.len());
        }
        let shape = BufferShape::new(dims);
        if shape.is_empty() {
            warn!("No sweep is configured");
        }
        info!("Set buffer dimensions: {}", shape);
        Ok(SweepPlan {
            axes: planned,
            shape,
            internal_enumeration: self.internal_enumeration.clone(),
            repetitions: self.repetitions,
        })
    }
}

fn lookup<'a>(variables: &'a mut VariableSet, name: &str, role: AxisRole) -> Result<&'a mut VariableSpec> {
    variables.get_mut(name).ok_or_else(|| {
        Error::configuration(format!(
            "Sweep axis {role:?} refers to variable '{name}', which is not declared"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::VariableSpecBuilder;
    use crate::types::NumericType;

    fn variables() -> VariableSet {
        VariableSet::new()
            .with_variable("n", VariableSpecBuilder::new().numeric_type(NumericType::Int).build())
            .with_variable(
                "x",
                VariableSpecBuilder::new().averaged(false).retain_all_shots(false).build(),
            )
            .with_variable(
                "y",
                VariableSpecBuilder::new().averaged(false).retain_all_shots(false).build(),
            )
    }

    #[test]
    fn test_single_linear_axis() {
        let mut vars = variables();
        let plan = SweepConfigurator::new(100)
            .axis(AxisRole::Axis1, "x", SweepDescriptor::linear(0, 10, 1))
            .configure(&mut vars)
            .unwrap();
        assert_eq!(plan.shape().dims(), &[10]);
        assert_eq!(plan.repetitions(), 100);
        let roles: Vec<_> = plan.axes().iter().map(|a| a.role).collect();
        assert_eq!(roles, vec![AxisRole::Repetition, AxisRole::Axis1]);

        let x = vars.get("x").unwrap();
        assert!(x.is_buffered);
        assert_eq!(x.stream_tag.as_deref(), Some("x"));
        assert_eq!(x.buffer_length(), Some(10));
        // The repetition variable is swept but not streamed.
        let n = vars.get("n").unwrap();
        assert_eq!(n.buffer_length(), Some(100));
        assert!(n.stream_tag.is_none());
    }

    #[test]
    fn test_explicit_axis_with_internal_enumeration() {
        let mut vars = variables();
        let plan = SweepConfigurator::new(10)
            .axis(
                AxisRole::Axis1,
                "x",
                SweepDescriptor::explicit(vec![1_i64, 2, 3, 5, 8]),
            )
            .internal_enumeration(vec!["ground".to_string(), "excited".to_string()])
            .configure(&mut vars)
            .unwrap();
        assert_eq!(vars.get("x").unwrap().buffer_length(), Some(5));
        assert_eq!(plan.shape().dims(), &[5, 2]);
        assert_eq!(plan.buffer_len(), 10);
        assert_eq!(
            plan.axis(AxisRole::Axis1).unwrap().mechanism,
            SweepMechanism::Enumerated
        );
    }

    #[test]
    fn test_two_axes_shape_follows_nesting_order() {
        let mut vars = variables();
        let plan = SweepConfigurator::new(4)
            .axis(AxisRole::Axis1, "x", SweepDescriptor::linear(0, 3, 1))
            .axis(AxisRole::Axis2, "y", SweepDescriptor::explicit(vec![0.1, 0.2]))
            .configure(&mut vars)
            .unwrap();
        // Axis 2 is the outer loop, so it is the leading dimension.
        assert_eq!(plan.shape().dims(), &[2, 3]);
        let names: Vec<_> = plan.axes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["n", "y", "x"]);
    }

    #[test]
    fn test_no_user_sweep() {
        let mut vars = variables();
        let plan = SweepConfigurator::new(5).configure(&mut vars).unwrap();
        assert!(plan.shape().is_empty());
        assert_eq!(plan.buffer_len(), 1);
        assert_eq!(plan.user_axes().count(), 0);
    }

    #[test]
    fn test_repetition_axis_is_counted_not_enumerated() {
        let mut vars = variables();
        // Enumerating this many repetitions would not fit in memory.
        let reps = 1_u64 << 40;
        let plan = SweepConfigurator::new(reps)
            .axis(AxisRole::Axis1, "x", SweepDescriptor::linear(0, 3, 1))
            .configure(&mut vars)
            .unwrap();
        let repetition = plan.axis(AxisRole::Repetition).unwrap();
        assert_eq!(repetition.buffer_length as u64, reps);
        assert_eq!(repetition.mechanism, SweepMechanism::Linear);
        assert_eq!(vars.get("n").unwrap().buffer_length().map(|n| n as u64), Some(reps));
        assert_eq!(plan.shape().dims(), &[3]);
    }

    #[test]
    fn test_oversized_user_axis() {
        let err = SweepConfigurator::new(10)
            .axis(AxisRole::Axis1, "x", SweepDescriptor::linear(0, 1 << 30, 1))
            .configure(&mut variables())
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = SweepConfigurator::new(10)
            .axis(AxisRole::Axis1, "x", SweepDescriptor::linear(0.0, 1e30, 1.0))
            .configure(&mut variables())
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_configuration_errors() {
        let mut vars = variables();
        let err = SweepConfigurator::new(5)
            .axis(AxisRole::Axis1, "freq", SweepDescriptor::linear(0, 3, 1))
            .configure(&mut vars)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        assert!(SweepConfigurator::new(0).configure(&mut vars).is_err());

        assert!(SweepConfigurator::new(5)
            .axis(AxisRole::Axis1, "x", SweepDescriptor::linear(0, 3, 1))
            .axis(AxisRole::Axis2, "x", SweepDescriptor::linear(0, 3, 1))
            .configure(&mut variables())
            .is_err());

        assert!(SweepConfigurator::new(5)
            .axis(AxisRole::Repetition, "x", SweepDescriptor::linear(0, 3, 1))
            .configure(&mut variables())
            .is_err());

        assert!(SweepConfigurator::new(5)
            .internal_enumeration(vec![])
            .configure(&mut variables())
            .is_err());
    }
}
