// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use numeric_array::NumericArray;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{NumericLiteral, NumericType};

/// Largest number of values a buffered or enumerated sweep may hold.
pub const MAX_SWEEP_VALUES: usize = 1 << 24;

/// Hardware loop used to iterate a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepMechanism {
    /// Counting loop with start, stop condition and increment.
    Linear,
    /// Loop over an explicit list of values.
    Enumerated,
}

/// Values of a sweep axis.
///
/// `Linear` is a half-open range `[start, stop)`. Callers that want the
/// intended end point included add half a step to `stop`.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepDescriptor {
    Linear {
        start: NumericLiteral,
        stop: NumericLiteral,
        step: NumericLiteral,
    },
    Explicit(Arc<NumericArray>),
}

impl SweepDescriptor {
    pub fn linear<T: Into<NumericLiteral>>(start: T, stop: T, step: T) -> Self {
        SweepDescriptor::Linear {
            start: start.into(),
            stop: stop.into(),
            step: step.into(),
        }
    }

    pub fn explicit<T: Into<NumericArray>>(values: T) -> Self {
        SweepDescriptor::Explicit(Arc::new(values.into()))
    }

    pub fn mechanism(&self) -> SweepMechanism {
        match self {
            SweepDescriptor::Linear { .. } => SweepMechanism::Linear,
            SweepDescriptor::Explicit(_) => SweepMechanism::Enumerated,
        }
    }

    /// Type of the variable that can hold the values of this sweep.
    pub fn numeric_type(&self) -> Result<NumericType> {
        match self {
            SweepDescriptor::Linear { start, stop, step } => {
                if start.is_int() && stop.is_int() && step.is_int() {
                    Ok(NumericType::Int)
                } else {
                    Ok(NumericType::Fixed)
                }
            }
            SweepDescriptor::Explicit(values) => match values.as_ref() {
                NumericArray::Boolean(_) => Ok(NumericType::Bool),
                NumericArray::Integer64(_) => Ok(NumericType::Int),
                NumericArray::Float64(_) => Ok(NumericType::Fixed),
                NumericArray::Complex64(_) => Err(Error::configuration(
                    "Complex sweep values cannot be held by a hardware variable",
                )),
            },
        }
    }

    /// Number of values of the sweep, computed without enumerating them.
    pub fn count(&self) -> Result<usize> {
        let count = match self {
            SweepDescriptor::Linear { start, stop, step } => {
                if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
                    return Err(Error::configuration(format!(
                        "Linear sweep ({start}, {stop}, {step}) has non-finite bounds"
                    )));
                }
                if step.as_f64() == 0.0 {
                    return Err(Error::configuration(format!(
                        "Linear sweep ({start}, {stop}, {step}) has a zero step"
                    )));
                }
                let count = match (start, stop, step) {
                    (
                        NumericLiteral::Int(start),
                        NumericLiteral::Int(stop),
                        NumericLiteral::Int(step),
                    ) => NumericArray::arange_len_i64(*start, *stop, *step),
                    _ => NumericArray::arange_len_f64(start.as_f64(), stop.as_f64(), step.as_f64()),
                };
                count.ok_or_else(|| {
                    Error::configuration(format!(
                        "Linear sweep ({start}, {stop}, {step}) has too many values"
                    ))
                })?
            }
            SweepDescriptor::Explicit(values) => {
                self.numeric_type()?;
                values.len()
            }
        };
        if count == 0 {
            return Err(Error::configuration(format!(
                "Sweep {self} does not produce any value"
            )));
        }
        Ok(count)
    }

    /// Resolve the sweep into the ordered list of values it iterates over.
    ///
    /// Fails for sweeps of more than [`MAX_SWEEP_VALUES`] values.
    pub fn enumerate(&self) -> Result<NumericArray> {
        let count = self.count()?;
        if count > MAX_SWEEP_VALUES {
            return Err(Error::configuration(format!(
                "Sweep {self} has {count} values, at most {MAX_SWEEP_VALUES} can be enumerated"
            )));
        }
        let values = match self {
            SweepDescriptor::Linear { start, stop, step } => match (start, stop, step) {
                (NumericLiteral::Int(start), NumericLiteral::Int(stop), NumericLiteral::Int(step)) => {
                    NumericArray::arange_i64(*start, *stop, *step)
                }
                _ => NumericArray::arange_f64(start.as_f64(), stop.as_f64(), step.as_f64()),
            },
            SweepDescriptor::Explicit(values) => Some(values.as_ref().clone()),
        };
        values.ok_or_else(|| Error::configuration(format!("Sweep {self} cannot be enumerated")))
    }
}

impl std::fmt::Display for SweepDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepDescriptor::Linear { start, stop, step } => write!(f, "({start}, {stop}, {step})"),
            SweepDescriptor::Explicit(values) => write!(f, "[{} values]", values.len()),
        }
    }
}
