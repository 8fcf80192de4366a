// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

/// Role of a sweep axis in the loop nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum AxisRole {
    Repetition,
    Axis2,
    Axis1,
}

impl AxisRole {
    /// Loop nesting order, outermost first.
    ///
    /// The generated program iterates row-major over this order, so the first
    /// user axis varies fastest. Result reshaping relies on it.
    pub const NESTING_ORDER: [AxisRole; 3] = [AxisRole::Repetition, AxisRole::Axis2, AxisRole::Axis1];

    pub fn default_name(&self) -> &'static str {
        match self {
            AxisRole::Repetition => "n",
            AxisRole::Axis2 => "y",
            AxisRole::Axis1 => "x",
        }
    }

    pub fn is_user_axis(&self) -> bool {
        !matches!(self, AxisRole::Repetition)
    }

    /// Loop depth, 0 for the outermost loop.
    pub fn depth(&self) -> usize {
        match self {
            AxisRole::Repetition => 0,
            AxisRole::Axis2 => 1,
            AxisRole::Axis1 => 2,
        }
    }
}
