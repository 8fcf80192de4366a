// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

/// Type of a hardware-resident variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Int,
    /// Fixed-point real number.
    Fixed,
    Bool,
}

impl std::fmt::Display for NumericType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericType::Int => write!(f, "int"),
            NumericType::Fixed => write!(f, "fixed"),
            NumericType::Bool => write!(f, "bool"),
        }
    }
}
