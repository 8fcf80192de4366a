// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use num_traits::cast::ToPrimitive;

#[derive(Debug, Clone, Copy)]
pub enum NumericLiteral {
    Int(i64),
    Float(f64),
}

impl NumericLiteral {
    pub fn is_int(&self) -> bool {
        matches!(self, NumericLiteral::Int(_))
    }

    pub fn is_finite(&self) -> bool {
        match self {
            NumericLiteral::Int(_) => true,
            NumericLiteral::Float(v) => v.is_finite(),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            NumericLiteral::Int(v) => v.to_f64().unwrap_or(f64::NAN),
            NumericLiteral::Float(v) => *v,
        }
    }
}

impl Eq for NumericLiteral {}

impl PartialEq for NumericLiteral {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumericLiteral::Int(a), NumericLiteral::Int(b)) => a == b,
            (NumericLiteral::Float(a), NumericLiteral::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl std::fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericLiteral::Int(v) => write!(f, "{v}"),
            NumericLiteral::Float(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for NumericLiteral {
    fn from(value: i64) -> Self {
        NumericLiteral::Int(value)
    }
}

impl From<i32> for NumericLiteral {
    fn from(value: i32) -> Self {
        NumericLiteral::Int(value.into())
    }
}

impl From<u32> for NumericLiteral {
    fn from(value: u32) -> Self {
        NumericLiteral::Int(value.into())
    }
}

impl From<f64> for NumericLiteral {
    fn from(value: f64) -> Self {
        NumericLiteral::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(NumericLiteral::Int(3).to_string(), "3");
        assert_eq!(NumericLiteral::Float(3.0).to_string(), "3.0");
        assert_eq!(NumericLiteral::Float(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn test_equality_is_type_sensitive() {
        assert_eq!(NumericLiteral::from(2), NumericLiteral::Int(2));
        assert_ne!(NumericLiteral::Int(2), NumericLiteral::Float(2.0));
        assert_eq!(NumericLiteral::Int(2).as_f64(), 2.0);
    }
}
