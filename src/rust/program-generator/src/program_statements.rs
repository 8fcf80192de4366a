// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use numeric_array::NumericArray;
use std::fmt;
use std::sync::Arc;
use sweeplab_dsl::types::{NumericLiteral, NumericType};

use crate::program_generator::ProgramGenerator;

type VariableInternal = String;
type StreamInternal = String;

/// Argument or right-hand side of a program statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramValue {
    Bool(bool),
    /// Reference to a declared variable, rendered verbatim.
    Variable(String),
    LiteralString(String),
    Integer(i64),
    Float(f64),
    /// Arithmetic on variables and literals, rendered verbatim.
    Expression(String),
}

impl ProgramValue {
    pub fn variable<S: Into<String>>(name: S) -> Self {
        ProgramValue::Variable(name.into())
    }

    pub fn literal<S: Into<String>>(text: S) -> Self {
        ProgramValue::LiteralString(text.into())
    }
}

impl fmt::Display for ProgramValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramValue::Bool(b) => write!(f, "{b}"),
            ProgramValue::Variable(s) => write!(f, "{s}"),
            ProgramValue::LiteralString(s) => write!(f, "\"{s}\""),
            ProgramValue::Integer(i) => write!(f, "{i}"),
            ProgramValue::Float(flt) => write!(f, "{flt:?}"),
            ProgramValue::Expression(s) => write!(f, "{s}"),
        }
    }
}

impl From<NumericLiteral> for ProgramValue {
    fn from(value: NumericLiteral) -> Self {
        match value {
            NumericLiteral::Int(i) => ProgramValue::Integer(i),
            NumericLiteral::Float(f) => ProgramValue::Float(f),
        }
    }
}

impl From<i64> for ProgramValue {
    fn from(value: i64) -> Self {
        ProgramValue::Integer(value)
    }
}

impl From<f64> for ProgramValue {
    fn from(value: f64) -> Self {
        ProgramValue::Float(value)
    }
}

impl From<bool> for ProgramValue {
    fn from(value: bool) -> Self {
        ProgramValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgramStatement {
    Comment {
        text: String,
    },
    VariableDeclaration {
        variable_name: VariableInternal,
        numeric_type: NumericType,
        initial_value: Option<ProgramValue>,
    },
    StreamDeclaration {
        stream_name: StreamInternal,
    },
    FunctionCall {
        name: String,
        args: Vec<ProgramValue>,
        assign_to: Option<VariableInternal>,
    },
    VariableAssignment {
        variable_name: VariableInternal,
        value: ProgramValue,
    },
    Wait {
        duration: ProgramValue,
        targets: Vec<String>,
    },
    Save {
        variable_name: VariableInternal,
        stream_name: StreamInternal,
    },
    For {
        variable_name: VariableInternal,
        start: NumericLiteral,
        stop: NumericLiteral,
        step: NumericLiteral,
        body: ProgramGenerator,
    },
    ForEach {
        variable_name: VariableInternal,
        values: Arc<NumericArray>,
        body: ProgramGenerator,
    },
}

impl ProgramStatement {
    /// Body of a loop statement.
    pub fn body(&self) -> Option<&ProgramGenerator> {
        match self {
            ProgramStatement::For { body, .. } | ProgramStatement::ForEach { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub(crate) fn format_values(values: &NumericArray) -> String {
    let items: Vec<String> = match values {
        NumericArray::Boolean(v) => v.iter().map(|b| b.to_string()).collect(),
        NumericArray::Integer64(v) => v.iter().map(|i| i.to_string()).collect(),
        NumericArray::Float64(v) => v.iter().map(|f| format!("{f:?}")).collect(),
        NumericArray::Complex64(v) => v.iter().map(|c| format!("({:?}, {:?})", c.re, c.im)).collect(),
    };
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(ProgramValue::Integer(3).to_string(), "3");
        assert_eq!(ProgramValue::Float(3.0).to_string(), "3.0");
        assert_eq!(ProgramValue::literal("pi").to_string(), "\"pi\"");
        assert_eq!(ProgramValue::variable("x").to_string(), "x");
        assert_eq!(
            ProgramValue::from(NumericLiteral::Float(0.5)),
            ProgramValue::Float(0.5)
        );
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_values(&NumericArray::Integer64(vec![1, 2, 3])), "[1, 2, 3]");
        assert_eq!(format_values(&NumericArray::Float64(vec![0.5, 1.0])), "[0.5, 1.0]");
        assert_eq!(format_values(&NumericArray::Boolean(vec![true, false])), "[true, false]");
    }
}
