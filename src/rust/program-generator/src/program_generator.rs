// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use numeric_array::NumericArray;
use std::collections::HashSet;
use std::sync::Arc;
use sweeplab_dsl::types::{NumericLiteral, NumericType};

use crate::program_statements::{ProgramStatement, ProgramValue, format_values};
use crate::{Error, Result};

type Variable = str;

type SymbolInternal = String;

fn indent(s: &str, prefix: &str) -> String {
    s.lines()
        .flat_map(|line| [prefix, line, "\n"].into_iter())
        .collect()
}

fn format_condition(variable: &Variable, stop: &NumericLiteral, step: &NumericLiteral) -> String {
    let comparison = if step.as_f64() < 0.0 { ">" } else { "<" };
    format!("{variable} {comparison} {stop}")
}

/// Ordered list of program statements sharing one declaration scope.
#[derive(Clone, Debug, Default)]
pub struct ProgramGenerator {
    statements: Vec<ProgramStatement>,
    symbols: HashSet<SymbolInternal>,
}

impl PartialEq for ProgramGenerator {
    fn eq(&self, other: &Self) -> bool {
        self.statements == other.statements && self.symbols == other.symbols
    }
}

impl ProgramGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[ProgramStatement] {
        &self.statements
    }

    pub fn num_statements(&self) -> usize {
        self.statements.len()
    }

    pub fn append_statements_from(&mut self, other: ProgramGenerator) {
        self.statements.extend(other.statements);
    }

    pub fn add_statement(&mut self, statement: ProgramStatement) {
        self.statements.push(statement);
    }

    pub fn add_comment<S: Into<String>>(&mut self, comment: S) {
        self.statements.push(ProgramStatement::Comment {
            text: comment.into(),
        });
    }

    pub fn is_declared(&self, symbol: &Variable) -> bool {
        self.symbols.contains(symbol)
    }

    fn declare_symbol(&mut self, symbol: String) -> Result<String> {
        if self.symbols.contains(&symbol) {
            return Err(Error::program(format!(
                "Trying to declare {symbol} which has already been declared in this scope"
            )));
        }
        self.symbols.insert(symbol.clone());
        Ok(symbol)
    }

    // Only valid while the generator maps to a single scope, every symbol may
    // be declared once.
    pub fn add_variable_declaration<S: Into<String>>(
        &mut self,
        variable_name: S,
        numeric_type: NumericType,
        initial_value: Option<ProgramValue>,
    ) -> Result<()> {
        let variable_name = self.declare_symbol(variable_name.into())?;
        self.statements.push(ProgramStatement::VariableDeclaration {
            variable_name,
            numeric_type,
            initial_value,
        });
        Ok(())
    }

    pub fn add_stream_declaration<S: Into<String>>(&mut self, stream_name: S) -> Result<()> {
        let stream_name = self.declare_symbol(stream_name.into())?;
        self.statements
            .push(ProgramStatement::StreamDeclaration { stream_name });
        Ok(())
    }

    pub fn add_function_call_statement<S1: Into<String>, S2: Into<String>>(
        &mut self,
        name: S1,
        args: Vec<ProgramValue>,
        assign_to: Option<S2>,
    ) {
        self.statements.push(ProgramStatement::FunctionCall {
            name: name.into(),
            args,
            assign_to: assign_to.map(|s| s.into()),
        });
    }

    pub fn add_variable_assignment<S: Into<String>>(&mut self, variable_name: S, value: ProgramValue) {
        self.statements.push(ProgramStatement::VariableAssignment {
            variable_name: variable_name.into(),
            value,
        });
    }

    pub fn add_wait(&mut self, duration: ProgramValue, targets: Vec<String>) {
        self.statements
            .push(ProgramStatement::Wait { duration, targets });
    }

    pub fn add_save<S1: Into<String>, S2: Into<String>>(&mut self, variable_name: S1, stream_name: S2) {
        self.statements.push(ProgramStatement::Save {
            variable_name: variable_name.into(),
            stream_name: stream_name.into(),
        });
    }

    pub fn add_for<S: Into<String>>(
        &mut self,
        variable_name: S,
        start: NumericLiteral,
        stop: NumericLiteral,
        step: NumericLiteral,
        body: ProgramGenerator,
    ) {
        self.statements.push(ProgramStatement::For {
            variable_name: variable_name.into(),
            start,
            stop,
            step,
            body,
        });
    }

    pub fn add_for_each<S: Into<String>>(
        &mut self,
        variable_name: S,
        values: Arc<NumericArray>,
        body: ProgramGenerator,
    ) {
        self.statements.push(ProgramStatement::ForEach {
            variable_name: variable_name.into(),
            values,
            body,
        });
    }

    /// Whether any statement, loop bodies included, saves into `stream_name`.
    pub fn saves_stream(&self, stream_name: &str) -> bool {
        self.statements.iter().any(|statement| match statement {
            ProgramStatement::Save {
                stream_name: saved, ..
            } => saved == stream_name,
            other => other
                .body()
                .is_some_and(|body| body.saves_stream(stream_name)),
        })
    }

    pub fn generate_program(&self) -> String {
        self.statements
            .iter()
            .map(|statement| self.emit_statement(statement))
            .collect::<String>()
    }

    fn emit_statement(&self, statement: &ProgramStatement) -> String {
        match statement {
            ProgramStatement::Comment { text } => format!("/* {text} */\n"),
            ProgramStatement::VariableDeclaration {
                variable_name,
                numeric_type,
                initial_value,
            } => {
                let initial_value = initial_value
                    .as_ref()
                    .map(|s| format!(" = {s}"))
                    .unwrap_or_default();
                format!("{numeric_type} {variable_name}{initial_value};\n")
            }
            ProgramStatement::StreamDeclaration { stream_name } => {
                format!("stream {stream_name};\n")
            }
            ProgramStatement::FunctionCall {
                name,
                args,
                assign_to,
            } => {
                let assign_to = assign_to
                    .as_ref()
                    .map(|s| format!("{s} = "))
                    .unwrap_or_default();
                let args = args
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("{assign_to}{name}({args});\n")
            }
            ProgramStatement::VariableAssignment {
                variable_name,
                value,
            } => format!("{variable_name} = {value};\n"),
            ProgramStatement::Wait { duration, targets } => {
                if targets.is_empty() {
                    format!("wait({duration});\n")
                } else {
                    let targets = targets
                        .iter()
                        .map(|t| format!("\"{t}\""))
                        .collect::<Vec<String>>()
                        .join(", ");
                    format!("wait({duration}, {targets});\n")
                }
            }
            ProgramStatement::Save {
                variable_name,
                stream_name,
            } => format!("save({variable_name}, {stream_name});\n"),
            ProgramStatement::For {
                variable_name,
                start,
                stop,
                step,
                body,
            } => {
                let body = indent(&body.generate_program(), "  ");
                let condition = format_condition(variable_name, stop, step);
                format!(
                    "for ({variable_name} = {start}; {condition}; {variable_name} += {step}) {{\n{body}}}\n"
                )
            }
            ProgramStatement::ForEach {
                variable_name,
                values,
                body,
            } => {
                let body = indent(&body.generate_program(), "  ");
                let values = format_values(values);
                format!("for_each ({variable_name} in {values}) {{\n{body}}}\n")
            }
        }
    }
}
