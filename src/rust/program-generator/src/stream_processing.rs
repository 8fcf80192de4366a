// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Host-side processing of the result streams.
//!
//! Every tagged variable gets one output. The in-phase and quadrature
//! streams additionally feed the derived signal outputs used by the
//! statistics and plotting stages.

use std::fmt;

/// Tags of the derived signal outputs.
pub mod tags {
    /// Per-shot squared magnitude, buffered, all shots retained.
    pub const Z_SQ_RAW: &str = "Z_SQ_RAW";
    /// Running average of the squared magnitude, all snapshots retained.
    pub const Z_SQ_RAW_AVG: &str = "Z_SQ_RAW_AVG";
    /// Squared magnitude of the averaged signal, latest value only.
    pub const Z_AVG: &str = "Z_AVG";
    pub const I_AVG: &str = "I_AVG";
    pub const Q_AVG: &str = "Q_AVG";

    pub const DERIVED: [&str; 5] = [Z_SQ_RAW, Z_SQ_RAW_AVG, Z_AVG, I_AVG, Q_AVG];
}

/// Name of the hardware stream that carries the values of `tag`.
pub fn stream_name(tag: &str) -> String {
    format!("{tag}_stream")
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamExpr {
    Raw(String),
    Buffer(Box<StreamExpr>, usize),
    Average(Box<StreamExpr>),
    Mul(Box<StreamExpr>, Box<StreamExpr>),
    Add(Box<StreamExpr>, Box<StreamExpr>),
}

impl StreamExpr {
    pub fn raw<S: Into<String>>(stream_name: S) -> Self {
        StreamExpr::Raw(stream_name.into())
    }

    pub fn buffer(self, len: usize) -> Self {
        StreamExpr::Buffer(Box::new(self), len)
    }

    pub fn average(self) -> Self {
        StreamExpr::Average(Box::new(self))
    }

    pub fn mul(self, other: StreamExpr) -> Self {
        StreamExpr::Mul(Box::new(self), Box::new(other))
    }

    pub fn add(self, other: StreamExpr) -> Self {
        StreamExpr::Add(Box::new(self), Box::new(other))
    }

    /// `a * a + b * b`
    pub fn squared_magnitude(a: &StreamExpr, b: &StreamExpr) -> Self {
        a.clone().mul(a.clone()).add(b.clone().mul(b.clone()))
    }
}

impl fmt::Display for StreamExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamExpr::Raw(name) => write!(f, "{name}"),
            StreamExpr::Buffer(inner, len) => write!(f, "{inner}.buffer({len})"),
            StreamExpr::Average(inner) => write!(f, "{inner}.average()"),
            StreamExpr::Mul(a, b) => write!(f, "{a} * {b}"),
            StreamExpr::Add(a, b) => write!(f, "({a} + {b})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Keep every value pushed to the output.
    All,
    /// Keep only the most recent value.
    Latest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamOutput {
    pub tag: String,
    pub expr: StreamExpr,
    pub mode: SaveMode,
}

impl fmt::Display for StreamOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let save = match self.mode {
            SaveMode::All => "save_all",
            SaveMode::Latest => "save",
        };
        write!(f, "{}.{save}(\"{}\")", self.expr, self.tag)
    }
}

/// Options of one tagged variable that affect its stream output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub is_buffered: bool,
    pub is_averaged: bool,
    pub retains_all_shots: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamProcessing {
    outputs: Vec<StreamOutput>,
}

impl StreamProcessing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &[StreamOutput] {
        &self.outputs
    }

    pub fn output(&self, tag: &str) -> Option<&StreamOutput> {
        self.outputs.iter().find(|output| output.tag == tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|output| output.tag.as_str())
    }

    /// Output of a tagged variable: optionally buffered to `buffer_len`,
    /// optionally averaged, then saved.
    pub fn add_variable_stream(&mut self, tag: &str, options: StreamOptions, buffer_len: usize) {
        let mut expr = StreamExpr::raw(stream_name(tag));
        if options.is_buffered {
            expr = expr.buffer(buffer_len);
        }
        if options.is_averaged {
            expr = expr.average();
        }
        let mode = if options.retains_all_shots {
            SaveMode::All
        } else {
            SaveMode::Latest
        };
        self.outputs.push(StreamOutput {
            tag: tag.to_string(),
            expr,
            mode,
        });
    }

    /// Derived outputs of the in-phase and quadrature streams.
    pub fn add_signal_streams(&mut self, i_tag: &str, q_tag: &str, buffer_len: usize) {
        let i_raw = StreamExpr::raw(stream_name(i_tag)).buffer(buffer_len);
        let q_raw = StreamExpr::raw(stream_name(q_tag)).buffer(buffer_len);
        let i_avg = i_raw.clone().average();
        let q_avg = q_raw.clone().average();
        let raw_sq = StreamExpr::squared_magnitude(&i_raw, &q_raw);
        let mut push = |tag: &str, expr: StreamExpr, mode: SaveMode| {
            self.outputs.push(StreamOutput {
                tag: tag.to_string(),
                expr,
                mode,
            });
        };
        push(tags::Z_SQ_RAW, raw_sq.clone(), SaveMode::All);
        push(tags::Z_SQ_RAW_AVG, raw_sq.average(), SaveMode::All);
        push(
            tags::Z_AVG,
            StreamExpr::squared_magnitude(&i_avg, &q_avg),
            SaveMode::Latest,
        );
        push(tags::I_AVG, i_avg, SaveMode::Latest);
        push(tags::Q_AVG, q_avg, SaveMode::Latest);
    }

    pub fn render(&self) -> String {
        self.outputs
            .iter()
            .map(|output| format!("{output};\n"))
            .collect()
    }
}
