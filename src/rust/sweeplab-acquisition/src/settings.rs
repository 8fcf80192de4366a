// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Settings of the acquisition loop.
use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizationChange {
    pub field: &'static str,
    pub original: String,
    pub sanitized: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AcquisitionSettings {
    /// Seconds to wait after a processed batch before polling again.
    pub fetch_period: f64,
    /// Seconds to wait after a poll without new results.
    pub idle_poll_delay: f64,
    /// Tags of the raw streams saved on every batch.
    pub live_save_tags: Vec<String>,
    pub results_group: String,
    /// Seconds without new results after which the run is aborted. The loop
    /// waits indefinitely when unset.
    pub idle_timeout: Option<f64>,
}

const DEFAULT_RESULTS_GROUP: &str = "data";

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            fetch_period: 1.0,
            idle_poll_delay: 0.1,
            live_save_tags: vec!["I".to_string(), "Q".to_string()],
            results_group: DEFAULT_RESULTS_GROUP.to_string(),
            idle_timeout: None,
        }
    }
}

impl AcquisitionSettings {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::Settings(err.to_string()))
    }

    pub fn fetch_period(&self) -> Duration {
        seconds(self.fetch_period)
    }

    pub fn idle_poll_delay(&self) -> Duration {
        seconds(self.idle_poll_delay)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout.map(seconds)
    }

    pub fn sanitize(&mut self) -> Vec<SanitizationChange> {
        let mut changes = vec![];
        let periods = [
            ("fetch_period", &mut self.fetch_period),
            ("idle_poll_delay", &mut self.idle_poll_delay),
        ];
        for (field, value) in periods {
            if !is_valid_period(*value) {
                changes.push(SanitizationChange {
                    field,
                    original: value.to_string(),
                    sanitized: 0.0.to_string(),
                    reason: "Not a non-negative, finite number of seconds.".to_string(),
                });
                *value = 0.0;
            }
        }
        if let Some(timeout) = self.idle_timeout.filter(|t| !is_valid_period(*t)) {
            changes.push(SanitizationChange {
                field: "idle_timeout",
                original: timeout.to_string(),
                sanitized: "none".to_string(),
                reason: "Not a non-negative, finite number of seconds.".to_string(),
            });
            self.idle_timeout = None;
        }
        if self.results_group.is_empty() {
            changes.push(SanitizationChange {
                field: "results_group",
                original: String::new(),
                sanitized: DEFAULT_RESULTS_GROUP.to_string(),
                reason: "Empty group name.".to_string(),
            });
            self.results_group = DEFAULT_RESULTS_GROUP.to_string();
        }
        changes
    }
}

fn is_valid_period(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
