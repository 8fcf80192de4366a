// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

/// Shape into which a flat per-repetition stream is reshaped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferShape(Vec<usize>);

impl BufferShape {
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of points in one buffer, 1 when no dimension is configured.
    pub fn buffer_len(&self) -> usize {
        self.0.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for BufferShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims = self
            .0
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if self.0.len() == 1 {
            write!(f, "({dims},)")
        } else {
            write!(f, "({dims})")
        }
    }
}
