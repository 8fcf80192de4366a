// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use sweeplab_dsl::types::BufferShape;

use crate::program_generator::ProgramGenerator;
use crate::stream_processing::StreamProcessing;

/// A complete hardware program and the host-side processing of its streams.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    generator: ProgramGenerator,
    stream_processing: StreamProcessing,
    buffer_shape: BufferShape,
}

impl Program {
    pub(crate) fn new(
        generator: ProgramGenerator,
        stream_processing: StreamProcessing,
        buffer_shape: BufferShape,
    ) -> Self {
        Self {
            generator,
            stream_processing,
            buffer_shape,
        }
    }

    pub fn generator(&self) -> &ProgramGenerator {
        &self.generator
    }

    pub fn stream_processing(&self) -> &StreamProcessing {
        &self.stream_processing
    }

    pub fn buffer_shape(&self) -> &BufferShape {
        &self.buffer_shape
    }

    /// Tags of every output the host can fetch, in declaration order.
    pub fn result_tags(&self) -> Vec<&str> {
        self.stream_processing.tags().collect()
    }

    /// Program text with the stream processing block appended.
    pub fn source(&self) -> String {
        format!(
            "{}\n/* stream processing */\n{}",
            self.generator.generate_program(),
            self.stream_processing.render()
        )
    }
}
