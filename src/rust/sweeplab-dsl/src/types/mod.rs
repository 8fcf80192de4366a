// Copyright 2026 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

mod axis_role;
mod buffer_shape;
mod numeric_literal;
mod numeric_type;
mod sweep_descriptor;

pub use axis_role::AxisRole;
pub use buffer_shape::BufferShape;
pub use numeric_literal::NumericLiteral;
pub use numeric_type::NumericType;
pub use sweep_descriptor::{MAX_SWEEP_VALUES, SweepDescriptor, SweepMechanism};
