// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Logging for the sweep and acquisition crates.
//!
//! Every record goes through `log` with the target
//! `sweeplab.rust::<module path>`, so an application can filter the sweep
//! configuration, program building and acquisition messages by prefix.
//! Poll-level acquisition messages use [`diagnostic!`], which stays silent
//! unless diagnostics were switched on with [`init_logging`].

use std::sync::{atomic::AtomicBool, atomic::Ordering};

#[doc(hidden)]
pub use log as _log;

#[doc(hidden)]
#[macro_export]
macro_rules! __sweeplab_log {
    ($level:ident, $($arg:tt)+) => {
        $crate::_log::$level!(target: concat!("sweeplab.rust::", module_path!()), $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($msg:literal $(, $($arg:tt)+)?) => {
        $crate::__sweeplab_log!(info, $msg $(, $($arg)+)?);
    };
}

#[macro_export]
macro_rules! warn {
    ($msg:literal $(, $($arg:tt)+)?) => {
        $crate::__sweeplab_log!(warn, $msg $(, $($arg)+)?);
    };
}

#[macro_export]
macro_rules! debug {
    ($msg:literal $(, $($arg:tt)+)?) => {
        $crate::__sweeplab_log!(debug, $msg $(, $($arg)+)?);
    };
}

/// Info-level message emitted only while diagnostics are enabled.
#[macro_export]
macro_rules! diagnostic {
    ($msg:literal $(, $($arg:tt)+)?) => {
        if $crate::is_diagnostics_enabled() {
            $crate::__sweeplab_log!(info, $msg $(, $($arg)+)?);
        }
    };
}

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::Acquire)
}

/// Switch the per-poll acquisition diagnostics on or off.
///
/// Diagnostics cover state transitions of the acquisition loop, skipped
/// polls and the comparison of the running mean with the hardware average.
/// Records still need a `log` backend installed by the application to be
/// printed anywhere.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS_ENABLED.store(with_diagnostics, Ordering::Release);
}
