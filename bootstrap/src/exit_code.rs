// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code
//!
//! The process only ever reports two outcomes: it ran to completion, or
//! setup/execution failed. Unlike the adaptive pipeline's full BSD
//! `sysexits.h` table, the variability CLI's contract names exactly these
//! two values, so that is all this enum carries.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use variability_bootstrap::exit_code::ExitCode;
//!
//! fn run() -> Result<(), String> {
//!     Ok(())
//! }
//!
//! fn main() {
//!     let code = match run() {
//!         Ok(()) => ExitCode::Success,
//!         Err(_) => ExitCode::Error,
//!     };
//!     std::process::exit(code.as_i32());
//! }
//! ```

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0).
    #[default]
    Success = 0,
    /// Setup or execution failure (1).
    Error = 1,
}

impl ExitCode {
    /// The raw status value to pass to `std::process::exit`.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl<E> From<Result<(), E>> for ExitCode {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => ExitCode::Success,
            Err(_) => ExitCode::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_zero() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
    }

    #[test]
    fn error_is_one() {
        assert_eq!(ExitCode::Error.as_i32(), 1);
    }

    #[test]
    fn default_is_success() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }

    #[test]
    fn converts_from_result() {
        let ok: Result<(), String> = Ok(());
        let err: Result<(), String> = Err("boom".to_string());
        assert_eq!(ExitCode::from(ok), ExitCode::Success);
        assert_eq!(ExitCode::from(err), ExitCode::Error);
    }
}
