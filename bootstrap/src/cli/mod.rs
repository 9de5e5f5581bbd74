// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command-line argument parsing (`parser`) and mode resolution
//! (`validator`), kept as separate modules the way the adaptive pipeline's
//! bootstrap splits secure parsing from the raw clap surface.

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli};
pub use validator::{resolve, Mode, ValidationError};
