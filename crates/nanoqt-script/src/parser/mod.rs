// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Parser: token stream to [`Program`](crate::ast::Program).
//!
//! - `parser.rs` - `Parser` infrastructure and statements
//! - `expressions.rs` - expression precedence climbing

mod expressions;
#[allow(clippy::module_inception)]
mod parser;

pub use parser::Parser;

use crate::ast::Program;
use crate::error::Result;

/// Parses a complete program.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source).parse_program()
}
