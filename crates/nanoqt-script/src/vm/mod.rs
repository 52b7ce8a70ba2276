// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Execution of parsed programs.

mod interpreter;

pub use interpreter::{get_member, set_member, Interpreter, MAX_CALL_DEPTH};
