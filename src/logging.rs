// Copyright 2026 SOMAS contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Installs an `env_logger` format for the solver's log stream: bare
//! `{level_prefix} {message}` lines, no timestamp or module path, so
//! `log::info!`/`warn!`/`error!` calls from anywhere in the crate produce
//! exactly the `--INFO--`/`--WARNING--`/`--EXCEPTION--` prefixed lines the
//! CLI is expected to emit.

use std::io::Write;

use env_logger::Builder;
use log::Level;

fn prefix(level: Level) -> &'static str {
    match level {
        Level::Error => "--EXCEPTION--",
        Level::Warn => "--WARNING--",
        _ => "--INFO--",
    }
}

/// Installs the crate's log format as the global logger. Safe to call more
/// than once per process (`env_logger` ignores later calls).
pub fn install() {
    let mut builder = Builder::from_default_env();
    builder.format(|buf, record| writeln!(buf, "{} {}", prefix(record.level()), record.args()));
    let _ = builder.try_init();
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
