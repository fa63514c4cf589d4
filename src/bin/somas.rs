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

//! The `somas` CLI: reads a tensor list from a CSV file, solves the layout,
//! and writes the result back out.

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use somas_solver::io::{export, ingest};
use somas_solver::{logging, solve_with_threads};

/// This structure uses `clap-derive` annotations and defines the arguments
/// that can be passed on to the executable solver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The absolute path to the input csv file.
    csv_path: String,
    /// The number of worker threads to use for the strategy portfolio.
    #[clap(short, long)]
    threads: Option<usize>,
    /// Disable post-placement verification (always verifying is the
    /// recommended default; this exists to measure the cost of skipping it).
    #[clap(long)]
    no_verify: bool,
}

fn main() -> ExitCode {
    logging::install();
    let args = Args::parse();

    let mut ingested = match ingest(&args.csv_path) {
        Ok(ingested) => ingested,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let threads = args.threads.unwrap_or_else(|| num_cpus::get().max(1));
    let verify = !args.no_verify;

    let result = solve_with_threads(&mut ingested.descriptors, &ingested.conflicts, &[], verify, threads);
    match result {
        Ok((_, report)) => {
            info!(
                "best_index={} best_bytes={} lifelong_bytes={} elapsed_us={}",
                report.best_sol_index,
                report.max_offset,
                report.lifelong_memory,
                report.total_elapsed.as_micros()
            );
            export(&ingested.descriptors, &ingested.lifetimes);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
