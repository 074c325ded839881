//! DSC resource providers for TSToy settings and Linux user accounts
//!
//! Both binaries share one pipeline: resolve input, validate it against a
//! fixed schema, probe the resource, then report (`get`) or converge (`set`).

pub mod cli;
pub mod commands;
pub mod input;
pub mod logging;
pub mod output;
pub mod paths;
pub mod privilege;
pub mod resource;
pub mod schema;

use clap::Parser;
use std::process::ExitCode;

/// Parse the command line; usage errors exit with 1, help and version with 0
pub fn parse_args<P: Parser>() -> Result<P, ExitCode> {
    P::try_parse().map_err(|e| {
        let _ = e.print();
        if e.use_stderr() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    })
}

/// Map a command result to the process exit code, logging the error chain
pub fn finish(target: &str, result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(target: target, "{e:#}");
            ExitCode::FAILURE
        }
    }
}
