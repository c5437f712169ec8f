// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Running the Terraform binary with retries on transient failures.

use std::io;
use std::process::Output;
use std::thread::sleep;

use duct::cmd;

use crate::error::TerratestError;
use crate::options::Options;

/// Runs `binary args...` in the options' working directory and returns the
/// combined stdout and stderr.
///
/// A failing run whose output matches a retryable pattern is retried up to
/// `options.retry.max_retries` more times.
///
/// # Errors
///
/// - [`TerratestError::InvalidRetryPattern`] if the retry policy does not compile
/// - [`TerratestError::Spawn`] if the binary cannot be started
/// - [`TerratestError::CommandFailed`] on a non-retryable failure
/// - [`TerratestError::RetriesExhausted`] when a retryable failure persists
pub fn run_terraform_command(
    binary: &str,
    options: &Options,
    args: &[String],
) -> Result<String, TerratestError> {
    let retry = options.retry.compile()?;

    let mut args = args.to_vec();
    if options.no_color {
        args.push(String::from("-no-color"));
    }
    let command = format!("{binary} {}", args.join(" "));

    let mut attempt: u32 = 1;
    loop {
        let output = build_expression(binary, options, &args)
            .run_with_trace()
            .map_err(|source| TerratestError::Spawn {
                command: command.clone(),
                source,
            })?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        if output.status.success() {
            return Ok(text);
        }

        let Some(description) = retry.match_retryable(&text) else {
            return Err(TerratestError::CommandFailed {
                command,
                status: output.status.to_string(),
                output: text,
            });
        };

        if attempt > options.retry.max_retries {
            return Err(TerratestError::RetriesExhausted {
                command,
                description: description.to_string(),
                attempts: attempt,
                output: text,
            });
        }

        tracing::warn!(
            "`{command}` failed with a retryable error ({description}), retry {attempt}/{} in {:?}",
            options.retry.max_retries,
            options.retry.time_between_retries
        );
        sleep(options.retry.time_between_retries);
        attempt += 1;
    }
}

fn build_expression(binary: &str, options: &Options, args: &[String]) -> duct::Expression {
    options.env_vars.iter().fold(
        cmd(binary, args)
            .dir(&options.terraform_dir)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked(),
        |expression, (name, value)| expression.env(name, value),
    )
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
