// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation
//!
//! Lint, build, and test commands for the workspace, plus the opt-in
//! end-to-end Terraform lifecycle test.
//!
//! ### Terraform Commands
//!
//! - `cargo test` — Runs the hermetic tests (no Terraform, no cloud access)
//! - `cargo xtask test-terraform` — Applies and destroys `demos/default`
//!   with the real `terraform` binary
//!
//! ### Design Principles
//!
//! - No tests silently skip due to a missing binary or endpoint ID
//! - Real infrastructure is opt-in only, never automatic
//! - Standard `cargo test` remains fast and infrastructure-free
//! - Teardown is owned by the test itself, so it runs even when apply fails

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{io, process::Output};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{eyre::Context, Result};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, hermetic tests)
    CI,

    /// Build every target
    #[command(visible_alias = "b")]
    Build,

    /// Type check every target
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting and clippy
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy with warnings denied
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check formatting
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Apply rustfmt
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run the hermetic tests
    #[command(visible_alias = "t")]
    Test,

    /// Apply and destroy `demos/default` with the real Terraform binary
    #[command(visible_alias = "tt")]
    TestTerraform {
        /// Terraform compatible binary to run
        #[arg(long, env = TERRAFORM_BINARY_ENV, default_value = "terraform")]
        binary: String,
    },
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintFormatting => lint_format(),
            Self::FixFormatting => fix_format(),
            Self::Test => test(),
            Self::TestTerraform { binary } => test_terraform(&binary),
        }
    }
}

/// Run CI checks. The Terraform test stays out of CI because it needs
/// credentials and creates real resources.
fn ci() -> Result<()> {
    lint()?;
    build()?;
    test()?;
    Ok(())
}

fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

fn lint() -> Result<()> {
    lint_clippy()?;
    lint_format()?;
    Ok(())
}

fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

fn lint_format() -> Result<()> {
    run_cargo(vec!["fmt", "--all", "--check"])
}

fn fix_format() -> Result<()> {
    run_cargo(vec!["fmt", "--all"])
}

/// Run unit, integration, and doc tests. Ignored tests stay ignored.
fn test() -> Result<()> {
    run_cargo(vec!["test", "--workspace", "--all-features"])
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Environment variable the end-to-end test reads the endpoint ID from.
const ENDPOINT_ID_ENV: &str = "MARBOT_ENDPOINT_ID";

/// Environment variable the end-to-end test reads the binary from.
const TERRAFORM_BINARY_ENV: &str = "TERRATEST_TERRAFORM_BINARY";

/// Run the end-to-end Terraform lifecycle test
///
/// This command provides explicit, opt-in validation of the apply/destroy
/// lifecycle against real infrastructure.
///
/// ## What This Command Does
///
/// 1. Validates the Terraform binary is available
/// 2. Validates `MARBOT_ENDPOINT_ID` is set and non-empty
/// 3. Runs the ignored tests in `marbot-terratest`'s `default` test target,
///    which copy `demos/default` to a temp dir, apply it, and destroy it
///
/// ## Requirements
///
/// - `terraform` (or `--binary` / `TERRATEST_TERRAFORM_BINARY`) on `PATH`
/// - `MARBOT_ENDPOINT_ID` exported in the environment
/// - Credentials for whatever the configuration provisions
///
/// ## Usage
///
/// ```bash
/// MARBOT_ENDPOINT_ID=... cargo xtask test-terraform
/// ```
///
/// ## Failures
///
/// The command fails if:
/// - The binary is not available
/// - `MARBOT_ENDPOINT_ID` is missing
/// - Apply or destroy fails
///
/// Destroy happens regardless of apply outcome; a destroy failure is reported
/// and fails the run, since it means resources may have leaked.
fn test_terraform(binary: &str) -> Result<()> {
    tracing::info!("Starting Terraform lifecycle test");

    tracing::info!("Checking {binary} availability");
    cmd!(binary, "version")
        .run_with_trace()
        .wrap_err(format!("{binary} is not available. Please install it."))?;

    match std::env::var(ENDPOINT_ID_ENV) {
        Ok(endpoint_id) if !endpoint_id.is_empty() => {}
        _ => {
            return Err(color_eyre::eyre::eyre!(
                "{ENDPOINT_ID_ENV} must be set to a marbot endpoint ID"
            ));
        }
    }

    tracing::info!("Running Terraform lifecycle tests");
    cmd!(
        "cargo",
        "test",
        "--package",
        "marbot-terratest",
        "--test",
        "default",
        "--",
        "--ignored"
    )
    .env(TERRAFORM_BINARY_ENV, binary)
    .run_with_trace()
    .wrap_err("Terraform lifecycle tests failed")?;

    tracing::info!("Terraform lifecycle test completed successfully");
    Ok(())
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
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
