// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # marbot-terratest
//!
//! Apply/destroy lifecycle testing for Terraform configurations.
//!
//! A run copies a configuration into a temporary directory, applies it with
//! the `terraform` binary, and always destroys it afterward, whether apply
//! fails, succeeds, or a later assertion panics.
//!
//! ```no_run
//! use marbot_terratest::{LifecycleConfig, copy_and_run};
//!
//! let config = LifecycleConfig::from_env("..", "demos/default");
//! copy_and_run(&config, &config.provisioner(), |_output| ()).unwrap();
//! ```

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod command;
mod config;
mod error;
mod lifecycle;
mod options;
mod provisioner;
mod vars;
mod workspace;

#[cfg(test)]
mod tests;

pub use command::run_terraform_command;
pub use config::{ENDPOINT_ID_ENV, ENDPOINT_ID_VAR, LifecycleConfig, TERRAFORM_BINARY_ENV};
pub use error::{LifecycleError, TerratestError};
pub use lifecycle::{DestroyGuard, copy_and_run, run_lifecycle};
pub use options::{
    CompiledRetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRYABLE_ERRORS,
    DEFAULT_TIME_BETWEEN_RETRIES, Options, RetryPolicy,
};
pub use provisioner::{DEFAULT_TERRAFORM_BINARY, Provisioner, TerraformCli};
pub use vars::format_var_args;
pub use workspace::{
    WorkingCopy, copy_terraform_folder_to_temp, is_cargo_target_dir, should_copy,
};
