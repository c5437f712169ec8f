// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The provisioning engine seen by the lifecycle runner.

use crate::command::run_terraform_command;
use crate::error::TerratestError;
use crate::options::Options;
use crate::vars::format_var_args;

/// Binary used when no override is configured.
pub const DEFAULT_TERRAFORM_BINARY: &str = "terraform";

/// Converges and tears down the infrastructure described by [`Options`].
///
/// Both operations block until the engine finishes and return its output.
pub trait Provisioner {
    /// Initializes the working directory and applies the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if init or apply fails after retries.
    fn init_and_apply(&self, options: &Options) -> Result<String, TerratestError>;

    /// Destroys everything the configuration created.
    ///
    /// # Errors
    ///
    /// Returns an error if destroy fails after retries.
    fn destroy(&self, options: &Options) -> Result<String, TerratestError>;
}

/// [`Provisioner`] backed by the `terraform` (or compatible) command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformCli {
    binary: String,
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new(DEFAULT_TERRAFORM_BINARY)
    }
}

impl TerraformCli {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Runs `terraform init`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails after retries.
    pub fn init(&self, options: &Options) -> Result<String, TerratestError> {
        run_terraform_command(&self.binary, options, &init_args())
    }

    /// Runs `terraform apply` without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails after retries.
    pub fn apply(&self, options: &Options) -> Result<String, TerratestError> {
        run_terraform_command(&self.binary, options, &apply_args(options))
    }

    /// Reads every root module output as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or its output is not JSON.
    pub fn output_json(&self, options: &Options) -> Result<serde_json::Value, TerratestError> {
        // Color codes would corrupt the JSON, so force them off.
        let options = options.clone().no_color(true);
        let raw = run_terraform_command(
            &self.binary,
            &options,
            &[String::from("output"), String::from("-json")],
        )?;
        serde_json::from_str(&raw).map_err(|source| TerratestError::OutputParse { source })
    }
}

impl Provisioner for TerraformCli {
    fn init_and_apply(&self, options: &Options) -> Result<String, TerratestError> {
        let mut output = self.init(options)?;
        output.push_str(&self.apply(options)?);
        Ok(output)
    }

    fn destroy(&self, options: &Options) -> Result<String, TerratestError> {
        run_terraform_command(&self.binary, options, &destroy_args(options))
    }
}

pub(crate) fn init_args() -> Vec<String> {
    vec![
        String::from("init"),
        String::from("-upgrade=false"),
        String::from("-input=false"),
    ]
}

pub(crate) fn apply_args(options: &Options) -> Vec<String> {
    let mut args = vec![
        String::from("apply"),
        String::from("-input=false"),
        String::from("-auto-approve"),
        format!("-lock={}", options.lock),
    ];
    args.extend(format_var_args(&options.vars));
    args
}

pub(crate) fn destroy_args(options: &Options) -> Vec<String> {
    let mut args = vec![
        String::from("destroy"),
        String::from("-auto-approve"),
        String::from("-input=false"),
        format!("-lock={}", options.lock),
    ];
    args.extend(format_var_args(&options.vars));
    args
}
