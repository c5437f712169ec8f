// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Configuration for a lifecycle run, resolved once at test setup.

use std::path::{Path, PathBuf};

use crate::options::Options;
use crate::provisioner::{DEFAULT_TERRAFORM_BINARY, TerraformCli};

/// Environment variable holding the marbot endpoint ID.
pub const ENDPOINT_ID_ENV: &str = "MARBOT_ENDPOINT_ID";

/// Environment variable overriding the Terraform binary.
pub const TERRAFORM_BINARY_ENV: &str = "TERRATEST_TERRAFORM_BINARY";

/// Name of the Terraform variable the endpoint ID is passed as.
pub const ENDPOINT_ID_VAR: &str = "endpoint_id";

/// Inputs for one apply/destroy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// The marbot endpoint ID. Empty when not provided.
    pub endpoint_id: String,
    pub terraform_binary: String,
    /// Root of the tree copied into the working copy.
    pub source_root: PathBuf,
    /// Folder, relative to `source_root`, to apply.
    pub module_folder: PathBuf,
}

impl LifecycleConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env(source_root: impl Into<PathBuf>, module_folder: impl Into<PathBuf>) -> Self {
        Self::from_lookup(source_root, module_folder, |name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// A missing endpoint ID is not an error here; Terraform's own variable
    /// validation rejects the empty value at apply time.
    #[must_use]
    pub fn from_lookup<F>(
        source_root: impl Into<PathBuf>,
        module_folder: impl Into<PathBuf>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint_id = lookup(ENDPOINT_ID_ENV).unwrap_or_default();
        if endpoint_id.is_empty() {
            tracing::warn!("{ENDPOINT_ID_ENV} is not set, apply is expected to fail validation");
        }

        let terraform_binary = lookup(TERRAFORM_BINARY_ENV)
            .filter(|binary| !binary.is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_TERRAFORM_BINARY));

        Self {
            endpoint_id,
            terraform_binary,
            source_root: source_root.into(),
            module_folder: module_folder.into(),
        }
    }

    /// Provisioning options for a working copy at `terraform_dir`, with the
    /// endpoint ID set and the default retryable errors installed.
    #[must_use]
    pub fn options(&self, terraform_dir: &Path) -> Options {
        Options::new(terraform_dir)
            .var(ENDPOINT_ID_VAR, self.endpoint_id.clone())
            .with_default_retryable_errors()
    }

    #[must_use]
    pub fn provisioner(&self) -> TerraformCli {
        TerraformCli::new(self.terraform_binary.clone())
    }
}
