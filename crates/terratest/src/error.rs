// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for driving Terraform.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or running a Terraform command.
#[derive(Debug, Error)]
pub enum TerratestError {
    /// The configuration could not be read or the working copy could not be written.
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration path is missing or is not a directory.
    #[error("Terraform folder {} does not exist or is not a directory", .path.display())]
    MissingFolder { path: PathBuf },

    /// The module folder is not a path inside the configuration root.
    #[error(
        "Module folder {} is not inside {}",
        .module_folder.display(),
        .root.display()
    )]
    ModuleFolderOutsideRoot {
        root: PathBuf,
        module_folder: PathBuf,
    },

    /// The Terraform binary could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a failure that is not retryable.
    #[error("`{command}` exited with {status}:\n{output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// A retryable failure persisted after every allowed attempt.
    #[error("`{command}` failed after {attempts} attempts ({description}):\n{output}")]
    RetriesExhausted {
        command: String,
        description: String,
        attempts: u32,
        output: String,
    },

    /// A retryable error pattern is not a valid regular expression.
    #[error("Invalid retryable error pattern '{pattern}': {source}")]
    InvalidRetryPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `terraform output -json` returned something other than JSON.
    #[error("Failed to parse Terraform output: {source}")]
    OutputParse {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a full apply/destroy lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Copying the configuration failed before anything was applied.
    #[error("Failed to prepare working copy: {0}")]
    Prepare(#[source] TerratestError),

    /// Apply failed; destroy ran and succeeded.
    #[error("Apply failed: {0}")]
    Apply(#[source] TerratestError),

    /// Apply succeeded but destroy failed. Resources may have leaked.
    #[error("Destroy failed, resources may have leaked: {0}")]
    Destroy(#[source] TerratestError),

    /// Both apply and destroy failed.
    #[error("Apply failed: {apply}\nDestroy also failed, resources may have leaked: {destroy}")]
    ApplyAndDestroy {
        apply: TerratestError,
        destroy: TerratestError,
    },
}

impl LifecycleError {
    /// Combines the outcomes of apply and destroy, keeping the apply value.
    pub(crate) fn from_outcomes<T, D>(
        apply: Result<T, TerratestError>,
        destroy: Result<D, TerratestError>,
    ) -> Result<T, Self> {
        match (apply, destroy) {
            (Ok(value), Ok(_)) => Ok(value),
            (Err(apply), Ok(_)) => Err(Self::Apply(apply)),
            (Ok(_), Err(destroy)) => Err(Self::Destroy(destroy)),
            (Err(apply), Err(destroy)) => Err(Self::ApplyAndDestroy { apply, destroy }),
        }
    }

    /// Returns true if teardown failed and resources may still exist.
    #[must_use]
    pub const fn destroy_failed(&self) -> bool {
        matches!(self, Self::Destroy(_) | Self::ApplyAndDestroy { .. })
    }
}
