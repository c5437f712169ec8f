// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Provisioning options shared by apply and destroy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::error::TerratestError;

/// Retries used by [`Options::with_default_retryable_errors`].
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Pause between retries used by [`Options::with_default_retryable_errors`].
pub const DEFAULT_TIME_BETWEEN_RETRIES: Duration = Duration::from_secs(5);

/// Transient failures that Terraform commonly reports in CI, keyed by the
/// pattern matched against command output.
pub const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    (
        ".*read: connection reset by peer.*",
        "Failed to reach helm charts repository.",
    ),
    (".*transport is closing.*", "Failed to reach Kubernetes API."),
    (
        ".*unable to verify signature.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*unable to verify checksum.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*no provider exists with the given name.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*registry service is unreachable.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*Error installing provider.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*Failed to query available provider packages.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*timeout while waiting for plugin to start.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*timed out waiting for server handshake.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        "could not query provider registry for",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*Provider produced inconsistent result after apply.*",
        "Provider eventual consistency error.",
    ),
];

/// Which failures are retried, how often, and how long to wait in between.
///
/// The empty policy (the default) never retries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Regex pattern to human readable description.
    pub retryable_errors: BTreeMap<String, String>,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Pause before each retry.
    pub time_between_retries: Duration,
}

impl RetryPolicy {
    /// Compiles the patterns, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns [`TerratestError::InvalidRetryPattern`] if a pattern does not parse.
    pub fn compile(&self) -> Result<CompiledRetryPolicy<'_>, TerratestError> {
        let patterns = self
            .retryable_errors
            .iter()
            .map(|(pattern, description)| {
                Regex::new(pattern)
                    .map(|regex| (regex, description.as_str()))
                    .map_err(|source| TerratestError::InvalidRetryPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledRetryPolicy { patterns })
    }
}

/// A [`RetryPolicy`] with its patterns compiled.
#[derive(Debug)]
pub struct CompiledRetryPolicy<'a> {
    patterns: Vec<(Regex, &'a str)>,
}

impl CompiledRetryPolicy<'_> {
    /// Returns the description of the first pattern matching `output`.
    #[must_use]
    pub fn match_retryable(&self, output: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(output))
            .map(|(_, description)| *description)
    }
}

/// Everything needed to run Terraform against one working copy.
///
/// The same value is passed to apply and to destroy so teardown sees exactly
/// the inputs the apply did.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Directory containing the root module.
    pub terraform_dir: PathBuf,
    /// Input variables, passed as `-var` arguments.
    pub vars: BTreeMap<String, serde_json::Value>,
    /// Extra environment for the Terraform process.
    pub env_vars: BTreeMap<String, String>,
    pub retry: RetryPolicy,
    /// Pass `-no-color` to every subcommand.
    pub no_color: bool,
    /// Value of the `-lock` flag for apply and destroy.
    pub lock: bool,
}

impl Options {
    #[must_use]
    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            vars: BTreeMap::new(),
            env_vars: BTreeMap::new(),
            retry: RetryPolicy::default(),
            no_color: true,
            lock: false,
        }
    }

    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    #[must_use]
    pub const fn lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    /// Adds the standard transient Terraform errors to the retry policy and
    /// sets the standard retry count and delay.
    ///
    /// Patterns the caller already registered keep their descriptions.
    #[must_use]
    pub fn with_default_retryable_errors(mut self) -> Self {
        for (pattern, description) in DEFAULT_RETRYABLE_ERRORS {
            self.retry
                .retryable_errors
                .entry((*pattern).to_string())
                .or_insert_with(|| (*description).to_string());
        }
        self.retry.max_retries = DEFAULT_MAX_RETRIES;
        self.retry.time_between_retries = DEFAULT_TIME_BETWEEN_RETRIES;
        self
    }

    #[must_use]
    pub fn terraform_dir(&self) -> &Path {
        &self.terraform_dir
    }
}
