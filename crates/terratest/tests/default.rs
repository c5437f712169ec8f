// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! End-to-end apply/destroy of `demos/default`.
//!
//! These tests run the real `terraform` binary against real infrastructure,
//! so they are `#[ignore]`d and run only via `cargo xtask test-terraform`,
//! which checks the binary is available and that `MARBOT_ENDPOINT_ID` is set.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use marbot_terratest::{LifecycleConfig, LifecycleError, copy_and_run};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

fn demos_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

#[test]
#[ignore = "provisions real infrastructure; run with `cargo xtask test-terraform`"]
fn test_default() {
    init_tracing();
    let config = LifecycleConfig::from_env(demos_root(), "default");

    copy_and_run(&config, &config.provisioner(), |output| {
        assert!(output.contains("Apply complete!"), "unexpected apply output:\n{output}");
    })
    .unwrap();
}

#[test]
#[ignore = "needs the terraform binary; run with `cargo xtask test-terraform`"]
fn test_default_without_endpoint_id_fails_validation() {
    init_tracing();
    let config = LifecycleConfig::from_lookup(demos_root(), "default", |name| {
        (name != marbot_terratest::ENDPOINT_ID_ENV)
            .then(|| std::env::var(name).ok())
            .flatten()
    });

    let err = copy_and_run(&config, &config.provisioner(), |_| ()).unwrap_err();

    // Destroy sees the same empty variable, so it may fail validation too.
    let apply = match err {
        LifecycleError::Apply(apply) | LifecycleError::ApplyAndDestroy { apply, .. } => apply,
        other => panic!("expected apply to fail validation, got: {other}"),
    };
    assert!(
        apply.to_string().contains("Invalid value for variable"),
        "{apply}"
    );
}
