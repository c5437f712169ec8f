// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::path::PathBuf;

use crate::{LifecycleError, TerratestError};

fn command_failed(command: &str) -> TerratestError {
    TerratestError::CommandFailed {
        command: String::from(command),
        status: String::from("exit status: 1"),
        output: String::from("Error: boom"),
    }
}

#[test]
fn test_terratest_error_display() {
    let err = TerratestError::Filesystem {
        path: PathBuf::from("/src/main.tf"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    };
    assert_eq!(format!("{err}"), "Filesystem error at /src/main.tf: denied");

    let err = TerratestError::MissingFolder {
        path: PathBuf::from("/src/examples/default"),
    };
    assert_eq!(
        format!("{err}"),
        "Terraform folder /src/examples/default does not exist or is not a directory"
    );

    let err = TerratestError::ModuleFolderOutsideRoot {
        root: PathBuf::from("/src"),
        module_folder: PathBuf::from("../other"),
    };
    assert_eq!(format!("{err}"), "Module folder ../other is not inside /src");

    let err = command_failed("terraform apply");
    assert_eq!(
        format!("{err}"),
        "`terraform apply` exited with exit status: 1:\nError: boom"
    );

    let err = TerratestError::RetriesExhausted {
        command: String::from("terraform init"),
        description: String::from("Failed to reach Kubernetes API."),
        attempts: 4,
        output: String::from("transport is closing"),
    };
    assert_eq!(
        format!("{err}"),
        "`terraform init` failed after 4 attempts (Failed to reach Kubernetes API.):\ntransport is closing"
    );
}

#[test]
fn test_lifecycle_error_display() {
    let err = LifecycleError::Apply(command_failed("terraform apply"));
    assert!(format!("{err}").starts_with("Apply failed: `terraform apply`"));
    assert!(!err.destroy_failed());

    let err = LifecycleError::Destroy(command_failed("terraform destroy"));
    assert!(format!("{err}").starts_with("Destroy failed, resources may have leaked"));
    assert!(err.destroy_failed());

    let err = LifecycleError::ApplyAndDestroy {
        apply: command_failed("terraform apply"),
        destroy: command_failed("terraform destroy"),
    };
    assert!(err.destroy_failed());
}

#[test]
fn test_from_outcomes() {
    let ok: Result<u8, TerratestError> = Ok(7);
    assert_eq!(LifecycleError::from_outcomes(ok, Ok::<(), _>(())).unwrap(), 7);

    let err = LifecycleError::from_outcomes(
        Err::<(), _>(command_failed("apply")),
        Ok::<(), _>(()),
    )
    .unwrap_err();
    assert!(matches!(err, LifecycleError::Apply(_)));

    let err = LifecycleError::from_outcomes(Ok(()), Err::<(), _>(command_failed("destroy")))
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Destroy(_)));
}
