// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Options, Provisioner, TerratestError};

/// A provisioner that records calls instead of running Terraform.
#[derive(Default)]
pub struct FakeProvisioner {
    pub fail_apply: bool,
    pub fail_destroy: bool,
    pub apply_calls: Cell<usize>,
    pub destroy_calls: Cell<usize>,
    pub applied_options: RefCell<Vec<Options>>,
    pub destroyed_options: RefCell<Vec<Options>>,
}

impl FakeProvisioner {
    pub fn failing_apply() -> Self {
        Self {
            fail_apply: true,
            ..Self::default()
        }
    }

    pub fn failing_destroy() -> Self {
        Self {
            fail_destroy: true,
            ..Self::default()
        }
    }

    pub fn failing_both() -> Self {
        Self {
            fail_apply: true,
            fail_destroy: true,
            ..Self::default()
        }
    }
}

fn failure(command: &str) -> TerratestError {
    TerratestError::CommandFailed {
        command: String::from(command),
        status: String::from("exit status: 1"),
        output: format!("Error: {command} failed"),
    }
}

impl Provisioner for FakeProvisioner {
    fn init_and_apply(&self, options: &Options) -> Result<String, TerratestError> {
        self.apply_calls.set(self.apply_calls.get() + 1);
        self.applied_options.borrow_mut().push(options.clone());
        if self.fail_apply {
            return Err(failure("terraform apply"));
        }
        Ok(String::from("Apply complete! Resources: 1 added, 0 changed, 0 destroyed."))
    }

    fn destroy(&self, options: &Options) -> Result<String, TerratestError> {
        self.destroy_calls.set(self.destroy_calls.get() + 1);
        self.destroyed_options.borrow_mut().push(options.clone());
        if self.fail_destroy {
            return Err(failure("terraform destroy"));
        }
        Ok(String::from("Destroy complete! Resources: 1 destroyed."))
    }
}

/// Writes `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A source tree shaped like a module repository with an example folder.
pub fn create_module_tree() -> TempDir {
    let root = TempDir::new().unwrap();
    write_file(root.path(), "main.tf", "variable \"endpoint_id\" {}\n");
    write_file(
        root.path(),
        "examples/default/main.tf",
        "module \"marbot\" {\n  source = \"../../\"\n}\n",
    );
    write_file(root.path(), "examples/default/.terraform.lock.hcl", "# lock\n");
    write_file(root.path(), "examples/default/.terraform-version", "1.9.0\n");
    write_file(root.path(), "examples/default/terraform.tfstate", "{}");
    write_file(root.path(), "examples/default/terraform.tfvars", "endpoint_id = \"x\"\n");
    write_file(root.path(), "examples/default/.terraform/providers/p", "binary");
    write_file(root.path(), ".git/HEAD", "ref: refs/heads/main\n");
    write_file(root.path(), "target/CACHEDIR.TAG", "Signature: 8a477f597d28d172789f06886806bc55\n");
    write_file(root.path(), "target/debug/build", "artifact");
    write_file(root.path(), "lambda/security-hub.js", "exports.handler = async () => {};\n");
    root
}

/// Writes a shell script standing in for the Terraform binary.
///
/// Run it through `sh` with [`script_args`] rather than executing it directly,
/// which avoids `ETXTBSY` when other test threads fork while it is written.
pub fn fake_script(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("fake-terraform.sh");
    fs::write(&path, format!("{script}\n")).unwrap();
    path
}

/// Arguments running `script` through `sh`, followed by `args`.
pub fn script_args(script: &Path, args: &[&str]) -> Vec<String> {
    std::iter::once(script.to_string_lossy().into_owned())
        .chain(args.iter().map(|arg| (*arg).to_string()))
        .collect()
}
