// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Isolated working copies of a Terraform configuration.
//!
//! Every test run applies from its own temporary copy so local state, the
//! `.terraform` plugin directory, and lock files never leak between runs or
//! back into the source tree.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::TerratestError;

/// Hidden files that are part of the configuration and are always copied.
const KEPT_HIDDEN_FILES: &[&str] = &[".terraform-version", ".terraform.lock.hcl"];

/// Local state and variable files that must not be copied.
const STATE_AND_VARS_FILES: &[&str] = &[
    "terraform.tfstate",
    "terraform.tfstate.backup",
    "terraform.tfvars",
    "terraform.tfvars.json",
];

/// A temporary copy of a configuration tree, removed on drop.
#[derive(Debug)]
pub struct WorkingCopy {
    dir: TempDir,
    module_dir: PathBuf,
}

impl WorkingCopy {
    /// The module folder inside the copy. Run Terraform here.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.module_dir
    }

    /// The root of the copied tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Copies `root` into a fresh temporary directory and returns the location
/// of `module_folder` within it.
///
/// The whole root is copied so relative module sources such as `../../`
/// still resolve from the module folder.
///
/// # Errors
///
/// - [`TerratestError::ModuleFolderOutsideRoot`] if `module_folder` does not name a folder
///   under `root`
/// - [`TerratestError::MissingFolder`] if `root` or `root/module_folder` is not a directory
/// - [`TerratestError::Filesystem`] if reading the source or writing the copy fails
pub fn copy_terraform_folder_to_temp(
    root: &Path,
    module_folder: impl AsRef<Path>,
) -> Result<WorkingCopy, TerratestError> {
    let module_folder = relative_module_folder(root, module_folder.as_ref())?;
    let module_folder = module_folder.as_path();
    for path in [root.to_path_buf(), root.join(module_folder)] {
        if !path.is_dir() {
            return Err(TerratestError::MissingFolder { path });
        }
    }

    let prefix = module_folder
        .file_name()
        .map_or_else(|| String::from("terratest"), |name| name.to_string_lossy().into_owned());
    let dir = tempfile::Builder::new()
        .prefix(&format!("{prefix}-"))
        .tempdir()
        .map_err(|source| TerratestError::Filesystem {
            path: std::env::temp_dir(),
            source,
        })?;

    copy_tree(root, dir.path())?;

    let module_dir = dir.path().join(module_folder);
    tracing::debug!(
        "copied {} to {}",
        root.join(module_folder).display(),
        module_dir.display()
    );

    Ok(WorkingCopy { dir, module_dir })
}

/// Normalizes `module_folder` to a path relative to `root` that cannot leave
/// the working copy once joined to it.
///
/// An absolute folder is accepted only when it lies under `root`.
fn relative_module_folder(root: &Path, module_folder: &Path) -> Result<PathBuf, TerratestError> {
    let outside = || TerratestError::ModuleFolderOutsideRoot {
        root: root.to_path_buf(),
        module_folder: module_folder.to_path_buf(),
    };

    let relative = if module_folder.is_absolute() {
        module_folder.strip_prefix(root).map_err(|_| outside())?
    } else {
        module_folder
    };

    relative
        .components()
        .filter(|component| *component != Component::CurDir)
        .map(|component| match component {
            Component::Normal(name) => Ok(name),
            _ => Err(outside()),
        })
        .collect()
}

/// Whether a path, relative to the copied root, belongs in a working copy.
///
/// Cargo build output is excluded separately, see [`is_cargo_target_dir`].
#[must_use]
pub fn should_copy(relative: &Path) -> bool {
    let components: Vec<&str> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    let Some((file_name, parents)) = components.split_last() else {
        return true;
    };

    if parents.iter().any(|name| name.starts_with('.')) {
        return false;
    }
    if file_name.starts_with('.') {
        return KEPT_HIDDEN_FILES.contains(file_name);
    }
    !STATE_AND_VARS_FILES.contains(file_name)
}

/// Whether `relative` is a Cargo `target/` directory at the root of the tree.
///
/// Only directories carrying Cargo's `CACHEDIR.TAG` are skipped, so a module
/// folder that happens to be called `target` is still copied.
#[must_use]
pub fn is_cargo_target_dir(root: &Path, relative: &Path) -> bool {
    relative == Path::new("target") && root.join("target").join("CACHEDIR.TAG").is_file()
}

fn copy_tree(source: &Path, destination: &Path) -> Result<(), TerratestError> {
    let entries = WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry
                .path()
                .strip_prefix(source)
                .is_ok_and(|relative| should_copy(relative) && !is_cargo_target_dir(source, relative))
        });

    for entry in entries {
        let entry = entry.map_err(|err| TerratestError::Filesystem {
            path: err.path().unwrap_or(source).to_path_buf(),
            source: err.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| entry.path());
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|source| TerratestError::Filesystem {
                path: target.clone(),
                source,
            })?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| TerratestError::Filesystem {
                path: entry.path().to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), TerratestError> {
    let points_to = fs::read_link(link).map_err(|source| TerratestError::Filesystem {
        path: link.to_path_buf(),
        source,
    })?;
    std::os::unix::fs::symlink(points_to, target).map_err(|source| TerratestError::Filesystem {
        path: target.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), TerratestError> {
    fs::copy(link, target)
        .map(|_| ())
        .map_err(|source| TerratestError::Filesystem {
            path: link.to_path_buf(),
            source,
        })
}
