// Copyright (C) 2026 marbot contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The apply/destroy lifecycle.
//!
//! ## Ordering
//!
//! 1. Copy the configuration into an isolated working copy
//! 2. Build the provisioning options for that copy
//! 3. Arm a [`DestroyGuard`]
//! 4. Init and apply, then run the caller's check on the apply output
//! 5. Destroy, exactly once, whatever happened in step 4
//!
//! If the check panics, the guard destroys during unwinding and logs any
//! teardown failure, since it can no longer be returned.

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, TerratestError};
use crate::options::Options;
use crate::provisioner::Provisioner;
use crate::workspace::copy_terraform_folder_to_temp;

/// Destroys the configuration when consumed or dropped, whichever comes first.
#[must_use = "dropping the guard immediately destroys the configuration"]
pub struct DestroyGuard<'a, P: Provisioner + ?Sized> {
    provisioner: &'a P,
    options: &'a Options,
    armed: bool,
}

impl<'a, P: Provisioner + ?Sized> DestroyGuard<'a, P> {
    pub const fn new(provisioner: &'a P, options: &'a Options) -> Self {
        Self {
            provisioner,
            options,
            armed: true,
        }
    }

    /// Destroys now and returns the result.
    ///
    /// # Errors
    ///
    /// Returns the provisioner's destroy error.
    pub fn destroy(mut self) -> Result<String, TerratestError> {
        self.armed = false;
        run_destroy(self.provisioner, self.options)
    }
}

impl<P: Provisioner + ?Sized> Drop for DestroyGuard<'_, P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;

        if std::thread::panicking() {
            tracing::warn!("test panicked, destroying before unwinding further");
        }
        if let Err(err) = run_destroy(self.provisioner, self.options) {
            tracing::error!(
                "destroy of {} failed, resources may have leaked: {err}",
                self.options.terraform_dir.display()
            );
        }
    }
}

fn run_destroy<P: Provisioner + ?Sized>(
    provisioner: &P,
    options: &Options,
) -> Result<String, TerratestError> {
    tracing::info!("destroying {}", options.terraform_dir.display());
    provisioner.destroy(options).inspect_err(|err| {
        tracing::error!("destroy failed: {err}");
    })
}

/// Applies `options`, runs `check` on the apply output, and destroys.
///
/// `check` only runs when apply succeeded. Destroy runs exactly once in
/// every case, including when `check` panics.
///
/// # Errors
///
/// - [`LifecycleError::Apply`] if apply failed and destroy succeeded
/// - [`LifecycleError::Destroy`] if apply succeeded and destroy failed
/// - [`LifecycleError::ApplyAndDestroy`] if both failed
pub fn run_lifecycle<P, T, F>(
    provisioner: &P,
    options: &Options,
    check: F,
) -> Result<T, LifecycleError>
where
    P: Provisioner + ?Sized,
    F: FnOnce(&str) -> T,
{
    let guard = DestroyGuard::new(provisioner, options);

    tracing::info!("applying {}", options.terraform_dir.display());
    let checked = provisioner
        .init_and_apply(options)
        .inspect_err(|err| tracing::error!("apply failed: {err}"))
        .map(|output| check(&output));

    let destroyed = guard.destroy();
    LifecycleError::from_outcomes(checked, destroyed)
}

/// Copies the configured module into a working copy and runs
/// [`run_lifecycle`] against it.
///
/// The working copy is removed once destroy has finished.
///
/// # Errors
///
/// [`LifecycleError::Prepare`] if the copy fails, otherwise as [`run_lifecycle`].
pub fn copy_and_run<P, T, F>(
    config: &LifecycleConfig,
    provisioner: &P,
    check: F,
) -> Result<T, LifecycleError>
where
    P: Provisioner + ?Sized,
    F: FnOnce(&str) -> T,
{
    let working_copy = copy_terraform_folder_to_temp(&config.source_root, &config.module_folder)
        .map_err(LifecycleError::Prepare)?;
    let options = config.options(working_copy.path());

    run_lifecycle(provisioner, &options, check)
}
