//! The `RpmBackend` contract: the narrow seam between dnf-core and the
//! native RPM library.
//!
//! Nothing outside this trait may assume anything about how packages are
//! actually installed, removed, or queried from rpmdb — every other crate
//! in the workspace talks to a `dyn RpmBackend`.

use std::fmt::Debug;
use std::path::Path;

use dnf_common::Error;
use dnf_types::{Evr, Name, Nevra};

/// A package as read directly out of the installed RPM database.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstalledPackage {
    /// The package name.
    pub name: Name,
    /// The package's epoch/version/release.
    pub evr: Evr,
    /// The package architecture token.
    pub arch: String,
    /// The SHA-1 hex digest of this package's RPM header, as stored in rpmdb.
    pub header_sha1: String,
}

/// A single problem reported by a (possibly test-mode) RPM transaction run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionProblem {
    /// The package the problem concerns, as a display string.
    pub package: String,
    /// A human-readable description of the conflict or dependency problem.
    pub description: String,
}

/// The seam between dnf-core and the native RPM library.
///
/// A backend tracks one open "transaction set": installs and removals are
/// staged with [`RpmBackend::add_install_filename`]/[`RpmBackend::add_remove_pkg`]
/// and then executed with [`RpmBackend::run_transaction`]. Reading the
/// installed set and the rpmdb version does not require a staged
/// transaction.
pub trait RpmBackend: Debug {
    /// Returns every package currently recorded in the RPM database under `root_dir`.
    fn installed_packages(&self, root_dir: &Path) -> Result<Vec<InstalledPackage>, Error>;

    /// Computes the rpmdb version checksum: a SHA-1 over the sorted header
    /// SHA-1s of every installed package, rendered as `<count>:<hex>`.
    fn rpmdb_version(&self, root_dir: &Path) -> Result<String, Error>;

    /// Stages installation of the RPM file at `path`.
    ///
    /// `allow_untrusted` permits installing a package whose signature did
    /// not verify; `is_update` marks this install as replacing an existing
    /// package of the same name, which affects RPM's internal ordering.
    fn add_install_filename(&mut self, path: &Path, allow_untrusted: bool, is_update: bool) -> Result<(), Error>;

    /// Stages removal of an installed package.
    fn add_remove_pkg(&mut self, nevra: &Nevra) -> Result<(), Error>;

    /// Runs every staged install/remove as one transaction.
    ///
    /// If `test` is `true`, this only validates the transaction (dependency
    /// and file-conflict checks) without touching the filesystem or rpmdb.
    fn run_transaction(&mut self, test: bool) -> Result<Vec<TransactionProblem>, Error>;

    /// Clears any staged installs/removals without running them.
    fn reset(&mut self);
}
