//! The narrow seam between a transaction and GPG signature verification:
//! key retrieval and cryptographic verification are out of scope (§1,
//! "...GPG-key retrieval"), so [`crate::Transaction::check_untrusted`]
//! consumes a verdict through this trait rather than a real keyring.

use std::path::Path;

use dnf_common::Error;
use dnf_sack::Solvable;

/// A trusted-keyring verdict provider.
pub trait TrustStore: std::fmt::Debug {
    /// Returns `true` if `solvable`'s package file at `path` verifies
    /// against the trusted keyring.
    ///
    /// `Err` is reserved for a keyring that could not be consulted at all
    /// (e.g. its storage is unreadable); a package signed by an untrusted or
    /// unknown key returns `Ok(false)`, not an error.
    fn verify(&self, solvable: &Solvable, path: &Path) -> Result<bool, Error>;
}

/// An in-memory [`TrustStore`] for tests: trusts exactly the package names
/// it is told to.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTrustStore {
    trusted_names: std::collections::HashSet<String>,
}

impl InMemoryTrustStore {
    /// Creates a trust store that trusts nothing.
    pub fn new() -> Self {
        InMemoryTrustStore::default()
    }

    /// Marks `name` as signed by a trusted key.
    pub fn trust(&mut self, name: impl Into<String>) {
        self.trusted_names.insert(name.into());
    }
}

impl TrustStore for InMemoryTrustStore {
    fn verify(&self, solvable: &Solvable, _path: &Path) -> Result<bool, Error> {
        Ok(self.trusted_names.contains(solvable.name.as_str()))
    }
}
