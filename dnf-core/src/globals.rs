//! The process-scope singleton init point (§9, "Global mutable state").
//!
//! Nothing in this workspace actually touches native global state — the
//! pool debug callback, RPM config init, and keyring live entirely behind
//! [`dnf_rpm::RpmBackend`]/[`dnf_transaction::TrustStore`] trait objects, per
//! §1's Non-goals. This function still exists as the single explicit place
//! a real RPM adapter would perform that init, rather than letting it leak
//! into a constructor somewhere in the call graph.

use std::sync::OnceLock;

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Runs process-wide initialization exactly once per process.
///
/// Safe to call more than once; every call after the first is a no-op.
/// Callers should invoke this before constructing a [`dnf_sack::Sack`] or
/// taking any [`dnf_lock::LockManager`] lock.
pub fn globals_init() {
    INITIALIZED.get_or_init(|| {
        log::debug!("dnf-core globals initialized");
    });
}

/// Returns `true` if [`globals_init`] has already run in this process.
pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}
