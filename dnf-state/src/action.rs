//! Semantic action transitions reported to progress observers.

use std::fmt::Debug;

/// A coarse-grained phase of a long-running operation, reported to
/// observers via [`crate::State::action_start`]/[`crate::State::action_stop`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
pub enum Action {
    /// Resolving a goal against the sack.
    DepSolve,
    /// Downloading planned packages.
    Download,
    /// Verifying package signatures against the trusted keyring.
    CheckUntrusted,
    /// Running the RPM transaction in test (dry-run) mode.
    TestCommit,
    /// Running the real RPM transaction.
    Commit,
    /// Removing stale cache entries.
    CleanCache,
}

/// Receives progress notifications from a [`crate::State`] tree.
///
/// Implementors are expected to be cheap to call frequently; `on_progress`
/// in particular may be invoked once per percentage point.
pub trait ProgressObserver: Debug + Send + Sync {
    /// Called when a node enters `action`, with an optional human-readable hint
    /// (e.g. the package name currently being downloaded).
    fn on_action_start(&self, action: Action, hint: &str);

    /// Called when the current action completes.
    fn on_action_stop(&self, action: Action);

    /// Called when the overall completion percentage of the root node changes.
    fn on_progress(&self, percent: u8);
}
