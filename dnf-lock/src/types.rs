//! Lock kinds and modes.

use std::fmt::{self, Display, Formatter};

/// Which resource a lock protects.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LockType {
    /// The running-process RPM database.
    Rpmdb,
    /// A repository's cached metadata or packages.
    Repo,
    /// The shared metadata directory.
    Metadata,
    /// The on-disk configuration.
    Config,
}

impl LockType {
    /// The token used in the lock file name (`dnf-<token>.lock`) and in log messages.
    ///
    /// `Repo` maps to `"src"`, not `"repo"` — this is the literal token the
    /// lock subsystem has always used and is kept for on-disk compatibility
    /// with any lock file a concurrent older process might have written.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockType::Rpmdb => "rpmdb",
            LockType::Repo => "src",
            LockType::Metadata => "metadata",
            LockType::Config => "config",
        }
    }
}

impl Display for LockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a lock is scoped to the current thread or to the whole process.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LockMode {
    /// Visible only to the thread that took it; other threads in the same
    /// process may still hold an independent process-mode lock of the same type.
    Thread,
    /// Backed by a lock file under the lock directory, visible to every
    /// process on the system.
    Process,
}
