//! Repositories: the system (installed) repository plus any number of
//! remote or cmdline repositories, each owning a contiguous range of the
//! pool.

use std::ops::Range;
use std::path::PathBuf;

/// A dense integer id addressing a [`Repo`] within a [`crate::Sack`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RepoId(pub(crate) usize);

impl RepoId {
    /// Returns the raw index into the sack's repository vector.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a repository represents.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepoKind {
    /// The singular installed-package database.
    System,
    /// A configured remote repository.
    Remote,
    /// A one-off package set built from files named on the command line.
    Cmdline,
}

/// A repository's load state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepoState {
    /// Configured but not yet loaded.
    New,
    /// Metadata loaded and solvables interned.
    Loaded,
    /// Loaded from a solv-cache rather than parsed metadata.
    LoadedCached,
}

/// Where a repository's on-disk cache artifacts live.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CachePaths {
    /// Path to the cached solvable dump, if one has been written or read.
    pub solv_cache: Option<PathBuf>,
}

/// A repository: `(id, kind, state, metadata_checksum, cache_paths)` per §3,
/// plus the contiguous range of solvable ids it owns in the pool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repo {
    pub(crate) id: RepoId,
    /// A caller-chosen name, e.g. `"fedora"` or `"@System"`.
    pub name: String,
    /// Whether this is the system repo, a remote repo, or a cmdline package set.
    pub kind: RepoKind,
    /// Load state.
    pub state: RepoState,
    /// The checksum embedded in (or compared against) the solv-cache.
    pub metadata_checksum: Option<String>,
    /// On-disk cache artifact locations.
    pub cache_paths: CachePaths,
    /// Whether this repo's solvables are filtered by the global pkg_includes map.
    pub use_includes: bool,
    /// Tie-breaking priority for ambiguous selector resolution: higher wins.
    pub priority: i32,
    /// Whether a transaction's `check_untrusted` step must verify this
    /// repo's packages against the trusted keyring before installing them.
    pub gpgcheck: bool,
    pub(crate) solvable_range: Range<usize>,
}

impl Repo {
    /// Returns this repository's id.
    pub fn id(&self) -> RepoId {
        self.id
    }

    /// Returns `true` if this is the system (installed) repository.
    pub fn is_system(&self) -> bool {
        matches!(self.kind, RepoKind::System)
    }

    /// Returns the range of solvable indices this repository owns.
    pub fn solvable_range(&self) -> Range<usize> {
        self.solvable_range.clone()
    }
}
