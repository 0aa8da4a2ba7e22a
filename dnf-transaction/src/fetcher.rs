//! The narrow seam between a transaction and the package-download
//! collaborator: fetching package files over HTTP is out of scope (§1,
//! "repository metadata download/HTTP/GPG-key retrieval"), so
//! [`crate::Transaction::download`] consumes already-fetched files through
//! this trait, the same narrow-adapter shape [`dnf_sack::RepoMetadataSource`]
//! and [`dnf_rpm::RpmBackend`] use for their own external seams.

use std::path::{Path, PathBuf};

use dnf_common::Error;
use dnf_sack::Solvable;

/// A source of downloaded package files and the cache-directory filesystem
/// they land on.
pub trait PackageFetcher: std::fmt::Debug {
    /// The path `solvable`'s package file would be downloaded to.
    fn cache_path(&self, solvable: &Solvable) -> PathBuf;

    /// Returns `true` if a file already exists at `solvable`'s cache path
    /// whose checksum matches the solvable's expected package checksum, so
    /// [`crate::Transaction::depsolve`] can skip re-downloading it.
    fn is_cached(&self, solvable: &Solvable) -> bool;

    /// Bytes free on the filesystem holding the cache directory, used by
    /// [`crate::Transaction::check_free_space`].
    fn free_space(&self) -> Result<u64, Error>;

    /// Downloads `solvable`'s package file, returning its final local path.
    fn fetch(&mut self, solvable: &Solvable) -> Result<PathBuf, Error>;

    /// Deletes a previously downloaded file, used when `keep_cache` is false.
    fn remove_cached(&mut self, path: &Path) -> Result<(), Error>;
}

/// An in-memory [`PackageFetcher`] for tests: package files are never
/// actually written, "download" just records the request and returns the
/// configured cache path.
#[derive(Debug, Default)]
pub struct InMemoryPackageFetcher {
    free_space: u64,
    cached: std::collections::HashSet<String>,
    pub(crate) fetched: Vec<String>,
    pub(crate) removed: Vec<PathBuf>,
}

impl InMemoryPackageFetcher {
    /// Creates a fetcher reporting `free_space` bytes available, with
    /// nothing pre-cached.
    pub fn new(free_space: u64) -> Self {
        InMemoryPackageFetcher {
            free_space,
            ..Default::default()
        }
    }

    /// Marks `solvable`'s package file as already present in the cache, so a
    /// subsequent `depsolve`/`download` treats it as already downloaded.
    pub fn mark_cached(&mut self, solvable: &Solvable) {
        self.cached.insert(solvable_key(solvable));
    }

    /// Every solvable key this fetcher was actually asked to download.
    pub fn fetched(&self) -> &[String] {
        &self.fetched
    }
}

fn solvable_key(solvable: &Solvable) -> String {
    format!("{}-{}.{}", solvable.name, solvable.evr, solvable.arch)
}

impl PackageFetcher for InMemoryPackageFetcher {
    fn cache_path(&self, solvable: &Solvable) -> PathBuf {
        PathBuf::from(format!("/var/cache/dnf/packages/{}.rpm", solvable_key(solvable)))
    }

    fn is_cached(&self, solvable: &Solvable) -> bool {
        self.cached.contains(&solvable_key(solvable))
    }

    fn free_space(&self) -> Result<u64, Error> {
        Ok(self.free_space)
    }

    fn fetch(&mut self, solvable: &Solvable) -> Result<PathBuf, Error> {
        let key = solvable_key(solvable);
        self.fetched.push(key.clone());
        self.cached.insert(key);
        Ok(self.cache_path(solvable))
    }

    fn remove_cached(&mut self, path: &Path) -> Result<(), Error> {
        self.removed.push(path.to_path_buf());
        Ok(())
    }
}
