//! The on-disk solv-cache: a serialized dump of a repository's interned
//! solvables keyed by the metadata checksum that produced them.
//!
//! This uses `serde_json` rather than libsolv's binary `.solv` format —
//! the cache is an opaque local artifact to everything outside this module,
//! and the real binary format is out of scope per §1.

use std::fs;
use std::path::Path;

use dnf_common::Error;

use crate::solvable::SolvableRecord;

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub(crate) struct SolvCache {
    pub(crate) checksum: String,
    pub(crate) records: Vec<SolvableRecord>,
}

impl SolvCache {
    /// Reads a cache file, returning `None` if absent or if its checksum
    /// does not match `expected_checksum`.
    pub(crate) fn read_if_current(path: &Path, expected_checksum: &str) -> Result<Option<SolvCache>, Error> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|source| Error::Io {
            context: format!("reading solv-cache {}", path.display()),
            source,
        })?;
        let cache: SolvCache = serde_json::from_slice(&bytes).map_err(|err| Error::FileInvalid {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        if cache.checksum != expected_checksum {
            return Ok(None);
        }
        Ok(Some(cache))
    }

    /// Writes this cache to `path`, failing with [`Error::CannotWriteCache`] on I/O failure.
    pub(crate) fn write(&self, path: &Path) -> Result<(), Error> {
        let bytes = serde_json::to_vec(self).map_err(|err| Error::CannotWriteCache {
            path: path.to_path_buf(),
            source: std::io::Error::other(err),
        })?;
        fs::write(path, bytes).map_err(|source| Error::CannotWriteCache {
            path: path.to_path_buf(),
            source,
        })
    }
}
