//! The narrow seam between the sack and repository metadata: fetching and
//! parsing the actual `repomd.xml`/`primary.xml.gz` wire format is out of
//! scope (§1, "repository metadata download/HTTP/GPG-key retrieval"), so
//! [`Sack::load_repo`](crate::Sack::load_repo) consumes already-parsed
//! records through this trait — the same narrow-adapter shape `dnf-rpm`
//! uses for the system database.

use dnf_common::Error;

use crate::solvable::SolvableRecord;

/// A source of parsed repository metadata for one repository.
///
/// `load_filelists`/`load_other`/`load_prestodelta`/`load_updateinfo` are
/// optional extensions per §4.1: returning `Ok(None)` means the extension is
/// absent (the caller logs and continues), while `Err(_)` means it was
/// present but could not be parsed, which is fatal.
pub trait RepoMetadataSource: std::fmt::Debug {
    /// Returns the checksum that identifies this metadata snapshot, used to
    /// decide whether an existing solv-cache is still valid.
    fn checksum(&self) -> Result<String, Error>;

    /// Parses and returns every solvable described by `primary.xml`.
    fn load_primary(&self) -> Result<Vec<SolvableRecord>, Error>;

    /// Parses `filelists.xml`, if present.
    fn load_filelists(&self) -> Result<Option<Vec<String>>, Error> {
        Ok(None)
    }

    /// Parses `other.xml` (changelogs), if present.
    fn load_other(&self) -> Result<Option<Vec<String>>, Error> {
        Ok(None)
    }

    /// Parses `prestodelta.xml` (delta RPMs), if present.
    fn load_prestodelta(&self) -> Result<Option<Vec<String>>, Error> {
        Ok(None)
    }

    /// Parses `updateinfo.xml` (advisories), if present.
    fn load_updateinfo(&self) -> Result<Option<Vec<String>>, Error> {
        Ok(None)
    }
}

/// An in-memory [`RepoMetadataSource`] for tests: records handed to it
/// verbatim, no optional extensions.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMetadataSource {
    checksum: String,
    records: Vec<SolvableRecord>,
}

impl InMemoryMetadataSource {
    /// Builds a source that reports `checksum` and yields `records` from `load_primary`.
    pub fn new(checksum: impl Into<String>, records: Vec<SolvableRecord>) -> Self {
        InMemoryMetadataSource {
            checksum: checksum.into(),
            records,
        }
    }
}

impl RepoMetadataSource for InMemoryMetadataSource {
    fn checksum(&self) -> Result<String, Error> {
        Ok(self.checksum.clone())
    }

    fn load_primary(&self) -> Result<Vec<SolvableRecord>, Error> {
        Ok(self.records.clone())
    }
}
