//! The narrow seam between the module container and real modulemd/defaults
//! sources, mirroring `dnf_sack::RepoMetadataSource`.

use std::path::Path;

use dnf_common::Error;

use crate::document::{ModuleDefaults, ModuleDocument};

/// Supplies already-parsed module documents and defaults for one repository
/// or one defaults directory.
///
/// Real backends parse modulemd YAML (embedded in repository metadata) and
/// distro-supplied defaults YAML; that parsing is out of scope here, so this
/// trait consumes the result instead of the raw bytes.
pub trait ModuleMetadataSource: std::fmt::Debug {
    /// Returns every modulemd document this source carries.
    fn load_modules(&self) -> Result<Vec<ModuleDocument>, Error>;

    /// Returns distro-supplied defaults found under `defaults_dir`.
    ///
    /// Default implementation returns no defaults; most repo-backed sources
    /// only carry modulemd documents, not defaults.
    fn load_defaults(&self, defaults_dir: &Path) -> Result<Vec<ModuleDefaults>, Error> {
        let _ = defaults_dir;
        Ok(Vec::new())
    }
}

/// A test double carrying a fixed, in-memory set of documents/defaults.
#[derive(Clone, Debug, Default)]
pub struct InMemoryModuleMetadataSource {
    documents: Vec<ModuleDocument>,
    defaults: Vec<ModuleDefaults>,
}

impl InMemoryModuleMetadataSource {
    /// Creates a source carrying the given documents and no defaults.
    pub fn new(documents: Vec<ModuleDocument>) -> Self {
        InMemoryModuleMetadataSource {
            documents,
            defaults: Vec::new(),
        }
    }

    /// Attaches defaults to this source, returned by [`ModuleMetadataSource::load_defaults`].
    pub fn with_defaults(mut self, defaults: Vec<ModuleDefaults>) -> Self {
        self.defaults = defaults;
        self
    }
}

impl ModuleMetadataSource for InMemoryModuleMetadataSource {
    fn load_modules(&self) -> Result<Vec<ModuleDocument>, Error> {
        Ok(self.documents.clone())
    }

    fn load_defaults(&self, _defaults_dir: &Path) -> Result<Vec<ModuleDefaults>, Error> {
        Ok(self.defaults.clone())
    }
}
