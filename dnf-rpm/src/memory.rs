//! An in-memory [`RpmBackend`] reference implementation.
//!
//! This is a test double, not a real librpm binding: "installing" a file
//! just records a placeholder entry keyed on the path, and there is no
//! actual RPM header parsing. It exists so the rest of the workspace can be
//! exercised end to end without the native RPM library.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dnf_common::Error;
use dnf_types::{Evr, Name, Nevra, VerString};
use sha1::{Digest, Sha1};

use crate::backend::{InstalledPackage, RpmBackend, TransactionProblem};

#[derive(Clone, Debug)]
enum StagedOp {
    Install {
        path: PathBuf,
        allow_untrusted: bool,
        is_update: bool,
    },
    Remove(Nevra),
}

/// An in-memory stand-in for a real RPM database and transaction set.
#[derive(Debug, Default)]
pub struct InMemoryRpmBackend {
    installed: HashMap<Name, InstalledPackage>,
    staged: Vec<StagedOp>,
}

impl InMemoryRpmBackend {
    /// Creates an empty backend with nothing installed.
    pub fn new() -> Self {
        InMemoryRpmBackend::default()
    }

    /// Seeds the backend with a package as if it were already installed.
    ///
    /// The header checksum is derived deterministically from the package's
    /// NEVRA, so the same seed data always yields the same rpmdb version.
    pub fn seed_installed(&mut self, name: Name, evr: Evr, arch: impl Into<String>) {
        let arch = arch.into();
        let header_sha1 = header_digest(&name, &evr, &arch);
        self.installed.insert(
            name.clone(),
            InstalledPackage {
                name,
                evr,
                arch,
                header_sha1,
            },
        );
    }
}

fn header_digest(name: &Name, evr: &Evr, arch: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{name}-{evr}.{arch}").as_bytes());
    format!("{:x}", hasher.finalize())
}

impl RpmBackend for InMemoryRpmBackend {
    fn installed_packages(&self, _root_dir: &Path) -> Result<Vec<InstalledPackage>, Error> {
        let mut packages: Vec<InstalledPackage> = self.installed.values().cloned().collect();
        packages.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(packages)
    }

    fn rpmdb_version(&self, root_dir: &Path) -> Result<String, Error> {
        let packages = self.installed_packages(root_dir)?;
        let mut digests: Vec<&str> = packages.iter().map(|p| p.header_sha1.as_str()).collect();
        digests.sort_unstable();
        let mut hasher = Sha1::new();
        for digest in &digests {
            hasher.update(digest.as_bytes());
        }
        Ok(format!("{}:{:x}", packages.len(), hasher.finalize()))
    }

    fn add_install_filename(&mut self, path: &Path, allow_untrusted: bool, is_update: bool) -> Result<(), Error> {
        self.staged.push(StagedOp::Install {
            path: path.to_path_buf(),
            allow_untrusted,
            is_update,
        });
        Ok(())
    }

    fn add_remove_pkg(&mut self, nevra: &Nevra) -> Result<(), Error> {
        self.staged.push(StagedOp::Remove(nevra.clone()));
        Ok(())
    }

    fn run_transaction(&mut self, test: bool) -> Result<Vec<TransactionProblem>, Error> {
        if test {
            return Ok(Vec::new());
        }
        let staged = std::mem::take(&mut self.staged);
        for op in staged {
            match op {
                StagedOp::Install { path, .. } => {
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown")
                        .to_string();
                    let name = Name::new(stem.clone())?;
                    let evr = Evr::new(0, VerString::new("0")?, VerString::new("0")?);
                    let header_sha1 = header_digest(&name, &evr, "noarch");
                    self.installed.insert(
                        name.clone(),
                        InstalledPackage {
                            name,
                            evr,
                            arch: "noarch".to_string(),
                            header_sha1,
                        },
                    );
                }
                StagedOp::Remove(nevra) => {
                    self.installed.remove(&nevra.name);
                }
            }
        }
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        self.staged.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn rpmdb_version_is_stable_for_the_same_seed() -> TestResult {
        let mut a = InMemoryRpmBackend::new();
        a.seed_installed(
            Name::new("glibc")?,
            Evr::new(0, VerString::new("2.39")?, VerString::new("1")?),
            "x86_64",
        );
        let mut b = InMemoryRpmBackend::new();
        b.seed_installed(
            Name::new("glibc")?,
            Evr::new(0, VerString::new("2.39")?, VerString::new("1")?),
            "x86_64",
        );
        assert_eq!(a.rpmdb_version(Path::new("/"))?, b.rpmdb_version(Path::new("/"))?);
        Ok(())
    }

    #[test]
    fn install_then_remove_round_trips() -> TestResult {
        let mut backend = InMemoryRpmBackend::new();
        backend.add_install_filename(Path::new("/tmp/foo-1.0-1.noarch.rpm"), false, false)?;
        backend.run_transaction(false)?;
        assert_eq!(backend.installed_packages(Path::new("/"))?.len(), 1);

        let nevra = Nevra::parse_as("foo", dnf_types::NevraForm::Name)?;
        backend.add_remove_pkg(&nevra)?;
        backend.run_transaction(false)?;
        assert!(backend.installed_packages(Path::new("/"))?.is_empty());
        Ok(())
    }
}
