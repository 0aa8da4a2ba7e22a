//! The interned package record the pool stores, and the dense id it is
//! addressed by.

use dnf_common::{Arched, HasConflicts, HasObsoletes, HasProvides, HasRequires, HasWeakDependencies, Installed, Named, Versioned};
use dnf_types::{Arch, Evr, Name, Reldep};

use crate::repo::RepoId;

/// A dense integer id addressing a [`Solvable`] within a [`crate::Sack`]'s pool.
///
/// Ids are stable for the pool's lifetime and become meaningless once the
/// sack that produced them is dropped; this type does not borrow from the
/// pool so callers can freely store it in bitmaps and maps.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SolvableId(pub(crate) usize);

impl SolvableId {
    /// Returns the raw index into the pool's solvable vector.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An interned package identity plus its dependency relations.
///
/// Solvables are never mutated after [`crate::Sack::load_system_repo`] or
/// [`crate::Sack::load_repo`] interns them; every field here is set once at
/// construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Solvable {
    /// The package name.
    pub name: Name,
    /// The epoch/version/release triple.
    pub evr: Evr,
    /// The package architecture.
    pub arch: Arch,
    /// Which repository this solvable was loaded from.
    pub source_repo_id: RepoId,
    /// Whether this solvable was explicitly requested by the user (system repo only).
    pub user_installed: bool,
    /// `Provides` relations.
    pub provides: Vec<Reldep>,
    /// `Requires` relations.
    pub requires: Vec<Reldep>,
    /// `Conflicts` relations.
    pub conflicts: Vec<Reldep>,
    /// `Obsoletes` relations.
    pub obsoletes: Vec<Reldep>,
    /// `Recommends` relations.
    pub recommends: Vec<Reldep>,
    /// `Suggests` relations.
    pub suggests: Vec<Reldep>,
    /// `Supplements` relations.
    pub supplements: Vec<Reldep>,
    /// `Enhances` relations.
    pub enhances: Vec<Reldep>,
    /// One-line package summary, as carried by `primary.xml`.
    pub summary: String,
    /// Multi-line package description.
    pub description: String,
    /// Upstream project URL.
    pub url: String,
    /// Where this package's file lives relative to its repo's base URL.
    pub location: String,
    /// The name of the source RPM this binary package was built from.
    pub sourcerpm: String,
    /// The size in bytes of the package file itself, used to size a
    /// transaction's download against available cache-directory space.
    /// `0` for packages interned from the system repo, where no package
    /// file is ever downloaded.
    pub package_size: u64,
}

impl Named for Solvable {
    fn name(&self) -> &Name {
        &self.name
    }
}

impl Versioned for Solvable {
    fn evr(&self) -> &Evr {
        &self.evr
    }
}

impl Arched for Solvable {
    fn arch(&self) -> &Arch {
        &self.arch
    }
}

impl HasProvides for Solvable {
    fn provides(&self) -> &[Reldep] {
        &self.provides
    }
}

impl HasRequires for Solvable {
    fn requires(&self) -> &[Reldep] {
        &self.requires
    }
}

impl HasConflicts for Solvable {
    fn conflicts(&self) -> &[Reldep] {
        &self.conflicts
    }
}

impl HasObsoletes for Solvable {
    fn obsoletes(&self) -> &[Reldep] {
        &self.obsoletes
    }
}

impl HasWeakDependencies for Solvable {
    fn recommends(&self) -> &[Reldep] {
        &self.recommends
    }

    fn suggests(&self) -> &[Reldep] {
        &self.suggests
    }

    fn supplements(&self) -> &[Reldep] {
        &self.supplements
    }

    fn enhances(&self) -> &[Reldep] {
        &self.enhances
    }
}

impl Installed for Solvable {
    fn user_installed(&self) -> bool {
        self.user_installed
    }
}

/// The fields needed to intern one [`Solvable`], as produced by the system
/// RPM adapter or a repository metadata source.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SolvableRecord {
    /// The package name.
    pub name: String,
    /// The epoch; `0` if the record did not specify one.
    #[serde(default)]
    pub epoch: u32,
    /// The upstream version string.
    pub version: String,
    /// The packager release string.
    pub release: String,
    /// The architecture token.
    pub arch: String,
    /// Whether the package was explicitly installed by the user.
    #[serde(default)]
    pub user_installed: bool,
    /// `Provides` relations, rendered as `name[ op evr]` strings.
    #[serde(default)]
    pub provides: Vec<String>,
    /// `Requires` relations.
    #[serde(default)]
    pub requires: Vec<String>,
    /// `Conflicts` relations.
    #[serde(default)]
    pub conflicts: Vec<String>,
    /// `Obsoletes` relations.
    #[serde(default)]
    pub obsoletes: Vec<String>,
    /// `Recommends` relations.
    #[serde(default)]
    pub recommends: Vec<String>,
    /// `Suggests` relations.
    #[serde(default)]
    pub suggests: Vec<String>,
    /// `Supplements` relations.
    #[serde(default)]
    pub supplements: Vec<String>,
    /// `Enhances` relations.
    #[serde(default)]
    pub enhances: Vec<String>,
    /// One-line package summary.
    #[serde(default)]
    pub summary: String,
    /// Multi-line package description.
    #[serde(default)]
    pub description: String,
    /// Upstream project URL.
    #[serde(default)]
    pub url: String,
    /// Relative path to the package file within its repo.
    #[serde(default)]
    pub location: String,
    /// The source RPM this binary package was built from.
    #[serde(default)]
    pub sourcerpm: String,
    /// The size in bytes of the package file itself.
    #[serde(default)]
    pub package_size: u64,
}
