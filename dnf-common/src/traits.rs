//! Interfaces implemented by anything the resolver, query layer or
//! transaction executor treats as "a package".
//!
//! These mirror the solvable identity and dependency-relation fields a pool
//! entry carries, without committing callers to any particular in-memory
//! representation.

use dnf_types::{Arch, Evr, Name, Reldep};

/// An interface for retrieving the name of a package or module.
pub trait Named {
    /// Returns the package name.
    fn name(&self) -> &Name;
}

/// An interface for retrieving the epoch/version/release of a package.
pub trait Versioned {
    /// Returns the package's epoch, version and release.
    fn evr(&self) -> &Evr;
}

/// An interface for retrieving the architecture of a package.
pub trait Arched {
    /// Returns the package architecture.
    fn arch(&self) -> &Arch;
}

/// Packages that declare what they provide.
pub trait HasProvides {
    /// Returns the package's `Provides` relations.
    fn provides(&self) -> &[Reldep];
}

/// Packages that declare what they need.
pub trait HasRequires {
    /// Returns the package's `Requires` relations.
    fn requires(&self) -> &[Reldep];
}

/// Packages that declare what they conflict with.
pub trait HasConflicts {
    /// Returns the package's `Conflicts` relations.
    fn conflicts(&self) -> &[Reldep];
}

/// Packages that declare what they obsolete.
pub trait HasObsoletes {
    /// Returns the package's `Obsoletes` relations.
    fn obsoletes(&self) -> &[Reldep];
}

/// Packages that declare weak (non-solver-binding) dependency hints.
///
/// `Recommends`/`Supplements` pull a package in unless weak deps are
/// disabled; `Suggests`/`Enhances` are advisory only and never affect the
/// resolver.
pub trait HasWeakDependencies {
    /// Returns the package's `Recommends` relations.
    fn recommends(&self) -> &[Reldep];

    /// Returns the package's `Suggests` relations.
    fn suggests(&self) -> &[Reldep];

    /// Returns the package's `Supplements` relations.
    fn supplements(&self) -> &[Reldep];

    /// Returns the package's `Enhances` relations.
    fn enhances(&self) -> &[Reldep];
}

/// Generic interface for package metadata offering identity, version and
/// hard dependency relations.
pub trait GenericPackageMetadata:
    Named + Versioned + Arched + HasProvides + HasRequires + HasConflicts + HasObsoletes
{
}

impl<T> GenericPackageMetadata for T where
    T: Named + Versioned + Arched + HasProvides + HasRequires + HasConflicts + HasObsoletes
{
}

/// Packages that carry an installation-reason tag, as tracked for packages
/// in the system (installed) repository.
pub trait Installed {
    /// Returns `true` if the package was installed explicitly by the user
    /// rather than pulled in as a dependency.
    fn user_installed(&self) -> bool;
}
