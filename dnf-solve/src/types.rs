//! The record a resolvo solvable carries and the version-set it is matched
//! against: the dnf-specific counterparts of a generic `VersionSet`/`V` pair.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

use dnf_common::Error;
use dnf_sack::{Sack, SolvableId};
use dnf_types::{Reldep, VerString, VersionComparison};
use resolvo::utils::VersionSet;

use crate::utils::parse_partial_evr;

/// A resolvo solvable's payload: either a real package or a synthetic
/// `Provides` entry, addressed back to the sack solvable that owns it.
///
/// Provides are interned as their own named candidates (the way they need to
/// be for the solver to pick between several providers of the same name),
/// but carry no data beyond a pointer back to the real package that provides
/// them plus the version the provide itself declares, if any.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CandidateRecord {
    /// A real package.
    Real(SolvableId),
    /// A `Provides` entry. `version` is the version the provide clause
    /// itself carries (e.g. `Provides: foo = 2`), not the owner's EVR.
    Virtual {
        /// The real package that provides this name.
        owner: SolvableId,
        /// The version asserted by the provide, if any.
        version: Option<PartialEvr>,
    },
}

impl CandidateRecord {
    /// The solvable that owns this candidate: itself if real, the
    /// provider if virtual.
    pub fn owner(&self) -> SolvableId {
        match *self {
            CandidateRecord::Real(id) => id,
            CandidateRecord::Virtual { owner, .. } => owner,
        }
    }

    /// `true` for a synthetic `Provides` entry rather than a real package.
    pub fn is_virtual(&self) -> bool {
        matches!(self, CandidateRecord::Virtual { .. })
    }

    /// The version this candidate is compared against for an ordering
    /// tie-break (the owner's EVR for a real package, the provide's own
    /// asserted version for a virtual one, if it declared any).
    pub fn version(&self, sack: &Sack) -> Option<PartialEvr> {
        match self {
            CandidateRecord::Real(id) => Some(PartialEvr::exact(sack.solvable(*id).evr.clone())),
            CandidateRecord::Virtual { version, .. } => version.clone(),
        }
    }

    /// A human-readable rendering for solver diagnostics.
    pub fn display(&self, sack: &Sack) -> String {
        match self {
            CandidateRecord::Real(id) => {
                let s = sack.solvable(*id);
                format!("{}-{}.{}", s.name, s.evr, s.arch)
            }
            CandidateRecord::Virtual { owner, version } => {
                let s = sack.solvable(*owner);
                match version {
                    Some(v) => format!("{v} (provided by {}-{}.{})", s.name, s.evr, s.arch),
                    None => format!("(provided by {}-{}.{})", s.name, s.evr, s.arch),
                }
            }
        }
    }
}

/// An epoch/version[/release] triple with the release left unspecified when
/// the reldep that produced it didn't carry one.
///
/// RPM reldeps routinely omit the release (`Requires: glibc >= 2.34`); per
/// `rpmvercmp` convention a missing release is not compared at all rather
/// than defaulting to `0`, so this is kept separate from the sack's full
/// [`dnf_types::Evr`] rather than forcing a synthetic release onto it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PartialEvr {
    epoch: u32,
    version: VerString,
    release: Option<VerString>,
}

impl PartialEvr {
    /// Wraps a fully-known [`dnf_types::Evr`] (every component compares).
    pub fn exact(evr: dnf_types::Evr) -> Self {
        PartialEvr { epoch: evr.epoch, version: evr.version, release: Some(evr.release) }
    }

    pub(crate) fn new(epoch: u32, version: VerString, release: Option<VerString>) -> Self {
        PartialEvr { epoch, version, release }
    }

    /// Orders `self` against `other`, skipping the release component
    /// entirely if either side left it unspecified.
    pub fn compare_ignoring_missing_release(&self, other: &PartialEvr) -> Ordering {
        self.epoch.cmp(&other.epoch).then_with(|| self.version.cmp(&other.version)).then_with(|| match (&self.release, &other.release) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => Ordering::Equal,
        })
    }
}

impl PartialOrd for PartialEvr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartialEvr {
    /// Total in practice: the only case where two sides disagree on whether
    /// a release is present is a `Provides` without a version against one
    /// with a version, which [`CandidateRecord::version`] never mixes within
    /// a single name's candidate list the way a real package's resolved EVR
    /// would.
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_ignoring_missing_release(other)
    }
}

impl Display for PartialEvr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(release) = &self.release {
            write!(f, "-{release}")?;
        }
        Ok(())
    }
}

/// A name-scoped version requirement built from a [`Reldep`]: the dnf
/// `resolvo::utils::VersionSet` implementation.
///
/// `conflict` inverts the match the way a `Conflicts`/`Obsoletes` relation
/// needs to: a conflict spec matches real candidates that do *not* satisfy
/// the underlying comparison, and always matches virtual ones (a package
/// can't conflict with a provide it doesn't itself realize as a real
/// package).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DepSpec {
    comparison: VersionComparison,
    required: Option<PartialEvr>,
    conflict: bool,
}

impl DepSpec {
    /// A version set accepting every candidate of the matching name.
    pub fn any(conflict: bool) -> Self {
        DepSpec { comparison: VersionComparison::Any, required: None, conflict }
    }

    /// Builds a [`DepSpec`] from a parsed reldep.
    pub fn from_reldep(reldep: &Reldep, conflict: bool) -> Result<Self, Error> {
        if matches!(reldep.comparison, VersionComparison::Any) {
            return Ok(DepSpec::any(conflict));
        }
        let (epoch, version, release) = parse_partial_evr(&reldep.evr)?;
        Ok(DepSpec { comparison: reldep.comparison, required: Some(PartialEvr::new(epoch, version, release)), conflict })
    }

    /// Returns `true` if `record` satisfies this version set.
    pub fn matches(&self, sack: &Sack, record: &CandidateRecord) -> bool {
        if self.conflict && record.is_virtual() {
            return true;
        }
        let satisfied = match &self.required {
            None => true,
            Some(required) => match record.version(sack) {
                None => false,
                Some(candidate) => self.comparison.accepts(candidate.compare_ignoring_missing_release(required)),
            },
        };
        satisfied ^ self.conflict
    }
}

impl VersionSet for DepSpec {
    type V = CandidateRecord;
}

impl Display for DepSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let prefix = if self.conflict { "not " } else { "" };
        match &self.required {
            Some(required) => write!(f, "{prefix}{} {required}", self.comparison),
            None => write!(f, "{prefix}any version"),
        }
    }
}
