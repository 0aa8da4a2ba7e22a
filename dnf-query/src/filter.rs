//! Filter keys, comparison kinds, and the values they're compared against —
//! the vocabulary a [`crate::Query`] or [`crate::Selector`] is built from.

use dnf_common::Error;
use dnf_sack::SolvableId;
use dnf_types::Reldep;

/// Which field of a solvable a filter inspects.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterKey {
    /// Package name.
    Name,
    /// Architecture.
    Arch,
    /// Epoch.
    Epoch,
    /// Upstream version.
    Version,
    /// Packager release.
    Release,
    /// Full epoch:version-release.
    Evr,
    /// Full name-epoch:version-release.arch.
    Nevra,
    /// Like [`FilterKey::Nevra`], but only `eq`/`neq` are permitted.
    NevraStrict,
    /// The source RPM a binary package was built from.
    Sourcerpm,
    /// A file path the package ships (requires filelists metadata).
    File,
    /// The name of the repository the solvable was loaded from.
    Reponame,
    /// `Provides` relations.
    Provides,
    /// `Requires` relations.
    Requires,
    /// `Conflicts` relations.
    Conflicts,
    /// `Obsoletes` relations.
    Obsoletes,
    /// `Recommends` relations.
    Recommends,
    /// `Suggests` relations.
    Suggests,
    /// `Supplements` relations.
    Supplements,
    /// `Enhances` relations.
    Enhances,
    /// Package description.
    Description,
    /// Package summary.
    Summary,
    /// Upstream URL.
    Url,
    /// Package file location relative to the repo base.
    Location,
    /// Update advisory id (requires updateinfo metadata).
    Advisory,
    /// Whether only the newest EVR(s) per name are kept.
    Latest,
    /// Whether only the newest EVR(s) per (name, arch) are kept.
    LatestPerArch,
    /// Whether a newer version of the same name is installed (boolean).
    Downgradable,
    /// Whether an older version of the same name is installed (boolean).
    Upgradable,
    /// Packages that would downgrade something installed (boolean).
    Downgrades,
    /// Packages that would upgrade something installed (boolean).
    Upgrades,
    /// Whether the query should be forced empty (boolean).
    Empty,
}

/// How a filter's value is compared against a solvable's field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComparisonKind {
    /// Exact match.
    Eq,
    /// Not an exact match.
    Neq,
    /// Less than, `rpmvercmp`-ordered for version-like fields.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal to.
    Le,
    /// Greater than or equal to.
    Ge,
    /// Shell-glob match.
    Glob,
    /// Substring match.
    Substr,
}

/// The value side of a filter.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    /// A single string.
    Str(String),
    /// A list of strings, matched as "any of".
    StrList(Vec<String>),
    /// A numeric value (used for `epoch`).
    Num(i64),
    /// A single reldep (used for `provides`/`requires`/...).
    Reldep(Reldep),
    /// A list of reldeps, matched as "any of".
    ReldepList(Vec<Reldep>),
    /// An explicit, pre-materialized package set.
    PackageSet(Vec<SolvableId>),
    /// A boolean flag, used by `latest`/`upgradable`/`downgradable`/`empty`/...
    Bool(bool),
}

/// A single `(key, comparison, value[, icase])` filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub(crate) key: FilterKey,
    pub(crate) comparison: ComparisonKind,
    pub(crate) value: FilterValue,
    pub(crate) icase: bool,
}

impl Filter {
    /// Builds a filter, rejecting combinations the contract disallows
    /// (currently: [`FilterKey::NevraStrict`] with anything but `eq`/`neq`).
    pub fn new(key: FilterKey, comparison: ComparisonKind, value: FilterValue) -> Result<Self, Error> {
        if matches!(key, FilterKey::NevraStrict) && !matches!(comparison, ComparisonKind::Eq | ComparisonKind::Neq) {
            return Err(Error::BadSelector {
                reason: "nevra_strict only accepts eq/neq".to_string(),
            });
        }
        Ok(Filter {
            key,
            comparison,
            value,
            icase: false,
        })
    }

    /// Marks this filter as case-insensitive.
    pub fn icase(mut self) -> Self {
        self.icase = true;
        self
    }

    /// Returns this filter's key.
    pub fn key(&self) -> FilterKey {
        self.key
    }
}
