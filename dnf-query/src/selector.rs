//! Selector: "a small declarative spec" (§2) — a conjunction of
//! equality/glob filters on name/arch/evr/provides/reponame, or an explicit
//! package set, plus the tie-breaking needed to resolve it to one package.

use dnf_common::Error;
use dnf_sack::{Sack, SolvableId};
use dnf_types::Reldep;

use crate::filter::{ComparisonKind, Filter, FilterKey, FilterValue};
use crate::query::Query;

/// A conjunction of filters (or an explicit package set) identifying a
/// single intended package, per §4.3's Selector contract.
#[derive(Clone, Debug, Default)]
pub struct Selector {
    filters: Vec<Filter>,
    package_set: Option<Vec<SolvableId>>,
}

impl Selector {
    /// Creates an empty selector.
    pub fn new() -> Self {
        Selector::default()
    }

    /// Builds a selector directly from an explicit, already-resolved package set.
    pub fn from_package_set(ids: Vec<SolvableId>) -> Self {
        Selector {
            filters: Vec::new(),
            package_set: Some(ids),
        }
    }

    /// Constrains the selector to an exact package name.
    pub fn set_name(mut self, name: impl Into<String>) -> Result<Self, Error> {
        self.filters.push(Filter::new(FilterKey::Name, ComparisonKind::Eq, FilterValue::Str(name.into()))?);
        Ok(self)
    }

    /// Constrains the selector to an exact architecture.
    pub fn set_arch(mut self, arch: impl Into<String>) -> Result<Self, Error> {
        self.filters.push(Filter::new(FilterKey::Arch, ComparisonKind::Eq, FilterValue::Str(arch.into()))?);
        Ok(self)
    }

    /// Constrains the selector by EVR under `comparison`.
    pub fn set_evr(mut self, evr: impl Into<String>, comparison: ComparisonKind) -> Result<Self, Error> {
        self.filters.push(Filter::new(FilterKey::Evr, comparison, FilterValue::Str(evr.into()))?);
        Ok(self)
    }

    /// Constrains the selector to packages providing `reldep`.
    pub fn set_provides(mut self, reldep: Reldep) -> Result<Self, Error> {
        self.filters.push(Filter::new(FilterKey::Provides, ComparisonKind::Eq, FilterValue::Reldep(reldep))?);
        Ok(self)
    }

    /// Constrains the selector to a specific source repository.
    pub fn set_reponame(mut self, reponame: impl Into<String>) -> Result<Self, Error> {
        self.filters.push(Filter::new(FilterKey::Reponame, ComparisonKind::Eq, FilterValue::Str(reponame.into()))?);
        Ok(self)
    }

    /// Checks well-formedness: `provides` and `nevra`-family filters are
    /// mutually exclusive, as is `nevra` alongside `name`/`arch`/`evr` (the
    /// former subsumes the latter).
    pub fn validate(&self) -> Result<(), Error> {
        let has = |key: FilterKey| self.filters.iter().any(|f| f.key() == key);
        let has_nevra = has(FilterKey::Nevra) || has(FilterKey::NevraStrict);
        if has_nevra && has(FilterKey::Provides) {
            return Err(Error::BadSelector {
                reason: "provides and nevra are mutually exclusive in a selector".to_string(),
            });
        }
        if has_nevra && (has(FilterKey::Name) || has(FilterKey::Arch) || has(FilterKey::Evr)) {
            return Err(Error::BadSelector {
                reason: "nevra subsumes name/arch/evr; do not combine them".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the [`Query`] this selector describes, after validating it.
    pub fn to_query<'a>(&self, sack: &'a Sack) -> Result<Query<'a>, Error> {
        self.validate()?;
        let mut query = Query::new(sack);
        if let Some(ids) = &self.package_set {
            query = query.restrict_to(ids.clone());
        }
        for filter in self.filters.clone() {
            query = query.filter(filter);
        }
        Ok(query)
    }

    /// Resolves the selector to a single best package, applying the
    /// tie-breaking rule of §4.3: highest-priority repo, then latest EVR,
    /// then arch preference (native > compatible > noarch).
    pub fn resolve(&self, sack: &Sack) -> Result<SolvableId, Error> {
        let query = self.to_query(sack)?;
        let candidates = query.run();
        best_candidate(sack, &candidates).ok_or_else(|| Error::PackageNotFound {
            subject: "selector matched no package".to_string(),
        })
    }
}

/// Ranks `arch` against the sack's native arch for tie-breaking: native
/// highest, `noarch` lowest, anything else (a "compatible" arch) in between.
pub fn arch_preference(sack: &Sack, arch: &str) -> u8 {
    match sack.arch() {
        Some(native) if native.as_str() == arch => 2,
        _ if arch == "noarch" => 0,
        _ => 1,
    }
}

fn best_candidate(sack: &Sack, candidates: &[SolvableId]) -> Option<SolvableId> {
    candidates.iter().copied().max_by(|a, b| {
        let sa = sack.solvable(*a);
        let sb = sack.solvable(*b);
        let repo_a = &sack.repos()[sa.source_repo_id.index()];
        let repo_b = &sack.repos()[sb.source_repo_id.index()];
        repo_a
            .priority
            .cmp(&repo_b.priority)
            .then_with(|| sa.evr.cmp(&sb.evr))
            .then_with(|| arch_preference(sack, sa.arch.as_str()).cmp(&arch_preference(sack, sb.arch.as_str())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnf_sack::LoadFlags;
    use testresult::TestResult;

    #[test]
    fn mutually_exclusive_filters_rejected() -> TestResult {
        let selector = Selector::new()
            .set_name("foo")?
            .set_provides(Reldep::unconstrained("bar"))?;
        let sack = dnf_sack::Sack::new();
        assert!(selector.to_query(&sack).is_err());
        Ok(())
    }

    #[test]
    fn resolve_picks_highest_priority_repo() -> TestResult {
        let mut sack = dnf_sack::Sack::new();
        let low = dnf_sack::InMemoryMetadataSource::new(
            "low",
            vec![dnf_sack::SolvableRecord {
                name: "pkg".to_string(),
                version: "1.0".to_string(),
                release: "1".to_string(),
                arch: "noarch".to_string(),
                ..Default::default()
            }],
        );
        let high = dnf_sack::InMemoryMetadataSource::new(
            "high",
            vec![dnf_sack::SolvableRecord {
                name: "pkg".to_string(),
                version: "1.0".to_string(),
                release: "1".to_string(),
                arch: "noarch".to_string(),
                ..Default::default()
            }],
        );
        sack.load_repo("low-repo", &low, LoadFlags::default())?;
        sack.load_repo("high-repo", &high, LoadFlags::default())?;
        sack.set_repo_priority("high-repo", 10)?;
        sack.make_considered_ready();

        let selected = Selector::new().set_name("pkg")?.resolve(&sack)?;
        let repo = &sack.repos()[sack.solvable(selected).source_repo_id.index()];
        assert_eq!(repo.name, "high-repo");
        Ok(())
    }
}
