//! The lazy filter pipeline (§4.5): a sack reference plus an accumulated
//! filter list, materialized on demand and re-materialized whenever the
//! filter list changes.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;

use dnf_common::Error;
use dnf_sack::{Sack, Solvable, SolvableId};
use dnf_types::{rpmvercmp, Reldep};

use crate::filter::{ComparisonKind, Filter, FilterKey, FilterValue};

/// A lazy, composable, side-effect-free filter pipeline over a [`Sack`].
///
/// Calling [`Query::filter`] invalidates any previously materialized result;
/// calling a terminal operation ([`Query::run`] or one of the set
/// operations) applies every accumulated filter and caches the result until
/// the filter list changes again. Requires the sack's considered set to
/// already be fresh (`sack.make_considered_ready()` must have been called);
/// `Query` only ever borrows the sack immutably.
#[derive(Debug)]
pub struct Query<'a> {
    sack: &'a Sack,
    filters: Vec<Filter>,
    restrict: Option<Vec<SolvableId>>,
    applied: RefCell<Option<Vec<SolvableId>>>,
}

impl<'a> Clone for Query<'a> {
    fn clone(&self) -> Self {
        Query {
            sack: self.sack,
            filters: self.filters.clone(),
            restrict: self.restrict.clone(),
            applied: RefCell::new(self.applied.borrow().clone()),
        }
    }
}

impl<'a> Query<'a> {
    /// Creates a query over every considered solvable in `sack`.
    pub fn new(sack: &'a Sack) -> Self {
        Query {
            sack,
            filters: Vec::new(),
            restrict: None,
            applied: RefCell::new(None),
        }
    }

    /// Adds a filter, invalidating any cached materialized result.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        *self.applied.borrow_mut() = None;
        self
    }

    /// Restricts the query to an explicit, already-known package set
    /// (used by [`crate::Selector::from_package_set`]), invalidating any
    /// cached result.
    pub fn restrict_to(mut self, ids: Vec<SolvableId>) -> Self {
        self.restrict = Some(ids);
        *self.applied.borrow_mut() = None;
        self
    }

    /// Applies every accumulated filter and returns the resulting package set.
    ///
    /// The result is memoized: calling `run` again without adding a filter
    /// returns the cached set rather than recomputing it.
    pub fn run(&self) -> Vec<SolvableId> {
        if let Some(cached) = self.applied.borrow().as_ref() {
            return cached.clone();
        }
        let mut ids: Vec<SolvableId> = match &self.restrict {
            Some(explicit) => explicit.clone(),
            None => self.sack.considered_ids().collect(),
        };
        for filter in &self.filters {
            ids.retain(|id| matches_filter(self.sack, *id, filter));
        }
        for filter in &self.filters {
            ids = apply_set_filter(self.sack, ids, filter);
        }
        *self.applied.borrow_mut() = Some(ids.clone());
        ids
    }

    /// Returns the union of `self` and `other`'s materialized results.
    pub fn union(&self, other: &Query<'_>) -> Vec<SolvableId> {
        let mut ids = self.run();
        for id in other.run() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Returns the intersection of `self` and `other`'s materialized results.
    pub fn intersection(&self, other: &Query<'_>) -> Vec<SolvableId> {
        let rhs = other.run();
        self.run().into_iter().filter(|id| rhs.contains(id)).collect()
    }

    /// Returns `self`'s materialized results minus `other`'s.
    pub fn difference(&self, other: &Query<'_>) -> Vec<SolvableId> {
        let rhs = other.run();
        self.run().into_iter().filter(|id| !rhs.contains(id)).collect()
    }
}

fn evr_key(solvable: &Solvable) -> (u32, &dnf_types::VerString, &dnf_types::VerString) {
    (solvable.evr.epoch, &solvable.evr.version, &solvable.evr.release)
}

fn cmp_evr(a: &Solvable, b: &Solvable) -> Ordering {
    a.evr.cmp(&b.evr)
}

fn glob_match(pattern: &str, value: &str, icase: bool) -> bool {
    let (pattern, value) = if icase {
        (pattern.to_lowercase(), value.to_lowercase())
    } else {
        (pattern.to_string(), value.to_string())
    };
    glob::Pattern::new(&pattern).map(|p| p.matches(&value)).unwrap_or(false)
}

fn str_cmp(a: &str, b: &str, comparison: ComparisonKind, icase: bool) -> bool {
    let (a, b) = if icase {
        (a.to_lowercase(), b.to_lowercase())
    } else {
        (a.to_string(), b.to_string())
    };
    match comparison {
        ComparisonKind::Eq => a == b,
        ComparisonKind::Neq => a != b,
        ComparisonKind::Lt => a < b,
        ComparisonKind::Gt => a > b,
        ComparisonKind::Le => a <= b,
        ComparisonKind::Ge => a >= b,
        ComparisonKind::Glob => glob_match(&b, &a, false),
        ComparisonKind::Substr => a.contains(&b),
    }
}

fn str_field_matches(field: &str, filter: &Filter) -> bool {
    match &filter.value {
        FilterValue::Str(needle) => str_cmp(field, needle, filter.comparison, filter.icase),
        FilterValue::StrList(needles) => needles.iter().any(|n| str_cmp(field, n, filter.comparison, filter.icase)),
        _ => false,
    }
}

fn version_field_matches(field: &str, filter: &Filter) -> bool {
    match &filter.value {
        FilterValue::Str(needle) => {
            let ord = rpmvercmp(field, needle);
            match filter.comparison {
                ComparisonKind::Eq => ord == Ordering::Equal,
                ComparisonKind::Neq => ord != Ordering::Equal,
                ComparisonKind::Lt => ord == Ordering::Less,
                ComparisonKind::Gt => ord == Ordering::Greater,
                ComparisonKind::Le => ord != Ordering::Greater,
                ComparisonKind::Ge => ord != Ordering::Less,
                ComparisonKind::Glob => glob_match(needle, field, filter.icase),
                ComparisonKind::Substr => field.contains(needle.as_str()),
            }
        }
        _ => false,
    }
}

fn reldep_list_matches(reldeps: &[Reldep], filter: &Filter) -> bool {
    let names: Vec<&str> = reldeps.iter().map(|r| r.name.as_str()).collect();
    match &filter.value {
        FilterValue::Str(needle) => names.iter().any(|n| str_cmp(n, needle, filter.comparison, filter.icase)),
        FilterValue::StrList(needles) => needles
            .iter()
            .any(|needle| names.iter().any(|n| str_cmp(n, needle, filter.comparison, filter.icase))),
        FilterValue::Reldep(needle) => names.contains(&needle.name.as_str()),
        FilterValue::ReldepList(needles) => needles.iter().any(|needle| names.contains(&needle.name.as_str())),
        _ => false,
    }
}

/// Filters applied per-solvable, independent of the rest of the result set.
fn matches_filter(sack: &Sack, id: SolvableId, filter: &Filter) -> bool {
    let solvable = sack.solvable(id);
    match filter.key {
        FilterKey::Name => str_field_matches(solvable.name.as_str(), filter),
        FilterKey::Arch => str_field_matches(solvable.arch.as_str(), filter),
        FilterKey::Epoch => match &filter.value {
            FilterValue::Num(n) => match filter.comparison {
                ComparisonKind::Eq => solvable.evr.epoch as i64 == *n,
                ComparisonKind::Neq => solvable.evr.epoch as i64 != *n,
                ComparisonKind::Lt => (solvable.evr.epoch as i64) < *n,
                ComparisonKind::Gt => (solvable.evr.epoch as i64) > *n,
                ComparisonKind::Le => (solvable.evr.epoch as i64) <= *n,
                ComparisonKind::Ge => (solvable.evr.epoch as i64) >= *n,
                _ => false,
            },
            _ => false,
        },
        FilterKey::Version => version_field_matches(solvable.evr.version.as_str(), filter),
        FilterKey::Release => version_field_matches(solvable.evr.release.as_str(), filter),
        FilterKey::Evr => version_field_matches(&solvable.evr.to_string(), filter),
        FilterKey::Nevra | FilterKey::NevraStrict => {
            let nevra = format!("{}-{}.{}", solvable.name, solvable.evr, solvable.arch);
            str_field_matches(&nevra, filter)
        }
        FilterKey::Sourcerpm => str_field_matches(&solvable.sourcerpm, filter),
        FilterKey::Reponame => {
            let repo = &sack.repos()[solvable.source_repo_id.index()];
            str_field_matches(&repo.name, filter)
        }
        FilterKey::Provides => reldep_list_matches(&solvable.provides, filter),
        FilterKey::Requires => reldep_list_matches(&solvable.requires, filter),
        FilterKey::Conflicts => reldep_list_matches(&solvable.conflicts, filter),
        FilterKey::Obsoletes => reldep_list_matches(&solvable.obsoletes, filter),
        FilterKey::Recommends => reldep_list_matches(&solvable.recommends, filter),
        FilterKey::Suggests => reldep_list_matches(&solvable.suggests, filter),
        FilterKey::Supplements => reldep_list_matches(&solvable.supplements, filter),
        FilterKey::Enhances => reldep_list_matches(&solvable.enhances, filter),
        FilterKey::Description => str_field_matches(&solvable.description, filter),
        FilterKey::Summary => str_field_matches(&solvable.summary, filter),
        FilterKey::Url => str_field_matches(&solvable.url, filter),
        FilterKey::Location => str_field_matches(&solvable.location, filter),
        // `file`/`advisory` need per-solvable filelists/updateinfo attribution,
        // which this workspace's metadata sources do not yet provide
        // (§4.1's optional extensions return repo-wide opaque content, not
        // indexed by solvable) — never match rather than silently lie.
        FilterKey::File | FilterKey::Advisory => false,
        FilterKey::Latest
        | FilterKey::LatestPerArch
        | FilterKey::Downgradable
        | FilterKey::Upgradable
        | FilterKey::Downgrades
        | FilterKey::Upgrades
        | FilterKey::Empty => true,
    }
}

/// Filters whose effect depends on the whole result set so far, applied
/// as a second pass after every per-solvable filter has narrowed it.
fn apply_set_filter(sack: &Sack, ids: Vec<SolvableId>, filter: &Filter) -> Vec<SolvableId> {
    let want = matches!(filter.value, FilterValue::Bool(true));
    match filter.key {
        FilterKey::Empty => {
            if want {
                Vec::new()
            } else {
                ids
            }
        }
        FilterKey::Latest => {
            if !want {
                return ids;
            }
            latest_grouped(sack, ids, |s| s.name.as_str().to_string())
        }
        FilterKey::LatestPerArch => {
            if !want {
                return ids;
            }
            latest_grouped(sack, ids, |s| format!("{}\0{}", s.name.as_str(), s.arch.as_str()))
        }
        FilterKey::Upgradable | FilterKey::Upgrades => {
            if !want {
                return ids;
            }
            ids.into_iter()
                .filter(|id| is_relative_to_installed(sack, *id, Ordering::Greater))
                .collect()
        }
        FilterKey::Downgradable | FilterKey::Downgrades => {
            if !want {
                return ids;
            }
            ids.into_iter()
                .filter(|id| is_relative_to_installed(sack, *id, Ordering::Less))
                .collect()
        }
        _ => ids,
    }
}

fn is_relative_to_installed(sack: &Sack, id: SolvableId, want: Ordering) -> bool {
    let solvable = sack.solvable(id);
    if sack.repos()[solvable.source_repo_id.index()].is_system() {
        return false;
    }
    sack.ids_by_name(&solvable.name).into_iter().any(|other| {
        let other_solvable = sack.solvable(other);
        sack.repos()[other_solvable.source_repo_id.index()].is_system()
            && cmp_evr(solvable, other_solvable) == want
    })
}

fn latest_grouped(sack: &Sack, ids: Vec<SolvableId>, key: impl Fn(&Solvable) -> String) -> Vec<SolvableId> {
    let mut groups: HashMap<String, Vec<SolvableId>> = HashMap::new();
    for id in ids {
        groups.entry(key(sack.solvable(id))).or_default().push(id);
    }
    let mut result = Vec::new();
    for mut group in groups.into_values() {
        group.sort_by(|a, b| cmp_evr(sack.solvable(*a), sack.solvable(*b)));
        if let Some(best) = group.last() {
            let best_evr = evr_key(sack.solvable(*best));
            result.extend(group.into_iter().filter(|id| evr_key(sack.solvable(*id)) == best_evr));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnf_sack::{InMemoryMetadataSource, LoadFlags, SolvableRecord};
    use testresult::TestResult;

    fn record(name: &str, version: &str) -> SolvableRecord {
        SolvableRecord {
            name: name.to_string(),
            version: version.to_string(),
            release: "1".to_string(),
            arch: "x86_64".to_string(),
            ..SolvableRecord::default()
        }
    }

    #[test]
    fn filter_order_does_not_affect_result() -> TestResult {
        let mut sack = Sack::new();
        let source = InMemoryMetadataSource::new(
            "cksum",
            vec![record("curl", "8.0"), record("curl-minimal", "8.0"), record("wget", "1.2")],
        );
        sack.load_repo("fedora", &source, LoadFlags::default())?;
        sack.make_considered_ready();

        let f1 = Filter::new(FilterKey::Name, ComparisonKind::Glob, FilterValue::Str("curl*".to_string()))?;
        let f2 = Filter::new(FilterKey::Arch, ComparisonKind::Eq, FilterValue::Str("x86_64".to_string()))?;

        let a = Query::new(&sack).filter(f1.clone()).filter(f2.clone()).run();
        let b = Query::new(&sack).filter(f2).filter(f1).run();
        let mut a_sorted = a.clone();
        let mut b_sorted = b.clone();
        a_sorted.sort();
        b_sorted.sort();
        assert_eq!(a_sorted, b_sorted);
        assert_eq!(a.len(), 2);
        Ok(())
    }

    #[test]
    fn latest_keeps_only_the_newest_evr() -> TestResult {
        let mut sack = Sack::new();
        let source = InMemoryMetadataSource::new("cksum", vec![record("curl", "7.0"), record("curl", "8.0")]);
        sack.load_repo("fedora", &source, LoadFlags::default())?;
        sack.make_considered_ready();

        let latest = Filter::new(FilterKey::Latest, ComparisonKind::Eq, FilterValue::Bool(true))?;
        let results = Query::new(&sack).filter(latest).run();
        assert_eq!(results.len(), 1);
        assert_eq!(sack.solvable(results[0]).evr.version.as_str(), "8.0");
        Ok(())
    }

    #[test]
    fn adding_a_filter_invalidates_the_cached_result() -> TestResult {
        let mut sack = Sack::new();
        let source = InMemoryMetadataSource::new("cksum", vec![record("curl", "8.0"), record("wget", "1.2")]);
        sack.load_repo("fedora", &source, LoadFlags::default())?;
        sack.make_considered_ready();

        let query = Query::new(&sack);
        assert_eq!(query.run().len(), 2);
        let narrowed = query.filter(Filter::new(FilterKey::Name, ComparisonKind::Eq, FilterValue::Str("curl".to_string()))?);
        assert_eq!(narrowed.run().len(), 1);
        Ok(())
    }
}
