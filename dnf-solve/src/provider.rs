//! The `resolvo` dependency provider: translates a [`Sack`]'s considered
//! solvables into resolvo's candidate/dependency vocabulary.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};

use dnf_sack::{Sack, SolvableId};
use dnf_types::{Name, Reldep, VersionComparison};
use resolvo::utils::Pool;
use resolvo::{
    Candidates, Condition, ConditionId, ConditionalRequirement, Dependencies, DependencyProvider, HintDependenciesAvailable, Interner,
    KnownDependencies, NameId, Requirement, SolvableId as ResolvoSolvableId, SolverCache, StringId, VersionSetId, VersionSetUnionId,
};

use crate::types::{CandidateRecord, DepSpec};
use crate::utils::sort_candidates;

/// Maps `Obsoletes`/`Conflicts` targets back to the declaring package, so a
/// package the solver drops from the considered set can be told apart from
/// one it actively obsoletes or conflicts with.
pub(crate) type ConflictsMap = HashMap<Reldep, HashMap<Reldep, bool>>;

/// A `resolvo::DependencyProvider` over a [`Sack`]'s considered solvables.
///
/// Every candidate is interned once, up front, from [`Sack::considered_ids`];
/// the sack itself must already have a fresh considered set (see that
/// method's contract) before a provider is built from it.
pub struct DnfDependencyProvider<'sack> {
    pub(crate) sack: &'sack Sack,
    pub(crate) pool: Pool<DepSpec, String>,
    records: HashMap<NameId, Candidates>,
    requires: HashMap<ResolvoSolvableId, Vec<Reldep>>,
    conflicts: HashMap<ResolvoSolvableId, Vec<Reldep>>,
    obsoletes: HashMap<ResolvoSolvableId, Vec<Reldep>>,
    weak: HashMap<ResolvoSolvableId, Vec<Reldep>>,
    installed_names: HashSet<String>,
    weak_excluded_names: HashSet<String>,
    include_weak_deps: bool,
    pub(crate) conflicts_map: ConflictsMap,
    pub(crate) real_by_id: HashMap<SolvableId, ResolvoSolvableId>,
}

impl<'sack> DnfDependencyProvider<'sack> {
    /// Interns every solvable `sack.considered_ids()` yields.
    ///
    /// `include_weak_deps` gates whether `Recommends`/`Supplements` are
    /// realized as ordinary requirements (the `IGNORE_WEAK_DEPS` run flag
    /// maps to `false` here); `weak_excluded_names` additionally drops any
    /// weak dependency on a name in the set regardless of that flag.
    pub fn new(
        sack: &'sack Sack,
        include_weak_deps: bool,
        weak_excluded_names: HashSet<String>,
        favored: HashSet<SolvableId>,
        locked: HashSet<SolvableId>,
    ) -> Self {
        let mut provider = DnfDependencyProvider {
            sack,
            pool: Pool::default(),
            records: HashMap::new(),
            requires: HashMap::new(),
            conflicts: HashMap::new(),
            obsoletes: HashMap::new(),
            weak: HashMap::new(),
            installed_names: HashSet::new(),
            weak_excluded_names,
            include_weak_deps,
            conflicts_map: HashMap::new(),
            real_by_id: HashMap::new(),
        };
        provider.ingest(&favored, &locked);
        provider
    }

    fn ingest(&mut self, favored: &HashSet<SolvableId>, locked: &HashSet<SolvableId>) {
        for id in self.sack.considered_ids() {
            let solvable = self.sack.solvable(id);
            if self.sack.repos()[solvable.source_repo_id.index()].is_system() {
                self.installed_names.insert(solvable.name.as_str().to_string());
            }
        }
        for id in self.sack.considered_ids() {
            self.intern_real(id, favored, locked);
        }
        for candidates in self.records.values_mut() {
            candidates.hint_dependencies_available = HintDependenciesAvailable::All;
        }
    }

    fn intern_real(&mut self, id: SolvableId, favored: &HashSet<SolvableId>, locked: &HashSet<SolvableId>) {
        let solvable = self.sack.solvable(id);
        let name_id = self.pool.intern_package_name(solvable.name.as_str().to_string());
        let resolvo_id = self.pool.intern_solvable(name_id, CandidateRecord::Real(id));
        let entry = self.records.entry(name_id).or_default();
        entry.candidates.push(resolvo_id);
        if favored.contains(&id) {
            entry.favored = Some(resolvo_id);
        }
        if locked.contains(&id) {
            entry.locked = Some(resolvo_id);
        }
        self.real_by_id.insert(id, resolvo_id);

        self.requires.insert(resolvo_id, solvable.requires.clone());
        self.conflicts.insert(resolvo_id, solvable.conflicts.clone());
        self.obsoletes.insert(resolvo_id, solvable.obsoletes.clone());
        let mut weak = solvable.recommends.clone();
        weak.extend(solvable.supplements.clone());
        self.weak.insert(resolvo_id, weak);

        let own_relation = Reldep::constrained(solvable.name.as_str(), VersionComparison::Eq, solvable.evr.to_string());
        for conflict in &solvable.conflicts {
            self.conflicts_map.entry(conflict.clone()).or_default().entry(own_relation.clone()).or_insert(false);
        }
        for obsolete in &solvable.obsoletes {
            let entry = self.conflicts_map.entry(obsolete.clone()).or_default().entry(own_relation.clone()).or_insert(false);
            *entry = true;
        }

        for provide in &solvable.provides {
            let version = if matches!(provide.comparison, VersionComparison::Any) {
                None
            } else {
                crate::utils::parse_partial_evr(&provide.evr).ok().map(|(epoch, version, release)| crate::types::PartialEvr::new(epoch, version, release))
            };
            let virtual_name_id = self.pool.intern_package_name(provide.name.clone());
            let virtual_id = self.pool.intern_solvable(virtual_name_id, CandidateRecord::Virtual { owner: id, version });
            self.records.entry(virtual_name_id).or_default().candidates.push(virtual_id);
        }
    }

    /// The highest version any interned candidate of `name` carries, used to
    /// resolve `FORCE_BEST`/`distupgrade` targets to a concrete requirement.
    pub fn highest_version(&self, name: &str) -> Option<dnf_types::Evr> {
        let name_id = self.pool.intern_package_name(name.to_string());
        self.records
            .get(&name_id)?
            .candidates
            .iter()
            .filter_map(|&id| match &self.pool.resolve_solvable(id).record {
                CandidateRecord::Real(solvable_id) => Some(self.sack.solvable(*solvable_id).evr.clone()),
                CandidateRecord::Virtual { .. } => None,
            })
            .max()
    }

    /// The resolvo id for a package already interned from `sack`, if any
    /// (every considered solvable is interned, so this is infallible for
    /// ids drawn from the same sack the provider was built from).
    pub fn resolvo_id(&self, id: SolvableId) -> Option<ResolvoSolvableId> {
        self.real_by_id.get(&id).copied()
    }

    /// Interns (or looks up) the name-scoped version set for `name`,
    /// unconstrained — used to add a root requirement/soft-requirement for a
    /// whole name rather than one already-resolved solvable.
    pub fn unconstrained_version_set(&self, name: &Name) -> VersionSetId {
        let name_id = self.pool.intern_package_name(name.as_str().to_string());
        self.pool.intern_version_set(name_id, DepSpec::any(false))
    }

    /// Interns the version set matching exactly `id`'s current name/EVR —
    /// used to pin a `lock` job or an explicit by-id install to one version.
    pub(crate) fn exact_version_set(&self, id: SolvableId) -> Option<VersionSetId> {
        let solvable = self.sack.solvable(id);
        self.version_set_for(&Reldep::constrained(solvable.name.as_str(), VersionComparison::Eq, solvable.evr.to_string()), false)
    }

    /// Interns the version set matching `id`'s name at its current EVR or
    /// newer — the floor an `upgrade` job adds so the solver can raise but
    /// never lower that package's version.
    pub(crate) fn at_least_version_set(&self, id: SolvableId) -> Option<VersionSetId> {
        let solvable = self.sack.solvable(id);
        self.version_set_for(&Reldep::constrained(solvable.name.as_str(), VersionComparison::Ge, solvable.evr.to_string()), false)
    }

    pub(crate) fn version_set_for(&self, reldep: &Reldep, conflict: bool) -> Option<VersionSetId> {
        let spec = match DepSpec::from_reldep(reldep, conflict) {
            Ok(spec) => spec,
            Err(error) => {
                log::warn!("skipping malformed reldep '{reldep}': {error}");
                return None;
            }
        };
        let name_id = self.pool.intern_package_name(reldep.name.clone());
        Some(self.pool.intern_version_set(name_id, spec))
    }
}

impl Interner for DnfDependencyProvider<'_> {
    fn display_solvable(&self, solvable: ResolvoSolvableId) -> impl Display + '_ {
        self.pool.resolve_solvable(solvable).record.display(self.sack)
    }

    fn display_name(&self, name: NameId) -> impl Display + '_ {
        self.pool.resolve_package_name(name)
    }

    fn display_version_set(&self, version_set: VersionSetId) -> impl Display + '_ {
        self.pool.resolve_version_set(version_set)
    }

    fn display_string(&self, string_id: StringId) -> impl Display + '_ {
        self.pool.resolve_string(string_id)
    }

    fn version_set_name(&self, version_set: VersionSetId) -> NameId {
        self.pool.resolve_version_set_package_name(version_set)
    }

    fn solvable_name(&self, solvable: ResolvoSolvableId) -> NameId {
        self.pool.resolve_solvable(solvable).name
    }

    fn version_sets_in_union(&self, version_set_union: VersionSetUnionId) -> impl Iterator<Item = VersionSetId> {
        self.pool.resolve_version_set_union(version_set_union)
    }

    fn resolve_condition(&self, condition: ConditionId) -> Condition {
        self.pool.resolve_condition(condition).clone()
    }
}

impl DependencyProvider for DnfDependencyProvider<'_> {
    async fn filter_candidates(&self, candidates: &[ResolvoSolvableId], version_set: VersionSetId, inverse: bool) -> Vec<ResolvoSolvableId> {
        let spec = self.pool.resolve_version_set(version_set);
        candidates.iter().copied().filter(|&solvable| spec.matches(self.sack, &self.pool.resolve_solvable(solvable).record) ^ inverse).collect()
    }

    async fn get_candidates(&self, name: NameId) -> Option<Candidates> {
        self.records.get(&name).cloned()
    }

    async fn sort_candidates(&self, _cache: &SolverCache<Self>, solvables: &mut [ResolvoSolvableId]) {
        sort_candidates(self.sack, &self.pool, &self.installed_names, solvables);
    }

    async fn get_dependencies(&self, solvable: ResolvoSolvableId) -> Dependencies {
        let mut known = KnownDependencies::default();
        let record = self.pool.resolve_solvable(solvable).record.clone();

        match record {
            CandidateRecord::Real(_) => {
                let Some(requires) = self.requires.get(&solvable) else {
                    let name = self.pool.resolve_package_name(self.pool.resolve_solvable(solvable).name);
                    let reason = self.pool.intern_string(format!("no dependency lookup entry for {name}"));
                    return Dependencies::Unknown(reason);
                };
                for reldep in requires {
                    if let Some(version_set) = self.version_set_for(reldep, false) {
                        known.requirements.push(ConditionalRequirement { requirement: Requirement::Single(version_set), condition: None });
                    }
                }

                if self.include_weak_deps {
                    if let Some(weak) = self.weak.get(&solvable) {
                        for reldep in weak {
                            if self.weak_excluded_names.contains(&reldep.name) {
                                continue;
                            }
                            if let Some(version_set) = self.version_set_for(reldep, false) {
                                known.requirements.push(ConditionalRequirement { requirement: Requirement::Single(version_set), condition: None });
                            }
                        }
                    }
                }

                if let Some(conflicts) = self.conflicts.get(&solvable) {
                    for reldep in conflicts {
                        if let Some(version_set) = self.version_set_for(reldep, true) {
                            known.constrains.push(version_set);
                        }
                    }
                }
                if let Some(obsoletes) = self.obsoletes.get(&solvable) {
                    for reldep in obsoletes {
                        if let Some(version_set) = self.version_set_for(reldep, true) {
                            known.constrains.push(version_set);
                        }
                    }
                }
            }
            CandidateRecord::Virtual { owner, .. } => {
                // Depending on a virtual candidate is equivalent to depending
                // on the exact real package that provides it.
                let owner_solvable = self.sack.solvable(owner);
                let name_id = self.pool.intern_package_name(owner_solvable.name.as_str().to_string());
                let spec = DepSpec::from_reldep(&Reldep::constrained(owner_solvable.name.as_str(), VersionComparison::Eq, owner_solvable.evr.to_string()), false)
                    .expect("a solvable's own name/evr always parses");
                let version_set = self.pool.intern_version_set(name_id, spec);
                known.requirements.push(ConditionalRequirement { requirement: Requirement::Single(version_set), condition: None });
            }
        }

        Dependencies::Known(known)
    }
}

impl Debug for DnfDependencyProvider<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnfDependencyProvider").finish_non_exhaustive()
    }
}
