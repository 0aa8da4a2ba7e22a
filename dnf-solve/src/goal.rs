//! The public driver (§4.3): accumulates jobs, runs the solver once, and
//! exposes the classified result.

use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};

use dnf_common::Error;
use dnf_query::Selector;
use dnf_sack::{Sack, SolvableId};
use resolvo::{ConditionalRequirement, Problem, Requirement, UnsolvableOrCancelled};

use crate::provider::DnfDependencyProvider;
use crate::solution::{self, ResolvedAction};

/// Something a job can target: an already-resolved package, or a [`Selector`]
/// resolved against the sack when the goal runs.
#[derive(Clone, Debug)]
pub enum JobTarget {
    /// Resolve this selector at run time.
    Selector(Selector),
    /// Act on this exact solvable.
    Id(SolvableId),
}

impl From<Selector> for JobTarget {
    fn from(selector: Selector) -> Self {
        JobTarget::Selector(selector)
    }
}

impl From<SolvableId> for JobTarget {
    fn from(id: SolvableId) -> Self {
        JobTarget::Id(id)
    }
}

impl JobTarget {
    fn resolve(&self, sack: &Sack) -> Result<SolvableId, Error> {
        match self {
            JobTarget::Selector(selector) => selector.resolve(sack),
            JobTarget::Id(id) => Ok(*id),
        }
    }
}

/// Flags controlling how [`Goal::run`] builds the `resolvo` problem, mapped
/// one-to-one onto dnf's own run flags.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunFlags {
    /// Allow removing packages that aren't forced out by a conflict
    /// (otherwise dropping a now-unneeded dependency is left as a report,
    /// not a removal — see [`ResolvedAction::NoLongerRequired`]).
    pub allow_uninstall: bool,
    /// For `upgrade`/`upgrade_all` jobs, require the *highest* available
    /// version rather than any version at or above what's installed.
    pub force_best: bool,
    /// Re-verify every installed package's dependencies are still satisfied
    /// even if no job targets it.
    pub verify: bool,
    /// Don't realize `Recommends`/`Supplements` as requirements.
    pub ignore_weak_deps: bool,
    /// Allow an explicit `upgrade`/`upgrade_all` job to move a package
    /// backward if that's the only way to satisfy everything else.
    pub allow_downgrade: bool,
}

/// Accumulates install/erase/upgrade/lock/favor jobs against one [`Sack`] and
/// resolves them into a single, explainable transaction.
pub struct Goal<'sack> {
    sack: &'sack Sack,
    installs: Vec<(JobTarget, bool)>,
    erases: Vec<(JobTarget, bool)>,
    upgrades: Vec<JobTarget>,
    upgrade_all: bool,
    distupgrades: Vec<JobTarget>,
    distupgrade_all: bool,
    locked: HashSet<SolvableId>,
    favored: HashSet<SolvableId>,
    protected: HashSet<SolvableId>,
    userinstalled: Vec<JobTarget>,
    exclude_from_weak: HashSet<String>,
    problems: Vec<String>,
    actions: Vec<ResolvedAction>,
    reinstalls: Vec<SolvableId>,
}

impl<'sack> Goal<'sack> {
    /// Starts an empty goal over `sack`.
    pub fn new(sack: &'sack Sack) -> Self {
        Goal {
            sack,
            installs: Vec::new(),
            erases: Vec::new(),
            upgrades: Vec::new(),
            upgrade_all: false,
            distupgrades: Vec::new(),
            distupgrade_all: false,
            locked: HashSet::new(),
            favored: HashSet::new(),
            protected: HashSet::new(),
            userinstalled: Vec::new(),
            exclude_from_weak: HashSet::new(),
            problems: Vec::new(),
            actions: Vec::new(),
            reinstalls: Vec::new(),
        }
    }

    /// Requires `target` to end up installed. When `strict` is `false`, a
    /// target that resolves to no package is skipped rather than failing
    /// the whole goal.
    pub fn install(&mut self, target: impl Into<JobTarget>, strict: bool) {
        self.installs.push((target.into(), strict));
    }

    /// Requires `target` to end up absent. `clean_deps` additionally
    /// reclassifies that package's now-unneeded dependencies as
    /// [`ResolvedAction::Removed`] instead of leaving them as
    /// [`ResolvedAction::NoLongerRequired`].
    pub fn erase(&mut self, target: impl Into<JobTarget>, clean_deps: bool) {
        self.erases.push((target.into(), clean_deps));
    }

    /// Allows `target`'s installed package to move to a newer version; a
    /// no-op if `target` isn't currently installed (per §4.3, `upgrade` never
    /// installs a package that wasn't already present).
    pub fn upgrade(&mut self, target: impl Into<JobTarget>) {
        self.upgrades.push(target.into());
    }

    /// Requires every installed package to move to its best available
    /// version where possible.
    pub fn upgrade_all(&mut self) {
        self.upgrade_all = true;
    }

    /// Like [`Goal::upgrade`], but also allows moving `target` backward if
    /// that's the best available candidate (e.g. after a repo swap).
    pub fn distupgrade(&mut self, target: impl Into<JobTarget>) {
        self.distupgrades.push(target.into());
    }

    /// Like [`Goal::upgrade_all`], but allows any installed package to move
    /// backward.
    pub fn distupgrade_all(&mut self) {
        self.distupgrade_all = true;
    }

    /// Pins `id`'s name to exactly its current EVR: no job can move it.
    pub fn lock(&mut self, id: SolvableId) {
        self.locked.insert(id);
    }

    /// Nudges the solver to prefer `id` over sibling candidates of the same
    /// name when more than one would otherwise satisfy a requirement.
    pub fn favor(&mut self, id: SolvableId) {
        self.favored.insert(id);
    }

    /// Cancels a prior [`Goal::favor`] for `id`. `resolvo` exposes no
    /// negative candidate bias, so this only removes the preference; it
    /// cannot push the solver away from `id`.
    pub fn disfavor(&mut self, id: SolvableId) {
        self.favored.remove(&id);
    }

    /// Adds names whose weak dependencies (`Recommends`/`Supplements`) are
    /// never realized as requirements, regardless of `RunFlags`.
    pub fn add_exclude_from_weak(&mut self, names: impl IntoIterator<Item = String>) {
        self.exclude_from_weak.extend(names);
    }

    /// Clears the exclude-from-weak set.
    pub fn reset_exclude_from_weak(&mut self) {
        self.exclude_from_weak.clear();
    }

    /// Adds packages the goal must keep installed at no lower than their
    /// current version; if that turns out to be impossible the goal fails
    /// with a diagnosable problem rather than silently removing them.
    pub fn add_protected(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        self.protected.extend(ids);
    }

    /// Records `target` to be marked user-installed once the transaction
    /// commits, so a later autoremove pass won't consider it orphaned just
    /// because nothing currently requires it. Purely a bookkeeping job: it
    /// does not influence this run's solve.
    pub fn userinstalled(&mut self, target: impl Into<JobTarget>) {
        self.userinstalled.push(target.into());
    }

    /// Every package queued by [`Goal::userinstalled`] that resolved
    /// successfully against the sack.
    pub fn list_userinstalled(&self) -> Vec<SolvableId> {
        self.userinstalled.iter().filter_map(|target| target.resolve(self.sack).ok()).collect()
    }

    /// Builds the `resolvo` problem from every accumulated job and solves
    /// it. Returns `Ok(true)` with the solution available through the
    /// `list_*` accessors, or `Ok(false)` with `count_problems()` /
    /// `describe_problem_rules()` populated. `Err` is reserved for a job
    /// whose target couldn't even be evaluated (e.g. a malformed selector).
    pub fn run(&mut self, flags: RunFlags) -> Result<bool, Error> {
        self.problems.clear();
        self.actions.clear();
        self.reinstalls.clear();

        let installed: Vec<SolvableId> = self
            .sack
            .considered_ids()
            .filter(|&id| self.sack.repos()[self.sack.solvable(id).source_repo_id.index()].is_system())
            .collect();

        let provider = DnfDependencyProvider::new(self.sack, !flags.ignore_weak_deps, self.exclude_from_weak.clone(), self.favored.clone(), self.locked.clone());

        let mut requirements = Vec::new();
        let mut soft_requirements = Vec::new();
        let mut explicitly_targeted: HashSet<String> = HashSet::new();
        let mut reinstall_targets: HashSet<SolvableId> = HashSet::new();

        for (target, strict) in &self.installs {
            match target.resolve(self.sack) {
                Ok(id) => {
                    explicitly_targeted.insert(self.sack.solvable(id).name.as_str().to_string());
                    if installed.contains(&id) {
                        reinstall_targets.insert(id);
                    }
                    if let Some(version_set) = provider.exact_version_set(id) {
                        requirements.push(single(version_set));
                    }
                }
                Err(error) => {
                    if *strict {
                        return Err(error);
                    }
                    log::warn!("skipping unresolvable install job: {error}");
                }
            }
        }

        let erase_ids: HashSet<SolvableId> = self.erases.iter().filter_map(|(target, _)| target.resolve(self.sack).ok()).collect();

        for &id in &self.protected {
            if erase_ids.contains(&id) {
                let solvable = self.sack.solvable(id);
                return Err(Error::RemovalOfProtectedPkg {
                    nevra: format!("{}-{}.{}", solvable.name, solvable.evr, solvable.arch),
                });
            }
        }

        for target in &self.upgrades {
            if let Ok(id) = target.resolve(self.sack) {
                if !installed.contains(&id) {
                    continue;
                }
                explicitly_targeted.insert(self.sack.solvable(id).name.as_str().to_string());
                let version_set = if flags.force_best {
                    provider.unconstrained_version_set(&self.sack.solvable(id).name)
                } else if let Some(version_set) = provider.at_least_version_set(id) {
                    version_set
                } else {
                    continue;
                };
                requirements.push(single(version_set));
            }
        }

        for target in &self.distupgrades {
            if let Ok(id) = target.resolve(self.sack) {
                if !installed.contains(&id) {
                    continue;
                }
                explicitly_targeted.insert(self.sack.solvable(id).name.as_str().to_string());
                requirements.push(single(provider.unconstrained_version_set(&self.sack.solvable(id).name)));
            }
        }

        for &id in &self.protected {
            explicitly_targeted.insert(self.sack.solvable(id).name.as_str().to_string());
            let version_set = if flags.allow_downgrade { provider.unconstrained_version_set(&self.sack.solvable(id).name) } else { provider.at_least_version_set(id) };
            if let Some(version_set) = version_set {
                requirements.push(single(version_set));
            }
        }

        for &id in &installed {
            if erase_ids.contains(&id) {
                continue;
            }
            let name = self.sack.solvable(id).name.clone();
            if explicitly_targeted.contains(name.as_str()) {
                continue;
            }
            if self.upgrade_all {
                let version_set = if flags.force_best {
                    provider.unconstrained_version_set(&name)
                } else if let Some(version_set) = provider.at_least_version_set(id) {
                    version_set
                } else {
                    continue;
                };
                requirements.push(single(version_set));
            } else if self.distupgrade_all {
                requirements.push(single(provider.unconstrained_version_set(&name)));
            } else if flags.verify {
                if let Some(version_set) = provider.exact_version_set(id) {
                    requirements.push(single(version_set));
                }
            } else if let Some(resolvo_id) = provider.resolvo_id(id) {
                soft_requirements.push(resolvo_id);
            }
        }

        let mut solver = resolvo::Solver::new(provider);
        let problem = Problem::new().requirements(requirements).soft_requirements(soft_requirements);
        let raw_solution = match solver.solve(problem) {
            Ok(solution) => solution,
            Err(UnsolvableOrCancelled::Unsolvable(unsat)) => {
                self.problems.push(unsat.display_user_friendly(&solver).to_string());
                return Ok(false);
            }
            Err(UnsolvableOrCancelled::Cancelled(_)) => unreachable!("the goal never cancels its own solve"),
        };

        let mut actions = solution::diff(solver.provider(), &installed, &raw_solution);
        let clean_deps = self.erases.iter().any(|(_, clean_deps)| *clean_deps);
        for action in &mut actions {
            if let ResolvedAction::NoLongerRequired { id } = *action {
                if clean_deps || erase_ids.contains(&id) {
                    *action = ResolvedAction::Removed { id, forced_by: std::collections::HashMap::new() };
                }
            }
        }

        if !flags.allow_uninstall {
            let cascaded = actions.iter().any(|action| {
                let removed = matches!(action, ResolvedAction::Removed { .. } | ResolvedAction::NoLongerRequired { .. });
                removed && !erase_ids.contains(&action.package())
            });
            if cascaded {
                self.problems.push("removing the requested package(s) would also remove other installed packages; pass allow_uninstall to permit this".to_string());
                return Ok(false);
            }
        }

        self.reinstalls = actions.iter().filter_map(|a| if let ResolvedAction::Unchanged { id } = a { Some(*id) } else { None }).filter(|id| reinstall_targets.contains(id)).collect();
        self.actions = actions;
        Ok(true)
    }

    /// How many independent unsatisfiability diagnostics the last failed
    /// [`Goal::run`] produced. `resolvo` currently renders its whole
    /// explanation as one block, so this is `0` or `1`.
    pub fn count_problems(&self) -> usize {
        self.problems.len()
    }

    /// The formatted rule trace for problem `index`. `include_modules` is
    /// accepted for parity with dnf's own diagnostics API but unused here:
    /// module-aware filtering of the trace is the module subsystem's concern.
    pub fn describe_problem_rules(&self, index: usize, include_modules: bool) -> Option<&str> {
        let _ = include_modules;
        self.problems.get(index).map(String::as_str)
    }

    /// Every package a successful run must newly install.
    pub fn list_installs(&self) -> Vec<SolvableId> {
        self.actions.iter().filter_map(|a| if let ResolvedAction::Install { id } = a { Some(*id) } else { None }).collect()
    }

    /// Every `(from, to)` upgrade pair a successful run must perform.
    pub fn list_upgrades(&self) -> Vec<(SolvableId, SolvableId)> {
        self.actions.iter().filter_map(|a| if let ResolvedAction::Upgraded { to, from } = a { Some((*from, *to)) } else { None }).collect()
    }

    /// Every `(from, to)` downgrade pair a successful run must perform.
    pub fn list_downgrades(&self) -> Vec<(SolvableId, SolvableId)> {
        self.actions.iter().filter_map(|a| if let ResolvedAction::Downgraded { to, from } = a { Some((*from, *to)) } else { None }).collect()
    }

    /// Every package a successful run must remove, forced out by a conflict
    /// or obsoletion declared by a package in the new state.
    pub fn list_erasures(&self) -> Vec<SolvableId> {
        self.actions.iter().filter_map(|a| if let ResolvedAction::Removed { id, .. } = a { Some(*id) } else { None }).collect()
    }

    /// The subset of [`Goal::list_erasures`] forced out by at least one
    /// `Obsoletes` relation rather than a plain `Conflicts`.
    pub fn list_obsoleted(&self) -> Vec<SolvableId> {
        self.actions
            .iter()
            .filter_map(|a| if let ResolvedAction::Removed { id, forced_by } = a { Some((*id, forced_by)) } else { None })
            .filter(|(_, forced_by)| forced_by.values().any(|&is_obsolete| is_obsolete))
            .map(|(id, _)| id)
            .collect()
    }

    /// The subset of [`Goal::list_obsoleted`] whose removal was specifically
    /// declared by `pkg`'s own `Obsoletes`, rather than some other package
    /// also present in the new state.
    pub fn list_obsoleted_by(&self, pkg: SolvableId) -> Vec<SolvableId> {
        let pkg_name = self.sack.solvable(pkg).name.as_str();
        self.actions
            .iter()
            .filter_map(|a| if let ResolvedAction::Removed { id, forced_by } = a { Some((*id, forced_by)) } else { None })
            .filter(|(_, forced_by)| forced_by.iter().any(|(declarer, &is_obsolete)| is_obsolete && declarer.name == pkg_name))
            .map(|(id, _)| id)
            .collect()
    }

    /// Packages no longer required by anything in the new state, left in
    /// place because no job or `clean_deps` erase targeted them.
    pub fn list_unneeded(&self) -> Vec<SolvableId> {
        self.actions.iter().filter_map(|a| if let ResolvedAction::NoLongerRequired { id } = a { Some(*id) } else { None }).collect()
    }

    /// Installed packages an explicit [`Goal::install`] job targeted by
    /// their own already-installed NEVRA: these resolve to no change in the
    /// solved state, but the caller asked for the package to be reapplied.
    pub fn list_reinstalls(&self) -> Vec<SolvableId> {
        self.reinstalls.clone()
    }

    /// Packages suggested by anything present in the new state (the
    /// `Suggests` relation), not pulled in as requirements and not already
    /// part of the solution.
    pub fn list_suggested(&self) -> Vec<SolvableId> {
        let final_set: HashSet<SolvableId> = self
            .actions
            .iter()
            .filter(|a| !matches!(a, ResolvedAction::Removed { .. } | ResolvedAction::NoLongerRequired { .. }))
            .map(ResolvedAction::package)
            .collect();

        let mut suggested = Vec::new();
        for &id in &final_set {
            for reldep in &self.sack.solvable(id).suggests {
                let Ok(name) = dnf_types::Name::new(reldep.name.clone()) else { continue };
                for candidate in self.sack.ids_by_name(&name) {
                    if final_set.contains(&candidate) || suggested.contains(&candidate) {
                        continue;
                    }
                    if reldep_satisfied(self.sack, reldep, candidate) {
                        suggested.push(candidate);
                    }
                }
            }
        }
        suggested
    }
}

/// Whether `id`'s current EVR satisfies `reldep`'s version constraint, if any.
fn reldep_satisfied(sack: &Sack, reldep: &dnf_types::Reldep, id: SolvableId) -> bool {
    if matches!(reldep.comparison, dnf_types::VersionComparison::Any) {
        return true;
    }
    let Ok((epoch, version, release)) = crate::utils::parse_partial_evr(&reldep.evr) else {
        return false;
    };
    let required = crate::types::PartialEvr::new(epoch, version, release);
    let candidate = crate::types::PartialEvr::exact(sack.solvable(id).evr.clone());
    reldep.comparison.accepts(candidate.compare_ignoring_missing_release(&required))
}

fn single(version_set: resolvo::VersionSetId) -> ConditionalRequirement {
    ConditionalRequirement { requirement: Requirement::Single(version_set), condition: None }
}

impl Debug for Goal<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Goal").field("actions", &self.actions.len()).field("problems", &self.problems.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use dnf_rpm::InMemoryRpmBackend;
    use dnf_sack::{InMemoryMetadataSource, LoadFlags, Sack, SolvableRecord};
    use dnf_types::{Evr, Name, VerString};
    use testresult::TestResult;

    use super::*;

    fn record(name: &str, version: &str) -> SolvableRecord {
        SolvableRecord { name: name.to_string(), version: version.to_string(), release: "1".to_string(), arch: "x86_64".to_string(), ..SolvableRecord::default() }
    }

    #[test]
    fn install_pulls_in_a_hard_dependency() -> TestResult {
        let mut sack = Sack::new();
        let repo = InMemoryMetadataSource::new(
            "fedora",
            vec![
                SolvableRecord { requires: vec!["libb".to_string()], ..record("liba", "1.0") },
                record("libb", "1.0"),
            ],
        );
        sack.load_repo("fedora", &repo, LoadFlags::default())?;
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.install(Selector::new().set_name("liba")?, true);
        assert!(goal.run(RunFlags::default())?);

        let installed_names: HashSet<String> = goal.list_installs().into_iter().map(|id| sack.solvable(id).name.as_str().to_string()).collect();
        assert_eq!(installed_names, HashSet::from(["liba".to_string(), "libb".to_string()]));
        Ok(())
    }

    #[test]
    fn strict_install_of_a_missing_package_fails() -> TestResult {
        let mut sack = Sack::new();
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.install(Selector::new().set_name("nonexistent")?, true);
        assert!(goal.run(RunFlags::default()).is_err());
        Ok(())
    }

    #[test]
    fn non_strict_install_of_a_missing_package_is_skipped() -> TestResult {
        let mut sack = Sack::new();
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.install(Selector::new().set_name("nonexistent")?, false);
        assert!(goal.run(RunFlags::default())?);
        assert!(goal.list_installs().is_empty());
        Ok(())
    }

    #[test]
    fn upgrade_all_moves_an_installed_package_forward() -> TestResult {
        let mut sack = Sack::new();
        let mut backend = InMemoryRpmBackend::new();
        backend.seed_installed(Name::new("pkg")?, Evr::new(0, VerString::new("1.0")?, VerString::new("1")?), "x86_64");
        sack.load_system_repo(&backend, LoadFlags::default())?;
        let repo = InMemoryMetadataSource::new("fedora", vec![record("pkg", "2.0")]);
        sack.load_repo("fedora", &repo, LoadFlags::default())?;
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.upgrade_all();
        assert!(goal.run(RunFlags::default())?);

        let upgrades = goal.list_upgrades();
        assert_eq!(upgrades.len(), 1);
        assert_eq!(sack.solvable(upgrades[0].1).evr.to_string(), "2.0-1");
        Ok(())
    }

    #[test]
    fn upgrade_of_an_uninstalled_package_is_a_no_op() -> TestResult {
        let mut sack = Sack::new();
        let repo = InMemoryMetadataSource::new("fedora", vec![record("pkg", "2.0")]);
        sack.load_repo("fedora", &repo, LoadFlags::default())?;
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.upgrade(Selector::new().set_name("pkg")?);
        assert!(goal.run(RunFlags::default())?);
        assert!(goal.list_installs().is_empty());
        assert!(goal.list_upgrades().is_empty());
        Ok(())
    }

    #[test]
    fn new_package_conflicting_with_an_installed_one_forces_its_removal() -> TestResult {
        let mut sack = Sack::new();
        let mut backend = InMemoryRpmBackend::new();
        backend.seed_installed(Name::new("old-pkg")?, Evr::new(0, VerString::new("1.0")?, VerString::new("1")?), "x86_64");
        sack.load_system_repo(&backend, LoadFlags::default())?;
        let repo = InMemoryMetadataSource::new("fedora", vec![SolvableRecord { conflicts: vec!["old-pkg".to_string()], ..record("new-pkg", "1.0") }]);
        sack.load_repo("fedora", &repo, LoadFlags::default())?;
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.install(Selector::new().set_name("new-pkg")?, true);
        assert!(goal.run(RunFlags { allow_uninstall: true, ..RunFlags::default() })?);

        let removed_names: Vec<String> = goal.list_erasures().into_iter().map(|id| sack.solvable(id).name.as_str().to_string()).collect();
        assert_eq!(removed_names, vec!["old-pkg".to_string()]);
        Ok(())
    }

    #[test]
    fn erase_drops_an_explicit_target() -> TestResult {
        let mut sack = Sack::new();
        let mut backend = InMemoryRpmBackend::new();
        backend.seed_installed(Name::new("pkg")?, Evr::new(0, VerString::new("1.0")?, VerString::new("1")?), "x86_64");
        sack.load_system_repo(&backend, LoadFlags::default())?;
        sack.make_considered_ready();

        let pkg_id = sack.ids_by_name(&Name::new("pkg")?)[0];
        let mut goal = Goal::new(&sack);
        goal.erase(pkg_id, false);
        assert!(goal.run(RunFlags::default())?);

        assert_eq!(goal.list_erasures(), vec![pkg_id]);
        Ok(())
    }

    #[test]
    fn erase_of_a_protected_package_is_rejected() -> TestResult {
        let mut sack = Sack::new();
        let mut backend = InMemoryRpmBackend::new();
        backend.seed_installed(Name::new("pkg")?, Evr::new(0, VerString::new("1.0")?, VerString::new("1")?), "x86_64");
        sack.load_system_repo(&backend, LoadFlags::default())?;
        sack.make_considered_ready();

        let pkg_id = sack.ids_by_name(&Name::new("pkg")?)[0];
        let mut goal = Goal::new(&sack);
        goal.add_protected([pkg_id]);
        goal.erase(pkg_id, false);

        match goal.run(RunFlags::default()) {
            Err(Error::RemovalOfProtectedPkg { nevra }) => assert_eq!(nevra, "pkg-1.0-1.x86_64"),
            other => panic!("expected RemovalOfProtectedPkg, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn uninstall_not_allowed_fails_when_a_job_would_cascade() -> TestResult {
        let mut sack = Sack::new();
        let mut backend = InMemoryRpmBackend::new();
        backend.seed_installed(Name::new("old-pkg")?, Evr::new(0, VerString::new("1.0")?, VerString::new("1")?), "x86_64");
        sack.load_system_repo(&backend, LoadFlags::default())?;
        let repo = InMemoryMetadataSource::new("fedora", vec![SolvableRecord { conflicts: vec!["old-pkg".to_string()], ..record("new-pkg", "1.0") }]);
        sack.load_repo("fedora", &repo, LoadFlags::default())?;
        sack.make_considered_ready();

        let mut goal = Goal::new(&sack);
        goal.install(Selector::new().set_name("new-pkg")?, true);
        assert!(!goal.run(RunFlags::default())?);
        assert_eq!(goal.count_problems(), 1);
        Ok(())
    }
}
