//! The module container: the state machine, defaults reconciliation, active
//! module resolution and the RPM-level visibility filter it produces (§4.2).

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use dnf_common::{Error, ModuleErrorKind};
use dnf_sack::{RepoId, RepoKind, Sack, SolvableId};
use dnf_types::{Nevra, NevraForm};

use crate::document::{ModuleDefaults, ModuleDocument};
use crate::metadata::ModuleMetadataSource;
use crate::state::{read_state_dir, ModuleRecord, ModuleState};

/// A single problem surfaced by [`ModuleContainer::resolve_active`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModuleProblem {
    /// A human-readable description of the conflict.
    pub message: String,
}

/// The sets [`ModuleContainer::compute_rpm_filter`] produces, per §4.2 steps 2-8.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RpmFilterPlan {
    /// Solvables belonging to active modules' artifacts (step 2).
    pub include_ids: Vec<SolvableId>,
    /// Candidates whose RPM name is referenced by an inactive module only (step 6).
    pub name_exclude_ids: Vec<SolvableId>,
    /// Candidates that Provide a name referenced by an inactive module only (step 7).
    pub provides_exclude_ids: Vec<SolvableId>,
    /// Candidates whose full NEVRA belongs to an inactive module's artifacts (step 8).
    pub nevra_exclude_ids: Vec<SolvableId>,
}

impl RpmFilterPlan {
    /// The union of every exclude set (step 9), deduplicated.
    pub fn all_excludes(&self) -> Vec<SolvableId> {
        let mut seen = BTreeSet::new();
        self.name_exclude_ids
            .iter()
            .chain(&self.provides_exclude_ids)
            .chain(&self.nevra_exclude_ids)
            .copied()
            .filter(|id| seen.insert(id.index()))
            .collect()
    }
}

/// The module state machine and the active-module resolver (§4.2).
#[derive(Debug, Default)]
pub struct ModuleContainer {
    documents: Vec<ModuleDocument>,
    raw_defaults: Vec<ModuleDefaults>,
    defaults: HashMap<String, ModuleDefaults>,
    records: HashMap<String, ModuleRecord>,
    on_disk_streams: HashMap<String, Option<String>>,
    reset_this_session: HashSet<String>,
    platform: Option<(String, String)>,
    /// The name→stream map computed by the last [`ModuleContainer::resolve_active`] call.
    active_cache: HashMap<String, String>,
}

impl ModuleContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        ModuleContainer::default()
    }

    /// Harvests modulemd documents from every non-system repo in `sack` that
    /// has an entry in `sources` (keyed by repo name).
    pub fn add_from_sack(&mut self, sack: &Sack, sources: &HashMap<String, &dyn ModuleMetadataSource>) -> Result<(), Error> {
        for repo in sack.repos() {
            if repo.is_system() {
                continue;
            }
            if let Some(source) = sources.get(&repo.name) {
                for mut doc in source.load_modules()? {
                    doc.reponame = repo.name.clone();
                    self.documents.push(doc);
                }
            }
        }
        Ok(())
    }

    /// Harvests distro-supplied defaults for `defaults_dir` through `source`.
    pub fn add_defaults_from_disk(&mut self, defaults_dir: &Path, source: &dyn ModuleMetadataSource) -> Result<(), Error> {
        self.raw_defaults.extend(source.load_defaults(defaults_dir)?);
        Ok(())
    }

    /// Resolves the platform module from `paths` (tried in order, first
    /// readable `PLATFORM_ID=name:stream` line wins), unless `override_spec`
    /// is given.
    pub fn add_platform_package(&mut self, paths: &[PathBuf], override_spec: Option<(String, String)>) -> Result<(), Error> {
        if let Some(platform) = override_spec {
            self.platform = Some(platform);
            return Ok(());
        }
        for path in paths {
            if let Ok(text) = fs::read_to_string(path) {
                if let Some(platform) = parse_platform_id(&text) {
                    self.platform = Some(platform);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Reconciles harvested defaults into a single stream-per-name map,
    /// logging (not failing) on conflicting declarations.
    pub fn resolve_defaults(&mut self) {
        let mut resolved: HashMap<String, ModuleDefaults> = HashMap::new();
        for d in &self.raw_defaults {
            match resolved.get(&d.name) {
                Some(existing) if existing.stream != d.stream => {
                    log::warn!("conflicting module defaults for '{}': {:?} vs {:?}", d.name, existing.stream, d.stream);
                }
                Some(_) => {}
                None => {
                    resolved.insert(d.name.clone(), d.clone());
                }
            }
        }
        self.defaults = resolved;
    }

    /// Loads persisted per-module state from `<install_root>/etc/dnf/modules.d/`.
    pub fn load_state(&mut self, install_root: &Path) -> Result<(), Error> {
        let dir = modules_d(install_root);
        for record in read_state_dir(&dir)? {
            self.on_disk_streams.insert(record.name.clone(), record.stream.clone());
            self.records.insert(record.name.clone(), record);
        }
        Ok(())
    }

    fn record_mut(&mut self, name: &str) -> &mut ModuleRecord {
        self.records.entry(name.to_string()).or_insert_with(|| ModuleRecord::new(name))
    }

    /// Returns `name`'s current state: [`ModuleState::Unknown`] if no
    /// document for it was ever harvested.
    pub fn state_of(&self, name: &str) -> ModuleState {
        match self.records.get(name) {
            Some(record) => record.state,
            None if self.documents.iter().any(|d| d.name == name) => ModuleState::Default,
            None => ModuleState::Unknown,
        }
    }

    /// Enables `name` on `stream`.
    ///
    /// Fails with [`ModuleErrorKind::CannotModifyMultipleTimesModuleState`] if
    /// `name` is already enabled on a *different* stream and has not been
    /// [`ModuleContainer::reset`] since.
    pub fn enable(&mut self, name: &str, stream: &str) -> Result<(), Error> {
        if let Some(existing) = self.records.get(name) {
            if existing.state == ModuleState::Enabled
                && existing.stream.as_deref() != Some(stream)
                && !self.reset_this_session.contains(name)
            {
                return Err(Error::ModuleError {
                    kind: ModuleErrorKind::CannotModifyMultipleTimesModuleState,
                    detail: format!(
                        "module '{name}' is already enabled on stream '{}'; reset before switching to '{stream}'",
                        existing.stream.as_deref().unwrap_or("")
                    ),
                });
            }
        }
        let record = self.record_mut(name);
        record.state = ModuleState::Enabled;
        record.stream = Some(stream.to_string());
        Ok(())
    }

    /// Disables `name`: never activated regardless of defaults or dependencies.
    pub fn disable(&mut self, name: &str) {
        let record = self.record_mut(name);
        record.state = ModuleState::Disabled;
        record.stream = None;
        record.profiles.clear();
    }

    /// Clears any override for `name`, returning it to [`ModuleState::Default`]
    /// and authorizing a subsequent stream switch without
    /// [`ModuleContainer::get_switched_streams`] flagging it.
    pub fn reset(&mut self, name: &str) {
        let record = self.record_mut(name);
        record.state = ModuleState::Default;
        record.stream = None;
        record.profiles.clear();
        self.reset_this_session.insert(name.to_string());
    }

    /// Records `profile` as installed for `name`'s current stream.
    pub fn install(&mut self, name: &str, profile: &str) -> Result<(), Error> {
        if self.state_of(name) == ModuleState::Unknown {
            return Err(Error::ModuleError {
                kind: ModuleErrorKind::CannotResolveModuleSpec,
                detail: format!("no known module named '{name}'"),
            });
        }
        let record = self.record_mut(name);
        if !record.profiles.iter().any(|p| p == profile) {
            record.profiles.push(profile.to_string());
        }
        Ok(())
    }

    fn default_stream(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).and_then(|d| d.stream.as_deref())
    }

    /// Runs the active-module resolver: seeds enabled/default/platform
    /// modules, then closes over the `requires` relation, reporting a
    /// conflict whenever closure would require two streams of one module.
    ///
    /// `debug` is accepted for call-site parity with callers that want a
    /// verbose resolution trace; this implementation always computes the
    /// full closure regardless.
    pub fn resolve_active(&mut self, debug: bool) -> (Vec<ModuleProblem>, ModuleErrorKind) {
        let _ = debug;
        let mut active: HashMap<String, String> = HashMap::new();
        let mut problems = Vec::new();

        if let Some((name, stream)) = &self.platform {
            active.insert(name.clone(), stream.clone());
        }

        for record in self.records.values() {
            if record.state == ModuleState::Enabled {
                if let Some(stream) = &record.stream {
                    active.insert(record.name.clone(), stream.clone());
                }
            }
        }

        let known_names: BTreeSet<&str> = self.documents.iter().map(|d| d.name.as_str()).collect();
        for name in known_names {
            if active.contains_key(name) {
                continue;
            }
            if matches!(self.records.get(name).map(|r| r.state), Some(ModuleState::Disabled)) {
                continue;
            }
            if let Some(stream) = self.default_stream(name) {
                active.insert(name.to_string(), stream.to_string());
            }
        }

        let mut queue: VecDeque<(String, String)> = active.iter().map(|(n, s)| (n.clone(), s.clone())).collect();
        while let Some((name, stream)) = queue.pop_front() {
            for doc in self.documents.iter().filter(|d| d.name == name && d.stream == stream) {
                for (req_name, req_stream) in &doc.requires {
                    if matches!(self.records.get(req_name).map(|r| r.state), Some(ModuleState::Disabled)) {
                        problems.push(ModuleProblem {
                            message: format!("module '{name}:{stream}' requires '{req_name}:{req_stream}', which is disabled"),
                        });
                        continue;
                    }
                    match active.get(req_name) {
                        Some(existing_stream) if existing_stream != req_stream => {
                            problems.push(ModuleProblem {
                                message: format!(
                                    "module '{name}:{stream}' requires '{req_name}:{req_stream}', but '{req_name}:{existing_stream}' is already active"
                                ),
                            });
                        }
                        Some(_) => {}
                        None => {
                            active.insert(req_name.clone(), req_stream.clone());
                            queue.push_back((req_name.clone(), req_stream.clone()));
                        }
                    }
                }
            }
        }

        self.active_cache = active;
        let kind = if problems.is_empty() {
            ModuleErrorKind::NoError
        } else {
            ModuleErrorKind::CannotResolveModules
        };
        (problems, kind)
    }

    fn active_documents(&self) -> Vec<&ModuleDocument> {
        self.documents
            .iter()
            .filter(|d| self.active_cache.get(&d.name).is_some_and(|s| s == &d.stream))
            .collect()
    }

    fn inactive_documents(&self) -> Vec<&ModuleDocument> {
        self.documents
            .iter()
            .filter(|d| self.active_cache.get(&d.name) != Some(&d.stream))
            .collect()
    }

    /// Returns every harvested document matching the given glob patterns
    /// (`None` matches anything for that field).
    pub fn query(&self, n: Option<&str>, s: Option<&str>, v: Option<u64>, c: Option<&str>, a: Option<&str>) -> Vec<&ModuleDocument> {
        self.documents
            .iter()
            .filter(|d| n.is_none_or(|p| glob_matches(p, &d.name)))
            .filter(|d| s.is_none_or(|p| glob_matches(p, &d.stream)))
            .filter(|d| v.is_none_or(|want| want == d.version))
            .filter(|d| c.is_none_or(|p| glob_matches(p, &d.context)))
            .filter(|d| a.is_none_or(|p| glob_matches(p, &d.arch)))
            .collect()
    }

    /// Computes the RPM-level visibility filter per §4.2 steps 2-8.
    ///
    /// `resolve_active` must have been called first so the active/inactive
    /// partition is current.
    pub fn compute_rpm_filter(&self, sack: &Sack, hotfix_repo_ids: &[RepoId]) -> RpmFilterPlan {
        let include_nevras: HashSet<&str> = self.active_documents().iter().flat_map(|d| d.artifacts.iter().map(String::as_str)).collect();
        let exclude_nevras: HashSet<&str> = self.inactive_documents().iter().flat_map(|d| d.artifacts.iter().map(String::as_str)).collect();
        let names: HashSet<String> = include_nevras
            .iter()
            .filter_map(|nevra| Nevra::parse_as(nevra, NevraForm::Nevra).ok())
            .map(|n| n.name.as_str().to_string())
            .collect();

        let mut plan = RpmFilterPlan::default();
        for repo in sack.repos() {
            if repo.is_system() || matches!(repo.kind, RepoKind::Cmdline) || hotfix_repo_ids.contains(&repo.id()) {
                continue;
            }
            for id in sack.repo_solvable_ids(repo.id()) {
                let solvable = sack.solvable(id);
                let nevra = format!("{}-{}.{}", solvable.name, solvable.evr, solvable.arch);
                let is_included = include_nevras.contains(nevra.as_str());

                if is_included {
                    plan.include_ids.push(id);
                }
                if !is_included && names.contains(solvable.name.as_str()) {
                    plan.name_exclude_ids.push(id);
                }
                if !is_included && solvable.provides.iter().any(|p| names.contains(p.name.as_str())) {
                    plan.provides_exclude_ids.push(id);
                }
                if !is_included && exclude_nevras.contains(nevra.as_str()) {
                    plan.nevra_exclude_ids.push(id);
                }
            }
        }
        plan
    }

    /// Writes one INI file per module with any recorded state into
    /// `<install_root>/etc/dnf/modules.d/`.
    pub fn save(&self, install_root: &Path) -> Result<(), Error> {
        let dir = modules_d(install_root);
        fs::create_dir_all(&dir).map_err(|source| Error::Io { context: "creating module state directory".to_string(), source })?;
        for record in self.records.values() {
            record.write(&dir)?;
        }
        Ok(())
    }

    /// Returns every module whose currently-recorded stream differs from the
    /// stream on disk when this container was loaded, and that has not been
    /// [`ModuleContainer::reset`] this session.
    pub fn get_switched_streams(&self) -> Vec<(String, String, String)> {
        self.records
            .values()
            .filter(|record| !self.reset_this_session.contains(&record.name))
            .filter_map(|record| {
                let original = self.on_disk_streams.get(&record.name).cloned().flatten().unwrap_or_default();
                let current = record.stream.clone().unwrap_or_default();
                (original != current).then(|| (record.name.clone(), original, current))
            })
            .collect()
    }
}

fn modules_d(install_root: &Path) -> PathBuf {
    install_root.join("etc/dnf/modules.d")
}

fn glob_matches(pattern: &str, value: &str) -> bool {
    glob::Pattern::new(pattern).map(|p| p.matches(value)).unwrap_or(false)
}

fn parse_platform_id(text: &str) -> Option<(String, String)> {
    for line in text.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("PLATFORM_ID=") {
            let value = value.trim_matches('"');
            if let Some((name, stream)) = value.split_once(':') {
                return Some((name.to_string(), stream.to_string()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use dnf_sack::{InMemoryMetadataSource, LoadFlags, Sack, SolvableRecord};
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    use super::*;

    fn doc(name: &str, stream: &str, artifacts: &[&str]) -> ModuleDocument {
        ModuleDocument {
            name: name.to_string(),
            stream: stream.to_string(),
            version: 1,
            context: "cafe".to_string(),
            arch: "x86_64".to_string(),
            artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
            ..ModuleDocument::default()
        }
    }

    #[test]
    fn enable_disable_reset_lifecycle() {
        let mut container = ModuleContainer::new();
        container.documents.push(doc("postgresql", "12", &[]));

        assert_eq!(container.state_of("postgresql"), ModuleState::Default);
        container.enable("postgresql", "12").unwrap();
        assert_eq!(container.state_of("postgresql"), ModuleState::Enabled);
        container.disable("postgresql");
        assert_eq!(container.state_of("postgresql"), ModuleState::Disabled);
        container.reset("postgresql");
        assert_eq!(container.state_of("postgresql"), ModuleState::Default);
    }

    #[test]
    fn switching_stream_without_reset_is_rejected() {
        let mut container = ModuleContainer::new();
        container.enable("nodejs", "14").unwrap();

        let err = container.enable("nodejs", "16").unwrap_err();
        assert!(matches!(
            err,
            Error::ModuleError {
                kind: ModuleErrorKind::CannotModifyMultipleTimesModuleState,
                ..
            }
        ));

        container.reset("nodejs");
        container.enable("nodejs", "16").unwrap();
        assert_eq!(container.state_of("nodejs"), ModuleState::Enabled);
        assert_eq!(container.records.get("nodejs").unwrap().stream.as_deref(), Some("16"));
    }

    #[test]
    fn get_switched_streams_reports_unreset_changes() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut on_disk = ModuleContainer::new();
        on_disk.enable("ruby", "2.7")?;
        on_disk.save(dir.path())?;

        let mut container = ModuleContainer::new();
        container.load_state(dir.path())?;
        container.enable("ruby", "2.7")?;
        assert!(container.get_switched_streams().is_empty());

        container.reset("ruby");
        container.enable("ruby", "3.0")?;
        assert!(
            container.get_switched_streams().is_empty(),
            "a reset switch must not be reported"
        );

        let mut unreset = ModuleContainer::new();
        unreset.load_state(dir.path())?;
        unreset.record_mut("ruby").stream = Some("3.0".to_string());
        let switched = unreset.get_switched_streams();
        assert_eq!(switched, vec![("ruby".to_string(), "2.7".to_string(), "3.0".to_string())]);
        Ok(())
    }

    #[test]
    fn resolve_defaults_keeps_first_on_conflict() {
        let mut container = ModuleContainer::new();
        container.raw_defaults.push(ModuleDefaults {
            name: "python".to_string(),
            stream: Some("3.9".to_string()),
            profiles: vec![],
        });
        container.raw_defaults.push(ModuleDefaults {
            name: "python".to_string(),
            stream: Some("3.11".to_string()),
            profiles: vec![],
        });
        container.resolve_defaults();
        assert_eq!(container.default_stream("python"), Some("3.9"));
    }

    #[test]
    fn resolve_active_pulls_in_required_modules() {
        let mut container = ModuleContainer::new();
        container.documents.push({
            let mut d = doc("webapp", "1.0", &[]);
            d.requires.push(("platform-tools".to_string(), "2.0".to_string()));
            d
        });
        container.documents.push(doc("platform-tools", "2.0", &[]));
        container.enable("webapp", "1.0").unwrap();

        let (problems, kind) = container.resolve_active(false);
        assert!(problems.is_empty());
        assert_eq!(kind, ModuleErrorKind::NoError);
        assert_eq!(container.active_cache.get("platform-tools").map(String::as_str), Some("2.0"));
    }

    #[test]
    fn resolve_active_reports_conflicting_stream_requirement() {
        let mut container = ModuleContainer::new();
        container.documents.push({
            let mut d = doc("a", "1.0", &[]);
            d.requires.push(("shared".to_string(), "1.0".to_string()));
            d
        });
        container.documents.push({
            let mut d = doc("b", "1.0", &[]);
            d.requires.push(("shared".to_string(), "2.0".to_string()));
            d
        });
        container.enable("a", "1.0").unwrap();
        container.enable("b", "1.0").unwrap();
        container.enable("shared", "1.0").unwrap();

        let (problems, kind) = container.resolve_active(false);
        assert_eq!(kind, ModuleErrorKind::CannotResolveModules);
        assert_eq!(problems.len(), 1);
    }

    fn record(name: &str, version: &str, release: &str, arch: &str, provides: Vec<&str>) -> SolvableRecord {
        SolvableRecord {
            name: name.to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: arch.to_string(),
            provides: provides.into_iter().map(String::from).collect(),
            ..SolvableRecord::default()
        }
    }

    #[test]
    fn compute_rpm_filter_partitions_active_and_inactive_artifacts() -> TestResult {
        let mut sack = Sack::new();
        let source = InMemoryMetadataSource::new(
            "cksum",
            vec![
                record("foo", "1.0", "1.fc30", "x86_64", vec![]),
                record("foo", "0.9", "1.fc29", "x86_64", vec![]),
                record("virtualfoo", "1.0", "1.fc30", "noarch", vec!["foo"]),
            ],
        );
        sack.load_repo("modular", &source, LoadFlags::default())?;

        let mut container = ModuleContainer::new();
        container.documents.push(doc("foomodule", "1.0", &["foo-1.0-1.fc30.x86_64"]));
        container.documents.push(doc("foomodule", "0.9", &["foo-0.9-1.fc29.x86_64"]));
        container.enable("foomodule", "1.0")?;
        let (problems, _) = container.resolve_active(false);
        assert!(problems.is_empty());

        let plan = container.compute_rpm_filter(&sack, &[]);
        assert_eq!(plan.include_ids.len(), 1);
        assert_eq!(plan.name_exclude_ids.len(), 1);
        assert_eq!(plan.provides_exclude_ids.len(), 1);
        assert_eq!(plan.nevra_exclude_ids.len(), 1);
        assert_eq!(plan.all_excludes().len(), 2);
        Ok(())
    }
}
