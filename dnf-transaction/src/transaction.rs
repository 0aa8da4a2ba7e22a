//! The §4.4 transaction state machine: `depsolve` → `download`/`check_untrusted`
//! → `test_commit` → `commit`, bracketed by rpmdb version checksums and
//! recorded in the history store.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use dnf_common::Error;
use dnf_lock::{LockMode, LockType};
use dnf_rpm::RpmBackend;
use dnf_sack::{RepoKind, Sack, SolvableId};
use dnf_solve::{Goal, RunFlags};
use dnf_state::{Action, State};
use dnf_types::{Epoch, Nevra, NevraForm};

use crate::fetcher::PackageFetcher;
use crate::history::{History, HistoryAction, HistoryItem, TransactionOutcome, TransactionRecord};
use crate::trust::TrustStore;

/// Where a [`Transaction`] sits in the §4.4 state machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Planned,
    Downloaded,
}

/// Flags controlling [`Transaction::check_untrusted`]/[`Transaction::commit`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionFlags {
    /// Run a dry-run RPM transaction before the real one; any reported
    /// problem aborts the commit.
    pub check_transaction: bool,
    /// Keep downloaded package files in the cache after a successful commit.
    pub keep_cache: bool,
    /// Require every planned install to verify against the trusted keyring,
    /// even for a repository that doesn't itself require gpgcheck.
    pub only_trusted: bool,
    /// Permit `commit` to install a package that failed signature
    /// verification, instead of [`check_untrusted`] having already rejected it.
    pub allow_untrusted: bool,
}

#[derive(Debug)]
struct PlannedActions {
    installs: Vec<SolvableId>,
    upgrades: Vec<(SolvableId, SolvableId)>,
    downgrades: Vec<(SolvableId, SolvableId)>,
    reinstalls: Vec<SolvableId>,
    erasures: Vec<SolvableId>,
    obsoleted: Vec<SolvableId>,
}

impl PlannedActions {
    fn planned_installs(&self) -> Vec<SolvableId> {
        self.installs
            .iter()
            .copied()
            .chain(self.reinstalls.iter().copied())
            .chain(self.upgrades.iter().map(|&(_, to)| to))
            .chain(self.downgrades.iter().map(|&(_, to)| to))
            .collect()
    }

    fn is_update(&self, id: SolvableId) -> bool {
        self.reinstalls.contains(&id) || self.upgrades.iter().any(|&(_, to)| to == id) || self.downgrades.iter().any(|&(_, to)| to == id)
    }
}

/// Executes one resolved [`Goal`] against the sack and the RPM database,
/// per §4.4's state machine. A `Transaction` is single-use: once `commit`
/// (or a failed `commit`) runs, [`Transaction::reset`] returns it to `Idle`
/// for a fresh `depsolve`.
#[derive(Debug)]
pub struct Transaction<'a> {
    sack: &'a Sack,
    backend: &'a mut dyn RpmBackend,
    fetcher: &'a mut dyn PackageFetcher,
    trust: &'a dyn TrustStore,
    history: History,
    uid: u32,
    flags: TransactionFlags,
    phase: Phase,
    planned: Option<PlannedActions>,
    pkgs_to_download: Vec<SolvableId>,
    downloaded: HashMap<SolvableId, PathBuf>,
}

impl<'a> Transaction<'a> {
    /// Starts an idle transaction over `sack`, driven through `backend`,
    /// `fetcher`, and `trust`, recording its outcome in `history`.
    pub fn new(sack: &'a Sack, backend: &'a mut dyn RpmBackend, fetcher: &'a mut dyn PackageFetcher, trust: &'a dyn TrustStore, history: History, uid: u32, flags: TransactionFlags) -> Self {
        Transaction {
            sack,
            backend,
            fetcher,
            trust,
            history,
            uid,
            flags,
            phase: Phase::Idle,
            planned: None,
            pkgs_to_download: Vec::new(),
            downloaded: HashMap::new(),
        }
    }

    /// Runs `goal` and records the packages it needs installed, upgraded,
    /// downgraded, reinstalled, and erased/obsoleted.
    ///
    /// Returns `Ok(false)` if the goal is unsatisfiable (see
    /// `goal.count_problems()`/`goal.describe_problem_rules()`), leaving the
    /// transaction in `Idle`.
    pub fn depsolve(&mut self, goal: &mut Goal<'a>) -> Result<bool, Error> {
        self.require_phase(Phase::Idle)?;

        if !goal.run(RunFlags { allow_uninstall: true, ..RunFlags::default() })? {
            return Ok(false);
        }

        let planned = PlannedActions {
            installs: goal.list_installs(),
            upgrades: goal.list_upgrades(),
            downgrades: goal.list_downgrades(),
            reinstalls: goal.list_reinstalls(),
            erasures: goal.list_erasures(),
            obsoleted: goal.list_obsoleted(),
        };

        self.pkgs_to_download = planned
            .planned_installs()
            .into_iter()
            .filter(|&id| !self.is_local_file(id))
            .filter(|&id| !self.fetcher.is_cached(self.sack.solvable(id)))
            .collect();

        self.planned = Some(planned);
        self.phase = Phase::Planned;
        Ok(true)
    }

    fn is_local_file(&self, id: SolvableId) -> bool {
        let repo = &self.sack.repos()[self.sack.solvable(id).source_repo_id.index()];
        matches!(repo.kind, RepoKind::Cmdline)
    }

    /// Fails with [`Error::NoSpace`] if the cache filesystem doesn't have
    /// enough free space for every package still queued to download.
    pub fn check_free_space(&self) -> Result<(), Error> {
        self.require_phase(Phase::Planned)?;
        let needed: u64 = self.pkgs_to_download.iter().map(|&id| self.sack.solvable(id).package_size).sum();
        let available = self.fetcher.free_space()?;
        if available < needed {
            return Err(Error::NoSpace { needed, available });
        }
        Ok(())
    }

    /// Downloads every package in [`Transaction::check_free_space`]'s set
    /// through the configured [`PackageFetcher`].
    pub fn download(&mut self, state: &State) -> Result<(), Error> {
        self.require_phase(Phase::Planned)?;
        state.action_start(Action::Download, "");
        for &id in &self.pkgs_to_download.clone() {
            let path = self.fetcher.fetch(self.sack.solvable(id))?;
            self.downloaded.insert(id, path);
        }
        state.action_stop();
        self.phase = Phase::Downloaded;
        Ok(())
    }

    /// Verifies every planned install against the trusted keyring, per the
    /// source repo's `gpgcheck` flag and `flags.only_trusted`.
    pub fn check_untrusted(&self, state: &State) -> Result<(), Error> {
        if self.phase == Phase::Idle {
            return Err(Error::Internal {
                context: "check_untrusted called before depsolve".to_string(),
            });
        }
        let planned = self.planned.as_ref().expect("phase != Idle implies planned is set");

        state.action_start(Action::CheckUntrusted, "");
        for id in planned.planned_installs() {
            let solvable = self.sack.solvable(id);
            let repo = &self.sack.repos()[solvable.source_repo_id.index()];
            if !(repo.gpgcheck || self.flags.only_trusted) {
                continue;
            }
            let path = self.install_path(id);
            if !self.trust.verify(solvable, &path)? {
                state.action_stop();
                return Err(Error::GpgSignatureInvalid {
                    subject: format!("{}-{}.{}", solvable.name, solvable.evr, solvable.arch),
                });
            }
        }
        state.action_stop();
        Ok(())
    }

    fn install_path(&self, id: SolvableId) -> PathBuf {
        if self.is_local_file(id) {
            return PathBuf::from(&self.sack.solvable(id).location);
        }
        self.downloaded.get(&id).cloned().unwrap_or_else(|| self.fetcher.cache_path(self.sack.solvable(id)))
    }

    /// Runs a dry-run RPM transaction without touching rpmdb or the
    /// filesystem; any reported problem is surfaced as [`Error::Internal`].
    pub fn test_commit(&mut self) -> Result<(), Error> {
        self.require_phase(Phase::Downloaded)?;
        self.stage()?;
        let problems = self.backend.run_transaction(true)?;
        self.backend.reset();
        if !problems.is_empty() {
            return Err(Error::Internal {
                context: problems.into_iter().map(|p| format!("{}: {}", p.package, p.description)).collect::<Vec<_>>().join("; "),
            });
        }
        Ok(())
    }

    fn stage(&mut self) -> Result<(), Error> {
        let planned = self.planned.as_ref().expect("stage called without a planned transaction").planned_installs();
        let is_update: Vec<(SolvableId, bool)> = planned.iter().map(|&id| (id, self.planned.as_ref().unwrap().is_update(id))).collect();
        for (id, is_update) in is_update {
            let path = self.install_path(id);
            self.backend.add_install_filename(&path, self.flags.allow_untrusted, is_update)?;
        }
        for &id in &self.planned.as_ref().unwrap().erasures {
            self.backend.add_remove_pkg(&nevra_of(self.sack, id))?;
        }
        Ok(())
    }

    /// Acquires the rpmdb process lock, stages and runs the real RPM
    /// transaction, and appends the outcome to the history store.
    ///
    /// On success the sack's system repo is stale: the caller must reload it
    /// (via a fresh [`dnf_sack::Sack::load_system_repo`] call) before reusing
    /// it. On failure the error bubbles and rpmdb is left unchanged.
    pub fn commit(&mut self, state: &State) -> Result<TransactionRecord, Error> {
        self.require_phase(Phase::Downloaded)?;
        state.take_lock(LockType::Rpmdb, LockMode::Process)?;
        state.allow_cancel(false);
        let outcome = self.commit_locked(state);
        state.allow_cancel(true);
        state.release_locks();
        outcome
    }

    fn commit_locked(&mut self, state: &State) -> Result<TransactionRecord, Error> {
        let begin_ts = unix_timestamp();
        let rpmdb_version_begin = self.backend.rpmdb_version(self.sack.root_dir())?;

        self.stage()?;

        if self.flags.check_transaction {
            state.action_start(Action::TestCommit, "");
            let problems = self.backend.run_transaction(true)?;
            state.action_stop();
            if !problems.is_empty() {
                return self.fail(begin_ts, rpmdb_version_begin, problems);
            }
        }

        state.action_start(Action::Commit, "");
        let problems = self.backend.run_transaction(false)?;
        state.action_stop();
        if !problems.is_empty() {
            return self.fail(begin_ts, rpmdb_version_begin, problems);
        }

        let rpmdb_version_end = self.backend.rpmdb_version(self.sack.root_dir())?;
        let record = TransactionRecord {
            id: self.history.next_id()?,
            begin_ts,
            end_ts: unix_timestamp(),
            state: TransactionOutcome::Done,
            rpmdb_version_begin,
            rpmdb_version_end,
            uid: self.uid,
            items: self.history_items(),
        };
        self.history.append(&record)?;
        log::info!("transaction {} committed: {} packages touched", record.id, record.items.len());

        if !self.flags.keep_cache {
            for path in self.downloaded.values() {
                self.fetcher.remove_cached(path)?;
            }
        }

        self.reset();
        Ok(record)
    }

    fn fail(&mut self, begin_ts: u64, rpmdb_version_begin: String, problems: Vec<dnf_rpm::TransactionProblem>) -> Result<TransactionRecord, Error> {
        let record = TransactionRecord {
            id: self.history.next_id()?,
            begin_ts,
            end_ts: unix_timestamp(),
            state: TransactionOutcome::Failed,
            rpmdb_version_begin: rpmdb_version_begin.clone(),
            rpmdb_version_end: rpmdb_version_begin,
            uid: self.uid,
            items: Vec::new(),
        };
        self.history.append(&record)?;
        self.backend.reset();
        let messages: Vec<String> = problems.into_iter().map(|p| format!("{}: {}", p.package, p.description)).collect();
        log::warn!("transaction {} failed: {}", record.id, messages.join("; "));
        self.reset();
        Err(Error::Internal { context: messages.join("; ") })
    }

    fn history_items(&self) -> Vec<HistoryItem> {
        let planned = self.planned.as_ref().expect("history_items called without a planned transaction");
        let mut items = Vec::new();
        let item = |id: SolvableId, action: HistoryAction| HistoryItem {
            nevra: nevra_of(self.sack, id).to_string(),
            action,
        };
        for &id in &planned.installs {
            items.push(item(id, HistoryAction::Install));
        }
        for &(_, to) in &planned.upgrades {
            items.push(item(to, HistoryAction::Upgraded));
        }
        for &(_, to) in &planned.downgrades {
            items.push(item(to, HistoryAction::Downgraded));
        }
        for &id in &planned.reinstalls {
            items.push(item(id, HistoryAction::Reinstalled));
        }
        let obsoleted: HashSet<SolvableId> = planned.obsoleted.iter().copied().collect();
        for &id in &planned.erasures {
            let action = if obsoleted.contains(&id) { HistoryAction::Obsoleted } else { HistoryAction::Erased };
            items.push(item(id, action));
        }
        items
    }

    /// Returns this transaction to `Idle`, discarding any planned/downloaded
    /// state and clearing the RPM backend's staged operations.
    pub fn reset(&mut self) {
        self.backend.reset();
        self.planned = None;
        self.pkgs_to_download.clear();
        self.downloaded.clear();
        self.phase = Phase::Idle;
    }

    /// The packages [`Transaction::download`] still needs to fetch.
    pub fn pkgs_to_download(&self) -> &[SolvableId] {
        &self.pkgs_to_download
    }

    fn require_phase(&self, expected: Phase) -> Result<(), Error> {
        if self.phase != expected {
            return Err(Error::Internal {
                context: format!("transaction is in phase {:?}, expected {:?}", self.phase, expected),
            });
        }
        Ok(())
    }
}

fn nevra_of(sack: &Sack, id: SolvableId) -> Nevra {
    let solvable = sack.solvable(id);
    Nevra {
        name: solvable.name.clone(),
        epoch: Epoch::new(solvable.evr.epoch),
        version: Some(solvable.evr.version.clone()),
        release: Some(solvable.evr.release.clone()),
        arch: Some(solvable.arch.clone()),
        form: NevraForm::Nevra,
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dnf_lock::LockManager;
    use dnf_rpm::InMemoryRpmBackend;
    use dnf_sack::{InMemoryMetadataSource, LoadFlags, Sack, SolvableRecord};
    use dnf_solve::Goal;
    use dnf_state::State;
    use testresult::TestResult;

    use super::*;

    fn sack_with_one_available_package() -> Sack {
        let mut sack = Sack::new();
        sack.set_cache_dir("/var/cache/dnf");
        let backend = InMemoryRpmBackend::new();
        sack.load_system_repo(&backend, LoadFlags::default()).unwrap();

        let record = SolvableRecord {
            name: "foo".to_string(),
            version: "1.0".to_string(),
            release: "1".to_string(),
            arch: "x86_64".to_string(),
            package_size: 1024,
            ..Default::default()
        };
        let source = InMemoryMetadataSource::new("checksum-1", vec![record]);
        sack.load_repo("updates", &source, LoadFlags::default()).unwrap();
        sack
    }

    fn state() -> Arc<State> {
        let lock_manager = Arc::new(LockManager::new("/var/run/dnf"));
        State::new_root(lock_manager, None)
    }

    #[test]
    fn depsolve_stages_an_install_and_queues_it_for_download() -> TestResult {
        let sack = sack_with_one_available_package();
        let id = sack.ids_by_name(&"foo".parse()?)[0];

        let mut goal = Goal::new(&sack);
        goal.install(id, true);

        let mut backend = InMemoryRpmBackend::new();
        let mut fetcher = InMemoryPackageFetcher::new(u64::MAX);
        let trust = InMemoryTrustStore::new();
        let history = History::new("/tmp/does-not-matter-for-this-test.jsonl");
        let mut txn = Transaction::new(&sack, &mut backend, &mut fetcher, &trust, history, 0, TransactionFlags::default());

        assert!(txn.depsolve(&mut goal)?);
        assert_eq!(txn.pkgs_to_download(), &[id]);
        txn.check_free_space()?;
        Ok(())
    }

    #[test]
    fn full_flow_commits_and_records_history() -> TestResult {
        let dir = tempfile::tempdir()?;
        let sack = sack_with_one_available_package();
        let id = sack.ids_by_name(&"foo".parse()?)[0];

        let mut goal = Goal::new(&sack);
        goal.install(id, true);

        let mut backend = InMemoryRpmBackend::new();
        let mut fetcher = InMemoryPackageFetcher::new(u64::MAX);
        let mut trust = InMemoryTrustStore::new();
        trust.trust("foo");
        let history = History::new(dir.path().join("history.jsonl"));
        let st = state();

        let mut txn = Transaction::new(&sack, &mut backend, &mut fetcher, &trust, history, 0, TransactionFlags::default());
        assert!(txn.depsolve(&mut goal)?);
        txn.check_free_space()?;
        txn.download(&st)?;
        txn.check_untrusted(&st)?;
        let record = txn.commit(&st)?;

        assert_eq!(record.state, TransactionOutcome::Done);
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].action, HistoryAction::Install);
        assert_eq!(fetcher.fetched(), &["foo-1.0-1.x86_64".to_string()]);

        let last = History::new(dir.path().join("history.jsonl")).last_transaction()?.unwrap();
        assert_eq!(last.id, record.id);
        Ok(())
    }

    #[test]
    fn check_untrusted_rejects_an_unsigned_package_from_a_gpgcheck_repo() -> TestResult {
        let sack = sack_with_one_available_package();
        let id = sack.ids_by_name(&"foo".parse()?)[0];

        let mut goal = Goal::new(&sack);
        goal.install(id, true);

        let mut backend = InMemoryRpmBackend::new();
        let mut fetcher = InMemoryPackageFetcher::new(u64::MAX);
        let trust = InMemoryTrustStore::new();
        let history = History::new("/tmp/does-not-matter-for-this-test-2.jsonl");
        let st = state();

        let mut txn = Transaction::new(&sack, &mut backend, &mut fetcher, &trust, history, 0, TransactionFlags::default());
        assert!(txn.depsolve(&mut goal)?);
        txn.download(&st)?;

        let err = txn.check_untrusted(&st).unwrap_err();
        assert!(matches!(err, Error::GpgSignatureInvalid { .. }));
        Ok(())
    }
}
