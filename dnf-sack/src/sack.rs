//! The sack: owns the pool of interned solvables, the set of repositories,
//! and the visibility maps derived from excludes/includes/module state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dnf_common::Error;
use dnf_rpm::RpmBackend;
use dnf_types::{Arch, Name, Reldep};

use crate::bitmap::Bitmap;
use crate::cache::SolvCache;
use crate::metadata::RepoMetadataSource;
use crate::repo::{CachePaths, Repo, RepoId, RepoKind, RepoState};
use crate::solvable::{Solvable, SolvableId, SolvableRecord};

/// Flags controlling what [`Sack::load_system_repo`]/[`Sack::load_repo`] do,
/// mirroring `DnfSackLoadFlags` (`DNF_SACK_LOAD_FLAG_*`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadFlags {
    /// Write a fresh solv-cache after a cache miss.
    pub build_cache: bool,
    /// Parse and retain filelists metadata, if present.
    pub use_filelists: bool,
    /// Parse and retain delta-RPM (presto) metadata, if present.
    pub use_presto: bool,
    /// Parse and retain updateinfo metadata, if present.
    pub use_updateinfo: bool,
}

/// The pool of interned solvables, repositories, and visibility maps a
/// resolver or query resolves and filters against (§3, §4.1).
#[derive(Debug)]
pub struct Sack {
    pool: Vec<Solvable>,
    repos: Vec<Repo>,
    repo_by_name: HashMap<String, RepoId>,
    arch: Option<Arch>,
    cache_dir: Option<PathBuf>,
    root_dir: PathBuf,
    installonly_names: Vec<Name>,
    installonly_limit: u32,
    modular_excludes: Bitmap,
    pkg_excludes: Bitmap,
    pkg_includes: Bitmap,
    considered_map: Bitmap,
    considered_fresh: bool,
    running_kernel_id_cache: Option<Option<SolvableId>>,
}

impl Default for Sack {
    fn default() -> Self {
        Sack::new()
    }
}

impl Sack {
    /// Creates an empty sack with no repositories loaded.
    pub fn new() -> Self {
        Sack {
            pool: Vec::new(),
            repos: Vec::new(),
            repo_by_name: HashMap::new(),
            arch: None,
            cache_dir: None,
            root_dir: PathBuf::from("/"),
            installonly_names: Vec::new(),
            installonly_limit: 0,
            modular_excludes: Bitmap::new(),
            pkg_excludes: Bitmap::new(),
            pkg_includes: Bitmap::new(),
            considered_map: Bitmap::new(),
            considered_fresh: true,
            running_kernel_id_cache: None,
        }
    }

    /// Sets the directory the solv-cache is read from and written to.
    pub fn set_cache_dir(&mut self, path: impl Into<PathBuf>) {
        self.cache_dir = Some(path.into());
    }

    /// Sets the sack's architecture, overriding auto-detection.
    pub fn set_arch(&mut self, arch: Arch) {
        self.arch = Some(arch);
    }

    /// Returns the sack's architecture, if set.
    pub fn arch(&self) -> Option<&Arch> {
        self.arch.as_ref()
    }

    /// Sets the root directory the system repository is read from.
    pub fn set_rootdir(&mut self, path: impl Into<PathBuf>) {
        self.root_dir = path.into();
    }

    /// Sets the names of installonly packages (kept in parallel up to `installonly_limit`).
    pub fn set_installonly_names(&mut self, names: Vec<Name>) {
        self.installonly_names = names;
    }

    /// Sets how many parallel installonly packages may be kept installed.
    pub fn set_installonly_limit(&mut self, limit: u32) {
        self.installonly_limit = limit;
    }

    /// Creates the cache directory if one has been configured.
    ///
    /// Fails with [`Error::FileInvalid`] if the directory cannot be created.
    pub fn setup(&mut self) -> Result<(), Error> {
        if let Some(cache_dir) = &self.cache_dir {
            fs::create_dir_all(cache_dir).map_err(|source| Error::FileInvalid {
                path: cache_dir.clone(),
                reason: source.to_string(),
            })?;
        }
        Ok(())
    }

    fn solv_cache_path(&self, repo_name: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(format!("{repo_name}.solv")))
    }

    fn intern(&mut self, repo_id: RepoId, record: SolvableRecord) -> Result<(), Error> {
        let name = Name::new(&record.name)?;
        let version = dnf_types::VerString::new(&record.version)?;
        let release = dnf_types::VerString::new(&record.release)?;
        let evr = dnf_types::Evr::new(record.epoch, version, release);
        let arch = Arch::new(&record.arch)?;
        let parse_all = |reldeps: &[String]| -> Result<Vec<Reldep>, Error> {
            reldeps
                .iter()
                .map(|s| s.parse::<Reldep>().map_err(Error::from))
                .collect()
        };
        let solvable = Solvable {
            name,
            evr,
            arch,
            source_repo_id: repo_id,
            user_installed: record.user_installed,
            provides: parse_all(&record.provides)?,
            requires: parse_all(&record.requires)?,
            conflicts: parse_all(&record.conflicts)?,
            obsoletes: parse_all(&record.obsoletes)?,
            recommends: parse_all(&record.recommends)?,
            suggests: parse_all(&record.suggests)?,
            supplements: parse_all(&record.supplements)?,
            enhances: parse_all(&record.enhances)?,
            summary: record.summary,
            description: record.description,
            url: record.url,
            location: record.location,
            sourcerpm: record.sourcerpm,
            package_size: record.package_size,
        };
        self.pool.push(solvable);
        self.repos[repo_id.0].solvable_range.end = self.pool.len();
        self.considered_fresh = false;
        Ok(())
    }

    fn create_repo(&mut self, name: impl Into<String>, kind: RepoKind) -> RepoId {
        let name = name.into();
        let id = RepoId(self.repos.len());
        let start = self.pool.len();
        self.repos.push(Repo {
            id,
            name: name.clone(),
            kind,
            state: RepoState::New,
            metadata_checksum: None,
            cache_paths: CachePaths::default(),
            use_includes: true,
            priority: 0,
            gpgcheck: !matches!(kind, RepoKind::Cmdline),
            solvable_range: start..start,
        });
        self.repo_by_name.insert(name, id);
        id
    }

    /// Sets `reponame`'s tie-breaking priority (higher wins).
    pub fn set_repo_priority(&mut self, reponame: &str, priority: i32) -> Result<(), Error> {
        let id = self.repo_by_name.get(reponame).copied().ok_or_else(|| Error::RepoNotAvailable {
            repo_id: reponame.to_string(),
            reason: "not loaded".to_string(),
        })?;
        self.repos[id.0].priority = priority;
        Ok(())
    }

    /// Sets whether a transaction must verify `reponame`'s packages against
    /// the trusted keyring before installing them.
    pub fn set_repo_gpgcheck(&mut self, reponame: &str, gpgcheck: bool) -> Result<(), Error> {
        let id = self.repo_by_name.get(reponame).copied().ok_or_else(|| Error::RepoNotAvailable {
            repo_id: reponame.to_string(),
            reason: "not loaded".to_string(),
        })?;
        self.repos[id.0].gpgcheck = gpgcheck;
        Ok(())
    }

    /// Loads the installed RPM database through `backend`.
    ///
    /// If a solv-cache whose embedded checksum matches the current rpmdb
    /// checksum exists, it is used; otherwise the database is read and, if
    /// `flags.build_cache`, a fresh cache is written. Fails with
    /// [`Error::FileInvalid`] if the database cannot be read.
    pub fn load_system_repo(&mut self, backend: &dyn RpmBackend, flags: LoadFlags) -> Result<RepoId, Error> {
        let repo_id = self.create_repo("@System", RepoKind::System);
        let checksum = backend.rpmdb_version(&self.root_dir)?;

        if let Some(cache_path) = self.solv_cache_path("@System") {
            if let Some(cache) = SolvCache::read_if_current(&cache_path, &checksum)? {
                for record in cache.records {
                    self.intern(repo_id, record)?;
                }
                self.repos[repo_id.0].state = RepoState::LoadedCached;
                self.repos[repo_id.0].metadata_checksum = Some(checksum);
                return Ok(repo_id);
            }
        }

        let installed = backend.installed_packages(&self.root_dir)?;
        let records: Vec<SolvableRecord> = installed
            .into_iter()
            .map(|pkg| SolvableRecord {
                name: pkg.name.as_str().to_string(),
                epoch: pkg.evr.epoch,
                version: pkg.evr.version.as_str().to_string(),
                release: pkg.evr.release.as_str().to_string(),
                arch: pkg.arch,
                user_installed: true,
                ..SolvableRecord::default()
            })
            .collect();
        for record in records.clone() {
            self.intern(repo_id, record)?;
        }
        self.repos[repo_id.0].state = RepoState::Loaded;
        self.repos[repo_id.0].metadata_checksum = Some(checksum.clone());

        if flags.build_cache {
            if let Some(cache_path) = self.solv_cache_path("@System") {
                SolvCache { checksum, records }.write(&cache_path)?;
                self.repos[repo_id.0].cache_paths.solv_cache = Some(cache_path);
            }
        }
        Ok(repo_id)
    }

    /// Loads a remote or cmdline repository's metadata through `source`.
    ///
    /// Optional extensions (filelists/other/prestodelta/updateinfo) that are
    /// absent are ignored; present-but-corrupt ones are fatal, matching the
    /// contract in §4.1.
    pub fn load_repo(
        &mut self,
        name: impl Into<String>,
        source: &dyn RepoMetadataSource,
        flags: LoadFlags,
    ) -> Result<RepoId, Error> {
        let name = name.into();
        let checksum = source.checksum()?;
        let repo_id = self.create_repo(name.clone(), RepoKind::Remote);

        if let Some(cache_path) = self.solv_cache_path(&name) {
            if let Some(cache) = SolvCache::read_if_current(&cache_path, &checksum)? {
                for record in cache.records {
                    self.intern(repo_id, record)?;
                }
                self.repos[repo_id.0].state = RepoState::LoadedCached;
                self.repos[repo_id.0].metadata_checksum = Some(checksum);
                return Ok(repo_id);
            }
        }

        let records = source.load_primary()?;
        for record in records.clone() {
            self.intern(repo_id, record)?;
        }
        self.repos[repo_id.0].state = RepoState::Loaded;
        self.repos[repo_id.0].metadata_checksum = Some(checksum.clone());

        if flags.use_filelists && source.load_filelists()?.is_none() {
            log::warn!("repo {name}: filelists metadata requested but not available");
        }
        if flags.use_presto && source.load_prestodelta()?.is_none() {
            log::warn!("repo {name}: prestodelta metadata requested but not available");
        }
        if flags.use_updateinfo && source.load_updateinfo()?.is_none() {
            log::warn!("repo {name}: updateinfo metadata requested but not available");
        }

        if flags.build_cache {
            if let Some(cache_path) = self.solv_cache_path(&name) {
                SolvCache { checksum, records }.write(&cache_path)?;
                self.repos[repo_id.0].cache_paths.solv_cache = Some(cache_path);
            }
        }
        Ok(repo_id)
    }

    /// Returns a loaded repository by name.
    pub fn repo(&self, name: &str) -> Option<&Repo> {
        self.repo_by_name.get(name).map(|id| &self.repos[id.0])
    }

    /// Returns every loaded repository.
    pub fn repos(&self) -> &[Repo] {
        &self.repos
    }

    /// Returns a solvable by id.
    pub fn solvable(&self, id: SolvableId) -> &Solvable {
        &self.pool[id.0]
    }

    /// Returns the total number of interned solvables.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Returns `true` if no solvable has been interned.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Adds solvable ids to the package-level excludes map.
    pub fn add_excludes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        for id in ids {
            self.pkg_excludes.set(id.0, true);
        }
        self.considered_fresh = false;
    }

    /// Removes solvable ids from the package-level excludes map.
    pub fn remove_excludes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        for id in ids {
            self.pkg_excludes.set(id.0, false);
        }
        self.considered_fresh = false;
    }

    /// Replaces the package-level excludes map wholesale.
    pub fn set_excludes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        self.pkg_excludes = Bitmap::new();
        self.add_excludes(ids);
    }

    /// Clears the package-level excludes map.
    pub fn reset_excludes(&mut self) {
        self.pkg_excludes = Bitmap::new();
        self.considered_fresh = false;
    }

    /// Adds solvable ids to the package-level includes map.
    pub fn add_includes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        for id in ids {
            self.pkg_includes.set(id.0, true);
        }
        self.considered_fresh = false;
    }

    /// Removes solvable ids from the package-level includes map.
    pub fn remove_includes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        for id in ids {
            self.pkg_includes.set(id.0, false);
        }
        self.considered_fresh = false;
    }

    /// Replaces the package-level includes map wholesale.
    pub fn set_includes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        self.pkg_includes = Bitmap::new();
        self.add_includes(ids);
    }

    /// Clears the package-level includes map.
    pub fn reset_includes(&mut self) {
        self.pkg_includes = Bitmap::new();
        self.considered_fresh = false;
    }

    /// Adds solvable ids to the modular excludes map.
    pub fn add_module_excludes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        for id in ids {
            self.modular_excludes.set(id.0, true);
        }
        self.considered_fresh = false;
    }

    /// Removes solvable ids from the modular excludes map.
    pub fn remove_module_excludes(&mut self, ids: impl IntoIterator<Item = SolvableId>) {
        for id in ids {
            self.modular_excludes.set(id.0, false);
        }
        self.considered_fresh = false;
    }

    /// Clears the modular excludes map.
    pub fn reset_module_excludes(&mut self) {
        self.modular_excludes = Bitmap::new();
        self.considered_fresh = false;
    }

    /// Sets whether `reponame`'s solvables are filtered by the global
    /// pkg_includes map. When `false`, the repo contributes all of its
    /// solvables to the considered set regardless of pkg_includes.
    pub fn set_use_includes(&mut self, reponame: &str, use_includes: bool) -> Result<(), Error> {
        let id = self.repo_by_name.get(reponame).copied().ok_or_else(|| Error::RepoNotAvailable {
            repo_id: reponame.to_string(),
            reason: "not loaded".to_string(),
        })?;
        self.repos[id.0].use_includes = use_includes;
        self.considered_fresh = false;
        Ok(())
    }

    /// Recomputes `considered_map` per the visibility algorithm in §4.1 if
    /// it is stale. Idempotent: a no-op when already fresh.
    pub fn make_considered_ready(&mut self) {
        if self.considered_fresh {
            return;
        }
        let mut considered = Bitmap::filled(self.pool.len(), true);
        considered.subtract(&self.modular_excludes);
        considered.subtract(&self.pkg_excludes);

        if !self.pkg_includes.is_empty() && !self.pkg_includes.is_all_unset() {
            let mut effective_includes = self.pkg_includes.clone();
            for repo in &self.repos {
                if !repo.use_includes {
                    for id in repo.solvable_range.clone() {
                        effective_includes.set(id, true);
                    }
                }
            }
            considered.intersect(&effective_includes);
        }

        // The system repo's solvables are never hidden by excludes/includes
        // semantics applied to remote repositories (§4.1 edge case).
        for repo in &self.repos {
            if repo.is_system() {
                for id in repo.solvable_range.clone() {
                    considered.set(id, true);
                }
            }
        }

        self.considered_map = considered;
        self.considered_fresh = true;
    }

    /// Returns the current considered set, recomputing it first if stale.
    pub fn considered(&mut self) -> &Bitmap {
        self.make_considered_ready();
        &self.considered_map
    }

    /// Returns `true` if `id` is currently visible under the considered set.
    pub fn is_considered(&mut self, id: SolvableId) -> bool {
        self.make_considered_ready();
        self.considered_map.get(id.0)
    }

    /// Returns every currently-considered solvable id.
    ///
    /// Does not refresh a stale considered set; callers that have just
    /// mutated excludes/includes should call [`Sack::make_considered_ready`]
    /// first. Kept immutable so it can be called while a [`dnf_common`]
    /// consumer (e.g. a query) only holds `&Sack`.
    pub fn considered_ids(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.considered_map.iter_set().map(SolvableId)
    }

    /// Returns the solvable id of the running kernel, detected once via
    /// `probe` and memoized thereafter.
    pub fn running_kernel_id(&mut self, probe: impl FnOnce(&Sack) -> Option<SolvableId>) -> Option<SolvableId> {
        if let Some(cached) = self.running_kernel_id_cache {
            return cached;
        }
        let found = probe(self);
        self.running_kernel_id_cache = Some(found);
        found
    }

    /// Returns every solvable id whose name matches `name` across the whole pool.
    pub fn ids_by_name(&self, name: &Name) -> Vec<SolvableId> {
        self.pool
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| (&s.name == name).then_some(SolvableId(idx)))
            .collect()
    }

    /// Returns the install root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Returns the distinct architectures among currently-considered
    /// solvables. Does not refresh a stale considered set; see
    /// [`Sack::considered_ids`].
    pub fn known_arches(&self) -> std::collections::BTreeSet<&str> {
        self.considered_ids().map(|id| self.solvable(id).arch.as_str()).collect()
    }

    /// Returns every solvable id owned by `repo_id`, regardless of considered state.
    pub fn repo_solvable_ids(&self, repo_id: RepoId) -> impl Iterator<Item = SolvableId> + '_ {
        self.repos[repo_id.0].solvable_range.clone().map(SolvableId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnf_rpm::InMemoryRpmBackend;
    use testresult::TestResult;

    fn record(name: &str) -> SolvableRecord {
        SolvableRecord {
            name: name.to_string(),
            version: "1.0".to_string(),
            release: "1".to_string(),
            arch: "noarch".to_string(),
            ..SolvableRecord::default()
        }
    }

    #[test]
    fn considered_excludes_then_includes() -> TestResult {
        let mut sack = Sack::new();
        let source = crate::metadata::InMemoryMetadataSource::new(
            "cksum-1",
            vec![record("alpha"), record("beta"), record("gamma")],
        );
        let repo_id = sack.load_repo("fedora", &source, LoadFlags::default())?;
        let _ = repo_id;

        let alpha = sack.ids_by_name(&Name::new("alpha")?)[0];
        let beta = sack.ids_by_name(&Name::new("beta")?)[0];
        let gamma = sack.ids_by_name(&Name::new("gamma")?)[0];

        sack.add_excludes([beta]);
        sack.make_considered_ready();
        assert!(sack.is_considered(alpha));
        assert!(!sack.is_considered(beta));
        assert!(sack.is_considered(gamma));

        sack.add_includes([alpha]);
        sack.make_considered_ready();
        assert!(sack.is_considered(alpha));
        assert!(!sack.is_considered(gamma));
        Ok(())
    }

    #[test]
    fn system_repo_always_visible_despite_includes() -> TestResult {
        let mut sack = Sack::new();
        let mut backend = InMemoryRpmBackend::new();
        backend.seed_installed(
            Name::new("glibc")?,
            dnf_types::Evr::new(0, dnf_types::VerString::new("2.39")?, dnf_types::VerString::new("1")?),
            "x86_64",
        );
        sack.load_system_repo(&backend, LoadFlags::default())?;

        let source = crate::metadata::InMemoryMetadataSource::new("cksum-2", vec![record("curl")]);
        sack.load_repo("fedora", &source, LoadFlags::default())?;

        let curl = sack.ids_by_name(&Name::new("curl")?)[0];
        sack.add_includes([curl]);
        sack.make_considered_ready();

        let glibc = sack.ids_by_name(&Name::new("glibc")?)[0];
        assert!(sack.is_considered(glibc), "system repo solvables must remain visible");
        assert!(sack.is_considered(curl));
        Ok(())
    }

    #[test]
    fn use_includes_false_bypasses_global_includes_for_that_repo() -> TestResult {
        let mut sack = Sack::new();
        let source_a = crate::metadata::InMemoryMetadataSource::new("a", vec![record("alpha")]);
        sack.load_repo("repo-a", &source_a, LoadFlags::default())?;
        let source_b = crate::metadata::InMemoryMetadataSource::new("b", vec![record("beta")]);
        sack.load_repo("repo-b", &source_b, LoadFlags::default())?;

        sack.set_use_includes("repo-b", false)?;
        let alpha = sack.ids_by_name(&Name::new("alpha")?)[0];
        sack.add_includes([alpha]);
        sack.make_considered_ready();

        let beta = sack.ids_by_name(&Name::new("beta")?)[0];
        assert!(sack.is_considered(alpha));
        assert!(sack.is_considered(beta), "repo-b opted out of includes filtering");
        Ok(())
    }

    #[test]
    fn make_considered_ready_is_idempotent() -> TestResult {
        let mut sack = Sack::new();
        let source = crate::metadata::InMemoryMetadataSource::new("a", vec![record("alpha")]);
        sack.load_repo("repo-a", &source, LoadFlags::default())?;
        sack.make_considered_ready();
        let first = sack.considered().clone();
        sack.make_considered_ready();
        assert_eq!(first, *sack.considered());
        Ok(())
    }
}
