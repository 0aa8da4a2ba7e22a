//! The process-wide lock manager.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use dnf_common::Error;

use crate::types::{LockMode, LockType};

struct LockItem {
    id: u32,
    lock_type: LockType,
    mode: LockMode,
    owner: ThreadId,
    refcount: u32,
}

/// Tracks every lock currently held by this process, backed by lock files
/// under `lock_dir` for process-mode locks.
///
/// A single [`LockManager`] is meant to be shared (behind an [`std::sync::Arc`])
/// by every sack/goal/transaction in a process; `dnf-core` owns the one
/// process-wide instance.
#[derive(Debug)]
pub struct LockManager {
    lock_dir: PathBuf,
    items: Mutex<Vec<LockItem>>,
    next_id: AtomicU32,
}

impl LockManager {
    /// Creates a new lock manager backed by lock files under `lock_dir`.
    pub fn new(lock_dir: impl Into<PathBuf>) -> Self {
        LockManager {
            lock_dir: lock_dir.into(),
            items: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    fn filename_for_type(&self, lock_type: LockType) -> PathBuf {
        self.lock_dir.join(format!("dnf-{lock_type}.lock"))
    }

    /// Attempts to take a lock of the given `type` and `mode`.
    ///
    /// Returns a lock id to pass to [`LockManager::release`]. If this thread
    /// (or, for a thread-mode request, this thread's own process-mode lock
    /// of the same type) already holds the lock, the refcount is bumped
    /// instead of creating a new entry.
    pub fn take(&self, lock_type: LockType, mode: LockMode) -> Result<u32, Error> {
        let mut items = self.items.lock().expect("lock manager mutex poisoned");
        let current_thread = thread::current().id();

        let existing_idx = items
            .iter()
            .position(|item| item.lock_type == lock_type && item.mode == mode)
            .or_else(|| {
                if mode == LockMode::Thread {
                    items
                        .iter()
                        .position(|item| item.lock_type == lock_type && item.mode == LockMode::Process)
                } else {
                    None
                }
            });

        if existing_idx.is_none() && mode == LockMode::Process {
            self.claim_process_lockfile(lock_type)?;
        }

        match existing_idx {
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                items.push(LockItem {
                    id,
                    lock_type,
                    mode,
                    owner: current_thread,
                    refcount: 1,
                });
                Ok(id)
            }
            Some(idx) => {
                if items[idx].owner != current_thread {
                    return Err(Error::CannotGetLock {
                        lock: format!("{lock_type}[{}]", mode_str(mode)),
                        holder: Some(format!("thread {:?}", items[idx].owner)),
                    });
                }
                items[idx].refcount += 1;
                Ok(items[idx].id)
            }
        }
    }

    /// Releases the lock identified by `id`, decrementing its refcount.
    ///
    /// A process-mode lock's lock file is unlinked when its refcount reaches zero.
    pub fn release(&self, id: u32) -> Result<(), Error> {
        let mut items = self.items.lock().expect("lock manager mutex poisoned");
        let idx = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| Error::Internal {
                context: format!("lock was never taken with id {id}"),
            })?;

        if items[idx].owner != thread::current().id() {
            return Err(Error::Internal {
                context: format!("lock {} was not taken by this thread", items[idx].lock_type),
            });
        }

        items[idx].refcount -= 1;
        if items[idx].refcount == 0 {
            let item = items.remove(idx);
            if item.mode == LockMode::Process {
                let path = self.filename_for_type(item.lock_type);
                fs::remove_file(&path).map_err(|source| Error::Io {
                    context: format!("removing lock file {}", path.display()),
                    source,
                })?;
            }
        }
        Ok(())
    }

    /// Releases the lock identified by `id`, logging rather than returning an error on failure.
    ///
    /// Mirrors the common "best-effort unlock during teardown" pattern; callers
    /// that need to know whether the release succeeded should use [`LockManager::release`].
    pub fn release_noerror(&self, id: u32) {
        if let Err(err) = self.release(id) {
            log::warn!("handled locally: {err}");
        }
    }

    fn claim_process_lockfile(&self, lock_type: LockType) -> Result<(), Error> {
        let path = self.filename_for_type(lock_type);
        if path.exists() {
            let pid = read_pid(&path)?;
            if process_is_running(pid) {
                let cmdline = cmdline_for_pid(pid);
                return Err(Error::CannotGetLock {
                    lock: format!("{lock_type}[process]"),
                    holder: Some(cmdline),
                });
            }
        }
        fs::write(&path, std::process::id().to_string()).map_err(|source| Error::CannotGetLock {
            lock: format!("{lock_type}[process]"),
            holder: Some(format!("failed to write lock file: {source}")),
        })
    }
}

impl Drop for LockManager {
    /// Releases any lock still held at shutdown, logging a warning for each one.
    fn drop(&mut self) {
        let items = self.items.get_mut().expect("lock manager mutex poisoned");
        for item in items.drain(..) {
            if item.refcount == 0 {
                continue;
            }
            log::warn!("held lock {} at shutdown", item.lock_type);
            if item.mode == LockMode::Process {
                let _ = fs::remove_file(self.filename_for_type(item.lock_type));
            }
        }
    }
}

fn mode_str(mode: LockMode) -> &'static str {
    match mode {
        LockMode::Thread => "thread",
        LockMode::Process => "process",
    }
}

fn read_pid(path: &Path) -> Result<u32, Error> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Io {
        context: format!("reading lock file {}", path.display()),
        source,
    })?;
    contents.trim().parse::<u32>().map_err(|_| Error::FileInvalid {
        path: path.to_path_buf(),
        reason: format!("failed to parse pid from lock file contents: {contents:?}"),
    })
}

fn process_is_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}/cmdline")).exists()
}

fn cmdline_for_pid(pid: u32) -> String {
    match fs::read_to_string(format!("/proc/{pid}/cmdline")) {
        Ok(data) => format!("{}({pid})", data.replace('\0', " ").trim()),
        Err(err) => {
            log::warn!("failed to get cmdline for pid {pid}: {err}");
            format!("unknown({pid})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn same_thread_can_reacquire_thread_lock() -> TestResult {
        let dir = tempfile::tempdir()?;
        let manager = LockManager::new(dir.path());
        let id1 = manager.take(LockType::Rpmdb, LockMode::Thread)?;
        let id2 = manager.take(LockType::Rpmdb, LockMode::Thread)?;
        assert_eq!(id1, id2);
        manager.release(id1)?;
        manager.release(id2)?;
        Ok(())
    }

    #[test]
    fn process_lock_writes_and_removes_lock_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let manager = LockManager::new(dir.path());
        let id = manager.take(LockType::Metadata, LockMode::Process)?;
        let path = dir.path().join("dnf-metadata.lock");
        assert!(path.exists());
        manager.release(id)?;
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn thread_lock_falls_back_to_process_lock_of_same_type() -> TestResult {
        let dir = tempfile::tempdir()?;
        let manager = LockManager::new(dir.path());
        let process_id = manager.take(LockType::Config, LockMode::Process)?;
        let thread_id = manager.take(LockType::Config, LockMode::Thread)?;
        assert_eq!(process_id, thread_id);
        manager.release(process_id)?;
        manager.release(thread_id)?;
        Ok(())
    }

    #[test]
    fn release_of_unknown_id_is_an_internal_error() -> TestResult {
        let dir = tempfile::tempdir()?;
        let manager = LockManager::new(dir.path());
        assert!(manager.release(9999).is_err());
        Ok(())
    }

    #[test]
    fn stale_lock_file_is_reclaimed() -> TestResult {
        let dir = tempfile::tempdir()?;
        let manager = LockManager::new(dir.path());
        // PID 1 exists in essentially every environment but is never this test
        // process; use a PID that cannot possibly be running instead.
        fs::write(dir.path().join("dnf-rpmdb.lock"), "999999999")?;
        let id = manager.take(LockType::Rpmdb, LockMode::Process)?;
        manager.release(id)?;
        Ok(())
    }
}
