//! The append-only history store: one JSON Lines record per committed (or
//! failed) transaction, keyed by an incrementing transaction id.
//!
//! `list_transactions`/`last_transaction` go beyond what §3/§4.4 literally
//! ask for ("records its run in the history store bracketed by rpmdb version
//! checksums"), since a store that can only append is not independently
//! testable against §8's durability invariant.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use dnf_common::Error;

/// What a single package in a transaction record was done to, per §4.4's
/// action classification.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum HistoryAction {
    /// Newly installed.
    Install,
    /// Replaced an older installed package of the same name.
    Upgraded,
    /// Replaced a newer installed package of the same name.
    Downgraded,
    /// Re-applied at the same NEVRA already installed.
    Reinstalled,
    /// Removed, explicitly or by a plain conflict (not an obsoletion).
    Erased,
    /// Removed because another package in the new state obsoletes it.
    Obsoleted,
}

/// One package entry in a [`TransactionRecord`].
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct HistoryItem {
    /// The package's NEVRA, rendered as a display string.
    pub nevra: String,
    /// What was done to it.
    pub action: HistoryAction,
}

/// Whether a committed transaction ran to completion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum TransactionOutcome {
    /// The RPM transaction completed and the sack was invalidated.
    Done,
    /// The RPM transaction reported a fatal problem; rpmdb is unchanged.
    Failed,
}

/// One completed (or failed) transaction, as appended by
/// [`crate::Transaction::commit`].
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TransactionRecord {
    /// A monotonically increasing id, unique within one history store.
    pub id: u64,
    /// Unix timestamp of when `commit` started.
    pub begin_ts: u64,
    /// Unix timestamp of when `commit` finished.
    pub end_ts: u64,
    /// Whether the transaction succeeded.
    pub state: TransactionOutcome,
    /// The rpmdb version checksum before the transaction ran.
    pub rpmdb_version_begin: String,
    /// The rpmdb version checksum after the transaction ran (equal to
    /// `rpmdb_version_begin` on failure).
    pub rpmdb_version_end: String,
    /// The uid of the user who ran the transaction.
    pub uid: u32,
    /// Every package the transaction touched.
    pub items: Vec<HistoryItem>,
}

/// An append-only, JSON-Lines-backed history of every transaction commit
/// attempt, keyed by transaction id (§3, "Transaction ... Records its run in
/// the history store bracketed by rpmdb version checksums").
#[derive(Clone, Debug)]
pub struct History {
    path: PathBuf,
}

impl History {
    /// Opens (without requiring it to exist yet) the history store backed
    /// by the JSON Lines file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        History { path: path.into() }
    }

    /// Appends `record` to the store.
    pub fn append(&self, record: &TransactionRecord) -> Result<(), Error> {
        let mut line = serde_json::to_string(record).map_err(|err| Error::FileInvalid {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::Io {
                context: format!("opening history store {}", self.path.display()),
                source,
            })?;
        file.write_all(line.as_bytes()).map_err(|source| Error::Io {
            context: format!("appending to history store {}", self.path.display()),
            source,
        })
    }

    /// Returns every recorded transaction, oldest first.
    ///
    /// Returns an empty list if the store has never been written to.
    pub fn list_transactions(&self) -> Result<Vec<TransactionRecord>, Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| Error::Io {
            context: format!("reading history store {}", self.path.display()),
            source,
        })?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|err| Error::FileInvalid {
                    path: self.path.clone(),
                    reason: err.to_string(),
                })
            })
            .collect()
    }

    /// Returns the most recently appended transaction, if any.
    pub fn last_transaction(&self) -> Result<Option<TransactionRecord>, Error> {
        Ok(self.list_transactions()?.into_iter().next_back())
    }

    /// The id the next [`TransactionRecord`] appended to this store should use.
    pub fn next_id(&self) -> Result<u64, Error> {
        Ok(self.list_transactions()?.last().map_or(1, |record| record.id + 1))
    }

    /// The path backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    fn record(id: u64, state: TransactionOutcome) -> TransactionRecord {
        TransactionRecord {
            id,
            begin_ts: 1000,
            end_ts: 1001,
            state,
            rpmdb_version_begin: "0:abc".to_string(),
            rpmdb_version_end: "1:def".to_string(),
            uid: 0,
            items: vec![HistoryItem {
                nevra: "foo-1.0-1.x86_64".to_string(),
                action: HistoryAction::Install,
            }],
        }
    }

    #[test]
    fn empty_store_has_no_transactions() -> TestResult {
        let dir = tempfile::tempdir()?;
        let history = History::new(dir.path().join("history.jsonl"));
        assert!(history.list_transactions()?.is_empty());
        assert!(history.last_transaction()?.is_none());
        assert_eq!(history.next_id()?, 1);
        Ok(())
    }

    #[test]
    fn appended_records_round_trip_in_order() -> TestResult {
        let dir = tempfile::tempdir()?;
        let history = History::new(dir.path().join("history.jsonl"));
        history.append(&record(1, TransactionOutcome::Done))?;
        history.append(&record(2, TransactionOutcome::Failed))?;

        let all = history.list_transactions()?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[1].state, TransactionOutcome::Failed);

        let last = history.last_transaction()?.unwrap();
        assert_eq!(last.id, 2);
        assert_eq!(history.next_id()?, 3);
        Ok(())
    }
}
