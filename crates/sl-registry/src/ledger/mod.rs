//! Ledger Store
//!
//! Holds subscription records, the event log and the audit log behind one
//! lock, so a commit writes all three or none of them.
//!
//! With a snapshot path configured, every commit is appended as one JSON
//! line to a journal next to the snapshot before it becomes visible.
//! Opening the ledger loads the snapshot, replays the journal on top of it
//! and folds both back into a fresh snapshot.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::audit::AuditLog;
use crate::event::Event;
use crate::shared::error::{RegistryError, Result};
use crate::subscription::entity::Subscription;

const SNAPSHOT_FORMAT: u32 = 1;

/// Everything the ledger stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub subscriptions: BTreeMap<u64, Subscription>,
    pub events: Vec<Event>,
    pub audit_logs: Vec<AuditLog>,
}

impl LedgerState {
    /// Sequence number the next appended event receives.
    pub fn next_sequence(&self) -> u64 {
        self.events.last().map(|e| e.sequence + 1).unwrap_or(1)
    }

    fn apply(&mut self, entry: LedgerEntry) {
        self.subscriptions.insert(entry.subscription.id, entry.subscription);
        self.events.push(entry.event);
        self.audit_logs.push(entry.audit_log);
    }
}

/// One commit: the record as it now stands, its event and its audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub subscription: Subscription,
    pub event: Event,
    pub audit_log: AuditLog,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    format: u32,
    state: LedgerState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    format: u32,
    state: &'a LedgerState,
}

/// Append-only file of [`LedgerEntry`] lines. Opened on first append.
struct Journal {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    /// Bytes known to end on a line boundary
    len: u64,
}

impl Journal {
    fn new(path: PathBuf) -> Self {
        Self { path, file: None, len: 0 }
    }

    async fn append(&mut self, entry: &LedgerEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        if let Err(e) = self.write_line(&line).await {
            // Cut any partial line so the next append starts clean
            if let Some(file) = self.file.as_mut() {
                if let Err(trim) = file.set_len(self.len).await {
                    warn!(path = %self.path.display(), error = %trim, "Failed to trim journal after write error");
                }
            }
            return Err(e);
        }

        self.len += line.len() as u64;
        Ok(())
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                ensure_parent(&self.path).await?;
                tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .await?
            }
        };
        let file = self.file.insert(file);
        file.write_all(line).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    /// Empty the journal once its entries are in the snapshot.
    async fn reset(&mut self) -> Result<()> {
        self.file = None;
        let file = tokio::fs::File::create(&self.path).await?;
        file.sync_all().await?;
        self.len = 0;
        Ok(())
    }
}

/// In-process ledger with optional snapshot + journal persistence.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    /// Serializes commits; holds the journal when persistence is on
    writer: Mutex<Option<Journal>>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryLedger {
    /// Volatile ledger; state lives as long as the value.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            writer: Mutex::new(None),
            snapshot_path: None,
        }
    }

    /// Ledger persisted at `path`.
    ///
    /// Restores the snapshot if one exists, replays the journal written
    /// since, then compacts both into a new snapshot.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut state = if exists(&path).await {
            let state = load_snapshot(&path).await?;
            info!(
                path = %path.display(),
                subscriptions = state.subscriptions.len(),
                events = state.events.len(),
                "Restored ledger snapshot"
            );
            state
        } else {
            info!(path = %path.display(), "No ledger snapshot found, starting empty");
            LedgerState::default()
        };

        let journal_path = sibling(&path, ".journal");
        let journal_len = if exists(&journal_path).await {
            let replayed = replay_journal(&journal_path, &mut state).await?;
            info!(path = %journal_path.display(), entries = replayed.entries, "Replayed ledger journal");
            replayed.file_len
        } else {
            0
        };

        let ledger = Self {
            state: RwLock::new(state),
            writer: Mutex::new(Some(Journal::new(journal_path))),
            snapshot_path: Some(path),
        };
        // Also clears a torn tail, so new lines never follow a partial one
        if journal_len > 0 {
            ledger.compact().await?;
        }
        Ok(ledger)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Run `f` against a consistent view of the state.
    pub fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.state.read())
    }

    /// Commit the entry `prepare` builds from the current state.
    ///
    /// Commits run one at a time. `prepare` sees the state under a read
    /// lock; the journal write happens with no lock on the state, so
    /// readers keep going while it is on disk. If `prepare` fails or the
    /// journal cannot be written, the state is exactly what it was.
    pub async fn append<E>(
        &self,
        prepare: impl FnOnce(&LedgerState) -> std::result::Result<LedgerEntry, E> + Send,
    ) -> std::result::Result<(), E>
    where
        E: From<RegistryError> + Send,
    {
        let mut journal = self.writer.lock().await;

        let entry = self.read(prepare)?;

        if let Some(journal) = journal.as_mut() {
            if let Err(e) = journal.append(&entry).await {
                error!(path = %journal.path.display(), error = %e, "Failed to append ledger journal");
                return Err(e.into());
            }
            debug!(path = %journal.path.display(), sequence = entry.event.sequence, "Ledger journal entry written");
        }

        self.state.write().apply(entry);
        Ok(())
    }

    /// Write the whole state to the snapshot and empty the journal.
    ///
    /// No-op for a volatile ledger.
    pub async fn compact(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let mut journal = self.writer.lock().await;

        // Writers wait on the lock above, so the state cannot move under us
        let (bytes, events) = self.read(|state| -> Result<_> {
            let snapshot = SnapshotRef {
                format: SNAPSHOT_FORMAT,
                state,
            };
            Ok((serde_json::to_vec_pretty(&snapshot)?, state.events.len()))
        })?;

        save_snapshot(path, &bytes).await?;
        if let Some(journal) = journal.as_mut() {
            journal.reset().await?;
        }
        info!(path = %path.display(), events, "Ledger compacted into snapshot");
        Ok(())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}

async fn load_snapshot(path: &Path) -> Result<LedgerState> {
    let bytes = tokio::fs::read(path).await?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(RegistryError::storage(format!(
            "Unsupported snapshot format {} in {}",
            snapshot.format,
            path.display()
        )));
    }
    Ok(snapshot.state)
}

/// Write to a sibling temp file, then rename over the old snapshot.
async fn save_snapshot(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path).await?;

    let tmp_path = sibling(path, ".tmp");
    {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
    }
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

struct Replayed {
    entries: usize,
    file_len: u64,
}

/// Apply journal entries newer than `state`.
///
/// Entries already in the snapshot are skipped by sequence. An unterminated
/// last line is a torn write and is dropped; any other unreadable line is
/// corruption.
async fn replay_journal(path: &Path, state: &mut LedgerState) -> Result<Replayed> {
    let bytes = tokio::fs::read(path).await?;
    let complete = bytes.iter().rposition(|b| *b == b'\n').map(|i| i + 1).unwrap_or(0);
    if complete < bytes.len() {
        warn!(
            path = %path.display(),
            dropped_bytes = bytes.len() - complete,
            "Dropping torn tail from ledger journal"
        );
    }

    let mut entries = 0;
    for (index, line) in bytes[..complete].split(|b| *b == b'\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        let entry: LedgerEntry = serde_json::from_slice(line).map_err(|e| {
            RegistryError::storage(format!(
                "Corrupt journal entry at line {} in {}: {}",
                index + 1,
                path.display(),
                e
            ))
        })?;

        let expected = state.next_sequence();
        if entry.event.sequence < expected {
            continue;
        }
        if entry.event.sequence != expected {
            return Err(RegistryError::storage(format!(
                "Journal entry at line {} has sequence {}, expected {}",
                index + 1,
                entry.event.sequence,
                expected
            )));
        }
        state.apply(entry);
        entries += 1;
    }

    Ok(Replayed {
        entries,
        file_len: bytes.len() as u64,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use serde::Serialize;

    use super::LedgerEntry;
    use crate::audit::AuditLog;
    use crate::event::Event;
    use crate::subscription::entity::Subscription;
    use crate::subscription::operations::ContractCreated;
    use crate::usecase::ExecutionContext;

    #[derive(Serialize)]
    struct SeedCommand {
        subscription_id: u64,
    }

    /// Entry recording `subscription` as created, at `sequence`.
    pub fn entry(subscription: Subscription, sequence: u64) -> LedgerEntry {
        let ctx = ExecutionContext::create(subscription.producer.clone());
        let event = ContractCreated::new(&ctx, &subscription);
        let command = SeedCommand {
            subscription_id: subscription.id,
        };
        LedgerEntry {
            event: Event::record(&event, subscription.id, sequence),
            audit_log: AuditLog::for_command("Subscription", subscription.id, &event, &command),
            subscription,
        }
    }
}
