//! splitchain-storage-json
//!
//! Filesystem-backed JSON implementation of [`LedgerStore`]. Each record kind
//! lives in its own collection file under the data root; snapshots of all
//! collections can be written to a rotating backup directory.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use splitchain_core::{storage::LedgerStore, CoreError};
use splitchain_domain::{Expense, Group, Member, Transaction};

const EXTENSION: &str = "json";
const GROUPS_FILE: &str = "groups";
const EXPENSES_FILE: &str = "expenses";
const TRANSACTIONS_FILE: &str = "transactions";
const MEMBERS_FILE: &str = "saved_members";
const BACKUP_PREFIX: &str = "splitchain";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonLedgerStore`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    /// `<base>/data` and `<base>/backups`.
    pub fn under(base: &Path) -> Self {
        Self {
            data_root: base.join("data"),
            backup_root: base.join("backups"),
        }
    }
}

/// Every collection at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub saved_members: Vec<Member>,
}

/// Describes a persisted snapshot file.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// JSON collection files guarded by an in-process write lock.
///
/// The lock serializes read-modify-write cycles within one process only.
#[derive(Debug)]
pub struct JsonLedgerStore {
    paths: StoragePaths,
    retention: usize,
    write_lock: Mutex<()>,
}

impl JsonLedgerStore {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
            write_lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.paths
            .data_root
            .join(format!("{}.{}", collection, EXTENSION))
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot, CoreError> {
        Ok(LedgerSnapshot {
            groups: self.read(GROUPS_FILE)?,
            expenses: self.read(EXPENSES_FILE)?,
            transactions: self.read(TRANSACTIONS_FILE)?,
            saved_members: self.read(MEMBERS_FILE)?,
        })
    }

    /// Writes a snapshot of every collection and prunes old backups.
    ///
    /// Backups taken within the same second get increasing sequence numbers,
    /// so an existing backup file is never overwritten.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        let _guard = self.lock()?;
        let snapshot = self.snapshot()?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = self.next_backup_stem(&timestamp)?;
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let id = format!("{}.{}", stem, EXTENSION);
        let path = self.paths.backup_root.join(&id);
        write_atomic(&path, &to_json(&snapshot)?)?;
        self.prune_backups()?;
        info!("wrote ledger backup {}", id);
        Ok(BackupInfo {
            created_at: parse_backup_timestamp(&id),
            id,
            path,
        })
    }

    /// Lists backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        if !self.paths.backup_root.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.paths.backup_root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(BackupInfo {
                    id: name.to_string(),
                    created_at: parse_backup_timestamp(name),
                    path: path.clone(),
                });
            }
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.id.clone())));
        Ok(entries)
    }

    /// Replaces every collection with the contents of `backup`.
    pub fn restore_backup(&self, backup: &BackupInfo) -> Result<LedgerSnapshot, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let data = fs::read_to_string(&backup.path)?;
        let snapshot: LedgerSnapshot =
            serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
        let _guard = self.lock()?;
        self.write(GROUPS_FILE, &snapshot.groups)?;
        self.write(EXPENSES_FILE, &snapshot.expenses)?;
        self.write(TRANSACTIONS_FILE, &snapshot.transactions)?;
        self.write(MEMBERS_FILE, &snapshot.saved_members)?;
        info!("restored ledger backup {}", backup.id);
        Ok(snapshot)
    }

    fn next_backup_stem(&self, timestamp: &str) -> Result<String, CoreError> {
        let mut taken = Vec::new();
        for entry in fs::read_dir(&self.paths.backup_root)? {
            if let Some(name) = entry?.file_name().to_str() {
                taken.push(name.to_string());
            }
        }
        let mut seq = 0u32;
        loop {
            let stem = format!("{}_{}_{:03}", BACKUP_PREFIX, timestamp, seq);
            let clash = taken.iter().any(|name| {
                name.strip_prefix(&stem)
                    .is_some_and(|rest| rest.starts_with('_') || rest.starts_with('.'))
            });
            if !clash {
                return Ok(stem);
            }
            seq += 1;
        }
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            debug!("pruning backup {}", entry.id);
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.write_lock
            .lock()
            .map_err(|_| CoreError::Storage("storage write lock poisoned".into()))
    }

    fn read<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, CoreError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
    }

    fn write<T: Serialize>(&self, collection: &str, items: &[T]) -> Result<(), CoreError> {
        let path = self.collection_path(collection);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &to_json(&items)?)?;
        fs::rename(&tmp, &path)?;
        debug!("wrote {} record(s) to {}", items.len(), path.display());
        Ok(())
    }

    fn upsert<T>(&self, collection: &str, item: &T, key: impl Fn(&T) -> Uuid) -> Result<(), CoreError>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let _guard = self.lock()?;
        let mut items: Vec<T> = self.read(collection)?;
        let id = key(item);
        match items.iter_mut().find(|existing| key(existing) == id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        self.write(collection, &items)
    }

    fn remove<T>(&self, collection: &str, id: Uuid, key: impl Fn(&T) -> Uuid) -> Result<(), CoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.lock()?;
        let mut items: Vec<T> = self.read(collection)?;
        let before = items.len();
        items.retain(|item| key(item) != id);
        if items.len() != before {
            self.write(collection, &items)?;
        }
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn get_group(&self, id: Uuid) -> Result<Option<Group>, CoreError> {
        Ok(self
            .read::<Group>(GROUPS_FILE)?
            .into_iter()
            .find(|group| group.id == id))
    }

    fn list_groups(&self) -> Result<Vec<Group>, CoreError> {
        self.read(GROUPS_FILE)
    }

    fn save_group(&self, group: &Group) -> Result<(), CoreError> {
        self.upsert(GROUPS_FILE, group, |g: &Group| g.id)
    }

    fn delete_group(&self, id: Uuid) -> Result<(), CoreError> {
        self.remove(GROUPS_FILE, id, |g: &Group| g.id)
    }

    fn get_expense(&self, id: Uuid) -> Result<Option<Expense>, CoreError> {
        Ok(self
            .read::<Expense>(EXPENSES_FILE)?
            .into_iter()
            .find(|expense| expense.id == id))
    }

    fn get_expenses_by_group(&self, group_id: Uuid) -> Result<Vec<Expense>, CoreError> {
        Ok(self
            .read::<Expense>(EXPENSES_FILE)?
            .into_iter()
            .filter(|expense| expense.group_id == group_id)
            .collect())
    }

    fn save_expense(&self, expense: &Expense) -> Result<(), CoreError> {
        self.upsert(EXPENSES_FILE, expense, |e: &Expense| e.id)
    }

    fn delete_expense(&self, id: Uuid) -> Result<(), CoreError> {
        self.remove(EXPENSES_FILE, id, |e: &Expense| e.id)
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.read(TRANSACTIONS_FILE)
    }

    fn save_transaction(&self, transaction: &Transaction) -> Result<(), CoreError> {
        self.upsert(TRANSACTIONS_FILE, transaction, |t: &Transaction| t.id)
    }

    fn delete_transaction(&self, id: Uuid) -> Result<(), CoreError> {
        self.remove(TRANSACTIONS_FILE, id, |t: &Transaction| t.id)
    }

    fn saved_members(&self) -> Result<Vec<Member>, CoreError> {
        self.read(MEMBERS_FILE)
    }

    fn save_members(&self, members: &[Member]) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        self.write(MEMBERS_FILE, members)
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", EXTENSION))?;
    let mut segments = stem.split('_').skip(1);
    let date = segments.next()?;
    let time = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CoreError> {
    serde_json::to_string_pretty(value).map_err(|err| CoreError::Serde(err.to_string()))
}
