use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use dairy_core::{
    storage::{Collection, CollectionStorage, SnapshotInfo},
    CoreError,
};
use dairy_domain::DairyBook;
use serde::{de::DeserializeOwned, Serialize};

const FILE_EXTENSION: &str = "json";
const SNAPSHOT_PREFIX: &str = "snapshot";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonCollectionStorage`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
}

impl StoragePaths {
    pub fn under(base: &Path) -> Self {
        Self {
            data_root: base.join("data"),
            backup_root: base.join("backups"),
        }
    }
}

/// Filesystem-backed JSON persistence: one array file per collection plus snapshot backups.
#[derive(Clone)]
pub struct JsonCollectionStorage {
    data_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonCollectionStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            data_dir: paths.data_root,
            backups_dir: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", collection.name(), FILE_EXTENSION))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    fn load_collection<T>(&self, collection: Collection) -> Result<Vec<T>, CoreError>
    where
        T: DeserializeOwned,
    {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|err| {
            CoreError::Serde(format!("{}: {}", collection.name(), err))
        })
    }

    fn write_collection<T>(&self, collection: Collection, records: &[T]) -> Result<(), CoreError>
    where
        T: Serialize,
    {
        let path = self.collection_path(collection);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &serialize(records)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn next_snapshot_dir(&self, note: Option<&str>) -> (String, String, PathBuf) {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", SNAPSHOT_PREFIX, timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let id = match self.highest_counter(&stem) {
            Some(highest) => format!("{}_{}", stem, highest.max(1) + 1),
            None => stem,
        };
        let path = self.backups_dir.join(&id);
        (id, timestamp, path)
    }

    /// Highest collision counter used by snapshots named `stem`; the bare stem counts as 1.
    fn highest_counter(&self, stem: &str) -> Option<u32> {
        let entries = fs::read_dir(&self.backups_dir).ok()?;
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter_map(|name| {
                if name == stem {
                    Some(1)
                } else {
                    name.strip_prefix(stem)?
                        .strip_prefix('_')?
                        .parse::<u32>()
                        .ok()
                }
            })
            .max()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        let entries = self.list_backups()?;
        for entry in entries.into_iter().skip(self.retention) {
            let _ = fs::remove_dir_all(entry.path);
        }
        Ok(())
    }
}

impl CollectionStorage for JsonCollectionStorage {
    fn load_book(&self) -> Result<DairyBook, CoreError> {
        Ok(DairyBook {
            customers: self.load_collection(Collection::Customers)?,
            catalog: dairy_domain::Catalog::new(self.load_collection(Collection::Products)?),
            deliveries: self.load_collection(Collection::Deliveries)?,
            sales: self.load_collection(Collection::Sales)?,
            payments: self.load_collection(Collection::Payments)?,
            monthly_records: self.load_collection(Collection::MonthlyRecords)?,
        })
    }

    fn save_collection(&self, book: &DairyBook, collection: Collection) -> Result<(), CoreError> {
        match collection {
            Collection::Customers => self.write_collection(collection, &book.customers),
            Collection::Products => self.write_collection(collection, &book.catalog.products),
            Collection::Deliveries => self.write_collection(collection, &book.deliveries),
            Collection::Sales => self.write_collection(collection, &book.sales),
            Collection::Payments => self.write_collection(collection, &book.payments),
            Collection::MonthlyRecords => {
                self.write_collection(collection, &book.monthly_records)
            }
        }
    }

    fn backup(&self, note: Option<&str>) -> Result<SnapshotInfo, CoreError> {
        let (id, created_at, dir) = self.next_snapshot_dir(note);
        fs::create_dir_all(&dir)?;
        for collection in Collection::ALL {
            let source = self.collection_path(collection);
            if source.exists() {
                fs::copy(&source, dir.join(file_name(collection)))?;
            }
        }
        self.prune_backups()?;
        Ok(SnapshotInfo {
            id,
            created_at,
            path: dir,
        })
    }

    fn list_backups(&self) -> Result<Vec<SnapshotInfo>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(id) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if parse_backup_timestamp(id).is_none() {
                continue;
            }
            entries.push(SnapshotInfo {
                id: id.to_string(),
                created_at: id.to_string(),
                path: path.clone(),
            });
        }
        entries.sort_by_key(|info| Reverse(snapshot_order(info)));
        Ok(entries)
    }

    fn restore_backup(&self, backup: &SnapshotInfo) -> Result<DairyBook, CoreError> {
        if !backup.path.is_dir() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        for collection in Collection::ALL {
            let source = backup.path.join(file_name(collection));
            let target = self.collection_path(collection);
            if source.exists() {
                let tmp = tmp_path(&target);
                fs::copy(&source, &tmp)?;
                fs::rename(&tmp, &target)?;
            } else if target.exists() {
                fs::remove_file(&target)?;
            }
        }
        self.load_book()
    }
}

fn file_name(collection: Collection) -> String {
    format!("{}.{}", collection.name(), FILE_EXTENSION)
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

/// Reads the `YYYYMMDD_HHMM` part of `snapshot_YYYYMMDD_HHMM[_note][_n]`.
fn parse_backup_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let mut segments = id.split('_');
    if segments.next()? != SNAPSHOT_PREFIX {
        return None;
    }
    let date = segments.next()?;
    let time = segments.next()?;
    if !is_digits(date, 8) || !is_digits(time, 4) {
        return None;
    }
    let raw = format!("{}{}", date, time);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Minute stamp first, then the collision counter for snapshots taken within the same minute.
fn snapshot_order(info: &SnapshotInfo) -> (Option<DateTime<Utc>>, u32) {
    let segments: Vec<&str> = info.id.split('_').collect();
    let counter = segments
        .last()
        .filter(|_| segments.len() > 3)
        .and_then(|last| last.parse().ok())
        .unwrap_or(0);
    (parse_backup_timestamp(&info.id), counter)
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

fn serialize<T: Serialize + ?Sized>(records: &T) -> Result<String, CoreError> {
    serde_json::to_string_pretty(records).map_err(|err| CoreError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_sanitised_for_directory_names() {
        assert_eq!(
            sanitize_backup_note(Some("  Month End_June. ")),
            Some("month-end-june".into())
        );
        assert_eq!(sanitize_backup_note(Some("***")), None);
    }

    #[test]
    fn snapshot_ids_parse_with_note_and_counter() {
        assert!(parse_backup_timestamp("snapshot_20240601_0930").is_some());
        assert!(parse_backup_timestamp("snapshot_20240601_0930_close_2").is_some());
        assert!(parse_backup_timestamp("customers.json").is_none());
    }

    #[test]
    fn tmp_path_appends_suffix() {
        let tmp = tmp_path(Path::new("/data/sales.json"));
        assert_eq!(tmp, PathBuf::from("/data/sales.json.tmp"));
    }
}
