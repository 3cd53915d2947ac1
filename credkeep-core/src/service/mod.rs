//! Backup service: the scan decision engine plus restore, delete and label
//! management on top of the index store.
//!
//! A scan walks four outcomes:
//! - target missing: nothing to do
//! - fast signature unchanged: nothing to do, no content read
//! - content digest already stored: only the recorded signature moves
//! - new content: write the bytes, then commit an entry
//!
//! The whole observe → hash → decide → write → commit sequence runs under a
//! per-service scan lock, so two scans can never both decide that the same new
//! content has no backup yet.

pub mod login;
pub mod scheduler;

use crate::config::VaultSettings;
use crate::fs::{self as vault_fs, atomic, naming, short_digest};
use crate::index::{BackupEntry, IndexState, IndexStore};
use crate::utils::errors::{Result, VaultError};
use chrono::{DateTime, Local, Utc};
use login::CommandOutput;
use serde::Serialize;
use std::fmt;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use tracing::{info, warn};
use uuid::Uuid;

/// Upper bound on label renames when an automatic commit races another writer.
const MAX_LABEL_RETRIES: u32 = 16;

/// What started a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    Automatic,
}

impl Trigger {
    fn label_prefix(self) -> &'static str {
        match self {
            Trigger::Manual => "manual",
            Trigger::Automatic => "auto",
        }
    }

    pub fn is_automatic(self) -> bool {
        self == Trigger::Automatic
    }
}

/// Why a scan did not create a backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    #[serde(rename = "target missing")]
    TargetMissing,
    #[serde(rename = "unchanged")]
    Unchanged,
    #[serde(rename = "duplicate content")]
    DuplicateContent,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::TargetMissing => "target missing",
            SkipReason::Unchanged => "unchanged",
            SkipReason::DuplicateContent => "duplicate content",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<BackupEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

impl ScanResult {
    fn created(entry: BackupEntry) -> Self {
        Self {
            created: true,
            entry: Some(entry),
            reason: None,
        }
    }

    fn skipped(reason: SkipReason) -> Self {
        Self {
            created: false,
            entry: None,
            reason: Some(reason),
        }
    }
}

/// Current state of the protected file
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub exists: bool,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_digest_short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_signature: Option<String>,
    pub target_path: String,
    pub scan_interval_secs: u64,
    pub backup_count: usize,
}

pub struct BackupService {
    settings: VaultSettings,
    store: IndexStore,
    scan_lock: Mutex<()>,
}

impl BackupService {
    /// Create the data and backup directories and open the index.
    pub fn open(settings: VaultSettings) -> Result<Self> {
        atomic::ensure_dir(&settings.data_dir).map_err(VaultError::io(format!(
            "creating data dir {}",
            settings.data_dir.display()
        )))?;
        atomic::ensure_dir(&settings.backups_dir).map_err(VaultError::io(format!(
            "creating backups dir {}",
            settings.backups_dir.display()
        )))?;

        let store = IndexStore::new(&settings.index_path, &settings.target_path);
        info!(
            target = %settings.target_path.display(),
            data_dir = %settings.data_dir.display(),
            scan_interval_secs = settings.scan_interval.as_secs(),
            "Backup service initialised"
        );
        Ok(Self {
            settings,
            store,
            scan_lock: Mutex::new(()),
        })
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Run one scan, waiting for any scan already in flight.
    pub fn scan(&self, trigger: Trigger, label: Option<&str>) -> Result<ScanResult> {
        let _guard = self.scan_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.scan_locked(trigger, label)
    }

    /// Run one scan unless another is in flight, in which case `None`.
    pub fn try_scan(&self, trigger: Trigger) -> Result<Option<ScanResult>> {
        let _guard: MutexGuard<'_, ()> = match self.scan_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Ok(None),
        };
        self.scan_locked(trigger, None).map(Some)
    }

    /// Explicit backup request.
    pub fn create_backup(&self, label: Option<&str>) -> Result<ScanResult> {
        self.scan(Trigger::Manual, label)
    }

    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        self.store.list()
    }

    /// Set or clear (blank) the label of entry `id`.
    pub fn update_label(&self, id: &str, label: &str) -> Result<BackupEntry> {
        let label = label.trim();
        let updated = self
            .store
            .rename_label(id, (!label.is_empty()).then(|| label.to_string()))?;
        info!(id, label = ?updated.label, "Label updated");
        Ok(updated)
    }

    /// Overwrite the target with the bytes stored for entry `id`.
    pub fn restore(&self, id: &str) -> Result<()> {
        let entry = self.store.find_by_id(id)?;
        let backup_path = self.settings.backups_dir.join(&entry.filename);
        let data = std::fs::read(&backup_path).map_err(VaultError::io(format!(
            "reading backup {}",
            backup_path.display()
        )))?;

        let target = &self.settings.target_path;
        atomic::write_atomic(target, &data, Some(atomic::PRIVATE_MODE)).map_err(VaultError::io(
            format!("writing target {}", target.display()),
        ))?;

        // A stale signature only costs one extra hash on the next scan.
        match vault_fs::fingerprint(target) {
            Ok(fp) => {
                if let Err(e) = self.store.set_latest_signature(Some(fp.signature)) {
                    warn!(id, error = %e, "Failed to record signature after restore");
                }
            }
            Err(e) => warn!(id, error = %e, "Failed to fingerprint restored target"),
        }

        info!(id, target = %target.display(), "Backup restored");
        Ok(())
    }

    /// Remove entry `id` from the index and its file from disk.
    pub fn delete(&self, id: &str) -> Result<()> {
        let removed = self.store.delete_entry(id)?;
        let path = self.settings.backups_dir.join(&removed.filename);
        if let Err(e) = atomic::remove_if_exists(&path) {
            warn!(id, path = %path.display(), error = %e, "Failed to remove backup file");
        }
        info!(id, label = ?removed.label, "Backup deleted");
        Ok(())
    }

    /// Describe the target file as it is right now.
    pub fn status(&self) -> Result<StatusReport> {
        let snapshot = self.store.snapshot()?;
        let target = &self.settings.target_path;
        let mut report = StatusReport {
            latest_signature: snapshot.latest_signature.clone(),
            target_path: target.to_string_lossy().into_owned(),
            scan_interval_secs: self.settings.scan_interval.as_secs(),
            backup_count: snapshot.entries.len(),
            ..Default::default()
        };

        let fp = match vault_fs::fingerprint(target) {
            Ok(fp) => fp,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(VaultError::io(format!("stat {}", target.display()))(e)),
        };
        let hashed = vault_fs::hash_file(target)
            .map_err(VaultError::io(format!("hashing {}", target.display())))?;

        report.exists = true;
        report.size = fp.stat.size;
        report.modified = Some(fp.stat.modified);
        report.fast_signature = Some(fp.signature);
        report.content_digest_short = Some(short_digest(&hashed.digest).to_string());
        report.content_digest = Some(hashed.digest);
        Ok(report)
    }

    /// Run the configured login command.
    pub async fn login(&self) -> Result<CommandOutput> {
        login::run_login(&self.settings.login).await
    }

    fn scan_locked(&self, trigger: Trigger, label: Option<&str>) -> Result<ScanResult> {
        let snapshot = self.store.snapshot()?;
        let target = &self.settings.target_path;

        let fp = match vault_fs::fingerprint(target) {
            Ok(fp) => fp,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ScanResult::skipped(SkipReason::TargetMissing));
            }
            Err(e) => return Err(VaultError::io(format!("stat {}", target.display()))(e)),
        };
        if snapshot.latest_signature.as_deref() == Some(fp.signature.as_str()) {
            return Ok(ScanResult::skipped(SkipReason::Unchanged));
        }

        let hashed = vault_fs::hash_file(target)
            .map_err(VaultError::io(format!("hashing {}", target.display())))?;

        if snapshot.find_by_digest(&hashed.digest).is_some() {
            self.store.set_latest_signature(Some(fp.signature.clone()))?;
            info!(
                digest = short_digest(&hashed.digest),
                signature = %fp.signature,
                "Content already backed up, signature updated"
            );
            return Ok(ScanResult::skipped(SkipReason::DuplicateContent));
        }

        let now = Local::now();
        let label = resolve_label(&snapshot, trigger, label, &now)?;

        let ext = naming::extension_for(target);
        let filename = naming::allocate(&self.settings.backups_dir, &now, &hashed.digest, &ext)
            .map_err(VaultError::io("allocating backup filename"))?;
        let backup_path = self.settings.backups_dir.join(&filename);
        atomic::write_atomic(&backup_path, &hashed.bytes, Some(atomic::PRIVATE_MODE)).map_err(
            VaultError::io(format!("writing backup {}", backup_path.display())),
        )?;

        let entry = BackupEntry {
            id: Uuid::new_v4().to_string(),
            filename,
            content_digest: hashed.digest,
            fast_signature: fp.signature.clone(),
            size: fp.stat.size,
            created_at: now.with_timezone(&Utc),
            label: Some(label),
            is_automatic: trigger.is_automatic(),
            source_path: target.to_string_lossy().into_owned(),
            last_modified_at: fp.stat.modified,
        };

        let entry = match self.commit_entry(entry, &fp.signature, trigger) {
            Ok(entry) => entry,
            Err(e) => {
                if let Err(cleanup) = atomic::remove_if_exists(&backup_path) {
                    warn!(
                        path = %backup_path.display(),
                        error = %cleanup,
                        "Failed to remove orphaned backup"
                    );
                }
                return Err(e);
            }
        };

        info!(
            id = %entry.id,
            label = ?entry.label,
            automatic = entry.is_automatic,
            digest = short_digest(&entry.content_digest),
            "Backup created"
        );
        Ok(ScanResult::created(entry))
    }

    /// Commit `entry`, renaming its label on conflict for automatic triggers only.
    fn commit_entry(
        &self,
        mut entry: BackupEntry,
        signature: &str,
        trigger: Trigger,
    ) -> Result<BackupEntry> {
        let base = entry.label.clone();
        let mut attempt = 0u32;
        loop {
            match self.store.add_entry(entry.clone(), signature) {
                Ok(_) => return Ok(entry),
                Err(VaultError::LabelConflict(taken))
                    if trigger.is_automatic() && attempt < MAX_LABEL_RETRIES =>
                {
                    attempt += 1;
                    let Some(base) = base.as_deref() else {
                        return Err(VaultError::LabelConflict(taken));
                    };
                    let renamed = format!("{base}-{attempt}");
                    warn!(taken = %taken, renamed = %renamed, "Automatic label taken, retrying");
                    entry.label = Some(renamed);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Pick the label for a new entry.
///
/// A caller-chosen label must be non-blank and free. Otherwise `{manual|auto}-{timestamp}`
/// is synthesized and suffixed with `-N` until unused.
fn resolve_label(
    snapshot: &IndexState,
    trigger: Trigger,
    requested: Option<&str>,
    now: &DateTime<Local>,
) -> Result<String> {
    if let Some(label) = requested.map(str::trim) {
        if label.is_empty() {
            return Err(VaultError::InvalidLabel("label must not be blank".into()));
        }
        if snapshot.label_owner(label).is_some() {
            return Err(VaultError::LabelConflict(label.to_string()));
        }
        return Ok(label.to_string());
    }

    let base = format!(
        "{}-{}",
        trigger.label_prefix(),
        now.format(naming::TIMESTAMP_FORMAT)
    );
    if snapshot.label_owner(&base).is_none() {
        return Ok(base);
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{base}-{counter}");
        if snapshot.label_owner(&candidate).is_none() {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> BackupService {
        let settings = VaultSettings::new(
            dir.path().join("codex").join("auth.json"),
            dir.path().join("data"),
        );
        BackupService::open(settings).unwrap()
    }

    fn write_target(svc: &BackupService, data: &[u8]) {
        let target = &svc.settings().target_path;
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, data).unwrap();
    }

    fn touch(path: &Path, secs_ahead: u64) {
        let when = SystemTime::now() + Duration::from_secs(secs_ahead);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    fn backup_files(svc: &BackupService) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(&svc.settings().backups_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| !n.starts_with(".tmp-"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_backup_lifecycle() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let target = svc.settings().target_path.clone();
        write_target(&svc, br#"{"token":"a"}"#);

        let first = svc.scan(Trigger::Manual, None).unwrap();
        assert!(first.created);
        let first_entry = first.entry.unwrap();
        assert_eq!(svc.list_backups().unwrap().len(), 1);

        let again = svc.scan(Trigger::Manual, None).unwrap();
        assert!(!again.created);
        assert_eq!(again.reason, Some(SkipReason::Unchanged));

        touch(&target, 5);
        let touched = svc.scan(Trigger::Manual, None).unwrap();
        assert_eq!(touched.reason, Some(SkipReason::DuplicateContent));
        let signature_now = vault_fs::fingerprint(&target).unwrap().signature;
        assert_eq!(
            svc.store().snapshot().unwrap().latest_signature,
            Some(signature_now)
        );
        assert_eq!(
            svc.scan(Trigger::Manual, None).unwrap().reason,
            Some(SkipReason::Unchanged)
        );

        fs::write(&target, br#"{"token":"b"}"#).unwrap();
        touch(&target, 10);
        let second = svc.scan(Trigger::Manual, None).unwrap();
        assert!(second.created);
        let second_entry = second.entry.unwrap();
        assert_eq!(svc.list_backups().unwrap().len(), 2);
        assert_eq!(backup_files(&svc).len(), 2);

        svc.delete(&second_entry.id).unwrap();
        assert_eq!(
            svc.store().snapshot().unwrap().latest_signature,
            Some(first_entry.fast_signature.clone())
        );
        assert_eq!(backup_files(&svc), [first_entry.filename.clone()]);

        svc.restore(&first_entry.id).unwrap();
        assert_eq!(fs::read(&target).unwrap(), br#"{"token":"a"}"#);
        assert_eq!(
            svc.scan(Trigger::Manual, None).unwrap().reason,
            Some(SkipReason::Unchanged)
        );
    }

    #[test]
    fn test_missing_target() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let result = svc.scan(Trigger::Automatic, None).unwrap();
        assert!(!result.created);
        assert_eq!(result.reason, Some(SkipReason::TargetMissing));
        assert!(svc.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_previously_seen_content_is_not_duplicated() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let target = svc.settings().target_path.clone();

        write_target(&svc, b"one");
        assert!(svc.scan(Trigger::Automatic, None).unwrap().created);
        fs::write(&target, b"two!").unwrap();
        touch(&target, 5);
        assert!(svc.scan(Trigger::Automatic, None).unwrap().created);

        fs::write(&target, b"one").unwrap();
        touch(&target, 10);
        let back = svc.scan(Trigger::Automatic, None).unwrap();
        assert_eq!(back.reason, Some(SkipReason::DuplicateContent));
        assert_eq!(svc.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn test_backup_file_matches_captured_bytes() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"secret-token");

        let entry = svc.create_backup(Some("pinned")).unwrap().entry.unwrap();

        assert_eq!(entry.label.as_deref(), Some("pinned"));
        assert!(!entry.is_automatic);
        assert!(entry.filename.ends_with(".json"));
        assert_eq!(entry.content_digest, vault_fs::hasher::digest_bytes(b"secret-token"));
        let stored = fs::read(svc.settings().backups_dir.join(&entry.filename)).unwrap();
        assert_eq!(stored, b"secret-token");
    }

    #[test]
    fn test_skip_reason_wire_form() {
        for reason in [
            SkipReason::TargetMissing,
            SkipReason::Unchanged,
            SkipReason::DuplicateContent,
        ] {
            let json = serde_json::to_value(ScanResult::skipped(reason)).unwrap();
            assert_eq!(json["reason"], reason.as_str());
            assert_eq!(json["created"], false);
        }
    }

    #[test]
    fn test_synthesized_labels() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");

        let auto = svc.scan(Trigger::Automatic, None).unwrap().entry.unwrap();
        let label = auto.label.unwrap();
        assert!(label.starts_with("auto-"), "{label}");
        assert_eq!(label.len(), "auto-YYYYMMDD-HHMMSS".len());
        assert!(auto.is_automatic);

        fs::write(&svc.settings().target_path, b"b").unwrap();
        touch(&svc.settings().target_path, 5);
        let manual = svc.scan(Trigger::Manual, None).unwrap().entry.unwrap();
        assert!(manual.label.unwrap().starts_with("manual-"));
    }

    #[test]
    fn test_blank_label_is_rejected() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");

        let err = svc.create_backup(Some("   ")).unwrap_err();

        assert!(matches!(err, VaultError::InvalidLabel(_)));
        assert_eq!(err.kind(), "invalid_label");
        assert!(svc.list_backups().unwrap().is_empty());
        assert!(backup_files(&svc).is_empty());

        let entry = svc.create_backup(None).unwrap().entry.unwrap();
        assert!(entry.label.unwrap().starts_with("manual-"));
    }

    #[test]
    fn test_resolve_label_suffixes_synthesized_collisions() {
        let now = Local::now();
        let base = format!("auto-{}", now.format(naming::TIMESTAMP_FORMAT));
        let mut state = IndexState::default();
        state.label_index.insert(base.clone(), "x".into());
        state.label_index.insert(format!("{base}-1"), "y".into());

        let label = resolve_label(&state, Trigger::Automatic, None, &now).unwrap();
        assert_eq!(label, format!("{base}-2"));
    }

    #[test]
    fn test_manual_label_conflict_is_reported_and_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");
        svc.create_backup(Some("mine")).unwrap();

        fs::write(&svc.settings().target_path, b"b").unwrap();
        touch(&svc.settings().target_path, 5);
        let err = svc.create_backup(Some(" mine ")).unwrap_err();

        assert!(matches!(err, VaultError::LabelConflict(ref l) if l == "mine"));
        assert_eq!(svc.list_backups().unwrap().len(), 1);
        assert_eq!(backup_files(&svc).len(), 1);
    }

    #[test]
    fn test_commit_conflict_renames_only_for_automatic() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");
        svc.create_backup(Some("race")).unwrap();

        let candidate = |id: &str| BackupEntry {
            id: id.to_string(),
            filename: format!("{id}.json"),
            content_digest: format!("digest-{id}"),
            fast_signature: "sig".into(),
            size: 1,
            created_at: Utc::now(),
            label: Some("race".into()),
            is_automatic: true,
            source_path: String::new(),
            last_modified_at: Utc::now(),
        };

        let renamed = svc.commit_entry(candidate("auto"), "sig", Trigger::Automatic).unwrap();
        assert_eq!(renamed.label.as_deref(), Some("race-1"));

        let renamed_again = svc
            .commit_entry(candidate("auto2"), "sig", Trigger::Automatic)
            .unwrap();
        assert_eq!(renamed_again.label.as_deref(), Some("race-2"));

        let err = svc.commit_entry(candidate("manual"), "sig", Trigger::Manual).unwrap_err();
        assert!(matches!(err, VaultError::LabelConflict(_)));
    }

    #[test]
    fn test_failed_commit_removes_written_file() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"payload");
        // Snapshots still work, but the commit cannot open its lock file.
        fs::create_dir_all(dir.path().join("data").join("index.json.lock")).unwrap();

        let err = svc.scan(Trigger::Manual, None).unwrap_err();

        assert!(matches!(err, VaultError::Io { .. }));
        assert!(backup_files(&svc).is_empty());
        assert!(svc.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_update_label_uniqueness() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");
        let first = svc.create_backup(None).unwrap().entry.unwrap();
        fs::write(&svc.settings().target_path, b"b").unwrap();
        touch(&svc.settings().target_path, 5);
        let second = svc.create_backup(None).unwrap().entry.unwrap();

        svc.update_label(&first.id, " my-manual ").unwrap();
        let err = svc.update_label(&second.id, "my-manual").unwrap_err();
        assert!(matches!(err, VaultError::LabelConflict(_)));

        let cleared = svc.update_label(&first.id, "").unwrap();
        assert!(cleared.label.is_none());
        svc.update_label(&second.id, "my-manual").unwrap();

        let labels: Vec<_> = svc
            .list_backups()
            .unwrap()
            .into_iter()
            .filter_map(|e| e.label)
            .collect();
        assert_eq!(labels, ["my-manual"]);
        assert!(matches!(svc.update_label("ghost", "x"), Err(VaultError::BackupNotFound(_))));
    }

    #[test]
    fn test_delete_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");
        let entry = svc.create_backup(None).unwrap().entry.unwrap();
        fs::remove_file(svc.settings().backups_dir.join(&entry.filename)).unwrap();

        svc.delete(&entry.id).unwrap();

        let state = svc.store().snapshot().unwrap();
        assert!(state.entries.is_empty());
        assert!(state.latest_signature.is_none());
        assert!(matches!(svc.delete(&entry.id), Err(VaultError::BackupNotFound(_))));
    }

    #[test]
    fn test_restore_unknown_and_missing_parent() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        assert!(matches!(svc.restore("nope"), Err(VaultError::BackupNotFound(_))));

        write_target(&svc, b"keep me");
        let entry = svc.create_backup(None).unwrap().entry.unwrap();
        fs::remove_dir_all(svc.settings().target_path.parent().unwrap()).unwrap();

        svc.restore(&entry.id).unwrap();
        assert_eq!(fs::read(&svc.settings().target_path).unwrap(), b"keep me");
    }

    #[test]
    fn test_status_report() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let missing = svc.status().unwrap();
        assert!(!missing.exists);
        assert!(missing.content_digest.is_none());

        write_target(&svc, b"xyz");
        svc.create_backup(None).unwrap();
        let status = svc.status().unwrap();
        assert!(status.exists);
        assert_eq!(status.size, 3);
        assert_eq!(status.backup_count, 1);
        assert_eq!(status.fast_signature, status.latest_signature);
        assert_eq!(status.content_digest_short.unwrap().len(), 12);
    }

    #[test]
    fn test_concurrent_scans_create_one_entry() {
        let dir = TempDir::new().unwrap();
        let svc = Arc::new(service(&dir));
        write_target(&svc, b"shared content");

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let svc = svc.clone();
                std::thread::spawn(move || {
                    let trigger = if i % 2 == 0 { Trigger::Manual } else { Trigger::Automatic };
                    svc.scan(trigger, None).unwrap()
                })
            })
            .collect();
        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.created)
            .count();

        assert_eq!(created, 1);
        assert_eq!(svc.list_backups().unwrap().len(), 1);
        assert_eq!(backup_files(&svc).len(), 1);
    }

    #[test]
    fn test_try_scan_skips_while_busy() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        write_target(&svc, b"a");

        let held = svc.scan_lock.lock().unwrap();
        assert!(svc.try_scan(Trigger::Automatic).unwrap().is_none());
        drop(held);

        let result = svc.try_scan(Trigger::Automatic).unwrap().unwrap();
        assert!(result.created);
    }
}
