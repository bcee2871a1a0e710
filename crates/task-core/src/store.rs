//! JSON-file-backed task store.
//!
//! The backing file holds one pretty-printed JSON array of [`Task`] records
//! in insertion order. Every operation re-reads the file, so consecutive
//! short-lived processes always observe the latest on-disk state.
//!
//! # Invariants
//!
//! - Mutations hold an exclusive advisory lock on `<file>.lock` across the
//!   whole load-mutate-save span; listing holds a shared lock.
//! - Saves write a sibling temp file and rename it over the target, so the
//!   file is always either the old or the new full list.
//! - A file that fails to parse is treated as empty. Its bytes are copied to
//!   `<file>.corrupt` before anything can overwrite them; an older, different
//!   backup is kept and the new one gets a timestamped name.
//! - Read and write failures inside an operation are logged, never returned.
//!   An unusable lock file is logged too and the operation runs unlocked.
//!   Only a lock timeout can fail an operation.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

use crate::error::ErrorCode;
use crate::lock::{LockError, StoreLock};
use crate::model::id::new_id;
use crate::model::task::{self, Task, TaskUpdate};

/// File name used when no explicit path is configured.
pub const DEFAULT_FILE_NAME: &str = "tasks.json";

/// How long an operation waits for another process to release the lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the strict [`TaskStore::load`] / [`TaskStore::save`]
/// calls and by lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The file exists but could not be read.
    #[error("failed to read task file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but is not a JSON array of tasks.
    #[error("task file {} is not a valid task list: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the temp file or renaming it into place failed.
    #[error("failed to write task file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode task list: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StoreReadFailed,
            Self::Corrupt { .. } => ErrorCode::CorruptStore,
            Self::Write { .. } => ErrorCode::StoreWriteFailed,
            Self::Encode(_) => ErrorCode::InternalUnexpected,
            Self::Lock(err) => match err.code() {
                Some(code) => code,
                None => ErrorCode::InternalUnexpected,
            },
        }
    }

    /// Optional remediation hint for users and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

// ---------------------------------------------------------------------------
// TaskStore
// ---------------------------------------------------------------------------

/// Durable CRUD over the ordered task list in one backing file.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl TaskStore {
    /// Create a store over `path`. Nothing is touched on disk until the
    /// first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Path of the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advisory lock file, `<file>.lock`.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    /// Where unparseable file contents are preserved, `<file>.corrupt`.
    #[must_use]
    pub fn corrupt_backup_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    // -----------------------------------------------------------------------
    // Strict load / save
    // -----------------------------------------------------------------------

    /// Read and parse the backing file.
    ///
    /// A missing or blank file is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] on I/O failure and [`StoreError::Corrupt`]
    /// if the contents are not a task array.
    pub fn load(&self) -> Result<Vec<Task>, StoreError> {
        match self.read_raw()? {
            Some(raw) => self.parse(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the backing file with `tasks`, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the temp file cannot be created,
    /// written, or renamed into place.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(write_err)?;

        let mut json = serde_json::to_vec_pretty(tasks).map_err(StoreError::Encode)?;
        json.push(b'\n');

        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        // Keep the mode of the file being replaced rather than the temp file's 0600.
        if let Ok(meta) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), meta.permissions()).map_err(write_err)?;
        }

        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        debug!(path = %self.path.display(), count = tasks.len(), "saved task file");
        Ok(())
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "task file does not exist yet");
                Ok(None)
            }
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn parse(&self, raw: &[u8]) -> Result<Vec<Task>, StoreError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    // -----------------------------------------------------------------------
    // Lenient load / save used by the operations
    // -----------------------------------------------------------------------

    fn load_lenient(&self) -> Vec<Task> {
        let raw = match self.read_raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                error!(error = %err, "error loading task list, continuing with no tasks");
                return Vec::new();
            }
        };

        match self.parse(&raw) {
            Ok(tasks) => {
                debug!(path = %self.path.display(), count = tasks.len(), "loaded task file");
                tasks
            }
            Err(err) => {
                error!(error = %err, "error parsing task file, continuing with no tasks");
                self.backup_corrupt(&raw);
                Vec::new()
            }
        }
    }

    /// Copy unparseable bytes aside. An existing backup with different
    /// contents is kept and the new one gets a timestamped name.
    fn backup_corrupt(&self, raw: &[u8]) {
        let mut backup = self.corrupt_backup_path();
        match fs::read(&backup) {
            Ok(existing) if existing == raw => {
                debug!(backup = %backup.display(), "unparseable task file already preserved");
                return;
            }
            Ok(_) => {
                let stamp = task::now().format("%Y%m%dT%H%M%S%.3fZ");
                backup = self.sibling(&format!(".corrupt.{stamp}"));
            }
            Err(_) => {}
        }
        match fs::write(&backup, raw) {
            Ok(()) => warn!(backup = %backup.display(), "preserved unparseable task file"),
            Err(err) => error!(
                backup = %backup.display(),
                error = %err,
                "failed to preserve unparseable task file"
            ),
        }
    }

    fn save_lenient(&self, tasks: &[Task]) {
        if let Err(err) = self.save(tasks) {
            error!(error = %err, "error saving task list");
        }
    }

    fn lock_exclusive(&self) -> Result<Option<StoreLock>, StoreError> {
        Self::lock_or_proceed(
            StoreLock::acquire_exclusive(&self.lock_path(), self.lock_timeout),
            "exclusive",
        )
    }

    fn lock_shared(&self) -> Result<Option<StoreLock>, StoreError> {
        Self::lock_or_proceed(
            StoreLock::acquire_shared(&self.lock_path(), self.lock_timeout),
            "shared",
        )
    }

    /// A held lock, or `None` when the lock file itself is unusable. Only a
    /// timeout fails the operation.
    fn lock_or_proceed(
        acquired: Result<StoreLock, LockError>,
        mode: &'static str,
    ) -> Result<Option<StoreLock>, StoreError> {
        match acquired {
            Ok(lock) => Ok(Some(lock)),
            Err(err @ LockError::Timeout { .. }) => Err(err.into()),
            Err(err @ LockError::Io { .. }) => {
                error!(mode, error = %err, "continuing without the store lock");
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Append a new `todo` task and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if another process holds the store lock
    /// past the timeout.
    pub fn add(&self, description: &str) -> Result<Task, StoreError> {
        let _lock = self.lock_exclusive()?;
        let mut tasks = self.load_lenient();

        let added = Task::new(new_id(&tasks), description, task::now());
        tasks.push(added.clone());

        self.save_lenient(&tasks);
        debug!(id = %added.id, "added task");
        Ok(added)
    }

    /// Apply `update` to the task with `id` and persist.
    ///
    /// An unknown id leaves the list untouched and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if another process holds the store lock
    /// past the timeout.
    pub fn update(&self, id: &str, update: TaskUpdate) -> Result<Option<Task>, StoreError> {
        let _lock = self.lock_exclusive()?;
        let mut tasks = self.load_lenient();

        let updated = tasks.iter_mut().find(|t| t.id == id).map(|t| {
            t.apply(update, task::now());
            t.clone()
        });
        if updated.is_none() {
            debug!(%id, "no task matched, nothing updated");
        }

        self.save_lenient(&tasks);
        Ok(updated)
    }

    /// Remove the task with `id` and persist.
    ///
    /// An unknown id leaves the list untouched and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if another process holds the store lock
    /// past the timeout.
    pub fn delete(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let _lock = self.lock_exclusive()?;
        let mut tasks = self.load_lenient();

        let removed = tasks
            .iter()
            .position(|t| t.id == id)
            .map(|index| tasks.remove(index));
        if removed.is_none() {
            debug!(%id, "no task matched, nothing deleted");
        }

        self.save_lenient(&tasks);
        Ok(removed)
    }

    /// All tasks, or those whose status string equals `status`, in insertion
    /// order. Does not write the file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if another process holds the store lock
    /// past the timeout.
    pub fn list(&self, status: Option<&str>) -> Result<Vec<Task>, StoreError> {
        let _lock = self.lock_shared()?;
        let mut tasks = self.load_lenient();
        if let Some(status) = status {
            tasks.retain(|t| t.has_status(status));
        }
        Ok(tasks)
    }
}
