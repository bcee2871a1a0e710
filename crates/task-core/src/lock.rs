//! Advisory locking around store operations.
//!
//! One lock file, `<file>.lock`, sits next to the task file. Mutations take it
//! exclusively and listing takes it shared; the guard unlocks on drop.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Failure to take the store lock.
#[derive(Debug)]
pub enum LockError {
    /// Another process kept the lock for longer than the timeout.
    Timeout { path: PathBuf, waited: Duration },
    /// The lock file or its directory could not be created or opened.
    Io { path: PathBuf, source: io::Error },
}

impl LockError {
    /// Code surfaced to users. Only a timeout has one; an unopenable lock
    /// file is logged by the store and never reaches the user.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Timeout { .. } => Some(ErrorCode::LockContention),
            Self::Io { .. } => None,
        }
    }
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { path, waited } => write!(
                f,
                "{}: lock timed out after {waited:?} at {}",
                ErrorCode::LockContention.code(),
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "cannot open lock file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Shared,
    Exclusive,
}

/// Held for the span of one store operation.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Exclusive lock for load-mutate-save.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if the lock stays held by someone else,
    /// [`LockError::Io`] if the lock file cannot be opened.
    pub fn acquire_exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, Mode::Exclusive)
    }

    /// Shared lock for read-only listing.
    ///
    /// # Errors
    ///
    /// Same as [`StoreLock::acquire_exclusive`].
    pub fn acquire_shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, Mode::Shared)
    }

    fn acquire(path: &Path, timeout: Duration, mode: Mode) -> Result<Self, LockError> {
        let file = open_lock_file(path).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let start = Instant::now();
        loop {
            let taken = match mode {
                Mode::Shared => FileExt::try_lock_shared(&file),
                Mode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            if taken.is_ok() {
                tracing::trace!(path = %path.display(), ?mode, "lock acquired");
                return Ok(Self { file });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
