// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! File-Backed Root of Trust
//!
//! Host implementation of [`RootOfTrust`] over a state directory:
//!
//! ```text
//! <state_dir>/otp_pk_hash.bin    32-byte SHA-256 of the signing key (read-only)
//! <state_dir>/otp_counter.bin    4-byte little-endian rollback floor
//! <state_dir>/otp_counter.lock   advisory lock guarding counter updates
//! <state_dir>/boot_log.bin       persisted boot log
//! ```
//!
//! Rollback checks take an exclusive lock, read the stored floor under the
//! lock, refuse to lower it and replace the file atomically before the lock
//! is released.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::vec::Vec;

use fs2::FileExt;
use pqb_common::{Error, PkHash};

use crate::rollback::{check_rollback, read_floor, FloorUpdate, RootOfTrust};

// ============================================================================
// Errors
// ============================================================================

/// File store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Public key hash has never been provisioned
    #[error("root of trust not provisioned: {} missing", .path.display())]
    NotProvisioned {
        /// Expected hash file
        path: PathBuf,
    },

    /// Public key hash file has the wrong size
    #[error("provisioned key hash is {len} bytes, expected 32")]
    InvalidPkHash {
        /// Actual file length
        len: usize,
    },

    /// State directory cannot be created or used
    #[error("state directory {} unusable: {source}", .path.display())]
    StateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Read failure
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Write failure
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Advisory lock could not be taken
    #[error("failed to lock {}: {source}", .path.display())]
    Lock {
        /// Lock file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Requested floor is below the stored floor
    #[error("refusing to lower rollback floor from {current} to {requested}")]
    CounterRegression {
        /// Stored floor
        current: u32,
        /// Requested floor
        requested: u32,
    },

    /// Zero-length image file
    #[error("{} is empty", .path.display())]
    EmptyFile {
        /// File path
        path: PathBuf,
    },

    /// File exceeds the configured size limit
    #[error("{} is {len} bytes, limit is {limit}", .path.display())]
    TooLarge {
        /// File path
        path: PathBuf,
        /// Actual length
        len: u64,
        /// Limit
        limit: usize,
    },
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotProvisioned { .. } => Error::NotProvisioned,
            StoreError::InvalidPkHash { .. } => Error::StorageCorrupted,
            StoreError::StateDir { .. } => Error::InvalidBootConfig,
            StoreError::Read { .. } => Error::StorageReadFailed,
            StoreError::Write { .. } => Error::StorageWriteFailed,
            StoreError::Lock { .. } => Error::StorageLocked,
            StoreError::CounterRegression { .. } => Error::RollbackAttempted,
            StoreError::EmptyFile { .. } => Error::StorageNotFound,
            StoreError::TooLarge { .. } => Error::ResourceExhausted,
        }
    }
}

// ============================================================================
// File Helpers
// ============================================================================

/// Read a whole file, refusing anything larger than `limit` bytes
pub(crate) fn read_file(path: &Path, limit: usize) -> Result<Vec<u8>, StoreError> {
    let read_err = |source: io::Error| StoreError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let len = file.metadata().map_err(read_err)?.len();
    if len > limit as u64 {
        return Err(StoreError::TooLarge {
            path: path.to_path_buf(),
            len,
            limit,
        });
    }

    let mut buf = Vec::with_capacity(usize::try_from(len).unwrap_or(limit));
    // The file may grow between stat and read
    file.take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(read_err)?;
    if buf.len() > limit {
        return Err(StoreError::TooLarge {
            path: path.to_path_buf(),
            len: buf.len() as u64,
            limit,
        });
    }
    Ok(buf)
}

/// Replace `path` with `data` via a synced temporary file and rename
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let write_err = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .map_err(write_err)?;
    file.write_all(data).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&tmp, path).map_err(write_err)
}

/// Exclusive hold on the counter lock file
///
/// Released when the file handle is closed.
struct CounterLock {
    _file: File,
}

impl CounterLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        let lock_err = |source: io::Error| StoreError::Lock {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        Ok(Self { _file: file })
    }
}

/// Decode a stored floor; absent or short records read as 0
fn decode_counter(bytes: &[u8]) -> u32 {
    match bytes.get(..4) {
        Some(&[a, b, c, d]) => u32::from_le_bytes([a, b, c, d]),
        _ => 0,
    }
}

// ============================================================================
// State Directory Layout
// ============================================================================

/// Paths of the files in a state directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    dir: PathBuf,
}

impl StatePaths {
    /// Counter file name
    pub const COUNTER: &'static str = "otp_counter.bin";
    /// Public key hash file name
    pub const PK_HASH: &'static str = "otp_pk_hash.bin";
    /// Lock file name
    pub const LOCK: &'static str = "otp_counter.lock";
    /// Boot log file name
    pub const BOOT_LOG: &'static str = "boot_log.bin";

    /// Layout rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// State directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rollback floor record
    pub fn counter(&self) -> PathBuf {
        self.dir.join(Self::COUNTER)
    }

    /// Provisioned public key hash
    pub fn pk_hash(&self) -> PathBuf {
        self.dir.join(Self::PK_HASH)
    }

    /// Counter lock file
    pub fn lock(&self) -> PathBuf {
        self.dir.join(Self::LOCK)
    }

    /// Boot log file
    pub fn boot_log(&self) -> PathBuf {
        self.dir.join(Self::BOOT_LOG)
    }
}

// ============================================================================
// File Root of Trust
// ============================================================================

/// Root of trust persisted in a state directory
#[derive(Debug)]
pub struct FileRootOfTrust {
    paths: StatePaths,
    pk_hash: PkHash,
}

impl FileRootOfTrust {
    /// Open a provisioned state directory
    ///
    /// Never creates or modifies anything on disk.
    ///
    /// # Errors
    ///
    /// Returns `NotProvisioned` if the directory or the key hash file is
    /// missing, `StateDir` if the path is not a usable directory and
    /// `InvalidPkHash` if the hash file is not exactly 32 bytes.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let paths = StatePaths::new(dir);
        let hash_path = paths.pk_hash();
        match fs::metadata(paths.dir()) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StoreError::StateDir {
                    path: paths.dir().to_path_buf(),
                    source: io::Error::new(io::ErrorKind::Other, "not a directory"),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotProvisioned { path: hash_path });
            }
            Err(source) => {
                return Err(StoreError::StateDir {
                    path: paths.dir().to_path_buf(),
                    source,
                });
            }
        }

        let bytes = match read_file(&hash_path, PkHash::SIZE * 2) {
            Ok(bytes) => bytes,
            Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotProvisioned { path: hash_path });
            }
            Err(StoreError::TooLarge { len, .. }) => {
                return Err(StoreError::InvalidPkHash {
                    len: usize::try_from(len).unwrap_or(usize::MAX),
                });
            }
            Err(e) => return Err(e),
        };
        let pk_hash = PkHash::from_slice(&bytes)
            .ok_or(StoreError::InvalidPkHash { len: bytes.len() })?;

        log::debug!(
            "[pqb-boot] root of trust {} opened, key hash {pk_hash}",
            paths.dir().display()
        );
        Ok(Self { paths, pk_hash })
    }

    /// Write the key hash into `dir` and open it
    ///
    /// Provisioning tooling only; the boot path never calls this.
    ///
    /// # Errors
    ///
    /// Returns `StateDir` or `Write` on filesystem failure.
    pub fn provision(dir: impl Into<PathBuf>, pk_hash: PkHash) -> Result<Self, StoreError> {
        let paths = StatePaths::new(dir);
        fs::create_dir_all(paths.dir()).map_err(|source| StoreError::StateDir {
            path: paths.dir().to_path_buf(),
            source,
        })?;
        write_atomic(&paths.pk_hash(), pk_hash.as_bytes())?;
        Ok(Self { paths, pk_hash })
    }

    /// State directory layout
    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Read the raw stored floor (0 when absent or short)
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file exists but cannot be read.
    pub fn stored_min_version(&self) -> Result<u32, StoreError> {
        let path = self.paths.counter();
        match read_file(&path, 64) {
            Ok(bytes) => Ok(decode_counter(&bytes)),
            Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Raise the stored floor under the counter lock
    ///
    /// Writing the stored value again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Lock` if the lock cannot be taken, `CounterRegression` if
    /// `version` is below the value found under the lock, or `Read`/`Write`
    /// on filesystem failure.
    pub fn advance_min_version(&self, version: u32) -> Result<(), StoreError> {
        let _lock = CounterLock::acquire(&self.paths.lock())?;
        self.advance_locked(version)
    }

    fn advance_locked(&self, version: u32) -> Result<(), StoreError> {
        let current = self.stored_min_version()?;
        if version < current {
            return Err(StoreError::CounterRegression {
                current,
                requested: version,
            });
        }
        if version == current {
            return Ok(());
        }
        write_atomic(&self.paths.counter(), &version.to_le_bytes())?;
        log::info!("[pqb-boot] rollback floor {current} -> {version}");
        Ok(())
    }
}

impl RootOfTrust for FileRootOfTrust {
    fn pk_hash(&self) -> PkHash {
        self.pk_hash
    }

    fn read_min_version(&mut self) -> Result<u32, Error> {
        self.stored_min_version().map_err(|e| {
            log::warn!("[pqb-boot] {e}");
            Error::from(e)
        })
    }

    fn write_min_version(&mut self, version: u32) -> Result<(), Error> {
        self.advance_min_version(version).map_err(|e| {
            log::error!("[pqb-boot] {e}");
            Error::from(e)
        })
    }

    fn check_and_advance(&mut self, version: u32) -> Result<FloorUpdate, Error> {
        let _lock = CounterLock::acquire(&self.paths.lock()).map_err(|e| {
            log::error!("[pqb-boot] {e}");
            Error::from(e)
        })?;

        let previous = read_floor(self);
        let advanced = check_rollback(version, previous)?;
        if advanced {
            // Re-reads under the same lock; an unreadable record is never overwritten
            self.advance_locked(version).map_err(|e| {
                log::error!("[pqb-boot] {e}");
                Error::from(e)
            })?;
        }
        Ok(FloorUpdate { previous, advanced })
    }
}

// ============================================================================
// Tests
// ============================================================================
