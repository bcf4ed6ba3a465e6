// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Anti-Rollback Protection
//!
//! The root of trust holds two values:
//!
//! 1. **Public key hash**: SHA-256 of the one accepted signing key, fixed at
//!    provisioning and never written by the verifier
//! 2. **Rollback floor**: the minimum acceptable firmware version, which only
//!    ever moves upward
//!
//! # Floor Semantics
//!
//! An uninitialized floor (missing record, short read or a stored 0) reads as
//! [`DEFAULT_MIN_VERSION`]. Read errors also fall back to that default, never
//! to "no floor".

use pqb_common::constants::DEFAULT_MIN_VERSION;
use pqb_common::{Error, PkHash};

// ============================================================================
// Root of Trust
// ============================================================================

/// Outcome of a passing rollback check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorUpdate {
    /// Effective floor the version was compared against
    pub previous: u32,
    /// Whether the floor was raised to the checked version
    pub advanced: bool,
}

/// Root-of-trust store
///
/// Injected into the verifier so that the storage medium is a deployment
/// choice.
pub trait RootOfTrust {
    /// Provisioned public key hash
    fn pk_hash(&self) -> PkHash;

    /// Read the stored rollback floor
    ///
    /// A stored 0 is returned as-is; [`read_floor`] applies the default.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the record exists but cannot be read.
    fn read_min_version(&mut self) -> Result<u32, Error>;

    /// Persist a raised rollback floor
    ///
    /// # Errors
    ///
    /// Returns `Error::RollbackAttempted` if `version` is below the stored
    /// floor, or a storage error if the write does not complete.
    fn write_min_version(&mut self, version: u32) -> Result<(), Error>;

    /// Compare `version` with the floor and raise the floor if newer
    ///
    /// The read, the comparison and the write form one step. Stores shared
    /// between processes must hold their lock across all three.
    ///
    /// # Errors
    ///
    /// Returns `Error::RollbackAttempted` if `version` is below the effective
    /// floor. Any other error means a raised floor could not be persisted.
    fn check_and_advance(&mut self, version: u32) -> Result<FloorUpdate, Error> {
        let previous = read_floor(self);
        let advanced = check_rollback(version, previous)?;
        if advanced {
            self.write_min_version(version)?;
        }
        Ok(FloorUpdate { previous, advanced })
    }
}

/// Effective rollback floor of a store
///
/// Never returns less than [`DEFAULT_MIN_VERSION`].
pub fn read_floor<R: RootOfTrust + ?Sized>(rot: &mut R) -> u32 {
    match rot.read_min_version() {
        Ok(0) => DEFAULT_MIN_VERSION,
        Ok(v) => v,
        Err(e) => {
            log::warn!("[pqb-boot] rollback floor unreadable ({e}), using {DEFAULT_MIN_VERSION}");
            DEFAULT_MIN_VERSION
        }
    }
}

/// Check a version against a floor
///
/// Returns `Ok(true)` if the floor must be raised to `version`, `Ok(false)` if
/// it is already equal.
///
/// # Errors
///
/// Returns `Error::RollbackAttempted` if `version < floor`.
pub fn check_rollback(version: u32, floor: u32) -> Result<bool, Error> {
    if version < floor {
        return Err(Error::RollbackAttempted);
    }
    Ok(version > floor)
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Volatile root of trust
///
/// Used on targets where the floor lives in RAM-backed OTP emulation and in
/// tests. Can be write-protected to model a locked OTP bank.
#[derive(Debug, Clone)]
pub struct MemoryRootOfTrust {
    pk_hash: PkHash,
    min_version: u32,
    write_protected: bool,
    writes: u32,
}

impl MemoryRootOfTrust {
    /// Create a store with a provisioned hash and floor
    #[must_use]
    pub const fn new(pk_hash: PkHash, min_version: u32) -> Self {
        Self {
            pk_hash,
            min_version,
            write_protected: false,
            writes: 0,
        }
    }

    /// Stored floor, without defaulting
    #[must_use]
    pub const fn min_version(&self) -> u32 {
        self.min_version
    }

    /// Number of successful floor writes
    #[must_use]
    pub const fn write_count(&self) -> u32 {
        self.writes
    }

    /// Reject all further writes with `Error::StorageLocked`
    pub fn set_write_protected(&mut self, protected: bool) {
        self.write_protected = protected;
    }
}

impl RootOfTrust for MemoryRootOfTrust {
    fn pk_hash(&self) -> PkHash {
        self.pk_hash
    }

    fn read_min_version(&mut self) -> Result<u32, Error> {
        Ok(self.min_version)
    }

    fn write_min_version(&mut self, version: u32) -> Result<(), Error> {
        if self.write_protected {
            return Err(Error::StorageLocked);
        }
        if version < self.min_version {
            return Err(Error::RollbackAttempted);
        }
        if version == self.min_version {
            return Ok(());
        }
        self.min_version = version;
        self.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
