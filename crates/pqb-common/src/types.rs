// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Common types for pqboot
//!
//! Slot identifiers and the fixed-size digest newtypes passed between the
//! crypto and boot crates.

use core::fmt;
use subtle::ConstantTimeEq;

use crate::constants::{FIRMWARE_DIGEST_SIZE, MAX_SLOTS, PK_HASH_SIZE};

/// Firmware slot identifier
///
/// Slots are evaluated in index order; `A` is the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SlotId {
    /// Primary slot
    A = 0,
    /// Secondary slot
    B = 1,
    /// Third candidate
    C = 2,
    /// Fourth candidate
    D = 3,
}

impl SlotId {
    /// All slots in evaluation order
    pub const ALL: [SlotId; MAX_SLOTS] = [Self::A, Self::B, Self::C, Self::D];

    /// Slot for a zero-based index
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::D),
            _ => None,
        }
    }

    /// Zero-based index of this slot
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-letter slot name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl TryFrom<u8> for SlotId {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize).ok_or(crate::Error::InvalidParameter)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SHA-256 hash of a public key, as provisioned in the root of trust
///
/// Equality is constant time.
#[derive(Clone, Copy)]
pub struct PkHash([u8; PK_HASH_SIZE]);

impl PkHash {
    /// Size of the hash in bytes
    pub const SIZE: usize = PK_HASH_SIZE;

    /// Create from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; PK_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice
    ///
    /// Returns `None` if the slice length is not exactly 32 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; PK_HASH_SIZE] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Get the hash as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PK_HASH_SIZE] {
        &self.0
    }
}

impl ConstantTimeEq for PkHash {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for PkHash {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for PkHash {}

impl AsRef<[u8]> for PkHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PkHash(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...)")
    }
}

impl fmt::Display for PkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")
    }
}

/// Domain-separated SHAKE256 digest of a firmware payload
#[derive(Clone, Copy)]
pub struct FirmwareDigest([u8; FIRMWARE_DIGEST_SIZE]);

impl FirmwareDigest {
    /// Size of the digest in bytes
    pub const SIZE: usize = FIRMWARE_DIGEST_SIZE;

    /// Create from raw bytes
    #[must_use]
    pub const fn new(bytes: [u8; FIRMWARE_DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the digest as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FIRMWARE_DIGEST_SIZE] {
        &self.0
    }
}

impl ConstantTimeEq for FirmwareDigest {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for FirmwareDigest {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FirmwareDigest {}

impl AsRef<[u8]> for FirmwareDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for FirmwareDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FirmwareDigest(")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...)")
    }
}
