// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Persistent Boot Logging
//!
//! Records every slot rejection, every selection and every halt in a small
//! ring that survives across boots. The ring is held in memory and
//! serialized as a single blob; the std build stores it in the state
//! directory.
//!
//! # Serialized Layout (little-endian)
//!
//! ```text
//! Offset  Size    Description
//! 0x00    4       Magic ("BLOG")
//! 0x04    4       Log version
//! 0x08    4       Boot count
//! 0x0C    4       Total entries written
//! 0x10    4       Current write index (circular buffer)
//! 0x14    4       CRC32 of the preceding header bytes
//! 0x18    N*32    Log entries
//! ```
//!
//! # Entry Format
//!
//! ```text
//! Offset  Size    Description
//! 0x00    4       Boot attempt
//! 0x04    1       Slot (0xFF = none)
//! 0x05    1       Boot stage
//! 0x06    1       Error category
//! 0x07    1       Reserved
//! 0x08    2       Error code
//! 0x0A    2       Reserved
//! 0x0C    4       Firmware version (0 if unknown)
//! 0x10    4       Rollback floor at the time of the entry
//! 0x14    8       Reserved
//! 0x1C    4       CRC32 of bytes 0x00..0x1C
//! ```
//!
//! A corrupt header formats the log. Corrupt entries are dropped.

use pqb_common::constants::BOOT_LOG_CAPACITY;
use pqb_common::SlotId;
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::verify::VerifyError;

// ============================================================================
// Constants
// ============================================================================

/// Boot log magic number
const BOOT_LOG_MAGIC: u32 = 0x474F_4C42; // "BLOG"

/// Log version
const BOOT_LOG_VERSION: u32 = 1;

/// Maximum number of log entries (circular buffer)
pub const MAX_LOG_ENTRIES: usize = BOOT_LOG_CAPACITY;

/// Size of each log entry in bytes
pub const LOG_ENTRY_SIZE: usize = 32;

/// Size of the log header in bytes
pub const LOG_HEADER_SIZE: usize = 24;

/// Size of a serialized log
pub const BOOT_LOG_SIZE: usize = LOG_HEADER_SIZE + MAX_LOG_ENTRIES * LOG_ENTRY_SIZE;

/// Slot byte for entries not tied to a slot
const NO_SLOT: u8 = 0xFF;

// ============================================================================
// Boot Stage
// ============================================================================

/// Boot stage an entry was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootStage {
    /// Signature primitive self-test
    SelfTest = 0,
    /// Opening the root of trust
    RootOfTrust = 1,
    /// Per-slot verification
    SlotVerify = 2,
    /// A slot was selected
    SlotSelected = 3,
    /// No slot passed
    Halt = 4,
    /// Unknown stage
    Unknown = 255,
}

impl From<u8> for BootStage {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::SelfTest,
            1 => Self::RootOfTrust,
            2 => Self::SlotVerify,
            3 => Self::SlotSelected,
            4 => Self::Halt,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// Error Category
// ============================================================================

/// Boot error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCategory {
    /// No error
    None = 0,
    /// Image could not be read
    Io = 1,
    /// Header failed structural validation
    Structural = 2,
    /// Embedded key not bound to the root of trust
    Binding = 3,
    /// Digest or signature failure
    Crypto = 4,
    /// Version below the rollback floor
    Rollback = 5,
    /// Root-of-trust store failure
    Store = 6,
    /// Internal error
    Internal = 7,
    /// Unknown error
    Unknown = 255,
}

impl From<u8> for ErrorCategory {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::Io,
            2 => Self::Structural,
            3 => Self::Binding,
            4 => Self::Crypto,
            5 => Self::Rollback,
            6 => Self::Store,
            7 => Self::Internal,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// Wire Schema
// ============================================================================

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct EntryWire {
    boot_attempt: U32<LittleEndian>,
    slot: u8,
    stage: u8,
    category: u8,
    _reserved0: u8,
    error_code: U16<LittleEndian>,
    _reserved1: [u8; 2],
    version: U32<LittleEndian>,
    min_version: U32<LittleEndian>,
    _reserved2: [u8; 8],
    crc: U32<LittleEndian>,
}

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct HeaderWire {
    magic: U32<LittleEndian>,
    version: U32<LittleEndian>,
    boot_count: U32<LittleEndian>,
    total_entries: U32<LittleEndian>,
    write_index: U32<LittleEndian>,
    crc: U32<LittleEndian>,
}

const _: () = assert!(core::mem::size_of::<EntryWire>() == LOG_ENTRY_SIZE);
const _: () = assert!(core::mem::size_of::<HeaderWire>() == LOG_HEADER_SIZE);

// ============================================================================
// Boot Log Entry
// ============================================================================

/// A single boot log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootLogEntry {
    /// Boot attempt counter (monotonic)
    pub boot_attempt: u32,
    /// Slot the entry refers to
    pub slot: Option<SlotId>,
    /// Stage the entry was recorded in
    pub stage: BootStage,
    /// Error category
    pub category: ErrorCategory,
    /// Specific error code (`VerifyError` or `pqb_common::Error` code)
    pub error_code: u16,
    /// Firmware version, 0 if unknown
    pub version: u32,
    /// Rollback floor when the entry was recorded
    pub min_version: u32,
}

impl BootLogEntry {
    /// Create a log entry for a failure
    #[must_use]
    pub const fn for_failure(
        boot_attempt: u32,
        stage: BootStage,
        category: ErrorCategory,
        error_code: u16,
    ) -> Self {
        Self {
            boot_attempt,
            slot: None,
            stage,
            category,
            error_code,
            version: 0,
            min_version: 0,
        }
    }

    /// Create a log entry for a rejected slot
    #[must_use]
    pub const fn for_rejection(boot_attempt: u32, slot: SlotId, error: VerifyError) -> Self {
        Self {
            boot_attempt,
            slot: Some(slot),
            stage: BootStage::SlotVerify,
            category: error.category(),
            error_code: error.code(),
            version: 0,
            min_version: 0,
        }
    }

    /// Create a log entry for a selected slot
    #[must_use]
    pub const fn for_selection(
        boot_attempt: u32,
        slot: SlotId,
        version: u32,
        min_version: u32,
    ) -> Self {
        Self {
            boot_attempt,
            slot: Some(slot),
            stage: BootStage::SlotSelected,
            category: ErrorCategory::None,
            error_code: 0,
            version,
            min_version,
        }
    }

    /// Rejection reason, if this entry records a slot rejection
    #[must_use]
    pub const fn verify_error(&self) -> Option<VerifyError> {
        match self.stage {
            BootStage::SlotVerify => VerifyError::from_code(self.error_code),
            _ => None,
        }
    }

    /// Serialize with a trailing CRC32
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LOG_ENTRY_SIZE] {
        let mut wire = EntryWire {
            boot_attempt: U32::new(self.boot_attempt),
            slot: self.slot.map_or(NO_SLOT, |s| s as u8),
            stage: self.stage as u8,
            category: self.category as u8,
            _reserved0: 0,
            error_code: U16::new(self.error_code),
            _reserved1: [0; 2],
            version: U32::new(self.version),
            min_version: U32::new(self.min_version),
            _reserved2: [0; 8],
            crc: U32::new(0),
        };
        wire.crc = U32::new(crc32fast::hash(&wire.as_bytes()[..LOG_ENTRY_SIZE - 4]));

        let mut out = [0u8; LOG_ENTRY_SIZE];
        out.copy_from_slice(wire.as_bytes());
        out
    }

    /// Deserialize, returning `None` on CRC mismatch, unknown slot or an
    /// all-zero (never written) record
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let wire = EntryWire::read_from_bytes(bytes.get(..LOG_ENTRY_SIZE)?).ok()?;
        if bytes[..LOG_ENTRY_SIZE].iter().all(|&b| b == 0) {
            return None;
        }
        if crc32fast::hash(&bytes[..LOG_ENTRY_SIZE - 4]) != wire.crc.get() {
            return None;
        }

        let slot = match wire.slot {
            NO_SLOT => None,
            s => Some(SlotId::try_from(s).ok()?),
        };

        Some(Self {
            boot_attempt: wire.boot_attempt.get(),
            slot,
            stage: BootStage::from(wire.stage),
            category: ErrorCategory::from(wire.category),
            error_code: wire.error_code.get(),
            version: wire.version.get(),
            min_version: wire.min_version.get(),
        })
    }
}

// ============================================================================
// Boot Log Manager
// ============================================================================

/// Boot log ring
#[derive(Debug, Clone)]
pub struct BootLog {
    entries: [Option<BootLogEntry>; MAX_LOG_ENTRIES],
    /// Boots recorded so far
    boot_count: u32,
    /// Total entries ever written
    total_entries: u32,
    /// Current write index (circular buffer)
    write_index: usize,
}

impl BootLog {
    /// Create an empty boot log
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [None; MAX_LOG_ENTRIES],
            boot_count: 0,
            total_entries: 0,
            write_index: 0,
        }
    }

    /// Clear all entries and counters
    pub fn format(&mut self) {
        *self = Self::new();
    }

    /// Start a new boot attempt and return its number
    pub fn begin_boot(&mut self) -> u32 {
        self.boot_count = self.boot_count.wrapping_add(1);
        self.boot_count
    }

    /// Current boot attempt number
    #[must_use]
    pub const fn boot_count(&self) -> u32 {
        self.boot_count
    }

    /// Append an entry, overwriting the oldest when full
    pub fn push(&mut self, entry: BootLogEntry) {
        self.entries[self.write_index] = Some(entry);
        self.write_index = (self.write_index + 1) % MAX_LOG_ENTRIES;
        self.total_entries = self.total_entries.wrapping_add(1);
    }

    /// Log a failure outside slot verification
    pub fn log_failure(&mut self, stage: BootStage, category: ErrorCategory, error_code: u16) {
        self.push(BootLogEntry::for_failure(
            self.boot_count,
            stage,
            category,
            error_code,
        ));
    }

    /// Log a rejected slot
    pub fn log_rejection(&mut self, slot: SlotId, error: VerifyError) {
        self.push(BootLogEntry::for_rejection(self.boot_count, slot, error));
    }

    /// Log a selected slot
    pub fn log_selection(&mut self, slot: SlotId, version: u32, min_version: u32) {
        self.push(BootLogEntry::for_selection(
            self.boot_count,
            slot,
            version,
            min_version,
        ));
    }

    /// Log a halt (every slot rejected)
    pub fn log_halt(&mut self) {
        self.push(BootLogEntry::for_failure(
            self.boot_count,
            BootStage::Halt,
            ErrorCategory::None,
            pqb_common::Error::NoBootableSlot.code(),
        ));
    }

    /// Get the most recent log entry
    #[must_use]
    pub fn get_latest(&self) -> Option<BootLogEntry> {
        self.get_entry(0)
    }

    /// Get log entry by index (0 = most recent)
    #[must_use]
    pub fn get_entry(&self, index: usize) -> Option<BootLogEntry> {
        if index >= self.entry_count() {
            return None;
        }
        let actual_index = (self.write_index + MAX_LOG_ENTRIES - 1 - index) % MAX_LOG_ENTRIES;
        self.entries[actual_index]
    }

    /// Entries from most recent to oldest, skipping dropped ones
    pub fn iter(&self) -> impl Iterator<Item = BootLogEntry> + '_ {
        (0..self.entry_count()).filter_map(|i| self.get_entry(i))
    }

    /// Get total number of entries ever logged
    #[must_use]
    pub const fn total_entries(&self) -> u32 {
        self.total_entries
    }

    /// Get number of ring positions in use
    #[must_use]
    pub fn entry_count(&self) -> usize {
        (self.total_entries as usize).min(MAX_LOG_ENTRIES)
    }

    /// Header CRC over magic, version and counters
    fn calculate_header_crc(boot_count: u32, total_entries: u32, write_index: u32) -> u32 {
        let mut data = [0u8; 20];
        data[0..4].copy_from_slice(&BOOT_LOG_MAGIC.to_le_bytes());
        data[4..8].copy_from_slice(&BOOT_LOG_VERSION.to_le_bytes());
        data[8..12].copy_from_slice(&boot_count.to_le_bytes());
        data[12..16].copy_from_slice(&total_entries.to_le_bytes());
        data[16..20].copy_from_slice(&write_index.to_le_bytes());
        crc32fast::hash(&data)
    }

    /// Serialize the whole ring
    #[must_use]
    pub fn to_bytes(&self) -> [u8; BOOT_LOG_SIZE] {
        let write_index = self.write_index as u32;
        let header = HeaderWire {
            magic: U32::new(BOOT_LOG_MAGIC),
            version: U32::new(BOOT_LOG_VERSION),
            boot_count: U32::new(self.boot_count),
            total_entries: U32::new(self.total_entries),
            write_index: U32::new(write_index),
            crc: U32::new(Self::calculate_header_crc(
                self.boot_count,
                self.total_entries,
                write_index,
            )),
        };

        let mut out = [0u8; BOOT_LOG_SIZE];
        out[..LOG_HEADER_SIZE].copy_from_slice(header.as_bytes());
        for (chunk, entry) in out[LOG_HEADER_SIZE..]
            .chunks_exact_mut(LOG_ENTRY_SIZE)
            .zip(self.entries.iter())
        {
            if let Some(entry) = entry {
                chunk.copy_from_slice(&entry.to_bytes());
            }
        }
        out
    }

    /// Deserialize a ring, formatting it if the header is invalid
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let Ok((header, _)) = HeaderWire::read_from_prefix(bytes) else {
            log::warn!("[pqb-boot] boot log truncated, formatting");
            return Self::new();
        };

        let boot_count = header.boot_count.get();
        let total_entries = header.total_entries.get();
        let write_index = header.write_index.get();
        let header_ok = header.magic.get() == BOOT_LOG_MAGIC
            && header.version.get() == BOOT_LOG_VERSION
            && header.crc.get()
                == Self::calculate_header_crc(boot_count, total_entries, write_index)
            && (write_index as usize) < MAX_LOG_ENTRIES
            && bytes.len() >= BOOT_LOG_SIZE;
        if !header_ok {
            log::warn!("[pqb-boot] boot log header invalid, formatting");
            return Self::new();
        }

        let mut log = Self {
            entries: [None; MAX_LOG_ENTRIES],
            boot_count,
            total_entries,
            write_index: write_index as usize,
        };
        let mut dropped = 0usize;
        for (i, chunk) in bytes[LOG_HEADER_SIZE..BOOT_LOG_SIZE]
            .chunks_exact(LOG_ENTRY_SIZE)
            .enumerate()
        {
            log.entries[i] = BootLogEntry::from_bytes(chunk);
            if log.entries[i].is_none() && i < log.entry_count() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::warn!("[pqb-boot] boot log: {dropped} corrupt entries dropped");
        }
        log
    }
}

impl Default for BootLog {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[cfg(feature = "std")]
impl BootLog {
    /// Load a persisted log; a missing or unreadable file yields an empty log
    pub fn load(path: &std::path::Path) -> Self {
        match crate::store::read_file(path, BOOT_LOG_SIZE) {
            Ok(bytes) => Self::from_bytes(&bytes),
            Err(crate::store::StoreError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::new()
            }
            Err(e) => {
                log::warn!("[pqb-boot] boot log not loaded: {e}");
                Self::new()
            }
        }
    }

    /// Persist the log atomically
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if the file cannot be replaced.
    pub fn save(&self, path: &std::path::Path) -> Result<(), crate::store::StoreError> {
        crate::store::write_atomic(path, &self.to_bytes())
    }
}

// ============================================================================
// Tests
// ============================================================================
