// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Slot Sources
//!
//! A slot is one (header, payload) pair. Sources hand the verifier raw bytes
//! and know nothing about the format.

use pqb_common::SlotId;

use crate::verify::VerifyError;

/// Provider of the raw bytes of one slot
pub trait SlotSource {
    /// Owned or borrowed byte buffer
    type Buffer: AsRef<[u8]>;

    /// Slot identifier
    fn id(&self) -> SlotId;

    /// Load the header bytes
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::ImageNotFound` if the bytes are unavailable.
    fn load_header(&mut self) -> Result<Self::Buffer, VerifyError>;

    /// Load the payload bytes
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::ImageNotFound` if the bytes are unavailable.
    fn load_payload(&mut self) -> Result<Self::Buffer, VerifyError>;
}

// ============================================================================
// Memory Slot
// ============================================================================

/// Slot backed by borrowed byte slices
#[derive(Debug, Clone, Copy)]
pub struct MemorySlot<'a> {
    id: SlotId,
    header: &'a [u8],
    payload: &'a [u8],
}

impl<'a> MemorySlot<'a> {
    /// Create a slot over already-mapped images
    #[must_use]
    pub const fn new(id: SlotId, header: &'a [u8], payload: &'a [u8]) -> Self {
        Self { id, header, payload }
    }
}

impl<'a> SlotSource for MemorySlot<'a> {
    type Buffer = &'a [u8];

    fn id(&self) -> SlotId {
        self.id
    }

    fn load_header(&mut self) -> Result<&'a [u8], VerifyError> {
        Ok(self.header)
    }

    fn load_payload(&mut self) -> Result<&'a [u8], VerifyError> {
        Ok(self.payload)
    }
}

// ============================================================================
// File Slot
// ============================================================================

#[cfg(feature = "std")]
pub use file::FileSlot;

#[cfg(feature = "std")]
mod file {
    use std::path::{Path, PathBuf};
    use std::vec::Vec;

    use pqb_common::SlotId;
    use zeroize::Zeroizing;

    use super::SlotSource;
    use crate::store::{read_file, StoreError};
    use crate::verify::VerifyError;

    /// Header files are read whole; only the first 4096 bytes are parsed
    const MAX_HEADER_FILE_SIZE: usize = 64 * 1024;

    /// Slot backed by a header file and a payload file
    ///
    /// Files are read whole on every load; buffers are wiped on drop.
    #[derive(Debug, Clone)]
    pub struct FileSlot {
        id: SlotId,
        header_path: PathBuf,
        payload_path: PathBuf,
        max_payload_size: usize,
    }

    impl FileSlot {
        /// Create a file slot
        pub fn new(
            id: SlotId,
            header_path: impl Into<PathBuf>,
            payload_path: impl Into<PathBuf>,
            max_payload_size: usize,
        ) -> Self {
            Self {
                id,
                header_path: header_path.into(),
                payload_path: payload_path.into(),
                max_payload_size,
            }
        }

        /// Header file path
        pub fn header_path(&self) -> &Path {
            &self.header_path
        }

        /// Payload file path
        pub fn payload_path(&self) -> &Path {
            &self.payload_path
        }

        fn load(&self, path: &Path, limit: usize) -> Result<Zeroizing<Vec<u8>>, VerifyError> {
            read_file(path, limit)
                .and_then(|bytes| {
                    if bytes.is_empty() {
                        Err(StoreError::EmptyFile {
                            path: path.to_path_buf(),
                        })
                    } else {
                        Ok(Zeroizing::new(bytes))
                    }
                })
                .map_err(|e| {
                    log::warn!("[pqb-boot] slot {}: {e}", self.id);
                    VerifyError::ImageNotFound
                })
        }
    }

    impl SlotSource for FileSlot {
        type Buffer = Zeroizing<Vec<u8>>;

        fn id(&self) -> SlotId {
            self.id
        }

        fn load_header(&mut self) -> Result<Self::Buffer, VerifyError> {
            self.load(&self.header_path, MAX_HEADER_FILE_SIZE)
        }

        fn load_payload(&mut self) -> Result<Self::Buffer, VerifyError> {
            self.load(&self.payload_path, self.max_payload_size)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
