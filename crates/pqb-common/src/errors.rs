// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for pqboot
//!
//! This module defines the unified error type used across the workspace.
//! Errors are fieldless and `Copy` so they can cross the `no_std` boundary
//! without allocation; detail is reported through logging.

use core::fmt;

/// Result type alias for pqboot operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for pqboot
///
/// Each variant maps to a stable numeric code, grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Cryptographic Errors (0x01xx)
    // =========================================================================
    /// Invalid cryptographic key format or size
    InvalidKey,
    /// Signature verification failed
    InvalidSignature,
    /// Public key is not bound to the root of trust
    KeyBindingMismatch,
    /// Startup self-test of a primitive failed
    SelfTestFailed,

    // =========================================================================
    // Storage Errors (0x03xx)
    // =========================================================================
    /// Storage read operation failed
    StorageReadFailed,
    /// Storage write operation failed
    StorageWriteFailed,
    /// Requested item not found in storage
    StorageNotFound,
    /// Storage data is corrupted
    StorageCorrupted,
    /// Storage is locked by another process
    StorageLocked,

    // =========================================================================
    // Image Errors (0x04xx)
    // =========================================================================
    /// Image header is malformed
    InvalidHeader,
    /// Image signature verification failed
    ImageSignatureFailed,
    /// Version rollback attempted (blocked)
    RollbackAttempted,
    /// Image payload does not match its header
    ImageCorrupted,
    /// Image could not be read
    ImageNotFound,

    // =========================================================================
    // Boot Errors (0x0Axx)
    // =========================================================================
    /// Invalid boot configuration
    InvalidBootConfig,
    /// Every candidate slot was rejected
    NoBootableSlot,
    /// Root of trust has not been provisioned
    NotProvisioned,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,
    /// Resource is exhausted
    ResourceExhausted,
    /// Internal error (should not occur)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Cryptographic errors
    /// - 0x03xx: Storage errors
    /// - 0x04xx: Image errors
    /// - 0x0Axx: Boot errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Crypto errors (0x01xx)
            Self::InvalidKey => 0x0101,
            Self::InvalidSignature => 0x0102,
            Self::KeyBindingMismatch => 0x010A,
            Self::SelfTestFailed => 0x010B,

            // Storage errors (0x03xx)
            Self::StorageReadFailed => 0x0301,
            Self::StorageWriteFailed => 0x0302,
            Self::StorageNotFound => 0x0304,
            Self::StorageCorrupted => 0x0305,
            Self::StorageLocked => 0x0306,

            // Image errors (0x04xx)
            Self::InvalidHeader => 0x0401,
            Self::ImageSignatureFailed => 0x0402,
            Self::RollbackAttempted => 0x0403,
            Self::ImageCorrupted => 0x0404,
            Self::ImageNotFound => 0x0409,

            // Boot errors (0x0Axx)
            Self::InvalidBootConfig => 0x0A02,
            Self::NoBootableSlot => 0x0A05,
            Self::NotProvisioned => 0x0A06,

            // General errors (0xFFxx)
            Self::InvalidParameter => 0xFF02,
            Self::ResourceExhausted => 0xFF03,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-critical error
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey
                | Self::InvalidSignature
                | Self::KeyBindingMismatch
                | Self::SelfTestFailed
                | Self::ImageSignatureFailed
                | Self::RollbackAttempted
                | Self::NotProvisioned
        )
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid cryptographic key",
            Self::InvalidSignature => "signature verification failed",
            Self::KeyBindingMismatch => "public key not bound to root of trust",
            Self::SelfTestFailed => "signature primitive unavailable",
            Self::StorageReadFailed => "storage read failed",
            Self::StorageWriteFailed => "storage write failed",
            Self::StorageNotFound => "storage item not found",
            Self::StorageCorrupted => "storage corrupted",
            Self::StorageLocked => "storage locked",
            Self::InvalidHeader => "invalid image header",
            Self::ImageSignatureFailed => "image signature failed",
            Self::RollbackAttempted => "rollback attempted",
            Self::ImageCorrupted => "image corrupted",
            Self::ImageNotFound => "image not found",
            Self::InvalidBootConfig => "invalid boot config",
            Self::NoBootableSlot => "no bootable slot",
            Self::NotProvisioned => "root of trust not provisioned",
            Self::InvalidParameter => "invalid parameter",
            Self::ResourceExhausted => "resource exhausted",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
