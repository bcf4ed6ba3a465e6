// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Cryptographic error types
//!
//! This module defines error types for all cryptographic operations.

use core::fmt;

/// Error type for cryptographic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid key format or size
    InvalidKey,
    /// Signature verification failed
    InvalidSignature,
    /// Primitive self-test failed
    SelfTestFailed,
}

impl CryptoError {
    /// Get error code for logging/debugging
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidKey => 0x0101,
            Self::InvalidSignature => 0x0102,
            Self::SelfTestFailed => 0x010B,
        }
    }

    /// Get error description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid key",
            Self::InvalidSignature => "invalid signature",
            Self::SelfTestFailed => "signature primitive unavailable",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CryptoError {}

impl From<CryptoError> for pqb_common::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidKey => Self::InvalidKey,
            CryptoError::InvalidSignature => Self::InvalidSignature,
            CryptoError::SelfTestFailed => Self::SelfTestFailed,
        }
    }
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
