// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Slot Verification
//!
//! Runs one slot through every gate and produces a pass/fail verdict.
//!
//! # Verification Process
//!
//! 1. Load header and payload bytes from the slot
//! 2. Decode and validate the header
//! 3. Bind the embedded public key to the root-of-trust hash (SHA-256)
//! 4. Compute the firmware digest (SHAKE256, `BOOT_FW_V1` tag)
//! 5. Verify the ML-DSA-44 signature over the digest
//! 6. Enforce the anti-rollback floor, raising it when the version is newer
//!
//! Evaluation stops at the first failing gate. The rollback floor is only
//! touched after the cryptographic gates pass, through a single
//! [`RootOfTrust::check_and_advance`] call.

use core::marker::PhantomData;

use pqb_common::{Error, SlotId};
use pqb_crypto::{bind_hash, constant_time_eq, firmware_digest, MlDsa44, SignatureVerifier};

use crate::boot_log::ErrorCategory;
use crate::header::parse_header;
use crate::rollback::RootOfTrust;
use crate::slot::SlotSource;

// ============================================================================
// Verification Error Types
// ============================================================================

/// Verification error types, one per gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Header or payload could not be loaded
    ImageNotFound,
    /// Header buffer shorter than 4096 bytes
    HeaderTooSmall,
    /// Invalid magic number
    InvalidMagic,
    /// Declared header size is not 4096
    InvalidHeaderSize,
    /// Declared payload size differs from the actual payload
    SizeMismatch,
    /// Public key and signature do not fit inside the header
    BlobOverflow,
    /// Public key length is not the ML-DSA-44 size
    InvalidKeyLength,
    /// Signature length is not the ML-DSA-44 size
    InvalidSignatureLength,
    /// Embedded public key does not hash to the provisioned value
    PublicKeyMismatch,
    /// Signature verification failed
    SignatureFailed,
    /// Version is below the rollback floor
    RollbackAttempt,
    /// Raised rollback floor could not be persisted
    CounterUpdateFailed,
    /// Internal error
    InternalError,
}

impl VerifyError {
    /// Taxonomy category of this error
    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::ImageNotFound => ErrorCategory::Io,
            Self::HeaderTooSmall
            | Self::InvalidMagic
            | Self::InvalidHeaderSize
            | Self::SizeMismatch
            | Self::BlobOverflow
            | Self::InvalidKeyLength
            | Self::InvalidSignatureLength => ErrorCategory::Structural,
            Self::PublicKeyMismatch => ErrorCategory::Binding,
            Self::SignatureFailed => ErrorCategory::Crypto,
            Self::RollbackAttempt => ErrorCategory::Rollback,
            Self::CounterUpdateFailed => ErrorCategory::Store,
            Self::InternalError => ErrorCategory::Internal,
        }
    }

    /// Boot log error code (0x0Bxx)
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::ImageNotFound => 0x0B01,
            Self::HeaderTooSmall => 0x0B02,
            Self::InvalidMagic => 0x0B03,
            Self::InvalidHeaderSize => 0x0B04,
            Self::SizeMismatch => 0x0B05,
            Self::BlobOverflow => 0x0B06,
            Self::InvalidKeyLength => 0x0B07,
            Self::InvalidSignatureLength => 0x0B08,
            Self::PublicKeyMismatch => 0x0B09,
            Self::SignatureFailed => 0x0B0B,
            Self::RollbackAttempt => 0x0B0C,
            Self::CounterUpdateFailed => 0x0B0D,
            Self::InternalError => 0x0BFF,
        }
    }

    /// Short description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ImageNotFound => "image could not be read",
            Self::HeaderTooSmall => "header too small",
            Self::InvalidMagic => "bad header magic",
            Self::InvalidHeaderSize => "bad header size",
            Self::SizeMismatch => "payload size mismatch",
            Self::BlobOverflow => "key and signature overflow header",
            Self::InvalidKeyLength => "bad public key length",
            Self::InvalidSignatureLength => "bad signature length",
            Self::PublicKeyMismatch => "public key not bound to root of trust",
            Self::SignatureFailed => "signature verification failed",
            Self::RollbackAttempt => "version below rollback floor",
            Self::CounterUpdateFailed => "rollback floor update failed",
            Self::InternalError => "internal error",
        }
    }

    /// Decode a boot log error code
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0B01 => Self::ImageNotFound,
            0x0B02 => Self::HeaderTooSmall,
            0x0B03 => Self::InvalidMagic,
            0x0B04 => Self::InvalidHeaderSize,
            0x0B05 => Self::SizeMismatch,
            0x0B06 => Self::BlobOverflow,
            0x0B07 => Self::InvalidKeyLength,
            0x0B08 => Self::InvalidSignatureLength,
            0x0B09 => Self::PublicKeyMismatch,
            0x0B0B => Self::SignatureFailed,
            0x0B0C => Self::RollbackAttempt,
            0x0B0D => Self::CounterUpdateFailed,
            0x0BFF => Self::InternalError,
            _ => return None,
        })
    }
}

impl core::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

impl From<VerifyError> for Error {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::ImageNotFound => Error::ImageNotFound,
            VerifyError::HeaderTooSmall
            | VerifyError::InvalidMagic
            | VerifyError::InvalidHeaderSize
            | VerifyError::BlobOverflow
            | VerifyError::InvalidKeyLength
            | VerifyError::InvalidSignatureLength => Error::InvalidHeader,
            VerifyError::SizeMismatch => Error::ImageCorrupted,
            VerifyError::PublicKeyMismatch => Error::KeyBindingMismatch,
            VerifyError::SignatureFailed => Error::ImageSignatureFailed,
            VerifyError::RollbackAttempt => Error::RollbackAttempted,
            VerifyError::CounterUpdateFailed => Error::StorageWriteFailed,
            VerifyError::InternalError => Error::InternalError,
        }
    }
}

// ============================================================================
// Verification State Machine
// ============================================================================

/// Gate currently being evaluated
///
/// `ComputingDigest` cannot fail; a hashing step always completes. It is
/// recorded so that a verifier observed mid-run reports where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    /// Not started
    Idle,
    /// Reading header and payload
    LoadingImage,
    /// Decoding header fields
    ParsingHeader,
    /// Comparing the key hash with the root of trust
    CheckingBinding,
    /// Computing the firmware digest
    ComputingDigest,
    /// Verifying signature
    VerifyingSignature,
    /// Checking and advancing the rollback floor
    CheckingRollback,
    /// Complete (success)
    Complete,
    /// Failed
    Failed(VerifyError),
}

/// Outcome of a passing slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotVerdict {
    /// Slot that passed
    pub slot: SlotId,
    /// Verified firmware version
    pub version: u32,
    /// Rollback floor before this verification
    pub previous_min_version: u32,
    /// Whether the floor was raised to `version`
    pub counter_advanced: bool,
}

/// Verifier for one slot against a root of trust
///
/// `V` is the signature scheme; only ML-DSA-44 is used outside tests.
pub struct SlotVerifier<'r, R: RootOfTrust, V: SignatureVerifier = MlDsa44> {
    rot: &'r mut R,
    state: VerifyState,
    _scheme: PhantomData<V>,
}

impl<'r, R: RootOfTrust> SlotVerifier<'r, R> {
    /// Create an ML-DSA-44 verifier
    pub fn new(rot: &'r mut R) -> Self {
        Self::with_scheme(rot)
    }
}

impl<'r, R: RootOfTrust, V: SignatureVerifier> SlotVerifier<'r, R, V> {
    /// Create a verifier for an explicit signature scheme
    pub fn with_scheme(rot: &'r mut R) -> Self {
        Self {
            rot,
            state: VerifyState::Idle,
            _scheme: PhantomData,
        }
    }

    /// Get current state
    pub fn state(&self) -> VerifyState {
        self.state
    }

    /// Run every gate on `slot`
    ///
    /// # Errors
    ///
    /// Returns the [`VerifyError`] of the first gate that rejects the slot.
    pub fn verify<S: SlotSource>(&mut self, slot: &mut S) -> Result<SlotVerdict, VerifyError> {
        let id = slot.id();
        self.state = VerifyState::Idle;

        let result = self.run(slot);
        match result {
            Ok(verdict) => {
                self.state = VerifyState::Complete;
                log::info!(
                    "[pqb-boot] slot {id}: PASS version {} (floor {}{})",
                    verdict.version,
                    verdict.previous_min_version,
                    if verdict.counter_advanced { ", advanced" } else { "" }
                );
            }
            Err(e) => {
                self.state = VerifyState::Failed(e);
                log::warn!("[pqb-boot] slot {id}: FAIL {e}");
            }
        }
        result
    }

    fn run<S: SlotSource>(&mut self, slot: &mut S) -> Result<SlotVerdict, VerifyError> {
        let id = slot.id();

        self.state = VerifyState::LoadingImage;
        let header_buf = slot.load_header()?;
        let payload_buf = slot.load_payload()?;
        let payload = payload_buf.as_ref();

        self.state = VerifyState::ParsingHeader;
        let header = parse_header(header_buf.as_ref(), payload.len())?;
        log::debug!(
            "[pqb-boot] slot {id}: header ok, version {}, payload {} bytes",
            header.version,
            header.fw_size
        );

        self.state = VerifyState::CheckingBinding;
        let expected = self.rot.pk_hash();
        let actual = bind_hash(header.public_key);
        if !constant_time_eq(actual.as_bytes(), expected.as_bytes()) {
            log::debug!("[pqb-boot] slot {id}: key hash {actual} != provisioned {expected}");
            return Err(VerifyError::PublicKeyMismatch);
        }

        self.state = VerifyState::ComputingDigest;
        let digest = firmware_digest(payload);

        self.state = VerifyState::VerifyingSignature;
        V::verify(header.public_key, digest.as_bytes(), header.signature).map_err(|e| {
            log::debug!("[pqb-boot] slot {id}: {e}");
            VerifyError::SignatureFailed
        })?;

        self.state = VerifyState::CheckingRollback;
        let update = self
            .rot
            .check_and_advance(header.version)
            .map_err(|e| match e {
                Error::RollbackAttempted => {
                    log::debug!(
                        "[pqb-boot] slot {id}: version {} below rollback floor",
                        header.version
                    );
                    VerifyError::RollbackAttempt
                }
                e => {
                    log::error!(
                        "[pqb-boot] slot {id}: could not raise floor to {}: {e}",
                        header.version
                    );
                    VerifyError::CounterUpdateFailed
                }
            })?;

        Ok(SlotVerdict {
            slot: id,
            version: header.version,
            previous_min_version: update.previous,
            counter_advanced: update.advanced,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
