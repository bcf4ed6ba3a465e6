// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Firmware Header Codec
//!
//! Decodes and validates the fixed-size header at the front of every slot.
//!
//! # Layout (little-endian)
//!
//! ```text
//! Offset        Size   Field
//! 0x00          4      Magic (0x44494C49)
//! 0x04          4      Header size (4096)
//! 0x08          4      Version
//! 0x0C          4      Payload size
//! 0x10          4      Public key length (1312)
//! 0x14          4      Signature length (2420)
//! 0x18          1312   ML-DSA-44 public key
//! 0x538         2420   ML-DSA-44 signature
//! 0xEAC         -      Zero padding (not checked)
//! ```
//!
//! Each check is an independent gate and the first failure rejects the
//! header. Bytes past 4096 are ignored.

use pqb_common::constants::{
    HDR_BLOB_OFFSET, HDR_MAGIC, HDR_PREFIX_SIZE, HDR_SIZE, MLDSA44_PUBLIC_KEY_SIZE,
    MLDSA44_SIGNATURE_SIZE,
};
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::verify::VerifyError;

// ============================================================================
// Wire Schema
// ============================================================================

/// The six fixed fields at the start of the header
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct HeaderPrefix {
    /// Format magic
    pub magic: U32<LittleEndian>,
    /// Declared header size
    pub header_size: U32<LittleEndian>,
    /// Firmware version
    pub version: U32<LittleEndian>,
    /// Declared payload size
    pub fw_size: U32<LittleEndian>,
    /// Embedded public key length
    pub pk_len: U32<LittleEndian>,
    /// Embedded signature length
    pub sig_len: U32<LittleEndian>,
}

const _: () = assert!(core::mem::size_of::<HeaderPrefix>() == HDR_PREFIX_SIZE);

/// Field offsets within the header
pub mod offsets {
    /// Magic
    pub const MAGIC: usize = 0x00;
    /// Header size
    pub const HEADER_SIZE: usize = 0x04;
    /// Version
    pub const VERSION: usize = 0x08;
    /// Payload size
    pub const FW_SIZE: usize = 0x0C;
    /// Public key length
    pub const PK_LEN: usize = 0x10;
    /// Signature length
    pub const SIG_LEN: usize = 0x14;
}

// ============================================================================
// Parsed Header
// ============================================================================

/// A validated header borrowing its key and signature from the raw buffer
#[derive(Debug, Clone, Copy)]
pub struct FirmwareHeader<'a> {
    /// Firmware version, policy-checked against the rollback floor
    pub version: u32,
    /// Payload size, already checked against the actual payload
    pub fw_size: u32,
    /// Embedded ML-DSA-44 public key
    pub public_key: &'a [u8],
    /// Embedded ML-DSA-44 signature
    pub signature: &'a [u8],
}

/// Parse and validate a header buffer against the actual payload length
///
/// # Errors
///
/// Returns the [`VerifyError`] of the first gate that fails:
/// `HeaderTooSmall`, `InvalidMagic`, `InvalidHeaderSize`, `SizeMismatch`,
/// `BlobOverflow`, `InvalidKeyLength` or `InvalidSignatureLength`.
pub fn parse_header(buf: &[u8], payload_len: usize) -> Result<FirmwareHeader<'_>, VerifyError> {
    if buf.len() < HDR_SIZE {
        return Err(VerifyError::HeaderTooSmall);
    }

    let (prefix, _) =
        HeaderPrefix::read_from_prefix(buf).map_err(|_| VerifyError::HeaderTooSmall)?;

    if prefix.magic.get() != HDR_MAGIC {
        return Err(VerifyError::InvalidMagic);
    }

    let header_size = prefix.header_size.get();
    if header_size as usize != HDR_SIZE {
        return Err(VerifyError::InvalidHeaderSize);
    }

    let fw_size = prefix.fw_size.get();
    if u64::from(fw_size) != payload_len as u64 {
        return Err(VerifyError::SizeMismatch);
    }

    let pk_len = prefix.pk_len.get();
    let sig_len = prefix.sig_len.get();
    let blob_end = HDR_BLOB_OFFSET as u64 + u64::from(pk_len) + u64::from(sig_len);
    if blob_end > u64::from(header_size) {
        return Err(VerifyError::BlobOverflow);
    }

    if pk_len as usize != MLDSA44_PUBLIC_KEY_SIZE {
        return Err(VerifyError::InvalidKeyLength);
    }
    if sig_len as usize != MLDSA44_SIGNATURE_SIZE {
        return Err(VerifyError::InvalidSignatureLength);
    }

    let sig_offset = HDR_BLOB_OFFSET + MLDSA44_PUBLIC_KEY_SIZE;
    let public_key = buf
        .get(HDR_BLOB_OFFSET..sig_offset)
        .ok_or(VerifyError::InternalError)?;
    let signature = buf
        .get(sig_offset..sig_offset + MLDSA44_SIGNATURE_SIZE)
        .ok_or(VerifyError::InternalError)?;

    Ok(FirmwareHeader {
        version: prefix.version.get(),
        fw_size,
        public_key,
        signature,
    })
}

/// Build a conformant, zero-padded header
///
/// Used by provisioning tooling and tests; the boot path only parses.
#[must_use]
pub fn encode_header(
    version: u32,
    fw_size: u32,
    public_key: &[u8; MLDSA44_PUBLIC_KEY_SIZE],
    signature: &[u8; MLDSA44_SIGNATURE_SIZE],
) -> [u8; HDR_SIZE] {
    let prefix = HeaderPrefix {
        magic: U32::new(HDR_MAGIC),
        header_size: U32::new(HDR_SIZE as u32),
        version: U32::new(version),
        fw_size: U32::new(fw_size),
        pk_len: U32::new(MLDSA44_PUBLIC_KEY_SIZE as u32),
        sig_len: U32::new(MLDSA44_SIGNATURE_SIZE as u32),
    };

    let sig_offset = HDR_BLOB_OFFSET + MLDSA44_PUBLIC_KEY_SIZE;
    let mut out = [0u8; HDR_SIZE];
    out[..HDR_PREFIX_SIZE].copy_from_slice(prefix.as_bytes());
    out[HDR_BLOB_OFFSET..sig_offset].copy_from_slice(public_key);
    out[sig_offset..sig_offset + MLDSA44_SIGNATURE_SIZE].copy_from_slice(signature);
    out
}

// ============================================================================
// Tests
// ============================================================================
