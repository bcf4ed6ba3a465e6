// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Firmware image format and root-of-trust constants
//!
//! All header values are little-endian on the wire.

// =============================================================================
// Cryptographic Constants
// =============================================================================

/// ML-DSA-44 public key size in bytes
pub const MLDSA44_PUBLIC_KEY_SIZE: usize = 1312;

/// ML-DSA-44 signature size in bytes
pub const MLDSA44_SIGNATURE_SIZE: usize = 2420;

/// SHA-256 output size in bytes (public key binding hash)
pub const PK_HASH_SIZE: usize = 32;

/// SHAKE256 squeeze length for the firmware digest
pub const FIRMWARE_DIGEST_SIZE: usize = 64;

/// Domain separation tag absorbed before the firmware payload
pub const FW_DOMAIN_TAG: &[u8] = b"BOOT_FW_V1";

// =============================================================================
// Header Constants
// =============================================================================

/// Header magic, "DILI" read as a little-endian u32
pub const HDR_MAGIC: u32 = 0x4449_4C49;

/// Total header size in bytes
pub const HDR_SIZE: usize = 4096;

/// Size of the fixed field prefix (six u32 fields)
pub const HDR_PREFIX_SIZE: usize = 24;

/// Offset of the embedded public key
pub const HDR_BLOB_OFFSET: usize = 0x18;

// =============================================================================
// Boot Constants
// =============================================================================

/// Minimum acceptable version when the counter is uninitialized
pub const DEFAULT_MIN_VERSION: u32 = 1;

/// Maximum number of candidate slots
pub const MAX_SLOTS: usize = 4;

/// Maximum payload size accepted by file-backed slots (16 MiB)
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Boot log capacity in entries
pub const BOOT_LOG_CAPACITY: usize = 16;

// Compile-time checks
const _: () = assert!(HDR_PREFIX_SIZE == 6 * core::mem::size_of::<u32>());
const _: () = assert!(HDR_BLOB_OFFSET == HDR_PREFIX_SIZE);
const _: () =
    assert!(HDR_BLOB_OFFSET + MLDSA44_PUBLIC_KEY_SIZE + MLDSA44_SIGNATURE_SIZE <= HDR_SIZE);
const _: () = assert!(FW_DOMAIN_TAG.len() == 10);
