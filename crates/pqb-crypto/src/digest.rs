// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Digest engine
//!
//! The two digests a slot verification computes: the binding hash of the
//! embedded public key and the domain-separated firmware digest that the
//! signature covers.

use crate::hash::{Sha256, Shake256};
use crate::traits::Hash;
use pqb_common::constants::FW_DOMAIN_TAG;
use pqb_common::{FirmwareDigest, PkHash};

/// SHA-256 over the raw public key bytes
#[must_use]
pub fn bind_hash(public_key: &[u8]) -> PkHash {
    PkHash::new(Sha256::hash(public_key).into_bytes())
}

/// SHAKE256(`BOOT_FW_V1` || payload), squeezed to 64 bytes
///
/// The tag is absorbed without a terminator. An empty payload is valid and
/// digests the tag alone. Infallible for any input length.
#[must_use]
pub fn firmware_digest(payload: &[u8]) -> FirmwareDigest {
    let mut xof = Shake256::new();
    xof.update(FW_DOMAIN_TAG);
    xof.update(payload);
    FirmwareDigest::new(xof.finalize_array())
}
