// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Core cryptographic traits
//!
//! These traits are the seams between the boot verifier and the concrete
//! primitives, so tests can substitute a verifier and the primitives stay
//! swappable.
//!
//! # Design Principles
//!
//! 1. **Fail closed**: any error from a primitive is a rejection
//! 2. **Constant-time**: digest comparison never short-circuits
//! 3. **no_std**: all traits are no_std compatible

use crate::error::CryptoError;

/// Signature verification trait
///
/// Only verification is needed on the boot path; signing lives in offline
/// tooling.
pub trait SignatureVerifier {
    /// Public key size in bytes
    const PUBLIC_KEY_SIZE: usize;
    /// Signature size in bytes
    const SIGNATURE_SIZE: usize;

    /// Verify `signature` over `message` under `public_key`
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKey` if the public key is malformed or the
    /// wrong size, `CryptoError::InvalidSignature` if the signature is the
    /// wrong size or does not verify.
    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError>;
}

/// Hash function trait
///
/// Provides both one-shot and incremental hashing.
pub trait Hash: Sized {
    /// Output size in bytes
    const OUTPUT_SIZE: usize;

    /// Output type
    type Output: AsRef<[u8]> + Clone;

    /// Hash a message in one shot
    fn hash(message: &[u8]) -> Self::Output;

    /// Create a new incremental hasher
    fn new() -> Self;

    /// Update the hasher with data
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the hash
    fn finalize(self) -> Self::Output;
}

/// Extendable Output Function (XOF) trait
pub trait Xof: Sized {
    /// Create a new XOF instance
    fn new() -> Self;

    /// Update the XOF with data
    fn update(&mut self, data: &[u8]);

    /// Finalize and fill `output` with XOF output
    fn finalize_into(self, output: &mut [u8]);

    /// One-shot: absorb input and squeeze output
    fn squeeze(input: &[u8], output: &mut [u8]) {
        let mut xof = Self::new();
        xof.update(input);
        xof.finalize_into(output);
    }
}

/// Constant-time comparison
///
/// Compares two byte slices in constant time to prevent timing attacks.
/// Slices of different lengths compare unequal.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}
