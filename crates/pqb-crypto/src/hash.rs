// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Hash function implementations
//!
//! SHA-256 (public key binding) and SHAKE256 (firmware digest). Both wrap the
//! RustCrypto `sha2`/`sha3` crates and are no_std compatible.

use crate::traits::{Hash, Xof};
use sha2::{Digest, Sha256 as Sha256Impl};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256 as Shake256Impl;

/// SHA-256 hash output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sha256Output([u8; 32]);

impl Sha256Output {
    /// Create from bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Consume into the raw array
    #[must_use]
    pub const fn into_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Sha256Output {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Output {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// SHA-256 hasher
pub struct Sha256 {
    inner: Sha256Impl,
}

impl Hash for Sha256 {
    const OUTPUT_SIZE: usize = 32;

    type Output = Sha256Output;

    fn hash(message: &[u8]) -> Self::Output {
        let result = Sha256Impl::digest(message);
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Sha256Output(output)
    }

    fn new() -> Self {
        Self {
            inner: Sha256Impl::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self) -> Self::Output {
        let result = self.inner.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        Sha256Output(output)
    }
}

impl Default for Sha256 {
    fn default() -> Self {
        <Self as Hash>::new()
    }
}

// =============================================================================
// SHAKE256 Extendable Output Function (XOF)
// =============================================================================

/// SHAKE256 extendable-output function wrapper
pub struct Shake256 {
    inner: Shake256Impl,
}

impl Shake256 {
    /// Create a new SHAKE256 hasher
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Shake256Impl::default(),
        }
    }

    /// Update with data
    pub fn update(&mut self, data: &[u8]) {
        Update::update(&mut self.inner, data);
    }

    /// Finalize into a fixed-size array
    #[must_use]
    pub fn finalize_array<const N: usize>(self) -> [u8; N] {
        let mut output = [0u8; N];
        let mut reader = self.inner.finalize_xof();
        reader.read(&mut output);
        output
    }
}

impl Default for Shake256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Xof for Shake256 {
    fn new() -> Self {
        Shake256::new()
    }

    fn update(&mut self, data: &[u8]) {
        Shake256::update(self, data);
    }

    fn finalize_into(self, output: &mut [u8]) {
        let mut reader = self.inner.finalize_xof();
        reader.read(output);
    }
}
