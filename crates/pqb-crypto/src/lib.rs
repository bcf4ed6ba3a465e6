// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! pqboot Cryptographic Layer
//!
//! This crate provides the primitives the boot verifier depends on:
//!
//! - **Digest engine**: SHA-256 public key binding hash and the
//!   domain-separated SHAKE256 firmware digest
//! - **Signatures**: ML-DSA-44 (FIPS 204) verification with an empty context
//! - **Self-test**: a startup known-good/known-bad check of the signature
//!   primitive
//!
//! # Security Requirements
//!
//! - Comparisons of digests are constant time
//! - Self-test key pairs are ephemeral and never leave [`self_test`]
//! - Key and signature bytes are never logged

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod digest;
pub mod error;
pub mod hash;
pub mod mldsa;
pub mod traits;

// Re-export main traits and types
pub use digest::{bind_hash, firmware_digest};
pub use error::{CryptoError, CryptoResult};
pub use hash::{Sha256, Shake256};
pub use mldsa::{self_test, MlDsa44};
pub use traits::{constant_time_eq, Hash, SignatureVerifier, Xof};
