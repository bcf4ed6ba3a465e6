// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! ML-DSA-44 (FIPS 204) signature verification
//!
//! Backed by the `fips204` crate. The boot path only verifies; key generation
//! and signing are used by [`self_test`] alone.
//!
//! # Parameters
//!
//! | Item | Size |
//! |------|------|
//! | Public key | 1312 bytes |
//! | Signature | 2420 bytes |
//! | Context | empty |
//!
//! Signatures are accepted only for the exact sizes above. There is no
//! fallback scheme.

use crate::error::{CryptoError, CryptoResult};
use crate::traits::SignatureVerifier;
use fips204::ml_dsa_44;
use fips204::traits::{SerDes, Signer, Verifier};
use pqb_common::constants::{MLDSA44_PUBLIC_KEY_SIZE, MLDSA44_SIGNATURE_SIZE};

/// Context string used for every signature
const CONTEXT: &[u8] = &[];

const _: () = assert!(ml_dsa_44::PK_LEN == MLDSA44_PUBLIC_KEY_SIZE);
const _: () = assert!(ml_dsa_44::SIG_LEN == MLDSA44_SIGNATURE_SIZE);

/// ML-DSA-44 verifier
pub struct MlDsa44;

impl SignatureVerifier for MlDsa44 {
    const PUBLIC_KEY_SIZE: usize = MLDSA44_PUBLIC_KEY_SIZE;
    const SIGNATURE_SIZE: usize = MLDSA44_SIGNATURE_SIZE;

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let pk_bytes: [u8; ml_dsa_44::PK_LEN] =
            public_key.try_into().map_err(|_| CryptoError::InvalidKey)?;
        let sig: &[u8; ml_dsa_44::SIG_LEN] =
            signature.try_into().map_err(|_| CryptoError::InvalidSignature)?;

        let pk = ml_dsa_44::PublicKey::try_from_bytes(pk_bytes).map_err(|e| {
            log::debug!("[pqb-crypto] ML-DSA-44 public key rejected: {e}");
            CryptoError::InvalidKey
        })?;

        if pk.verify(message, sig, CONTEXT) {
            Ok(())
        } else {
            Err(CryptoError::InvalidSignature)
        }
    }
}

// =============================================================================
// Capability self-test
// =============================================================================

const SELF_TEST_MESSAGE: &[u8] = b"pqboot ML-DSA-44 capability self-test";

/// Startup self-test of the signature primitive
///
/// Generates a fresh key pair, signs a fixed message, and checks that the
/// verifier accepts it and rejects a one-bit tampered copy. Run once before
/// any slot is evaluated.
///
/// # Errors
///
/// Returns `CryptoError::SelfTestFailed` if any step fails.
pub fn self_test() -> CryptoResult<()> {
    let (pk, sk) = ml_dsa_44::try_keygen().map_err(|e| {
        log::error!("[pqb-crypto] self-test keygen failed: {e}");
        CryptoError::SelfTestFailed
    })?;
    let signature = sk.try_sign(SELF_TEST_MESSAGE, CONTEXT).map_err(|e| {
        log::error!("[pqb-crypto] self-test signing failed: {e}");
        CryptoError::SelfTestFailed
    })?;
    let pk_bytes = pk.into_bytes();

    if let Err(e) = MlDsa44::verify(&pk_bytes, SELF_TEST_MESSAGE, &signature) {
        log::error!("[pqb-crypto] self-test rejected a valid signature: {e}");
        return Err(CryptoError::SelfTestFailed);
    }

    let mut tampered = [0u8; SELF_TEST_MESSAGE.len()];
    tampered.copy_from_slice(SELF_TEST_MESSAGE);
    tampered[0] ^= 0x01;
    if MlDsa44::verify(&pk_bytes, &tampered, &signature).is_ok() {
        log::error!("[pqb-crypto] self-test accepted a tampered message");
        return Err(CryptoError::SelfTestFailed);
    }

    log::debug!("[pqb-crypto] ML-DSA-44 self-test passed");
    Ok(())
}
