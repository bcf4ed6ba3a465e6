// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Integration tests for pqb-boot
//!
//! Slots are signed with real ML-DSA-44 keys generated by `fips204`, so every
//! gate runs against genuine key material. File-backed tests run in
//! temporary directories.

use fips204::ml_dsa_44;
use fips204::traits::{SerDes, Signer};
use pqb_boot::header::offsets;
use pqb_boot::{encode_header, MemoryRootOfTrust, MemorySlot};
use pqb_common::constants::HDR_SIZE;
use pqb_common::SlotId;
use pqb_crypto::{bind_hash, firmware_digest};

/// Test signing identity
struct TestKey {
    public: [u8; 1312],
    private: ml_dsa_44::PrivateKey,
}

impl TestKey {
    fn generate() -> Self {
        let (pk, sk) = ml_dsa_44::try_keygen().unwrap();
        Self {
            public: pk.into_bytes(),
            private: sk,
        }
    }

    /// Header for `payload` at `version`, signed the way the signing tool does
    fn sign(&self, version: u32, payload: &[u8]) -> [u8; HDR_SIZE] {
        let digest = firmware_digest(payload);
        let sig = self.private.try_sign(digest.as_bytes(), &[]).unwrap();
        encode_header(version, payload.len() as u32, &self.public, &sig)
    }

    /// Root of trust provisioned with this key
    fn rot(&self, min_version: u32) -> MemoryRootOfTrust {
        MemoryRootOfTrust::new(bind_hash(&self.public), min_version)
    }
}

fn patch(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn slot<'a>(id: SlotId, header: &'a [u8], payload: &'a [u8]) -> MemorySlot<'a> {
    MemorySlot::new(id, header, payload)
}

mod verify_tests {
    use super::*;
    use pqb_boot::{SlotVerifier, VerifyError, VerifyState};

    #[test]
    fn test_end_to_end_rollback_scenario() {
        let key = TestKey::generate();
        let payload = vec![0x5Au8; 1024];
        let mut rot = key.rot(3);

        let hdr = key.sign(5, &payload);
        let verdict = SlotVerifier::new(&mut rot)
            .verify(&mut slot(SlotId::A, &hdr, &payload))
            .unwrap();
        assert_eq!(verdict.version, 5);
        assert_eq!(verdict.previous_min_version, 3);
        assert!(verdict.counter_advanced);
        assert_eq!(rot.min_version(), 5);

        // Second boot with an older image under the same key
        let hdr = key.sign(4, &payload);
        let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
        assert_eq!(result, Err(VerifyError::RollbackAttempt));
        assert_eq!(rot.min_version(), 5);
        assert_eq!(rot.write_count(), 1);
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let key = TestKey::generate();
        let payload = b"deterministic".to_vec();
        let hdr = key.sign(2, &payload);

        let mut rot = key.rot(2);
        let first = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
        let second = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
        assert_eq!(first, second);
        assert!(first.is_ok());

        let mut tampered = payload.clone();
        tampered[0] ^= 1;
        let a = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &tampered));
        let b = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &tampered));
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncated_payload_fails() {
        let key = TestKey::generate();
        let payload = vec![1u8; 256];
        let hdr = key.sign(1, &payload);
        let mut rot = key.rot(1);

        for len in [255usize, 0] {
            let result =
                SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload[..len]));
            assert_eq!(result, Err(VerifyError::SizeMismatch), "len {len}");
        }

        let mut extended = payload.clone();
        extended.push(0);
        let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &extended));
        assert_eq!(result, Err(VerifyError::SizeMismatch));
    }

    #[test]
    fn test_empty_payload_signed_as_empty_passes() {
        let key = TestKey::generate();
        let hdr = key.sign(1, &[]);
        let mut rot = key.rot(1);
        assert!(SlotVerifier::new(&mut rot)
            .verify(&mut slot(SlotId::A, &hdr, &[]))
            .is_ok());
    }

    #[test]
    fn test_length_confusion_fails() {
        let key = TestKey::generate();
        let payload = [0u8; 16];
        let mut rot = key.rot(1);

        for (offset, value, expected) in [
            (offsets::PK_LEN, 1311, VerifyError::InvalidKeyLength),
            (offsets::PK_LEN, 1313, VerifyError::InvalidKeyLength),
            (offsets::SIG_LEN, 2419, VerifyError::InvalidSignatureLength),
            (offsets::SIG_LEN, 2421, VerifyError::InvalidSignatureLength),
        ] {
            let mut hdr = key.sign(1, &payload);
            patch(&mut hdr, offset, value);
            let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
            assert_eq!(result, Err(expected), "offset {offset} value {value}");
        }
        assert_eq!(rot.write_count(), 0);
    }

    #[test]
    fn test_binding_enforced_for_valid_foreign_signature() {
        let trusted = TestKey::generate();
        let attacker = TestKey::generate();
        let payload = b"attacker firmware".to_vec();

        // Self-consistent image: the attacker's signature verifies under the
        // attacker's embedded key
        let hdr = attacker.sign(9, &payload);
        let mut rot = trusted.rot(1);
        let mut verifier = SlotVerifier::new(&mut rot);
        let result = verifier.verify(&mut slot(SlotId::A, &hdr, &payload));
        assert_eq!(result, Err(VerifyError::PublicKeyMismatch));
        assert_eq!(
            verifier.state(),
            VerifyState::Failed(VerifyError::PublicKeyMismatch)
        );
        assert_eq!(rot.min_version(), 1);
    }

    #[test]
    fn test_single_bit_flip_fails_signature() {
        let key = TestKey::generate();
        let payload: Vec<u8> = (0..1024u32).map(|i| (i * 7) as u8).collect();
        let hdr = key.sign(3, &payload);
        let mut rot = key.rot(1);

        for (pos, bit) in [(0usize, 0u8), (1, 7), (511, 3), (1023, 0)] {
            let mut tampered = payload.clone();
            tampered[pos] ^= 1 << bit;
            let result =
                SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &tampered));
            assert_eq!(result, Err(VerifyError::SignatureFailed), "pos {pos} bit {bit}");
        }
        assert_eq!(rot.write_count(), 0);
    }

    #[test]
    fn test_tampered_signature_fails() {
        let key = TestKey::generate();
        let payload = [3u8; 64];
        let mut hdr = key.sign(1, &payload);
        hdr[0x538 + 17] ^= 0x40;
        let mut rot = key.rot(1);
        let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::B, &hdr, &payload));
        assert_eq!(result, Err(VerifyError::SignatureFailed));
    }

    #[test]
    fn test_rollback_boundaries() {
        let key = TestKey::generate();
        let payload = [9u8; 32];
        let mut rot = key.rot(5);

        let hdr = key.sign(4, &payload);
        let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
        assert_eq!(result, Err(VerifyError::RollbackAttempt));

        let hdr = key.sign(5, &payload);
        let verdict = SlotVerifier::new(&mut rot)
            .verify(&mut slot(SlotId::A, &hdr, &payload))
            .unwrap();
        assert!(!verdict.counter_advanced);
        assert_eq!(rot.write_count(), 0);

        let hdr = key.sign(6, &payload);
        let verdict = SlotVerifier::new(&mut rot)
            .verify(&mut slot(SlotId::A, &hdr, &payload))
            .unwrap();
        assert!(verdict.counter_advanced);
        assert_eq!(rot.min_version(), 6);
        assert_eq!(rot.write_count(), 1);
    }

    #[test]
    fn test_uninitialized_floor_rejects_version_zero() {
        let key = TestKey::generate();
        let payload = [0u8; 8];
        let mut rot = key.rot(0);

        let hdr = key.sign(0, &payload);
        let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
        assert_eq!(result, Err(VerifyError::RollbackAttempt));

        let hdr = key.sign(1, &payload);
        let verdict = SlotVerifier::new(&mut rot)
            .verify(&mut slot(SlotId::A, &hdr, &payload))
            .unwrap();
        assert_eq!(verdict.previous_min_version, 1);
        assert!(!verdict.counter_advanced);
    }

    #[test]
    fn test_write_protected_store_fails_closed() {
        let key = TestKey::generate();
        let payload = [0u8; 8];
        let hdr = key.sign(2, &payload);
        let mut rot = key.rot(1);
        rot.set_write_protected(true);

        let result = SlotVerifier::new(&mut rot).verify(&mut slot(SlotId::A, &hdr, &payload));
        assert_eq!(result, Err(VerifyError::CounterUpdateFailed));

        // Equal version needs no write and still passes
        let hdr = key.sign(1, &payload);
        assert!(SlotVerifier::new(&mut rot)
            .verify(&mut slot(SlotId::A, &hdr, &payload))
            .is_ok());
    }
}

mod select_tests {
    use super::*;
    use pqb_boot::{BootDecision, BootLog, BootSelector, BootStage, ErrorCategory, VerifyError};

    #[test]
    fn test_fallback_to_b_counter_reflects_b_only() {
        let key = TestKey::generate();
        let payload_a = vec![0xA0u8; 128];
        let payload_b = vec![0xB0u8; 128];
        let hdr_a = key.sign(9, &payload_a);
        let hdr_b = key.sign(4, &payload_b);

        let mut tampered_a = payload_a.clone();
        tampered_a[64] ^= 0x01;

        let mut rot = key.rot(1);
        let mut log = BootLog::new();
        log.begin_boot();
        let mut slots = [
            slot(SlotId::A, &hdr_a, &tampered_a),
            slot(SlotId::B, &hdr_b, &payload_b),
        ];
        let decision = BootSelector::new(&mut rot)
            .with_boot_log(&mut log)
            .select(&mut slots);

        match &decision {
            BootDecision::Fallback {
                slot,
                version,
                rejected,
            } => {
                assert_eq!(*slot, SlotId::B);
                assert_eq!(*version, 4);
                assert_eq!(rejected.as_slice(), &[(SlotId::A, VerifyError::SignatureFailed)]);
            }
            other => panic!("unexpected decision {other:?}"),
        }
        assert_eq!(rot.min_version(), 4);
        assert_eq!(rot.write_count(), 1);

        let latest = log.get_latest().unwrap();
        assert_eq!(latest.stage, BootStage::SlotSelected);
        assert_eq!(latest.slot, Some(SlotId::B));
        assert_eq!(latest.version, 4);
        let first = log.get_entry(1).unwrap();
        assert_eq!(first.category, ErrorCategory::Crypto);
        assert_eq!(first.verify_error(), Some(VerifyError::SignatureFailed));
    }

    #[test]
    fn test_both_fail_halts_with_counter_unchanged() {
        let key = TestKey::generate();
        let other = TestKey::generate();
        let payload = vec![0x11u8; 64];

        // A is older than the floor, B is signed by an unprovisioned key
        let hdr_a = key.sign(2, &payload);
        let hdr_b = other.sign(8, &payload);

        let mut rot = key.rot(3);
        let mut slots = [
            slot(SlotId::A, &hdr_a, &payload),
            slot(SlotId::B, &hdr_b, &payload),
        ];
        let decision = BootSelector::new(&mut rot).select(&mut slots);

        assert_eq!(
            decision,
            BootDecision::Halt {
                rejected: [
                    (SlotId::A, VerifyError::RollbackAttempt),
                    (SlotId::B, VerifyError::PublicKeyMismatch),
                ]
                .into_iter()
                .collect(),
            }
        );
        assert_eq!(rot.min_version(), 3);
        assert_eq!(rot.write_count(), 0);
    }

    #[test]
    fn test_a_passes_b_never_evaluated() {
        let key = TestKey::generate();
        let payload = vec![0x22u8; 64];
        let hdr_a = key.sign(2, &payload);
        let hdr_b = key.sign(7, &payload);

        let mut rot = key.rot(1);
        let mut slots = [
            slot(SlotId::A, &hdr_a, &payload),
            slot(SlotId::B, &hdr_b, &payload),
        ];
        let decision = BootSelector::new(&mut rot).select(&mut slots);

        assert_eq!(
            decision,
            BootDecision::Boot {
                slot: SlotId::A,
                version: 2
            }
        );
        // B's newer version never touched the floor
        assert_eq!(rot.min_version(), 2);
    }

    #[test]
    fn test_four_candidates_first_success() {
        let key = TestKey::generate();
        let payload = vec![0x33u8; 32];
        let good = key.sign(3, &payload);
        let bad = [0u8; 16];

        let mut rot = key.rot(1);
        let mut slots = [
            slot(SlotId::A, &bad, &payload),
            slot(SlotId::B, &bad, &payload),
            slot(SlotId::C, &good, &payload),
            slot(SlotId::D, &good, &payload),
        ];
        let decision = BootSelector::new(&mut rot).select(&mut slots);
        assert_eq!(decision.selected(), Some(SlotId::C));
        assert_eq!(decision.rejected().len(), 2);
    }
}

mod store_tests {
    use super::*;
    use fs2::FileExt;
    use pqb_boot::rollback::read_floor;
    use pqb_boot::{
        FileRootOfTrust, FileSlot, FloorUpdate, RootOfTrust, SlotVerifier, StatePaths, StoreError,
        VerifyError,
    };
    use pqb_common::{Error, PkHash};
    use std::fs;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_unprovisioned_directory() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("out");
        assert!(matches!(
            FileRootOfTrust::open(&state),
            Err(StoreError::NotProvisioned { .. })
        ));
        assert!(!state.exists());

        fs::create_dir(&state).unwrap();
        assert!(matches!(
            FileRootOfTrust::open(&state),
            Err(StoreError::NotProvisioned { .. })
        ));
        assert_eq!(fs::read_dir(&state).unwrap().count(), 0);
    }

    #[test]
    fn test_state_path_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("out");
        fs::write(&state, b"file").unwrap();
        assert!(matches!(
            FileRootOfTrust::open(&state),
            Err(StoreError::StateDir { .. })
        ));
    }

    #[test]
    fn test_wrong_length_hash_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StatePaths::new(dir.path());
        fs::write(paths.pk_hash(), [0u8; 31]).unwrap();
        assert!(matches!(
            FileRootOfTrust::open(dir.path()),
            Err(StoreError::InvalidPkHash { len: 31 })
        ));
        fs::write(paths.pk_hash(), [0u8; 33]).unwrap();
        assert!(matches!(
            FileRootOfTrust::open(dir.path()),
            Err(StoreError::InvalidPkHash { len: 33 })
        ));
    }

    #[test]
    fn test_provision_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let hash = PkHash::new([0x5C; 32]);
        FileRootOfTrust::provision(dir.path(), hash).unwrap();

        let rot = FileRootOfTrust::open(dir.path()).unwrap();
        assert_eq!(rot.pk_hash(), hash);
        assert_eq!(fs::read(rot.paths().pk_hash()).unwrap(), vec![0x5C; 32]);
    }

    #[test]
    fn test_uninitialized_counter_defaults_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut rot = FileRootOfTrust::provision(dir.path(), PkHash::new([0; 32])).unwrap();
        let counter = rot.paths().counter();

        // Missing
        assert_eq!(read_floor(&mut rot), 1);
        // Short read
        fs::write(&counter, [9u8, 0]).unwrap();
        assert_eq!(read_floor(&mut rot), 1);
        // Stored zero
        fs::write(&counter, 0u32.to_le_bytes()).unwrap();
        assert_eq!(read_floor(&mut rot), 1);
        // Stored value
        fs::write(&counter, 42u32.to_le_bytes()).unwrap();
        assert_eq!(read_floor(&mut rot), 42);
    }

    #[test]
    fn test_counter_monotonic_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut rot = FileRootOfTrust::provision(dir.path(), PkHash::new([0; 32])).unwrap();
        let counter = rot.paths().counter();

        rot.write_min_version(7).unwrap();
        assert_eq!(fs::read(&counter).unwrap(), 7u32.to_le_bytes());

        rot.write_min_version(7).unwrap();
        assert!(rot.write_min_version(6).is_err());
        assert_eq!(fs::read(&counter).unwrap(), 7u32.to_le_bytes());
        assert!(matches!(
            rot.advance_min_version(3),
            Err(StoreError::CounterRegression {
                current: 7,
                requested: 3
            })
        ));

        rot.write_min_version(8).unwrap();
        assert_eq!(rot.read_min_version().unwrap(), 8);
        assert!(rot.paths().lock().exists());
    }

    #[test]
    fn test_counter_change_by_other_handle_respected() {
        let dir = tempfile::tempdir().unwrap();
        let hash = PkHash::new([0; 32]);
        let mut first = FileRootOfTrust::provision(dir.path(), hash).unwrap();
        let mut second = FileRootOfTrust::open(dir.path()).unwrap();

        second.write_min_version(10).unwrap();
        // Re-read under the lock sees the newer floor
        assert!(first.write_min_version(9).is_err());
        assert_eq!(first.read_min_version().unwrap(), 10);

        assert_eq!(first.check_and_advance(9), Err(Error::RollbackAttempted));
        assert_eq!(
            first.check_and_advance(10),
            Ok(FloorUpdate {
                previous: 10,
                advanced: false
            })
        );
        assert_eq!(
            second.check_and_advance(12),
            Ok(FloorUpdate {
                previous: 10,
                advanced: true
            })
        );
        assert_eq!(first.check_and_advance(11), Err(Error::RollbackAttempted));
    }

    #[test]
    fn test_rollback_check_waits_for_counter_lock() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        let mut booting = FileRootOfTrust::provision(dir.path(), bind_hash(&key.public)).unwrap();
        booting.write_min_version(3).unwrap();
        let paths = StatePaths::new(dir.path());

        let payload = vec![0x42u8; 512];
        let hdr = key.sign(3, &payload);

        // Another boot holds the counter lock while it raises the floor
        let lock = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(paths.lock())
            .unwrap();
        lock.lock_exclusive().unwrap();

        let verifier = thread::spawn(move || {
            SlotVerifier::new(&mut booting).verify(&mut slot(SlotId::A, &hdr, &payload))
        });
        thread::sleep(Duration::from_millis(200));
        fs::write(paths.counter(), 10u32.to_le_bytes()).unwrap();
        FileExt::unlock(&lock).unwrap();

        assert_eq!(verifier.join().unwrap(), Err(VerifyError::RollbackAttempt));
        assert_eq!(fs::read(paths.counter()).unwrap(), 10u32.to_le_bytes());
    }

    #[test]
    fn test_file_slots_end_to_end() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("out");
        let mut rot = FileRootOfTrust::provision(&state, bind_hash(&key.public)).unwrap();
        rot.write_min_version(3).unwrap();

        let payload = vec![0x77u8; 1024];
        let hdr_path = dir.path().join("hdr_a.bin");
        let fw_path = dir.path().join("fw_a.bin");
        fs::write(&hdr_path, key.sign(5, &payload)).unwrap();
        fs::write(&fw_path, &payload).unwrap();

        let mut file_slot = FileSlot::new(SlotId::A, &hdr_path, &fw_path, 1 << 20);
        let verdict = SlotVerifier::new(&mut rot).verify(&mut file_slot).unwrap();
        assert!(verdict.counter_advanced);
        assert_eq!(fs::read(rot.paths().counter()).unwrap(), 5u32.to_le_bytes());

        fs::write(&hdr_path, key.sign(4, &payload)).unwrap();
        let result = SlotVerifier::new(&mut rot).verify(&mut file_slot);
        assert_eq!(result, Err(VerifyError::RollbackAttempt));
    }

    #[test]
    fn test_missing_payload_is_io_failure() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        let mut rot = FileRootOfTrust::provision(dir.path(), bind_hash(&key.public)).unwrap();
        let hdr_path = dir.path().join("hdr.bin");
        fs::write(&hdr_path, key.sign(1, b"fw")).unwrap();

        let mut file_slot = FileSlot::new(SlotId::B, &hdr_path, dir.path().join("nope"), 1024);
        let result = SlotVerifier::new(&mut rot).verify(&mut file_slot);
        assert_eq!(result, Err(pqb_boot::VerifyError::ImageNotFound));
    }
}

mod boot_log_tests {
    use pqb_boot::boot_log::BOOT_LOG_SIZE;
    use pqb_boot::{BootLog, BootStage, ErrorCategory, StatePaths, VerifyError};
    use pqb_common::SlotId;
    use std::fs;

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = StatePaths::new(dir.path()).boot_log();

        let mut log = BootLog::load(&path);
        assert_eq!(log.entry_count(), 0);
        log.begin_boot();
        log.log_rejection(SlotId::A, VerifyError::InvalidMagic);
        log.log_selection(SlotId::B, 3, 2);
        log.save(&path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), BOOT_LOG_SIZE as u64);

        let mut reloaded = BootLog::load(&path);
        assert_eq!(reloaded.boot_count(), 1);
        assert_eq!(reloaded.entry_count(), 2);
        assert_eq!(reloaded.begin_boot(), 2);
        reloaded.log_failure(BootStage::RootOfTrust, ErrorCategory::Store, 0x0A06);
        reloaded.save(&path).unwrap();

        let again = BootLog::load(&path);
        let entries: Vec<_> = again.iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].boot_attempt, 2);
        assert_eq!(entries[0].stage, BootStage::RootOfTrust);
        assert_eq!(entries[2].slot, Some(SlotId::A));
        assert_eq!(entries[2].category, ErrorCategory::Structural);
    }

    #[test]
    fn test_garbage_file_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boot_log.bin");
        fs::write(&path, b"definitely not a boot log").unwrap();
        let log = BootLog::load(&path);
        assert_eq!(log.entry_count(), 0);
        assert_eq!(log.boot_count(), 0);
    }
}

mod binary_tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::process::Command;

    fn run(cwd: &Path, args: &[&Path]) -> i32 {
        Command::new(env!("CARGO_BIN_EXE_pqb-boot"))
            .current_dir(cwd)
            .args(args)
            .output()
            .unwrap()
            .status
            .code()
            .unwrap()
    }

    struct Images {
        hdr_a: std::path::PathBuf,
        fw_a: std::path::PathBuf,
        hdr_b: std::path::PathBuf,
        fw_b: std::path::PathBuf,
    }

    impl Images {
        fn write(dir: &Path, key: &TestKey, version_a: u32, version_b: u32) -> Self {
            let fw = vec![0xC3u8; 1024];
            let images = Self {
                hdr_a: dir.join("hdr_a.bin"),
                fw_a: dir.join("fw_a.bin"),
                hdr_b: dir.join("hdr_b.bin"),
                fw_b: dir.join("fw_b.bin"),
            };
            fs::write(&images.hdr_a, key.sign(version_a, &fw)).unwrap();
            fs::write(&images.fw_a, &fw).unwrap();
            fs::write(&images.hdr_b, key.sign(version_b, &fw)).unwrap();
            fs::write(&images.fw_b, &fw).unwrap();
            images
        }

        fn args(&self) -> [&Path; 4] {
            [&self.hdr_a, &self.fw_a, &self.hdr_b, &self.fw_b]
        }
    }

    fn provision(dir: &Path, key: &TestKey) {
        let out = dir.join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("otp_pk_hash.bin"), bind_hash(&key.public).as_bytes()).unwrap();
    }

    #[test]
    fn test_wrong_argument_count_exits_1() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run(dir.path(), &[]), 1);
        assert_eq!(run(dir.path(), &[Path::new("a"), Path::new("b")]), 1);
    }

    #[test]
    fn test_unprovisioned_exits_2() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        let images = Images::write(dir.path(), &key, 2, 2);
        assert_eq!(run(dir.path(), &images.args()), 2);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_selects_a_and_advances_counter() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        provision(dir.path(), &key);
        let images = Images::write(dir.path(), &key, 5, 6);

        assert_eq!(run(dir.path(), &images.args()), 0);
        assert_eq!(
            fs::read(dir.path().join("out/otp_counter.bin")).unwrap(),
            5u32.to_le_bytes()
        );
        assert!(dir.path().join("out/boot_log.bin").exists());
    }

    #[test]
    fn test_falls_back_to_b() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        provision(dir.path(), &key);
        let images = Images::write(dir.path(), &key, 5, 6);
        fs::write(&images.fw_a, vec![0u8; 1024]).unwrap();

        assert_eq!(run(dir.path(), &images.args()), 0);
        assert_eq!(
            fs::read(dir.path().join("out/otp_counter.bin")).unwrap(),
            6u32.to_le_bytes()
        );
    }

    #[test]
    fn test_both_rejected_exits_1() {
        let key = TestKey::generate();
        let dir = tempfile::tempdir().unwrap();
        provision(dir.path(), &key);
        let images = Images::write(dir.path(), &key, 2, 2);
        fs::write(
            dir.path().join("out/otp_counter.bin"),
            3u32.to_le_bytes(),
        )
        .unwrap();

        assert_eq!(run(dir.path(), &images.args()), 1);
        assert_eq!(
            fs::read(dir.path().join("out/otp_counter.bin")).unwrap(),
            3u32.to_le_bytes()
        );
    }
}
