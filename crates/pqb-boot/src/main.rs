// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! pqboot Secure Boot Verifier Entry Point
//!
//! ```text
//! pqb-boot <hdr_a> <fw_a> <hdr_b> <fw_b>
//! ```
//!
//! # Boot Flow
//!
//! 1. Load the boot log from the state directory
//! 2. Self-test the signature primitive
//! 3. Open the provisioned root of trust
//! 4. Verify slot A, fall back to slot B
//! 5. Persist the boot log and report the decision
//!
//! # Exit Status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | a verified slot was selected |
//! | 1 | both slots rejected, or wrong argument count |
//! | 2 | root of trust not provisioned or state directory unusable |
//! | 3 | signature primitive self-test failed |

use std::process::ExitCode;

use log::LevelFilter;
use pqb_boot::{
    BootConfig, BootDecision, BootLog, BootSelector, BootStage, ErrorCategory, FileRootOfTrust,
    FileSlot, StatePaths,
};
use pqb_common::{Error, SlotId};
use simple_logger::SimpleLogger;

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum BootExit {
    /// A slot was selected
    Selected = 0,
    /// No slot passed, or usage error
    Rejected = 1,
    /// No usable root of trust
    NotProvisioned = 2,
    /// Signature primitive unavailable
    SelfTestFailed = 3,
}

impl From<BootExit> for ExitCode {
    fn from(exit: BootExit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let _ = SimpleLogger::new().with_level(LevelFilter::Info).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 5 {
        let prog = args.first().map_or("pqb-boot", String::as_str);
        log::error!("usage: {prog} <hdr_a> <fw_a> <hdr_b> <fw_b>");
        return BootExit::Rejected.into();
    }

    boot(&BootConfig::DEFAULT, &args[1..]).into()
}

fn boot(config: &BootConfig, args: &[String]) -> BootExit {
    let paths = StatePaths::new(config.state_dir);
    let mut boot_log = if config.persist_boot_log {
        BootLog::load(&paths.boot_log())
    } else {
        BootLog::new()
    };
    let attempt = boot_log.begin_boot();
    log::info!("[pqb-boot] boot attempt {attempt}");

    let exit = run(config, args, &mut boot_log);

    if config.persist_boot_log {
        if let Err(e) = boot_log.save(&paths.boot_log()) {
            log::warn!("[pqb-boot] boot log not saved: {e}");
        }
    }
    exit
}

fn run(config: &BootConfig, args: &[String], boot_log: &mut BootLog) -> BootExit {
    if let Err(e) = pqb_crypto::self_test() {
        log::error!("[pqb-boot] signature primitive unavailable: {e}");
        boot_log.log_failure(
            BootStage::SelfTest,
            ErrorCategory::Crypto,
            Error::SelfTestFailed.code(),
        );
        return BootExit::SelfTestFailed;
    }

    let mut rot = match FileRootOfTrust::open(config.state_dir) {
        Ok(rot) => rot,
        Err(e) => {
            log::error!("[pqb-boot] {e}");
            boot_log.log_failure(
                BootStage::RootOfTrust,
                ErrorCategory::Store,
                Error::from(e).code(),
            );
            return BootExit::NotProvisioned;
        }
    };

    let mut slots = [
        FileSlot::new(SlotId::A, &args[0], &args[1], config.max_payload_size),
        FileSlot::new(SlotId::B, &args[2], &args[3], config.max_payload_size),
    ];

    let decision = BootSelector::new(&mut rot)
        .with_boot_log(boot_log)
        .select(&mut slots);

    match decision {
        BootDecision::Boot { slot, version } => {
            log::info!("[pqb-boot] VERIFY PASS: booting slot {slot} (version {version})");
            BootExit::Selected
        }
        BootDecision::Fallback {
            slot,
            version,
            rejected,
        } => {
            for (id, e) in &rejected {
                log::warn!("[pqb-boot] slot {id} rejected: {e}");
            }
            log::info!("[pqb-boot] VERIFY PASS: falling back to slot {slot} (version {version})");
            BootExit::Selected
        }
        BootDecision::Halt { rejected } => {
            for (id, e) in &rejected {
                log::error!("[pqb-boot] slot {id} rejected: {e}");
            }
            log::error!("[pqb-boot] all slots failed verification, system halt");
            BootExit::Rejected
        }
    }
}
