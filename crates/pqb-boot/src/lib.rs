// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! pqboot Secure Boot Verifier Library
//!
//! This crate decides which firmware slot to hand control to:
//!
//! - **Header**: strict decoding of the fixed 4096-byte image header
//! - **Rollback**: root-of-trust store with the monotonic version floor
//! - **Slot**: sources of header and payload bytes
//! - **Verify**: the per-slot verification gates
//! - **Select**: ordered slot selection with fallback
//! - **Boot Log**: persistent record of rejections and selections
//!
//! # Features
//!
//! - `std` (default): file-backed root of trust, file slots, boot log
//!   persistence and the `pqb-boot` binary

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod boot_log;
pub mod config;
pub mod header;
pub mod rollback;
pub mod select;
pub mod slot;
pub mod verify;

#[cfg(feature = "std")]
pub mod store;

pub use boot_log::{BootLog, BootLogEntry, BootStage, ErrorCategory};
pub use config::BootConfig;
pub use header::{encode_header, parse_header, FirmwareHeader};
pub use rollback::{FloorUpdate, MemoryRootOfTrust, RootOfTrust};
pub use select::{BootDecision, BootSelector};
pub use slot::{MemorySlot, SlotSource};
pub use verify::{SlotVerdict, SlotVerifier, VerifyError, VerifyState};

#[cfg(feature = "std")]
pub use slot::FileSlot;
#[cfg(feature = "std")]
pub use store::{FileRootOfTrust, StatePaths, StoreError};
