// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Boot configuration
//!
//! Fixed at compile time. The binary takes no flags and reads no environment.

use pqb_common::constants::DEFAULT_MAX_PAYLOAD_SIZE;

/// Boot configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Directory holding the root-of-trust files and the boot log
    pub state_dir: &'static str,
    /// Payload files larger than this are rejected unread
    pub max_payload_size: usize,
    /// Persist the boot log after every boot
    pub persist_boot_log: bool,
}

impl BootConfig {
    /// Default boot configuration
    pub const DEFAULT: Self = Self {
        state_dir: "out",
        max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        persist_boot_log: true,
    };

    /// Configuration rooted at another state directory
    #[must_use]
    pub const fn with_state_dir(self, state_dir: &'static str) -> Self {
        Self { state_dir, ..self }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
