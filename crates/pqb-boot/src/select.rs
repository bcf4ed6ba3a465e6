// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Boot Slot Selection
//!
//! Candidates are verified in order and the first one that passes is
//! selected. With the usual two slots this is "try A, fall back to B, halt
//! if both fail". Every slot that is evaluated may advance the rollback
//! floor, so evaluation stops at the first pass.

use heapless::Vec;
use pqb_common::constants::MAX_SLOTS;
use pqb_common::SlotId;

use crate::boot_log::BootLog;
use crate::rollback::RootOfTrust;
use crate::slot::SlotSource;
use crate::verify::{SlotVerifier, VerifyError};

/// Rejected candidates in evaluation order
pub type Rejections = Vec<(SlotId, VerifyError), MAX_SLOTS>;

/// Boot decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootDecision {
    /// The first candidate passed
    Boot {
        /// Selected slot
        slot: SlotId,
        /// Verified firmware version
        version: u32,
    },
    /// An earlier candidate failed and a later one passed
    Fallback {
        /// Selected slot
        slot: SlotId,
        /// Verified firmware version
        version: u32,
        /// Candidates rejected before the selected one
        rejected: Rejections,
    },
    /// Every candidate was rejected
    Halt {
        /// All candidates with their rejection reasons
        rejected: Rejections,
    },
}

impl BootDecision {
    /// Selected slot, if any
    #[must_use]
    pub fn selected(&self) -> Option<SlotId> {
        match self {
            Self::Boot { slot, .. } | Self::Fallback { slot, .. } => Some(*slot),
            Self::Halt { .. } => None,
        }
    }

    /// Selected firmware version, if any
    #[must_use]
    pub fn version(&self) -> Option<u32> {
        match self {
            Self::Boot { version, .. } | Self::Fallback { version, .. } => Some(*version),
            Self::Halt { .. } => None,
        }
    }

    /// Rejected candidates
    #[must_use]
    pub fn rejected(&self) -> &[(SlotId, VerifyError)] {
        match self {
            Self::Boot { .. } => &[],
            Self::Fallback { rejected, .. } | Self::Halt { rejected } => rejected.as_slice(),
        }
    }

    /// Whether a slot was selected
    #[must_use]
    pub fn is_boot(&self) -> bool {
        self.selected().is_some()
    }
}

/// Ordered slot selector
pub struct BootSelector<'a, R: RootOfTrust> {
    rot: &'a mut R,
    log: Option<&'a mut BootLog>,
}

impl<'a, R: RootOfTrust> BootSelector<'a, R> {
    /// Create a selector over a root of trust
    pub fn new(rot: &'a mut R) -> Self {
        Self { rot, log: None }
    }

    /// Record rejections and the selection in `log`
    #[must_use]
    pub fn with_boot_log(mut self, log: &'a mut BootLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Verify candidates in order until one passes
    ///
    /// Candidates past [`MAX_SLOTS`] are ignored.
    pub fn select<S: SlotSource>(&mut self, slots: &mut [S]) -> BootDecision {
        if slots.len() > MAX_SLOTS {
            log::warn!(
                "[pqb-boot] {} candidates given, only the first {MAX_SLOTS} are considered",
                slots.len()
            );
        }

        let mut rejected = Rejections::new();
        for slot in slots.iter_mut().take(MAX_SLOTS) {
            let id = slot.id();
            let result = SlotVerifier::new(&mut *self.rot).verify(slot);
            match result {
                Ok(verdict) => {
                    if let Some(log) = self.log.as_deref_mut() {
                        log.log_selection(id, verdict.version, verdict.previous_min_version);
                    }
                    log::info!("[pqb-boot] selected slot {id}, version {}", verdict.version);
                    return if rejected.is_empty() {
                        BootDecision::Boot {
                            slot: id,
                            version: verdict.version,
                        }
                    } else {
                        BootDecision::Fallback {
                            slot: id,
                            version: verdict.version,
                            rejected,
                        }
                    };
                }
                Err(e) => {
                    if let Some(log) = self.log.as_deref_mut() {
                        log.log_rejection(id, e);
                    }
                    // Capacity equals the number of candidates considered
                    let _ = rejected.push((id, e));
                }
            }
        }

        if let Some(log) = self.log.as_deref_mut() {
            log.log_halt();
        }
        log::error!("[pqb-boot] no bootable slot, halting");
        BootDecision::Halt { rejected }
    }
}
