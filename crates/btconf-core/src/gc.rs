//! Garbage collection of scan-discovered device sections.
//!
//! Every inquiry scan leaves a section behind for each device it saw, so the
//! config grows without bound on a phone that scans often.  At flush time the
//! cache runs [`GcPolicy::collect`] to drop some of those sections.
//!
//! # Two thresholds
//!
//! ```text
//!   candidates seen:  0 ........ record_cap ........ record_cap * multiplier ....
//!   recorded:         └── first record_cap candidates ──┘
//!   action:           nothing removed ───────────────────┤ recorded subset removed
//! ```
//!
//! Only the first `record_cap` candidates (in storage order) are remembered,
//! and they are only removed once the total count passes
//! `record_cap * trigger_multiplier`.  Sections holding any credential
//! property are never candidates.

use tracing::{debug, info};

use crate::address::is_device_address;
use crate::store::ConfigStore;

/// Properties whose presence marks a device section as bonded.
pub const CREDENTIAL_PROPERTIES: [&str; 6] = [
    "LinkKey",
    "LE_KEY_PENC",
    "LE_KEY_PID",
    "LE_KEY_PCSRK",
    "LE_KEY_LENC",
    "LE_KEY_LCSRK",
];

/// Default number of candidates recorded per pass.
pub const DEFAULT_RECORD_CAP: usize = 256;

/// Default multiplier applied to the record cap to get the trigger threshold.
pub const DEFAULT_TRIGGER_MULTIPLIER: usize = 2;

/// Outcome of one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Total prunable candidates seen, including those beyond the record cap.
    pub candidates: usize,
    /// Sections actually removed.
    pub removed: usize,
}

/// Limits controlling when and how much the collector prunes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcPolicy {
    /// Maximum number of candidates recorded (and so removed) per pass.
    pub record_cap: usize,
    /// Pruning happens only when candidates exceed `record_cap * trigger_multiplier`.
    pub trigger_multiplier: usize,
}

impl Default for GcPolicy {
    fn default() -> Self {
        Self {
            record_cap: DEFAULT_RECORD_CAP,
            trigger_multiplier: DEFAULT_TRIGGER_MULTIPLIER,
        }
    }
}

impl GcPolicy {
    /// Candidate count that must be exceeded before anything is removed.
    pub fn trigger_threshold(&self) -> usize {
        self.record_cap.saturating_mul(self.trigger_multiplier)
    }

    /// Returns `true` if `section` holds at least one credential property.
    pub fn is_protected(store: &dyn ConfigStore, section: &str) -> bool {
        CREDENTIAL_PROPERTIES
            .iter()
            .any(|key| store.has_key(section, key))
    }

    /// Runs one collection pass over `store`.
    pub fn collect(&self, store: &mut dyn ConfigStore) -> GcReport {
        let mut recorded: Vec<String> = Vec::with_capacity(self.record_cap.min(1024));
        let mut candidates = 0usize;

        for section in store.sections() {
            if !is_device_address(section) || Self::is_protected(&*store, section) {
                continue;
            }
            if recorded.len() < self.record_cap {
                recorded.push(section.to_string());
            }
            candidates += 1;
        }

        let mut report = GcReport {
            candidates,
            removed: 0,
        };

        if candidates <= self.trigger_threshold() {
            debug!(
                "gc: {candidates} prunable sections, threshold {} not exceeded",
                self.trigger_threshold()
            );
            return report;
        }

        for section in &recorded {
            if store.remove_section(section) {
                report.removed += 1;
            }
        }
        info!(
            "gc: removed {} of {candidates} unbonded device sections",
            report.removed
        );
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
