//! Run trail — notable things the engine observed while building a ledger.
//!
//! Events are informational. They never feed back into the calculation;
//! the ledger is fully determined by the config and track selection.

use crate::types::{Month, Track, Vintage};
use serde::{Deserialize, Serialize};

/// Variants are added per feature — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    // ── Engine events ──────────────────────────────
    RunStarted {
        tracks: Vec<Track>,
    },
    RunCompleted {
        months: Month,
        vendor_revenue_3y: f64,
    },

    // ── Cohort events ──────────────────────────────
    /// A vintage's ramp window ran past the horizon and under-enrolled.
    RampTruncated {
        track: Track,
        vintage: Vintage,
        nominal_target: f64,
        enrolled_target: f64,
        lost_months: u32,
    },

    // ── Reconciliation events ──────────────────────
    WithholdingReleased {
        month: Month,
        withheld: f64,
        released: f64,
        forfeited: f64,
    },
}

/// Stable string name for a LedgerEvent variant, for logs and tooling.
pub fn event_type_name(event: &LedgerEvent) -> &'static str {
    match event {
        LedgerEvent::RunStarted { .. }          => "run_started",
        LedgerEvent::RunCompleted { .. }        => "run_completed",
        LedgerEvent::RampTruncated { .. }       => "ramp_truncated",
        LedgerEvent::WithholdingReleased { .. } => "withholding_released",
    }
}
