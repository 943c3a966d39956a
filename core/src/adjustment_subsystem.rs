//! Adjustment calculator — performance-based withholding rates per track.
//!
//! Computed once per run from the configuration; independent of the month
//! loop. Two penalties compete and the larger one applies:
//!   - COA (clinical outcomes): attrition-adjusted OAR against a threshold,
//!     fixed for months 1–18 and configurable for months 19–36;
//!   - SSA (substitute spend): SSR against a fixed threshold.
//!
//! The driver label is taken from the early period and reported for both.

use crate::{
    config::ProgramConfig,
    types::{Period, Track, TrackSet},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDriver {
    Coa,
    Ssa,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdjustmentState {
    pub effective_oar: f64,
    pub coa_early:     f64,
    pub coa_late:      f64,
    pub ssa:           f64,
    pub applied_early: f64,
    pub applied_late:  f64,
    pub driver:        AdjustmentDriver,
}

impl AdjustmentState {
    pub fn applied(&self, period: Period) -> f64 {
        match period {
            Period::Early => self.applied_early,
            Period::Late  => self.applied_late,
        }
    }
}

/// Applied adjustment per active track.
pub type AdjustmentTable = BTreeMap<Track, AdjustmentState>;

pub const COA_CAP: f64 = 0.5;
pub const SSA_CAP: f64 = 0.25;
/// Outcome-attainment threshold for months 1–18.
pub const EARLY_OUTCOME_THRESHOLD: f64 = 0.5;
pub const SUBSTITUTE_SPEND_THRESHOLD: f64 = 0.9;

/// COA against `threshold`, capped at `COA_CAP`.
pub fn clinical_outcomes_adjustment(effective_oar: f64, threshold: f64) -> f64 {
    if effective_oar >= threshold {
        0.0
    } else {
        (1.0 - effective_oar / threshold).min(COA_CAP)
    }
}

/// SSA against `SUBSTITUTE_SPEND_THRESHOLD`, capped at `SSA_CAP`.
pub fn substitute_spend_adjustment(ssr: f64) -> f64 {
    if ssr >= SUBSTITUTE_SPEND_THRESHOLD {
        0.0
    } else {
        (1.0 - ssr / SUBSTITUTE_SPEND_THRESHOLD).min(SSA_CAP)
    }
}

pub struct AdjustmentSubsystem<'a> {
    config: &'a ProgramConfig,
}

impl<'a> AdjustmentSubsystem<'a> {
    pub fn new(config: &'a ProgramConfig) -> Self {
        Self { config }
    }

    pub fn state_for(&self, track: Track) -> AdjustmentState {
        let c = self.config;

        let completion_rate = 1.0 - c.annual_churn;
        let effective_oar = c.oar.get(track) * completion_rate;

        let coa_early = clinical_outcomes_adjustment(effective_oar, EARLY_OUTCOME_THRESHOLD);
        let coa_late = clinical_outcomes_adjustment(effective_oar, c.late_outcome_threshold);
        let ssa = substitute_spend_adjustment(c.ssr.get(track));

        // Ties go to COA.
        let driver = if coa_early >= ssa {
            AdjustmentDriver::Coa
        } else {
            AdjustmentDriver::Ssa
        };

        AdjustmentState {
            effective_oar,
            coa_early,
            coa_late,
            ssa,
            applied_early: coa_early.max(ssa),
            applied_late: coa_late.max(ssa),
            driver,
        }
    }

    pub fn compute(&self, tracks: &TrackSet) -> AdjustmentTable {
        tracks
            .iter()
            .map(|track| {
                let state = self.state_for(track);
                log::debug!(
                    "adjustment: {track} early={:.4} late={:.4} driver={:?}",
                    state.applied_early,
                    state.applied_late,
                    state.driver
                );
                (track, state)
            })
            .collect()
    }
}
