//! Configuration edits issued by a front end.
//!
//! An edit never mutates the config it is applied to: `apply` clones,
//! changes one field, validates, and returns the new value.

use crate::{
    config::{CostSharing, Penetration, ProgramConfig},
    error::{ModelError, ModelResult},
    types::Track,
};
use serde::{Deserialize, Serialize};

/// All supported edits.
/// Variants are only ever appended — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum ConfigEdit {
    // ── Population ────────────────────────────────
    SetTotalPanel { total_panel: f64 },
    SetEligible { track: Track, eligible: f64 },
    SetGrowth { growth_y2: f64, growth_y3: f64 },

    // ── Enrollment ────────────────────────────────
    SetPenetration { penetration: Penetration },
    SetRampMonths { ramp_months: u32 },
    SetControlGroup { year: u32, enabled: bool },
    SetAnnualChurn { annual_churn: f64 },
    SetOverlapRate { overlap_rate: f64 },

    // ── Payment ───────────────────────────────────
    SetCostSharing { cost_sharing: CostSharing },
    SetRuralPct { rural_pct: f64 },
    SetVendorShare { vendor_share: f64 },

    // ── Performance ───────────────────────────────
    SetOar { track: Track, oar: f64 },
    SetSsr { track: Track, ssr: f64 },
    SetLateOutcomeThreshold { threshold: f64 },
}

impl ProgramConfig {
    /// Return a validated copy of this config with `edit` applied.
    pub fn apply(&self, edit: &ConfigEdit) -> ModelResult<ProgramConfig> {
        let mut next = self.clone();
        match edit {
            ConfigEdit::SetTotalPanel { total_panel }   => next.total_panel = *total_panel,
            ConfigEdit::SetEligible { track, eligible } => next.eligible.set(*track, *eligible),
            ConfigEdit::SetGrowth { growth_y2, growth_y3 } => {
                next.growth_y2 = *growth_y2;
                next.growth_y3 = *growth_y3;
            }
            ConfigEdit::SetPenetration { penetration } => next.penetration = *penetration,
            ConfigEdit::SetRampMonths { ramp_months }  => next.ramp_months = *ramp_months,
            ConfigEdit::SetControlGroup { year, enabled } => {
                let slot = match year {
                    1..=3 => (*year - 1) as usize,
                    _ => {
                        return Err(ModelError::invalid(
                            "control_group",
                            format!("program year must be 1..=3, got {year}"),
                        ))
                    }
                };
                next.control_group[slot] = *enabled;
            }
            ConfigEdit::SetAnnualChurn { annual_churn } => next.annual_churn = *annual_churn,
            ConfigEdit::SetOverlapRate { overlap_rate } => next.overlap_rate = *overlap_rate,
            ConfigEdit::SetCostSharing { cost_sharing } => next.cost_sharing = *cost_sharing,
            ConfigEdit::SetRuralPct { rural_pct }       => next.rural_pct = *rural_pct,
            ConfigEdit::SetVendorShare { vendor_share } => next.vendor_share = *vendor_share,
            ConfigEdit::SetOar { track, oar }           => next.oar.set(*track, *oar),
            ConfigEdit::SetSsr { track, ssr }           => next.ssr.set(*track, *ssr),
            ConfigEdit::SetLateOutcomeThreshold { threshold } => {
                next.late_outcome_threshold = *threshold
            }
        }
        next.validate()?;
        log::debug!("Applied config edit {edit:?}");
        Ok(next)
    }
}
