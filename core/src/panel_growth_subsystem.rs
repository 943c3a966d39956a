//! Panel growth projection — eligible population across program years.
//!
//! Each track keeps its year-1 share of the total panel. New eligible
//! population in years 2 and 3 comes from panel growth and is apportioned
//! by that share.

use crate::{
    config::{PerTrack, ProgramConfig},
    error::{ModelError, ModelResult},
    types::Track,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelProjection {
    /// eligible[track] / total_panel
    pub shares: PerTrack<f64>,
    /// Newly eligible population per year. Year 1 is the base eligible count.
    pub new_eligible_by_year: [PerTrack<f64>; 3],
    /// Running sum of new eligible population.
    pub eligible_by_year: [PerTrack<f64>; 3],
}

impl PanelProjection {
    /// Eligible base a vintage ramps against (year index 0..=2).
    pub fn new_eligible(&self, year_index: usize, track: Track) -> f64 {
        self.new_eligible_by_year[year_index].get(track)
    }
}

pub struct PanelGrowthSubsystem<'a> {
    config: &'a ProgramConfig,
}

impl<'a> PanelGrowthSubsystem<'a> {
    pub fn new(config: &'a ProgramConfig) -> Self {
        Self { config }
    }

    pub fn project(&self) -> ModelResult<PanelProjection> {
        let c = self.config;
        if !(c.total_panel > 0.0) {
            return Err(ModelError::invalid("total_panel", "must be > 0"));
        }

        let panel_y2 = c.total_panel * c.growth_y2;
        let panel_y3 = c.total_panel * (1.0 + c.growth_y2) * c.growth_y3;

        let mut shares = PerTrack::splat(0.0);
        let mut new_y1 = PerTrack::splat(0.0);
        let mut new_y2 = PerTrack::splat(0.0);
        let mut new_y3 = PerTrack::splat(0.0);

        for track in Track::ALL {
            let eligible = c.eligible.get(track);
            let share = eligible / c.total_panel;
            shares.set(track, share);
            new_y1.set(track, eligible);
            new_y2.set(track, panel_y2 * share);
            new_y3.set(track, panel_y3 * share);
        }

        let mut cum_y2 = PerTrack::splat(0.0);
        let mut cum_y3 = PerTrack::splat(0.0);
        for track in Track::ALL {
            cum_y2.set(track, new_y1.get(track) + new_y2.get(track));
            cum_y3.set(track, cum_y2.get(track) + new_y3.get(track));
        }

        log::debug!(
            "panel growth: +{panel_y2:.1} eligible in Y2, +{panel_y3:.1} in Y3"
        );

        Ok(PanelProjection {
            shares,
            new_eligible_by_year: [new_y1, new_y2, new_y3],
            eligible_by_year: [new_y1, cum_y2, cum_y3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_apportioned_by_year_one_share() {
        let config = ProgramConfig::default();
        let p = PanelGrowthSubsystem::new(&config).project().unwrap();

        // eCKM: 12k of 100k → 12% share
        assert!((p.shares.e_ckm - 0.12).abs() < 1e-12);
        // Y2: 100k × 5% × 12% = 600
        assert!((p.new_eligible_by_year[1].e_ckm - 600.0).abs() < 1e-9);
        // Y3: 100k × 1.05 × 5% × 12% = 630
        assert!((p.new_eligible_by_year[2].e_ckm - 630.0).abs() < 1e-9);
        assert!((p.eligible_by_year[2].e_ckm - (12_000.0 + 600.0 + 630.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_panel_is_rejected() {
        let config = ProgramConfig { total_panel: 0.0, ..ProgramConfig::default() };
        let err = PanelGrowthSubsystem::new(&config).project().unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput { .. }));
    }
}
