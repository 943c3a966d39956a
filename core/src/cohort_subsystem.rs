//! Cohort builder — turns eligible population into dated enrollment increments.
//!
//! Each vintage ramps its enrollment target in linearly over `ramp_months`
//! starting at the vintage's first month. The ramp window is cut at the
//! horizon: a late vintage with a long ramp enrolls only the increments
//! that fit before month 36. That shortfall is reported, not corrected.

use crate::{
    calendar::HORIZON_MONTHS,
    config::ProgramConfig,
    panel_growth_subsystem::PanelProjection,
    types::{Headcount, Month, Track, TrackSet, Vintage},
};
use serde::Serialize;

// ── Public types ─────────────────────────────────────────────────────────────

/// One month's enrollment increment for a (track, vintage). Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubCohort {
    pub track:            Track,
    pub vintage:          Vintage,
    pub enrollment_month: Month,
    pub increment:        Headcount,
}

impl SubCohort {
    /// Months of tenure at `month`, counting the enrollment month as 1.
    /// None before enrollment.
    pub fn age_at(&self, month: Month) -> Option<u32> {
        (month >= self.enrollment_month).then(|| month - self.enrollment_month + 1)
    }
}

/// A (track, vintage) whose ramp window was cut at the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RampTruncation {
    pub track:           Track,
    pub vintage:         Vintage,
    pub nominal_target:  f64,
    pub enrolled_target: f64,
    pub lost_months:     u32,
}

/// Headcount first enrolled in a month, across active tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NewEnrollment {
    pub total:      Headcount,
    pub by_vintage: [Headcount; 3],
}

#[derive(Debug, Clone)]
pub struct CohortPlan {
    pub sub_cohorts: Vec<SubCohort>,
    pub truncations: Vec<RampTruncation>,
    /// Indexed by month − 1.
    newly_enrolled: Vec<NewEnrollment>,
}

impl CohortPlan {
    pub fn newly_enrolled(&self, month: Month) -> NewEnrollment {
        month
            .checked_sub(1)
            .and_then(|i| self.newly_enrolled.get(i as usize))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of increments actually emitted for a (track, vintage).
    pub fn enrolled_target(&self, track: Track, vintage: Vintage) -> Headcount {
        self.sub_cohorts
            .iter()
            .filter(|sc| sc.track == track && sc.vintage == vintage)
            .map(|sc| sc.increment)
            .sum()
    }

    /// Last month any increment of `vintage` enrolls, if it enrolls at all.
    pub fn ramp_end(&self, vintage: Vintage) -> Option<Month> {
        self.sub_cohorts
            .iter()
            .filter(|sc| sc.vintage == vintage)
            .map(|sc| sc.enrollment_month)
            .max()
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

pub struct CohortSubsystem<'a> {
    config:     &'a ProgramConfig,
    projection: &'a PanelProjection,
}

impl<'a> CohortSubsystem<'a> {
    pub fn new(config: &'a ProgramConfig, projection: &'a PanelProjection) -> Self {
        Self { config, projection }
    }

    fn control_group_multiplier(&self, vintage: Vintage) -> f64 {
        if self.config.control_group[vintage.index()] {
            self.config.heuristics.control_group_retention
        } else {
            1.0
        }
    }

    pub fn build(&self, tracks: &TrackSet) -> CohortPlan {
        let ramp = self.config.ramp_months;
        let mut sub_cohorts = Vec::new();
        let mut truncations = Vec::new();
        let mut newly_enrolled = vec![NewEnrollment::default(); HORIZON_MONTHS as usize];

        for vintage in Vintage::ALL {
            let start = vintage.start_month();
            let nominal_end = start + ramp - 1;
            let ramp_end = nominal_end.min(HORIZON_MONTHS);
            let multiplier = self.control_group_multiplier(vintage);

            for track in tracks.iter() {
                let base = self.projection.new_eligible(vintage.index(), track);
                let target = base * self.config.penetration.rate_for(track) * multiplier;
                let increment = target / ramp as f64;
                if !(increment > 0.0) {
                    continue;
                }

                for month in start..=ramp_end {
                    sub_cohorts.push(SubCohort {
                        track,
                        vintage,
                        enrollment_month: month,
                        increment,
                    });
                    let slot = &mut newly_enrolled[(month - 1) as usize];
                    slot.total += increment;
                    slot.by_vintage[vintage.index()] += increment;
                }

                if nominal_end > ramp_end {
                    let lost_months = nominal_end - ramp_end;
                    truncations.push(RampTruncation {
                        track,
                        vintage,
                        nominal_target: target,
                        enrolled_target: increment * (ramp_end - start + 1) as f64,
                        lost_months,
                    });
                }
            }
        }

        log::debug!(
            "cohort: {} sub-cohorts across {} tracks, {} truncated ramps",
            sub_cohorts.len(),
            tracks.len(),
            truncations.len()
        );

        CohortPlan {
            sub_cohorts,
            truncations,
            newly_enrolled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel_growth_subsystem::PanelGrowthSubsystem;

    fn plan_for(config: &ProgramConfig, tracks: &[Track]) -> CohortPlan {
        let projection = PanelGrowthSubsystem::new(config).project().unwrap();
        CohortSubsystem::new(config, &projection).build(&TrackSet::from_slice(tracks))
    }

    #[test]
    fn full_ramp_enrolls_whole_target() {
        let config = ProgramConfig::default_test();
        let plan = plan_for(&config, &[Track::Msk]);

        // 1200 eligible × 50% penetration
        let enrolled = plan.enrolled_target(Track::Msk, Vintage::Y1);
        assert!((enrolled - 600.0).abs() < 1e-9, "enrolled={enrolled}");
        assert!(plan.truncations.is_empty());
    }

    #[test]
    fn long_ramp_is_cut_at_horizon() {
        let config = ProgramConfig { ramp_months: 18, ..ProgramConfig::default_test() };
        let plan = plan_for(&config, &[Track::Msk]);

        // Vintage 3 starts at 25: only months 25..=36 (12 of 18) fit.
        let projection = PanelGrowthSubsystem::new(&config).project().unwrap();
        let target = projection.new_eligible(2, Track::Msk) * 0.5;
        let enrolled = plan.enrolled_target(Track::Msk, Vintage::Y3);
        assert!((enrolled - target * 12.0 / 18.0).abs() < 1e-9);

        let cut = plan
            .truncations
            .iter()
            .find(|t| t.vintage == Vintage::Y3)
            .expect("vintage 3 should be truncated");
        assert_eq!(cut.lost_months, 6);
        // Vintage 2 (13..=30) fits.
        assert!(plan.truncations.iter().all(|t| t.vintage != Vintage::Y2));
    }

    #[test]
    fn control_group_removes_ten_percent() {
        let mut config = ProgramConfig::default_test();
        config.control_group = [true, false, false];
        let plan = plan_for(&config, &[Track::Bh]);
        let enrolled = plan.enrolled_target(Track::Bh, Vintage::Y1);
        assert!((enrolled - 540.0).abs() < 1e-9, "enrolled={enrolled}");
    }

    #[test]
    fn control_group_flags_map_to_their_own_vintage() {
        let mut config = ProgramConfig::default_test();
        config.control_group = [false, true, true];
        let plan = plan_for(&config, &[Track::Bh]);
        let projection = PanelGrowthSubsystem::new(&config).project().unwrap();

        assert!((plan.enrolled_target(Track::Bh, Vintage::Y1) - 600.0).abs() < 1e-9);
        for (year_index, vintage) in [(1, Vintage::Y2), (2, Vintage::Y3)] {
            let expected = projection.new_eligible(year_index, Track::Bh) * 0.5 * 0.9;
            let enrolled = plan.enrolled_target(Track::Bh, vintage);
            assert!(expected > 0.0);
            assert!((enrolled - expected).abs() < 1e-9, "{vintage:?}: {enrolled} vs {expected}");
        }
    }

    #[test]
    fn zero_penetration_emits_nothing() {
        let mut config = ProgramConfig::default_test();
        config.penetration = crate::config::Penetration::Uniform { rate: 0.0 };
        let plan = plan_for(&config, &[]);
        assert!(plan.sub_cohorts.is_empty());
        assert_eq!(plan.newly_enrolled(1).total, 0.0);
    }

    #[test]
    fn newly_enrolled_lookup_matches_increments() {
        let config = ProgramConfig::default_test();
        let plan = plan_for(&config, &[Track::Ckm, Track::Bh]);
        // 2 tracks × 600 / 12 ramp months
        assert!((plan.newly_enrolled(1).total - 100.0).abs() < 1e-9);
        assert!((plan.newly_enrolled(1).by_vintage[0] - 100.0).abs() < 1e-9);
        assert_eq!(plan.newly_enrolled(0).total, 0.0);
        assert_eq!(plan.newly_enrolled(37).total, 0.0);
    }
}
