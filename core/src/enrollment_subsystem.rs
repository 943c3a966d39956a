//! Monthly simulator — churn-decayed enrollment and raw revenue per month.
//!
//! For every month on the horizon, every sub-cohort already enrolled
//! contributes its surviving headcount and the revenue it bills:
//!   - tenure months 1–6 of each 12-month payment cycle are paid,
//!     months 7–12 are withheld pending reconciliation;
//!   - the rate tier switches once, permanently, to follow-on at tenure 13
//!     (tracks without a follow-on tier stay on the initial rate);
//!   - the rural add-on is billed once, in the enrollment month only.
//!
//! No adjustment is applied here. This stage's output is raw revenue.

use crate::{
    calendar,
    cohort_subsystem::CohortPlan,
    config::{ProgramConfig, RateSchedule, RateTier},
    types::{Headcount, Month, Track, TrackSet},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Length of a patient's payment cycle in months.
pub const PAYMENT_CYCLE_MONTHS: u32 = 12;

/// Positions 1..=6 of the payment cycle are paid; the rest are withheld.
pub const PAID_POSITIONS: u32 = 6;

/// Tenure up to which the initial rate applies.
pub const INITIAL_PERIOD_MONTHS: u32 = 12;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrackMonth {
    pub initial_count:   Headcount,
    pub follow_on_count: Headcount,
    pub paid:            f64,
    pub withheld:        f64,
    pub rural:           f64,
}

impl TrackMonth {
    pub fn enrolled(&self) -> Headcount {
        self.initial_count + self.follow_on_count
    }

    /// Raw billed revenue before discount and adjustment.
    pub fn billed(&self) -> f64 {
        self.paid + self.withheld
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub month: Month,
    /// Active tracks only.
    pub tracks: BTreeMap<Track, TrackMonth>,
    pub enrolled_by_vintage: [Headcount; 3],
    pub total_enrolled: Headcount,
    pub gross_revenue: f64,
    pub paid_revenue: f64,
    pub withheld_revenue: f64,
    pub rural_revenue: f64,
    pub overlap_discount: f64,
}

impl MonthlyRow {
    /// Σ (paid + withheld) across tracks, before discount.
    pub fn billed(&self) -> f64 {
        self.tracks.values().map(TrackMonth::billed).sum()
    }

    pub fn initial_total(&self) -> Headcount {
        self.tracks.values().map(|t| t.initial_count).sum()
    }

    pub fn follow_on_total(&self) -> Headcount {
        self.tracks.values().map(|t| t.follow_on_count).sum()
    }
}

// ── Formulas ─────────────────────────────────────────────────────────────────

/// Surviving headcount of an increment `age` months into its tenure.
pub fn live_headcount(increment: Headcount, monthly_churn: f64, age: u32) -> Headcount {
    increment * (1.0 - monthly_churn).powi(age as i32 - 1)
}

/// Whether a patient-month at `age` is paid (true) or withheld (false).
pub fn is_paid(age: u32) -> bool {
    let position = (age - 1) % PAYMENT_CYCLE_MONTHS + 1;
    position <= PAID_POSITIONS
}

pub fn rate_tier(schedule: &RateSchedule, age: u32) -> RateTier {
    if !schedule.has_follow_on() || age <= INITIAL_PERIOD_MONTHS {
        RateTier::Initial
    } else {
        RateTier::FollowOn
    }
}

// ── Subsystem ────────────────────────────────────────────────────────────────

pub struct EnrollmentSubsystem<'a> {
    config: &'a ProgramConfig,
}

impl<'a> EnrollmentSubsystem<'a> {
    pub fn new(config: &'a ProgramConfig) -> Self {
        Self { config }
    }

    pub fn simulate(&self, plan: &CohortPlan, tracks: &TrackSet) -> Vec<MonthlyRow> {
        calendar::months()
            .map(|month| self.simulate_month(month, plan, tracks))
            .collect()
    }

    fn simulate_month(&self, month: Month, plan: &CohortPlan, tracks: &TrackSet) -> MonthlyRow {
        let c = self.config;
        let churn = c.monthly_churn();
        let multiplier = c.rate_multiplier();
        let rural_rate = c.heuristics.rural_add_on_rate;

        let mut by_track: BTreeMap<Track, TrackMonth> =
            tracks.iter().map(|t| (t, TrackMonth::default())).collect();
        let mut enrolled_by_vintage = [0.0; 3];

        for sc in &plan.sub_cohorts {
            let Some(age) = sc.age_at(month) else { continue };
            let Some(slot) = by_track.get_mut(&sc.track) else { continue };

            let schedule = c.rates.get(sc.track);
            let tier = rate_tier(&schedule, age);
            let live = live_headcount(sc.increment, churn, age);
            let revenue = live * schedule.rate(tier) * multiplier;

            match tier {
                RateTier::Initial  => slot.initial_count += live,
                RateTier::FollowOn => slot.follow_on_count += live,
            }
            if is_paid(age) {
                slot.paid += revenue;
            } else {
                slot.withheld += revenue;
            }

            if age == 1 && c.heuristics.rural_tracks.contains(&sc.track) {
                slot.rural += sc.increment * c.rural_pct * rural_rate;
            }

            enrolled_by_vintage[sc.vintage.index()] += live;
        }

        let total_enrolled: Headcount = by_track.values().map(TrackMonth::enrolled).sum();
        let overlap_discount = if tracks.len() > 1 {
            total_enrolled * c.overlap_rate * self.reference_rate(&by_track) * c.heuristics.overlap_discount_factor
        } else {
            0.0
        };

        let paid: f64 = by_track.values().map(|t| t.paid).sum();
        let withheld: f64 = by_track.values().map(|t| t.withheld).sum();
        let rural: f64 = by_track.values().map(|t| t.rural).sum();

        let gross_revenue = (paid + withheld - overlap_discount + rural).max(0.0);
        let paid_revenue = (paid - overlap_discount).max(0.0);

        log::debug!(
            "month={month} enrollment: enrolled={total_enrolled:.1} gross={gross_revenue:.2} discount={overlap_discount:.2}"
        );

        MonthlyRow {
            month,
            tracks: by_track,
            enrolled_by_vintage,
            total_enrolled,
            gross_revenue,
            paid_revenue,
            withheld_revenue: withheld,
            rural_revenue: rural,
            overlap_discount,
        }
    }

    /// Billed rate of one overlapping patient: the reference track's
    /// initial/follow-on blend, or its initial rate when it has no enrollment.
    fn reference_rate(&self, by_track: &BTreeMap<Track, TrackMonth>) -> f64 {
        let c = self.config;
        let reference = c.heuristics.overlap_reference_track;
        let schedule = c.rates.get(reference);
        let counts = by_track.get(&reference).copied().unwrap_or_default();

        let blended = if counts.enrolled() > 0.0 {
            (counts.initial_count * schedule.rate(RateTier::Initial)
                + counts.follow_on_count * schedule.rate(RateTier::FollowOn))
                / counts.enrolled()
        } else {
            schedule.initial()
        };
        blended * c.rate_multiplier()
    }
}
