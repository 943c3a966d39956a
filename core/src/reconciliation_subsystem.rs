//! Reconciliation — sequential release of withheld revenue.
//!
//! Design:
//!   - Explicit fold over months 1..=36. `ReconciliationState` is threaded
//!     from month i to month i+1; nothing else carries across months.
//!   - Every month, each track's withheld revenue is added to its balance.
//!   - At checkpoints (6, 12, 18, 24, 30, 36) each balance is released net of
//!     the track's applied adjustment for the current period, then reset to 0.
//!   - Paid revenue is netted of the adjustment in the month it is billed.
//!
//! This stage cannot be parallelized across months.

use crate::{
    adjustment_subsystem::AdjustmentTable,
    calendar,
    cohort_subsystem::CohortPlan,
    enrollment_subsystem::MonthlyRow,
    event::LedgerEvent,
    types::{Headcount, Month, Track},
};
use serde::Serialize;
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

/// A ledger month after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullRow {
    #[serde(flatten)]
    pub monthly: MonthlyRow,
    pub reconciliation_month:      bool,
    pub net_paid:                  f64,
    pub released:                  f64,
    /// Per-track release; empty outside checkpoints.
    pub released_by_track:         BTreeMap<Track, f64>,
    pub net_revenue:               f64,
    pub vendor_revenue:            f64,
    pub blended_adjustment:        f64,
    pub cumulative_vendor_revenue: f64,
    pub newly_enrolled:            Headcount,
    pub newly_enrolled_by_vintage: [Headcount; 3],
    pub churned:                   Headcount,
    pub net_change:                Headcount,
    pub initial_total:             Headcount,
    pub follow_on_total:           Headcount,
}

impl FullRow {
    pub fn month(&self) -> Month {
        self.monthly.month
    }
}

/// Running unreleased withheld revenue per track since the last checkpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithheldAccumulator {
    balances: BTreeMap<Track, f64>,
}

impl WithheldAccumulator {
    pub fn balance(&self, track: Track) -> f64 {
        self.balances.get(&track).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.balances.values().sum()
    }

    fn add(&mut self, track: Track, amount: f64) {
        *self.balances.entry(track).or_insert(0.0) += amount;
    }

    fn reset(&mut self) {
        for balance in self.balances.values_mut() {
            *balance = 0.0;
        }
    }
}

/// The record threaded through the fold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationState {
    pub withheld:                  WithheldAccumulator,
    pub cumulative_vendor_revenue: f64,
    pub prev_total_enrolled:       Headcount,
}

// ── Subsystem ────────────────────────────────────────────────────────────────

pub struct ReconciliationSubsystem<'a> {
    adjustments:  &'a AdjustmentTable,
    plan:         &'a CohortPlan,
    vendor_share: f64,
}

impl<'a> ReconciliationSubsystem<'a> {
    pub fn new(adjustments: &'a AdjustmentTable, plan: &'a CohortPlan, vendor_share: f64) -> Self {
        Self {
            adjustments,
            plan,
            vendor_share,
        }
    }

    fn applied(&self, track: Track, month: Month) -> f64 {
        self.adjustments
            .get(&track)
            .map(|a| a.applied(calendar::period_for(month)))
            .unwrap_or(0.0)
    }

    /// Reconcile one month. Consumes the carried state and returns the next one.
    pub fn fold_month(
        &self,
        mut state: ReconciliationState,
        row: &MonthlyRow,
    ) -> (ReconciliationState, FullRow, Option<LedgerEvent>) {
        let month = row.month;

        let adjusted_paid: f64 = row
            .tracks
            .iter()
            .map(|(track, t)| t.paid * (1.0 - self.applied(*track, month)))
            .sum();
        let net_paid = (adjusted_paid + row.rural_revenue - row.overlap_discount).max(0.0);

        for (track, t) in &row.tracks {
            state.withheld.add(*track, t.withheld);
        }

        let reconciliation_month = calendar::is_reconciliation_month(month);
        let mut released_by_track = BTreeMap::new();
        let mut withheld_total = 0.0;
        if reconciliation_month {
            withheld_total = state.withheld.total();
            for track in row.tracks.keys() {
                let balance = state.withheld.balance(*track);
                released_by_track.insert(*track, balance * (1.0 - self.applied(*track, month)));
            }
            state.withheld.reset();
        }
        let released: f64 = released_by_track.values().sum();

        let event = reconciliation_month.then(|| {
            log::info!(
                "month={month} reconciliation: released {released:.2} of {withheld_total:.2} withheld"
            );
            LedgerEvent::WithholdingReleased {
                month,
                withheld: withheld_total,
                released,
                forfeited: withheld_total - released,
            }
        });

        let net_revenue = net_paid + released;
        let vendor_revenue = net_revenue * self.vendor_share;
        state.cumulative_vendor_revenue += vendor_revenue;

        let billed = row.billed();
        let blended_adjustment = if billed > 0.0 {
            row.tracks
                .iter()
                .map(|(track, t)| self.applied(*track, month) * t.billed())
                .sum::<f64>()
                / billed
        } else {
            0.0
        };

        let newly = self.plan.newly_enrolled(month);
        let net_change = row.total_enrolled - state.prev_total_enrolled;
        let churned = state.prev_total_enrolled + newly.total - row.total_enrolled;
        state.prev_total_enrolled = row.total_enrolled;

        let full = FullRow {
            monthly: row.clone(),
            reconciliation_month,
            net_paid,
            released,
            released_by_track,
            net_revenue,
            vendor_revenue,
            blended_adjustment,
            cumulative_vendor_revenue: state.cumulative_vendor_revenue,
            newly_enrolled: newly.total,
            newly_enrolled_by_vintage: newly.by_vintage,
            churned,
            net_change,
            initial_total: row.initial_total(),
            follow_on_total: row.follow_on_total(),
        };

        (state, full, event)
    }

    /// Fold the whole horizon in month order.
    pub fn reconcile(&self, rows: &[MonthlyRow]) -> (Vec<FullRow>, Vec<LedgerEvent>) {
        let mut events = Vec::new();
        let (_, ledger) = rows.iter().fold(
            (ReconciliationState::default(), Vec::with_capacity(rows.len())),
            |(state, mut ledger), row| {
                let (next, full, event) = self.fold_month(state, row);
                ledger.push(full);
                events.extend(event);
                (next, ledger)
            },
        );
        (ledger, events)
    }
}
