//! Summary aggregation — year and three-year KPIs plus track/year attribution.
//!
//! Vendor revenue is only computed at the ledger level, so per-track vendor
//! revenue is an approximation: each month's vendor revenue is split across
//! tracks by their share of that month's billed (paid + withheld) revenue.

use crate::{
    calendar,
    reconciliation_subsystem::FullRow,
    types::{Headcount, Track},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub gross_revenue:      f64,
    pub net_revenue:        f64,
    pub vendor_revenue:     f64,
    pub paid_revenue:       f64,
    pub withheld_revenue:   f64,
    pub released:           f64,
    pub rural_revenue:      f64,
    pub overlap_discount:   f64,
    pub peak_enrolled:      Headcount,
    /// Revenue-weighted average applied adjustment.
    pub blended_adjustment: f64,
    #[serde(skip)]
    weighted_adjustment:    f64,
    #[serde(skip)]
    billed:                 f64,
}

impl KpiSummary {
    fn add_month(&mut self, row: &FullRow) {
        let billed = row.monthly.billed();
        self.gross_revenue += row.monthly.gross_revenue;
        self.net_revenue += row.net_revenue;
        self.vendor_revenue += row.vendor_revenue;
        self.paid_revenue += row.monthly.paid_revenue;
        self.withheld_revenue += row.monthly.withheld_revenue;
        self.released += row.released;
        self.rural_revenue += row.monthly.rural_revenue;
        self.overlap_discount += row.monthly.overlap_discount;
        self.peak_enrolled = self.peak_enrolled.max(row.monthly.total_enrolled);
        self.weighted_adjustment += row.blended_adjustment * billed;
        self.billed += billed;
    }

    fn combine(&mut self, other: &KpiSummary) {
        self.gross_revenue += other.gross_revenue;
        self.net_revenue += other.net_revenue;
        self.vendor_revenue += other.vendor_revenue;
        self.paid_revenue += other.paid_revenue;
        self.withheld_revenue += other.withheld_revenue;
        self.released += other.released;
        self.rural_revenue += other.rural_revenue;
        self.overlap_discount += other.overlap_discount;
        self.peak_enrolled = self.peak_enrolled.max(other.peak_enrolled);
        self.weighted_adjustment += other.weighted_adjustment;
        self.billed += other.billed;
    }

    fn finish(&mut self) {
        self.blended_adjustment = if self.billed > 0.0 {
            self.weighted_adjustment / self.billed
        } else {
            0.0
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// Program years 1..=3.
    pub years:      [KpiSummary; 3],
    /// Sums of the three year buckets.
    pub three_year: KpiSummary,
}

impl LedgerSummary {
    pub fn year(&self, year: u32) -> Option<&KpiSummary> {
        year.checked_sub(1).and_then(|i| self.years.get(i as usize))
    }
}

/// Per-track, per-year KPIs.
///
/// `billed_revenue` is the track's own gross (paid + withheld, before the
/// overlap discount and rural add-on). Net and vendor revenue exist only at
/// program level, so they are apportioned by each month's billed share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackYearAttribution {
    pub track:          Track,
    pub year:           u32,
    pub billed_revenue: f64,
    pub net_revenue:    f64,
    pub vendor_revenue: f64,
    pub peak_enrolled:  Headcount,
}

pub struct SummarySubsystem<'a> {
    ledger: &'a [FullRow],
}

impl<'a> SummarySubsystem<'a> {
    pub fn new(ledger: &'a [FullRow]) -> Self {
        Self { ledger }
    }

    pub fn summarize(&self) -> LedgerSummary {
        let mut years = [KpiSummary::default(); 3];
        for row in self.ledger {
            let year = calendar::program_year(row.month());
            if let Some(bucket) = year.checked_sub(1).and_then(|i| years.get_mut(i as usize)) {
                bucket.add_month(row);
            }
        }

        let mut three_year = KpiSummary::default();
        for bucket in years.iter_mut() {
            bucket.finish();
            three_year.combine(bucket);
        }
        three_year.finish();

        log::debug!(
            "summary: gross={:.2} net={:.2} vendor={:.2}",
            three_year.gross_revenue,
            three_year.net_revenue,
            three_year.vendor_revenue
        );

        LedgerSummary { years, three_year }
    }

    /// One row per (active track, year), in track then year order.
    pub fn attribute(&self) -> Vec<TrackYearAttribution> {
        let mut tracks: Vec<Track> = self
            .ledger
            .iter()
            .flat_map(|row| row.monthly.tracks.keys().copied())
            .collect();
        tracks.sort();
        tracks.dedup();

        let mut out: Vec<TrackYearAttribution> = tracks
            .iter()
            .flat_map(|track| {
                (1..=3).map(move |year| TrackYearAttribution {
                    track: *track,
                    year,
                    billed_revenue: 0.0,
                    net_revenue: 0.0,
                    vendor_revenue: 0.0,
                    peak_enrolled: 0.0,
                })
            })
            .collect();

        for row in self.ledger {
            let year = calendar::program_year(row.month());
            let billed = row.monthly.billed();
            for (track, t) in &row.monthly.tracks {
                let Some(cell) = out.iter_mut().find(|a| a.track == *track && a.year == year) else {
                    continue;
                };
                cell.billed_revenue += t.billed();
                cell.peak_enrolled = cell.peak_enrolled.max(t.enrolled());
                if billed > 0.0 {
                    let share = t.billed() / billed;
                    cell.net_revenue += row.net_revenue * share;
                    cell.vendor_revenue += row.vendor_revenue * share;
                }
            }
        }

        out
    }
}
