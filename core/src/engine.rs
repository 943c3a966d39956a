//! The ledger engine — turns one configuration into a 36-month ledger.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Panel growth       — eligible population by year
//!   2. Cohort             — dated enrollment increments
//!   3. Enrollment         — churn-decayed headcount and raw revenue per month
//!   4. Adjustment         — withholding rates per track (independent of 1–3)
//!   5. Reconciliation     — sequential fold releasing withheld revenue
//!   6. Summary            — year / three-year KPIs and attribution
//!
//! RULES:
//!   - Every stage reads only the outputs of the stages before it.
//!   - The caller's config is never mutated; each run starts from scratch.
//!   - Nothing is cached between runs. Same inputs, bit-identical ledger.

use crate::{
    adjustment_subsystem::{AdjustmentSubsystem, AdjustmentTable},
    calendar::HORIZON_MONTHS,
    cohort_subsystem::CohortSubsystem,
    config::ProgramConfig,
    enrollment_subsystem::EnrollmentSubsystem,
    error::ModelResult,
    event::{event_type_name, LedgerEvent},
    panel_growth_subsystem::{PanelGrowthSubsystem, PanelProjection},
    reconciliation_subsystem::{FullRow, ReconciliationSubsystem},
    summary_subsystem::{LedgerSummary, SummarySubsystem, TrackYearAttribution},
    types::{Track, TrackSet},
};
use serde::Serialize;

/// Everything a front end needs to render one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerReport {
    pub tracks:      Vec<Track>,
    pub ledger:      Vec<FullRow>,
    pub summary:     LedgerSummary,
    pub adjustments: AdjustmentTable,
    pub attribution: Vec<TrackYearAttribution>,
    pub projection:  PanelProjection,
    pub events:      Vec<LedgerEvent>,
}

pub struct LedgerEngine {
    config: ProgramConfig,
}

impl LedgerEngine {
    pub fn new(config: ProgramConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Run the full horizon for `tracks`. An empty slice means all tracks.
    pub fn run(&self, tracks: &[Track]) -> ModelResult<LedgerReport> {
        self.config.validate()?;
        let config = &self.config;
        let tracks = TrackSet::from_slice(tracks);
        let mut events = vec![LedgerEvent::RunStarted {
            tracks: tracks.as_slice().to_vec(),
        }];
        log::info!("Ledger run started for {} track(s)", tracks.len());

        // 1. Panel growth
        let projection = PanelGrowthSubsystem::new(config).project()?;

        // 2. Cohort
        let plan = CohortSubsystem::new(config, &projection).build(&tracks);
        for cut in &plan.truncations {
            log::warn!(
                "{} vintage {:?}: ramp cut at month {HORIZON_MONTHS}, {} month(s) lost, enrolled {:.1} of {:.1}",
                cut.track,
                cut.vintage,
                cut.lost_months,
                cut.enrolled_target,
                cut.nominal_target
            );
            events.push(LedgerEvent::RampTruncated {
                track: cut.track,
                vintage: cut.vintage,
                nominal_target: cut.nominal_target,
                enrolled_target: cut.enrolled_target,
                lost_months: cut.lost_months,
            });
        }

        // 3. Enrollment
        let monthly = EnrollmentSubsystem::new(config).simulate(&plan, &tracks);

        // 4. Adjustment
        let adjustments = AdjustmentSubsystem::new(config).compute(&tracks);

        // 5. Reconciliation
        let (ledger, recon_events) =
            ReconciliationSubsystem::new(&adjustments, &plan, config.vendor_share).reconcile(&monthly);
        events.extend(recon_events);

        // 6. Summary
        let summarizer = SummarySubsystem::new(&ledger);
        let summary = summarizer.summarize();
        let attribution = summarizer.attribute();

        events.push(LedgerEvent::RunCompleted {
            months: HORIZON_MONTHS,
            vendor_revenue_3y: summary.three_year.vendor_revenue,
        });
        for event in &events {
            log::debug!("event: {}", event_type_name(event));
        }
        log::info!(
            "Ledger run complete: vendor revenue over 3 years {:.2}",
            summary.three_year.vendor_revenue
        );

        Ok(LedgerReport {
            tracks: tracks.as_slice().to_vec(),
            ledger,
            summary,
            adjustments,
            attribution,
            projection,
            events,
        })
    }
}

/// One-shot convenience: validate `config` and run it for `tracks`.
pub fn run_ledger(config: &ProgramConfig, tracks: &[Track]) -> ModelResult<LedgerReport> {
    LedgerEngine::new(config.clone()).run(tracks)
}
