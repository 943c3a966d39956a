use crate::{
    error::{ModelError, ModelResult},
    types::Track,
};
use serde::{Deserialize, Serialize};

// ── Per-track values ───────────────────────────────────────────────

/// One value per clinical track. Serialized with explicit field names
/// so config files never depend on track ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerTrack<T> {
    pub e_ckm: T,
    pub ckm:   T,
    pub msk:   T,
    pub bh:    T,
}

impl<T: Copy> PerTrack<T> {
    pub fn splat(value: T) -> Self {
        Self { e_ckm: value, ckm: value, msk: value, bh: value }
    }

    pub fn get(&self, track: Track) -> T {
        match track {
            Track::ECkm => self.e_ckm,
            Track::Ckm  => self.ckm,
            Track::Msk  => self.msk,
            Track::Bh   => self.bh,
        }
    }

    pub fn set(&mut self, track: Track, value: T) {
        match track {
            Track::ECkm => self.e_ckm = value,
            Track::Ckm  => self.ckm = value,
            Track::Msk  => self.msk = value,
            Track::Bh   => self.bh = value,
        }
    }
}

// ── Payment rates ──────────────────────────────────────────────────

/// Which payment tier a patient-month bills at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    Initial,
    FollowOn,
}

/// Monthly payment schedule for a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSchedule {
    /// Initial rate for the first 12 months of tenure, follow-on afterwards.
    Tiered { initial: f64, follow_on: f64 },
    /// No follow-on tier: the initial rate applies for the whole enrollment life.
    InitialOnly { initial: f64 },
}

impl RateSchedule {
    pub fn initial(&self) -> f64 {
        match *self {
            RateSchedule::Tiered { initial, .. } | RateSchedule::InitialOnly { initial } => initial,
        }
    }

    pub fn has_follow_on(&self) -> bool {
        matches!(self, RateSchedule::Tiered { .. })
    }

    pub fn rate(&self, tier: RateTier) -> f64 {
        match (*self, tier) {
            (RateSchedule::Tiered { follow_on, .. }, RateTier::FollowOn) => follow_on,
            _ => self.initial(),
        }
    }
}

impl Default for PerTrack<RateSchedule> {
    fn default() -> Self {
        Self {
            e_ckm: RateSchedule::Tiered { initial: 30.0, follow_on: 15.0 },
            ckm:   RateSchedule::Tiered { initial: 35.0, follow_on: 20.0 },
            msk:   RateSchedule::InitialOnly { initial: 15.0 },
            bh:    RateSchedule::Tiered { initial: 25.0, follow_on: 15.0 },
        }
    }
}

// ── Enrollment policy ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Penetration {
    Uniform { rate: f64 },
    PerTrack { rates: PerTrack<f64> },
}

impl Penetration {
    pub fn rate_for(&self, track: Track) -> f64 {
        match self {
            Penetration::Uniform { rate }   => *rate,
            Penetration::PerTrack { rates } => rates.get(track),
        }
    }
}

/// Patient cost-sharing policy. Selects the billed-rate basis for all tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSharing {
    Waived,
    Collected,
}

// ── Provisional coefficients ───────────────────────────────────────

/// Coefficients that are placeholders pending program data.
/// Kept together so a scenario can swap them without touching the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Share of overlapping patient-rate applied as the cross-track discount.
    pub overlap_discount_factor: f64,
    /// Track whose blended rate prices an overlapping patient.
    pub overlap_reference_track: Track,
    /// One-time rural add-on per rural patient at enrollment.
    pub rural_add_on_rate: f64,
    pub rural_tracks: Vec<Track>,
    /// Billed-rate multiplier when cost sharing is collected.
    pub cost_sharing_multiplier: f64,
    /// Share of eligible population kept when a year runs a control group.
    pub control_group_retention: f64,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            overlap_discount_factor:    0.05,
            overlap_reference_track:    Track::Ckm,
            rural_add_on_rate:          12.0,
            rural_tracks:               vec![Track::ECkm, Track::Ckm],
            cost_sharing_multiplier:    1.25,
            control_group_retention:    0.9,
        }
    }
}

// ── Program configuration ──────────────────────────────────────────

/// Immutable input to one engine run.
/// Edits produce a new value (see `ProgramConfig::apply`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub total_panel: f64,
    /// Year-1 eligible population per track.
    pub eligible: PerTrack<f64>,
    pub growth_y2: f64,
    pub growth_y3: f64,
    pub penetration: Penetration,
    pub ramp_months: u32,
    /// Control-group flag per program year (index 0 = year 1).
    pub control_group: [bool; 3],
    pub annual_churn: f64,
    pub overlap_rate: f64,
    pub cost_sharing: CostSharing,
    pub rural_pct: f64,
    pub vendor_share: f64,
    /// Outcome attainment rate per track.
    pub oar: PerTrack<f64>,
    /// Substitute spend rate per track.
    pub ssr: PerTrack<f64>,
    /// Outcome attainment threshold for months 19–36.
    pub late_outcome_threshold: f64,
    #[serde(default)]
    pub rates: PerTrack<RateSchedule>,
    #[serde(default)]
    pub heuristics: Heuristics,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            total_panel: 100_000.0,
            eligible: PerTrack {
                e_ckm: 12_000.0,
                ckm:   8_000.0,
                msk:   15_000.0,
                bh:    10_000.0,
            },
            growth_y2:              0.05,
            growth_y3:              0.05,
            penetration:            Penetration::Uniform { rate: 0.25 },
            ramp_months:            12,
            control_group:          [false; 3],
            annual_churn:           0.20,
            overlap_rate:           0.10,
            cost_sharing:           CostSharing::Waived,
            rural_pct:              0.15,
            vendor_share:           0.30,
            oar:                    PerTrack::splat(0.60),
            ssr:                    PerTrack::splat(0.85),
            late_outcome_threshold: 0.60,
            rates:                  PerTrack::default(),
            heuristics:             Heuristics::default(),
        }
    }
}

impl ProgramConfig {
    /// Load a single JSON config document.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ProgramConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        log::debug!("Loaded program config from {path}");
        Ok(config)
    }

    /// Load `program.json` from a data directory.
    pub fn load_dir(data_dir: &str) -> anyhow::Result<Self> {
        Self::load(&format!("{data_dir}/program.json"))
    }

    /// Compact fixture for tests: round numbers, no rural add-on.
    pub fn default_test() -> Self {
        Self {
            total_panel: 10_000.0,
            eligible: PerTrack {
                e_ckm: 1_200.0,
                ckm:   1_200.0,
                msk:   1_200.0,
                bh:    1_200.0,
            },
            growth_y2:   0.10,
            growth_y3:   0.10,
            penetration: Penetration::Uniform { rate: 0.50 },
            rural_pct:   0.0,
            ..Self::default()
        }
    }

    pub fn rate_multiplier(&self) -> f64 {
        match self.cost_sharing {
            CostSharing::Waived    => 1.0,
            CostSharing::Collected => self.heuristics.cost_sharing_multiplier,
        }
    }

    pub fn monthly_churn(&self) -> f64 {
        self.annual_churn / 12.0
    }

    /// Reject degenerate inputs before any stage divides by them.
    pub fn validate(&self) -> ModelResult<()> {
        if !(self.total_panel > 0.0) {
            return Err(ModelError::invalid("total_panel", "must be > 0"));
        }
        if !(6..=18).contains(&self.ramp_months) {
            return Err(ModelError::invalid(
                "ramp_months",
                format!("must be within 6..=18, got {}", self.ramp_months),
            ));
        }
        for track in Track::ALL {
            check_non_negative(&format!("eligible.{track}"), self.eligible.get(track))?;
            check_unit(&format!("oar.{track}"), self.oar.get(track))?;
            check_unit(&format!("ssr.{track}"), self.ssr.get(track))?;
            check_unit(&format!("penetration.{track}"), self.penetration.rate_for(track))?;
            let schedule = self.rates.get(track);
            check_non_negative(&format!("rates.{track}.initial"), schedule.initial())?;
            if let RateSchedule::Tiered { follow_on, .. } = schedule {
                check_non_negative(&format!("rates.{track}.follow_on"), follow_on)?;
            }
        }
        check_non_negative("growth_y2", self.growth_y2)?;
        check_non_negative("growth_y3", self.growth_y3)?;
        check_unit("annual_churn", self.annual_churn)?;
        check_unit("overlap_rate", self.overlap_rate)?;
        check_unit("rural_pct", self.rural_pct)?;
        check_unit("vendor_share", self.vendor_share)?;
        check_unit("late_outcome_threshold", self.late_outcome_threshold)?;
        if !(self.late_outcome_threshold > 0.0) {
            return Err(ModelError::invalid("late_outcome_threshold", "must be > 0"));
        }

        let h = &self.heuristics;
        check_non_negative("heuristics.overlap_discount_factor", h.overlap_discount_factor)?;
        check_non_negative("heuristics.rural_add_on_rate", h.rural_add_on_rate)?;
        check_non_negative("heuristics.cost_sharing_multiplier", h.cost_sharing_multiplier)?;
        check_unit("heuristics.control_group_retention", h.control_group_retention)?;
        Ok(())
    }
}

fn check_non_negative(field: &str, value: f64) -> ModelResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::invalid(field, format!("must be a finite value >= 0, got {value}")))
    }
}

fn check_unit(field: &str, value: f64) -> ModelResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::invalid(field, format!("must be within [0, 1], got {value}")))
    }
}
