//! Shared primitive types used across the entire ledger model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A program month. Month 1 is the first month of program year 1.
pub type Month = u32;

/// Enrollment headcounts are fractional: churn decays them continuously.
pub type Headcount = f64;

/// The four clinical case-management programs.
/// Variants are listed in reporting order — never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Early cardio-kidney-metabolic.
    ECkm,
    /// Cardio-kidney-metabolic.
    Ckm,
    /// Musculoskeletal.
    Msk,
    /// Behavioral health.
    Bh,
}

impl Track {
    pub const ALL: [Track; 4] = [Track::ECkm, Track::Ckm, Track::Msk, Track::Bh];

    pub fn label(self) -> &'static str {
        match self {
            Track::ECkm => "eCKM",
            Track::Ckm  => "CKM",
            Track::Msk  => "MSK",
            Track::Bh   => "BH",
        }
    }

    /// Parse a case-insensitive track code, e.g. from a CLI flag.
    pub fn parse(code: &str) -> Option<Track> {
        match code.trim().to_ascii_lowercase().as_str() {
            "eckm" | "e_ckm" => Some(Track::ECkm),
            "ckm"            => Some(Track::Ckm),
            "msk"            => Some(Track::Msk),
            "bh"             => Some(Track::Bh),
            _ => None,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Program year in which a population segment first becomes eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vintage {
    Y1,
    Y2,
    Y3,
}

impl Vintage {
    pub const ALL: [Vintage; 3] = [Vintage::Y1, Vintage::Y2, Vintage::Y3];

    /// First month of the vintage's ramp window.
    pub fn start_month(self) -> Month {
        match self {
            Vintage::Y1 => 1,
            Vintage::Y2 => 13,
            Vintage::Y3 => 25,
        }
    }

    /// Zero-based position, used to index per-vintage arrays.
    pub fn index(self) -> usize {
        match self {
            Vintage::Y1 => 0,
            Vintage::Y2 => 1,
            Vintage::Y3 => 2,
        }
    }
}

/// Adjustment period: months 1–18 use the fixed outcome threshold,
/// months 19–36 the configurable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Early,
    Late,
}

/// The set of tracks a run is restricted to.
///
/// Always non-empty and sorted in reporting order. An empty selection
/// means "all tracks".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackSet(Vec<Track>);

impl TrackSet {
    pub fn all() -> Self {
        Self(Track::ALL.to_vec())
    }

    pub fn from_slice(tracks: &[Track]) -> Self {
        if tracks.is_empty() {
            return Self::all();
        }
        let mut v = tracks.to_vec();
        v.sort();
        v.dedup();
        Self(v)
    }

    pub fn contains(&self, track: Track) -> bool {
        self.0.contains(&track)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Track> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Track] {
        &self.0
    }
}
