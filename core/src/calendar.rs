//! Program calendar — the fixed 36-month horizon and its checkpoints.

use crate::types::{Month, Period};

/// Last simulated month. Ramp windows are truncated here.
pub const HORIZON_MONTHS: Month = 36;

pub const MONTHS_PER_YEAR: Month = 12;

/// Withheld revenue is released every 6 months.
pub const RECONCILIATION_INTERVAL: Month = 6;

/// Months 1..=18 are the early adjustment period.
pub const EARLY_PERIOD_END: Month = 18;

/// Iterate the full horizon in order.
pub fn months() -> impl Iterator<Item = Month> {
    1..=HORIZON_MONTHS
}

/// True for months 6, 12, 18, 24, 30 and 36.
pub fn is_reconciliation_month(month: Month) -> bool {
    month > 0 && month <= HORIZON_MONTHS && month % RECONCILIATION_INTERVAL == 0
}

/// Program year (1-based) a month falls in: ceil(month / 12).
pub fn program_year(month: Month) -> u32 {
    month.div_ceil(MONTHS_PER_YEAR)
}

pub fn period_for(month: Month) -> Period {
    if month <= EARLY_PERIOD_END {
        Period::Early
    } else {
        Period::Late
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoints_are_every_six_months() {
        let checkpoints: Vec<Month> = months().filter(|m| is_reconciliation_month(*m)).collect();
        assert_eq!(checkpoints, vec![6, 12, 18, 24, 30, 36]);
    }

    #[test]
    fn years_bucket_by_ceiling_division() {
        assert_eq!(program_year(1), 1);
        assert_eq!(program_year(12), 1);
        assert_eq!(program_year(13), 2);
        assert_eq!(program_year(24), 2);
        assert_eq!(program_year(25), 3);
        assert_eq!(program_year(36), 3);
    }

    #[test]
    fn period_switches_after_month_18() {
        assert_eq!(period_for(18), Period::Early);
        assert_eq!(period_for(19), Period::Late);
    }
}
