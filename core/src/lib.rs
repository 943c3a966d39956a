//! Value-based payment ledger: a three-year, four-track program model.

pub mod adjustment_subsystem;
pub mod calendar;
pub mod cohort_subsystem;
pub mod command;
pub mod config;
pub mod engine;
pub mod enrollment_subsystem;
pub mod error;
pub mod event;
pub mod panel_growth_subsystem;
pub mod reconciliation_subsystem;
pub mod summary_subsystem;
pub mod types;

pub use engine::{run_ledger, LedgerEngine, LedgerReport};
pub use error::{ModelError, ModelResult};
