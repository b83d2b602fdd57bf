//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - policy/config enums (`ZeroSalesPolicy`, `SeasonalityMode`, `ForecastSource`)
//! - raw and cleaned order rows (`OrderRecord`, `CleanedRecord`)
//! - output tables (`MonthlySummary`, `ForecastResult`) and the fitted `ForecastModel`

pub mod types;

pub use types::*;
