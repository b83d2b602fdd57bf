//! Error types.
//!
//! - `AppError`: application-level failure carrying a process exit code.
//! - `ForecastError`: fatal failures of a single forecast call.
//! - `RowIssue`: row-local problems absorbed by the cleaner (never returned as `Err`).

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors that abort a forecast call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// The training series has no observations.
    #[error("Insufficient data: the training series is empty")]
    InsufficientData,

    /// A training date is unparseable or breaks strict ordering.
    #[error("Invalid date at index {index}: {reason}")]
    InvalidDate { index: usize, reason: String },

    /// A training value is NaN or infinite.
    #[error("Non-finite value at {date}")]
    NonFiniteValue { date: NaiveDate },

    /// A forecast setting is out of range.
    #[error("Invalid forecast setting: {0}")]
    InvalidConfig(String),

    /// The solver could not produce a finite fit.
    #[error("Forecast model error: {0}")]
    Model(String),
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        let exit_code = match err {
            ForecastError::InsufficientData => 3,
            ForecastError::InvalidDate { .. }
            | ForecastError::NonFiniteValue { .. }
            | ForecastError::InvalidConfig(_) => 2,
            ForecastError::Model(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

/// Why a raw order row was excluded during cleaning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid order date '{0}' (expected YYYY-MM-DD)")]
    DateParse(String),

    #[error("sales is zero; profit margin undefined")]
    ZeroSales,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_errors_map_to_exit_codes() {
        let app: AppError = ForecastError::InsufficientData.into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = ForecastError::InvalidDate {
            index: 2,
            reason: "not after previous date".to_string(),
        }
        .into();
        assert_eq!(app.exit_code(), 2);
        assert!(app.to_string().contains("index 2"));

        let app: AppError = ForecastError::Model("singular".to_string()).into();
        assert_eq!(app.exit_code(), 4);
    }

    #[test]
    fn row_issue_messages() {
        assert_eq!(
            RowIssue::MissingField("sales").to_string(),
            "missing required field `sales`"
        );
        assert!(RowIssue::DateParse("2020/01/01".to_string()).to_string().contains("2020/01/01"));
    }
}
