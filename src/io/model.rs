//! Read/write fitted-model JSON files.
//!
//! Model JSON is the portable representation of a forecast run:
//! - which series fed the model (source + history length)
//! - fitted trend, changepoint and seasonal parameters with fit diagnostics
//! - the forecast table itself
//!
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{ForecastSource, ModelFile};
use crate::error::AppError;
use crate::forecast::Forecast;

/// Write a model JSON file.
pub fn write_model_json(path: &Path, forecast: &Forecast, source: ForecastSource) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;

    let horizon = forecast.result.future().count();
    let doc = ModelFile {
        tool: "sales".to_string(),
        source,
        history_len: forecast.result.len() - horizon,
        horizon,
        model: forecast.model.clone(),
        forecast: forecast.result.clone(),
    };

    serde_json::to_writer_pretty(file, &doc).map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;

    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let doc: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(doc)
}
