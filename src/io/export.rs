//! CSV exports: monthly summary, forecast table, cleaned records.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{CleanedRecord, DATE_FORMAT, ForecastResult, MonthlySummary};
use crate::error::AppError;

/// Forecast CSV columns; the history/forecast flag stays out of the table.
pub const FORECAST_COLUMNS: [&str; 4] = ["date", "predicted_sales", "lower_bound", "upper_bound"];

/// Write the monthly summary (`Year,Month,Sales,Profit,Quantity`).
pub fn write_summary_csv(path: &Path, summary: &[MonthlySummary]) -> Result<(), AppError> {
    write_summary(create(path, "summary")?, summary)
}

pub fn write_summary<W: Write>(sink: W, summary: &[MonthlySummary]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in summary {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write summary row: {e}")))?;
    }
    flush(writer)
}

/// Write the forecast table (`date,predicted_sales,lower_bound,upper_bound`).
pub fn write_forecast_csv(path: &Path, result: &ForecastResult) -> Result<(), AppError> {
    write_forecast(create(path, "forecast")?, result)
}

pub fn write_forecast<W: Write>(sink: W, result: &ForecastResult) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(FORECAST_COLUMNS)
        .map_err(|e| AppError::new(2, format!("Failed to write forecast CSV header: {e}")))?;
    for row in &result.rows {
        writer
            .serialize((row.date, row.predicted_sales, row.lower_bound, row.upper_bound))
            .map_err(|e| AppError::new(2, format!("Failed to write forecast row: {e}")))?;
    }
    flush(writer)
}

/// Write cleaned records: core columns, passthrough attributes, then
/// `Month,Year,Profit_Margin`.
///
/// Missing profit or margin is written as `NaN`, as the cleaned table is a
/// numeric dataset rather than a sparse one.
pub fn write_cleaned_csv(path: &Path, records: &[CleanedRecord]) -> Result<(), AppError> {
    write_cleaned(create(path, "cleaned records")?, records)
}

pub fn write_cleaned<W: Write>(sink: W, records: &[CleanedRecord]) -> Result<(), AppError> {
    let attribute_columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.attributes.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(sink);
    let mut header: Vec<&str> = vec![
        "Order_Date",
        "Aging",
        "Sales",
        "Quantity",
        "Discount",
        "Shipping_Cost",
        "Order_Priority",
        "Profit",
    ];
    header.extend(attribute_columns.iter().copied());
    header.extend(["Month", "Year", "Profit_Margin"]);
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write cleaned CSV header: {e}")))?;

    for r in records {
        let mut row: Vec<String> = vec![
            r.order_date.format(DATE_FORMAT).to_string(),
            r.aging.to_string(),
            r.sales.to_string(),
            r.quantity.to_string(),
            r.discount.to_string(),
            r.shipping_cost.to_string(),
            r.order_priority.clone(),
            fmt_opt(r.profit),
        ];
        row.extend(
            attribute_columns
                .iter()
                .map(|c| r.attributes.get(*c).cloned().unwrap_or_default()),
        );
        row.push(r.month.to_string());
        row.push(r.year.to_string());
        row.push(fmt_opt(r.profit_margin));

        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write cleaned CSV row: {e}")))?;
    }
    flush(writer)
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create {what} CSV '{}': {e}", path.display())))
}

fn flush<W: Write>(mut writer: csv::Writer<W>) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV output: {e}")))
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "NaN".to_string())
}
