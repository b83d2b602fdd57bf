//! CSV ingest of raw order rows.
//!
//! This module is responsible for turning an order export into `OrderRecord`s
//! without judging them: cleaning decides what to keep.
//!
//! Design goals:
//! - **Strict schema** for the core columns (clear errors + exit code 2)
//! - **Lenient cells**: empty or non-numeric values become missing fields
//! - **Passthrough**: non-core columns are kept for duplicate detection
//! - **Separation of concerns**: no cleaning logic here

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{MonthlySummary, OrderRecord};
use crate::error::AppError;

/// Core order columns (normalized header names).
pub const ORDER_COLUMNS: [&str; 8] = [
    "order_date",
    "aging",
    "sales",
    "quantity",
    "discount",
    "shipping_cost",
    "order_priority",
    "profit",
];

/// Columns discarded at ingest (time of day plays no part in cleaning or dedup).
pub const DROPPED_COLUMNS: [&str; 1] = ["time"];

/// A row that could not be read at all.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: raw records + row-level read errors.
#[derive(Debug, Clone)]
pub struct IngestedOrders {
    pub records: Vec<OrderRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Original header names kept as passthrough attributes.
    pub attribute_columns: Vec<String>,
}

/// Load raw order rows from a CSV file.
pub fn load_orders(path: &Path) -> Result<IngestedOrders, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open orders CSV '{}': {e}", path.display())))?;
    let ingested = read_orders(file)?;
    info!(
        path = %path.display(),
        rows = ingested.rows_read,
        errors = ingested.row_errors.len(),
        "loaded order rows"
    );
    Ok(ingested)
}

/// Read raw order rows from any CSV source.
pub fn read_orders<R: Read>(source: R) -> Result<IngestedOrders, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let attribute_idx: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let key = normalize_header_name(name);
            let passthrough = !ORDER_COLUMNS.contains(&key.as_str()) && !DROPPED_COLUMNS.contains(&key.as_str());
            passthrough.then(|| (idx, clean_header_name(name).to_string()))
        })
        .collect();

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line, error = %e, "unreadable CSV row");
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        records.push(parse_row(&record, &header_map, &attribute_idx));
    }

    Ok(IngestedOrders {
        records,
        row_errors,
        rows_read,
        attribute_columns: attribute_idx.into_iter().map(|(_, name)| name).collect(),
    })
}

/// Read a persisted monthly summary (`Year,Month,Sales,Profit,Quantity`).
pub fn read_summary_csv(path: &Path) -> Result<Vec<MonthlySummary>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open summary CSV '{}': {e}", path.display())))?;
    read_summary(file)
}

/// Read monthly summary rows from any CSV source.
pub fn read_summary<R: Read>(source: R) -> Result<Vec<MonthlySummary>, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| row.map_err(|e| AppError::new(2, format!("Invalid summary row {}: {e}", idx + 2))))
        .collect()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn clean_header_name(name: &str) -> &str {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    name.trim().trim_start_matches('\u{feff}')
}

fn normalize_header_name(name: &str) -> String {
    clean_header_name(name).to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = ORDER_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::new(
        2,
        format!("Missing required column(s): {}", missing.join(", ")),
    ))
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    attribute_idx: &[(usize, String)],
) -> OrderRecord {
    let text = |name: &str| get_optional(record, header_map, name).map(str::to_string);
    let number = |name: &str| parse_opt_f64(get_optional(record, header_map, name));

    let attributes: BTreeMap<String, String> = attribute_idx
        .iter()
        .map(|(idx, name)| (name.clone(), record.get(*idx).unwrap_or("").trim().to_string()))
        .collect();

    OrderRecord {
        order_date: text("order_date"),
        aging: number("aging"),
        sales: number("sales"),
        quantity: number("quantity"),
        discount: number("discount"),
        shipping_cost: number("shipping_cost"),
        order_priority: text("order_priority"),
        profit: number("profit"),
        attributes,
    }
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_null_token(s))
}

/// Common spreadsheet spellings of a missing cell.
fn is_null_token(s: &str) -> bool {
    matches!(s, "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL" | "None")
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
