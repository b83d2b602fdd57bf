//! Record cleaning: turn raw order rows into validated `CleanedRecord`s.
//!
//! Steps, in order:
//!
//! 1. drop rows missing any required field
//! 2. drop exact duplicates (first occurrence wins, order preserved)
//! 3. parse `order_date` as `YYYY-MM-DD` (unparseable or absent rows are dropped)
//! 4. derive `month`, `year` and `profit_margin` (zero sales handled per policy)
//!
//! Row-level problems never become errors; they are counted in `CleanReport`
//! and logged.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::domain::{CleanConfig, CleanedRecord, DATE_FORMAT, OrderRecord, ZeroSalesPolicy};
use crate::error::RowIssue;

/// Exclusion counts for one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_in: usize,
    /// Rows dropped per (first) missing required field.
    pub missing_required: BTreeMap<&'static str, usize>,
    pub duplicates: usize,
    pub bad_dates: usize,
    /// Zero-sales rows seen; dropped under `Exclude`, kept under `Sentinel`.
    pub zero_sales: usize,
    pub rows_out: usize,
}

impl CleanReport {
    pub fn missing_total(&self) -> usize {
        self.missing_required.values().sum()
    }

    /// `record_index` is the 0-based position in the ingested records, not a CSV line.
    fn record(&mut self, record_index: usize, issue: &RowIssue) {
        debug!(record_index, %issue, "excluding order row");
        match issue {
            RowIssue::MissingField(field) => *self.missing_required.entry(*field).or_default() += 1,
            RowIssue::DateParse(_) => self.bad_dates += 1,
            RowIssue::ZeroSales => self.zero_sales += 1,
        }
    }
}

/// Cleaned rows plus what happened to the rest.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub records: Vec<CleanedRecord>,
    pub report: CleanReport,
}

/// Clean a batch of raw order rows.
pub fn clean(records: &[OrderRecord], config: &CleanConfig) -> CleanOutcome {
    let mut report = CleanReport {
        rows_in: records.len(),
        ..CleanReport::default()
    };

    // 1) Required-field filter.
    let mut complete = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match record.missing_required() {
            Some(field) => report.record(idx, &RowIssue::MissingField(field)),
            None => complete.push((idx, record)),
        }
    }

    // 2) Stable dedup over the complete rows.
    let mut seen = HashSet::with_capacity(complete.len());
    let mut unique = Vec::with_capacity(complete.len());
    for (idx, record) in complete {
        if seen.insert(RowKey::of(record)) {
            unique.push((idx, record));
        } else {
            report.duplicates += 1;
        }
    }

    // 3) + 4) Date parsing and derivation.
    let mut out = Vec::with_capacity(unique.len());
    for (idx, record) in unique {
        match derive(record, config.zero_sales) {
            Ok(cleaned) => {
                // Only reachable under `Sentinel`: kept, but still counted.
                if cleaned.sales == 0.0 {
                    report.zero_sales += 1;
                }
                out.push(cleaned);
            }
            Err(issue) => report.record(idx, &issue),
        }
    }

    report.rows_out = out.len();
    log_report(&report, config.zero_sales);

    CleanOutcome {
        records: out,
        report,
    }
}

fn derive(record: &OrderRecord, policy: ZeroSalesPolicy) -> Result<CleanedRecord, RowIssue> {
    let order_date = parse_order_date(record.order_date.as_deref())?;

    // Required fields were checked in step 1; re-extracting keeps this function
    // total without unwrapping.
    let field = |v: Option<f64>, name: &'static str| v.ok_or(RowIssue::MissingField(name));
    let aging = field(record.aging, "aging")?;
    let sales = field(record.sales, "sales")?;
    let quantity = field(record.quantity, "quantity")?;
    let discount = field(record.discount, "discount")?;
    let shipping_cost = field(record.shipping_cost, "shipping_cost")?;
    let order_priority = record
        .order_priority
        .clone()
        .ok_or(RowIssue::MissingField("order_priority"))?;

    let profit_margin = if sales == 0.0 {
        match policy {
            ZeroSalesPolicy::Exclude => return Err(RowIssue::ZeroSales),
            ZeroSalesPolicy::Sentinel => None,
        }
    } else {
        record.profit.map(|p| p / sales * 100.0)
    };

    Ok(CleanedRecord {
        order_date,
        aging,
        sales,
        quantity,
        discount,
        shipping_cost,
        order_priority,
        profit: record.profit,
        attributes: record.attributes.clone(),
        month: order_date.month(),
        year: order_date.year(),
        profit_margin,
    })
}

fn parse_order_date(raw: Option<&str>) -> Result<NaiveDate, RowIssue> {
    let raw = raw.map(str::trim).unwrap_or_default();
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| RowIssue::DateParse(raw.to_string()))
}

fn log_report(report: &CleanReport, policy: ZeroSalesPolicy) {
    info!(
        rows_in = report.rows_in,
        rows_out = report.rows_out,
        "cleaned order records"
    );
    if report.missing_total() > 0 {
        warn!(
            count = report.missing_total(),
            by_field = ?report.missing_required,
            "dropped rows with missing required fields"
        );
    }
    if report.duplicates > 0 {
        warn!(count = report.duplicates, "dropped duplicate rows");
    }
    if report.bad_dates > 0 {
        warn!(count = report.bad_dates, "dropped rows with invalid order dates");
    }
    if report.zero_sales > 0 {
        warn!(count = report.zero_sales, policy = ?policy, "zero-sales rows (margin undefined)");
    }
}

/// Hashable identity of a raw row. Floats compare by value: `-0.0 == 0.0`, `NaN == NaN`.
#[derive(Debug, PartialEq, Eq, Hash)]
struct RowKey<'a> {
    order_date: Option<&'a str>,
    numbers: [Option<u64>; 6],
    order_priority: Option<&'a str>,
    attributes: &'a BTreeMap<String, String>,
}

impl<'a> RowKey<'a> {
    fn of(record: &'a OrderRecord) -> Self {
        Self {
            order_date: record.order_date.as_deref(),
            numbers: [
                record.aging,
                record.sales,
                record.quantity,
                record.discount,
                record.shipping_cost,
                record.profit,
            ]
            .map(|v| v.map(float_key)),
            order_priority: record.order_priority.as_deref(),
            attributes: &record.attributes,
        }
    }
}

fn float_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}
