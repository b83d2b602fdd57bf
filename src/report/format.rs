//! Formatted terminal output: cleaning counts, summary and forecast tables.
//!
//! We keep formatting code in one place so:
//! - the cleaning/forecast code stays clean and testable
//! - output changes are localized

use crate::aggregate::{CorrelationMatrix, METRICS};
use crate::clean::CleanReport;
use crate::domain::{ForecastModel, ForecastResult, ForecastSource, MonthlySummary, ZeroSalesPolicy};
use crate::io::ingest::IngestedOrders;

/// Format ingest and cleaning counts.
pub fn format_clean_report(ingest: &IngestedOrders, report: &CleanReport, policy: ZeroSalesPolicy) -> String {
    let mut out = String::new();

    out.push_str("=== sales - Cleaning ===\n");
    out.push_str(&format!(
        "Rows: read={} | unreadable={} | cleaned={}\n",
        ingest.rows_read,
        ingest.row_errors.len(),
        report.rows_out
    ));
    out.push_str(&format!("Dropped (missing required): {}\n", report.missing_total()));
    for (field, count) in &report.missing_required {
        out.push_str(&format!("  - {field}: {count}\n"));
    }
    out.push_str(&format!("Dropped (duplicates): {}\n", report.duplicates));
    out.push_str(&format!("Dropped (bad order date): {}\n", report.bad_dates));
    let zero_action = match policy {
        ZeroSalesPolicy::Exclude => "dropped",
        ZeroSalesPolicy::Sentinel => "kept, margin=NaN",
    };
    out.push_str(&format!("Zero sales ({zero_action}): {}\n", report.zero_sales));
    if !ingest.attribute_columns.is_empty() {
        out.push_str(&format!("Passthrough columns: {}\n", ingest.attribute_columns.join(", ")));
    }

    out
}

/// Format the monthly summary table.
pub fn format_summary(summary: &[MonthlySummary]) -> String {
    let mut out = String::new();
    out.push_str("Monthly summary:\n");
    out.push_str(&header_line(&[("Year", 6), ("Month", 5), ("Sales", 14), ("Profit", 14), ("Quantity", 10)]));
    for r in summary {
        out.push_str(
            format!(
                "{:>6} {:>5} {:>14.2} {:>14.2} {:>10.0}\n",
                r.year, r.month, r.sales_total, r.profit_total, r.quantity_total
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if summary.is_empty() {
        out.push_str("(no rows)\n");
    }
    out
}

/// Format the correlation table of the summary metrics.
pub fn format_correlation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    out.push_str("Correlation:\n");
    out.push_str(&format!("{:<10}", ""));
    for name in METRICS {
        out.push_str(&format!(" {name:>9}"));
    }
    out.push('\n');
    for (i, name) in METRICS.iter().enumerate() {
        out.push_str(&format!("{name:<10}"));
        for j in 0..METRICS.len() {
            let v = matrix.get(i, j);
            if v.is_finite() {
                out.push_str(&format!(" {v:>9.3}"));
            } else {
                out.push_str(&format!(" {:>9}", "n/a"));
            }
        }
        out.push('\n');
    }
    out
}

/// Format fit diagnostics for the forecast model.
pub fn format_model(model: &ForecastModel, source: ForecastSource, history_len: usize) -> String {
    let mut out = String::new();

    out.push_str("=== sales - Forecast ===\n");
    out.push_str(&format!("Source: {} (n={history_len})\n", source.display_name()));
    out.push_str(&format!(
        "Trend: intercept={:.6} slope={:.6} (scaled, y_scale={:.2})\n",
        model.trend_intercept, model.trend_slope, model.y_scale
    ));
    out.push_str(&format!(
        "Changepoints: {} | deltas: {}\n",
        model.changepoints.len(),
        fmt_vec(&model.deltas)
    ));
    out.push_str(&format!("Seasonality: {}\n", model.seasonality_reason));
    out.push_str(&format!(
        "Fit: SSE={:.3} RMSE={:.3} sigma={:.3}\n",
        model.quality.sse, model.quality.rmse, model.quality.sigma
    ));

    out
}

/// Format the forecast table; future rows are marked with `*`.
pub fn format_forecast(result: &ForecastResult) -> String {
    let mut out = String::new();
    out.push_str(&header_line(&[("", 1), ("date", 10), ("predicted", 14), ("lower", 14), ("upper", 14)]));
    for r in &result.rows {
        let mark = if r.is_forecast { "*" } else { " " };
        out.push_str(
            format!(
                "{mark} {:<10} {:>14.2} {:>14.2} {:>14.2}\n",
                truncate(&r.date.to_string(), 10),
                r.predicted_sales,
                r.lower_bound,
                r.upper_bound
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Column titles plus a dashed rule. Numeric columns are right-aligned, `date` left.
fn header_line(cols: &[(&str, usize)]) -> String {
    let titles: Vec<String> = cols
        .iter()
        .map(|&(name, w)| {
            if name == "date" {
                format!("{name:<w$}")
            } else {
                format!("{name:>w$}")
            }
        })
        .collect();
    let rules: Vec<String> = cols.iter().map(|(_, w)| "-".repeat(*w)).collect();
    format!("{}\n{}\n", titles.join(" ").trim_end(), rules.join(" "))
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
