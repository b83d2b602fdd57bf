//! Monthly aggregation of cleaned orders.
//!
//! - `aggregate`: one `MonthlySummary` per (year, month), ascending
//! - `correlation`: Pearson correlation between the summary's Sales/Profit/Quantity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{CleanedRecord, MonthlySummary};

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    sales: f64,
    profit: f64,
    quantity: f64,
}

/// Group cleaned records by calendar month and sum sales, profit and quantity.
///
/// Missing profit contributes nothing. Output is sorted by (year, month) and
/// has unique keys; empty input gives an empty table.
pub fn aggregate(records: &[CleanedRecord]) -> Vec<MonthlySummary> {
    let mut groups: BTreeMap<(i32, u32), Totals> = BTreeMap::new();
    for r in records {
        let t = groups.entry((r.year, r.month)).or_default();
        t.sales += r.sales;
        t.profit += r.profit.unwrap_or(0.0);
        t.quantity += r.quantity;
    }

    let summary: Vec<MonthlySummary> = groups
        .into_iter()
        .map(|((year, month), t)| MonthlySummary {
            year,
            month,
            sales_total: t.sales,
            profit_total: t.profit,
            quantity_total: t.quantity,
        })
        .collect();

    info!(records = records.len(), months = summary.len(), "aggregated monthly summary");
    summary
}

/// Metrics covered by [`CorrelationMatrix`], in row/column order.
pub const METRICS: [&str; 3] = ["Sales", "Profit", "Quantity"];

/// Symmetric 3x3 Pearson correlation table over [`METRICS`].
///
/// A cell is `NaN` when fewer than two months are available or either column
/// has zero variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub values: [[f64; 3]; 3],
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }
}

/// Pearson correlation between monthly Sales, Profit and Quantity.
pub fn correlation(summary: &[MonthlySummary]) -> CorrelationMatrix {
    let columns: [Vec<f64>; 3] = [
        summary.iter().map(|s| s.sales_total).collect(),
        summary.iter().map(|s| s.profit_total).collect(),
        summary.iter().map(|s| s.quantity_total).collect(),
    ];

    let mut values = [[f64::NAN; 3]; 3];
    for i in 0..3 {
        for j in i..3 {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix { values }
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return f64::NAN;
    }
    (cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn cleaned(y: i32, m: u32, d: u32, sales: f64, profit: Option<f64>, quantity: f64) -> CleanedRecord {
        let order_date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        CleanedRecord {
            order_date,
            aging: 1.0,
            sales,
            quantity,
            discount: 0.0,
            shipping_cost: 0.0,
            order_priority: "Low".to_string(),
            profit,
            attributes: BTreeMap::new(),
            month: order_date.month(),
            year: order_date.year(),
            profit_margin: profit.map(|p| p / sales * 100.0),
        }
    }

    #[test]
    fn sums_sales_within_month() {
        let records = vec![
            cleaned(2020, 1, 3, 100.0, Some(10.0), 1.0),
            cleaned(2020, 1, 9, 200.0, Some(20.0), 2.0),
            cleaned(2020, 1, 30, 300.0, Some(30.0), 3.0),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].sales_total, 600.0);
        assert_eq!(summary[0].profit_total, 60.0);
        assert_eq!(summary[0].quantity_total, 6.0);
    }

    #[test]
    fn missing_profit_contributes_nothing() {
        let records = vec![
            cleaned(2020, 5, 1, 100.0, None, 1.0),
            cleaned(2020, 5, 2, 100.0, Some(-15.5), 1.0),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary[0].profit_total, -15.5);
    }

    #[test]
    fn output_sorted_and_unique() {
        let records = vec![
            cleaned(2021, 2, 1, 1.0, None, 1.0),
            cleaned(2020, 12, 1, 1.0, None, 1.0),
            cleaned(2021, 1, 1, 1.0, None, 1.0),
            cleaned(2020, 12, 31, 1.0, None, 1.0),
            cleaned(2019, 7, 4, 1.0, None, 1.0),
        ];
        let keys: Vec<(i32, u32)> = aggregate(&records).iter().map(|s| (s.year, s.month)).collect();
        assert_eq!(keys, vec![(2019, 7), (2020, 12), (2021, 1), (2021, 2)]);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn correlation_diagonal_and_symmetry() {
        let records = vec![
            cleaned(2020, 1, 1, 100.0, Some(10.0), 3.0),
            cleaned(2020, 2, 1, 250.0, Some(30.0), 1.0),
            cleaned(2020, 3, 1, 180.0, Some(12.0), 7.0),
        ];
        let m = correlation(&aggregate(&records));
        for i in 0..3 {
            assert!((m.get(i, i) - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert_eq!(m.get(i, j).to_bits(), m.get(j, i).to_bits());
            }
        }
        assert!(m.get(0, 1) > 0.8);
    }

    #[test]
    fn correlation_undefined_for_single_month() {
        let m = correlation(&aggregate(&[cleaned(2020, 1, 1, 1.0, Some(1.0), 1.0)]));
        assert!(m.get(0, 1).is_nan());
        assert!(m.get(0, 0).is_nan());
    }
}
