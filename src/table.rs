use chrono::NaiveDate;

use crate::error::{Result, TrackerError};
use crate::input::format_date;
use crate::store::WeightRecord;

/// Records sorted ascending by date.
pub fn sorted_by_date(records: &[WeightRecord]) -> Vec<WeightRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.date);
    sorted
}

/// Display a weight with one or two decimals: `79.0`, `78.55`.
pub fn format_weight(weight: f64) -> String {
    let s = format!("{:.2}", weight);
    match s.strip_suffix('0') {
        Some(trimmed) => trimmed.to_string(),
        None => s,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub index: usize,
    pub date: NaiveDate,
    pub weight: f64,
}

/// Chronologically ordered records ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    pub rows: Vec<TableRow>,
}

/// Sort `records` by date and number them from zero.
pub fn format_table(records: &[WeightRecord]) -> Result<WeightTable> {
    if records.is_empty() {
        return Err(TrackerError::EmptyInput);
    }
    let rows = sorted_by_date(records)
        .into_iter()
        .enumerate()
        .map(|(index, r)| TableRow {
            index,
            date: r.date,
            weight: r.weight,
        })
        .collect();
    Ok(WeightTable { rows })
}

impl std::fmt::Display for WeightTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let weights: Vec<String> = self.rows.iter().map(|r| format_weight(r.weight)).collect();
        let iw = self
            .rows
            .last()
            .map(|r| r.index.to_string().len())
            .unwrap_or(1);
        let ww = weights.iter().map(String::len).max().unwrap_or(0).max("Weight".len());
        writeln!(f, "{:>iw$}  {:<10}  {:>ww$}", "", "Date", "Weight")?;
        for (row, weight) in self.rows.iter().zip(&weights) {
            writeln!(
                f,
                "{:>iw$}  {:<10}  {:>ww$}",
                row.index,
                format_date(row.date),
                weight
            )?;
        }
        Ok(())
    }
}
