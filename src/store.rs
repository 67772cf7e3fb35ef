//! SQLite-backed storage of dated weight measurements.
//!
//! The `weights` table has no key constraint, so uniqueness per date is kept
//! by [`RecordStore::upsert_record`] updating the existing row inside the same
//! transaction that would otherwise insert.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::error::{Field, Result};
use crate::input::{format_date, parse_iso_date, parse_positive, require};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS weights(date TEXT, weight REAL)";

/// File name of the database placed next to the executable.
pub const DB_FILE: &str = "weight.db";

/// A single body-weight measurement in kilograms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRecord {
    pub date: NaiveDate,
    pub weight: f64,
}

/// Whether an upsert created a row or replaced the weight of an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl UpsertOutcome {
    pub fn message(self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "Record added successfully",
            UpsertOutcome::Updated => "Record updated successfully",
        }
    }
}

/// Location of the database: beside the running executable, or the working
/// directory when the executable path cannot be determined.
pub fn default_db_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DB_FILE)))
        .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open or create the database file and make sure the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        log::info!("Opened weight database at {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Validate raw form text and store it.
    ///
    /// Nothing is written unless both fields pass validation.
    pub fn upsert(&mut self, date_text: &str, weight_text: &str) -> Result<UpsertOutcome> {
        let date_text = require(date_text, Field::Date)?;
        let weight_text = require(weight_text, Field::Weight)?;
        let date = parse_iso_date(date_text)?;
        let weight = parse_positive(weight_text, Field::Weight)?;
        self.upsert_record(&WeightRecord { date, weight })
    }

    /// Insert `record`, or overwrite the weight already stored for its date.
    pub fn upsert_record(&mut self, record: &WeightRecord) -> Result<UpsertOutcome> {
        let date = format_date(record.date);
        let tx = self.conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT rowid FROM weights WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()?;
        let outcome = match existing {
            Some(_) => {
                tx.execute(
                    "UPDATE weights SET weight = ?1 WHERE date = ?2",
                    params![record.weight, date],
                )?;
                UpsertOutcome::Updated
            }
            None => {
                tx.execute(
                    "INSERT INTO weights (date, weight) VALUES (?1, ?2)",
                    params![date, record.weight],
                )?;
                UpsertOutcome::Inserted
            }
        };
        tx.commit()?;
        log::info!("{:?} weight {} kg for {}", outcome, record.weight, date);
        Ok(outcome)
    }

    /// Every stored record in insertion order.
    ///
    /// Rows whose date is not strict `YYYY-MM-DD` are skipped.
    pub fn fetch_all(&self) -> Result<Vec<WeightRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, weight FROM weights ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (date, weight) = row?;
            match parse_iso_date(&date) {
                Ok(date) => records.push(WeightRecord { date, weight }),
                Err(_) => log::warn!("Skipping stored row with unreadable date '{date}'"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn upsert_same_date_keeps_last_weight() {
        let mut store = RecordStore::open_in_memory().unwrap();
        assert_eq!(
            store.upsert("2023-01-01", "80.0").unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert("2023-01-05", "78.5").unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert("2023-01-01", "79.0").unwrap(),
            UpsertOutcome::Updated
        );

        let records = store.fetch_all().unwrap();
        assert_eq!(
            records,
            vec![
                WeightRecord {
                    date: day("2023-01-01"),
                    weight: 79.0
                },
                WeightRecord {
                    date: day("2023-01-05"),
                    weight: 78.5
                },
            ]
        );
    }

    #[test]
    fn fetch_all_returns_one_record_per_distinct_date() {
        let mut store = RecordStore::open_in_memory().unwrap();
        for (i, d) in ["2024-03-02", "2024-01-15", "2024-02-20", "2024-01-01"]
            .iter()
            .enumerate()
        {
            store.upsert(d, &format!("{}", 70 + i)).unwrap();
        }
        store.upsert("2024-02-20", "99.5").unwrap();

        let records = store.fetch_all().unwrap();
        assert_eq!(records.len(), 4);
        // insertion order, not chronological
        assert_eq!(records[0].date, day("2024-03-02"));
        let feb = records.iter().find(|r| r.date == day("2024-02-20")).unwrap();
        assert_eq!(feb.weight, 99.5);
    }

    #[test]
    fn empty_store_fetches_nothing() {
        let store = RecordStore::open_in_memory().unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn invalid_input_leaves_store_unchanged() {
        let mut store = RecordStore::open_in_memory().unwrap();
        store.upsert("2023-01-01", "80").unwrap();

        assert!(matches!(
            store.upsert("2023-01-01", "abc"),
            Err(TrackerError::InvalidNumber {
                field: Field::Weight,
                ..
            })
        ));
        assert!(matches!(
            store.upsert("2023-01-02", "-1"),
            Err(TrackerError::InvalidNumber { .. })
        ));
        assert!(matches!(
            store.upsert("01/02/2023", "75"),
            Err(TrackerError::InvalidDate(_))
        ));
        assert!(matches!(
            store.upsert("", "75"),
            Err(TrackerError::MissingField(Field::Date))
        ));
        assert!(matches!(
            store.upsert("2023-01-02", " "),
            Err(TrackerError::MissingField(Field::Weight))
        ));

        let records = store.fetch_all().unwrap();
        assert_eq!(
            records,
            vec![WeightRecord {
                date: day("2023-01-01"),
                weight: 80.0
            }]
        );
    }

    #[test]
    fn lenient_legacy_rows_are_skipped() {
        let store = RecordStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO weights VALUES ('2023/01/01', 81.0), ('2023-01-02', 80.5)",
                [],
            )
            .unwrap();
        let records = store.fetch_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, day("2023-01-02"));
    }

    #[test]
    fn records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE);
        {
            let mut store = RecordStore::open(&path).unwrap();
            store.upsert("2023-06-01", "72.4").unwrap();
        }
        let mut store = RecordStore::open(&path).unwrap();
        assert_eq!(store.fetch_all().unwrap().len(), 1);
        assert_eq!(
            store.upsert("2023-06-01", "72.0").unwrap(),
            UpsertOutcome::Updated
        );
    }

    #[test]
    fn default_path_uses_db_file_name() {
        assert_eq!(
            default_db_path().file_name().and_then(|f| f.to_str()),
            Some(DB_FILE)
        );
    }
}
