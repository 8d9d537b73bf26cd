//! CSV and JSON export of intake logs.
//!
//! Pure formatting over stored logs. Entries are written per medication in
//! timestamp order.

use crate::{Error, IntakeLogEntry, Medication, MedicationType, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::Invalid(format!("unknown export format: {}", other))),
        }
    }
}

fn action_label(entry: &IntakeLogEntry) -> &'static str {
    if entry.is_refill() {
        "refill"
    } else {
        "dose"
    }
}

fn type_label(medication_type: MedicationType) -> &'static str {
    match medication_type {
        MedicationType::Prescription => "prescription",
        MedicationType::NonPrescription => "non_prescription",
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    medication_name: &'a str,
    medication_type: &'static str,
    timestamp: String,
    mg_intake: f64,
    total_mg_remaining: f64,
    action: &'static str,
}

#[derive(Debug, Serialize)]
struct JsonRecord<'a> {
    medication_id: &'a str,
    medication_name: &'a str,
    medication_type: &'static str,
    timestamp: String,
    mg_intake: f64,
    total_mg_remaining: f64,
    action: &'static str,
    pills_intake: Option<f64>,
    pills_remaining: Option<f64>,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn export_csv<W: Write>(meds: &[Medication], writer: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    let mut rows = 0;

    for med in meds {
        for entry in med.sorted_log() {
            writer.serialize(CsvRow {
                medication_name: &med.name,
                medication_type: type_label(med.medication_type()),
                timestamp: rfc3339(entry.timestamp),
                mg_intake: entry.mg_intake,
                total_mg_remaining: entry.total_mg_remaining,
                action: action_label(entry),
            })?;
            rows += 1;
        }
    }

    // serialize() only emits the header alongside the first row
    if rows == 0 {
        writer.write_record([
            "medication_name",
            "medication_type",
            "timestamp",
            "mg_intake",
            "total_mg_remaining",
            "action",
        ])?;
    }

    writer.flush()?;
    Ok(rows)
}

/// Pretty JSON array; pill fields are null when `mg_per_pill <= 0`
pub fn export_json<W: Write>(meds: &[Medication], writer: W) -> Result<usize> {
    let mut records = Vec::new();

    for med in meds {
        let per_pill = |mg: f64| (med.mg_per_pill > 0.0).then(|| mg / med.mg_per_pill);
        for entry in med.sorted_log() {
            records.push(JsonRecord {
                medication_id: &med.id,
                medication_name: &med.name,
                medication_type: type_label(med.medication_type()),
                timestamp: rfc3339(entry.timestamp),
                mg_intake: entry.mg_intake,
                total_mg_remaining: entry.total_mg_remaining,
                action: action_label(entry),
                pills_intake: per_pill(entry.mg_intake),
                pills_remaining: per_pill(entry.total_mg_remaining),
            });
        }
    }

    serde_json::to_writer_pretty(writer, &records)?;
    Ok(records.len())
}

/// `medication_logs_<stamp>.<ext>`, or `medication_logs_all_<stamp>.<ext>` for several medications
pub fn export_filename(format: ExportFormat, medication_count: usize, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y-%m-%d_%H%M%S");
    if medication_count == 1 {
        format!("medication_logs_{}.{}", stamp, format.extension())
    } else {
        format!("medication_logs_all_{}.{}", stamp, format.extension())
    }
}

/// Export to `path`, replacing any existing file atomically
pub fn export_to_file(meds: &[Medication], format: ExportFormat, path: &Path) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    let rows = {
        let mut writer = BufWriter::new(temp.as_file());
        let rows = match format {
            ExportFormat::Csv => export_csv(meds, &mut writer)?,
            ExportFormat::Json => export_json(meds, &mut writer)?,
        };
        writer.flush()?;
        rows
    };
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} log entries to {:?}", rows, path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dose;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 9, 30, 0).unwrap()
    }

    fn meds() -> Vec<Medication> {
        let mut rx = Medication::prescription("Amoxicillin, 500", 500.0, 20.0);
        rx.take_medication(Dose::default(), now());
        rx.refill_medication(now() - Duration::days(1)).unwrap();

        let mut otc = Medication::non_prescription("Balm", 0.0, 1.0).with_total_mg_remaining(10.0);
        otc.take_medication(Dose::new(2.0, crate::DosageUnit::Mg), now());
        vec![rx, otc]
    }

    #[test]
    fn test_csv_export() {
        let mut out = Vec::new();
        let rows = export_csv(&meds(), &mut out).unwrap();
        assert_eq!(rows, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "medication_name,medication_type,timestamp,mg_intake,total_mg_remaining,action"
        );
        // Sorted by timestamp: the refill was a day earlier
        assert!(lines[1].starts_with("\"Amoxicillin, 500\",prescription,2025-03-04T09:30:00Z,10000"));
        assert!(lines[1].ends_with(",refill"));
        assert!(lines[2].ends_with(",dose"));
        assert!(lines[3].starts_with("Balm,non_prescription,"));
    }

    #[test]
    fn test_csv_export_empty_has_header() {
        let mut out = Vec::new();
        assert_eq!(export_csv(&[], &mut out).unwrap(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap().trim(),
            "medication_name,medication_type,timestamp,mg_intake,total_mg_remaining,action"
        );
    }

    #[test]
    fn test_json_export() {
        let mut out = Vec::new();
        export_json(&meds(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0]["action"], "refill");
        assert_eq!(records[0]["pills_intake"], 20.0);
        assert_eq!(records[1]["action"], "dose");
        assert_eq!(records[1]["timestamp"], "2025-03-05T09:30:00Z");
        assert_eq!(records[1]["pills_intake"], -1.0);
        assert_eq!(records[1]["medication_type"], "prescription");

        // Zero rate: no pill figures
        assert!(records[2]["pills_intake"].is_null());
        assert!(records[2]["pills_remaining"].is_null());
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename(ExportFormat::Csv, 1, now()),
            "medication_logs_2025-03-05_093000.csv"
        );
        assert_eq!(
            export_filename(ExportFormat::Json, 3, now()),
            "medication_logs_all_2025-03-05_093000.json"
        );
    }

    #[test]
    fn test_export_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("logs.json");
        let rows = export_to_file(&meds(), ExportFormat::Json, &path).unwrap();
        assert_eq!(rows, 3);
        assert!(path.exists());
    }
}
