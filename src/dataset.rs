use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ImportError;
use crate::forecast::month_start;
use crate::models::{DatasetStats, ScoreRecord};

pub const REQUIRED_COLUMNS: [&str; 10] = [
    "vendor",
    "period",
    "score",
    "worker_count",
    "attendance",
    "overtime_pay",
    "holiday_bonus",
    "social_insurance_tk",
    "social_insurance_health",
    "labor_fund",
];

/// Column names of the original spreadsheet template, in the same order as
/// `REQUIRED_COLUMNS`.
pub const ORIGINAL_COLUMNS: [&str; 10] = [
    "vendor",
    "bulan",
    "skor_evaluasi",
    "jumlah_pekerja",
    "kehadiran",
    "waktu_thp",
    "thr",
    "bpjs_tk",
    "bpjs_kes",
    "dpslk",
];

fn check_headers(headers: &csv::StringRecord) -> Result<(), ImportError> {
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .zip(ORIGINAL_COLUMNS.iter())
        .filter(|(name, alias)| !present.contains(*name) && !present.contains(*alias))
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns { missing })
    }
}

#[derive(Deserialize)]
struct CsvRow {
    vendor: String,
    #[serde(alias = "bulan")]
    period: NaiveDate,
    #[serde(alias = "skor_evaluasi")]
    score: f64,
    #[serde(alias = "jumlah_pekerja")]
    worker_count: u32,
    #[serde(alias = "kehadiran")]
    attendance: f64,
    #[serde(alias = "waktu_thp")]
    overtime_pay: f64,
    #[serde(alias = "thr")]
    holiday_bonus: f64,
    #[serde(alias = "bpjs_tk")]
    social_insurance_tk: f64,
    #[serde(alias = "bpjs_kes")]
    social_insurance_health: f64,
    #[serde(alias = "dpslk")]
    labor_fund: f64,
}

impl CsvRow {
    fn into_record(self, row: usize) -> Result<ScoreRecord, ImportError> {
        let vendor = self.vendor.trim().to_string();
        if vendor.is_empty() {
            return Err(ImportError::EmptyVendor { row });
        }

        let percentages = [
            ("score", self.score),
            ("attendance", self.attendance),
            ("overtime_pay", self.overtime_pay),
            ("holiday_bonus", self.holiday_bonus),
            ("social_insurance_tk", self.social_insurance_tk),
            ("social_insurance_health", self.social_insurance_health),
            ("labor_fund", self.labor_fund),
        ];
        for (field, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(ImportError::OutOfRange { row, field, value });
            }
        }

        Ok(ScoreRecord {
            vendor,
            period: month_start(self.period),
            score: self.score,
            worker_count: self.worker_count,
            attendance: self.attendance,
            overtime_pay: self.overtime_pay,
            holiday_bonus: self.holiday_bonus,
            social_insurance_tk: self.social_insurance_tk,
            social_insurance_health: self.social_insurance_health,
            labor_fund: self.labor_fund,
        })
    }
}

pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<ScoreRecord>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|source| ImportError::Csv { row: 0, source })?;
    check_headers(headers)?;

    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = index + 1;
        let record = result
            .map_err(|source| ImportError::Csv { row, source })?
            .into_record(row)?;

        if !seen.insert((record.vendor.clone(), record.period)) {
            return Err(ImportError::DuplicatePeriod {
                row,
                vendor: record.vendor,
                period: record.period,
            });
        }
        records.push(record);
    }

    Ok(records)
}

pub fn load_csv(path: &Path) -> Result<Vec<ScoreRecord>, ImportError> {
    let file = File::open(path)?;
    let records = read_records(file)?;
    tracing::info!(path = %path.display(), rows = records.len(), "dataset imported");
    Ok(records)
}

pub fn write_records<W: io::Write>(writer: W, records: &[ScoreRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv(path: &Path, records: &[ScoreRecord]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("create dataset at {}", path.display()))?;
    write_records(file, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "dataset written");
    Ok(())
}

/// Distinct vendors in the order they first appear.
pub fn vendors(records: &[ScoreRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.vendor.as_str()))
        .map(|record| record.vendor.clone())
        .collect()
}

pub fn vendor_series(records: &[ScoreRecord], vendor: &str) -> Vec<ScoreRecord> {
    let mut series: Vec<ScoreRecord> = records
        .iter()
        .filter(|record| record.vendor == vendor)
        .cloned()
        .collect();
    series.sort_by_key(|record| record.period);
    series
}

pub fn vendor_index(records: &[ScoreRecord], vendor: &str) -> Option<usize> {
    vendors(records).iter().position(|name| name == vendor)
}

pub fn periods(records: &[ScoreRecord]) -> Vec<NaiveDate> {
    let mut periods: Vec<NaiveDate> = records.iter().map(|record| record.period).collect();
    periods.sort();
    periods.dedup();
    periods
}

pub fn latest_period(records: &[ScoreRecord]) -> Option<NaiveDate> {
    records.iter().map(|record| record.period).max()
}

pub fn find<'a>(
    records: &'a [ScoreRecord],
    vendor: &str,
    period: NaiveDate,
) -> Option<&'a ScoreRecord> {
    let period = month_start(period);
    records
        .iter()
        .find(|record| record.vendor == vendor && record.period == period)
}

pub fn stats(records: &[ScoreRecord]) -> DatasetStats {
    DatasetStats {
        rows: records.len(),
        vendors: vendors(records).len(),
        months: periods(records).len(),
    }
}
