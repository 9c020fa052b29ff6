use std::collections::HashMap;
use std::fmt::Write;
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset;
use crate::forecast::TrendDirection;
use crate::models::{Prediction, ScoreRecord, VendorSummary, WorkerScore, WorkerStats};
use crate::risk::{self, RiskTier};

pub fn summarize_vendors(records: &[ScoreRecord]) -> Vec<VendorSummary> {
    dataset::vendors(records)
        .into_iter()
        .filter_map(|vendor| {
            let series = dataset::vendor_series(records, &vendor);
            let latest = series.last()?;
            let avg_score = series.iter().map(|record| record.score).sum::<f64>()
                / series.len() as f64;
            Some(VendorSummary {
                total_workers: latest.worker_count,
                avg_score: (avg_score * 10.0).round() / 10.0,
                current_score: latest.score,
                status: risk::tier_for(avg_score),
                bpjs_tk: latest.social_insurance_tk,
                bpjs_kes: latest.social_insurance_health,
                vendor,
            })
        })
        .collect()
}

pub fn worker_stats(workers: &[WorkerScore]) -> Option<WorkerStats> {
    let highest = workers.iter().map(|worker| worker.score).max()?;
    let lowest = workers.iter().map(|worker| worker.score).min()?;
    let total = workers.len();
    let average = workers.iter().map(|worker| f64::from(worker.score)).sum::<f64>() / total as f64;
    Some(WorkerStats {
        total,
        average,
        highest,
        lowest,
    })
}

/// Buckets worker scores into `bins` equal-width bins spanning the observed
/// range. Returns `(lower_edge, count)` pairs.
pub fn score_histogram(workers: &[WorkerScore], bins: usize) -> Vec<(f64, usize)> {
    let Some(stats) = worker_stats(workers) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    let low = f64::from(stats.lowest);
    let span = f64::from(stats.highest - stats.lowest).max(1.0);
    let width = span / bins as f64;
    let mut counts = vec![0usize; bins];
    for worker in workers {
        let offset = (f64::from(worker.score) - low) / width;
        let index = (offset as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| (low + width * index as f64, count))
        .collect()
}

pub fn build_report(
    records: &[ScoreRecord],
    forecasts: &[(String, Vec<Prediction>)],
) -> String {
    let summaries = summarize_vendors(records);
    let mut output = String::new();

    let _ = writeln!(output, "# Vendor Performance Report");
    match (
        dataset::periods(records).first(),
        dataset::latest_period(records),
    ) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                output,
                "Covering {} to {} across {} vendors",
                month_label(*first),
                month_label(last),
                summaries.len()
            );
        }
        _ => {
            let _ = writeln!(output, "No vendor data loaded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");
    if summaries.is_empty() {
        let _ = writeln!(output, "No vendors recorded.");
    } else {
        for tier in [RiskTier::Low, RiskTier::Medium, RiskTier::High] {
            let count = summaries
                .iter()
                .filter(|summary| summary.status == tier)
                .count();
            let _ = writeln!(output, "- {}: {} vendors", tier, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Vendor Summary");
    if summaries.is_empty() {
        let _ = writeln!(output, "No vendors recorded.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: avg {:.1}, current {:.0}, {} workers, BPJS TK {:.0}%, BPJS KES {:.0}% ({})",
                summary.vendor,
                summary.avg_score,
                summary.current_score,
                summary.total_workers,
                summary.bpjs_tk,
                summary.bpjs_kes,
                summary.status
            );
        }
    }

    let current: HashMap<&str, f64> = summaries
        .iter()
        .map(|summary| (summary.vendor.as_str(), summary.current_score))
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Forecast Outlook");
    if forecasts.is_empty() {
        let _ = writeln!(output, "No forecasts requested.");
    }
    for (vendor, predictions) in forecasts {
        let Some(next) = predictions.first() else {
            let _ = writeln!(output, "- {}: not enough history for a forecast", vendor);
            continue;
        };
        let direction = current
            .get(vendor.as_str())
            .map(|score| TrendDirection::between(*score, next.predicted_score as f64))
            .unwrap_or(TrendDirection::Stable);
        let outlook: Vec<String> = predictions
            .iter()
            .map(|prediction| {
                format!(
                    "{} {} ({}%)",
                    month_label(prediction.period),
                    prediction.predicted_score,
                    prediction.confidence
                )
            })
            .collect();
        let _ = writeln!(
            output,
            "- {} [{}]: {}",
            vendor,
            direction.label(),
            outlook.join(", ")
        );
    }

    output
}

pub fn month_label(period: NaiveDate) -> String {
    period.format("%B %Y").to_string()
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Vendor")]
    vendor: &'a str,
    #[serde(rename = "Total Workers")]
    total_workers: u32,
    #[serde(rename = "Avg Score")]
    avg_score: f64,
    #[serde(rename = "Current Score")]
    current_score: f64,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "BPJS TK")]
    bpjs_tk: String,
    #[serde(rename = "BPJS KES")]
    bpjs_kes: String,
}

#[derive(Serialize)]
struct DetailRow<'a> {
    #[serde(rename = "Vendor")]
    vendor: &'a str,
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "Score")]
    score: f64,
    #[serde(rename = "Workers")]
    workers: u32,
    #[serde(rename = "THP %")]
    overtime_pay: f64,
    #[serde(rename = "Attendance %")]
    attendance: f64,
    #[serde(rename = "THR %")]
    holiday_bonus: f64,
    #[serde(rename = "BPJS TK %")]
    social_insurance_tk: f64,
    #[serde(rename = "BPJS KES %")]
    social_insurance_health: f64,
    #[serde(rename = "DPSLK %")]
    labor_fund: f64,
}

pub fn write_summary<W: io::Write>(writer: W, records: &[ScoreRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for summary in summarize_vendors(records) {
        writer.serialize(SummaryRow {
            vendor: &summary.vendor,
            total_workers: summary.total_workers,
            avg_score: summary.avg_score,
            current_score: summary.current_score,
            status: summary.status.label(),
            bpjs_tk: format!("{}%", summary.bpjs_tk),
            bpjs_kes: format!("{}%", summary.bpjs_kes),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_detail<W: io::Write>(writer: W, records: &[ScoreRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(DetailRow {
            vendor: &record.vendor,
            month: month_label(record.period),
            score: record.score,
            workers: record.worker_count,
            overtime_pay: record.overtime_pay,
            attendance: record.attendance,
            holiday_bonus: record.holiday_bonus,
            social_insurance_tk: record.social_insurance_tk,
            social_insurance_health: record.social_insurance_health,
            labor_fund: record.labor_fund,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, records: &[ScoreRecord]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("create summary at {}", path.display()))?;
    write_summary(file, records)?;
    tracing::info!(path = %path.display(), "summary exported");
    Ok(())
}

pub fn write_detail_csv(path: &Path, records: &[ScoreRecord]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("create detail at {}", path.display()))?;
    write_detail(file, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "detail exported");
    Ok(())
}
