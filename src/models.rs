use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::risk::RiskTier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub vendor: String,
    pub period: NaiveDate,
    pub score: f64,
    pub worker_count: u32,
    pub attendance: f64,
    pub overtime_pay: f64,
    pub holiday_bonus: f64,
    pub social_insurance_tk: f64,
    pub social_insurance_health: f64,
    pub labor_fund: f64,
}

impl ScoreRecord {
    /// Average of the two BPJS enrollment rates, truncated to a whole percent.
    pub fn bpjs_compliance(&self) -> i64 {
        ((self.social_insurance_tk + self.social_insurance_health) / 2.0).floor() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub period: NaiveDate,
    pub predicted_score: i64,
    pub confidence: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerScore {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorSummary {
    pub vendor: String,
    pub total_workers: u32,
    pub avg_score: f64,
    pub current_score: f64,
    pub status: RiskTier,
    pub bpjs_tk: f64,
    pub bpjs_kes: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStats {
    pub total: usize,
    pub average: f64,
    pub highest: u32,
    pub lowest: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetStats {
    pub rows: usize,
    pub vendors: usize,
    pub months: usize,
}
