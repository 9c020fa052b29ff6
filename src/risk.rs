use std::fmt;

use serde::Serialize;

pub const LOW_RISK_FLOOR: f64 = 85.0;
pub const MEDIUM_RISK_FLOOR: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Hex display color bound to a risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color(pub &'static str);

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            RiskTier::Low => Color("#10b981"),
            RiskTier::Medium => Color("#f59e0b"),
            RiskTier::High => Color("#ef4444"),
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub fn tier_for(score: f64) -> RiskTier {
    if score >= LOW_RISK_FLOOR {
        RiskTier::Low
    } else if score >= MEDIUM_RISK_FLOOR {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

pub fn classify(score: f64) -> (RiskTier, Color) {
    let tier = tier_for(score);
    (tier, tier.color())
}
