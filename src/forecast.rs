//! Endpoint-slope score forecast.
//!
//! The trend is `(last - first) / count` over the whole history rather than a
//! least-squares fit. Predictions are perturbed by an integer noise term drawn
//! from the caller's random source, so a seeded generator gives repeatable
//! output.

use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;

use crate::models::{Prediction, ScoreRecord};

pub const MIN_HISTORY: usize = 2;
pub const NOISE_SPAN: i64 = 2;
pub const SCORE_FLOOR: i64 = 60;
pub const SCORE_CEILING: i64 = 100;
pub const CONFIDENCE_BASE: f64 = 90.0;
pub const CONFIDENCE_FLOOR: i64 = 70;
pub const CONFIDENCE_CEILING: i64 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn between(current: f64, next: f64) -> Self {
        if next > current {
            TrendDirection::Increasing
        } else if next < current {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "Increasing",
            TrendDirection::Decreasing => "Decreasing",
            TrendDirection::Stable => "Stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "↑",
            TrendDirection::Decreasing => "↓",
            TrendDirection::Stable => "→",
        }
    }
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Moves `date` forward by whole calendar months; the result is always the
/// first of its month.
pub fn add_months(date: NaiveDate, months: usize) -> Option<NaiveDate> {
    let months = u32::try_from(months).ok()?;
    month_start(date).checked_add_months(Months::new(months))
}

pub fn trend_per_step(scores: &[f64]) -> f64 {
    match (scores.first(), scores.last()) {
        (Some(first), Some(last)) => (last - first) / scores.len() as f64,
        _ => 0.0,
    }
}

pub fn population_variance(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let count = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / count;
    scores.iter().map(|score| (score - mean).powi(2)).sum::<f64>() / count
}

pub fn confidence_for(variance: f64) -> i64 {
    let raw = (CONFIDENCE_BASE - variance).round();
    if raw.is_nan() {
        return CONFIDENCE_FLOOR;
    }
    (raw as i64).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

pub fn clamp_score(raw: f64) -> i64 {
    (raw.round() as i64).clamp(SCORE_FLOOR, SCORE_CEILING)
}

/// Projects `horizon` monthly scores past the end of `series`.
///
/// Returns an empty vector when fewer than two records are supplied; callers
/// should read that as "no forecast available".
pub fn predict<R>(series: &[ScoreRecord], horizon: usize, rng: &mut R) -> Vec<Prediction>
where
    R: Rng + ?Sized,
{
    if series.len() < MIN_HISTORY {
        tracing::debug!(points = series.len(), "not enough history to forecast");
        return Vec::new();
    }

    let mut ordered: Vec<&ScoreRecord> = series.iter().collect();
    ordered.sort_by_key(|record| record.period);

    let scores: Vec<f64> = ordered.iter().map(|record| record.score).collect();
    let last = ordered[ordered.len() - 1];
    let last_score = last.score;
    let last_period = last.period;

    let trend = trend_per_step(&scores);
    let confidence = confidence_for(population_variance(&scores));

    let mut predictions = Vec::with_capacity(horizon);
    for step in 1..=horizon {
        let Some(period) = add_months(last_period, step) else {
            break;
        };
        let noise = rng.gen_range(-NOISE_SPAN..=NOISE_SPAN) as f64;
        let raw = last_score + trend * step as f64 + noise;
        predictions.push(Prediction {
            period,
            predicted_score: clamp_score(raw),
            confidence,
        });
    }

    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn month(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).expect("valid month")
    }

    fn record(period: NaiveDate, score: f64) -> ScoreRecord {
        ScoreRecord {
            vendor: "PT PMS".to_string(),
            period,
            score,
            worker_count: 120,
            attendance: 92.0,
            overtime_pay: 90.0,
            holiday_bonus: 88.0,
            social_insurance_tk: 85.0,
            social_insurance_health: 87.0,
            labor_fund: 80.0,
        }
    }

    fn series(start: NaiveDate, scores: &[f64]) -> Vec<ScoreRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(offset, score)| {
                record(add_months(start, offset).expect("in range"), *score)
            })
            .collect()
    }

    #[test]
    fn short_history_yields_no_forecast() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(predict(&[], 3, &mut rng).is_empty());
        assert!(predict(&series(month(2023, 6), &[80.0]), 3, &mut rng).is_empty());
    }

    #[test]
    fn zero_horizon_is_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(predict(&series(month(2023, 6), &[80.0, 82.0]), 0, &mut rng).is_empty());
    }

    #[test]
    fn forecast_has_requested_length_and_bounds() {
        let histories: [&[f64]; 4] = [
            &[80.0, 85.0],
            &[60.0, 100.0, 61.0, 99.0],
            &[100.0, 95.0, 60.0, 40.0, 10.0],
            &[0.0, 100.0],
        ];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for scores in histories {
                let history = series(month(2023, 11), scores);
                let predictions = predict(&history, 6, &mut rng);
                assert_eq!(predictions.len(), 6);

                let mut expected = month(2023, 11);
                for _ in 0..scores.len() {
                    expected = add_months(expected, 1).expect("in range");
                }
                for prediction in &predictions {
                    assert_eq!(prediction.period, expected);
                    assert!((60..=100).contains(&prediction.predicted_score));
                    assert!((70..=95).contains(&prediction.confidence));
                    expected = add_months(expected, 1).expect("in range");
                }
            }
        }
    }

    #[test]
    fn flat_history_stays_within_noise_at_base_confidence() {
        for k in [60.0, 75.0, 88.0, 100.0] {
            for seed in 0..25 {
                let mut rng = StdRng::seed_from_u64(seed);
                let history = series(month(2023, 6), &[k, k, k, k]);
                let predictions = predict(&history, 4, &mut rng);
                assert_eq!(predictions.len(), 4);
                for prediction in predictions {
                    let low = (k as i64 - 2).max(60);
                    let high = (k as i64 + 2).min(100);
                    assert!(
                        (low..=high).contains(&prediction.predicted_score),
                        "{} outside {low}..={high}",
                        prediction.predicted_score
                    );
                    assert_eq!(prediction.confidence, 90);
                }
            }
        }
    }

    #[test]
    fn same_seed_gives_identical_forecast() {
        let history = series(month(2023, 6), &[78.0, 83.0, 81.0, 86.0]);
        let first = predict(&history, 5, &mut StdRng::seed_from_u64(99));
        let second = predict(&history, 5, &mut StdRng::seed_from_u64(99));
        assert_eq!(first, second);
    }

    #[test]
    fn rising_history_projects_along_endpoint_slope() {
        let history = series(month(2023, 1), &[80.0, 85.0, 90.0]);
        let trend = 10.0 / 3.0;
        assert!((trend_per_step(&[80.0, 85.0, 90.0]) - trend).abs() < 1e-9);

        for seed in 0..30 {
            let predictions = predict(&history, 3, &mut StdRng::seed_from_u64(seed));
            let periods: Vec<NaiveDate> = predictions.iter().map(|p| p.period).collect();
            assert_eq!(periods, vec![month(2023, 4), month(2023, 5), month(2023, 6)]);

            // same seed, same draw order as the forecaster
            let mut replay = StdRng::seed_from_u64(seed);
            for (step, prediction) in (1..=3).zip(&predictions) {
                let noise = replay.gen_range(-NOISE_SPAN..=NOISE_SPAN) as f64;
                let raw = 90.0 + trend * step as f64 + noise;
                let expected = (raw.round() as i64).clamp(60, 100);
                assert_eq!(prediction.predicted_score, expected, "seed {seed} step {step}");
            }
        }
    }

    #[test]
    fn scores_round_to_nearest_before_clamping() {
        assert_eq!(clamp_score(96.667), 97);
        assert_eq!(clamp_score(93.333), 93);
        assert_eq!(clamp_score(59.5), 60);
        assert_eq!(clamp_score(100.4), 100);
        assert_eq!(clamp_score(102.0), 100);
    }

    #[test]
    fn unordered_input_is_sorted_by_period() {
        let mut history = series(month(2023, 1), &[80.0, 85.0, 90.0]);
        history.reverse();
        let predictions = predict(&history, 1, &mut StdRng::seed_from_u64(3));
        assert_eq!(predictions[0].period, month(2023, 4));
        assert!(predictions[0].predicted_score >= 91);
    }

    #[test]
    fn confidence_uses_population_variance() {
        // scores 80, 85, 90: mean 85, variance 50/3
        assert!((population_variance(&[80.0, 85.0, 90.0]) - 50.0 / 3.0).abs() < 1e-9);
        assert_eq!(confidence_for(50.0 / 3.0), 73);
        assert_eq!(confidence_for(0.0), 90);
        assert_eq!(confidence_for(400.0), 70);
    }

    #[test]
    fn confidence_tops_out_at_base_for_real_variance() {
        // variance is never negative, so 90 is the highest reachable value;
        // the 95 ceiling only bites on inputs below zero
        for variance in [0.0, 0.25, 0.49, 3.0] {
            assert!(confidence_for(variance) <= 90);
        }
        assert_eq!(confidence_for(-3.0), 93);
        assert_eq!(confidence_for(-40.0), 95);
    }

    #[test]
    fn months_advance_across_year_end() {
        let mid_month = NaiveDate::from_ymd_opt(2023, 11, 17).expect("valid date");
        assert_eq!(add_months(mid_month, 1), Some(month(2023, 12)));
        assert_eq!(add_months(mid_month, 2), Some(month(2024, 1)));
        assert_eq!(add_months(mid_month, 15), Some(month(2025, 2)));
    }

    #[test]
    fn direction_compares_next_prediction_to_current() {
        assert_eq!(TrendDirection::between(80.0, 83.0), TrendDirection::Increasing);
        assert_eq!(TrendDirection::between(80.0, 78.0), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::between(80.0, 80.0), TrendDirection::Stable);
    }
}
