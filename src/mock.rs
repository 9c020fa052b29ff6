//! Seeded synthetic vendor and worker data.

use chrono::{Datelike, NaiveDate};
use rand::Rng;

use crate::config::DataConfig;
use crate::forecast::{add_months, month_start};
use crate::models::{ScoreRecord, WorkerScore};

pub fn generate_vendor_data<R>(config: &DataConfig, rng: &mut R) -> Vec<ScoreRecord>
where
    R: Rng + ?Sized,
{
    let months: Vec<NaiveDate> = (0..config.months)
        .filter_map(|offset| add_months(config.start_month, offset))
        .collect();

    let mut records = Vec::with_capacity(config.vendors.len() * months.len());
    for vendor in &config.vendors {
        let base: i64 = rng.gen_range(75..90);
        for period in &months {
            let score = (base + rng.gen_range(-5..8)).clamp(60, 100);
            records.push(ScoreRecord {
                vendor: vendor.clone(),
                period: *period,
                score: score as f64,
                worker_count: rng.gen_range(80..150),
                overtime_pay: percent(rng, 85, 100),
                attendance: percent(rng, 85, 100),
                holiday_bonus: percent(rng, 80, 100),
                social_insurance_tk: percent(rng, 75, 100),
                social_insurance_health: percent(rng, 75, 100),
                labor_fund: percent(rng, 70, 100),
            });
        }
    }

    tracing::debug!(
        vendors = config.vendors.len(),
        months = months.len(),
        "generated mock vendor data"
    );
    records
}

fn percent<R>(rng: &mut R, low: u32, high: u32) -> f64
where
    R: Rng + ?Sized,
{
    f64::from(rng.gen_range(low..high))
}

pub fn generate_worker_data<R>(rng: &mut R, count: usize) -> Vec<WorkerScore>
where
    R: Rng + ?Sized,
{
    (1..=count)
        .map(|index| WorkerScore {
            name: format!("Pekerja {index}"),
            score: rng.gen_range(70..100),
        })
        .collect()
}

const WORKER_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const FORECAST_STREAM: u64 = 0xd1b5_4a32_d192_ed03;

fn derive_seed(base_seed: u64, stream: u64, vendor_index: usize, period: NaiveDate) -> u64 {
    let period = month_start(period);
    let month_ordinal = period.year() as i64 * 12 + period.month0() as i64;
    (base_seed ^ stream)
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add((vendor_index as u64).wrapping_mul(1_442_695_040_888_963_407))
        .wrapping_add(month_ordinal as u64)
}

/// Seed for one vendor-month worker roster, so the same roster is shown every
/// time that vendor and month are selected.
pub fn worker_seed(base_seed: u64, vendor_index: usize, period: NaiveDate) -> u64 {
    derive_seed(base_seed, WORKER_STREAM, vendor_index, period)
}

/// Seed for the forecast noise of one vendor, keyed on the last month of its
/// history. Each vendor draws from its own generator.
pub fn forecast_seed(base_seed: u64, vendor_index: usize, last_period: NaiveDate) -> u64 {
    derive_seed(base_seed, FORECAST_STREAM, vendor_index, last_period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn vendor_data_covers_every_vendor_month() {
        let config = Config::default_config().data;
        let records = generate_vendor_data(&config, &mut StdRng::seed_from_u64(1));
        assert_eq!(records.len(), 18);

        for record in &records {
            assert!((60.0..=100.0).contains(&record.score));
            assert!((80..150).contains(&record.worker_count));
            assert!((85.0..100.0).contains(&record.attendance));
            assert!((70.0..100.0).contains(&record.labor_fund));
            assert_eq!(record.period.day(), 1);
        }

        let periods = crate::dataset::periods(&records);
        assert_eq!(
            periods,
            vec![
                NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid"),
                NaiveDate::from_ymd_opt(2023, 7, 1).expect("valid"),
                NaiveDate::from_ymd_opt(2023, 8, 1).expect("valid"),
            ]
        );
    }

    #[test]
    fn vendor_data_is_reproducible_per_seed() {
        let config = Config::default_config().data;
        let first = generate_vendor_data(&config, &mut StdRng::seed_from_u64(5));
        let second = generate_vendor_data(&config, &mut StdRng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn workers_are_named_and_scored() {
        let workers = generate_worker_data(&mut StdRng::seed_from_u64(3), 10);
        assert_eq!(workers.len(), 10);
        assert_eq!(workers[0].name, "Pekerja 1");
        assert_eq!(workers[9].name, "Pekerja 10");
        assert!(workers.iter().all(|w| (70..100).contains(&w.score)));
    }

    #[test]
    fn worker_seed_depends_on_vendor_and_month() {
        let june = NaiveDate::from_ymd_opt(2023, 6, 1).expect("valid");
        let june_late = NaiveDate::from_ymd_opt(2023, 6, 28).expect("valid");
        let july = NaiveDate::from_ymd_opt(2023, 7, 1).expect("valid");
        assert_eq!(worker_seed(42, 0, june), worker_seed(42, 0, june_late));
        assert_ne!(worker_seed(42, 0, june), worker_seed(42, 1, june));
        assert_ne!(worker_seed(42, 0, june), worker_seed(42, 0, july));
        assert_ne!(worker_seed(42, 0, june), forecast_seed(42, 0, june));
        assert_eq!(forecast_seed(42, 2, june_late), forecast_seed(42, 2, june));
    }
}
