use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod dataset;
mod error;
mod forecast;
mod mock;
mod models;
mod report;
mod risk;

use crate::app::{Action, AppState, Page, Theme, View};
use crate::config::Config;
use crate::models::{Prediction, ScoreRecord, WorkerScore};

#[derive(Parser)]
#[command(name = "vendorpro")]
#[command(about = "Vendor performance scoring, risk tiers and score forecasts", long_about = None)]
struct Cli {
    /// Dataset to use instead of generated mock data
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed for mock data and forecast noise (overrides the config)
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration to a file
    InitConfig {
        #[arg(long, default_value = "vendorpro.toml")]
        out: PathBuf,
    },
    /// Write the mock dataset in the import format
    Generate {
        #[arg(long, default_value = "vendors.csv")]
        out: PathBuf,
    },
    /// Check an import file and show what it contains
    Validate {
        #[arg(long)]
        file: PathBuf,
    },
    /// Classify a score into a risk tier
    Risk {
        #[arg(allow_hyphen_values = true)]
        score: f64,
    },
    /// Forecast scores for one vendor, or every vendor
    Predict {
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show the worker roster for a vendor and month
    Workers {
        #[arg(long)]
        vendor: String,
        #[arg(long)]
        period: Option<NaiveDate>,
        #[arg(long)]
        count: Option<usize>,
    },
    /// Summarize every vendor
    Summary,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export summary and detail spreadsheets as CSV
    Export {
        #[arg(long, default_value = "vendor_summary.csv")]
        summary: PathBuf,
        #[arg(long, default_value = "vendor_detail.csv")]
        detail: PathBuf,
    },
    /// Render a dashboard page
    View {
        #[arg(long, value_enum, default_value_t = Page::Dashboard)]
        page: Page,
        #[arg(long, value_enum)]
        theme: Option<Theme>,
        #[arg(long)]
        vendor: Option<String>,
        #[arg(long)]
        period: Option<NaiveDate>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_records(csv: Option<&Path>, config: &Config) -> anyhow::Result<Vec<ScoreRecord>> {
    match csv {
        Some(path) => dataset::load_csv(path)
            .with_context(|| format!("failed to import {}", path.display())),
        None => {
            let mut rng = StdRng::seed_from_u64(config.data.seed);
            Ok(mock::generate_vendor_data(&config.data, &mut rng))
        }
    }
}

/// Forecast for one vendor with noise from that vendor's own generator, so
/// the result does not depend on which other vendors were forecast first.
fn forecast_for(
    records: &[ScoreRecord],
    vendor: &str,
    horizon: usize,
    config: &Config,
) -> anyhow::Result<Vec<Prediction>> {
    let vendor_index = dataset::vendor_index(records, vendor)
        .with_context(|| format!("unknown vendor {vendor}"))?;
    let series = dataset::vendor_series(records, vendor);
    tracing::info!(vendor, points = series.len(), horizon, "forecast requested");

    let Some(last) = series.last() else {
        return Ok(Vec::new());
    };
    let seed = mock::forecast_seed(config.data.seed, vendor_index, last.period);
    Ok(forecast::predict(
        &series,
        horizon,
        &mut StdRng::seed_from_u64(seed),
    ))
}

fn forecast_all(
    records: &[ScoreRecord],
    vendors: Vec<String>,
    horizon: usize,
    config: &Config,
) -> anyhow::Result<Vec<(String, Vec<Prediction>)>> {
    vendors
        .into_iter()
        .map(|vendor| {
            let predictions = forecast_for(records, &vendor, horizon, config)?;
            Ok((vendor, predictions))
        })
        .collect()
}

fn worker_roster(
    records: &[ScoreRecord],
    vendor: &str,
    period: NaiveDate,
    config: &Config,
    count: usize,
) -> anyhow::Result<Vec<WorkerScore>> {
    let vendor_index = dataset::vendor_index(records, vendor)
        .with_context(|| format!("unknown vendor {vendor}"))?;
    let seed = mock::worker_seed(config.data.seed, vendor_index, period);
    Ok(mock::generate_worker_data(
        &mut StdRng::seed_from_u64(seed),
        count,
    ))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.data.seed = seed;
    }

    match cli.command {
        Commands::InitConfig { out } => {
            config.save(&out)?;
            println!("Configuration written to {}.", out.display());
        }
        Commands::Generate { out } => {
            let records = load_records(None, &config)?;
            dataset::write_csv(&out, &records)?;
            println!("Wrote {} records to {}.", records.len(), out.display());
        }
        Commands::Validate { file } => {
            let records = dataset::load_csv(&file)
                .with_context(|| format!("failed to import {}", file.display()))?;
            let stats = dataset::stats(&records);
            println!(
                "{} is valid: {} rows, {} vendors, {} months.",
                file.display(),
                stats.rows,
                stats.vendors,
                stats.months
            );
            for record in records.iter().take(10) {
                println!(
                    "- {} {} score {}",
                    record.vendor,
                    report::month_label(record.period),
                    record.score
                );
            }
        }
        Commands::Risk { score } => {
            let (tier, color) = risk::classify(score);
            println!("{score}: {tier} ({color})");
        }
        Commands::Predict {
            vendor,
            horizon,
            json,
        } => {
            let records = load_records(cli.csv.as_deref(), &config)?;
            let horizon = horizon.unwrap_or(config.forecast.horizon);
            let vendors = match vendor {
                Some(vendor) => vec![vendor],
                None => dataset::vendors(&records),
            };

            let forecasts = forecast_all(&records, vendors, horizon, &config)?;

            if json {
                let payload: Vec<serde_json::Value> = forecasts
                    .iter()
                    .map(|(vendor, predictions)| {
                        serde_json::json!({ "vendor": vendor, "predictions": predictions })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            for (vendor, predictions) in &forecasts {
                if predictions.is_empty() {
                    println!("{vendor}: not enough history for a forecast.");
                    continue;
                }
                println!("{vendor}:");
                for prediction in predictions {
                    let (tier, _) = risk::classify(prediction.predicted_score as f64);
                    println!(
                        "- {} score {} (confidence {}%, {})",
                        report::month_label(prediction.period),
                        prediction.predicted_score,
                        prediction.confidence,
                        tier
                    );
                }
            }
        }
        Commands::Workers {
            vendor,
            period,
            count,
        } => {
            let records = load_records(cli.csv.as_deref(), &config)?;
            let period = period
                .or_else(|| dataset::latest_period(&records))
                .context("dataset has no periods")?;
            let count = count.unwrap_or(config.workers.count);
            let workers = worker_roster(&records, &vendor, period, &config, count)?;

            let state = [
                Action::Navigate(Page::Workers),
                Action::SetTheme(config.ui.theme),
                Action::SelectVendor(vendor),
                Action::SelectPeriod(period),
            ]
            .into_iter()
            .fold(AppState::default(), app::reduce);
            print!(
                "{}",
                app::render(
                    &state,
                    &View {
                        records: &records,
                        forecast: &[],
                        workers: &workers,
                    }
                )
            );
        }
        Commands::Summary => {
            let records = load_records(cli.csv.as_deref(), &config)?;
            let summaries = report::summarize_vendors(&records);
            if summaries.is_empty() {
                println!("No vendors found.");
                return Ok(());
            }

            println!("Vendors by average score:");
            for summary in summaries {
                println!(
                    "- {} avg {:.1}, current {}, {} workers ({})",
                    summary.vendor,
                    summary.avg_score,
                    summary.current_score,
                    summary.total_workers,
                    summary.status
                );
            }
        }
        Commands::Report { out } => {
            let records = load_records(cli.csv.as_deref(), &config)?;
            let forecasts = forecast_all(
                &records,
                dataset::vendors(&records),
                config.forecast.horizon,
                &config,
            )?;
            let report = report::build_report(&records, &forecasts);
            std::fs::write(&out, report)
                .with_context(|| format!("write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { summary, detail } => {
            let records = load_records(cli.csv.as_deref(), &config)?;
            report::write_summary_csv(&summary, &records)?;
            report::write_detail_csv(&detail, &records)?;
            println!(
                "Summary written to {}, detail written to {}.",
                summary.display(),
                detail.display()
            );
        }
        Commands::View {
            page,
            theme,
            vendor,
            period,
        } => {
            let records = load_records(cli.csv.as_deref(), &config)?;

            let mut actions = vec![
                Action::SetTheme(config.ui.theme),
                Action::Navigate(page),
            ];
            if let Some(path) = cli.csv.clone() {
                actions.push(Action::UseUploaded(path));
            }
            if let Some(theme) = theme {
                actions.push(Action::SetTheme(theme));
            }
            if let Some(vendor) = vendor {
                dataset::vendor_index(&records, &vendor)
                    .with_context(|| format!("unknown vendor {vendor}"))?;
                actions.push(Action::SelectVendor(vendor));
            }
            if let Some(period) = period {
                actions.push(Action::SelectPeriod(period));
            }
            let state = actions.into_iter().fold(AppState::default(), app::reduce);

            let mut forecast = Vec::new();
            let mut workers = Vec::new();
            if let Some(vendor) = state.selected_vendor(&records) {
                match state.page {
                    Page::Predictions => {
                        forecast =
                            forecast_for(&records, &vendor, config.forecast.horizon, &config)?;
                    }
                    Page::Workers => {
                        if let Some(period) = state.selected_period(&records) {
                            workers = worker_roster(
                                &records,
                                &vendor,
                                period,
                                &config,
                                config.workers.count,
                            )?;
                        }
                    }
                    _ => {}
                }
            }

            print!(
                "{}",
                app::render(
                    &state,
                    &View {
                        records: &records,
                        forecast: &forecast,
                        workers: &workers,
                    }
                )
            );
        }
    }

    Ok(())
}
