//! Dashboard state and text rendering.
//!
//! State changes go through [`reduce`]; [`render`] draws a page from the
//! current state and the data the caller loaded for it.

use std::fmt::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::dataset::{self, REQUIRED_COLUMNS};
use crate::forecast::{month_start, TrendDirection};
use crate::models::{Prediction, ScoreRecord, WorkerScore};
use crate::report::{self, month_label};
use crate::risk;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Page {
    #[default]
    Dashboard,
    MultiVendor,
    Predictions,
    Workers,
    Reports,
    Settings,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::MultiVendor => "Multi Vendor",
            Page::Predictions => "Predictions",
            Page::Workers => "Workers",
            Page::Reports => "Reports",
            Page::Settings => "Settings",
        }
    }

    pub fn subtitle(&self) -> String {
        match self {
            Page::Dashboard => "Vendor Monitoring System".to_string(),
            other => format!("{} Management", other.title()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub card: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: "#1a1d29",
                card: "#232734",
                text: "#ffffff",
                text_secondary: "#8b92b0",
                border: "#2d3348",
                accent: "#5b7cfa",
            },
            Theme::Light => Palette {
                background: "#f5f7fa",
                card: "#ffffff",
                text: "#2d3748",
                text_secondary: "#718096",
                border: "#e2e8f0",
                accent: "#5b7cfa",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Mock,
    Uploaded(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub page: Page,
    pub theme: Theme,
    pub source: DataSource,
    pub vendor: Option<String>,
    pub period: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(Page),
    ToggleTheme,
    SetTheme(Theme),
    UseUploaded(PathBuf),
    ResetData,
    SelectVendor(String),
    SelectPeriod(NaiveDate),
}

pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        Action::Navigate(page) => AppState { page, ..state },
        Action::ToggleTheme => AppState {
            theme: state.theme.toggled(),
            ..state
        },
        Action::SetTheme(theme) => AppState { theme, ..state },
        // selections refer to the old dataset
        Action::UseUploaded(path) => AppState {
            source: DataSource::Uploaded(path),
            vendor: None,
            period: None,
            ..state
        },
        Action::ResetData => AppState {
            source: DataSource::Mock,
            vendor: None,
            period: None,
            ..state
        },
        Action::SelectVendor(vendor) => AppState {
            vendor: Some(vendor),
            ..state
        },
        Action::SelectPeriod(period) => AppState {
            period: Some(month_start(period)),
            ..state
        },
    }
}

impl AppState {
    /// The selected vendor, falling back to the first vendor in the data.
    pub fn selected_vendor(&self, records: &[ScoreRecord]) -> Option<String> {
        self.vendor
            .clone()
            .or_else(|| dataset::vendors(records).into_iter().next())
    }

    /// The selected month, falling back to the latest month in the data.
    pub fn selected_period(&self, records: &[ScoreRecord]) -> Option<NaiveDate> {
        self.period.or_else(|| dataset::latest_period(records))
    }
}

/// Data loaded for one render pass.
pub struct View<'a> {
    pub records: &'a [ScoreRecord],
    pub forecast: &'a [Prediction],
    pub workers: &'a [WorkerScore],
}

pub fn render(state: &AppState, view: &View<'_>) -> String {
    let mut output = String::new();
    let palette = state.theme.palette();

    let _ = writeln!(output, "== {} ==", state.page.title());
    let _ = writeln!(output, "{}", state.page.subtitle());
    let _ = writeln!(
        output,
        "theme {:?} (background {}, card {}, text {}/{}, border {}, accent {})",
        state.theme,
        palette.background,
        palette.card,
        palette.text,
        palette.text_secondary,
        palette.border,
        palette.accent
    );
    let _ = writeln!(output);

    match state.page {
        Page::Dashboard => render_dashboard(&mut output, state, view),
        Page::MultiVendor => render_multi_vendor(&mut output, view),
        Page::Predictions => render_predictions(&mut output, state, view),
        Page::Workers => render_workers(&mut output, state, view),
        Page::Reports => render_reports(&mut output, view),
        Page::Settings => render_settings(&mut output, state),
    }

    output
}

fn badge(score: f64) -> String {
    let (tier, color) = risk::classify(score);
    format!("[{} {}]", tier, color)
}

fn render_dashboard(output: &mut String, state: &AppState, view: &View<'_>) {
    let (Some(vendor), Some(period)) = (
        state.selected_vendor(view.records),
        state.selected_period(view.records),
    ) else {
        let _ = writeln!(output, "No vendor data loaded.");
        return;
    };

    let _ = writeln!(output, "Vendor: {}  Period: {}", vendor, month_label(period));
    match dataset::find(view.records, &vendor, period) {
        Some(record) => {
            let (tier, _) = risk::classify(record.score);
            let _ = writeln!(output, "Total Workers:    {}", record.worker_count);
            let _ = writeln!(output, "Evaluation Score: {}", record.score);
            let _ = writeln!(output, "BPJS Compliance:  {}%", record.bpjs_compliance());
            let _ = writeln!(output, "Risk Status:      {} {}", tier, badge(record.score));
        }
        None => {
            let _ = writeln!(output, "No record for this vendor and period.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Score history:");
    for record in dataset::vendor_series(view.records, &vendor) {
        let _ = writeln!(
            output,
            "  {:<15} {:>5}  THP {}%  attendance {}%  THR {}%  DPSLK {}%",
            month_label(record.period),
            record.score,
            record.overtime_pay,
            record.attendance,
            record.holiday_bonus,
            record.labor_fund
        );
    }
}

fn render_multi_vendor(output: &mut String, view: &View<'_>) {
    let Some(latest) = dataset::latest_period(view.records) else {
        let _ = writeln!(output, "No vendor data loaded.");
        return;
    };

    let _ = writeln!(output, "Latest period: {}", month_label(latest));
    for vendor in dataset::vendors(view.records) {
        match dataset::find(view.records, &vendor, latest) {
            Some(record) => {
                let _ = writeln!(
                    output,
                    "- {} | {} workers | score {} {} | BPJS {}%",
                    vendor,
                    record.worker_count,
                    record.score,
                    badge(record.score),
                    record.bpjs_compliance()
                );
            }
            None => {
                let _ = writeln!(output, "- {} | no data for {}", vendor, month_label(latest));
            }
        }
    }
}

fn render_predictions(output: &mut String, state: &AppState, view: &View<'_>) {
    let Some(vendor) = state.selected_vendor(view.records) else {
        let _ = writeln!(output, "No vendor data loaded.");
        return;
    };
    let series = dataset::vendor_series(view.records, &vendor);
    let (Some(current), Some(next)) = (series.last(), view.forecast.first()) else {
        let _ = writeln!(output, "{}: not enough history for a forecast.", vendor);
        return;
    };

    let change = next.predicted_score as f64 - current.score;
    let direction = TrendDirection::between(current.score, next.predicted_score as f64);
    let _ = writeln!(output, "Vendor: {}", vendor);
    let _ = writeln!(output, "Current Score: {} {}", current.score, badge(current.score));
    let _ = writeln!(
        output,
        "Trend: {} {} ({})",
        direction.arrow(),
        change.abs(),
        direction.label()
    );
    let _ = writeln!(output);
    for prediction in view.forecast {
        let _ = writeln!(
            output,
            "  {:<15} {:>3}  confidence {}%  {}",
            month_label(prediction.period),
            prediction.predicted_score,
            prediction.confidence,
            badge(prediction.predicted_score as f64)
        );
    }
}

fn render_workers(output: &mut String, state: &AppState, view: &View<'_>) {
    if let (Some(vendor), Some(period)) = (
        state.selected_vendor(view.records),
        state.selected_period(view.records),
    ) {
        let _ = writeln!(output, "Vendor: {}  Period: {}", vendor, month_label(period));
    }

    let Some(stats) = report::worker_stats(view.workers) else {
        let _ = writeln!(output, "No workers to show.");
        return;
    };
    let _ = writeln!(output, "Total Workers: {}", stats.total);
    let _ = writeln!(output, "Average:       {:.1}", stats.average);
    let _ = writeln!(output, "Highest:       {}", stats.highest);
    let _ = writeln!(output, "Lowest:        {}", stats.lowest);

    let _ = writeln!(output);
    for worker in view.workers {
        let _ = writeln!(output, "  {:<12} {}", worker.name, worker.score);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Score distribution:");
    for (edge, count) in report::score_histogram(view.workers, 10) {
        let _ = writeln!(output, "  {:>5.1} {}", edge, "#".repeat(count));
    }
}

fn render_reports(output: &mut String, view: &View<'_>) {
    let summaries = report::summarize_vendors(view.records);
    if summaries.is_empty() {
        let _ = writeln!(output, "No vendors recorded.");
        return;
    }

    let _ = writeln!(
        output,
        "{:<24} {:>7} {:>9} {:>7}  {:<12} {:>7} {:>8}",
        "Vendor", "Workers", "Avg Score", "Current", "Status", "BPJS TK", "BPJS KES"
    );
    for summary in summaries {
        let _ = writeln!(
            output,
            "{:<24} {:>7} {:>9.1} {:>7}  {:<12} {:>6}% {:>7}%",
            summary.vendor,
            summary.total_workers,
            summary.avg_score,
            summary.current_score,
            summary.status.label(),
            summary.bpjs_tk,
            summary.bpjs_kes
        );
    }
}

fn render_settings(output: &mut String, state: &AppState) {
    match &state.source {
        DataSource::Mock => {
            let _ = writeln!(output, "Data source: generated mock data");
        }
        DataSource::Uploaded(path) => {
            let _ = writeln!(output, "Data source: {}", path.display());
        }
    }
    let _ = writeln!(output, "Theme: {:?}", state.theme);
    let _ = writeln!(output);
    let _ = writeln!(output, "Required import format:");
    let _ = writeln!(output, "  columns: {}", REQUIRED_COLUMNS.join(", "));
    let _ = writeln!(output, "  date format: YYYY-MM-DD");
    let _ = writeln!(output, "  score and percentage values: 0-100");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, month, 1).expect("valid month")
    }

    fn record(vendor: &str, period: NaiveDate, score: f64) -> ScoreRecord {
        ScoreRecord {
            vendor: vendor.to_string(),
            period,
            score,
            worker_count: 110,
            attendance: 93.0,
            overtime_pay: 90.0,
            holiday_bonus: 86.0,
            social_insurance_tk: 81.0,
            social_insurance_health: 84.0,
            labor_fund: 77.0,
        }
    }

    fn records() -> Vec<ScoreRecord> {
        vec![
            record("PT PMS", month(6), 80.0),
            record("PT PMS", month(7), 86.0),
            record("PT MAKMUR ABADI", month(6), 68.0),
            record("PT MAKMUR ABADI", month(7), 72.0),
        ]
    }

    #[test]
    fn default_state_opens_dark_dashboard_on_mock_data() {
        let state = AppState::default();
        assert_eq!(state.page, Page::Dashboard);
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(state.source, DataSource::Mock);
    }

    #[test]
    fn actions_update_only_their_field() {
        let state = reduce(AppState::default(), Action::Navigate(Page::Predictions));
        assert_eq!(state.page, Page::Predictions);
        assert_eq!(state.theme, Theme::Dark);

        let state = reduce(state, Action::ToggleTheme);
        assert_eq!(state.theme, Theme::Light);
        let state = reduce(state, Action::ToggleTheme);
        assert_eq!(state.theme, Theme::Dark);
        let state = reduce(state, Action::SetTheme(Theme::Light));
        assert_eq!(state.theme, Theme::Light);
        assert_eq!(state.page, Page::Predictions);
    }

    #[test]
    fn switching_data_clears_selection() {
        let state = reduce(AppState::default(), Action::SelectVendor("PT PMS".into()));
        let state = reduce(
            state,
            Action::SelectPeriod(NaiveDate::from_ymd_opt(2023, 7, 19).expect("valid")),
        );
        assert_eq!(state.period, Some(month(7)));

        let uploaded = reduce(state.clone(), Action::UseUploaded(PathBuf::from("vendors.csv")));
        assert_eq!(uploaded.source, DataSource::Uploaded(PathBuf::from("vendors.csv")));
        assert_eq!(uploaded.vendor, None);
        assert_eq!(uploaded.period, None);

        let reset = reduce(uploaded, Action::ResetData);
        assert_eq!(reset.source, DataSource::Mock);
    }

    #[test]
    fn selection_falls_back_to_data() {
        let state = AppState::default();
        let data = records();
        assert_eq!(state.selected_vendor(&data).as_deref(), Some("PT PMS"));
        assert_eq!(state.selected_period(&data), Some(month(7)));
        assert_eq!(state.selected_vendor(&[]), None);
    }

    #[test]
    fn dashboard_shows_selected_metrics() {
        let data = records();
        let state = reduce(AppState::default(), Action::SelectVendor("PT MAKMUR ABADI".into()));
        let page = render(
            &state,
            &View {
                records: &data,
                forecast: &[],
                workers: &[],
            },
        );
        assert!(page.contains("== Dashboard =="));
        assert!(page.contains("Vendor Monitoring System"));
        assert!(page.contains("Vendor: PT MAKMUR ABADI  Period: July 2023"));
        assert!(page.contains("BPJS Compliance:  82%"));
        assert!(page.contains("Risk Status:      Medium Risk [Medium Risk #f59e0b]"));
    }

    #[test]
    fn multi_vendor_lists_latest_cards() {
        let data = records();
        let state = reduce(AppState::default(), Action::Navigate(Page::MultiVendor));
        let page = render(
            &state,
            &View {
                records: &data,
                forecast: &[],
                workers: &[],
            },
        );
        assert!(page.contains("Multi Vendor Management"));
        assert!(page.contains("- PT PMS | 110 workers | score 86 [Low Risk #10b981] | BPJS 82%"));
        assert!(page.contains("- PT MAKMUR ABADI | 110 workers | score 72 [Medium Risk #f59e0b]"));
    }

    #[test]
    fn predictions_page_shows_direction() {
        let data = records();
        let forecast = vec![Prediction {
            period: month(8),
            predicted_score: 83,
            confidence: 81,
        }];
        let state = reduce(AppState::default(), Action::Navigate(Page::Predictions));
        let page = render(
            &state,
            &View {
                records: &data,
                forecast: &forecast,
                workers: &[],
            },
        );
        assert!(page.contains("Current Score: 86 [Low Risk #10b981]"));
        assert!(page.contains("Trend: ↓ 3 (Decreasing)"));
        assert!(page.contains("August 2023"));
        assert!(page.contains("confidence 81%"));

        let empty = render(
            &state,
            &View {
                records: &data,
                forecast: &[],
                workers: &[],
            },
        );
        assert!(empty.contains("PT PMS: not enough history for a forecast."));
    }

    #[test]
    fn workers_and_settings_pages_render() {
        let data = records();
        let workers = vec![
            WorkerScore {
                name: "Pekerja 1".into(),
                score: 74,
            },
            WorkerScore {
                name: "Pekerja 2".into(),
                score: 90,
            },
        ];
        let state = reduce(AppState::default(), Action::Navigate(Page::Workers));
        let page = render(
            &state,
            &View {
                records: &data,
                forecast: &[],
                workers: &workers,
            },
        );
        assert!(page.contains("Total Workers: 2"));
        assert!(page.contains("Average:       82.0"));

        let state = reduce(state, Action::Navigate(Page::Settings));
        let state = reduce(state, Action::ToggleTheme);
        let page = render(
            &state,
            &View {
                records: &data,
                forecast: &[],
                workers: &[],
            },
        );
        assert!(page.contains("Settings Management"));
        assert!(page.contains("background #f5f7fa"));
        assert!(page.contains("columns: vendor, period, score"));
    }

    #[test]
    fn reports_page_tabulates_summaries() {
        let data = records();
        let state = reduce(AppState::default(), Action::Navigate(Page::Reports));
        let page = render(
            &state,
            &View {
                records: &data,
                forecast: &[],
                workers: &[],
            },
        );
        assert!(page.contains("PT PMS"));
        assert!(page.contains("Low Risk") || page.contains("Medium Risk"));
        assert!(page.contains("83.0"));
    }
}
