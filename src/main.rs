mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::CampaignDashApp;
use clap::Parser;
use eframe::egui;

use data::group::compute_grouped_metrics_by;
use data::kpi::Measure;
use data::report::Report;
use data::store::DatasetStore;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "campaign-dash")]
#[command(about = "Marketing campaign performance dashboard")]
#[command(version)]
struct Cli {
    /// Campaign dataset to load at startup (.csv, .json or .parquet)
    #[arg(env = "CAMPAIGN_DASH_DATA")]
    data: Option<PathBuf>,

    /// Initial number of campaigns in the ranking view
    #[arg(long, env = "CAMPAIGN_DASH_TOP_N", default_value_t = 10, value_parser = parse_top_n)]
    top_n: usize,

    /// Measure the ranking view sorts by
    #[arg(long, default_value = "conversions")]
    rank_by: Measure,

    /// Print the KPI report as JSON and exit instead of opening a window
    #[arg(long, default_value_t = false, requires = "data")]
    report: bool,

    /// With --report, print only the groups for this key
    /// (campaign, channel, age_group, gender, location, month)
    #[arg(long, requires = "report")]
    group_by: Option<String>,

    /// Initial window width
    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 860.0)]
    height: f32,
}

fn parse_top_n(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.report {
        return print_report(&cli);
    }

    let mut state = AppState::new(cli.top_n);
    state.ranking_measure = cli.rank_by;
    if let Some(path) = cli.data.clone() {
        // A bad startup file is reported in the status bar, not fatal.
        state.open_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cli.width, cli.height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Marketing Campaign Performance Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(CampaignDashApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard window: {e}"))
}

fn print_report(cli: &Cli) -> anyhow::Result<()> {
    let path = cli.data.as_deref().context("--report needs a data file")?;
    let store = DatasetStore::open(path)
        .with_context(|| format!("loading {}", path.display()))?;
    let dataset = store.snapshot();

    let json = match &cli.group_by {
        Some(key) => {
            let groups = compute_grouped_metrics_by(&dataset, key)?;
            serde_json::to_string_pretty(&groups)
        }
        None => Report::build(&dataset, cli.rank_by, cli.top_n).to_json(),
    }
    .context("serializing report")?;

    println!("{json}");
    Ok(())
}
