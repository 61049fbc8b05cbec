use anyhow::Result;
use clap::{Parser, Subcommand};
use defrost_service::{
    config::AppConfig,
    http::{self, AppState},
    loader::LoaderCache,
    metrics_server, observability,
    report::{build_report, parse_date, render_text, ReportMode, ReportRequest},
};
use time::Date;

#[derive(Parser)]
#[command(name = "defrost-report", version, about = "Defrost efficiency and temperature compliance reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a report for the configured zone exports.
    Report {
        /// First day of the period (YYYY-MM-DD); defaults to the earliest reading.
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<Date>,

        /// Last day of the period, inclusive; defaults to the latest reading.
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<Date>,

        /// Tolerance around the setpoint, in K.
        #[arg(long)]
        delta: Option<f64>,

        #[arg(long, value_enum, default_value_t = ReportMode::All)]
        mode: ReportMode,

        /// Zones to analyze; repeatable. All configured zones by default.
        #[arg(long)]
        zone: Vec<String>,

        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Serve reports over HTTP.
    Serve,
}

fn parse_date_arg(s: &str) -> Result<Date, String> {
    parse_date(s).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    match cli.command {
        Command::Report {
            start,
            end,
            delta,
            mode,
            zone,
            json,
        } => {
            let loaded = LoaderCache::new()
                .get_or_load(&cfg.zones, &cfg.csv_options())
                .await?;
            let request = ReportRequest {
                start,
                end,
                delta_k: delta,
                mode,
                zones: zone,
            };
            let report = build_report(
                &loaded,
                &cfg.zones(),
                &cfg.engine(),
                cfg.temperature.default_delta_k,
                &request,
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }
        Command::Serve => {
            let bind_addr = cfg
                .server
                .as_ref()
                .map(|s| s.bind_addr.clone())
                .ok_or_else(|| anyhow::anyhow!("[server] section with bind_addr is required to serve"))?;
            http::serve(&bind_addr, AppState::new(cfg)).await?;
        }
    }

    Ok(())
}
