//! Stratify CLI and Server Binary
//!
//! This is the main entry point for the Stratify application. It provides
//! commands for screening symbols, serving the HTTP API, and initializing
//! and validating configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Cli, Commands, LogFormatArg, OutputFormat};
use config::{generate_default_config, load_config, save_config, validate_config, StratifyConfig};
use market_data::provider_from_config;
use observability::{init_logging, init_metrics, LogFormat, ScreenerMetrics};
use server::{run_until_shutdown, HealthState, HttpServer, ServerConfig, ServerExt, ShutdownController};
use strategy_engine::api::{screener_routes, ApiState};
use strategy_engine::{ScreenRequest, ScreenResponse, Screener, StrategyCandidate, SymbolReport};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Screen {
            symbols,
            config,
            max_days,
            top_n,
            otm_percent,
            spread_width,
            format,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => generate_default_config(),
            };
            start_logging(cli.log_format, &config)?;
            info!("Executing 'screen' command");

            let mut request = ScreenRequest::new(if symbols.is_empty() {
                config.watchlist.clone()
            } else {
                symbols
            });
            request.max_days = max_days;
            request.top_n = top_n;
            request.otm_percent = otm_percent;
            request.spread_width = spread_width;
            screen_command(&config, request, format).await
        }
        Commands::Serve { config, http } => {
            let config = load_config(&config)?;
            start_logging(cli.log_format, &config)?;
            info!("Executing 'serve' command");
            serve_command(&config, http).await
        }
        Commands::Validate { config } => {
            init_logging("stratify", cli_log_format(cli.log_format))?;
            info!("Executing 'validate' command");
            validate_command(config).await
        }
        Commands::Init { output } => {
            init_logging("stratify", cli_log_format(cli.log_format))?;
            info!("Executing 'init' command");
            init_command(output).await
        }
    }
}

fn cli_log_format(arg: Option<LogFormatArg>) -> LogFormat {
    arg.and_then(|f| LogFormat::parse(f.as_str()))
        .unwrap_or_default()
}

/// The CLI flag wins over the config file
fn start_logging(arg: Option<LogFormatArg>, config: &StratifyConfig) -> Result<()> {
    let format = match arg {
        Some(_) => cli_log_format(arg),
        None => LogFormat::parse(&config.logging.format).unwrap_or_default(),
    };
    init_logging("stratify", format)?;
    debug!(%format, "Logging initialized");
    Ok(())
}

/// Refuse to run on an invalid configuration, logging warnings
fn ensure_valid(config: &StratifyConfig) -> Result<()> {
    let report = validate_config(config);

    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start due to configuration errors");
    }
    Ok(())
}

fn build_screener(config: &StratifyConfig, scope: &str) -> Result<Screener> {
    ensure_valid(config)?;

    if config.metrics.enabled {
        init_metrics(config.metrics.port).context("Failed to start metrics exporter")?;
    }

    let provider =
        provider_from_config(&config.provider).context("Failed to build market data provider")?;
    info!(provider = provider.name(), "Market data provider ready");

    Ok(Screener::from_config(provider, config).with_metrics(ScreenerMetrics::new(scope)))
}

async fn screen_command(
    config: &StratifyConfig,
    request: ScreenRequest,
    format: OutputFormat,
) -> Result<()> {
    let screener = build_screener(config, "cli")?;
    let as_of = Utc::now().date_naive();
    info!(symbols = request.symbols().len(), %as_of, "Screening");

    let shutdown = ShutdownController::with_ctrl_c();
    let Some(response) = run_until_shutdown(shutdown.token(), screener.screen(&request, as_of)).await
    else {
        warn!("Screening interrupted");
        return Ok(());
    };
    let response = response.context("Invalid screening request")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Table => print_table(&response),
    }
    Ok(())
}

fn print_table(response: &ScreenResponse) {
    for report in &response.results {
        println!("\n=== {} ===", report.symbol());
        match report {
            SymbolReport::Failed { error, .. } => println!("  [error] {}", error),
            SymbolReport::Ranked { strategies, .. } if strategies.is_empty() => {
                println!("  no strategies passed the filters")
            }
            SymbolReport::Ranked { strategies, .. } => {
                println!(
                    "  {:>2}  {:<17} {:<10} {:>4}  {:<22} {:>8} {:>8} {:>8} {:>8} {:>6} {:>6} {:>5} {:>6}",
                    "#",
                    "strategy",
                    "expiry",
                    "dte",
                    "strikes",
                    "premium",
                    "max_gain",
                    "max_loss",
                    "roi%",
                    "p_max",
                    "p_any",
                    "risk",
                    "score"
                );
                for (i, c) in strategies.iter().enumerate() {
                    print_row(i + 1, c);
                }
            }
        }

        if !report.skipped().is_empty() {
            let skipped: Vec<String> = report
                .skipped()
                .iter()
                .map(|(reason, count)| format!("{}={}", reason, count))
                .collect();
            println!("  skipped: {}", skipped.join(" "));
        }
    }
    println!();
}

fn print_row(rank: usize, c: &StrategyCandidate) {
    let strikes = match (&c.short_strike, &c.long_strike) {
        (Some(short), Some(long)) => format!("{} / {}", short, long),
        (Some(short), None) => short.clone(),
        (None, Some(long)) => long.clone(),
        (None, None) => "-".to_string(),
    };
    let max_gain = c
        .max_profit
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "unltd".to_string());
    let flag = if c.earnings_before_expiry { " E" } else { "" };
    println!(
        "  {:>2}  {:<17} {:<10} {:>4}  {:<22} {:>8.2} {:>8} {:>8.2} {:>8.2} {:>6.1} {:>6.1} {:>5.1} {:>6.2}{}",
        rank,
        c.strategy.display_name(),
        c.expiration.to_string(),
        c.days_to_expiry,
        strikes,
        c.net_premium,
        max_gain,
        c.max_loss,
        c.roi_percent,
        c.prob_max_profit,
        c.prob_any_profit,
        c.risk_score,
        c.composite_score,
        flag
    );
}

async fn serve_command(config: &StratifyConfig, http_override: Option<u16>) -> Result<()> {
    let screener = Arc::new(build_screener(config, "api")?);

    let mut server_config = ServerConfig::from(&config.server);
    if let Some(port) = http_override {
        server_config = server_config.with_http_port(port);
    } else {
        debug!(port = config.server.http_port, "Using configured HTTP port");
    }

    let health = Arc::new(HealthState::new("stratify").with_provider(screener.provider_name()));
    let api = screener_routes(Arc::new(ApiState::new(screener)));
    let server = HttpServer::with_api(server_config.clone(), api, health);

    info!(
        host = %server_config.host,
        http_port = ?server_config.http_port,
        "Starting screener API"
    );

    // Start server with graceful shutdown (Ctrl+C handling)
    server.run_with_ctrl_c().await?;

    Ok(())
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Provider: {}", config.provider.kind);
    println!("Watchlist: {} symbols", config.watchlist.len());
    println!(
        "Window: {} days, top {} per symbol",
        config.engine.max_days, config.engine.top_n
    );
    println!(
        "Weights: probability {:.2}, roi {:.2}, risk {:.2}",
        config.scoring.probability_weight, config.scoring.roi_weight, config.scoring.risk_weight
    );

    Ok(())
}

async fn init_command(output_path: PathBuf) -> Result<()> {
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, &output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit the watchlist and scoring weights");
    println!(
        "  2. Run 'stratify validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  3. Run 'stratify screen --config {:?}' or 'stratify serve --config {:?}'",
        output_path, output_path
    );

    Ok(())
}
