use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use options_signal_bot::config::{self, Mode, Settings};
use options_signal_bot::emailer::{self, SmtpMailer};
use options_signal_bot::logging;
use options_signal_bot::scanner::{self, ScanReport};
use options_signal_bot::utility::timing::Timer;
use options_signal_bot::MassiveClient;
use tracing::{error, info};

fn banner(title: &str) {
    println!("{}", "=".repeat(60).blue());
    println!("{}", title.green().bold());
    println!("{}", "=".repeat(60).blue());
    println!();
}

fn print_report(report: &ScanReport) {
    println!("{}", "=".repeat(60).blue());
    println!("{}", "Summary".cyan().bold());
    println!("{}", "=".repeat(60).blue());

    for outcome in &report.outcomes {
        let trend = &outcome.trend;
        let rsi = trend.rsi.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "n/a".to_string());
        match &outcome.signal {
            Some(s) => println!(
                "  {} {} {} → {} {} {:.2} exp {} delta {:.2} mark {:.2}",
                "✓".green(),
                outcome.ticker.yellow(),
                trend.trend,
                s.option_symbol.as_deref().unwrap_or("n/a"),
                s.contract_type,
                s.strike_price,
                s.expiration_date,
                s.delta,
                s.mark
            ),
            None if trend.trend.is_directional() => println!(
                "  {} {} {} (rsi {}) no contract passed the filters",
                "·".blue(),
                outcome.ticker.yellow(),
                trend.trend,
                rsi
            ),
            None => println!("  {} {} {} (rsi {})", "·".blue(), outcome.ticker.yellow(), trend.trend, rsi),
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failed tickers:".red());
        for (ticker, err) in &report.failures {
            println!("  {} {} → {}", "✗".red(), ticker.yellow(), err.chars().take(80).collect::<String>());
        }
    }
    println!();
}

/// Scan every configured ticker; email the signals unless this is a dry run
async fn run_scan_mode(settings: &Settings, dry_run: bool) -> Result<()> {
    banner(if dry_run { "Options Signal Bot (dry run)" } else { "Options Signal Bot" });

    let client = MassiveClient::new(settings)?;
    let today = Local::now().date_naive();

    // Fail on bad mail config before spending API calls
    let mailer = if dry_run { None } else { Some(SmtpMailer::from_settings(settings)?) };

    println!("{} Scanning {} tickers as of {}", "→".cyan(), settings.tickers.len(), today);
    let timer = Timer::start("full scan");
    let report = scanner::run_scan(&client, &settings.tickers, today, settings).await;
    timer.stop();

    print_report(&report);

    let signals = report.signals();

    // Dry run always leaves signals.json behind, even with nothing to send
    let Some(mailer) = mailer else {
        if signals.is_empty() {
            println!("{} No signals found", "ℹ".blue());
        } else {
            println!("{}", emailer::build_email_text(&signals));
        }
        report.save(config::DRY_RUN_OUTPUT)?;
        println!("{} Saved report to {}", "✓".green(), config::DRY_RUN_OUTPUT);
        return Ok(());
    };

    if signals.is_empty() {
        info!("no signals this run");
        println!("{} No signals found", "ℹ".blue());
        return Ok(());
    }

    let html = emailer::build_email_html(&signals);
    let text = emailer::build_email_text(&signals);
    mailer.send(config::EMAIL_SUBJECT, html, text).await?;
    println!("{} Emailed {} signals", "✓".green(), signals.len());

    Ok(())
}

/// Scan one ticker and print the outcome; never emails
async fn run_single(settings: &Settings, ticker: &str) -> Result<()> {
    banner("Options Signal Bot (single ticker)");

    let client = MassiveClient::new(settings)?;
    let today = Local::now().date_naive();

    println!("{} Fetching {}...", "→".cyan(), ticker.yellow());
    let outcome = scanner::scan_ticker(&client, ticker, today, settings).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn run(mode: Mode, settings: Settings) -> Result<()> {
    settings.validate()?;

    match mode {
        Mode::Scan => run_scan_mode(&settings, false).await,
        Mode::DryRun => run_scan_mode(&settings, true).await,
        Mode::Single(ticker) => run_single(&settings, &ticker).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging(config::LOG_DIR)?;

    let mode = match config::get_execution_mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Set SIGNAL_MODE environment variable to control execution mode");
            eprintln!("Examples:");
            eprintln!("  SIGNAL_MODE=scan cargo run                       # Scan and email signals");
            eprintln!("  SIGNAL_MODE=dry-run cargo run                    # Scan, print, write signals.json");
            eprintln!("  SIGNAL_MODE=single SIGNAL_TICKER=AAPL cargo run  # Inspect one ticker");
            std::process::exit(1);
        }
    };

    let settings = Settings::from_env()?;

    if let Err(e) = run(mode, settings).await {
        let message = format!("{:#}", e);
        error!(error = %message, "run failed");
        return Err(e);
    }

    Ok(())
}
