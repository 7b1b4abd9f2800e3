//! smstat - SMS and country fee statistics

mod cli;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use smstat_core::config::Backend;
use smstat_core::{export_stats_to_csv, export_stats_to_json, Config, MatchPolicy, SmsService};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{CliError, ShellCommand, StatsQuery};

#[derive(Parser)]
#[command(
    name = "smstat",
    version,
    about = "SMS traffic and country fee statistics",
    long_about = "Records country fees and outbound SMS, classifies each message by the\n\
                  country code prefix of its recipient and reports per-sender and\n\
                  per-country statistics.\n\
                  \n\
                  Examples:\n\
                    smstat fee 1 USA 0.10              # Register a country fee\n\
                    smstat sms alice 15551234567 hi    # Record a message\n\
                    smstat stats                       # Per-country counts and fees\n\
                    smstat stats -s -n 10 --with-fees  # Top 10 senders with fee totals\n\
                    smstat import traffic.jsonl        # Bulk load JSONL records\n\
                    smstat shell                       # Interactive session\n\
                  \n\
                  Environment Variables:\n\
                    SMSTAT_DB                          # Override database path\n\
                    SMSTAT_WITH_FEES                   # Include fee totals in top senders\n\
                    SMSTAT_NO_COLOR                    # Disable ANSI colors (log-friendly)\n\
                    SMSTAT_LOG, RUST_LOG               # Log filter (overrides config)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Path to config file (default: <config_dir>/smstat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true, env = "SMSTAT_DB")]
    db: Option<PathBuf>,

    /// Keep records in memory only (lost on exit)
    #[arg(long, global = true, conflicts_with = "db")]
    memory: bool,

    /// Include fee totals in top senders output (`--with-fees=false` turns them off)
    #[arg(
        long,
        global = true,
        env = "SMSTAT_WITH_FEES",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    with_fees: Option<bool>,

    /// Recipient matching: first_match, longest_prefix or strict
    #[arg(long, global = true)]
    match_policy: Option<String>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "SMSTAT_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Register a country fee
    Fee {
        /// Numeric country code prefix
        code: String,
        /// Country name
        country: String,
        /// Fee per message
        fee: String,
    },
    /// Record an SMS
    Sms {
        sender: String,
        recipient: String,
        /// Message text
        text: Vec<String>,
    },
    /// Import JSONL records
    Import {
        /// File with one record per line
        file: PathBuf,
    },
    /// Print statistics
    Stats {
        /// Per-country message count and fee total (default)
        #[arg(short = 'c', long, conflicts_with = "senders")]
        countries: bool,
        /// Top senders by message count
        #[arg(short = 's', long)]
        senders: bool,
        /// Number of top senders (default from config)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Write rows to a .csv or .json file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Interactive shell on stdin
    Shell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    init_tracing(&config.logging.level);
    debug!(
        backend = ?config.storage.backend,
        policy = %config.stats.match_policy,
        "Configuration resolved"
    );

    let service = config
        .build_service()
        .context("Failed to open record store")?;
    let no_color = cli.no_color;

    match cli.mode {
        Mode::Fee { code, country, fee } => {
            let record = cli::country_fee_record(&code, &country, &fee)?;
            if service.save_entity(record)? {
                println!("Registered country code {} ({})", code, country);
            } else {
                println!("Country code {} is already registered", code);
            }
        }
        Mode::Sms {
            sender,
            recipient,
            text,
        } => {
            service.save_entity(cli::sms_record(&sender, &recipient, &text))?;
            println!("Recorded SMS from {} to {}", sender, recipient);
        }
        Mode::Import { file } => {
            run_import(&service, &file)?;
        }
        Mode::Stats {
            senders,
            limit,
            json,
            export,
            ..
        } => {
            let query = if senders {
                StatsQuery::TopSenders(limit)
            } else {
                StatsQuery::Countries
            };
            let rows = run_stats(&service, &config, query, json, no_color)?;
            if let Some(path) = export {
                export_rows(&rows, &path)?;
                println!("Exported {} rows to {}", rows.len(), path.display());
            }
        }
        Mode::Shell => {
            run_shell(&service, &config, no_color)?;
        }
    }

    Ok(())
}

/// Config file plus command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    apply_overrides(cli, &mut config)?;
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if cli.memory {
        config.storage.backend = Backend::Memory;
    } else if let Some(db) = &cli.db {
        config.storage.backend = Backend::Sqlite;
        config.storage.path = Some(db.clone());
    }
    if let Some(enabled) = cli.with_fees {
        config.stats.country_fee_enabled = enabled;
    }
    if let Some(policy) = &cli.match_policy {
        config.stats.match_policy = policy.parse::<MatchPolicy>()?;
    }
    Ok(())
}

/// Logs go to stderr; `SMSTAT_LOG` or `RUST_LOG` win over the configured level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("SMSTAT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_import(service: &SmsService, file: &Path) -> Result<()> {
    let report = smstat_core::import_jsonl(service, file)?;
    println!("{}", cli::format_import_report(&report));

    if report.has_fatal_errors() {
        bail!("Import aborted: record store unavailable");
    }

    println!("{}", cli::format_totals(&service.totals()?));
    Ok(())
}

fn run_stats(
    service: &SmsService,
    config: &Config,
    query: StatsQuery,
    json: bool,
    no_color: bool,
) -> Result<Vec<smstat_core::StatsRow>, CliError> {
    let (rows, header) = match query {
        StatsQuery::Countries => (service.country_fee_stats()?, "Country"),
        StatsQuery::TopSenders(limit) => {
            let limit = limit.unwrap_or(config.stats.top_senders_limit);
            (service.top_senders_stats(limit)?, "Sender")
        }
    };

    println!("{}", cli::format_stats_table(&rows, header, json, no_color));
    Ok(rows)
}

fn export_rows(rows: &[smstat_core::StatsRow], path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => export_stats_to_json(rows, path),
        _ => export_stats_to_csv(rows, path),
    }
}

fn run_shell(service: &SmsService, config: &Config, no_color: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    println!("smstat shell ({} store). Type 'help' for commands.", service.store().backend());

    let mut line = String::new();
    loop {
        print!("> ");
        stdout.flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            break;
        }

        match handle_shell_line(service, config, &line, no_color) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

/// Run one shell line; `Ok(false)` ends the session
fn handle_shell_line(
    service: &SmsService,
    config: &Config,
    line: &str,
    no_color: bool,
) -> Result<bool, CliError> {
    match cli::parse_shell_line(line)? {
        ShellCommand::Fee(record) => {
            if service.save_entity(record)? {
                println!("ok");
            } else {
                println!("country code already registered");
            }
        }
        ShellCommand::Sms(record) => {
            service.save_entity(record)?;
            println!("ok");
        }
        ShellCommand::Stats(query) => {
            run_stats(service, config, query, false, no_color)?;
        }
        ShellCommand::Fees(enabled) => {
            service.set_country_fee_enabled(enabled);
            println!("fee totals {}", if enabled { "on" } else { "off" });
        }
        ShellCommand::Help => println!("{}", cli::SHELL_HELP),
        ShellCommand::StatsHelp => println!("{}", cli::STATS_HELP),
        ShellCommand::Exit => return Ok(false),
        ShellCommand::Empty => {}
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overridden(args: &[&str], mut config: Config) -> Config {
        let cli = Cli::try_parse_from(args).unwrap();
        apply_overrides(&cli, &mut config).unwrap();
        config
    }

    #[test]
    fn test_with_fees_flag_forms() {
        let config = overridden(&["smstat", "stats", "--with-fees"], Config::default());
        assert!(config.stats.country_fee_enabled);

        let config = overridden(&["smstat", "--with-fees=true", "stats"], Config::default());
        assert!(config.stats.country_fee_enabled);
    }

    #[test]
    fn test_with_fees_false_overrides_config() {
        let mut enabled = Config::default();
        enabled.stats.country_fee_enabled = true;

        let config = overridden(&["smstat", "stats", "--with-fees=false"], enabled.clone());
        assert!(!config.stats.country_fee_enabled);

        // Absent flag keeps the file value
        let config = overridden(&["smstat", "stats"], enabled);
        assert!(config.stats.country_fee_enabled);
    }

    #[test]
    fn test_storage_and_policy_overrides() {
        let config = overridden(
            &["smstat", "--memory", "--match-policy", "longest", "stats", "-s"],
            Config::default(),
        );
        assert_eq!(config.storage.backend, Backend::Memory);
        assert_eq!(config.stats.match_policy, MatchPolicy::LongestPrefix);

        let cli = Cli::try_parse_from(["smstat", "--match-policy", "widest", "stats"]).unwrap();
        assert!(apply_overrides(&cli, &mut Config::default()).is_err());
    }
}
