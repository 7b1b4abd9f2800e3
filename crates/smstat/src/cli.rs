//! Command helpers shared by one-shot subcommands and the interactive shell
//!
//! Provides the shell line parser, record builders and table formatters.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table};
use rust_decimal::Decimal;
use smstat_core::error::{ErrorSeverity, ImportReport};
use smstat_core::stats::Totals;
use smstat_core::{CountryFee, Record, Sms, StatsRow};
use std::str::FromStr;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    UnknownCommand { input: String },
    Usage { usage: &'static str },
    Core(smstat_core::CoreError),
    Other(anyhow::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::UnknownCommand { input } => {
                write!(f, "Unknown command '{}' (type 'help' for a list)", input)
            }
            CliError::Usage { usage } => write!(f, "Usage: {}", usage),
            CliError::Core(e) => write!(f, "{}", e),
            CliError::Other(e) => write!(f, "{:#}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<smstat_core::CoreError> for CliError {
    fn from(e: smstat_core::CoreError) -> Self {
        CliError::Core(e)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        CliError::Other(e)
    }
}

// ============================================================================
// Record Builders
// ============================================================================

pub fn parse_fee(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).with_context(|| format!("Invalid fee amount '{}'", raw))
}

pub fn country_fee_record(code: &str, country: &str, fee: &str) -> Result<Record> {
    Ok(CountryFee::new(code, country, parse_fee(fee)?).into())
}

pub fn sms_record(sender: &str, recipient: &str, text: &[String]) -> Record {
    Sms::new(sender, recipient, text.join(" ")).into()
}

// ============================================================================
// Shell Parser
// ============================================================================

const FEE_USAGE: &str = "fee <code> <country> <fee>";
const SMS_USAGE: &str = "sms <sender> <recipient> [text..]";
const STATS_USAGE: &str = "stats [-c | -s [N] | -h]";
const FEES_USAGE: &str = "fees on|off";

pub const SHELL_HELP: &str = "\
Commands:
  fee <code> <country> <fee>         register a country fee
  sms <sender> <recipient> [text..]  record an SMS
  stats [-c]                         per-country message count and fee total
  stats -s [N]                       top N senders (fees included when enabled)
  stats -h                           statistics options
  fees on|off                        include fee totals in top senders
  help                               show this help
  exit                               leave the shell";

pub const STATS_HELP: &str = "\
stats [-c]     per-country billable message count and total fee
stats -s [N]   top N senders by message count (default from config)
stats -h       show this help
Fee totals in top senders follow 'fees on|off'.";

/// Which statistics query to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsQuery {
    Countries,
    TopSenders(Option<i64>),
}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Fee(Record),
    Sms(Record),
    Stats(StatsQuery),
    StatsHelp,
    Fees(bool),
    Help,
    Exit,
    Empty,
}

/// Parse a single line of shell input
pub fn parse_shell_line(line: &str) -> Result<ShellCommand, CliError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = words.split_first() else {
        return Ok(ShellCommand::Empty);
    };

    match command.to_ascii_lowercase().as_str() {
        "fee" => {
            // Country names may contain spaces: code first, fee last
            if args.len() < 3 {
                return Err(CliError::Usage { usage: FEE_USAGE });
            }
            let country = args[1..args.len() - 1].join(" ");
            let record = country_fee_record(args[0], &country, args[args.len() - 1])?;
            Ok(ShellCommand::Fee(record))
        }
        "sms" => {
            if args.len() < 2 {
                return Err(CliError::Usage { usage: SMS_USAGE });
            }
            let text: Vec<String> = args[2..].iter().map(|w| w.to_string()).collect();
            Ok(ShellCommand::Sms(sms_record(args[0], args[1], &text)))
        }
        "stats" => match args {
            ["-h"] => Ok(ShellCommand::StatsHelp),
            _ => parse_stats_args(args).map(ShellCommand::Stats),
        },
        "fees" => match args {
            ["on"] => Ok(ShellCommand::Fees(true)),
            ["off"] => Ok(ShellCommand::Fees(false)),
            _ => Err(CliError::Usage { usage: FEES_USAGE }),
        },
        "help" | "?" => Ok(ShellCommand::Help),
        "exit" | "quit" => Ok(ShellCommand::Exit),
        _ => Err(CliError::UnknownCommand {
            input: command.to_string(),
        }),
    }
}

fn parse_stats_args(args: &[&str]) -> Result<StatsQuery, CliError> {
    match args {
        [] | ["-c"] => Ok(StatsQuery::Countries),
        ["-s"] => Ok(StatsQuery::TopSenders(None)),
        ["-s", limit] => limit
            .parse::<i64>()
            .map(|n| StatsQuery::TopSenders(Some(n)))
            .map_err(|_| CliError::Usage { usage: STATS_USAGE }),
        _ => Err(CliError::Usage { usage: STATS_USAGE }),
    }
}

// ============================================================================
// Formatters
// ============================================================================

/// Format statistics rows as table (human) or JSON
///
/// `label_header` names the first column ("Sender" or "Country"). The fee
/// column appears only when the rows carry a fee.
pub fn format_stats_table(
    rows: &[StatsRow],
    label_header: &str,
    json: bool,
    no_color: bool,
) -> String {
    if json {
        return serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());
    }

    if rows.is_empty() {
        return "No statistics yet.".to_string();
    }

    let with_fee = rows.iter().any(|row| row.total_fee.is_some());
    let mut headers = vec![label_header, "Messages"];
    if with_fee {
        headers.push("Total Fee");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers);
    } else {
        table.set_header(
            headers
                .into_iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for row in rows {
        let mut cells = vec![row.label.clone(), row.count.to_string()];
        if with_fee {
            cells.push(
                row.total_fee
                    .map(|fee| fee.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
        table.add_row(cells);
    }

    table.to_string()
}

/// Human summary of an import run
pub fn format_import_report(report: &ImportReport) -> String {
    let (warnings, errors, fatal) = report.error_count();
    let mut lines = vec![format!(
        "Imported {} of {} records ({} fees, {} messages, {} skipped)",
        report.stored(),
        report.records_read,
        report.fees_stored,
        report.messages_stored,
        report.rejected
    )];

    for error in &report.errors {
        let level = match error.severity {
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Fatal => "fatal",
        };
        lines.push(format!("  line {}: {}: {}", error.line, level, error.message));
        if let Some(suggestion) = &error.suggestion {
            lines.push(format!("    hint: {}", suggestion));
        }
    }

    if warnings + errors + fatal > 0 {
        lines.push(format!(
            "{} warnings, {} errors, {} fatal",
            warnings, errors, fatal
        ));
    }

    lines.join("\n")
}

pub fn format_totals(totals: &Totals) -> String {
    format!(
        "Store: {} messages ({} billable) from {} senders, {} countries, total fee {}",
        totals.messages, totals.billable, totals.senders, totals.countries, totals.total_fee
    )
}

// ============================================================================
// Tests
// ============================================================================
