use std::error::Error as _;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;

use expense_tracker::config::Config;
use expense_tracker::filter::ALL;
use expense_tracker::io::{
    write_csv, write_json, write_summary, write_table, write_unknown_payment_method,
};
use expense_tracker::storage::FileStorage;
use expense_tracker::summary::format_currency;
use expense_tracker::{
    Event, Tracker, TrackerError, TransactionFilter, TransactionForm, TransactionStore, View,
};

/// Record income and expenses and see where the money went.
#[derive(Parser)]
#[command(name = "expense-tracker", version, about)]
struct Args {
    /// Directory holding transactions.json.
    #[arg(long, env = "EXPENSE_TRACKER_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Currency symbol shown before amounts.
    #[arg(long, env = "EXPENSE_TRACKER_CURRENCY", global = true)]
    currency: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a new income or expense.
    Add {
        #[arg(long = "type", default_value = "expense")]
        kind: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "cash")]
        payment_method: String,
        #[arg(long, default_value = "other")]
        category: String,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        date: Option<String>,
        /// HH:MM, defaults to now.
        #[arg(long)]
        time: Option<String>,
    },
    /// Delete a transaction by id.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// List transactions, newest first.
    List {
        #[arg(long = "type", default_value = ALL)]
        kind: String,
        #[arg(long, default_value = ALL)]
        payment: String,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Show total income, expense and balance.
    Summary,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

fn main() -> ExitCode {
    // Logs go to stderr so csv and json output can be piped. `RUST_LOG=debug` shows storage access.
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .with(env_filter)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  Caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), TrackerError> {
    let config = Config::resolve(args.data_dir, args.currency)?;
    let storage = FileStorage::open(&config.data_dir)?;
    let store = TransactionStore::load(storage, config.storage_key.as_str());
    let mut tracker = Tracker::new(store, config.utc_offset);
    let symbol = config.currency_symbol.as_str();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Add {
            kind,
            amount,
            description,
            payment_method,
            category,
            date,
            time,
        } => {
            let now = OffsetDateTime::now_utc().to_offset(config.utc_offset);
            let date = match date {
                Some(date) => date,
                None => now.date().format(format_description!("[year]-[month]-[day]"))?,
            };
            let time = match time {
                Some(time) => time,
                None => now.time().format(format_description!("[hour]:[minute]"))?,
            };

            let view = tracker.handle(Event::Submit(TransactionForm {
                kind,
                amount,
                description,
                payment_method,
                category,
                date,
                time,
            }))?;
            report_warning(&view);
            if let Some(id) = view.affected {
                writeln!(out, "Added transaction {id}")?;
            }
            write_summary(&mut out, &view.summary, symbol)?;
        }
        Command::Delete { id, yes } => {
            match tracker.store().get(id) {
                Some(tx) => {
                    let prompt = format!(
                        "Delete {} \"{}\" of {}?",
                        tx.kind,
                        tx.description,
                        format_currency(symbol, tx.amount)
                    );
                    if !yes && !confirm(&prompt)? {
                        writeln!(out, "Nothing deleted")?;
                        return Ok(());
                    }
                }
                None => writeln!(out, "No transaction {id}")?,
            }

            let view = tracker.handle(Event::Delete(id))?;
            report_warning(&view);
            if let Some(id) = view.affected {
                writeln!(out, "Deleted transaction {id}")?;
            }
            write_summary(&mut out, &view.summary, symbol)?;
        }
        Command::List {
            kind,
            payment,
            format,
        } => {
            let filter = TransactionFilter::from_controls(&kind, &payment)?;
            if let Some(method) = &filter.payment_method {
                let known = tracker.store().payment_methods();
                if !known.contains(method.as_str()) {
                    write_unknown_payment_method(io::stderr(), method, &known)?;
                }
            }

            let view = tracker.handle(Event::FilterChanged(filter))?;
            match format {
                Format::Table => {
                    write_table(&mut out, &view.transactions, symbol)?;
                    writeln!(out)?;
                    write_summary(&mut out, &view.summary, symbol)?;
                }
                Format::Csv => write_csv(&mut out, &view.transactions)?,
                Format::Json => write_json(&mut out, &view.transactions)?,
            }
        }
        Command::Summary => write_summary(&mut out, &tracker.view().summary, symbol)?,
    }

    Ok(())
}

fn report_warning(view: &View) {
    if let Some(warning) = &view.warning {
        eprintln!("Warning: {warning}");
        eprintln!("The change is not saved.");
    }
}

/// Asks a yes/no question on stderr and reads the answer from stdin.
fn confirm(prompt: &str) -> Result<bool, TrackerError> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
