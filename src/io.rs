use std::collections::BTreeSet;
use std::io::Write;

use time::macros::format_description;

use crate::error::TrackerError;
use crate::summary::{Summary, SummaryOutput, format_currency};
use crate::transaction::{Transaction, TransactionKind};

pub const EMPTY_LIST_MESSAGE: &str = "No transactions found. Add your first transaction!";

/// Writes one line per transaction, in the order given.
pub fn write_table<W: Write>(
    mut writer: W,
    transactions: &[Transaction],
    symbol: &str,
) -> Result<(), TrackerError> {
    if transactions.is_empty() {
        writeln!(writer, "{EMPTY_LIST_MESSAGE}")?;
        return Ok(());
    }

    for tx in transactions {
        writeln!(writer, "{}", table_row(tx, symbol)?)?;
    }

    writer.flush()?;
    Ok(())
}

fn table_row(tx: &Transaction, symbol: &str) -> Result<String, TrackerError> {
    let date = tx
        .date
        .format(format_description!("[month repr:short] [day padding:none], [year]"))?;
    let time = tx.time.format(format_description!("[hour]:[minute]"))?;

    Ok(format!(
        "{:<13}  {:<12}  {}  {:<8}  {:<12}  {:<24}  {:>12}",
        tx.id,
        date,
        time,
        tx.payment_method,
        tx.category,
        tx.description,
        signed_amount(tx, symbol),
    ))
}

/// `+₹500.00` for income, `-₹200.00` for expenses.
pub fn signed_amount(tx: &Transaction, symbol: &str) -> String {
    let sign = match tx.kind {
        TransactionKind::Income => '+',
        TransactionKind::Expense => '-',
    };
    format!("{sign}{}", format_currency(symbol, tx.amount))
}

pub fn write_csv<W: Write>(writer: W, transactions: &[Transaction]) -> Result<(), TrackerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for tx in transactions {
        csv_writer.serialize(tx)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Same array layout as the persisted data.
pub fn write_json<W: Write>(mut writer: W, transactions: &[Transaction]) -> Result<(), TrackerError> {
    serde_json::to_writer_pretty(&mut writer, transactions)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_summary<W: Write>(
    mut writer: W,
    summary: &Summary,
    symbol: &str,
) -> Result<(), TrackerError> {
    let output = SummaryOutput::new(summary, symbol);

    writeln!(writer, "Total income:  {}", output.income)?;
    writeln!(writer, "Total expense: {}", output.expense)?;
    if output.deficit {
        writeln!(writer, "Balance:       {} (deficit)", output.balance)?;
    } else {
        writeln!(writer, "Balance:       {}", output.balance)?;
    }

    writer.flush()?;
    Ok(())
}

/// Notes that a payment filter matches no stored method and lists the ones in use.
pub fn write_unknown_payment_method<W: Write>(
    mut writer: W,
    method: &str,
    known: &BTreeSet<&str>,
) -> Result<(), TrackerError> {
    if known.is_empty() {
        writeln!(writer, "No transactions use payment method \"{method}\"")?;
    } else {
        let known: Vec<&str> = known.iter().copied().collect();
        writeln!(
            writer,
            "No transactions use payment method \"{method}\". Known methods: {}",
            known.join(", ")
        )?;
    }
    Ok(())
}
