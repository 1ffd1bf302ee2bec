use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time, UtcOffset};

use crate::error::TrackerError;

/// Epoch milliseconds of the instant the transaction was created.
pub type TransactionId = i64;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(hh_mm, Time, "[hour]:[minute]");

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl FromStr for TransactionKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(TrackerError::InvalidKind(s.to_string())),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Income => "income",
            Self::Expense => "expense",
        })
    }
}

/// A single income or expense entry, in the shape it is persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub payment_method: String,
    pub category: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "hh_mm")]
    pub time: Time,
    /// Only used for ordering. Fixed when the transaction is created.
    pub timestamp: i64,
}

/// Epoch milliseconds of `date` at `time` in the given offset.
pub fn timestamp_millis(date: Date, time: Time, offset: UtcOffset) -> i64 {
    PrimitiveDateTime::new(date, time)
        .assume_offset(offset)
        .unix_timestamp()
        * 1000
}

/// Raw field values as submitted by an entry form.
#[derive(Debug, Clone, Default)]
pub struct TransactionForm {
    pub kind: String,
    pub amount: String,
    pub description: String,
    pub payment_method: String,
    pub category: String,
    pub date: String,
    pub time: String,
}

impl TransactionForm {
    /// Validates the form and builds the transaction it describes.
    ///
    /// Nothing is stored on failure; the error names the offending field.
    pub fn into_transaction(
        self,
        id: TransactionId,
        offset: UtcOffset,
    ) -> Result<Transaction, TrackerError> {
        let kind = self.kind.parse()?;
        let amount = parse_amount(&self.amount)?;
        let date = parse_date(&self.date)?;
        let time = parse_time(&self.time)?;

        Ok(Transaction {
            id,
            kind,
            amount,
            description: self.description.trim().to_string(),
            payment_method: self.payment_method.trim().to_string(),
            category: self.category.trim().to_string(),
            date,
            time,
            timestamp: timestamp_millis(date, time, offset),
        })
    }
}

/// Largest amount a form may submit. Amounts are stored as JSON numbers,
/// so larger values would not read back unchanged.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

pub fn parse_amount(raw: &str) -> Result<Decimal, TrackerError> {
    let trimmed = raw.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| TrackerError::InvalidAmount(raw.to_string()))?;

    if (amount.is_sign_negative() && !amount.is_zero()) || amount > MAX_AMOUNT {
        return Err(TrackerError::InvalidAmount(raw.to_string()));
    }

    stored_amount(amount).ok_or_else(|| TrackerError::InvalidAmount(raw.to_string()))
}

/// The value `amount` settles on once written as a JSON float and read back,
/// so that saving and reloading gives the same record.
fn stored_amount(amount: Decimal) -> Option<Decimal> {
    let mut current = amount;
    for _ in 0..8 {
        let float = current.to_f64()?;
        let reread = Decimal::from_str(&float.to_string()).ok()?;
        if reread == current {
            return Some(current);
        }
        current = reread;
    }
    None
}

pub fn parse_date(raw: &str) -> Result<Date, TrackerError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| TrackerError::InvalidDate(raw.to_string()))
}

pub fn parse_time(raw: &str) -> Result<Time, TrackerError> {
    Time::parse(raw.trim(), format_description!("[hour]:[minute]"))
        .map_err(|_| TrackerError::InvalidTime(raw.to_string()))
}
