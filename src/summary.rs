use rust_decimal::Decimal;
use serde::Serialize;

use crate::transaction::{Transaction, TransactionKind};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
}

impl Summary {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut total_income = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;

        for tx in transactions {
            match tx.kind {
                TransactionKind::Income => {
                    total_income = total_income.saturating_add(tx.amount);
                }
                TransactionKind::Expense => {
                    total_expense = total_expense.saturating_add(tx.amount);
                }
            }
        }

        Self {
            total_income,
            total_expense,
            balance: total_income.saturating_sub(total_expense),
        }
    }

    pub fn is_deficit(&self) -> bool {
        self.balance < Decimal::ZERO
    }
}

/// A currency amount with the display symbol and two decimal places.
pub fn format_currency(symbol: &str, amount: Decimal) -> String {
    format!("{symbol}{:.2}", amount)
}

#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub income: String,
    pub expense: String,
    pub balance: String,
    pub deficit: bool,
}

impl SummaryOutput {
    pub fn new(summary: &Summary, symbol: &str) -> Self {
        Self {
            income: format_currency(symbol, summary.total_income),
            expense: format_currency(symbol, summary.total_expense),
            balance: format_currency(symbol, summary.balance),
            deficit: summary.is_deficit(),
        }
    }
}
