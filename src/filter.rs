use crate::error::TrackerError;
use crate::transaction::{Transaction, TransactionKind};

/// Value a filter control uses for "no constraint".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub payment_method: Option<String>,
}

impl TransactionFilter {
    /// Builds a filter from the raw values of the type and payment controls.
    pub fn from_controls(kind: &str, payment_method: &str) -> Result<Self, TrackerError> {
        let kind = if is_all(kind) {
            None
        } else {
            Some(kind.parse()?)
        };
        let payment_method = if is_all(payment_method) {
            None
        } else {
            Some(payment_method.to_string())
        };

        Ok(Self {
            kind,
            payment_method,
        })
    }

    pub fn kind(kind: TransactionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn payment_method(method: impl Into<String>) -> Self {
        Self {
            payment_method: Some(method.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.payment_method.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(kind) = self.kind
            && tx.kind != kind
        {
            return false;
        }

        match &self.payment_method {
            Some(method) => tx.payment_method == *method,
            None => true,
        }
    }
}

fn is_all(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}
