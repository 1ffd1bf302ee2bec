use std::collections::BTreeSet;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::TrackerError;
use crate::filter::TransactionFilter;
use crate::storage::Storage;
use crate::summary::Summary;
use crate::transaction::{Transaction, TransactionId};

/// Key the collection is stored under.
pub const DEFAULT_KEY: &str = "transactions";

/// Sole owner of the transaction collection.
///
/// Records are kept newest-submitted first. Every mutation writes the whole
/// collection back to storage as one JSON array.
pub struct TransactionStore<S> {
    storage: S,
    key: String,
    transactions: Vec<Transaction>,
}

impl<S: Storage> TransactionStore<S> {
    /// Restores the collection stored under `key`.
    ///
    /// Missing, unreadable or corrupt data starts an empty collection.
    pub fn load(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();

        let transactions = match storage.read(&key) {
            Ok(Some(blob)) => match decode(&blob) {
                Ok(transactions) => transactions,
                Err(err) => {
                    warn!("Corrupt {key} data detected! Starting with no transactions: {err}");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No stored {key} found");
                Vec::new()
            }
            Err(err) => {
                warn!("Unable to read stored {key}, starting with no transactions: {err}");
                Vec::new()
            }
        };

        debug!("Loaded {} transactions", transactions.len());
        Self {
            storage,
            key,
            transactions,
        }
    }

    /// Inserts `tx` at the front and persists.
    ///
    /// On a persistence error the record stays in memory.
    pub fn add(&mut self, tx: Transaction) -> Result<(), TrackerError> {
        debug!("Adding transaction {}", tx.id);
        self.transactions.insert(0, tx);
        self.save()
    }

    /// Removes the record with `id`, if any, and persists either way.
    ///
    /// Returns whether a record was removed.
    pub fn remove(&mut self, id: TransactionId) -> Result<bool, TrackerError> {
        let before = self.transactions.len();
        self.transactions.retain(|tx| tx.id != id);
        let removed = self.transactions.len() != before;

        if !removed {
            debug!("No transaction with id {id} to remove");
        }

        self.save()?;
        Ok(removed)
    }

    /// Records matching `filter`, newest `timestamp` first.
    pub fn list(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut matching: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
    }

    pub fn summary(&self) -> Summary {
        Summary::from_transactions(&self.transactions)
    }

    /// Records in storage order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// Distinct payment methods in use, for building filter choices.
    pub fn payment_methods(&self) -> BTreeSet<&str> {
        self.transactions
            .iter()
            .map(|tx| tx.payment_method.as_str())
            .collect()
    }

    /// An id derived from the current instant that no stored record uses.
    pub fn next_id(&self) -> TransactionId {
        let now = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        self.next_id_after(now as TransactionId)
    }

    fn next_id_after(&self, now_millis: TransactionId) -> TransactionId {
        match self.transactions.iter().map(|tx| tx.id).max() {
            Some(max) if max >= now_millis => max + 1,
            _ => now_millis,
        }
    }

    pub fn save(&mut self) -> Result<(), TrackerError> {
        let blob = serde_json::to_string(&self.transactions)?;
        debug!("Saving {} transactions", self.transactions.len());
        self.storage.write(&self.key, &blob).inspect_err(|err| {
            warn!("Unable to save transactions: {err}");
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// Parses a stored array, dropping elements that are not valid transactions.
fn decode(blob: &str) -> Result<Vec<Transaction>, TrackerError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(blob).map_err(TrackerError::MalformedData)?;

    let transactions = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(tx) => Some(tx),
            Err(err) => {
                warn!("Dropping stored transaction at index {index}: {err}");
                None
            }
        })
        .collect();

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::transaction::{TransactionForm, TransactionKind};
    use pretty_assertions::assert_eq;
    use rust_decimal::{Decimal, dec};
    use time::macros::{date, offset, time};

    fn tx(id: TransactionId, kind: TransactionKind, amount: Decimal, timestamp: i64) -> Transaction {
        Transaction {
            id,
            kind,
            amount,
            description: format!("entry {id}"),
            payment_method: "cash".to_string(),
            category: "misc".to_string(),
            date: date!(2024 - 02 - 10),
            time: time!(10:15),
            timestamp,
        }
    }

    fn with_method(mut tx: Transaction, method: &str) -> Transaction {
        tx.payment_method = method.to_string();
        tx
    }

    fn empty_store() -> TransactionStore<MemoryStorage> {
        TransactionStore::load(MemoryStorage::new(), DEFAULT_KEY)
    }

    fn ids(list: &[&Transaction]) -> Vec<TransactionId> {
        list.iter().map(|tx| tx.id).collect()
    }

    #[test]
    fn load_missing_data_is_empty() {
        let store = empty_store();
        assert!(store.transactions().is_empty());
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn load_invalid_json_is_empty() {
        let storage = MemoryStorage::with_entry(DEFAULT_KEY, "{not json");
        let store = TransactionStore::load(storage, DEFAULT_KEY);
        assert!(store.transactions().is_empty());
    }

    #[test]
    fn load_non_array_is_empty() {
        for blob in ["null", "{}", "42", "\"transactions\""] {
            let storage = MemoryStorage::with_entry(DEFAULT_KEY, blob);
            let store = TransactionStore::load(storage, DEFAULT_KEY);
            assert!(store.transactions().is_empty(), "blob {blob}");
        }
    }

    #[test]
    fn load_drops_undecodable_records() {
        let blob = r#"[
            {"id":2,"type":"expense","amount":null,"description":"NaN amount","paymentMethod":"cash","category":"food","date":"2024-01-02","time":"10:00","timestamp":1704189600000},
            {"id":1,"type":"income","amount":500,"description":"salary","paymentMethod":"bank","category":"work","date":"2024-01-01","time":"09:00","timestamp":1704099600000}
        ]"#;
        let storage = MemoryStorage::with_entry(DEFAULT_KEY, blob);
        let store = TransactionStore::load(storage, DEFAULT_KEY);

        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.transactions()[0].id, 1);
        assert_eq!(store.transactions()[0].amount, dec!(500));
    }

    #[test]
    fn add_inserts_at_front_and_persists() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(10), 300)).unwrap();
        store.add(tx(2, TransactionKind::Expense, dec!(5), 100)).unwrap();

        let raw: Vec<TransactionId> = store.transactions().iter().map(|t| t.id).collect();
        assert_eq!(raw, vec![2, 1]);
        assert_eq!(store.storage().writes(), 2);
    }

    #[test]
    fn list_sorts_by_timestamp_descending() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(1), 200)).unwrap();
        store.add(tx(2, TransactionKind::Expense, dec!(1), 500)).unwrap();
        store.add(tx(3, TransactionKind::Income, dec!(1), 100)).unwrap();
        store.add(tx(4, TransactionKind::Expense, dec!(1), 400)).unwrap();

        let listed = store.list(&TransactionFilter::default());
        assert_eq!(ids(&listed), vec![2, 4, 1, 3]);
        assert!(listed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn list_does_not_reorder_storage() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(1), 900)).unwrap();
        store.add(tx(2, TransactionKind::Income, dec!(1), 100)).unwrap();

        let _ = store.list(&TransactionFilter::default());

        let raw: Vec<TransactionId> = store.transactions().iter().map(|t| t.id).collect();
        assert_eq!(raw, vec![2, 1]);
    }

    #[test]
    fn list_filters_by_kind() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(1), 1)).unwrap();
        store.add(tx(2, TransactionKind::Expense, dec!(1), 2)).unwrap();
        store.add(tx(3, TransactionKind::Income, dec!(1), 3)).unwrap();

        let listed = store.list(&TransactionFilter::kind(TransactionKind::Income));
        assert_eq!(ids(&listed), vec![3, 1]);
        assert!(listed.iter().all(|t| t.kind == TransactionKind::Income));
    }

    #[test]
    fn list_filters_by_payment_method_and_both() {
        let mut store = empty_store();
        store
            .add(with_method(tx(1, TransactionKind::Income, dec!(1), 1), "card"))
            .unwrap();
        store
            .add(with_method(tx(2, TransactionKind::Expense, dec!(1), 2), "card"))
            .unwrap();
        store
            .add(with_method(tx(3, TransactionKind::Expense, dec!(1), 3), "cash"))
            .unwrap();

        let by_card = store.list(&TransactionFilter::payment_method("card"));
        assert_eq!(ids(&by_card), vec![2, 1]);

        let both = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            payment_method: Some("card".to_string()),
        };
        assert_eq!(ids(&store.list(&both)), vec![2]);
    }

    #[test]
    fn income_and_expense_scenario() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(500), 1_000)).unwrap();
        store.add(tx(2, TransactionKind::Expense, dec!(200), 2_000)).unwrap();

        let summary = store.summary();
        assert_eq!(summary.total_income, dec!(500));
        assert_eq!(summary.total_expense, dec!(200));
        assert_eq!(summary.balance, dec!(300));

        let listed = store.list(&TransactionFilter::default());
        assert_eq!(ids(&listed), vec![2, 1]);
        assert_eq!(listed[0].amount, dec!(200));
        assert_eq!(listed[1].amount, dec!(500));
    }

    #[test]
    fn add_then_remove_restores_content() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(3), 10)).unwrap();
        store.add(tx(2, TransactionKind::Expense, dec!(4), 20)).unwrap();
        let before = store.transactions().to_vec();

        store.add(tx(3, TransactionKind::Expense, dec!(9), 15)).unwrap();
        assert!(store.remove(3).unwrap());

        assert_eq!(store.transactions(), before.as_slice());
    }

    #[test]
    fn remove_unknown_id_still_persists() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(3), 10)).unwrap();
        store.add(tx(2, TransactionKind::Expense, dec!(4), 20)).unwrap();
        let before = store.transactions().to_vec();
        let writes = store.storage().writes();

        assert!(!store.remove(999).unwrap());

        assert_eq!(store.transactions(), before.as_slice());
        assert_eq!(store.storage().writes(), writes + 1);
    }

    #[test]
    fn empty_collection_round_trips() {
        let mut store = empty_store();
        store.save().unwrap();

        let reloaded = TransactionStore::load(store.storage().clone(), DEFAULT_KEY);
        assert!(reloaded.transactions().is_empty());
    }

    #[test]
    fn collection_round_trips_in_storage_order() {
        let mut store = empty_store();
        store.add(tx(1, TransactionKind::Income, dec!(1250.5), 50)).unwrap();
        store
            .add(with_method(tx(2, TransactionKind::Expense, dec!(99.99), 10), "upi"))
            .unwrap();
        store.add(tx(3, TransactionKind::Expense, dec!(0), 30)).unwrap();

        let reloaded = TransactionStore::load(store.storage().clone(), DEFAULT_KEY);
        assert_eq!(reloaded.transactions(), store.transactions());
    }

    #[test]
    fn submitted_high_precision_amounts_round_trip() {
        let mut store = empty_store();
        for (id, amount) in [(1, "0.1234567890123456789"), (2, "987654321.123456789")] {
            let form = TransactionForm {
                kind: "expense".to_string(),
                amount: amount.to_string(),
                description: "precise".to_string(),
                payment_method: "card".to_string(),
                category: "misc".to_string(),
                date: "2024-02-10".to_string(),
                time: "10:15".to_string(),
            };
            store
                .add(form.into_transaction(id, offset!(UTC)).unwrap())
                .unwrap();
        }

        let reloaded = TransactionStore::load(store.storage().clone(), DEFAULT_KEY);
        assert_eq!(reloaded.transactions(), store.transactions());
    }

    #[test]
    fn failed_save_keeps_in_memory_record() {
        let mut store = empty_store();
        store.storage_mut().set_fail_writes(true);

        let result = store.add(tx(1, TransactionKind::Income, dec!(7), 1));

        assert!(matches!(result, Err(TrackerError::Persist(_, _))));
        assert_eq!(store.transactions().len(), 1);
        assert_eq!(store.summary().total_income, dec!(7));
    }

    #[test]
    fn payment_methods_are_distinct_and_sorted() {
        let mut store = empty_store();
        store
            .add(with_method(tx(1, TransactionKind::Income, dec!(1), 1), "upi"))
            .unwrap();
        store
            .add(with_method(tx(2, TransactionKind::Income, dec!(1), 2), "card"))
            .unwrap();
        store
            .add(with_method(tx(3, TransactionKind::Income, dec!(1), 3), "upi"))
            .unwrap();

        let methods: Vec<&str> = store.payment_methods().into_iter().collect();
        assert_eq!(methods, vec!["card", "upi"]);
    }

    #[test]
    fn next_id_is_unique() {
        let mut store = empty_store();
        assert_eq!(store.next_id_after(1_000), 1_000);

        store.add(tx(1_000, TransactionKind::Income, dec!(1), 1)).unwrap();
        assert_eq!(store.next_id_after(1_000), 1_001);
        assert_eq!(store.next_id_after(500), 1_001);
        assert_eq!(store.next_id_after(2_000), 2_000);
    }

    #[test]
    fn get_finds_by_id() {
        let mut store = empty_store();
        store.add(tx(5, TransactionKind::Expense, dec!(2), 1)).unwrap();
        assert_eq!(store.get(5).map(|t| t.amount), Some(dec!(2)));
        assert!(store.get(6).is_none());
    }
}
