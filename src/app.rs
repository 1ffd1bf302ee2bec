//! Event handlers connecting input sources to the store.
//!
//! Front ends turn user actions into [`Event`]s and render the [`View`]
//! returned for each one. Nothing here knows how the view is displayed.

use time::UtcOffset;
use tracing::{info, warn};

use crate::error::TrackerError;
use crate::filter::TransactionFilter;
use crate::storage::Storage;
use crate::store::TransactionStore;
use crate::summary::Summary;
use crate::transaction::{Transaction, TransactionForm, TransactionId};

#[derive(Debug, Clone)]
pub enum Event {
    /// The entry form was submitted.
    Submit(TransactionForm),
    /// A deletion was requested and confirmed.
    Delete(TransactionId),
    FilterChanged(TransactionFilter),
    ClearFilters,
}

/// What a render sink needs after an event: the filtered list and totals.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub transactions: Vec<Transaction>,
    pub summary: Summary,
    /// Set when the change was applied in memory but could not be saved.
    pub warning: Option<String>,
    /// The transaction affected by the event, if any.
    pub affected: Option<TransactionId>,
}

pub struct Tracker<S> {
    store: TransactionStore<S>,
    filter: TransactionFilter,
    offset: UtcOffset,
}

impl<S: Storage> Tracker<S> {
    /// `offset` is the local UTC offset used to timestamp new entries.
    pub fn new(store: TransactionStore<S>, offset: UtcOffset) -> Self {
        Self {
            store,
            filter: TransactionFilter::default(),
            offset,
        }
    }

    /// Applies `event` and returns the recomputed view.
    ///
    /// # Errors
    /// Returns the validation error for a rejected form submission. Failing
    /// to persist is reported through [`View::warning`] instead.
    pub fn handle(&mut self, event: Event) -> Result<View, TrackerError> {
        let mut warning = None;
        let mut affected = None;

        match event {
            Event::Submit(form) => {
                let tx = form.into_transaction(self.store.next_id(), self.offset)?;
                let id = tx.id;
                info!("Recording {} of {} ({})", tx.kind, tx.amount, tx.description);
                warning = self.store.add(tx).err().map(|err| err.to_string());
                affected = Some(id);
            }
            Event::Delete(id) => match self.store.remove(id) {
                Ok(true) => affected = Some(id),
                Ok(false) => warn!("Delete requested for unknown transaction {id}"),
                Err(err) => {
                    warning = Some(err.to_string());
                    affected = Some(id);
                }
            },
            Event::FilterChanged(filter) => self.filter = filter,
            Event::ClearFilters => self.filter = TransactionFilter::default(),
        }

        let mut view = self.view();
        view.warning = warning;
        view.affected = affected;
        Ok(view)
    }

    pub fn view(&self) -> View {
        View {
            transactions: self.store.list(&self.filter).into_iter().cloned().collect(),
            summary: self.store.summary(),
            warning: None,
            affected: None,
        }
    }

    pub fn filter(&self) -> &TransactionFilter {
        &self.filter
    }

    pub fn store(&self) -> &TransactionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TransactionStore<S> {
        &mut self.store
    }
}
