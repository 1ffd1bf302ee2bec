//! A single-user income and expense tracker that keeps its entries in a
//! local JSON file.

pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod storage;
pub mod store;
pub mod summary;
pub mod transaction;

pub use app::{Event, Tracker, View};
pub use error::TrackerError;
pub use filter::TransactionFilter;
pub use store::TransactionStore;
pub use summary::Summary;
pub use transaction::{Transaction, TransactionForm, TransactionId, TransactionKind};
