pub mod comparison;
pub mod config;
pub mod decision;
pub mod error;
pub mod notify;
pub mod reconcile;
pub mod service;
pub mod storage;
pub mod strategy;
pub mod suggestion;
pub mod undo;

pub use config::ReviewConfig;
pub use decision::{ReviewAction, ReviewStatus};
pub use error::Error;
pub use notify::{ReviewObserver, SilentObserver};
pub use service::ReviewService;
pub use storage::{DecisionStore, ScanCatalog, SqliteStore};
pub use suggestion::{Suggestion, SuggestionEngine};
pub use undo::{UndoHistory, UndoableAction};
