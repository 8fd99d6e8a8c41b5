//! Key Promoter - learn the keyboard shortcuts for what you click
//!
//! Attributes pointer interactions to the commands their labels evoke,
//! counts programmatic dispatches as keyboard usage, and reports or exports
//! the catalog's shortcuts.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod interceptor;
pub mod logging;
pub mod matcher;
pub mod notifications;
pub mod promoter;
pub mod reporting;
pub mod shortcuts;
pub mod statistics;
pub mod storage;

pub use catalog::{Command, CommandCatalog, InMemoryCatalog};
pub use error::{KeyPromoterError, Result};
pub use interceptor::{DispatchSlot, InvocationContext};
pub use notifications::{LogNotifier, Notice, Notifier};
pub use promoter::{InteractionEvent, InteractionOutcome, KeyPromoter};
pub use statistics::Channel;
pub use storage::{DataStore, JsonFileStore};
