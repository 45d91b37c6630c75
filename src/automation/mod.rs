pub mod executor;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod resolver;
pub mod reversal;
pub mod service;
pub mod store;

/// Description prefix of every transaction the engine generates. Reversal
/// classification depends on it, so it never changes.
pub const AUTOMATION_PREFIX: &str = "Automação: ";

/// Reserved category of engine-generated savings movements.
pub const AUTOMATION_CATEGORY: &str = "Automação";

/// Reserved category of engine-generated account transfers.
pub const AUTOMATION_TRANSFER_CATEGORY: &str = "Transferência Automática";

/// Trailing window scanned by the manual run-now path.
pub const HISTORY_WINDOW_DAYS: i64 = 30;
