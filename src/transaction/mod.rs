pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::{create_transaction, get_transaction, list_transactions, reverse_transaction};
