mod pg;

pub use pg::PgLedgerStore;

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::account::models::Account;
use crate::errors::AppError;
use crate::goal::models::Goal;
use crate::transaction::models::{NewTransaction, Transaction};

/// Durable store of financial fact: accounts, goals and the transaction log.
///
/// Every method is an independent durable write or read; there is no
/// multi-statement transaction across calls. Callers that need atomicity
/// across two writes (the transfer executor, the reversal engine) get it by
/// issuing a compensating write when the second leg fails.
pub trait LedgerStore: Send + Sync {
    fn accounts(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Account>, AppError>> + Send;

    fn goals(&self, owner_id: Uuid) -> impl Future<Output = Result<Vec<Goal>, AppError>> + Send;

    /// All transactions for an owner, newest first.
    fn transactions(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Transaction>, AppError>> + Send;

    fn transaction_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Transaction>, AppError>> + Send;

    fn insert_transaction(
        &self,
        owner_id: Uuid,
        new: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, AppError>> + Send;

    /// Single-field update of an account balance.
    fn update_account_balance(
        &self,
        owner_id: Uuid,
        account_id: Uuid,
        balance: Decimal,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Single-field update of a goal's saved amount.
    fn update_goal_amount(
        &self,
        owner_id: Uuid,
        goal_id: Uuid,
        current_amount: Decimal,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn delete_transaction(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// How many times a persist call is attempted before giving up.
pub const PERSIST_ATTEMPTS: u32 = 3;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Run a persist call under a bounded retry-with-backoff policy.
///
/// Failed attempts are logged and retried with a doubling delay; the last
/// error is returned once the attempts are exhausted.
pub async fn with_retry<T, F, Fut>(op_name: &str, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut delay = RETRY_BASE_DELAY;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < PERSIST_ATTEMPTS => {
                warn!("{op_name} failed (attempt {attempt}/{PERSIST_ATTEMPTS}), retrying: {err}");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => {
                warn!("{op_name} failed after {PERSIST_ATTEMPTS} attempts: {err}");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[actix_rt::test]
    async fn with_retry_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, AppError>(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn with_retry_recovers_from_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = with_retry("op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AppError::InternalError("transient".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[actix_rt::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::InternalError("down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), PERSIST_ATTEMPTS);
    }
}
