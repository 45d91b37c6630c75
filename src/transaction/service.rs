use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use super::models::{
    CreateTransactionDto, NewTransaction, Transaction, TransactionFilters, TransactionType,
};
use crate::account::models::Account;
use crate::automation::reversal;
use crate::automation::service::AutomationService;
use crate::automation::store::RuleStore;
use crate::errors::AppError;
use crate::goal::models::Goal;
use crate::ledger::{with_retry, LedgerStore};
use crate::state::StateCache;

/// Service layer for the transaction log.
///
/// Posting a transaction is two independent durable writes (the record, then
/// the balance effect); when the second fails the first is compensated away
/// so the log and the balances keep agreeing.
pub struct TransactionService;

impl TransactionService {
    pub async fn create_transaction<L: LedgerStore, R: RuleStore>(
        ledger: &L,
        rule_store: &R,
        cache: &StateCache,
        owner_id: Uuid,
        dto: CreateTransactionDto,
    ) -> Result<Transaction, AppError> {
        let accounts = cache.fresh_accounts(ledger, owner_id).await?;
        let goals = cache.fresh_goals(ledger, owner_id).await?;

        Self::validate_references(&dto, &accounts, &goals)?;

        let new = NewTransaction {
            date: dto.date.unwrap_or_else(Utc::now),
            description: dto.description.trim().to_string(),
            amount: dto.amount,
            transaction_type: dto.transaction_type,
            category: dto.category,
            account_id: dto.account_id,
            to_account_id: dto.to_account_id,
            goal_id: dto.goal_id,
            is_recurring: dto.is_recurring,
            recurring_frequency: dto.recurring_frequency,
            rule_id: None,
        };

        let txn = with_retry("insert transaction", || {
            ledger.insert_transaction(owner_id, new.clone())
        })
        .await?;

        if let Err(err) =
            Self::apply_balance_effects(ledger, cache, owner_id, &txn, &accounts, &goals).await
        {
            // The record exists but its effect does not; take the record
            // back out so the two stay in agreement.
            if let Err(cleanup) = with_retry("remove orphaned transaction", || {
                ledger.delete_transaction(owner_id, txn.id)
            })
            .await
            {
                return Err(AppError::ConsistencyError(format!(
                    "transaction {} recorded without its balance effect and cleanup failed: {cleanup}",
                    txn.id
                )));
            }
            return Err(err);
        }

        cache.push_transaction(owner_id, txn.clone());

        // Income feeds the rule engine; its failures stay out of the user's
        // way except for an unrecoverable rollback.
        if txn.get_type() == TransactionType::Income {
            match AutomationService::run_rules_for_transaction(
                ledger, rule_store, cache, owner_id, &txn,
            )
            .await
            {
                Ok(0) => {}
                Ok(count) => {
                    info!("{count} automation rule(s) executed for transaction {}", txn.id);
                }
                Err(err @ AppError::ConsistencyError(_)) => return Err(err),
                Err(err) => error!("automation run failed for transaction {}: {err}", txn.id),
            }
        }

        Ok(txn)
    }

    fn validate_references(
        dto: &CreateTransactionDto,
        accounts: &[Account],
        goals: &[Goal],
    ) -> Result<(), AppError> {
        if let Some(account_id) = dto.account_id {
            if !accounts.iter().any(|a| a.id == account_id) {
                return Err(AppError::NotFound("Account not found".to_string()));
            }
        }
        if let Some(goal_id) = dto.goal_id {
            if !goals.iter().any(|g| g.id == goal_id) {
                return Err(AppError::NotFound("Goal not found".to_string()));
            }
        }
        match dto.transaction_type {
            TransactionType::Transfer => {
                let (Some(source), Some(target)) = (dto.account_id, dto.to_account_id) else {
                    return Err(AppError::ValidationError(
                        "Transfers need both accountId and toAccountId".to_string(),
                    ));
                };
                if source == target {
                    return Err(AppError::ValidationError(
                        "Cannot transfer an account to itself".to_string(),
                    ));
                }
                if !accounts.iter().any(|a| a.id == target) {
                    return Err(AppError::NotFound("Destination account not found".to_string()));
                }
                Ok(())
            }
            _ if dto.to_account_id.is_some() => Err(AppError::ValidationError(
                "toAccountId is only valid for transfers".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Post a transaction's effect onto the balances it touches.
    async fn apply_balance_effects<L: LedgerStore>(
        ledger: &L,
        cache: &StateCache,
        owner_id: Uuid,
        txn: &Transaction,
        accounts: &[Account],
        goals: &[Goal],
    ) -> Result<(), AppError> {
        match txn.get_type() {
            TransactionType::Income => {
                if let Some(account) = Self::account_of(txn, accounts) {
                    let balance = account.balance + txn.amount;
                    with_retry("credit account", || {
                        ledger.update_account_balance(owner_id, account.id, balance)
                    })
                    .await?;
                    cache.set_account_balance(owner_id, account.id, balance);
                }
            }
            TransactionType::Expense | TransactionType::Investment => {
                if let Some(account) = Self::account_of(txn, accounts) {
                    let balance = account.balance - txn.amount;
                    with_retry("debit account", || {
                        ledger.update_account_balance(owner_id, account.id, balance)
                    })
                    .await?;
                    cache.set_account_balance(owner_id, account.id, balance);
                }
            }
            TransactionType::Savings => {
                let Some(account) = Self::account_of(txn, accounts) else {
                    return Ok(());
                };
                let balance = account.balance - txn.amount;
                with_retry("debit account", || {
                    ledger.update_account_balance(owner_id, account.id, balance)
                })
                .await?;

                if let Some(goal) = txn.goal_id.and_then(|id| goals.iter().find(|g| g.id == id)) {
                    let amount = goal.current_amount + txn.amount;
                    if let Err(err) = with_retry("credit goal", || {
                        ledger.update_goal_amount(owner_id, goal.id, amount)
                    })
                    .await
                    {
                        error!("goal credit failed, restoring account balance: {err}");
                        with_retry("restore account balance", || {
                            ledger.update_account_balance(owner_id, account.id, account.balance)
                        })
                        .await
                        .map_err(|e| {
                            AppError::ConsistencyError(format!(
                                "account {} debited for a failed savings post and the restore failed: {e}",
                                account.id
                            ))
                        })?;
                        return Err(err);
                    }
                    cache.set_goal_amount(owner_id, goal.id, amount);
                }
                cache.set_account_balance(owner_id, account.id, balance);
            }
            TransactionType::Transfer => {
                let source = Self::account_of(txn, accounts).ok_or_else(|| {
                    AppError::NotFound("Source account not found".to_string())
                })?;
                let target = txn
                    .to_account_id
                    .and_then(|id| accounts.iter().find(|a| a.id == id))
                    .ok_or_else(|| {
                        AppError::NotFound("Destination account not found".to_string())
                    })?;

                let source_balance = source.balance - txn.amount;
                with_retry("debit source account", || {
                    ledger.update_account_balance(owner_id, source.id, source_balance)
                })
                .await?;

                let target_balance = target.balance + txn.amount;
                if let Err(err) = with_retry("credit target account", || {
                    ledger.update_account_balance(owner_id, target.id, target_balance)
                })
                .await
                {
                    error!("transfer credit failed, restoring source: {err}");
                    with_retry("restore source balance", || {
                        ledger.update_account_balance(owner_id, source.id, source.balance)
                    })
                    .await
                    .map_err(|e| {
                        AppError::ConsistencyError(format!(
                            "account {} debited for a failed transfer and the restore failed: {e}",
                            source.id
                        ))
                    })?;
                    return Err(err);
                }

                cache.set_account_balance(owner_id, source.id, source_balance);
                cache.set_account_balance(owner_id, target.id, target_balance);
            }
        }
        Ok(())
    }

    fn account_of<'a>(txn: &Transaction, accounts: &'a [Account]) -> Option<&'a Account> {
        txn.account_id
            .and_then(|id| accounts.iter().find(|a| a.id == id))
    }

    /// Undo a transaction and delete it.
    pub async fn reverse_transaction<L: LedgerStore, R: RuleStore>(
        ledger: &L,
        rule_store: &R,
        cache: &StateCache,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), AppError> {
        reversal::reverse_transaction(ledger, rule_store, cache, owner_id, transaction_id).await
    }

    /// Get a single transaction by ID
    pub async fn get_transaction<L: LedgerStore>(
        ledger: &L,
        owner_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, AppError> {
        ledger
            .transaction_by_id(owner_id, transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    /// List transactions with filters, newest first.
    pub async fn list_transactions<L: LedgerStore>(
        ledger: &L,
        owner_id: Uuid,
        filters: &TransactionFilters,
    ) -> Result<(Vec<Transaction>, usize), AppError> {
        let all = ledger.transactions(owner_id).await?;

        let filtered: Vec<Transaction> = all
            .into_iter()
            .filter(|t| filters.start_date.map_or(true, |d| t.date >= d))
            .filter(|t| filters.end_date.map_or(true, |d| t.date <= d))
            .filter(|t| {
                filters
                    .category
                    .as_ref()
                    .map_or(true, |c| t.category == *c)
            })
            .filter(|t| filters.account_id.map_or(true, |id| t.account_id == Some(id)))
            .filter(|t| {
                filters
                    .transaction_type
                    .as_ref()
                    .map_or(true, |ty| t.transaction_type == *ty)
            })
            .collect();

        let total = filtered.len();
        let limit = filters.limit.clamp(1, 100);
        let page = filtered
            .into_iter()
            .skip(filters.offset)
            .take(limit)
            .collect();

        Ok((page, total))
    }
}
