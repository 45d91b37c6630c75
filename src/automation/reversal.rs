use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, warn};
use uuid::Uuid;

use super::store::RuleStore;
use super::{AUTOMATION_CATEGORY, AUTOMATION_PREFIX, AUTOMATION_TRANSFER_CATEGORY};
use crate::account::models::Account;
use crate::errors::AppError;
use crate::ledger::{with_retry, LedgerStore};
use crate::state::StateCache;
use crate::transaction::models::{Transaction, TransactionType};

lazy_static! {
    // Free-text transfers predate structured to_account_id links. The only
    // record of their legs is this description shape.
    static ref LEGACY_TRANSFER_RE: Regex =
        Regex::new(r"^Transferência: (.+?) → (.+)$").expect("legacy transfer pattern is valid");
}

/// True when a transaction was produced by the rule engine. The structured
/// link is `rule_id`; the prefix and the reserved categories cover records
/// written before that column existed.
pub fn is_automation_generated(txn: &Transaction) -> bool {
    txn.rule_id.is_some()
        || txn.description.starts_with(AUTOMATION_PREFIX)
        || txn.category == AUTOMATION_CATEGORY
        || txn.category == AUTOMATION_TRANSFER_CATEGORY
}

/// How to undo a transaction's balance effect.
#[derive(Debug, PartialEq, Eq)]
enum ReversalKind {
    /// Structured transfer: debit came out of `source`, credit went to `target`
    TwoLegAccounts { source: Uuid, target: Uuid },
    /// Savings movement into a goal
    AccountToGoal { source: Uuid, goal: Uuid },
    /// Free-text transfer; legs only known by account name
    LegacyTransfer { from_name: String, to_name: String },
    /// Single-account inverse (or nothing to undo)
    Plain,
}

/// Single place that knows how to read a transaction's shape. Swapping the
/// legacy name matching for a structured link later only touches this.
fn classify(txn: &Transaction) -> ReversalKind {
    match txn.get_type() {
        TransactionType::Transfer => {
            if let (Some(source), Some(target)) = (txn.account_id, txn.to_account_id) {
                return ReversalKind::TwoLegAccounts { source, target };
            }
            if let Some(caps) = LEGACY_TRANSFER_RE.captures(&txn.description) {
                return ReversalKind::LegacyTransfer {
                    from_name: caps[1].to_string(),
                    to_name: caps[2].to_string(),
                };
            }
            ReversalKind::Plain
        }
        TransactionType::Savings => match (txn.account_id, txn.goal_id) {
            (Some(source), Some(goal)) => ReversalKind::AccountToGoal { source, goal },
            _ => ReversalKind::Plain,
        },
        _ => ReversalKind::Plain,
    }
}

/// Undo a transaction's balance effects, roll back any rule bookkeeping, and
/// delete the record.
///
/// Reversal is not re-entrant: a second call for the same id fails with
/// NotFound because the record is gone, and nothing is mutated.
pub async fn reverse_transaction<L: LedgerStore, R: RuleStore>(
    ledger: &L,
    rules: &R,
    cache: &StateCache,
    owner_id: Uuid,
    transaction_id: Uuid,
) -> Result<(), AppError> {
    let txn = ledger
        .transaction_by_id(owner_id, transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    let accounts = cache.fresh_accounts(ledger, owner_id).await?;
    let goals = cache.fresh_goals(ledger, owner_id).await?;

    match classify(&txn) {
        ReversalKind::TwoLegAccounts { source, target } => {
            let source_acc = find_account(&accounts, source)?;
            let target_acc = find_account(&accounts, target)?;
            undo_two_account_legs(ledger, cache, owner_id, &txn, source_acc, target_acc).await?;
        }
        ReversalKind::AccountToGoal { source, goal } => {
            let source_acc = find_account(&accounts, source)?;
            let goal_entry = goals.iter().find(|g| g.id == goal).ok_or_else(|| {
                AppError::NotFound("Goal of this transaction no longer exists".to_string())
            })?;

            let restored_balance = source_acc.balance + txn.amount;
            with_retry("credit source account", || {
                ledger.update_account_balance(owner_id, source_acc.id, restored_balance)
            })
            .await?;

            let reduced_amount = goal_entry.current_amount - txn.amount;
            if let Err(err) = with_retry("debit goal", || {
                ledger.update_goal_amount(owner_id, goal_entry.id, reduced_amount)
            })
            .await
            {
                error!("goal debit failed during reversal, restoring account: {err}");
                with_retry("restore account balance", || {
                    ledger.update_account_balance(owner_id, source_acc.id, source_acc.balance)
                })
                .await
                .map_err(|e| {
                    AppError::ConsistencyError(format!(
                        "account {} credited during a failed reversal and the restore failed: {e}",
                        source_acc.id
                    ))
                })?;
                return Err(err);
            }

            cache.set_account_balance(owner_id, source_acc.id, restored_balance);
            cache.set_goal_amount(owner_id, goal_entry.id, reduced_amount);
        }
        ReversalKind::LegacyTransfer { from_name, to_name } => {
            // Both legs must resolve before anything moves; a renamed or
            // deleted account makes this transfer impossible to undo safely.
            let from_acc = accounts.iter().find(|a| a.name == from_name).ok_or_else(|| {
                AppError::NotFound(format!(
                    "Cannot reverse transfer: account \"{from_name}\" not found"
                ))
            })?;
            let to_acc = accounts.iter().find(|a| a.name == to_name).ok_or_else(|| {
                AppError::NotFound(format!(
                    "Cannot reverse transfer: account \"{to_name}\" not found"
                ))
            })?;
            undo_two_account_legs(ledger, cache, owner_id, &txn, from_acc, to_acc).await?;
        }
        ReversalKind::Plain => {
            if let Some(account_id) = txn.account_id {
                match accounts.iter().find(|a| a.id == account_id) {
                    Some(account) => {
                        let delta = match txn.get_type() {
                            TransactionType::Income => -txn.amount,
                            TransactionType::Expense
                            | TransactionType::Investment
                            | TransactionType::Savings => txn.amount,
                            TransactionType::Transfer => rust_decimal::Decimal::ZERO,
                        };
                        if !delta.is_zero() {
                            let restored = account.balance + delta;
                            with_retry("invert account balance", || {
                                ledger.update_account_balance(owner_id, account.id, restored)
                            })
                            .await?;
                            cache.set_account_balance(owner_id, account.id, restored);
                        }
                    }
                    None => {
                        warn!(
                            "account {account_id} of transaction {} no longer exists, \
                             deleting record without balance change",
                            txn.id
                        );
                    }
                }
            }
        }
    }

    if is_automation_generated(&txn) {
        match txn.rule_id {
            Some(rule_id) => rollback_rule_execution(rules, owner_id, rule_id, txn.id).await?,
            None => warn!(
                "transaction {} is automation-generated but predates rule links; \
                 execution history left untouched",
                txn.id
            ),
        }
    }

    with_retry("delete transaction", || {
        ledger.delete_transaction(owner_id, txn.id)
    })
    .await?;
    cache.remove_transaction(owner_id, txn.id);

    Ok(())
}

fn find_account(accounts: &[Account], id: Uuid) -> Result<&Account, AppError> {
    accounts.iter().find(|a| a.id == id).ok_or_else(|| {
        AppError::NotFound("Account of this transaction no longer exists".to_string())
    })
}

/// Credit the original source back, then take the credit out of the target.
/// Mirrors the executor's two-phase shape, compensation included.
async fn undo_two_account_legs<L: LedgerStore>(
    ledger: &L,
    cache: &StateCache,
    owner_id: Uuid,
    txn: &Transaction,
    source: &Account,
    target: &Account,
) -> Result<(), AppError> {
    let restored_source = source.balance + txn.amount;
    with_retry("credit source account", || {
        ledger.update_account_balance(owner_id, source.id, restored_source)
    })
    .await?;

    let reduced_target = target.balance - txn.amount;
    if let Err(err) = with_retry("debit target account", || {
        ledger.update_account_balance(owner_id, target.id, reduced_target)
    })
    .await
    {
        error!("target debit failed during reversal, restoring source: {err}");
        with_retry("restore source balance", || {
            ledger.update_account_balance(owner_id, source.id, source.balance)
        })
        .await
        .map_err(|e| {
            AppError::ConsistencyError(format!(
                "account {} credited during a failed reversal and the restore failed: {e}",
                source.id
            ))
        })?;
        return Err(err);
    }

    cache.set_account_balance(owner_id, source.id, restored_source);
    cache.set_account_balance(owner_id, target.id, reduced_target);
    Ok(())
}

/// Mark the execution that produced `transaction_id` as reversed and drop
/// the rule's live count, keeping the count == non-reversed invariant.
async fn rollback_rule_execution<R: RuleStore>(
    rules: &R,
    owner_id: Uuid,
    rule_id: Uuid,
    transaction_id: Uuid,
) -> Result<(), AppError> {
    let mut rule_list = rules.load(owner_id).await?;

    let Some(rule) = rule_list.iter_mut().find(|r| r.id == rule_id) else {
        warn!("originating rule {rule_id} of transaction {transaction_id} no longer exists");
        return Ok(());
    };

    match rule
        .executions
        .iter_mut()
        .find(|e| e.transaction_id == transaction_id)
    {
        Some(execution) => {
            execution.reversed = true;
            execution.reversed_at = Some(Utc::now());
        }
        None => {
            warn!("rule {rule_id} has no execution for transaction {transaction_id}");
        }
    }
    rule.execution_count = rule.execution_count.saturating_sub(1);

    rules.save(owner_id, &rule_list).await
}
