use std::fmt;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::matcher;
use super::models::{ActionType, AutoRule, RuleExecution};
use super::resolver;
use super::{AUTOMATION_CATEGORY, AUTOMATION_PREFIX, AUTOMATION_TRANSFER_CATEGORY};
use crate::account::models::Account;
use crate::errors::AppError;
use crate::goal::models::Goal;
use crate::ledger::{with_retry, LedgerStore};
use crate::transaction::models::{NewTransaction, Transaction, TransactionType};

/// Why a rule did not execute against a transaction.
///
/// None of these stop the evaluation loop; one rule's skip must not block
/// the rules after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NoTriggerMatch,
    NothingToTransfer,
    ActionNotExecutable,
    SourceAccountMissing,
    TargetAccountMissing,
    TargetGoalMissing,
    SameAccount,
    InsufficientFunds,
    PersistFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Disabled => "rule is disabled",
            SkipReason::NoTriggerMatch => "trigger did not match",
            SkipReason::NothingToTransfer => "resolved amount is zero or negative",
            SkipReason::ActionNotExecutable => "action type has no execution path",
            SkipReason::SourceAccountMissing => "source account not found",
            SkipReason::TargetAccountMissing => "target account not found",
            SkipReason::TargetGoalMissing => "target goal not found",
            SkipReason::SameAccount => "source and target are the same account",
            SkipReason::InsufficientFunds => "insufficient balance",
            SkipReason::PersistFailed => "a ledger write failed",
        };
        f.write_str(text)
    }
}

/// Everything a successful execution produced: the post-transfer snapshots,
/// the audit transaction and the execution record to append to the rule.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub accounts: Vec<Account>,
    pub goals: Vec<Goal>,
    pub transaction: Transaction,
    pub execution: RuleExecution,
}

#[derive(Debug)]
pub enum RuleOutcome {
    Executed(Box<ExecutionOutcome>),
    Skipped(SkipReason),
}

/// Evaluate one rule against the transaction that just arrived and, on a
/// match, move the money.
///
/// State goes in by value and comes out in the returned outcome; nothing is
/// mutated in place, so the caller decides what the next rule gets to see.
pub async fn execute_rule<L: LedgerStore>(
    ledger: &L,
    owner_id: Uuid,
    rule: &AutoRule,
    trigger_txn: &Transaction,
    accounts: &[Account],
    goals: &[Goal],
) -> Result<RuleOutcome, AppError> {
    if !rule.enabled {
        return Ok(RuleOutcome::Skipped(SkipReason::Disabled));
    }
    if !matcher::matches(trigger_txn, &rule.trigger) {
        return Ok(RuleOutcome::Skipped(SkipReason::NoTriggerMatch));
    }
    if rule.action.action_type == ActionType::Categorize {
        return Ok(RuleOutcome::Skipped(SkipReason::ActionNotExecutable));
    }

    let amount = resolver::resolve_amount(&rule.action, trigger_txn.amount);
    if amount <= Decimal::ZERO {
        return Ok(RuleOutcome::Skipped(SkipReason::NothingToTransfer));
    }

    transfer(ledger, owner_id, rule, trigger_txn, amount, accounts, goals).await
}

/// Perform the balance movement for an already-resolved amount.
///
/// The manual run-now path calls this directly after computing a batch
/// basis; the event path goes through [`execute_rule`].
pub async fn transfer<L: LedgerStore>(
    ledger: &L,
    owner_id: Uuid,
    rule: &AutoRule,
    trigger_txn: &Transaction,
    amount: Decimal,
    accounts: &[Account],
    goals: &[Goal],
) -> Result<RuleOutcome, AppError> {
    let source = match trigger_txn
        .account_id
        .and_then(|id| accounts.iter().find(|a| a.id == id))
    {
        Some(account) => account.clone(),
        None => {
            error!(
                rule = %rule.name,
                "source account of trigger transaction {} not found",
                trigger_txn.id
            );
            return Ok(RuleOutcome::Skipped(SkipReason::SourceAccountMissing));
        }
    };

    if source.balance < amount {
        info!(
            rule = %rule.name,
            "skipping: balance {} below transfer amount {}",
            source.balance,
            amount
        );
        return Ok(RuleOutcome::Skipped(SkipReason::InsufficientFunds));
    }

    if let Some(target_id) = rule.action.target_account_id {
        transfer_to_account(ledger, owner_id, rule, trigger_txn, amount, &source, target_id, accounts, goals)
            .await
    } else if let Some(goal_id) = rule.action.target_goal_id {
        transfer_to_goal(ledger, owner_id, rule, trigger_txn, amount, &source, goal_id, accounts, goals)
            .await
    } else {
        error!(rule = %rule.name, "transfer action has no target");
        Ok(RuleOutcome::Skipped(SkipReason::TargetAccountMissing))
    }
}

#[allow(clippy::too_many_arguments)]
async fn transfer_to_account<L: LedgerStore>(
    ledger: &L,
    owner_id: Uuid,
    rule: &AutoRule,
    trigger_txn: &Transaction,
    amount: Decimal,
    source: &Account,
    target_id: Uuid,
    accounts: &[Account],
    goals: &[Goal],
) -> Result<RuleOutcome, AppError> {
    let target = match accounts.iter().find(|a| a.id == target_id) {
        Some(account) => account.clone(),
        None => {
            error!(rule = %rule.name, "target account {target_id} not found");
            return Ok(RuleOutcome::Skipped(SkipReason::TargetAccountMissing));
        }
    };
    if target.id == source.id {
        warn!(rule = %rule.name, "rule targets its own source account, skipping");
        return Ok(RuleOutcome::Skipped(SkipReason::SameAccount));
    }

    let new_source_balance = source.balance - amount;
    let new_target_balance = target.balance + amount;

    // First leg: debit the source. A failure here means nothing moved.
    if with_retry("debit source account", || {
        ledger.update_account_balance(owner_id, source.id, new_source_balance)
    })
    .await
    .is_err()
    {
        return Ok(RuleOutcome::Skipped(SkipReason::PersistFailed));
    }

    // Second leg: credit the target. A failure here MUST restore the source,
    // otherwise the debit stands with no matching credit anywhere.
    if let Err(err) = with_retry("credit target account", || {
        ledger.update_account_balance(owner_id, target.id, new_target_balance)
    })
    .await
    {
        error!(
            rule = %rule.name,
            "credit to account {} failed, rolling back source debit: {err}",
            target.id
        );
        restore_account(ledger, owner_id, source).await?;
        return Ok(RuleOutcome::Skipped(SkipReason::PersistFailed));
    }

    let new_txn = NewTransaction {
        date: Utc::now(),
        description: audit_description(rule, trigger_txn),
        amount,
        transaction_type: TransactionType::Transfer,
        category: AUTOMATION_TRANSFER_CATEGORY.to_string(),
        account_id: Some(source.id),
        to_account_id: Some(target.id),
        goal_id: None,
        is_recurring: false,
        recurring_frequency: None,
        rule_id: Some(rule.id),
    };
    let transaction = match with_retry("insert audit transaction", || {
        ledger.insert_transaction(owner_id, new_txn.clone())
    })
    .await
    {
        Ok(transaction) => transaction,
        Err(err) => {
            error!(
                rule = %rule.name,
                "audit record insert failed, rolling back both legs: {err}"
            );
            restore_account(ledger, owner_id, &target).await?;
            restore_account(ledger, owner_id, source).await?;
            return Ok(RuleOutcome::Skipped(SkipReason::PersistFailed));
        }
    };

    let mut accounts = accounts.to_vec();
    for account in &mut accounts {
        if account.id == source.id {
            account.balance = new_source_balance;
        } else if account.id == target.id {
            account.balance = new_target_balance;
        }
    }

    let execution = RuleExecution {
        id: Uuid::new_v4(),
        date: Utc::now(),
        amount,
        source_account_id: source.id,
        target_account_id: Some(target.id),
        target_goal_id: None,
        trigger_transaction_id: trigger_txn.id,
        transaction_id: transaction.id,
        reversed: false,
        reversed_at: None,
    };

    Ok(RuleOutcome::Executed(Box::new(ExecutionOutcome {
        accounts,
        goals: goals.to_vec(),
        transaction,
        execution,
    })))
}

#[allow(clippy::too_many_arguments)]
async fn transfer_to_goal<L: LedgerStore>(
    ledger: &L,
    owner_id: Uuid,
    rule: &AutoRule,
    trigger_txn: &Transaction,
    amount: Decimal,
    source: &Account,
    goal_id: Uuid,
    accounts: &[Account],
    goals: &[Goal],
) -> Result<RuleOutcome, AppError> {
    let goal = match goals.iter().find(|g| g.id == goal_id) {
        Some(goal) => goal.clone(),
        None => {
            error!(rule = %rule.name, "target goal {goal_id} not found");
            return Ok(RuleOutcome::Skipped(SkipReason::TargetGoalMissing));
        }
    };

    let new_source_balance = source.balance - amount;
    let new_goal_amount = goal.current_amount + amount;

    if with_retry("debit source account", || {
        ledger.update_account_balance(owner_id, source.id, new_source_balance)
    })
    .await
    .is_err()
    {
        return Ok(RuleOutcome::Skipped(SkipReason::PersistFailed));
    }

    if let Err(err) = with_retry("credit target goal", || {
        ledger.update_goal_amount(owner_id, goal.id, new_goal_amount)
    })
    .await
    {
        error!(
            rule = %rule.name,
            "credit to goal {} failed, rolling back source debit: {err}",
            goal.id
        );
        restore_account(ledger, owner_id, source).await?;
        return Ok(RuleOutcome::Skipped(SkipReason::PersistFailed));
    }

    let new_txn = NewTransaction {
        date: Utc::now(),
        description: audit_description(rule, trigger_txn),
        amount,
        transaction_type: TransactionType::Savings,
        category: AUTOMATION_CATEGORY.to_string(),
        account_id: Some(source.id),
        to_account_id: None,
        goal_id: Some(goal.id),
        is_recurring: false,
        recurring_frequency: None,
        rule_id: Some(rule.id),
    };
    let transaction = match with_retry("insert audit transaction", || {
        ledger.insert_transaction(owner_id, new_txn.clone())
    })
    .await
    {
        Ok(transaction) => transaction,
        Err(err) => {
            error!(
                rule = %rule.name,
                "audit record insert failed, rolling back both legs: {err}"
            );
            restore_goal(ledger, owner_id, &goal).await?;
            restore_account(ledger, owner_id, source).await?;
            return Ok(RuleOutcome::Skipped(SkipReason::PersistFailed));
        }
    };

    let mut accounts = accounts.to_vec();
    if let Some(account) = accounts.iter_mut().find(|a| a.id == source.id) {
        account.balance = new_source_balance;
    }
    let mut goals = goals.to_vec();
    if let Some(entry) = goals.iter_mut().find(|g| g.id == goal.id) {
        entry.current_amount = new_goal_amount;
    }

    let execution = RuleExecution {
        id: Uuid::new_v4(),
        date: Utc::now(),
        amount,
        source_account_id: source.id,
        target_account_id: None,
        target_goal_id: Some(goal.id),
        trigger_transaction_id: trigger_txn.id,
        transaction_id: transaction.id,
        reversed: false,
        reversed_at: None,
    };

    Ok(RuleOutcome::Executed(Box::new(ExecutionOutcome {
        accounts,
        goals,
        transaction,
        execution,
    })))
}

/// Compensating write that puts an account back at its pre-transfer balance.
/// If even this fails, the ledger is out of step with itself and the caller
/// must surface it.
async fn restore_account<L: LedgerStore>(
    ledger: &L,
    owner_id: Uuid,
    account: &Account,
) -> Result<(), AppError> {
    with_retry("restore account balance", || {
        ledger.update_account_balance(owner_id, account.id, account.balance)
    })
    .await
    .map_err(|err| {
        AppError::ConsistencyError(format!(
            "account {} is debited but the compensating restore to {} failed: {err}",
            account.id, account.balance
        ))
    })
}

async fn restore_goal<L: LedgerStore>(
    ledger: &L,
    owner_id: Uuid,
    goal: &Goal,
) -> Result<(), AppError> {
    with_retry("restore goal amount", || {
        ledger.update_goal_amount(owner_id, goal.id, goal.current_amount)
    })
    .await
    .map_err(|err| {
        AppError::ConsistencyError(format!(
            "goal {} is credited but the compensating restore to {} failed: {err}",
            goal.id, goal.current_amount
        ))
    })
}

/// Deterministic description of a generated transaction. Legacy reversal
/// matches on this text, so the format is a contract.
fn audit_description(rule: &AutoRule, basis: &Transaction) -> String {
    match rule.action.action_type {
        ActionType::TransferPercentage => {
            let pct = rule.action.percentage.unwrap_or_default().normalize();
            format!(
                "{AUTOMATION_PREFIX}{} ({}% de {})",
                rule.name, pct, basis.description
            )
        }
        _ => {
            let amount = rule.action.fixed_amount.unwrap_or_default().normalize();
            format!(
                "{AUTOMATION_PREFIX}{} (R$ {} de {})",
                rule.name, amount, basis.description
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::models::{RuleAction, RuleTrigger, TriggerType};

    fn rule_named(name: &str, action: RuleAction) -> AutoRule {
        AutoRule {
            id: Uuid::new_v4(),
            name: name.to_string(),
            enabled: true,
            trigger: RuleTrigger {
                trigger_type: TriggerType::IncomeReceived,
                value: String::new(),
                category: None,
            },
            action,
            last_executed: None,
            execution_count: 0,
            executions: Vec::new(),
        }
    }

    fn basis_txn(description: &str) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            date: Utc::now(),
            description: description.to_string(),
            amount: Decimal::from(1000),
            transaction_type: "income".to_string(),
            category: "Trabalho".to_string(),
            account_id: Some(Uuid::new_v4()),
            to_account_id: None,
            goal_id: None,
            is_recurring: false,
            recurring_frequency: None,
            rule_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_description_format() {
        let rule = rule_named(
            "Guardar salário",
            RuleAction {
                action_type: ActionType::TransferPercentage,
                percentage: Some(Decimal::from(20)),
                fixed_amount: None,
                target_account_id: Some(Uuid::new_v4()),
                target_goal_id: None,
            },
        );
        assert_eq!(
            audit_description(&rule, &basis_txn("Salário Abril")),
            "Automação: Guardar salário (20% de Salário Abril)"
        );
    }

    #[test]
    fn fixed_description_format() {
        let rule = rule_named(
            "Poupança fixa",
            RuleAction {
                action_type: ActionType::TransferFixed,
                percentage: None,
                fixed_amount: Some(Decimal::from(75)),
                target_account_id: None,
                target_goal_id: Some(Uuid::new_v4()),
            },
        );
        assert_eq!(
            audit_description(&rule, &basis_txn("Depósito")),
            "Automação: Poupança fixa (R$ 75 de Depósito)"
        );
    }
}
