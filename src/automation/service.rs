use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::executor::{self, RuleOutcome, SkipReason};
use super::matcher;
use super::models::{validate_action, ActionType, AutoRule, CreateRuleDto, UpdateRuleDto};
use super::resolver;
use super::store::RuleStore;
use crate::errors::AppError;
use crate::ledger::{with_retry, LedgerStore};
use crate::state::StateCache;
use crate::transaction::models::Transaction;

/// Result of a manual "run now" request. Unlike event-triggered execution,
/// the caller sees exactly what happened.
#[derive(Debug)]
pub enum ManualRunOutcome {
    Executed { amount: Decimal, transaction_id: Uuid },
    NoMatchingTransactions,
    Skipped(SkipReason),
}

/// Service layer for rule configuration and execution.
pub struct AutomationService;

impl AutomationService {
    pub async fn list_rules<R: RuleStore>(
        store: &R,
        owner_id: Uuid,
    ) -> Result<Vec<AutoRule>, AppError> {
        store.load(owner_id).await
    }

    pub async fn add_rule<R: RuleStore>(
        store: &R,
        owner_id: Uuid,
        dto: CreateRuleDto,
    ) -> Result<AutoRule, AppError> {
        validate_action(&dto.action)?;

        let rule = AutoRule {
            id: Uuid::new_v4(),
            name: dto.name.trim().to_string(),
            enabled: dto.enabled,
            trigger: dto.trigger,
            action: dto.action,
            last_executed: None,
            execution_count: 0,
            executions: Vec::new(),
        };

        let mut rules = store.load(owner_id).await?;
        rules.push(rule.clone());
        store.save(owner_id, &rules).await?;

        Ok(rule)
    }

    pub async fn update_rule<R: RuleStore>(
        store: &R,
        owner_id: Uuid,
        rule_id: Uuid,
        dto: UpdateRuleDto,
    ) -> Result<AutoRule, AppError> {
        if let Some(action) = &dto.action {
            validate_action(action)?;
        }

        let mut rules = store.load(owner_id).await?;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| AppError::NotFound("Rule not found".to_string()))?;

        if let Some(name) = dto.name {
            rule.name = name.trim().to_string();
        }
        if let Some(enabled) = dto.enabled {
            rule.enabled = enabled;
        }
        if let Some(trigger) = dto.trigger {
            rule.trigger = trigger;
        }
        if let Some(action) = dto.action {
            rule.action = action;
        }
        let updated = rule.clone();

        store.save(owner_id, &rules).await?;
        Ok(updated)
    }

    pub async fn delete_rule<R: RuleStore>(
        store: &R,
        owner_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), AppError> {
        let mut rules = store.load(owner_id).await?;
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        if rules.len() == before {
            return Err(AppError::NotFound("Rule not found".to_string()));
        }
        store.save(owner_id, &rules).await
    }

    /// Evaluate every rule against a transaction that just posted.
    ///
    /// Rules run sequentially and each successful transfer's state feeds the
    /// next evaluation, so two rules can legitimately chain off the same
    /// account's updated balance. Returns how many executed. Individual
    /// skips and persist failures are logged and never stop the loop; the
    /// only error that propagates is a failed rollback, which the caller
    /// must surface.
    pub async fn run_rules_for_transaction<L: LedgerStore, R: RuleStore>(
        ledger: &L,
        rule_store: &R,
        cache: &StateCache,
        owner_id: Uuid,
        trigger_txn: &Transaction,
    ) -> Result<usize, AppError> {
        let mut rules = rule_store.load(owner_id).await?;
        if rules.is_empty() {
            return Ok(0);
        }

        let mut accounts = cache.fresh_accounts(ledger, owner_id).await?;
        let mut goals = cache.fresh_goals(ledger, owner_id).await?;
        let mut executed = 0;

        for index in 0..rules.len() {
            let rule = rules[index].clone();
            match executor::execute_rule(ledger, owner_id, &rule, trigger_txn, &accounts, &goals)
                .await?
            {
                RuleOutcome::Executed(outcome) => {
                    accounts = outcome.accounts;
                    goals = outcome.goals;
                    cache.push_transaction(owner_id, outcome.transaction.clone());

                    let entry = &mut rules[index];
                    entry.executions.push(outcome.execution);
                    entry.execution_count += 1;
                    entry.last_executed = Some(Utc::now());

                    if let Err(err) =
                        with_retry("save rules", || rule_store.save(owner_id, &rules)).await
                    {
                        // Money already moved and the audit transaction
                        // exists; losing the execution entry is bad but not
                        // worth blocking the remaining rules over.
                        error!(rule = %rule.name, "failed to persist execution record: {err}");
                    }

                    executed += 1;
                    info!(
                        rule = %rule.name,
                        "rule executed, moved {}",
                        outcome.transaction.amount
                    );
                }
                RuleOutcome::Skipped(SkipReason::NoTriggerMatch)
                | RuleOutcome::Skipped(SkipReason::Disabled) => {
                    debug!(rule = %rule.name, "rule not applicable");
                }
                RuleOutcome::Skipped(reason) => {
                    info!(rule = %rule.name, "rule skipped: {reason}");
                }
            }
        }

        cache.store_accounts(owner_id, accounts);
        cache.store_goals(owner_id, goals);

        Ok(executed)
    }

    /// Manually run one rule against the trailing scan window.
    ///
    /// The percentage basis is the sum of every matching transaction's
    /// amount, applied once; the most recent match stands in as the trigger
    /// (its account pays, its description labels the audit record).
    pub async fn run_rule_now<L: LedgerStore, R: RuleStore>(
        ledger: &L,
        rule_store: &R,
        cache: &StateCache,
        owner_id: Uuid,
        rule_id: Uuid,
    ) -> Result<ManualRunOutcome, AppError> {
        let mut rules = rule_store.load(owner_id).await?;
        let index = rules
            .iter()
            .position(|r| r.id == rule_id)
            .ok_or_else(|| AppError::NotFound("Rule not found".to_string()))?;
        let rule = rules[index].clone();

        if !rule.enabled {
            return Ok(ManualRunOutcome::Skipped(SkipReason::Disabled));
        }
        if rule.action.action_type == ActionType::Categorize {
            return Ok(ManualRunOutcome::Skipped(SkipReason::ActionNotExecutable));
        }

        let transactions = ledger.transactions(owner_id).await?;
        let matching = matcher::matching_in_window(&transactions, &rule.trigger, Utc::now());
        if matching.is_empty() {
            return Ok(ManualRunOutcome::NoMatchingTransactions);
        }

        let basis = resolver::batch_basis(matching.iter().map(|t| t.amount));
        let amount = resolver::resolve_amount(&rule.action, basis);
        if amount <= Decimal::ZERO {
            return Ok(ManualRunOutcome::Skipped(SkipReason::NothingToTransfer));
        }

        let trigger_txn = matching[0].clone();
        let accounts = cache.fresh_accounts(ledger, owner_id).await?;
        let goals = cache.fresh_goals(ledger, owner_id).await?;

        match executor::transfer(
            ledger,
            owner_id,
            &rule,
            &trigger_txn,
            amount,
            &accounts,
            &goals,
        )
        .await?
        {
            RuleOutcome::Executed(outcome) => {
                cache.store_accounts(owner_id, outcome.accounts);
                cache.store_goals(owner_id, outcome.goals);
                cache.push_transaction(owner_id, outcome.transaction.clone());

                let entry = &mut rules[index];
                entry.executions.push(outcome.execution);
                entry.execution_count += 1;
                entry.last_executed = Some(Utc::now());
                with_retry("save rules", || rule_store.save(owner_id, &rules)).await?;

                Ok(ManualRunOutcome::Executed {
                    amount,
                    transaction_id: outcome.transaction.id,
                })
            }
            RuleOutcome::Skipped(reason) => Ok(ManualRunOutcome::Skipped(reason)),
        }
    }
}
