use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use fluxo_be::account::models::Account;
use fluxo_be::automation::models::{
    ActionType, AutoRule, RuleAction, RuleTrigger, TriggerType,
};
use fluxo_be::automation::store::RuleStore;
use fluxo_be::errors::AppError;
use fluxo_be::goal::models::Goal;
use fluxo_be::ledger::LedgerStore;
use fluxo_be::transaction::models::{NewTransaction, Transaction};

/// In-memory ledger store with failure injection, standing in for Postgres
/// so the engine tests need no database.
#[derive(Default)]
pub struct MemoryLedger {
    accounts: Mutex<Vec<Account>>,
    goals: Mutex<Vec<Goal>>,
    transactions: Mutex<Vec<Transaction>>,
    /// Balance/amount updates for these ids always fail
    failing_targets: Mutex<HashSet<Uuid>>,
    /// When set, only this many balance/amount updates succeed before
    /// everything starts failing
    remaining_updates: Mutex<Option<u32>>,
}

impl MemoryLedger {
    pub fn new(accounts: Vec<Account>, goals: Vec<Goal>, transactions: Vec<Transaction>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            goals: Mutex::new(goals),
            transactions: Mutex::new(transactions),
            ..Self::default()
        }
    }

    /// Make every balance/amount update for `id` fail.
    pub fn fail_updates_for(&self, id: Uuid) {
        self.failing_targets.lock().unwrap().insert(id);
    }

    /// Allow `n` more successful balance/amount updates, then fail all.
    pub fn allow_updates(&self, n: u32) {
        *self.remaining_updates.lock().unwrap() = Some(n);
    }

    pub fn account_balance(&self, id: Uuid) -> Decimal {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.balance)
            .expect("account should exist")
    }

    pub fn goal_amount(&self, id: Uuid) -> Decimal {
        self.goals
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.current_amount)
            .expect("goal should exist")
    }

    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.transactions.lock().unwrap().clone()
    }

    fn check_update_allowed(&self, id: Uuid) -> Result<(), AppError> {
        if self.failing_targets.lock().unwrap().contains(&id) {
            return Err(AppError::InternalError("injected write failure".to_string()));
        }
        let mut remaining = self.remaining_updates.lock().unwrap();
        if let Some(n) = remaining.as_mut() {
            if *n == 0 {
                return Err(AppError::InternalError("injected write failure".to_string()));
            }
            *n -= 1;
        }
        Ok(())
    }
}

impl LedgerStore for MemoryLedger {
    async fn accounts(&self, owner_id: Uuid) -> Result<Vec<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn goals(&self, owner_id: Uuid) -> Result<Vec<Goal>, AppError> {
        Ok(self
            .goals
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn transactions(&self, owner_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let mut list: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(list)
    }

    async fn transaction_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Transaction>, AppError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn insert_transaction(
        &self,
        owner_id: Uuid,
        new: NewTransaction,
    ) -> Result<Transaction, AppError> {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            owner_id,
            date: new.date,
            description: new.description,
            amount: new.amount,
            transaction_type: new.transaction_type.as_str().to_string(),
            category: new.category,
            account_id: new.account_id,
            to_account_id: new.to_account_id,
            goal_id: new.goal_id,
            is_recurring: new.is_recurring,
            recurring_frequency: new.recurring_frequency,
            rule_id: new.rule_id,
            created_at: Utc::now(),
        };
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(transaction)
    }

    async fn update_account_balance(
        &self,
        owner_id: Uuid,
        account_id: Uuid,
        balance: Decimal,
    ) -> Result<(), AppError> {
        self.check_update_allowed(account_id)?;
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id && a.owner_id == owner_id)
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
        account.balance = balance;
        Ok(())
    }

    async fn update_goal_amount(
        &self,
        owner_id: Uuid,
        goal_id: Uuid,
        current_amount: Decimal,
    ) -> Result<(), AppError> {
        self.check_update_allowed(goal_id)?;
        let mut goals = self.goals.lock().unwrap();
        let goal = goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.owner_id == owner_id)
            .ok_or_else(|| AppError::NotFound("Goal not found".to_string()))?;
        goal.current_amount = current_amount;
        Ok(())
    }

    async fn delete_transaction(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut transactions = self.transactions.lock().unwrap();
        let before = transactions.len();
        transactions.retain(|t| !(t.id == id && t.owner_id == owner_id));
        if transactions.len() == before {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }
        Ok(())
    }
}

/// In-memory rule slot, one list per owner.
#[derive(Default)]
pub struct MemoryRuleStore {
    slots: Mutex<HashMap<Uuid, Vec<AutoRule>>>,
}

impl MemoryRuleStore {
    pub fn with_rules(owner_id: Uuid, rules: Vec<AutoRule>) -> Self {
        let store = Self::default();
        store.slots.lock().unwrap().insert(owner_id, rules);
        store
    }

    pub fn rules(&self, owner_id: Uuid) -> Vec<AutoRule> {
        self.slots
            .lock()
            .unwrap()
            .get(&owner_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl RuleStore for MemoryRuleStore {
    async fn load(&self, owner_id: Uuid) -> Result<Vec<AutoRule>, AppError> {
        Ok(self.rules(owner_id))
    }

    async fn save(&self, owner_id: Uuid, rules: &[AutoRule]) -> Result<(), AppError> {
        self.slots.lock().unwrap().insert(owner_id, rules.to_vec());
        Ok(())
    }
}

// Fixture builders

pub fn account(owner_id: Uuid, name: &str, balance: i64) -> Account {
    Account {
        id: Uuid::new_v4(),
        owner_id,
        name: name.to_string(),
        account_type: "checking".to_string(),
        balance: Decimal::from(balance),
        color_hex: "#4CAF50".to_string(),
        icon: "wallet".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn goal(owner_id: Uuid, name: &str, target: i64, current: i64) -> Goal {
    Goal {
        id: Uuid::new_v4(),
        owner_id,
        name: name.to_string(),
        target_amount: Decimal::from(target),
        current_amount: Decimal::from(current),
        deadline: None,
        color_hex: "#FF9800".to_string(),
        icon: "target".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn transaction(
    owner_id: Uuid,
    account_id: Uuid,
    tx_type: &str,
    amount: i64,
    description: &str,
    date: DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        owner_id,
        date,
        description: description.to_string(),
        amount: Decimal::from(amount),
        transaction_type: tx_type.to_string(),
        category: "Geral".to_string(),
        account_id: Some(account_id),
        to_account_id: None,
        goal_id: None,
        is_recurring: false,
        recurring_frequency: None,
        rule_id: None,
        created_at: Utc::now(),
    }
}

pub fn income_trigger() -> RuleTrigger {
    RuleTrigger {
        trigger_type: TriggerType::IncomeReceived,
        value: String::new(),
        category: None,
    }
}

pub fn percentage_rule(name: &str, pct: i64, target_account_id: Uuid) -> AutoRule {
    AutoRule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        enabled: true,
        trigger: income_trigger(),
        action: RuleAction {
            action_type: ActionType::TransferPercentage,
            percentage: Some(Decimal::from(pct)),
            fixed_amount: None,
            target_account_id: Some(target_account_id),
            target_goal_id: None,
        },
        last_executed: None,
        execution_count: 0,
        executions: Vec::new(),
    }
}

pub fn fixed_rule(name: &str, amount: i64, target_account_id: Uuid) -> AutoRule {
    AutoRule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        enabled: true,
        trigger: income_trigger(),
        action: RuleAction {
            action_type: ActionType::TransferFixed,
            percentage: None,
            fixed_amount: Some(Decimal::from(amount)),
            target_account_id: Some(target_account_id),
            target_goal_id: None,
        },
        last_executed: None,
        execution_count: 0,
        executions: Vec::new(),
    }
}

pub fn goal_rule(name: &str, pct: i64, target_goal_id: Uuid) -> AutoRule {
    AutoRule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        enabled: true,
        trigger: income_trigger(),
        action: RuleAction {
            action_type: ActionType::TransferPercentage,
            percentage: Some(Decimal::from(pct)),
            fixed_amount: None,
            target_account_id: None,
            target_goal_id: Some(target_goal_id),
        },
        last_executed: None,
        execution_count: 0,
        executions: Vec::new(),
    }
}
