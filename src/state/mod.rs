use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::account::models::Account;
use crate::errors::AppError;
use crate::goal::models::Goal;
use crate::ledger::LedgerStore;
use crate::transaction::models::Transaction;

/// Last-known account/goal/transaction state for one owner.
#[derive(Debug, Default, Clone)]
pub struct OwnerSnapshot {
    pub accounts: Vec<Account>,
    pub goals: Vec<Goal>,
    pub transactions: Vec<Transaction>,
}

/// In-memory mirror of ledger state, one snapshot per owner.
///
/// Reads served from here can lag the ledger by one batched update; the
/// `fresh_*` accessors exist for the paths that cannot tolerate that lag
/// (rule evaluation, reversal). Mutators apply the same change optimistically
/// after the corresponding ledger write succeeded.
#[derive(Default)]
pub struct StateCache {
    owners: DashMap<Uuid, OwnerSnapshot>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached accounts, loading from the ledger on a cold cache.
    pub async fn cached_accounts<L: LedgerStore>(
        &self,
        ledger: &L,
        owner_id: Uuid,
    ) -> Result<Vec<Account>, AppError> {
        if let Some(snapshot) = self.owners.get(&owner_id) {
            if !snapshot.accounts.is_empty() {
                return Ok(snapshot.accounts.clone());
            }
        }
        self.fresh_accounts(ledger, owner_id).await
    }

    /// Cached goals, loading from the ledger on a cold cache.
    pub async fn cached_goals<L: LedgerStore>(
        &self,
        ledger: &L,
        owner_id: Uuid,
    ) -> Result<Vec<Goal>, AppError> {
        if let Some(snapshot) = self.owners.get(&owner_id) {
            if !snapshot.goals.is_empty() {
                return Ok(snapshot.goals.clone());
            }
        }
        self.fresh_goals(ledger, owner_id).await
    }

    /// Re-read accounts from the ledger and replace the mirror.
    pub async fn fresh_accounts<L: LedgerStore>(
        &self,
        ledger: &L,
        owner_id: Uuid,
    ) -> Result<Vec<Account>, AppError> {
        let accounts = ledger.accounts(owner_id).await?;
        self.owners.entry(owner_id).or_default().accounts = accounts.clone();
        Ok(accounts)
    }

    /// Re-read goals from the ledger and replace the mirror.
    pub async fn fresh_goals<L: LedgerStore>(
        &self,
        ledger: &L,
        owner_id: Uuid,
    ) -> Result<Vec<Goal>, AppError> {
        let goals = ledger.goals(owner_id).await?;
        self.owners.entry(owner_id).or_default().goals = goals.clone();
        Ok(goals)
    }

    /// Replace the account mirror with a snapshot the caller already holds.
    pub fn store_accounts(&self, owner_id: Uuid, accounts: Vec<Account>) {
        self.owners.entry(owner_id).or_default().accounts = accounts;
    }

    /// Replace the goal mirror with a snapshot the caller already holds.
    pub fn store_goals(&self, owner_id: Uuid, goals: Vec<Goal>) {
        self.owners.entry(owner_id).or_default().goals = goals;
    }

    pub fn set_account_balance(&self, owner_id: Uuid, account_id: Uuid, balance: Decimal) {
        if let Some(mut snapshot) = self.owners.get_mut(&owner_id) {
            if let Some(account) = snapshot.accounts.iter_mut().find(|a| a.id == account_id) {
                account.balance = balance;
            }
        }
    }

    pub fn set_goal_amount(&self, owner_id: Uuid, goal_id: Uuid, current_amount: Decimal) {
        if let Some(mut snapshot) = self.owners.get_mut(&owner_id) {
            if let Some(goal) = snapshot.goals.iter_mut().find(|g| g.id == goal_id) {
                goal.current_amount = current_amount;
            }
        }
    }

    pub fn push_transaction(&self, owner_id: Uuid, transaction: Transaction) {
        self.owners
            .entry(owner_id)
            .or_default()
            .transactions
            .insert(0, transaction);
    }

    pub fn remove_transaction(&self, owner_id: Uuid, transaction_id: Uuid) {
        if let Some(mut snapshot) = self.owners.get_mut(&owner_id) {
            snapshot.transactions.retain(|t| t.id != transaction_id);
        }
    }

    /// Drop an owner's snapshot entirely; the next read reloads it.
    pub fn invalidate(&self, owner_id: Uuid) {
        let _ = self.owners.remove(&owner_id);
    }
}
