use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::LedgerStore;
use crate::account::models::Account;
use crate::errors::AppError;
use crate::goal::models::Goal;
use crate::transaction::models::{NewTransaction, Transaction};

/// Postgres-backed ledger store.
///
/// Each call issues exactly one statement so that a failure leaves no
/// half-applied work behind inside the store itself.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LedgerStore for PgLedgerStore {
    async fn accounts(&self, owner_id: Uuid) -> Result<Vec<Account>, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner_id, name, account_type, balance, color_hex, icon, created_at, updated_at
            FROM accounts
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn goals(&self, owner_id: Uuid) -> Result<Vec<Goal>, AppError> {
        sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, owner_id, name, target_amount, current_amount, deadline, color_hex, icon,
                   created_at, updated_at
            FROM goals
            WHERE owner_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn transactions(&self, owner_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, date, description, amount, transaction_type, category,
                   account_id, to_account_id, goal_id, is_recurring, recurring_frequency,
                   rule_id, created_at
            FROM transactions
            WHERE owner_id = $1
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn transaction_by_id(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Transaction>, AppError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, owner_id, date, description, amount, transaction_type, category,
                   account_id, to_account_id, goal_id, is_recurring, recurring_frequency,
                   rule_id, created_at
            FROM transactions
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn insert_transaction(
        &self,
        owner_id: Uuid,
        new: NewTransaction,
    ) -> Result<Transaction, AppError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (owner_id, date, description, amount, transaction_type, category,
                 account_id, to_account_id, goal_id, is_recurring, recurring_frequency, rule_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, owner_id, date, description, amount, transaction_type, category,
                      account_id, to_account_id, goal_id, is_recurring, recurring_frequency,
                      rule_id, created_at
            "#,
        )
        .bind(owner_id)
        .bind(new.date)
        .bind(&new.description)
        .bind(new.amount)
        .bind(new.transaction_type.as_str())
        .bind(&new.category)
        .bind(new.account_id)
        .bind(new.to_account_id)
        .bind(new.goal_id)
        .bind(new.is_recurring)
        .bind(&new.recurring_frequency)
        .bind(new.rule_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    async fn update_account_balance(
        &self,
        owner_id: Uuid,
        account_id: Uuid,
        balance: Decimal,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE accounts SET balance = $3, updated_at = $4 WHERE id = $1 AND owner_id = $2",
        )
        .bind(account_id)
        .bind(owner_id)
        .bind(balance)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }
        Ok(())
    }

    async fn update_goal_amount(
        &self,
        owner_id: Uuid,
        goal_id: Uuid,
        current_amount: Decimal,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE goals SET current_amount = $3, updated_at = $4 WHERE id = $1 AND owner_id = $2",
        )
        .bind(goal_id)
        .bind(owner_id)
        .bind(current_amount)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Goal not found".to_string()));
        }
        Ok(())
    }

    async fn delete_transaction(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transaction not found".to_string()));
        }
        Ok(())
    }
}
