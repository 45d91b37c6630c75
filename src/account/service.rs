use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Account, CreateAccountDto, UpdateAccountDto, UpdateBalanceDto};
use crate::errors::AppError;
use crate::state::StateCache;

/// Service layer for account business logic.
///
/// Balances changed here are direct user edits; transaction posting and the
/// automation engine go through the ledger store instead.
pub struct AccountService;

impl AccountService {
    /// Get an account by ID, ensuring the requesting user owns it.
    pub async fn get_account_by_id(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner_id, name, account_type, balance, color_hex, icon, created_at, updated_at
            FROM accounts
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(account_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Create a new account.
    pub async fn create_account(
        pool: &PgPool,
        cache: &StateCache,
        owner_id: Uuid,
        dto: &CreateAccountDto,
    ) -> Result<Account, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let balance = dto.balance.unwrap_or(Decimal::ZERO);

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner_id, name, account_type, balance, color_hex, icon)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, name, account_type, balance, color_hex, icon, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .bind(dto.account_type.as_str())
        .bind(balance)
        .bind(&dto.color_hex)
        .bind(&dto.icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        cache.invalidate(owner_id);
        Ok(account)
    }

    /// Update an account (partial update - PATCH semantics).
    pub async fn update_account(
        pool: &PgPool,
        cache: &StateCache,
        account_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateAccountDto,
    ) -> Result<Account, AppError> {
        // Verify ownership and get current account
        let current = Self::get_account_by_id(pool, account_id, owner_id).await?;

        let new_name = match &dto.name {
            Some(n) => {
                let trimmed = n.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Name cannot be empty".to_string(),
                    ));
                }
                trimmed
            }
            None => current.name,
        };

        let new_type = dto
            .account_type
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or(&current.account_type);

        let new_color = dto.color_hex.as_ref().unwrap_or(&current.color_hex);
        let new_icon = dto.icon.as_ref().unwrap_or(&current.icon);

        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                name = $3,
                account_type = $4,
                color_hex = $5,
                icon = $6,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, account_type, balance, color_hex, icon, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(new_type)
        .bind(new_color)
        .bind(new_icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        cache.invalidate(owner_id);
        Ok(account)
    }

    /// Update only the balance field (direct user edit).
    pub async fn update_balance(
        pool: &PgPool,
        cache: &StateCache,
        account_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateBalanceDto,
    ) -> Result<Account, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, account_type, balance, color_hex, icon, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(owner_id)
        .bind(dto.balance)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        cache.set_account_balance(owner_id, account_id, account.balance);
        Ok(account)
    }

    /// Delete an account.
    pub async fn delete_account(
        pool: &PgPool,
        cache: &StateCache,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND owner_id = $2")
            .bind(account_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        cache.invalidate(owner_id);
        Ok(())
    }
}
