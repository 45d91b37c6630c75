use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Budget, BudgetWithSpent, CreateBudgetDto, ListBudgetsQuery, UpdateBudgetDto};
use crate::errors::AppError;

/// Service layer for per-category monthly budgets.
pub struct BudgetService;

impl BudgetService {
    /// List budgets with the month's spending aggregated per row.
    pub async fn list_budgets(
        pool: &PgPool,
        owner_id: Uuid,
        query: &ListBudgetsQuery,
    ) -> Result<Vec<BudgetWithSpent>, AppError> {
        sqlx::query_as::<_, BudgetWithSpent>(
            r#"
            SELECT b.id, b.owner_id, b.category, b.month, b.year, b.limit_amount,
                   b.created_at, b.updated_at,
                   COALESCE((
                       SELECT SUM(t.amount)
                       FROM transactions t
                       WHERE t.owner_id = b.owner_id
                         AND t.transaction_type = 'expense'
                         AND t.category = b.category
                         AND EXTRACT(MONTH FROM t.date) = b.month
                         AND EXTRACT(YEAR FROM t.date) = b.year
                   ), 0) AS spent_amount
            FROM budgets b
            WHERE b.owner_id = $1
              AND ($2::smallint IS NULL OR b.month = $2)
              AND ($3::smallint IS NULL OR b.year = $3)
            ORDER BY b.year DESC, b.month DESC, b.category ASC
            "#,
        )
        .bind(owner_id)
        .bind(query.month)
        .bind(query.year)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Create a new budget.
    pub async fn create_budget(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateBudgetDto,
    ) -> Result<Budget, AppError> {
        let category = dto.category.trim().to_string();
        if category.is_empty() {
            return Err(AppError::ValidationError(
                "Category cannot be empty".to_string(),
            ));
        }

        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM budgets
            WHERE owner_id = $1 AND category = $2 AND month = $3 AND year = $4
            "#,
        )
        .bind(owner_id)
        .bind(&category)
        .bind(dto.month)
        .bind(dto.year)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if exists > 0 {
            return Err(AppError::Conflict(format!(
                "A budget for \"{category}\" in {}/{} already exists",
                dto.month, dto.year
            )));
        }

        sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (owner_id, category, month, year, limit_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, category, month, year, limit_amount, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&category)
        .bind(dto.month)
        .bind(dto.year)
        .bind(dto.limit_amount)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Update a budget (partial update - PATCH semantics).
    pub async fn update_budget(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateBudgetDto,
    ) -> Result<Budget, AppError> {
        let current = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, owner_id, category, month, year, limit_amount, created_at, updated_at
            FROM budgets
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(budget_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Budget not found".to_string()))?;

        let new_category = match &dto.category {
            Some(c) => {
                let trimmed = c.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Category cannot be empty".to_string(),
                    ));
                }
                trimmed
            }
            None => current.category,
        };
        let new_month = dto.month.unwrap_or(current.month);
        let new_year = dto.year.unwrap_or(current.year);
        let new_limit = dto.limit_amount.unwrap_or(current.limit_amount);

        sqlx::query_as::<_, Budget>(
            r#"
            UPDATE budgets SET
                category = $3,
                month = $4,
                year = $5,
                limit_amount = $6,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, category, month, year, limit_amount, created_at, updated_at
            "#,
        )
        .bind(budget_id)
        .bind(owner_id)
        .bind(&new_category)
        .bind(new_month)
        .bind(new_year)
        .bind(new_limit)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Delete a budget.
    pub async fn delete_budget(
        pool: &PgPool,
        budget_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND owner_id = $2")
            .bind(budget_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Budget not found".to_string()));
        }

        Ok(())
    }
}
