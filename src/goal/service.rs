use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{CreateGoalDto, Goal, UpdateGoalDto, UpdateProgressDto};
use crate::errors::AppError;
use crate::state::StateCache;

/// Service layer for savings-goal business logic.
pub struct GoalService;

impl GoalService {
    /// Get a goal by ID, ensuring the requesting user owns it.
    pub async fn get_goal_by_id(
        pool: &PgPool,
        goal_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Goal, AppError> {
        sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, owner_id, name, target_amount, current_amount, deadline, color_hex, icon,
                   created_at, updated_at
            FROM goals
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(goal_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Goal not found".to_string()))
    }

    /// Create a new goal.
    pub async fn create_goal(
        pool: &PgPool,
        cache: &StateCache,
        owner_id: Uuid,
        dto: &CreateGoalDto,
    ) -> Result<Goal, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let current = dto.current_amount.unwrap_or(Decimal::ZERO);
        if current < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Current amount cannot be negative".to_string(),
            ));
        }

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (owner_id, name, target_amount, current_amount, deadline, color_hex, icon)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_id, name, target_amount, current_amount, deadline, color_hex, icon,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .bind(dto.target_amount)
        .bind(current)
        .bind(dto.deadline)
        .bind(&dto.color_hex)
        .bind(&dto.icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        cache.invalidate(owner_id);
        Ok(goal)
    }

    /// Update a goal (partial update - PATCH semantics).
    pub async fn update_goal(
        pool: &PgPool,
        cache: &StateCache,
        goal_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateGoalDto,
    ) -> Result<Goal, AppError> {
        let current = Self::get_goal_by_id(pool, goal_id, owner_id).await?;

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

        let new_target = dto.target_amount.unwrap_or(current.target_amount);
        let new_deadline = match &dto.deadline {
            Some(value) => *value,
            None => current.deadline,
        };
        let new_color = dto.color_hex.as_ref().unwrap_or(&current.color_hex);
        let new_icon = dto.icon.as_ref().unwrap_or(&current.icon);

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals SET
                name = $3,
                target_amount = $4,
                deadline = $5,
                color_hex = $6,
                icon = $7,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, target_amount, current_amount, deadline, color_hex, icon,
                      created_at, updated_at
            "#,
        )
        .bind(goal_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(new_target)
        .bind(new_deadline)
        .bind(new_color)
        .bind(new_icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        cache.invalidate(owner_id);
        Ok(goal)
    }

    /// Update only the saved amount (direct user edit).
    pub async fn update_progress(
        pool: &PgPool,
        cache: &StateCache,
        goal_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateProgressDto,
    ) -> Result<Goal, AppError> {
        if dto.current_amount < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Current amount cannot be negative".to_string(),
            ));
        }

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET current_amount = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, target_amount, current_amount, deadline, color_hex, icon,
                      created_at, updated_at
            "#,
        )
        .bind(goal_id)
        .bind(owner_id)
        .bind(dto.current_amount)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Goal not found".to_string()))?;

        cache.set_goal_amount(owner_id, goal_id, goal.current_amount);
        Ok(goal)
    }

    /// Delete a goal.
    pub async fn delete_goal(
        pool: &PgPool,
        cache: &StateCache,
        goal_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND owner_id = $2")
            .bind(goal_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Goal not found".to_string()));
        }

        cache.invalidate(owner_id);
        Ok(())
    }
}
