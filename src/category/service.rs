use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Category, CreateCategoryDto, UpdateCategoryDto};
use crate::errors::AppError;

/// Service layer for category labels.
pub struct CategoryService;

impl CategoryService {
    /// List all categories for a user.
    pub async fn list_categories(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<Category>, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, owner_id, name, kind, color_hex, icon, created_at, updated_at
            FROM categories
            WHERE owner_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Create a new category.
    pub async fn create_category(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateCategoryDto,
    ) -> Result<Category, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE owner_id = $1 AND name = $2",
        )
        .bind(owner_id)
        .bind(&name)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if exists > 0 {
            return Err(AppError::Conflict(format!(
                "Category \"{name}\" already exists"
            )));
        }

        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (owner_id, name, kind, color_hex, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, name, kind, color_hex, icon, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&name)
        .bind(dto.kind.as_str())
        .bind(&dto.color_hex)
        .bind(&dto.icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Update a category (partial update - PATCH semantics).
    pub async fn update_category(
        pool: &PgPool,
        category_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateCategoryDto,
    ) -> Result<Category, AppError> {
        let current = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, owner_id, name, kind, color_hex, icon, created_at, updated_at
            FROM categories
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(category_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

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
        let new_kind = dto.kind.map(|k| k.as_str()).unwrap_or(&current.kind);
        let new_color = dto.color_hex.as_ref().unwrap_or(&current.color_hex);
        let new_icon = dto.icon.as_ref().unwrap_or(&current.icon);

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = $3,
                kind = $4,
                color_hex = $5,
                icon = $6,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, kind, color_hex, icon, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(new_kind)
        .bind(new_color)
        .bind(new_icon)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    /// Delete a category.
    pub async fn delete_category(
        pool: &PgPool,
        category_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(category_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        Ok(())
    }
}
