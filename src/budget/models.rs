use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Validate that a Decimal is non-negative
fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must be non-negative"));
    }
    Ok(())
}

/// Database entity for per-category monthly budgets
#[derive(Debug, Clone, FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: String,
    pub month: i16,
    pub year: i16,
    pub limit_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Budget row joined with the month's expense total in its category
#[derive(Debug, Clone, FromRow)]
pub struct BudgetWithSpent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: String,
    pub month: i16,
    pub year: i16,
    pub limit_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub spent_amount: Decimal,
}

/// Budget information with computed fields
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResponse {
    pub id: Uuid,
    /// Category this limit applies to
    #[schema(example = "Alimentação")]
    pub category: String,
    /// Month, 1-12
    #[schema(example = 4)]
    pub month: i16,
    #[schema(example = 2025)]
    pub year: i16,
    /// Spending limit for the month
    #[schema(example = 800.00)]
    pub limit_amount: Decimal,
    /// Computed: expenses in this category and month
    #[schema(example = 350.00)]
    pub spent_amount: Decimal,
    /// Computed: limit - spent
    #[schema(example = 450.00)]
    pub remaining_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetResponse {
    pub fn from_budget_with_spent(budget: BudgetWithSpent) -> Self {
        let remaining_amount = budget.limit_amount - budget.spent_amount;
        Self {
            id: budget.id,
            category: budget.category,
            month: budget.month,
            year: budget.year,
            limit_amount: budget.limit_amount,
            spent_amount: budget.spent_amount,
            remaining_amount,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }

    pub fn from_budget(budget: Budget) -> Self {
        Self {
            id: budget.id,
            category: budget.category,
            month: budget.month,
            year: budget.year,
            limit_amount: budget.limit_amount,
            spent_amount: Decimal::ZERO,
            remaining_amount: budget.limit_amount,
            created_at: budget.created_at,
            updated_at: budget.updated_at,
        }
    }
}

/// Response for listing budgets
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetsListResponse {
    pub budgets: Vec<BudgetResponse>,
    #[schema(example = 5)]
    pub count: usize,
}

/// Request body for creating a budget
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetDto {
    /// Category the limit applies to
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    #[schema(example = "Alimentação")]
    pub category: String,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    #[schema(example = 4)]
    pub month: i16,

    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    #[schema(example = 2025)]
    pub year: i16,

    /// Spending limit (must be non-negative)
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(example = 800.00)]
    pub limit_amount: Decimal,
}

/// Request body for updating a budget (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetDto {
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: Option<i16>,

    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: Option<i16>,

    pub limit_amount: Option<Decimal>,
}

impl UpdateBudgetDto {
    /// Validate decimal fields that can't use derive macro
    pub fn validate_decimals(&self) -> Result<(), ValidationError> {
        if let Some(limit) = &self.limit_amount {
            validate_non_negative(limit)?;
        }
        Ok(())
    }
}

/// Path parameters for budget ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct BudgetIdPath {
    /// Budget UUID
    pub id: Uuid,
}

/// Query parameters for listing budgets
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ListBudgetsQuery {
    /// Month to list, 1-12 (defaults to all months of the year)
    #[validate(range(min = 1, max = 12))]
    pub month: Option<i16>,

    /// Year to list (defaults to all)
    #[validate(range(min = 2000, max = 2100))]
    pub year: Option<i16>,
}
