use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::account::models::validate_color_hex;

/// Validate that a Decimal is positive
fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

/// Database entity for savings goals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub deadline: Option<DateTime<Utc>>,
    pub color_hex: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Goal information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    /// Unique goal identifier
    pub id: Uuid,
    /// Goal name
    #[schema(example = "Emergency fund")]
    pub name: String,
    /// Amount to reach
    #[schema(example = 10000.00)]
    pub target_amount: Decimal,
    /// Amount saved so far
    #[schema(example = 2500.00)]
    pub current_amount: Decimal,
    /// Computed: completion percentage (0-100, capped)
    #[schema(example = 25.00)]
    pub progress: Decimal,
    /// Optional target date
    pub deadline: Option<DateTime<Utc>>,
    /// Display color in hex format
    #[schema(example = "#FF9800")]
    pub color_hex: String,
    /// Display icon name
    #[schema(example = "target")]
    pub icon: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl GoalResponse {
    pub fn from_goal(goal: Goal) -> Self {
        let hundred = Decimal::from(100);
        let progress = if goal.target_amount > Decimal::ZERO {
            (goal.current_amount * hundred / goal.target_amount)
                .round_dp(2)
                .min(hundred)
        } else {
            Decimal::ZERO
        };

        Self {
            id: goal.id,
            name: goal.name,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            progress,
            deadline: goal.deadline,
            color_hex: goal.color_hex,
            icon: goal.icon,
            created_at: goal.created_at,
            updated_at: goal.updated_at,
        }
    }
}

/// Response for listing goals
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoalsListResponse {
    /// List of goals
    pub goals: Vec<GoalResponse>,
    /// Total count
    #[schema(example = 2)]
    pub count: usize,
}

fn default_icon() -> String {
    "target".to_string()
}

/// Request body for creating a goal
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalDto {
    /// Goal name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Emergency fund")]
    pub name: String,

    /// Amount to reach (must be positive)
    #[validate(custom(
        function = "validate_positive",
        message = "Target amount must be positive"
    ))]
    #[schema(example = 10000.00)]
    pub target_amount: Decimal,

    /// Initial saved amount (defaults to 0)
    #[serde(default)]
    #[schema(example = 0.00)]
    pub current_amount: Option<Decimal>,

    /// Optional target date
    pub deadline: Option<DateTime<Utc>>,

    /// Display color in hex format (#RRGGBB)
    #[validate(custom(
        function = "validate_color_hex",
        message = "Color must be #RRGGBB format"
    ))]
    #[schema(example = "#FF9800")]
    pub color_hex: String,

    /// Display icon name (defaults to "target")
    #[serde(default = "default_icon")]
    #[schema(example = "target")]
    pub icon: String,
}

/// Request body for updating a goal (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalDto {
    /// Goal name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    /// Amount to reach
    pub target_amount: Option<Decimal>,

    /// Optional target date (null clears it)
    pub deadline: Option<Option<DateTime<Utc>>>,

    /// Display color in hex format
    pub color_hex: Option<String>,

    /// Display icon name
    pub icon: Option<String>,
}

impl UpdateGoalDto {
    /// Validate fields the derive macro can't cover
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if let Some(target) = &self.target_amount {
            validate_positive(target)?;
        }
        if let Some(color) = &self.color_hex {
            validate_color_hex(color)?;
        }
        Ok(())
    }
}

/// Request body for updating saved progress only
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressDto {
    /// New saved amount
    #[schema(example = 3200.00)]
    pub current_amount: Decimal,
}

/// Path parameters for goal ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct GoalIdPath {
    /// Goal UUID
    pub id: Uuid,
}
