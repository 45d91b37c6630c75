use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::account::models::validate_color_hex;

/// Category kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Labels income transactions
    Income,
    /// Labels expense transactions
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

/// Database entity for category labels.
///
/// Transactions store the category name as plain text; this table is the
/// registry the pickers offer.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub kind: String,
    pub color_hex: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Unique category identifier
    pub id: Uuid,
    /// Category name
    #[schema(example = "Alimentação")]
    pub name: String,
    /// income or expense
    #[schema(example = "expense")]
    pub kind: String,
    /// Display color in hex format
    #[schema(example = "#4CAF50")]
    pub color_hex: String,
    /// Display icon name
    #[schema(example = "shopping-cart")]
    pub icon: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CategoryResponse {
    pub fn from_category(cat: Category) -> Self {
        Self {
            id: cat.id,
            name: cat.name,
            kind: cat.kind,
            color_hex: cat.color_hex,
            icon: cat.icon,
            created_at: cat.created_at,
            updated_at: cat.updated_at,
        }
    }
}

/// Response for listing categories
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesListResponse {
    pub categories: Vec<CategoryResponse>,
    #[schema(example = 8)]
    pub count: usize,
}

fn default_color() -> String {
    "#64748b".to_string()
}

fn default_icon() -> String {
    "tag".to_string()
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    /// Category name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "Alimentação")]
    pub name: String,

    /// income or expense
    pub kind: CategoryKind,

    /// Display color in hex format (defaults to #64748b)
    #[validate(custom(
        function = "validate_color_hex",
        message = "Color must be in #RRGGBB format"
    ))]
    #[serde(default = "default_color")]
    #[schema(example = "#4CAF50")]
    pub color_hex: String,

    /// Display icon name (defaults to "tag")
    #[serde(default = "default_icon")]
    #[schema(example = "shopping-cart")]
    pub icon: String,
}

/// Request body for updating a category (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    /// Category name
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    /// income or expense
    pub kind: Option<CategoryKind>,

    /// Display color in hex format
    pub color_hex: Option<String>,

    /// Display icon name
    pub icon: Option<String>,
}

impl UpdateCategoryDto {
    /// Validate optional color field
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if let Some(color) = &self.color_hex {
            validate_color_hex(color)?;
        }
        Ok(())
    }
}

/// Path parameters for category ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryIdPath {
    /// Category UUID
    pub id: Uuid,
}
