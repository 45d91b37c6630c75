use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Transaction type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent (decreases account balance)
    #[default]
    Expense,
    /// Money received (increases account balance)
    Income,
    /// Money put into an investment account position
    Investment,
    /// Money set aside (optionally into a goal)
    Savings,
    /// Movement between two accounts
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
            TransactionType::Investment => "investment",
            TransactionType::Savings => "savings",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "expense" => Some(TransactionType::Expense),
            "income" => Some(TransactionType::Income),
            "investment" => Some(TransactionType::Investment),
            "savings" => Some(TransactionType::Savings),
            "transfer" => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

/// Validate that amount is positive
fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}

/// Database model for transactions.
///
/// The transaction log is an audit trail, not the source of truth for
/// balances: account balances are mutated alongside each insert and are
/// never recomputed from this table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: String,
    pub category: String,
    pub account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<String>,
    /// Set when this record was generated by an automation rule
    pub rule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn get_type(&self) -> TransactionType {
        TransactionType::parse(&self.transaction_type).unwrap_or_default()
    }
}

/// Fields for inserting a new transaction record
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub category: String,
    pub account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<String>,
    pub rule_id: Option<Uuid>,
}

/// Transaction information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Unique transaction identifier
    pub id: Uuid,
    /// Date of the transaction
    pub date: DateTime<Utc>,
    /// Description
    #[schema(example = "Weekly groceries")]
    pub description: String,
    /// Transaction amount (always positive)
    #[schema(example = 50.00)]
    pub amount: Decimal,
    /// Transaction type (income, expense, investment, savings, transfer)
    #[serde(rename = "type")]
    #[schema(example = "expense")]
    pub transaction_type: String,
    /// Category label
    #[schema(example = "Alimentação")]
    pub category: String,
    /// Source account
    pub account_id: Option<Uuid>,
    /// Destination account (transfers only)
    pub to_account_id: Option<Uuid>,
    /// Destination goal (savings only)
    pub goal_id: Option<Uuid>,
    /// Whether this repeats
    pub is_recurring: bool,
    /// Repeat frequency (monthly, weekly, ...)
    pub recurring_frequency: Option<String>,
    /// Originating automation rule, if any
    pub rule_id: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            date: t.date,
            description: t.description,
            amount: t.amount,
            transaction_type: t.transaction_type,
            category: t.category,
            account_id: t.account_id,
            to_account_id: t.to_account_id,
            goal_id: t.goal_id,
            is_recurring: t.is_recurring,
            recurring_frequency: t.recurring_frequency,
            rule_id: t.rule_id,
            created_at: t.created_at,
        }
    }
}

/// Request body for creating a transaction
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionDto {
    /// Date of the transaction (defaults to now)
    pub date: Option<DateTime<Utc>>,

    /// Description (1-200 chars)
    #[validate(length(min = 1, max = 200, message = "Description must be 1-200 characters"))]
    #[schema(example = "Weekly groceries")]
    pub description: String,

    /// Transaction amount (must be positive)
    #[validate(custom(
        function = "validate_positive_amount",
        message = "Amount must be positive"
    ))]
    #[schema(example = 50.00)]
    pub amount: Decimal,

    /// Transaction type (defaults to expense)
    #[serde(default, rename = "type")]
    pub transaction_type: TransactionType,

    /// Category label
    #[validate(length(min = 1, max = 50, message = "Category must be 1-50 characters"))]
    #[schema(example = "Alimentação")]
    pub category: String,

    /// Source account
    pub account_id: Option<Uuid>,

    /// Destination account (required for transfers)
    pub to_account_id: Option<Uuid>,

    /// Destination goal (savings only)
    pub goal_id: Option<Uuid>,

    /// Whether this repeats
    #[serde(default)]
    pub is_recurring: bool,

    /// Repeat frequency
    pub recurring_frequency: Option<String>,
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilters {
    /// Filter by start date
    pub start_date: Option<DateTime<Utc>>,
    /// Filter by end date
    pub end_date: Option<DateTime<Utc>>,
    /// Filter by category
    pub category: Option<String>,
    /// Filter by account
    pub account_id: Option<Uuid>,
    /// Filter by type (income, expense, investment, savings, transfer)
    #[param(example = "expense")]
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,

    /// Maximum results (1-100)
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    #[param(example = 50)]
    pub limit: usize,

    /// Number of results to skip
    #[serde(default)]
    #[param(example = 0)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedTransactionResponse {
    /// List of transactions
    pub data: Vec<TransactionResponse>,
    /// Total count matching filters
    #[schema(example = 100)]
    pub total: usize,
    /// Limit used
    #[schema(example = 50)]
    pub limit: usize,
    /// Offset used
    #[schema(example = 0)]
    pub offset: usize,
}

/// Path parameters for transaction ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionIdPath {
    /// Transaction UUID
    pub id: Uuid,
}
