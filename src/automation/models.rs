use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;

/// Condition evaluated against a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Any income, optionally narrowed by a text filter
    IncomeReceived,
    /// Expense whose description contains the filter text
    ExpenseContains,
    /// Amount greater than or equal to the threshold
    AmountAbove,
    /// Category equals the configured category exactly
    CategoryMatch,
    /// Trigger tags from newer clients match nothing here instead of failing
    #[serde(other)]
    Unknown,
}

/// Fund-movement computation attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Move a percentage of the triggering amount
    TransferPercentage,
    /// Move a flat amount per trigger event
    TransferFixed,
    /// Reserved in the rule schema; has no execution path
    Categorize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleTrigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Text filter or numeric threshold, depending on the trigger type
    #[serde(default)]
    pub value: String,
    /// Category to equal, for category_match triggers
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Percentage of the basis amount (transfer_percentage)
    pub percentage: Option<Decimal>,
    /// Flat amount (transfer_fixed)
    pub fixed_amount: Option<Decimal>,
    /// Destination account; exactly one of account/goal is set
    pub target_account_id: Option<Uuid>,
    /// Destination goal; exactly one of account/goal is set
    pub target_goal_id: Option<Uuid>,
}

/// One historical record of a rule firing.
///
/// Append-only except for the `reversed` flag, which the reversal engine
/// sets retroactively. Links the causing transaction to the generated one so
/// every automated movement stays traceable.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleExecution {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    pub source_account_id: Uuid,
    pub target_account_id: Option<Uuid>,
    pub target_goal_id: Option<Uuid>,
    /// Transaction that matched the trigger
    pub trigger_transaction_id: Uuid,
    /// Generated audit transaction
    pub transaction_id: Uuid,
    #[serde(default)]
    pub reversed: bool,
    pub reversed_at: Option<DateTime<Utc>>,
}

/// User-defined trigger/action pair for automatic fund movement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoRule {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub trigger: RuleTrigger,
    pub action: RuleAction,
    pub last_executed: Option<DateTime<Utc>>,
    /// Count of non-reversed entries in `executions`
    #[serde(default)]
    pub execution_count: u32,
    #[serde(default)]
    pub executions: Vec<RuleExecution>,
}

impl AutoRule {
    /// Number of executions that have not been rolled back.
    pub fn active_executions(&self) -> usize {
        self.executions.iter().filter(|e| !e.reversed).count()
    }
}

/// Request body for creating a rule
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleDto {
    /// Rule name (1-80 characters)
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    #[schema(example = "Guardar 20% do salário")]
    pub name: String,

    /// Whether the rule fires on matching transactions (defaults to true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub trigger: RuleTrigger,

    pub action: RuleAction,
}

fn default_enabled() -> bool {
    true
}

/// Request body for updating a rule (PATCH - all fields optional).
///
/// Execution history is owned by the engine and cannot be edited here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleDto {
    #[validate(length(min = 1, max = 80, message = "Name must be 1-80 characters"))]
    pub name: Option<String>,

    pub enabled: Option<bool>,

    pub trigger: Option<RuleTrigger>,

    pub action: Option<RuleAction>,
}

/// Reject action specs that the engine cannot execute.
///
/// `categorize` is part of the rule schema for older configs but has no
/// execution path, so new and edited rules may not use it.
pub fn validate_action(action: &RuleAction) -> Result<(), AppError> {
    match action.action_type {
        ActionType::Categorize => {
            return Err(AppError::ValidationError(
                "The categorize action is reserved and cannot be used yet".to_string(),
            ));
        }
        ActionType::TransferPercentage => {
            let pct = action.percentage.ok_or_else(|| {
                AppError::ValidationError("percentage is required for this action".to_string())
            })?;
            if pct <= Decimal::ZERO || pct > Decimal::from(100) {
                return Err(AppError::ValidationError(
                    "percentage must be greater than 0 and at most 100".to_string(),
                ));
            }
        }
        ActionType::TransferFixed => {
            let amount = action.fixed_amount.ok_or_else(|| {
                AppError::ValidationError("fixedAmount is required for this action".to_string())
            })?;
            if amount <= Decimal::ZERO {
                return Err(AppError::ValidationError(
                    "fixedAmount must be positive".to_string(),
                ));
            }
        }
    }

    match (action.target_account_id, action.target_goal_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(AppError::ValidationError(
            "Exactly one of targetAccountId or targetGoalId must be set".to_string(),
        )),
    }
}

/// Rule as returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleResponse {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub trigger: RuleTrigger,
    pub action: RuleAction,
    pub last_executed: Option<DateTime<Utc>>,
    #[schema(example = 3)]
    pub execution_count: u32,
    pub executions: Vec<RuleExecution>,
}

impl From<AutoRule> for RuleResponse {
    fn from(rule: AutoRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            enabled: rule.enabled,
            trigger: rule.trigger,
            action: rule.action,
            last_executed: rule.last_executed,
            execution_count: rule.execution_count,
            executions: rule.executions,
        }
    }
}

/// Response for listing rules
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RulesListResponse {
    pub rules: Vec<RuleResponse>,
    #[schema(example = 2)]
    pub count: usize,
}

/// Path parameters for rule ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct RuleIdPath {
    /// Rule UUID
    pub id: Uuid,
}

/// Feedback from a manual "run now" request
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleRunResponse {
    /// One of "executed", "no_matching_transactions", "skipped"
    #[schema(example = "executed")]
    pub status: String,
    /// Human-readable outcome
    #[schema(example = "Transferred 200.00")]
    pub message: String,
    /// Amount moved, when executed
    #[schema(example = 200.00)]
    pub amount: Option<Decimal>,
    /// Generated audit transaction, when executed
    pub transaction_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_action(target_account: Option<Uuid>, target_goal: Option<Uuid>) -> RuleAction {
        RuleAction {
            action_type: ActionType::TransferPercentage,
            percentage: Some(Decimal::from(10)),
            fixed_amount: None,
            target_account_id: target_account,
            target_goal_id: target_goal,
        }
    }

    #[test]
    fn unknown_trigger_type_deserializes_as_unknown() {
        let trigger: RuleTrigger =
            serde_json::from_str(r#"{"type": "day_of_month", "value": "5"}"#).unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::Unknown);
    }

    #[test]
    fn validate_action_rejects_categorize() {
        let action = RuleAction {
            action_type: ActionType::Categorize,
            percentage: None,
            fixed_amount: None,
            target_account_id: None,
            target_goal_id: None,
        };
        assert!(validate_action(&action).is_err());
    }

    #[test]
    fn validate_action_requires_exactly_one_target() {
        assert!(validate_action(&transfer_action(None, None)).is_err());
        assert!(validate_action(&transfer_action(Some(Uuid::new_v4()), Some(Uuid::new_v4()))).is_err());
        assert!(validate_action(&transfer_action(Some(Uuid::new_v4()), None)).is_ok());
        assert!(validate_action(&transfer_action(None, Some(Uuid::new_v4()))).is_ok());
    }

    #[test]
    fn validate_action_bounds_percentage() {
        let mut action = transfer_action(Some(Uuid::new_v4()), None);
        action.percentage = Some(Decimal::ZERO);
        assert!(validate_action(&action).is_err());
        action.percentage = Some(Decimal::from(101));
        assert!(validate_action(&action).is_err());
        action.percentage = Some(Decimal::from(100));
        assert!(validate_action(&action).is_ok());
    }
}
