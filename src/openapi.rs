use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::models::{
    AccountResponse, AccountType, AccountsListResponse, CreateAccountDto, DeleteResponse,
    UpdateAccountDto, UpdateBalanceDto,
};
use crate::automation::models::{
    ActionType, AutoRule, CreateRuleDto, RuleAction, RuleExecution, RuleResponse, RuleRunResponse,
    RuleTrigger, RulesListResponse, TriggerType, UpdateRuleDto,
};
use crate::budget::models::{
    BudgetResponse, BudgetsListResponse, CreateBudgetDto, UpdateBudgetDto,
};
use crate::category::models::{
    CategoriesListResponse, CategoryKind, CategoryResponse, CreateCategoryDto, UpdateCategoryDto,
};
use crate::errors::ErrorResponse;
use crate::goal::models::{
    CreateGoalDto, GoalResponse, GoalsListResponse, UpdateGoalDto, UpdateProgressDto,
};
use crate::transaction::models::{
    CreateTransactionDto, PaginatedTransactionResponse, TransactionResponse, TransactionType,
};

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fluxo API",
        version = "1.0.0",
        description = "RESTful API for a personal finance dashboard with rule-based automation",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Accounts", description = "Financial account management"),
        (name = "Goals", description = "Savings goal management"),
        (name = "Categories", description = "Category label management"),
        (name = "Budgets", description = "Per-category monthly budgets"),
        (name = "Transactions", description = "Transaction log with balance posting and reversal"),
        (name = "Automation", description = "Trigger/action rules that move funds automatically")
    ),
    paths(
        // Account endpoints
        crate::account::handlers::list_accounts,
        crate::account::handlers::get_account,
        crate::account::handlers::create_account,
        crate::account::handlers::update_account,
        crate::account::handlers::update_account_balance,
        crate::account::handlers::delete_account,
        // Goal endpoints
        crate::goal::handlers::list_goals,
        crate::goal::handlers::get_goal,
        crate::goal::handlers::create_goal,
        crate::goal::handlers::update_goal,
        crate::goal::handlers::update_goal_progress,
        crate::goal::handlers::delete_goal,
        // Category endpoints
        crate::category::handlers::list_categories,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::delete_category,
        // Budget endpoints
        crate::budget::handlers::list_budgets,
        crate::budget::handlers::create_budget,
        crate::budget::handlers::update_budget,
        crate::budget::handlers::delete_budget,
        // Transaction endpoints
        crate::transaction::handlers::list_transactions,
        crate::transaction::handlers::get_transaction,
        crate::transaction::handlers::create_transaction,
        crate::transaction::handlers::reverse_transaction,
        // Automation endpoints
        crate::automation::handlers::list_rules,
        crate::automation::handlers::create_rule,
        crate::automation::handlers::update_rule,
        crate::automation::handlers::delete_rule,
        crate::automation::handlers::execute_rule,
    ),
    components(
        schemas(
            // Error response
            ErrorResponse,
            DeleteResponse,
            // Account schemas
            AccountType,
            AccountResponse,
            AccountsListResponse,
            CreateAccountDto,
            UpdateAccountDto,
            UpdateBalanceDto,
            // Goal schemas
            GoalResponse,
            GoalsListResponse,
            CreateGoalDto,
            UpdateGoalDto,
            UpdateProgressDto,
            // Category schemas
            CategoryKind,
            CategoryResponse,
            CategoriesListResponse,
            CreateCategoryDto,
            UpdateCategoryDto,
            // Budget schemas
            BudgetResponse,
            BudgetsListResponse,
            CreateBudgetDto,
            UpdateBudgetDto,
            // Transaction schemas
            TransactionType,
            TransactionResponse,
            PaginatedTransactionResponse,
            CreateTransactionDto,
            // Automation schemas
            TriggerType,
            ActionType,
            RuleTrigger,
            RuleAction,
            RuleExecution,
            AutoRule,
            RuleResponse,
            RulesListResponse,
            RuleRunResponse,
            CreateRuleDto,
            UpdateRuleDto,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
