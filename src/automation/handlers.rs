use actix_web::{delete, get, patch, post, web, HttpResponse};
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::ledger::PgLedgerStore;
use crate::state::StateCache;

use super::models::{
    CreateRuleDto, RuleIdPath, RuleResponse, RuleRunResponse, RulesListResponse, UpdateRuleDto,
};
use super::service::{AutomationService, ManualRunOutcome};
use super::store::PgRuleStore;

/// GET /rules - List all automation rules for the authenticated user
#[utoipa::path(
    get,
    path = "/rules",
    tag = "Automation",
    responses(
        (status = 200, description = "List of rules", body = RulesListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/rules")]
pub async fn list_rules(
    rule_store: web::Data<PgRuleStore>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let rules = AutomationService::list_rules(rule_store.get_ref(), auth.user_id).await?;

    let response = RulesListResponse {
        count: rules.len(),
        rules: rules.into_iter().map(RuleResponse::from).collect(),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// POST /rules - Create a new automation rule
#[utoipa::path(
    post,
    path = "/rules",
    tag = "Automation",
    request_body = CreateRuleDto,
    responses(
        (status = 201, description = "Rule created", body = RuleResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/rules")]
pub async fn create_rule(
    rule_store: web::Data<PgRuleStore>,
    auth: AuthenticatedUser,
    body: web::Json<CreateRuleDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let rule =
        AutomationService::add_rule(rule_store.get_ref(), auth.user_id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(RuleResponse::from(rule)))
}

/// PATCH /rules/{id} - Update an automation rule (partial update)
#[utoipa::path(
    patch,
    path = "/rules/{id}",
    tag = "Automation",
    params(RuleIdPath),
    request_body = UpdateRuleDto,
    responses(
        (status = 200, description = "Rule updated", body = RuleResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/rules/{id}")]
pub async fn update_rule(
    rule_store: web::Data<PgRuleStore>,
    auth: AuthenticatedUser,
    path: web::Path<RuleIdPath>,
    body: web::Json<UpdateRuleDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let rule = AutomationService::update_rule(
        rule_store.get_ref(),
        auth.user_id,
        path.id,
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(RuleResponse::from(rule)))
}

/// DELETE /rules/{id} - Delete an automation rule
#[utoipa::path(
    delete,
    path = "/rules/{id}",
    tag = "Automation",
    params(RuleIdPath),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/rules/{id}")]
pub async fn delete_rule(
    rule_store: web::Data<PgRuleStore>,
    auth: AuthenticatedUser,
    path: web::Path<RuleIdPath>,
) -> Result<HttpResponse, AppError> {
    AutomationService::delete_rule(rule_store.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /rules/{id}/execute - Run a rule against the last 30 days
#[utoipa::path(
    post,
    path = "/rules/{id}/execute",
    tag = "Automation",
    params(RuleIdPath),
    responses(
        (status = 200, description = "Run outcome", body = RuleRunResponse),
        (status = 404, description = "Rule not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/rules/{id}/execute")]
pub async fn execute_rule(
    ledger: web::Data<PgLedgerStore>,
    rule_store: web::Data<PgRuleStore>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    path: web::Path<RuleIdPath>,
) -> Result<HttpResponse, AppError> {
    let outcome = AutomationService::run_rule_now(
        ledger.get_ref(),
        rule_store.get_ref(),
        cache.get_ref(),
        auth.user_id,
        path.id,
    )
    .await?;

    let response = match outcome {
        ManualRunOutcome::Executed {
            amount,
            transaction_id,
        } => RuleRunResponse {
            status: "executed".to_string(),
            message: format!("Transferred {amount}"),
            amount: Some(amount),
            transaction_id: Some(transaction_id),
        },
        ManualRunOutcome::NoMatchingTransactions => RuleRunResponse {
            status: "no_matching_transactions".to_string(),
            message: "No transactions matched this rule in the last 30 days".to_string(),
            amount: None,
            transaction_id: None,
        },
        ManualRunOutcome::Skipped(reason) => RuleRunResponse {
            status: "skipped".to_string(),
            message: reason.to_string(),
            amount: None,
            transaction_id: None,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}
