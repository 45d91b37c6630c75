use actix_web::{delete, get, post, web, HttpResponse};
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::ledger::PgLedgerStore;
use crate::state::StateCache;

use super::models::{
    CreateTransactionDto, PaginatedTransactionResponse, TransactionFilters, TransactionIdPath,
    TransactionResponse,
};
use super::service::TransactionService;
use crate::account::models::DeleteResponse;
use crate::automation::store::PgRuleStore;

/// GET /transactions - List transactions with filters
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Transactions",
    params(TransactionFilters),
    responses(
        (status = 200, description = "Paginated transactions", body = PaginatedTransactionResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions")]
pub async fn list_transactions(
    ledger: web::Data<PgLedgerStore>,
    auth: AuthenticatedUser,
    query: web::Query<TransactionFilters>,
) -> Result<HttpResponse, AppError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let (transactions, total) =
        TransactionService::list_transactions(ledger.get_ref(), auth.user_id, &query).await?;

    let response = PaginatedTransactionResponse {
        data: transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
        total,
        limit: query.limit,
        offset: query.offset,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// GET /transactions/{id} - Get a specific transaction by ID
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    responses(
        (status = 200, description = "Transaction details", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/{id}")]
pub async fn get_transaction(
    ledger: web::Data<PgLedgerStore>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
) -> Result<HttpResponse, AppError> {
    let transaction =
        TransactionService::get_transaction(ledger.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::Ok().json(TransactionResponse::from(transaction)))
}

/// POST /transactions - Record a transaction and post its balance effect.
/// Income transactions additionally feed the automation rule engine.
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "Transactions",
    request_body = CreateTransactionDto,
    responses(
        (status = 201, description = "Transaction created", body = TransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Referenced account or goal not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/transactions")]
pub async fn create_transaction(
    ledger: web::Data<PgLedgerStore>,
    rule_store: web::Data<PgRuleStore>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    body: web::Json<CreateTransactionDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let transaction = TransactionService::create_transaction(
        ledger.get_ref(),
        rule_store.get_ref(),
        cache.get_ref(),
        auth.user_id,
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Created().json(TransactionResponse::from(transaction)))
}

/// DELETE /transactions/{id} - Reverse a transaction.
/// Applies the inverse balance effect (including automation bookkeeping)
/// and deletes the record.
#[utoipa::path(
    delete,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    responses(
        (status = 200, description = "Transaction reversed and deleted", body = DeleteResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/transactions/{id}")]
pub async fn reverse_transaction(
    ledger: web::Data<PgLedgerStore>,
    rule_store: web::Data<PgRuleStore>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
) -> Result<HttpResponse, AppError> {
    TransactionService::reverse_transaction(
        ledger.get_ref(),
        rule_store.get_ref(),
        cache.get_ref(),
        auth.user_id,
        path.id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: "Transaction reversed successfully".to_string(),
        id: path.id,
    }))
}
