use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::account::models::DeleteResponse;
use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::ledger::PgLedgerStore;
use crate::state::StateCache;

use super::models::{
    CreateGoalDto, GoalIdPath, GoalResponse, GoalsListResponse, UpdateGoalDto, UpdateProgressDto,
};
use super::service::GoalService;

/// GET /goals - List all goals for the authenticated user
#[utoipa::path(
    get,
    path = "/goals",
    tag = "Goals",
    responses(
        (status = 200, description = "List of goals", body = GoalsListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/goals")]
pub async fn list_goals(
    ledger: web::Data<PgLedgerStore>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    // The UI reads the mirror; mutations keep it current
    let goals = cache.cached_goals(ledger.get_ref(), auth.user_id).await?;

    let response = GoalsListResponse {
        count: goals.len(),
        goals: goals.into_iter().map(GoalResponse::from_goal).collect(),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// GET /goals/{id} - Get a specific goal by ID
#[utoipa::path(
    get,
    path = "/goals/{id}",
    tag = "Goals",
    params(GoalIdPath),
    responses(
        (status = 200, description = "Goal details", body = GoalResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/goals/{id}")]
pub async fn get_goal(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<GoalIdPath>,
) -> Result<HttpResponse, AppError> {
    let goal = GoalService::get_goal_by_id(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(GoalResponse::from_goal(goal)))
}

/// POST /goals - Create a new goal
#[utoipa::path(
    post,
    path = "/goals",
    tag = "Goals",
    request_body = CreateGoalDto,
    responses(
        (status = 201, description = "Goal created", body = GoalResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/goals")]
pub async fn create_goal(
    pool: web::Data<PgPool>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    body: web::Json<CreateGoalDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let goal =
        GoalService::create_goal(pool.get_ref(), cache.get_ref(), auth.user_id, &body).await?;

    Ok(HttpResponse::Created().json(GoalResponse::from_goal(goal)))
}

/// PATCH /goals/{id} - Update a goal (partial update)
#[utoipa::path(
    patch,
    path = "/goals/{id}",
    tag = "Goals",
    params(GoalIdPath),
    request_body = UpdateGoalDto,
    responses(
        (status = 200, description = "Goal updated", body = GoalResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/goals/{id}")]
pub async fn update_goal(
    pool: web::Data<PgPool>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    path: web::Path<GoalIdPath>,
    body: web::Json<UpdateGoalDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    body.validate_fields()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let goal = GoalService::update_goal(
        pool.get_ref(),
        cache.get_ref(),
        path.id,
        auth.user_id,
        &body,
    )
    .await?;

    Ok(HttpResponse::Ok().json(GoalResponse::from_goal(goal)))
}

/// PATCH /goals/{id}/progress - Update saved amount only
#[utoipa::path(
    patch,
    path = "/goals/{id}/progress",
    tag = "Goals",
    params(GoalIdPath),
    request_body = UpdateProgressDto,
    responses(
        (status = 200, description = "Progress updated", body = GoalResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/goals/{id}/progress")]
pub async fn update_goal_progress(
    pool: web::Data<PgPool>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    path: web::Path<GoalIdPath>,
    body: web::Json<UpdateProgressDto>,
) -> Result<HttpResponse, AppError> {
    let goal = GoalService::update_progress(
        pool.get_ref(),
        cache.get_ref(),
        path.id,
        auth.user_id,
        &body,
    )
    .await?;

    Ok(HttpResponse::Ok().json(GoalResponse::from_goal(goal)))
}

/// DELETE /goals/{id} - Delete a goal
#[utoipa::path(
    delete,
    path = "/goals/{id}",
    tag = "Goals",
    params(GoalIdPath),
    responses(
        (status = 200, description = "Goal deleted", body = DeleteResponse),
        (status = 404, description = "Goal not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/goals/{id}")]
pub async fn delete_goal(
    pool: web::Data<PgPool>,
    cache: web::Data<StateCache>,
    auth: AuthenticatedUser,
    path: web::Path<GoalIdPath>,
) -> Result<HttpResponse, AppError> {
    GoalService::delete_goal(pool.get_ref(), cache.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: "Goal deleted successfully".to_string(),
        id: path.id,
    }))
}
