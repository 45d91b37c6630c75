mod account;
mod automation;
mod budget;
mod category;
mod errors;
mod extractors;
mod goal;
mod ledger;
mod openapi;
mod state;
mod transaction;

use actix_cors::Cors;
use actix_web::{get, http::header, web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::automation::store::PgRuleStore;
use crate::ledger::PgLedgerStore;
use crate::state::StateCache;

/// Health check endpoint that verifies database connectivity
#[get("/health")]
async fn health_check(pool: web::Data<PgPool>) -> impl Responder {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    // Wrap JWT secret in Secret for secure handling
    let jwt_secret = Secret::new(jwt_secret);

    // Get allowed origins from environment (comma-separated), default to localhost
    let allowed_origins =
        env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    // Configure connection pool with production-ready settings
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&database_url)
        .await
        .expect("Failed to create pool");

    let ledger_store = PgLedgerStore::new(pool.clone());
    let rule_store = PgRuleStore::new(pool.clone());
    let cache = web::Data::new(StateCache::new());

    info!("Starting server at http://0.0.0.0:8080");

    HttpServer::new(move || {
        // Clone allowed_origins for this closure invocation
        let allowed_origins = allowed_origins.clone();

        // Configure CORS
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .split(',')
                    .any(|allowed| allowed.trim() == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            // Middleware (order matters: outer to inner)
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_secret.clone()))
            .app_data(web::Data::new(ledger_store.clone()))
            .app_data(web::Data::new(rule_store.clone()))
            .app_data(cache.clone())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
            )
            // Health endpoint
            .service(health_check)
            // Account endpoints (order matters: specific routes before generic {id} routes)
            .service(account::list_accounts)
            .service(account::get_account)
            .service(account::create_account)
            .service(account::update_account_balance)
            .service(account::update_account)
            .service(account::delete_account)
            // Goal endpoints (order matters: specific routes before generic {id} routes)
            .service(goal::list_goals)
            .service(goal::get_goal)
            .service(goal::create_goal)
            .service(goal::update_goal_progress)
            .service(goal::update_goal)
            .service(goal::delete_goal)
            // Category endpoints
            .service(category::list_categories)
            .service(category::create_category)
            .service(category::update_category)
            .service(category::delete_category)
            // Budget endpoints
            .service(budget::list_budgets)
            .service(budget::create_budget)
            .service(budget::update_budget)
            .service(budget::delete_budget)
            // Transaction endpoints
            .service(transaction::list_transactions)
            .service(transaction::get_transaction)
            .service(transaction::create_transaction)
            .service(transaction::reverse_transaction)
            // Automation endpoints (order matters: execute before generic {id} routes)
            .service(automation::handlers::list_rules)
            .service(automation::handlers::create_rule)
            .service(automation::handlers::execute_rule)
            .service(automation::handlers::update_rule)
            .service(automation::handlers::delete_rule)
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
