use std::future::Future;

use sqlx::PgPool;
use uuid::Uuid;

use super::models::AutoRule;
use crate::errors::AppError;

/// Persistence for automation rules.
///
/// Rules are user configuration, not financial fact, so they live in a
/// deliberately separate and simpler channel than the ledger: one key-value
/// slot per owner holding the whole serialized list, loaded once and
/// rewritten on every mutation.
pub trait RuleStore: Send + Sync {
    fn load(&self, owner_id: Uuid) -> impl Future<Output = Result<Vec<AutoRule>, AppError>> + Send;

    fn save(
        &self,
        owner_id: Uuid,
        rules: &[AutoRule],
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Rule slot backed by a single-row-per-owner table.
#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RuleStore for PgRuleStore {
    async fn load(&self, owner_id: Uuid) -> Result<Vec<AutoRule>, AppError> {
        let slot = sqlx::query_scalar::<_, String>(
            "SELECT rules_json FROM rule_slots WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        match slot {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| AppError::InternalError(format!("corrupt rule slot: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, owner_id: Uuid, rules: &[AutoRule]) -> Result<(), AppError> {
        let json = serde_json::to_string(rules)
            .map_err(|e| AppError::InternalError(format!("failed to serialize rules: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO rule_slots (owner_id, rules_json, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (owner_id)
            DO UPDATE SET rules_json = EXCLUDED.rules_json, updated_at = NOW()
            "#,
        )
        .bind(owner_id)
        .bind(&json)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(())
    }
}
