use std::sync::Arc;

use axum::Router;
use snapbill_agent::AgentRuntime;
use snapbill_core::config::{AppConfig, ConfigError, LoadOptions};
use snapbill_db::{
    connect_with_config, migrations, DbPool, SqlBillRepository, SqlInventoryRepository,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::health;
use crate::sms::gateway_from_config;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

impl Application {
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
            .merge(health::router(self.db_pool.clone(), self.state.runtime.chain().candidate_ids()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let runtime = AgentRuntime::from_config(&config.llm);
    let sms = gateway_from_config(&config.sms);
    info!(
        event_name = "system.bootstrap.integrations_ready",
        correlation_id = "bootstrap",
        provider_candidates = ?runtime.chain().candidate_ids(),
        sms_gateway = sms.name(),
        "integrations initialized"
    );
    if runtime.chain().is_empty() {
        warn!(
            event_name = "system.bootstrap.voice_degraded",
            correlation_id = "bootstrap",
            "no language provider configured; voice billing will return fallback replies"
        );
    }

    let state = AppState {
        inventory: Arc::new(SqlInventoryRepository::new(db_pool.clone())),
        bills: Arc::new(SqlBillRepository::new(db_pool.clone())),
        runtime: Arc::new(runtime),
        sms,
        assistant: config.assistant.clone(),
    };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use snapbill_core::config::{ConfigOverrides, LoadOptions};
    use tower::ServiceExt;

    use crate::bootstrap::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_configuration() {
        let mut options = memory_options();
        options.overrides.llm_candidate_models = Some(vec!["  ".to_string()]);

        let result = bootstrap(options).await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("candidate_models"));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_serves_health_and_api_routes() {
        let app = bootstrap(memory_options()).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('inventory_item', 'bill', 'sale_line')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables after bootstrap");
        assert_eq!(table_count, 3);

        let router = app.router();
        let health = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let items = router
            .oneshot(
                Request::builder()
                    .uri("/items")
                    .header("x-owner-id", "shop-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("items response");
        assert_eq!(items.status(), StatusCode::OK);

        app.db_pool.close().await;
    }
}
