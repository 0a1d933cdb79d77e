//! Store and service wiring.

use std::sync::Arc;

use chrono::Duration;

use taskgate_auth::{AuthGateway, CredentialStore, TokenIssuer};
use taskgate_infra::{InMemoryCredentialStore, InMemoryTaskStore};
use taskgate_tasks::{TaskService, TaskStore};

use crate::config::AppConfig;

/// Shared application services, cloned into handlers via `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub gateway: Arc<AuthGateway>,
    pub tasks: TaskService,
}

impl AppServices {
    pub fn new(credentials: Arc<dyn CredentialStore>, tasks: Arc<dyn TaskStore>, issuer: TokenIssuer) -> Self {
        Self {
            gateway: Arc::new(AuthGateway::new(credentials, issuer)),
            tasks: TaskService::new(tasks),
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let access_ttl = Duration::try_seconds(config.access_ttl_secs)
        .ok_or_else(|| anyhow::anyhow!("access token lifetime out of range: {}", config.access_ttl_secs))?;
    let refresh_ttl = Duration::try_seconds(config.refresh_ttl_secs)
        .ok_or_else(|| anyhow::anyhow!("refresh token lifetime out of range: {}", config.refresh_ttl_secs))?;
    let issuer = TokenIssuer::with_ttls(config.jwt_secret.as_bytes(), access_ttl, refresh_ttl);
    tracing::info!(
        access_ttl_secs = issuer.access_ttl().num_seconds(),
        refresh_ttl_secs = issuer.refresh_ttl().num_seconds(),
        "token issuer configured"
    );

    let (credentials, tasks) = build_stores(config).await?;
    let services = AppServices::new(credentials, tasks, issuer);

    if let Some(admin) = &config.bootstrap_admin {
        services
            .gateway
            .ensure_admin(&admin.email, &admin.password)
            .await
            .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {e}"))?;
    }

    Ok(services)
}

type Stores = (Arc<dyn CredentialStore>, Arc<dyn TaskStore>);

#[cfg(feature = "postgres")]
async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    use anyhow::Context;
    use taskgate_infra::schema;
    use taskgate_infra::{PostgresCredentialStore, PostgresTaskStore};

    if !config.use_persistent_stores {
        return Ok(in_memory_stores());
    }

    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for persistent stores")?;
    let pool = schema::connect(url).await.context("failed to connect to postgres")?;
    schema::ensure_schema(&pool).await.context("failed to ensure schema")?;

    tracing::info!("using postgres stores");
    Ok((
        Arc::new(PostgresCredentialStore::new(pool.clone())),
        Arc::new(PostgresTaskStore::new(pool)),
    ))
}

#[cfg(not(feature = "postgres"))]
async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if config.use_persistent_stores {
        anyhow::bail!("USE_PERSISTENT_STORES requires a build with the `postgres` feature");
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> Stores {
    tracing::info!("using in-memory stores");
    (Arc::new(InMemoryCredentialStore::new()), Arc::new(InMemoryTaskStore::new()))
}
