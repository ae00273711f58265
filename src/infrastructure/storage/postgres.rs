//! PostgreSQL storage implementation with connection pooling

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::storage::{RemainingUsage, Storage};
use crate::domain::{Api, DomainError, Key, KeyAuth, Workspace};

use super::migrations::run_storage_migrations;
use super::records::{ApiRecord, KeyAuthRecord, KeyRecord, WorkspaceRecord, KEY_COLUMNS};

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/keyhub".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }
}

/// Maps a sqlx error, turning unique violations into conflicts
fn map_sqlx_error(context: &str, err: sqlx::Error) -> DomainError {
    let unique_violation = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if unique_violation {
        DomainError::conflict(format!("{}: already exists", context))
    } else {
        DomainError::storage(format!("{}: {}", context, err))
    }
}

/// `COUNT(*)` never yields a negative value; anything else is corrupt
fn row_count(count: i64) -> Result<usize, DomainError> {
    usize::try_from(count).map_err(|_| DomainError::storage(format!("Invalid key count: {}", count)))
}

/// PostgreSQL storage
///
/// One table per entity with flat, nullable columns. Dropping an in-flight
/// query future cancels it, so request timeouts propagate down to the pool.
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl Debug for PostgresStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new PostgreSQL storage with connection pooling
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies pending schema migrations, returning how many ran
    pub async fn migrate(&self) -> Result<usize, DomainError> {
        run_storage_migrations(&self.pool).await
    }

    async fn fetch_key(&self, column: &str, value: &str) -> Result<Key, DomainError> {
        let query = format!("SELECT {} FROM keys WHERE {} = $1", KEY_COLUMNS, column);

        let record = sqlx::query_as::<_, KeyRecord>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get key", e))?
            .ok_or_else(|| DomainError::not_found("Key not found"))?;

        Ok(Key::try_from(record)?)
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn create_workspace(&self, workspace: Workspace) -> Result<(), DomainError> {
        let record = WorkspaceRecord::from(&workspace);

        sqlx::query(
            "INSERT INTO workspaces (id, name, slug, tenant_id, internal) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.slug)
        .bind(&record.tenant_id)
        .bind(record.internal)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create workspace", e))?;

        Ok(())
    }

    async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace, DomainError> {
        sqlx::query_as::<_, WorkspaceRecord>(
            "SELECT id, name, slug, tenant_id, internal FROM workspaces WHERE id = $1",
        )
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to get workspace", e))?
        .map(Workspace::from)
        .ok_or_else(|| DomainError::not_found(format!("Workspace '{}' not found", workspace_id)))
    }

    async fn create_api(&self, api: Api) -> Result<(), DomainError> {
        let record = ApiRecord::from(&api);

        sqlx::query(
            r#"
            INSERT INTO apis (id, name, workspace_id, auth_type, key_auth_id, ip_whitelist)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.workspace_id)
        .bind(&record.auth_type)
        .bind(&record.key_auth_id)
        .bind(&record.ip_whitelist)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create api", e))?;

        Ok(())
    }

    async fn get_api(&self, api_id: &str) -> Result<Api, DomainError> {
        let record = sqlx::query_as::<_, ApiRecord>(
            "SELECT id, name, workspace_id, auth_type, key_auth_id, ip_whitelist FROM apis WHERE id = $1",
        )
        .bind(api_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to get api", e))?
        .ok_or_else(|| DomainError::not_found(format!("Api '{}' not found", api_id)))?;

        Ok(Api::try_from(record)?)
    }

    async fn get_api_by_key_auth_id(&self, key_auth_id: &str) -> Result<Api, DomainError> {
        let record = sqlx::query_as::<_, ApiRecord>(
            r#"
            SELECT id, name, workspace_id, auth_type, key_auth_id, ip_whitelist
            FROM apis WHERE key_auth_id = $1
            LIMIT 1
            "#,
        )
        .bind(key_auth_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to get api", e))?
        .ok_or_else(|| DomainError::not_found(format!("No Api uses key auth '{}'", key_auth_id)))?;

        Ok(Api::try_from(record)?)
    }

    async fn create_key_auth(&self, key_auth: KeyAuth) -> Result<(), DomainError> {
        let record = KeyAuthRecord::from(&key_auth);

        sqlx::query("INSERT INTO key_auth (id, workspace_id) VALUES ($1, $2)")
            .bind(&record.id)
            .bind(&record.workspace_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to create key auth", e))?;

        Ok(())
    }

    async fn get_key_auth(&self, key_auth_id: &str) -> Result<KeyAuth, DomainError> {
        sqlx::query_as::<_, KeyAuthRecord>("SELECT id, workspace_id FROM key_auth WHERE id = $1")
            .bind(key_auth_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get key auth", e))?
            .map(KeyAuth::from)
            .ok_or_else(|| DomainError::not_found(format!("Key auth '{}' not found", key_auth_id)))
    }

    async fn create_key(&self, key: Key) -> Result<(), DomainError> {
        let r = KeyRecord::try_from(&key)?;
        let query = format!(
            "INSERT INTO keys ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            KEY_COLUMNS
        );

        sqlx::query(&query)
            .bind(&r.id)
            .bind(&r.key_auth_id)
            .bind(&r.workspace_id)
            .bind(&r.hash)
            .bind(&r.start)
            .bind(&r.owner_id)
            .bind(&r.name)
            .bind(&r.meta)
            .bind(r.created_at)
            .bind(r.expires)
            .bind(&r.for_workspace_id)
            .bind(&r.ratelimit_type)
            .bind(r.ratelimit_limit)
            .bind(r.ratelimit_refill_rate)
            .bind(r.ratelimit_refill_interval)
            .bind(r.remaining_enabled)
            .bind(r.remaining_requests)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to create key", e))?;

        Ok(())
    }

    async fn update_key(&self, key: Key) -> Result<(), DomainError> {
        let r = KeyRecord::try_from(&key)?;

        let result = sqlx::query(
            r#"
            UPDATE keys SET
                key_auth_id = $2, workspace_id = $3, hash = $4, start = $5,
                owner_id = $6, name = $7, meta = $8, created_at = $9, expires = $10,
                for_workspace_id = $11, ratelimit_type = $12, ratelimit_limit = $13,
                ratelimit_refill_rate = $14, ratelimit_refill_interval = $15,
                remaining_enabled = $16, remaining_requests = $17
            WHERE id = $1
            "#,
        )
        .bind(&r.id)
        .bind(&r.key_auth_id)
        .bind(&r.workspace_id)
        .bind(&r.hash)
        .bind(&r.start)
        .bind(&r.owner_id)
        .bind(&r.name)
        .bind(&r.meta)
        .bind(r.created_at)
        .bind(r.expires)
        .bind(&r.for_workspace_id)
        .bind(&r.ratelimit_type)
        .bind(r.ratelimit_limit)
        .bind(r.ratelimit_refill_rate)
        .bind(r.ratelimit_refill_interval)
        .bind(r.remaining_enabled)
        .bind(r.remaining_requests)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update key", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Key '{}' not found", r.id)));
        }

        Ok(())
    }

    async fn delete_key(&self, key_id: &str) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM keys WHERE id = $1")
            .bind(key_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete key", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Key '{}' not found", key_id)));
        }

        Ok(())
    }

    async fn get_key_by_hash(&self, hash: &str) -> Result<Key, DomainError> {
        self.fetch_key("hash", hash).await
    }

    async fn get_key_by_id(&self, key_id: &str) -> Result<Key, DomainError> {
        self.fetch_key("id", key_id).await
    }

    async fn count_keys(&self, key_auth_id: &str) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM keys WHERE key_auth_id = $1")
            .bind(key_auth_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to count keys", e))?;

        row_count(count)
    }

    async fn list_keys_by_key_auth_id(
        &self,
        key_auth_id: &str,
        limit: usize,
        offset: usize,
        owner_id: Option<String>,
    ) -> Result<Vec<Key>, DomainError> {
        let query = format!(
            r#"
            SELECT {} FROM keys
            WHERE key_auth_id = $1 AND ($2::TEXT IS NULL OR owner_id = $2)
            ORDER BY created_at, id
            LIMIT $3 OFFSET $4
            "#,
            KEY_COLUMNS
        );

        let records = sqlx::query_as::<_, KeyRecord>(&query)
            .bind(key_auth_id)
            .bind(owner_id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list keys", e))?;

        records
            .into_iter()
            .map(|record| Key::try_from(record).map_err(DomainError::from))
            .collect()
    }

    async fn decrement_remaining_key_usage(&self, key_id: &str) -> Result<RemainingUsage, DomainError> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE keys SET remaining_requests = remaining_requests - 1
            WHERE id = $1 AND remaining_enabled AND remaining_requests > 0
            RETURNING remaining_requests
            "#,
        )
        .bind(key_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to decrement key usage", e))?;

        if let Some(remaining) = remaining {
            return Ok(RemainingUsage::Remaining(remaining));
        }

        // Nothing updated: unknown key, no quota, or quota used up
        let enabled: Option<bool> = sqlx::query_scalar("SELECT remaining_enabled FROM keys WHERE id = $1")
            .bind(key_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to read key usage", e))?;

        match enabled {
            None => Err(DomainError::not_found(format!("Key '{}' not found", key_id))),
            Some(false) => Ok(RemainingUsage::Unlimited),
            Some(true) => Ok(RemainingUsage::Exhausted),
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Database ping failed", e))?;

        Ok(())
    }
}
