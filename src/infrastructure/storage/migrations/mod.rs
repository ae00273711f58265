//! Database migrations infrastructure

use sqlx::postgres::PgPool;

use crate::domain::DomainError;

/// Applies versioned SQL migrations, recording them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Applies one migration inside a transaction; returns false if it was already applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            return Ok(false);
        }

        // Migration bodies hold several statements
        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to run migration {}: {}", migration.version, e))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }

    /// Latest applied migration version, if any
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// A versioned schema change
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL applied in one transaction
    pub up: String,
}

impl Migration {
    pub fn new(version: i64, description: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
        }
    }
}

/// Schema migrations, in application order
pub fn storage_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create workspaces table",
            r#"
            CREATE TABLE IF NOT EXISTS workspaces (
                id VARCHAR(255) PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                internal BOOLEAN NOT NULL DEFAULT FALSE
            );
            "#,
        ),
        Migration::new(
            2,
            "Create key_auth table",
            r#"
            CREATE TABLE IF NOT EXISTS key_auth (
                id VARCHAR(255) PRIMARY KEY,
                workspace_id VARCHAR(255) NOT NULL
            );
            "#,
        ),
        Migration::new(
            3,
            "Create apis table",
            r#"
            CREATE TABLE IF NOT EXISTS apis (
                id VARCHAR(255) PRIMARY KEY,
                name TEXT NOT NULL,
                workspace_id VARCHAR(255) NOT NULL,
                auth_type VARCHAR(16) NOT NULL,
                key_auth_id VARCHAR(255),
                ip_whitelist TEXT[]
            );
            CREATE INDEX IF NOT EXISTS idx_apis_key_auth_id ON apis(key_auth_id);
            "#,
        ),
        Migration::new(
            4,
            "Create keys table",
            r#"
            CREATE TABLE IF NOT EXISTS keys (
                id VARCHAR(255) PRIMARY KEY,
                key_auth_id VARCHAR(255) NOT NULL,
                workspace_id VARCHAR(255) NOT NULL,
                hash VARCHAR(255) NOT NULL,
                start VARCHAR(32) NOT NULL,
                owner_id TEXT,
                name TEXT,
                meta TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                expires TIMESTAMPTZ,
                for_workspace_id VARCHAR(255),
                ratelimit_type TEXT,
                ratelimit_limit BIGINT,
                ratelimit_refill_rate BIGINT,
                ratelimit_refill_interval BIGINT,
                remaining_enabled BOOLEAN NOT NULL DEFAULT FALSE,
                remaining_requests BIGINT CHECK (remaining_requests >= 0)
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_keys_hash ON keys(hash);
            CREATE INDEX IF NOT EXISTS idx_keys_key_auth_id ON keys(key_auth_id);
            CREATE INDEX IF NOT EXISTS idx_keys_key_auth_id_owner_id ON keys(key_auth_id, owner_id);
            "#,
        ),
    ]
}

/// Runs all pending storage migrations, returning how many were applied
pub async fn run_storage_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in storage_migrations() {
        if migrator.run_migration(&migration).await? {
            tracing::info!(version = migration.version, description = %migration.description, "Applied migration");
            applied += 1;
        }
    }

    Ok(applied)
}
