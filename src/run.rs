//! Seed command runner.

use crate::logging::mask_connection_password;
use anyhow::Context;
use seed_core::BackendKind;
use seed_framework::{SeedConfig, SeedMetrics, SeedMode, Seeder};
use seed_populate::{Backend, CommonSeedArgs, MemoryBackend};
use seed_populate_mysql::MySQLBackend;
use seed_populate_postgresql::PostgreSQLBackend;
use std::sync::Arc;
use tracing::info;

/// Apply command-line overrides on top of the run file.
pub fn apply_args(mut config: SeedConfig, args: &CommonSeedArgs) -> SeedConfig {
    if let Some(connection) = &args.connection_string {
        config.connection.connection = Some(connection.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config
}

/// Connect to the configured backend, or an in-memory one for dry runs.
pub async fn connect_backend(
    config: &SeedConfig,
    dry_run: bool,
) -> anyhow::Result<Arc<dyn Backend>> {
    let client = config.connection.client;
    if dry_run {
        info!("[DRY-RUN] Seeding into an in-memory backend instead of {}", client);
        return Ok(Arc::new(MemoryBackend::new()));
    }
    if client == BackendKind::Memory {
        return Ok(Arc::new(MemoryBackend::new()));
    }

    let connection = config.connection.connection.as_deref().with_context(|| {
        format!("No connection string for {client}: set connection.connection or --connection-string")
    })?;
    info!(
        "Connecting to {} at {}",
        client,
        mask_connection_password(connection)
    );

    let backend: Arc<dyn Backend> = match client {
        BackendKind::PostgreSQL => Arc::new(
            PostgreSQLBackend::connect(connection, config.schema_name.clone())
                .await
                .context("Failed to connect to PostgreSQL")?
                .with_batch_size(config.batch_size),
        ),
        BackendKind::MySQL => Arc::new(
            MySQLBackend::connect(connection)
                .await
                .context("Failed to connect to MySQL")?
                .with_batch_size(config.batch_size),
        ),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    };
    Ok(backend)
}

/// Load the run file, connect and seed.
pub async fn run_seed(args: CommonSeedArgs, mode: SeedMode) -> anyhow::Result<SeedMetrics> {
    let config = SeedConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load seeder config from {:?}", args.config))?;
    let config = apply_args(config, &args);

    info!(
        "Seeding {} entities with {} backend (seed={:?}, mode={:?})",
        config.schema.len(),
        config.connection.client,
        config.seed,
        mode
    );

    let backend = connect_backend(&config, args.dry_run).await?;
    let mut seeder = Seeder::new(config, backend)
        .context("Failed to prepare schema")?
        .with_drop_existing(args.drop_existing);
    if let Some(dir) = &args.output_dir {
        seeder = seeder.with_output_dir(dir);
    }

    let metrics = seeder.start(mode).await.context("Seeding failed")?;
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::Schema;
    use std::path::PathBuf;

    fn args() -> CommonSeedArgs {
        CommonSeedArgs {
            config: PathBuf::from("seed.yaml"),
            connection_string: None,
            seed: None,
            batch_size: None,
            drop_existing: false,
            dry_run: false,
            output_dir: None,
        }
    }

    #[test]
    fn test_args_override_run_file() {
        let config = SeedConfig::new(Schema::new())
            .with_client(BackendKind::PostgreSQL, Some("postgresql://a@b/c".to_string()))
            .with_seed(1);
        let overrides = CommonSeedArgs {
            connection_string: Some("postgresql://x@y/z".to_string()),
            seed: Some(2),
            batch_size: Some(50),
            ..args()
        };

        let config = apply_args(config, &overrides);

        assert_eq!(
            config.connection.connection.as_deref(),
            Some("postgresql://x@y/z")
        );
        assert_eq!(config.seed, Some(2));
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn test_no_overrides_keep_run_file() {
        let config = SeedConfig::new(Schema::new()).with_seed(7);
        let config = apply_args(config, &args());
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.batch_size, 1000);
    }

    #[tokio::test]
    async fn test_dry_run_uses_memory_backend() {
        let config = SeedConfig::new(Schema::new()).with_client(BackendKind::PostgreSQL, None);
        let backend = connect_backend(&config, true).await.unwrap();
        assert_eq!(backend.kind(), BackendKind::Memory);
    }

    #[tokio::test]
    async fn test_missing_connection_string() {
        let config = SeedConfig::new(Schema::new()).with_client(BackendKind::MySQL, None);
        let err = connect_backend(&config, false).await.err().unwrap();
        assert!(err.to_string().contains("No connection string"));
    }
}
