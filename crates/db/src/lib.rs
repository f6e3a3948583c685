//! SurrealDB client factory and migration tooling.

use anyhow::Context;
use libris_kernel::settings::DatabaseSettings;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

pub mod migrate;

/// Shared database handle; cloning is cheap and shares the underlying connection.
pub type Database = Surreal<Any>;

/// Connect to the configured endpoint and select namespace/database.
///
/// Credentials are only used when both username and password are configured; embedded
/// engines such as `mem://` need none.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    tracing::info!(
        target: "libris-db",
        endpoint = %settings.endpoint,
        namespace = %settings.namespace,
        database = %settings.database,
        "connecting to document store"
    );

    let db = any::connect(settings.endpoint.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", settings.endpoint))?;

    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        db.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await
        .with_context(|| format!("failed to sign in as '{}'", username))?;
    }

    db.use_ns(settings.namespace.as_str())
        .use_db(settings.database.as_str())
        .await
        .with_context(|| {
            format!(
                "failed to select namespace '{}' / database '{}'",
                settings.namespace, settings.database
            )
        })?;

    Ok(db)
}

/// Embedded in-memory store with the default namespace and database selected.
pub async fn connect_in_memory() -> anyhow::Result<Database> {
    connect(&DatabaseSettings::in_memory()).await
}
