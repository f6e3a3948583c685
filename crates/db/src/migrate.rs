//! Applies module migrations once each, recording them in `schema_migration`.

use anyhow::Context;
use libris_kernel::Migration;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::Database;

const MIGRATION_TABLE: &str = "schema_migration";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

/// Run every migration that has not been recorded yet, in the order given.
pub async fn run(
    db: &Database,
    migrations: &[(String, Migration)],
) -> anyhow::Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for (module, migration) in migrations {
        let key = format!("{}:{}", module, migration.id);

        if is_applied(db, &key).await? {
            tracing::debug!(target: "libris-db", migration = %key, "migration already applied");
            report.skipped.push(key);
            continue;
        }

        tracing::info!(target: "libris-db", migration = %key, "applying migration");

        db.query(migration.up)
            .await
            .and_then(|response| response.check())
            .with_context(|| format!("migration '{}' failed", key))?;

        let applied_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("failed to format migration timestamp")?;

        db.query("CREATE type::thing($table, $key) SET module = $module, migration = $migration, applied_at = $applied_at")
            .bind(("table", MIGRATION_TABLE))
            .bind(("key", key.clone()))
            .bind(("module", module.clone()))
            .bind(("migration", migration.id))
            .bind(("applied_at", applied_at))
            .await
            .and_then(|response| response.check())
            .with_context(|| format!("failed to record migration '{}'", key))?;

        report.applied.push(key);
    }

    tracing::info!(
        target: "libris-db",
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        "migrations complete"
    );

    Ok(report)
}

async fn is_applied(db: &Database, key: &str) -> anyhow::Result<bool> {
    let mut response = db
        .query("SELECT VALUE migration FROM type::thing($table, $key)")
        .bind(("table", MIGRATION_TABLE))
        .bind(("key", key.to_string()))
        .await
        .with_context(|| format!("failed to look up migration '{}'", key))?;

    let rows: Vec<String> = response
        .take(0)
        .with_context(|| format!("failed to read migration '{}'", key))?;

    Ok(!rows.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_in_memory;

    fn shelf_migrations() -> Vec<(String, Migration)> {
        vec![
            (
                "shelf".to_string(),
                Migration {
                    id: "001_init",
                    up: "DEFINE TABLE shelf SCHEMAFULL; DEFINE FIELD label ON shelf TYPE string;",
                },
            ),
            (
                "shelf".to_string(),
                Migration {
                    id: "002_seed",
                    up: "CREATE shelf:main SET label = 'main';",
                },
            ),
        ]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = connect_in_memory().await.unwrap();
        let migrations = shelf_migrations();

        let first = run(&db, &migrations).await.unwrap();
        assert_eq!(first.applied, vec!["shelf:001_init", "shelf:002_seed"]);
        assert!(first.skipped.is_empty());

        let second = run(&db, &migrations).await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), 2);

        let mut response = db.query("SELECT VALUE label FROM shelf").await.unwrap();
        let labels: Vec<String> = response.take(0).unwrap();
        assert_eq!(labels, vec!["main"]);
    }

    #[tokio::test]
    async fn failing_migration_is_not_recorded() {
        let db = connect_in_memory().await.unwrap();
        let migrations = vec![(
            "broken".to_string(),
            Migration {
                id: "001_bad",
                up: "DEFINE TABLE;",
            },
        )];

        let err = run(&db, &migrations).await.unwrap_err();
        assert!(err.to_string().contains("migration 'broken:001_bad' failed"));
        assert!(!is_applied(&db, "broken:001_bad").await.unwrap());
    }
}
