//! Wires settings, the database and the module registry into a runnable service.

use std::future::Future;

use anyhow::Context;
use axum::Router;
use libris_db::{migrate::MigrationReport, Database};
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, books::store::BookStore};

pub struct App {
    settings: Settings,
    db: Database,
    registry: ModuleRegistry,
}

impl App {
    /// Connect to the configured database, then register, migrate and init modules.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let db = libris_db::connect(&settings.database).await?;
        Self::with_database(settings, db).await
    }

    pub async fn with_database(settings: Settings, db: Database) -> anyhow::Result<Self> {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db, &settings);

        let app = Self {
            settings,
            db,
            registry,
        };

        let report = app.migrate().await?;
        tracing::info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "migrations complete"
        );

        app.registry
            .init_all(&app.init_ctx())
            .await
            .context("module initialization failed")?;

        Ok(app)
    }

    /// Apply pending module migrations; already recorded ones are skipped.
    pub async fn migrate(&self) -> anyhow::Result<MigrationReport> {
        libris_db::migrate::run(&self.db, &self.registry.collect_migrations()).await
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn book_store(&self) -> BookStore {
        BookStore::new(self.db.clone())
    }

    pub fn router(&self) -> Router {
        libris_http::build_router(&self.registry, &self.settings)
    }

    /// Start modules, serve HTTP until `shutdown` resolves, then stop modules.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.registry
            .start_all(&self.init_ctx())
            .await
            .context("module start failed")?;

        let served = libris_http::start_server(&self.registry, &self.settings, shutdown).await;
        // Modules are stopped even when the server exits with an error.
        let stopped = self.registry.stop_all().await;

        served?;
        stopped
    }

    fn init_ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
        }
    }
}
