pub mod models;
pub mod openapi;
pub mod routes;
pub mod sample;
pub mod store;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{settings::CatalogSettings, InitCtx, Migration, Module};

use routes::BooksState;
use store::BookStore;

pub const MODULE_NAME: &str = "books";

/// Book catalog: records, filters and stock adjustments under `/api/books`
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: BookStore, catalog: &CatalogSettings) -> Self {
        Self {
            state: BooksState {
                store,
                recent_after_year: catalog.recent_after_year,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            recent_after_year = self.state.recent_after_year,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                DEFINE TABLE book SCHEMAFULL;
                DEFINE FIELD book_id          ON book TYPE string READONLY;
                DEFINE FIELD title            ON book TYPE string ASSERT $value != "";
                DEFINE FIELD author           ON book TYPE string ASSERT $value != "";
                DEFINE FIELD category         ON book TYPE string ASSERT $value != "";
                DEFINE FIELD published_year   ON book TYPE int
                    ASSERT $value >= 1000 AND $value <= time::year(time::now());
                DEFINE FIELD available_copies ON book TYPE int
                    ASSERT $value >= 0 AND $value <= 2147483647;
                DEFINE FIELD created_at       ON book TYPE string;
                DEFINE FIELD updated_at       ON book TYPE string;
                DEFINE INDEX book_category ON book FIELDS category;
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(store: BookStore, catalog: &CatalogSettings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, catalog))
}

/// Fresh in-memory store with the books schema applied
#[cfg(test)]
pub(crate) async fn test_store() -> BookStore {
    let db = libris_db::connect_in_memory().await.unwrap();
    let module = BooksModule::new(BookStore::new(db.clone()), &CatalogSettings::default());
    let migrations: Vec<_> = module
        .migrations()
        .into_iter()
        .map(|migration| (MODULE_NAME.to_string(), migration))
        .collect();

    libris_db::migrate::run(&db, &migrations).await.unwrap();
    BookStore::new(db)
}
