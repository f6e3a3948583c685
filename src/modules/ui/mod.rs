use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use libris_kernel::{InitCtx, Module};

const INDEX_HTML: &str = include_str!("assets/index.html");
const APP_JS: &str = include_str!("assets/app.js");

/// Browser front page served from the server root
pub struct UiModule;

#[async_trait]
impl Module for UiModule {
    fn name(&self) -> &'static str {
        "ui"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::debug!(module = self.name(), "front page assets embedded");
        Ok(())
    }

    fn root_routes(&self) -> Option<Router> {
        Some(
            Router::new()
                .route("/", get(index))
                .route("/app.js", get(app_js)),
        )
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(UiModule)
}
