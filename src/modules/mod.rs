pub mod books;
pub mod ui;

use libris_db::Database;
use libris_kernel::{settings::Settings, ModuleRegistry};

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: &Database, settings: &Settings) {
    registry.register(books::create_module(
        books::store::BookStore::new(db.clone()),
        &settings.catalog,
    ));
    registry.register(ui::create_module());
}
