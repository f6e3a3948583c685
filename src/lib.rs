//! Libris application library
//!
//! Module wiring and bootstrap for the library catalog service.

pub mod bootstrap;
pub mod modules;
pub mod utils;

pub use bootstrap::App;
