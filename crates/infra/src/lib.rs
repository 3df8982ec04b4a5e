//! Infrastructure layer: storage adapters, schema migrations, config.

pub mod config;
pub mod migration;
pub mod store;
