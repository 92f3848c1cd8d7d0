pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod retry;
pub mod services;

pub use sqlx;

pub use config::LedgerConfig;
pub use error::LedgerError;

/// Embedded migrations, shared by [`db::init_db`] and the test suites.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
