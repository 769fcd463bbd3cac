//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories only translate between row structs and domain types. Row
//! structs (`models.rs`) and table definitions (`schema.rs`) stay private to
//! this module.
//!
//! # Example
//!
//! ```no_run
//! use inspection_backend::outbound::persistence::{
//!     DbPool, DieselTemplateRepository, PoolConfig, apply_migrations,
//! };
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "postgres://localhost/inspections";
//! apply_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let templates = DieselTemplateRepository::new(pool);
//! # let _ = templates;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_template_repository;
mod diesel_user_account_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_template_repository::DieselTemplateRepository;
pub use diesel_user_account_repository::DieselUserAccountRepository;
pub use migrations::{MigrationError, apply_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
