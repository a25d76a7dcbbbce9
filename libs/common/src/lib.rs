//! Common library for the Foodgram backend
//!
//! This crate provides shared functionality used by the API service and the
//! ingredient loader: database connectivity and migrations, layered
//! configuration, tracing setup, password hashing and error types.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool).await?;
//!     println!("Database health check: {}", health_check(&pool).await?);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod password;
pub mod settings;
pub mod telemetry;
