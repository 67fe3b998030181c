//! Common library for the Campus Hub services
//!
//! This crate holds what the HTTP layer builds on: PostgreSQL connectivity,
//! the role model that every authorization decision goes through, and the
//! booking availability resolver.

pub mod availability;
pub mod database;
pub mod error;
pub mod roles;

pub use availability::{Availability, BookingSlot, BookingStatus};
pub use roles::{Permission, Role};

/// Example usage of the database module
///
/// ```rust,no_run
/// use campus_common::database::{DatabaseConfig, init_pool, health_check, run_migrations};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     run_migrations(&pool).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
