/// Database utilities
///
/// - `pool`: PostgreSQL connection pool creation and health checks
/// - `migrations`: sqlx migration runner

pub mod migrations;
pub mod pool;

pub use migrations::run_migrations;
pub use pool::{create_pool, DatabaseConfig};
