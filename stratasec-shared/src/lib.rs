//! # Stratasec Shared Library
//!
//! This crate contains the types and business logic shared between the
//! Stratasec API server and its test suites.
//!
//! ## Module Organization
//!
//! - `models`: Database models and owner-scoped queries
//! - `auth`: Authentication (JWT, passwords) and role gates
//! - `db`: Connection pool and migration runner
//! - `pagination`: Page-number pagination with restricted page sizes

pub mod auth;
pub mod db;
pub mod models;
pub mod pagination;

/// Current version of the stratasec shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
