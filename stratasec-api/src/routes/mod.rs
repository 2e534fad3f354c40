/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `tasks`: Owner-scoped task CRUD, assign, dashboard
/// - `comments`: Task comments
/// - `admin`: Admin-gated training catalogue CRUD
/// - `panel`: Learner panel (enrolled sessions and visible resources)

pub mod admin;
pub mod auth;
pub mod comments;
pub mod health;
pub mod panel;
pub mod tasks;
