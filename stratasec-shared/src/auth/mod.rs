/// Authentication and authorization utilities
///
/// - `jwt`: HS256 access/refresh token creation and validation
/// - `password`: Argon2id password hashing and the registration strength rule
/// - `middleware`: Bearer-token extraction and the per-request `AuthContext`
/// - `authorization`: role gates (admin, learner) resolved once per request

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
