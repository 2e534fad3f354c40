/// Role gates evaluated once at the router boundary
///
/// Two capabilities exist beyond plain authentication:
///
/// 1. **Admin**: staff users (`users.is_admin`) manage trainings, class
///    sessions, resources, enrollments, and learner records.
/// 2. **Learner**: users with a learner record may read their own panel.
///    The existence of the record is itself the admission check.
///
/// Each gate runs a single lookup and, on success, yields a typed context
/// value that is passed down to handlers. Ownership of individual records
/// is NOT checked here; owner scoping lives in the store queries and maps
/// to 404, never 403.
///
/// # Example
///
/// ```no_run
/// use sqlx::PgPool;
/// use stratasec_shared::auth::authorization::require_admin;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let admin = require_admin(&pool, user_id).await?;
/// println!("admin user {}", admin.user_id);
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::learner::Learner;
use crate::models::user::User;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Authenticated user no longer exists
    #[error("User {0} not found")]
    UnknownUser(Uuid),

    /// User is not an admin
    #[error("Admin access required")]
    NotAdmin,

    /// User has no learner record
    #[error("Learner access required")]
    NotLearner,

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Capability token proving the caller is an admin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminContext {
    /// The admin's user ID
    pub user_id: Uuid,
}

/// Capability token proving the caller is a learner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerContext {
    /// The learner's user ID
    pub user_id: Uuid,

    /// The learner record ID (enrollments reference this)
    pub learner_id: Uuid,
}

/// Checks that a user is an admin
///
/// # Errors
///
/// Returns `AuthzError::NotAdmin` for non-staff users and
/// `AuthzError::UnknownUser` if the account was deleted after the token
/// was issued.
pub async fn require_admin(pool: &PgPool, user_id: Uuid) -> Result<AdminContext, AuthzError> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or(AuthzError::UnknownUser(user_id))?;

    if !user.is_admin {
        return Err(AuthzError::NotAdmin);
    }

    Ok(AdminContext { user_id })
}

/// Checks that a user has a learner record
///
/// # Errors
///
/// Returns `AuthzError::NotLearner` when no learner record exists for the
/// user.
pub async fn require_learner(pool: &PgPool, user_id: Uuid) -> Result<LearnerContext, AuthzError> {
    let learner = Learner::find_by_user(pool, user_id)
        .await?
        .ok_or(AuthzError::NotLearner)?;

    Ok(LearnerContext {
        user_id,
        learner_id: learner.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authz_error_display() {
        let err = AuthzError::NotAdmin;
        assert!(err.to_string().contains("Admin access"));

        let err = AuthzError::NotLearner;
        assert!(err.to_string().contains("Learner access"));

        let id = Uuid::new_v4();
        let err = AuthzError::UnknownUser(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
