/// Learner ("aluno") and enrollment ("matricula") models
///
/// A learner record links a user to the training side of the system and
/// holds a contact phone number. Possession of a learner record is what
/// admits a user to the learner panel endpoints. An enrollment links one
/// learner to one class session.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE learners (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     phone VARCHAR(20) NOT NULL
/// );
///
/// CREATE TABLE enrollments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     session_id UUID NOT NULL REFERENCES class_sessions(id) ON DELETE CASCADE,
///     learner_id UUID NOT NULL REFERENCES learners(id) ON DELETE CASCADE,
///     UNIQUE (session_id, learner_id)
/// );
/// ```

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Learner model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Learner {
    pub id: Uuid,

    /// Backing user account (one learner per user)
    pub user_id: Uuid,

    /// Contact phone number
    pub phone: String,
}

/// Input for creating a learner
#[derive(Debug, Clone)]
pub struct CreateLearner {
    pub user_id: Uuid,
    pub phone: String,
}

/// Enrollment model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub session_id: Uuid,
    pub learner_id: Uuid,
}

/// Input for creating an enrollment
#[derive(Debug, Clone)]
pub struct CreateEnrollment {
    pub session_id: Uuid,
    pub learner_id: Uuid,
}

impl Learner {
    pub async fn create(pool: &PgPool, data: CreateLearner) -> Result<Self, sqlx::Error> {
        let learner = sqlx::query_as::<_, Learner>(
            r#"
            INSERT INTO learners (user_id, phone)
            VALUES ($1, $2)
            RETURNING id, user_id, phone
            "#,
        )
        .bind(data.user_id)
        .bind(data.phone)
        .fetch_one(pool)
        .await?;

        Ok(learner)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let learner =
            sqlx::query_as::<_, Learner>("SELECT id, user_id, phone FROM learners WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(learner)
    }

    /// Finds the learner record for a user, if any
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let learner = sqlx::query_as::<_, Learner>(
            "SELECT id, user_id, phone FROM learners WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(learner)
    }

    pub async fn update_phone(
        pool: &PgPool,
        id: Uuid,
        phone: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let learner = sqlx::query_as::<_, Learner>(
            "UPDATE learners SET phone = $2 WHERE id = $1 RETURNING id, user_id, phone",
        )
        .bind(id)
        .bind(phone)
        .fetch_optional(pool)
        .await?;

        Ok(learner)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM learners WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let learners = sqlx::query_as::<_, Learner>(
            "SELECT id, user_id, phone FROM learners ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(learners)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM learners")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

impl Enrollment {
    /// Enrolls a learner in a class session
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the learner is already
    /// enrolled in the session.
    pub async fn create(pool: &PgPool, data: CreateEnrollment) -> Result<Self, sqlx::Error> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (session_id, learner_id)
            VALUES ($1, $2)
            RETURNING id, session_id, learner_id
            "#,
        )
        .bind(data.session_id)
        .bind(data.learner_id)
        .fetch_one(pool)
        .await?;

        Ok(enrollment)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, session_id, learner_id FROM enrollments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(enrollment)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            "SELECT id, session_id, learner_id FROM enrollments ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(enrollments)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM enrollments")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// IDs of the sessions a learner is enrolled in
    pub async fn session_ids_for_learner(
        pool: &PgPool,
        learner_id: Uuid,
    ) -> Result<HashSet<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT session_id FROM enrollments WHERE learner_id = $1")
                .bind(learner_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
