/// Training and class-session models
///
/// A training ("treinamento") is a course; a class session ("turma") is a
/// dated run of that course. Both are managed exclusively through the admin
/// endpoints; learners only ever see them through the panel queries.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE trainings (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL
/// );
///
/// CREATE TABLE class_sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     training_id UUID NOT NULL REFERENCES trainings(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     start_date DATE NOT NULL,
///     end_date DATE NOT NULL,
///     access_link VARCHAR(512)
/// );
/// ```

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Training (course) model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Training {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Input for creating a training
#[derive(Debug, Clone)]
pub struct CreateTraining {
    pub name: String,
    pub description: String,
}

/// Input for updating a training; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateTraining {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Training {
    pub async fn create(pool: &PgPool, data: CreateTraining) -> Result<Self, sqlx::Error> {
        let training = sqlx::query_as::<_, Training>(
            r#"
            INSERT INTO trainings (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(training)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let training =
            sqlx::query_as::<_, Training>("SELECT id, name, description FROM trainings WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(training)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTraining,
    ) -> Result<Option<Self>, sqlx::Error> {
        let training = sqlx::query_as::<_, Training>(
            r#"
            UPDATE trainings
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(training)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trainings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let trainings = sqlx::query_as::<_, Training>(
            "SELECT id, name, description FROM trainings ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(trainings)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trainings")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

/// Class session ("turma") model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClassSession {
    pub id: Uuid,
    pub training_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Meeting/platform link shown to enrolled learners
    pub access_link: Option<String>,
}

/// Class session joined with its training, for the learner panel
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SessionWithTraining {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub access_link: Option<String>,
    pub training_id: Uuid,
    pub training_name: String,
    pub training_description: String,
}

/// Input for creating a class session
#[derive(Debug, Clone)]
pub struct CreateClassSession {
    pub training_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub access_link: Option<String>,
}

/// Input for updating a class session; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateClassSession {
    pub training_id: Option<Uuid>,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub access_link: Option<Option<String>>,
}

const SESSION_COLUMNS: &str = "id, training_id, name, start_date, end_date, access_link";

impl ClassSession {
    pub async fn create(pool: &PgPool, data: CreateClassSession) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, ClassSession>(&format!(
            r#"
            INSERT INTO class_sessions (training_id, name, start_date, end_date, access_link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(data.training_id)
        .bind(data.name)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.access_link)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let session = sqlx::query_as::<_, ClassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM class_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateClassSession,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_count = 1;

        if data.training_id.is_some() {
            bind_count += 1;
            sets.push(format!("training_id = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            sets.push(format!("name = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            sets.push(format!("start_date = ${}", bind_count));
        }
        if data.end_date.is_some() {
            bind_count += 1;
            sets.push(format!("end_date = ${}", bind_count));
        }
        if data.access_link.is_some() {
            bind_count += 1;
            sets.push(format!("access_link = ${}", bind_count));
        }

        if sets.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE class_sessions SET {} WHERE id = $1 RETURNING {SESSION_COLUMNS}",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, ClassSession>(&query).bind(id);

        if let Some(training_id) = data.training_id {
            q = q.bind(training_id);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }
        if let Some(access_link) = data.access_link {
            q = q.bind(access_link);
        }

        let session = q.fetch_optional(pool).await?;

        Ok(session)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM class_sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sessions = sqlx::query_as::<_, ClassSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM class_sessions ORDER BY start_date DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(sessions)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM class_sessions")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Sessions a learner is enrolled in, with the training joined in
    pub async fn list_for_learner(
        pool: &PgPool,
        learner_id: Uuid,
    ) -> Result<Vec<SessionWithTraining>, sqlx::Error> {
        let sessions = sqlx::query_as::<_, SessionWithTraining>(
            r#"
            SELECT s.id, s.name, s.start_date, s.end_date, s.access_link,
                   t.id AS training_id, t.name AS training_name,
                   t.description AS training_description
            FROM class_sessions s
            JOIN trainings t ON t.id = s.training_id
            JOIN enrollments e ON e.session_id = s.id
            WHERE e.learner_id = $1
            ORDER BY s.start_date DESC
            "#,
        )
        .bind(learner_id)
        .fetch_all(pool)
        .await?;

        Ok(sessions)
    }
}
