/// Class-session resources and the learner visibility rule
///
/// A resource (slides, recording, lab material) belongs to a class session.
/// Admins manage resources freely; learners only see resources that pass
/// [`resource_visible`], which is a pure predicate recomputed per request:
///
/// - drafts are never visible;
/// - the learner must be enrolled in the resource's session;
/// - before the session start date, only early-access resources show.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE resources (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     session_id UUID NOT NULL REFERENCES class_sessions(id) ON DELETE CASCADE,
///     kind VARCHAR(100) NOT NULL,
///     early_access BOOLEAN NOT NULL,
///     name VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL,
///     draft BOOLEAN NOT NULL
/// );
/// ```

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Resource model
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Resource {
    pub id: Uuid,

    /// Class session the resource belongs to
    pub session_id: Uuid,

    /// Free-form kind label ("video", "slides", ...)
    pub kind: String,

    /// Visible before the session starts
    pub early_access: bool,

    pub name: String,
    pub description: String,

    /// Drafts are never shown to learners
    pub draft: bool,
}

/// Resource paired with its session's start date, as fetched for the panel
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResourceWithStart {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub resource: Resource,

    /// The owning session's start date
    #[serde(skip)]
    pub session_start: NaiveDate,
}

/// Input for creating a resource
#[derive(Debug, Clone)]
pub struct CreateResource {
    pub session_id: Uuid,
    pub kind: String,
    pub early_access: bool,
    pub name: String,
    pub description: String,
    pub draft: bool,
}

/// Input for updating a resource; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateResource {
    pub session_id: Option<Uuid>,
    pub kind: Option<String>,
    pub early_access: Option<bool>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub draft: Option<bool>,
}

/// Decides whether a learner may see a resource
///
/// Pure function over the resource, its session's start date, the set of
/// sessions the learner is enrolled in, and the current date. Kept
/// standalone so the rule is testable without a database.
pub fn resource_visible(
    resource: &Resource,
    session_start: NaiveDate,
    enrolled_sessions: &HashSet<Uuid>,
    today: NaiveDate,
) -> bool {
    if resource.draft {
        return false;
    }

    if !enrolled_sessions.contains(&resource.session_id) {
        return false;
    }

    session_start <= today || resource.early_access
}

const RESOURCE_COLUMNS: &str = "id, session_id, kind, early_access, name, description, draft";

impl Resource {
    pub async fn create(pool: &PgPool, data: CreateResource) -> Result<Self, sqlx::Error> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            r#"
            INSERT INTO resources (session_id, kind, early_access, name, description, draft)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(data.session_id)
        .bind(data.kind)
        .bind(data.early_access)
        .bind(data.name)
        .bind(data.description)
        .bind(data.draft)
        .fetch_one(pool)
        .await?;

        Ok(resource)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(resource)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateResource,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_count = 1;

        if data.session_id.is_some() {
            bind_count += 1;
            sets.push(format!("session_id = ${}", bind_count));
        }
        if data.kind.is_some() {
            bind_count += 1;
            sets.push(format!("kind = ${}", bind_count));
        }
        if data.early_access.is_some() {
            bind_count += 1;
            sets.push(format!("early_access = ${}", bind_count));
        }
        if data.name.is_some() {
            bind_count += 1;
            sets.push(format!("name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            sets.push(format!("description = ${}", bind_count));
        }
        if data.draft.is_some() {
            bind_count += 1;
            sets.push(format!("draft = ${}", bind_count));
        }

        if sets.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE resources SET {} WHERE id = $1 RETURNING {RESOURCE_COLUMNS}",
            sets.join(", ")
        );

        let mut q = sqlx::query_as::<_, Resource>(&query).bind(id);

        if let Some(session_id) = data.session_id {
            q = q.bind(session_id);
        }
        if let Some(kind) = data.kind {
            q = q.bind(kind);
        }
        if let Some(early_access) = data.early_access {
            q = q.bind(early_access);
        }
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(draft) = data.draft {
            q = q.bind(draft);
        }

        let resource = q.fetch_optional(pool).await?;

        Ok(resource)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY name LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(resources)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resources")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Candidate resources for a learner's enrolled sessions
    ///
    /// Fetches every resource of every enrolled session (optionally limited
    /// to one session), paired with the session start date. Visibility is
    /// then decided in Rust with [`resource_visible`].
    pub async fn candidates_for_learner(
        pool: &PgPool,
        learner_id: Uuid,
        session_filter: Option<Uuid>,
    ) -> Result<Vec<ResourceWithStart>, sqlx::Error> {
        let resources = sqlx::query_as::<_, ResourceWithStart>(&format!(
            r#"
            SELECT r.id, r.session_id, r.kind, r.early_access, r.name,
                   r.description, r.draft, s.start_date AS session_start
            FROM resources r
            JOIN class_sessions s ON s.id = r.session_id
            JOIN enrollments e ON e.session_id = r.session_id
            WHERE e.learner_id = $1
              AND ($2::uuid IS NULL OR r.session_id = $2)
            ORDER BY r.name
            "#
        ))
        .bind(learner_id)
        .bind(session_filter)
        .fetch_all(pool)
        .await?;

        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(session_id: Uuid, early_access: bool, draft: bool) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            session_id,
            kind: "video".to_string(),
            early_access,
            name: "Intro".to_string(),
            description: "Course introduction".to_string(),
            draft,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_visible_after_session_start() {
        let session = Uuid::new_v4();
        let enrolled = HashSet::from([session]);
        let r = resource(session, false, false);

        // Session started yesterday
        assert!(resource_visible(
            &r,
            date(2025, 3, 1),
            &enrolled,
            date(2025, 3, 2)
        ));

        // Start date counts as started
        assert!(resource_visible(
            &r,
            date(2025, 3, 2),
            &enrolled,
            date(2025, 3, 2)
        ));
    }

    #[test]
    fn test_early_access_before_session_start() {
        let session = Uuid::new_v4();
        let enrolled = HashSet::from([session]);

        // Session starts next week; only the early-access variant shows
        let early = resource(session, true, false);
        let regular = resource(session, false, false);

        assert!(resource_visible(
            &early,
            date(2025, 3, 9),
            &enrolled,
            date(2025, 3, 2)
        ));
        assert!(!resource_visible(
            &regular,
            date(2025, 3, 9),
            &enrolled,
            date(2025, 3, 2)
        ));
    }

    #[test]
    fn test_draft_never_visible() {
        let session = Uuid::new_v4();
        let enrolled = HashSet::from([session]);
        let r = resource(session, true, true);

        assert!(!resource_visible(
            &r,
            date(2025, 3, 1),
            &enrolled,
            date(2025, 3, 2)
        ));
    }

    #[test]
    fn test_unenrolled_session_not_visible() {
        let enrolled = HashSet::from([Uuid::new_v4()]);
        let r = resource(Uuid::new_v4(), true, false);

        assert!(!resource_visible(
            &r,
            date(2025, 3, 1),
            &enrolled,
            date(2025, 3, 2)
        ));
    }
}
