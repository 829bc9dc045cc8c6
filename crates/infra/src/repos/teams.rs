use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{db::Db, models::TeamRow};

#[derive(Clone)]
pub struct TeamRepo {
    pool: Db,
}

impl TeamRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<TeamRow>> {
        sqlx::query_as::<_, TeamRow>(
            "SELECT id, tournament_id, registration_id, name, created_at \
             FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_by_tournament(&self, tournament_id: Uuid) -> SqlxResult<Vec<TeamRow>> {
        sqlx::query_as::<_, TeamRow>(
            "SELECT id, tournament_id, registration_id, name, created_at \
             FROM teams WHERE tournament_id = $1 ORDER BY created_at ASC",
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Teams the user's approved registrations resulted in (resolution
    /// step 4).
    pub async fn user_team_ids(&self, user_id: Uuid) -> SqlxResult<Vec<Uuid>> {
        sqlx::query_scalar(
            r#"
            SELECT t.id
            FROM teams t
            JOIN registrations r ON t.registration_id = r.id
            WHERE r.user_id = $1 AND r.status = 'approved'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
