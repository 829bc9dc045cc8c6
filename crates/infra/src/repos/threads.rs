use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{
    conversation::ThreadPreview,
    db::Db,
    error::DomainError,
    models::{MessageThreadRow, ThreadMessageRow},
};

const THREAD_COLUMNS: &str = "id, user_id, participant_id, match_id, participant_name, \
     participant_avatar, last_message, last_message_sender_id, last_message_time, \
     unread_count, created_at, updated_at";

const MESSAGE_COLUMNS: &str =
    "id, thread_id, sender_id, content, image_url, tournament_ref, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewThreadMessage {
    pub sender_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub tournament_ref: Option<Uuid>,
}

#[derive(Clone)]
pub struct ThreadRepo {
    pool: Db,
}

impl ThreadRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<MessageThreadRow>> {
        sqlx::query_as::<_, MessageThreadRow>(&format!(
            "SELECT {THREAD_COLUMNS} FROM message_threads WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Direction-agnostic lookup of the direct thread between two users:
    /// (A, B) and (B, A) address the same row.
    pub async fn find_existing_direct(
        &self,
        user_id: Uuid,
        participant_id: Uuid,
    ) -> SqlxResult<Option<MessageThreadRow>> {
        sqlx::query_as::<_, MessageThreadRow>(&format!(
            "SELECT {THREAD_COLUMNS} FROM message_threads \
             WHERE match_id IS NULL \
               AND ((user_id = $1 AND participant_id = $2) \
                 OR (user_id = $2 AND participant_id = $1))"
        ))
        .bind(user_id)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Creates the direct thread between two users, or returns the existing
    /// one regardless of which side created it first. The partial unique
    /// index on the normalized pair serializes concurrent creations.
    pub async fn get_or_create_direct(
        &self,
        user_id: Uuid,
        participant_id: Uuid,
        participant_name: Option<String>,
        participant_avatar: Option<String>,
    ) -> Result<MessageThreadRow, DomainError> {
        let inserted = sqlx::query_as::<_, MessageThreadRow>(&format!(
            "INSERT INTO message_threads (user_id, participant_id, participant_name, participant_avatar) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ((LEAST(user_id, participant_id)), (GREATEST(user_id, participant_id))) \
                 WHERE match_id IS NULL \
             DO NOTHING \
             RETURNING {THREAD_COLUMNS}"
        ))
        .bind(user_id)
        .bind(participant_id)
        .bind(participant_name)
        .bind(participant_avatar)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        self.find_existing_direct(user_id, participant_id)
            .await?
            .ok_or(DomainError::NotFound("message thread"))
    }

    /// Idempotent get-or-create of the per-user private thread for a match.
    /// Concurrent calls for the same (match_id, user_id) converge on one row
    /// through the upsert, not an application-level check-then-insert.
    pub async fn get_or_create_match_thread(
        &self,
        match_id: Uuid,
        user_id: Uuid,
        participant_name: Option<String>,
        participant_avatar: Option<String>,
    ) -> SqlxResult<MessageThreadRow> {
        sqlx::query_as::<_, MessageThreadRow>(&format!(
            "INSERT INTO message_threads (match_id, user_id, participant_name, participant_avatar) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (match_id, user_id) WHERE match_id IS NOT NULL AND user_id IS NOT NULL \
             DO UPDATE SET updated_at = NOW() \
             RETURNING {THREAD_COLUMNS}"
        ))
        .bind(match_id)
        .bind(user_id)
        .bind(participant_name)
        .bind(participant_avatar)
        .fetch_one(&self.pool)
        .await
    }

    /// Direct threads where the user is creator or participant; rows that
    /// carry a match_id are explicitly excluded.
    pub async fn direct_threads_for(&self, user_id: Uuid) -> SqlxResult<Vec<MessageThreadRow>> {
        sqlx::query_as::<_, MessageThreadRow>(&format!(
            "SELECT {THREAD_COLUMNS} FROM message_threads \
             WHERE match_id IS NULL AND (user_id = $1 OR participant_id = $1)"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Match threads visible to the user: shared rows plus the user's
    /// private copies. Superset fetch; no post-hoc team filtering.
    pub async fn match_threads_for(&self, user_id: Uuid) -> SqlxResult<Vec<MessageThreadRow>> {
        sqlx::query_as::<_, MessageThreadRow>(&format!(
            "SELECT {THREAD_COLUMNS} FROM message_threads \
             WHERE match_id IS NOT NULL AND (user_id IS NULL OR user_id = $1)"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Idempotent; no effect on message ordering or content.
    pub async fn mark_read(&self, thread_id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE message_threads SET unread_count = 0, updated_at = NOW() WHERE id = $1",
        )
        .bind(thread_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("message thread"));
        }
        Ok(())
    }

    pub async fn messages(&self, thread_id: Uuid) -> SqlxResult<Vec<ThreadMessageRow>> {
        sqlx::query_as::<_, ThreadMessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM thread_messages \
             WHERE thread_id = $1 ORDER BY created_at ASC"
        ))
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Appends a message and refreshes the thread preview in the same
    /// transaction.
    pub async fn append_message(
        &self,
        thread_id: Uuid,
        data: NewThreadMessage,
    ) -> Result<ThreadMessageRow, DomainError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM message_threads WHERE id = $1 FOR UPDATE")
                .bind(thread_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(DomainError::NotFound("message thread"));
        }

        let message = sqlx::query_as::<_, ThreadMessageRow>(&format!(
            "INSERT INTO thread_messages (thread_id, sender_id, content, image_url, tournament_ref) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(thread_id)
        .bind(data.sender_id)
        .bind(&data.content)
        .bind(data.image_url)
        .bind(data.tournament_ref)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE message_threads \
             SET last_message = $2, last_message_sender_id = $3, last_message_time = $4, \
                 unread_count = unread_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(thread_id)
        .bind(&message.content)
        .bind(message.sender_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Edits a message's content; if it is the thread's newest message the
    /// preview is refreshed in the same transaction. Only the sender may
    /// edit; anyone else sees the message as missing.
    pub async fn update_message(
        &self,
        message_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> Result<ThreadMessageRow, DomainError> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, ThreadMessageRow>(&format!(
            "UPDATE thread_messages SET content = $3, updated_at = NOW() \
             WHERE id = $1 AND sender_id = $2 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(sender_id)
        .bind(content)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DomainError::NotFound("message"))?;

        Self::resync_preview(&mut tx, message.thread_id).await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Deletes a message and recomputes the thread preview from the newest
    /// remaining message (clearing it if none remain), all in one
    /// transaction so the preview never references a deleted message.
    /// Sender-scoped like `update_message`.
    pub async fn delete_message(
        &self,
        message_id: Uuid,
        sender_id: Uuid,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        let thread_id: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM thread_messages WHERE id = $1 AND sender_id = $2 RETURNING thread_id",
        )
        .bind(message_id)
        .bind(sender_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(thread_id) = thread_id else {
            return Err(DomainError::NotFound("message"));
        };

        Self::resync_preview(&mut tx, thread_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn resync_preview(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        thread_id: Uuid,
    ) -> Result<(), DomainError> {
        let newest = sqlx::query_as::<_, ThreadMessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM thread_messages \
             WHERE thread_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(thread_id)
        .fetch_optional(&mut **tx)
        .await?;

        let preview = ThreadPreview::from_newest(newest.as_ref());

        sqlx::query(
            "UPDATE message_threads \
             SET last_message = $2, last_message_sender_id = $3, last_message_time = $4, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(thread_id)
        .bind(preview.last_message)
        .bind(preview.last_message_sender_id)
        .bind(preview.last_message_time)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
