use std::collections::BTreeMap;

use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{
    db::Db,
    error::DomainError,
    form::PaymentInfo,
    lifecycle::{PaymentStatus, RegistrationStatus},
    models::{RegistrationResponseRow, RegistrationRow, TeamRow},
    pagination::LimitOffset,
};

const REGISTRATION_COLUMNS: &str = "id, tournament_id, user_id, team_name, contact_email, \
     status, payment_status, transaction_id, payment_proof_url, created_at, updated_at";

const TEAM_NAME_INDEX: &str = "uq_registrations_team_name";

#[derive(Debug, Clone)]
pub struct CreateRegistration {
    pub tournament_id: Uuid,
    pub user_id: Uuid,
    pub team_name: String,
    pub contact_email: Option<String>,
}

#[derive(Clone)]
pub struct RegistrationRepo {
    pool: Db,
}

impl RegistrationRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> SqlxResult<Option<RegistrationRow>> {
        sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_by_tournament_and_user(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
    ) -> SqlxResult<Option<RegistrationRow>> {
        sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE tournament_id = $1 AND user_id = $2"
        ))
        .bind(tournament_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Creates a draft registration. Team-name uniqueness is serialized by
    /// the database constraint; a violation surfaces as `DuplicateTeamName`
    /// so the caller can offer the "resume existing registration" path.
    pub async fn create_draft(
        &self,
        data: CreateRegistration,
    ) -> Result<RegistrationRow, DomainError> {
        sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations (tournament_id, user_id, team_name, contact_email) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(data.tournament_id)
        .bind(data.user_id)
        .bind(&data.team_name)
        .bind(data.contact_email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::from_unique_violation(e, TEAM_NAME_INDEX, || {
                DomainError::DuplicateTeamName(data.team_name.clone())
            })
        })
    }

    /// Draft autosave touchpoint: basics may change while the registration
    /// is still a draft. Responses are not edited in place; they are written
    /// at submission.
    pub async fn update_draft_basics(
        &self,
        id: Uuid,
        team_name: Option<String>,
        contact_email: Option<String>,
    ) -> Result<RegistrationRow, DomainError> {
        let conflict_name = team_name.clone().unwrap_or_default();
        sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations \
             SET team_name = COALESCE($2, team_name), \
                 contact_email = COALESCE($3, contact_email), \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'draft' \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .bind(team_name)
        .bind(contact_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::from_unique_violation(e, TEAM_NAME_INDEX, || {
                DomainError::DuplicateTeamName(conflict_name)
            })
        })?
        .ok_or(DomainError::NotFound("draft registration"))
    }

    /// Moves a draft to `submitted`, writing the field responses and, when
    /// payment evidence accompanies the submission, advancing the payment
    /// sub-state. One transaction; the row is locked so concurrent
    /// transitions serialize.
    pub async fn submit(
        &self,
        id: Uuid,
        responses: &BTreeMap<Uuid, String>,
        payment: &PaymentInfo,
        requires_payment: bool,
    ) -> Result<RegistrationRow, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DomainError::NotFound("registration"))?;

        let status = parse_status(&row.status)?;
        status.advance(RegistrationStatus::Submitted)?;

        // Re-submission of a draft replaces the response set wholesale.
        sqlx::query("DELETE FROM registration_responses WHERE registration_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (field_id, value) in responses {
            sqlx::query(
                "INSERT INTO registration_responses (registration_id, field_id, value) \
                 VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(field_id)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        let payment_submitted = requires_payment && payment.has_evidence();
        if payment_submitted {
            parse_payment_status(&row.payment_status)?.advance(PaymentStatus::Submitted)?;
        }

        let updated = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations \
             SET status = 'submitted', \
                 payment_status = CASE WHEN $2 THEN 'submitted' ELSE payment_status END, \
                 transaction_id = COALESCE($3, transaction_id), \
                 payment_proof_url = COALESCE($4, payment_proof_url), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .bind(payment_submitted)
        .bind(payment.transaction_id.as_deref())
        .bind(payment.proof_url.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Approves a submitted registration and creates its team roster entry
    /// in the same transaction.
    pub async fn approve(&self, id: Uuid) -> Result<(RegistrationRow, TeamRow), DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DomainError::NotFound("registration"))?;

        parse_status(&row.status)?.advance(RegistrationStatus::Approved)?;

        let updated = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations SET status = 'approved', updated_at = NOW() \
             WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let team = sqlx::query_as::<_, TeamRow>(
            "INSERT INTO teams (tournament_id, registration_id, name) \
             VALUES ($1, $2, $3) \
             RETURNING id, tournament_id, registration_id, name, created_at",
        )
        .bind(row.tournament_id)
        .bind(row.id)
        .bind(&row.team_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((updated, team))
    }

    /// Rejects a submitted registration. The payment sub-state is left
    /// untouched for audit purposes.
    pub async fn reject(&self, id: Uuid) -> Result<RegistrationRow, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DomainError::NotFound("registration"))?;

        parse_status(&row.status)?.advance(RegistrationStatus::Rejected)?;

        let updated = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations SET status = 'rejected', updated_at = NOW() \
             WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Registrant-supplied payment evidence: `pending -> submitted`.
    pub async fn submit_payment(
        &self,
        id: Uuid,
        transaction_id: Option<String>,
        proof_url: Option<String>,
    ) -> Result<RegistrationRow, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DomainError::NotFound("registration"))?;

        parse_payment_status(&row.payment_status)?.advance(PaymentStatus::Submitted)?;

        let updated = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations \
             SET payment_status = 'submitted', \
                 transaction_id = COALESCE($2, transaction_id), \
                 payment_proof_url = COALESCE($3, payment_proof_url), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .bind(transaction_id)
        .bind(proof_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Organizer payment review: `submitted -> {verified, rejected}`.
    /// Independent of the parent registration status.
    pub async fn review_payment(
        &self,
        id: Uuid,
        to: PaymentStatus,
    ) -> Result<RegistrationRow, DomainError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DomainError::NotFound("registration"))?;

        let next = parse_payment_status(&row.payment_status)?.advance(to)?;

        let updated = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations SET payment_status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Organizer review queue: registrations awaiting payment verification,
    /// limited to tournaments whose form actually requires payment.
    pub async fn payment_review_queue(
        &self,
        page: Option<LimitOffset>,
    ) -> SqlxResult<Vec<RegistrationRow>> {
        let p = page.unwrap_or_default();

        sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT r.id, r.tournament_id, r.user_id, r.team_name, r.contact_email,
                   r.status, r.payment_status, r.transaction_id, r.payment_proof_url,
                   r.created_at, r.updated_at
            FROM registrations r
            JOIN registration_form_configs c ON c.tournament_id = r.tournament_id
            WHERE c.requires_payment = TRUE AND r.payment_status = 'submitted'
            ORDER BY r.updated_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(p.limit)
        .bind(p.offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Reconciliation view for the two-step verify-then-approve workflow:
    /// payments verified whose registration never got approved.
    pub async fn verified_unapproved(&self) -> SqlxResult<Vec<RegistrationRow>> {
        sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations \
             WHERE payment_status = 'verified' AND status <> 'approved' \
             ORDER BY updated_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn responses(&self, registration_id: Uuid) -> SqlxResult<Vec<RegistrationResponseRow>> {
        sqlx::query_as::<_, RegistrationResponseRow>(
            "SELECT id, registration_id, field_id, value, created_at \
             FROM registration_responses WHERE registration_id = $1",
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Tournaments where the user holds an approved registration
    /// (resolution step 1).
    pub async fn approved_tournament_ids(&self, user_id: Uuid) -> SqlxResult<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT tournament_id FROM registrations \
             WHERE user_id = $1 AND status = 'approved'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

fn parse_status(s: &str) -> Result<RegistrationStatus, DomainError> {
    RegistrationStatus::parse(s).ok_or(DomainError::CorruptState("registration status"))
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, DomainError> {
    PaymentStatus::parse(s).ok_or(DomainError::CorruptState("payment status"))
}
