use sqlx::Result as SqlxResult;
use uuid::Uuid;

use crate::{
    db::Db,
    error::DomainError,
    form::FormConfig,
    models::{FormFieldRow, FormStepRow, RegistrationFormConfigRow},
};

#[derive(Debug, Clone)]
pub struct CreateFormConfig {
    pub tournament_id: Uuid,
    pub requires_payment: bool,
    pub entry_fee_cents: i32,
    pub payment_url: Option<String>,
    pub payment_instructions: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateFormStep {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateFormField {
    pub field_type: String,
    pub label: String,
    pub is_required: bool,
    pub options: Option<String>,
}

#[derive(Clone)]
pub struct RegistrationFormRepo {
    pool: Db,
}

impl RegistrationFormRepo {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub async fn create_config(
        &self,
        data: CreateFormConfig,
    ) -> SqlxResult<RegistrationFormConfigRow> {
        sqlx::query_as::<_, RegistrationFormConfigRow>(
            r#"
            INSERT INTO registration_form_configs
                (tournament_id, requires_payment, entry_fee_cents, payment_url, payment_instructions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tournament_id, requires_payment, entry_fee_cents,
                      payment_url, payment_instructions, created_at, updated_at
            "#,
        )
        .bind(data.tournament_id)
        .bind(data.requires_payment)
        .bind(data.entry_fee_cents)
        .bind(data.payment_url)
        .bind(data.payment_instructions)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_config_row(
        &self,
        tournament_id: Uuid,
    ) -> SqlxResult<Option<RegistrationFormConfigRow>> {
        sqlx::query_as::<_, RegistrationFormConfigRow>(
            r#"
            SELECT id, tournament_id, requires_payment, entry_fee_cents,
                   payment_url, payment_instructions, created_at, updated_at
            FROM registration_form_configs
            WHERE tournament_id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Loads the full form (config, steps and fields, all in position order)
    /// for a tournament.
    pub async fn get_form(&self, tournament_id: Uuid) -> Result<FormConfig, DomainError> {
        let config = self
            .get_config_row(tournament_id)
            .await?
            .ok_or(DomainError::NotFound("registration form"))?;

        let steps = sqlx::query_as::<_, FormStepRow>(
            r#"
            SELECT id, config_id, position, title, description, created_at, updated_at
            FROM form_steps
            WHERE config_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(config.id)
        .fetch_all(&self.pool)
        .await?;

        let fields = sqlx::query_as::<_, FormFieldRow>(
            r#"
            SELECT f.id, f.step_id, f.position, f.field_type, f.label,
                   f.is_required, f.options, f.created_at, f.updated_at
            FROM form_fields f
            JOIN form_steps s ON f.step_id = s.id
            WHERE s.config_id = $1
            ORDER BY s.position ASC, f.position ASC
            "#,
        )
        .bind(config.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(FormConfig::from_rows(config, steps, fields))
    }

    /// Appends a step at the next position.
    pub async fn add_step(
        &self,
        config_id: Uuid,
        data: CreateFormStep,
    ) -> SqlxResult<FormStepRow> {
        sqlx::query_as::<_, FormStepRow>(
            r#"
            INSERT INTO form_steps (config_id, position, title, description)
            SELECT $1, COALESCE(MAX(position), 0) + 1, $2, $3
            FROM form_steps
            WHERE config_id = $1
            RETURNING id, config_id, position, title, description, created_at, updated_at
            "#,
        )
        .bind(config_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes a step and renumbers the remainder so positions stay
    /// contiguous from 1. Runs in one transaction.
    pub async fn delete_step(&self, step_id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<(Uuid, i32)> = sqlx::query_as(
            "DELETE FROM form_steps WHERE id = $1 RETURNING config_id, position",
        )
        .bind(step_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((config_id, position)) = removed else {
            return Err(DomainError::NotFound("form step"));
        };

        sqlx::query(
            r#"
            UPDATE form_steps
            SET position = position - 1, updated_at = NOW()
            WHERE config_id = $1 AND position > $2
            "#,
        )
        .bind(config_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Appends a field at the next position within its step.
    pub async fn add_field(
        &self,
        step_id: Uuid,
        data: CreateFormField,
    ) -> SqlxResult<FormFieldRow> {
        sqlx::query_as::<_, FormFieldRow>(
            r#"
            INSERT INTO form_fields (step_id, position, field_type, label, is_required, options)
            SELECT $1, COALESCE(MAX(position), 0) + 1, $2, $3, $4, $5
            FROM form_fields
            WHERE step_id = $1
            RETURNING id, step_id, position, field_type, label, is_required,
                      options, created_at, updated_at
            "#,
        )
        .bind(step_id)
        .bind(data.field_type)
        .bind(data.label)
        .bind(data.is_required)
        .bind(data.options)
        .fetch_one(&self.pool)
        .await
    }

    /// Deletes a field and closes the position gap within its step, in one
    /// transaction.
    pub async fn delete_field(&self, field_id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<(Uuid, i32)> = sqlx::query_as(
            "DELETE FROM form_fields WHERE id = $1 RETURNING step_id, position",
        )
        .bind(field_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((step_id, position)) = removed else {
            return Err(DomainError::NotFound("form field"));
        };

        sqlx::query(
            r#"
            UPDATE form_fields
            SET position = position - 1, updated_at = NOW()
            WHERE step_id = $1 AND position > $2
            "#,
        )
        .bind(step_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
