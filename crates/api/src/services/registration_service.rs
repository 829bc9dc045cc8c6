use std::collections::BTreeMap;

use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;
use infra::{
    draft::{draft_key, parse_draft, RegistrationDraft},
    error::DomainError,
    form::{BasicInfo, PaymentInfo},
    lifecycle::PaymentStatus,
    models::{RegistrationRow, TeamRow},
    pagination::LimitOffset,
    repos::{CreateRegistration, RegistrationFormRepo, RegistrationRepo},
};

#[derive(Debug, Clone)]
pub struct SubmitRegistration {
    pub team_name: String,
    pub contact_email: Option<String>,
    pub responses: BTreeMap<Uuid, String>,
    pub payment: PaymentInfo,
}

/// Orchestrates the registration lifecycle over the form model, the
/// state machine and the draft store.
pub struct RegistrationService {
    state: AppState,
}

impl RegistrationService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn forms(&self) -> RegistrationFormRepo {
        RegistrationFormRepo::new(self.state.db.clone())
    }

    fn registrations(&self) -> RegistrationRepo {
        RegistrationRepo::new(self.state.db.clone())
    }

    /// Full submission: validates every step (payment step included when the
    /// form requires it), creates or resumes the caller's draft, and moves
    /// it to `submitted`.
    pub async fn submit(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
        submission: SubmitRegistration,
    ) -> Result<RegistrationRow, AppError> {
        let form = self.forms().get_form(tournament_id).await?;

        let basic = BasicInfo {
            team_name: submission.team_name.clone(),
            contact_email: submission.contact_email.clone(),
        };
        let outcome = form.validate_all(&basic, &submission.responses, &submission.payment);
        if !outcome.is_valid() {
            return Err(DomainError::Validation(outcome).into());
        }

        let repo = self.registrations();

        // One registration per (tournament, user): a caller who already has
        // a draft resumes it instead of creating a second row.
        let draft = match repo.get_by_tournament_and_user(tournament_id, user_id).await? {
            Some(existing) => {
                repo.update_draft_basics(
                    existing.id,
                    Some(submission.team_name),
                    submission.contact_email,
                )
                .await?
            }
            None => {
                repo.create_draft(CreateRegistration {
                    tournament_id,
                    user_id,
                    team_name: submission.team_name,
                    contact_email: submission.contact_email,
                })
                .await?
            }
        };

        let submitted = repo
            .submit(
                draft.id,
                &submission.responses,
                &submission.payment,
                form.requires_payment,
            )
            .await?;

        info!(
            registration_id = %submitted.id,
            tournament_id = %tournament_id,
            "Registration submitted"
        );
        Ok(submitted)
    }

    /// Approves a submitted registration: the registration becomes a team,
    /// and the registrant's autosaved draft entry is cleared.
    pub async fn approve(&self, id: Uuid) -> Result<(RegistrationRow, TeamRow), AppError> {
        let (registration, team) = self.registrations().approve(id).await?;

        self.state
            .drafts()
            .remove_item(&draft_key(registration.tournament_id, registration.user_id));

        info!(
            registration_id = %registration.id,
            team_id = %team.id,
            "Registration approved, team added to tournament"
        );
        Ok((registration, team))
    }

    pub async fn reject(&self, id: Uuid) -> Result<RegistrationRow, AppError> {
        let registration = self.registrations().reject(id).await?;
        info!(registration_id = %registration.id, "Registration rejected");
        Ok(registration)
    }

    /// Registrant supplies payment evidence: `pending -> submitted`.
    pub async fn submit_payment(
        &self,
        id: Uuid,
        payment: PaymentInfo,
    ) -> Result<RegistrationRow, AppError> {
        self.ensure_payment_tracked(id).await?;

        if !payment.has_evidence() {
            let mut outcome = infra::form::ValidationOutcome::default();
            outcome.errors.insert(
                "payment".to_string(),
                "Provide a transaction ID or upload proof of payment".to_string(),
            );
            return Err(DomainError::Validation(outcome).into());
        }

        Ok(self
            .registrations()
            .submit_payment(id, payment.transaction_id, payment.proof_url)
            .await?)
    }

    pub async fn verify_payment(&self, id: Uuid) -> Result<RegistrationRow, AppError> {
        self.ensure_payment_tracked(id).await?;
        let row = self
            .registrations()
            .review_payment(id, PaymentStatus::Verified)
            .await?;
        info!(registration_id = %row.id, "Payment verified");
        Ok(row)
    }

    pub async fn reject_payment(&self, id: Uuid) -> Result<RegistrationRow, AppError> {
        self.ensure_payment_tracked(id).await?;
        let row = self
            .registrations()
            .review_payment(id, PaymentStatus::Rejected)
            .await?;
        info!(registration_id = %row.id, "Payment rejected");
        Ok(row)
    }

    pub async fn payment_review_queue(
        &self,
        page: Option<LimitOffset>,
    ) -> Result<Vec<RegistrationRow>, AppError> {
        Ok(self.registrations().payment_review_queue(page).await?)
    }

    /// Verified-but-never-approved registrations, for organizer
    /// reconciliation of the two-step verify-then-approve workflow.
    pub async fn verified_unapproved(&self) -> Result<Vec<RegistrationRow>, AppError> {
        Ok(self.registrations().verified_unapproved().await?)
    }

    /// Autosave touchpoint: the blob is parsed against the form schema and
    /// malformed drafts are rejected, never silently adopted.
    pub async fn save_draft(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
        raw: &str,
    ) -> Result<(), AppError> {
        let form = self.forms().get_form(tournament_id).await?;
        parse_draft(&form, raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.state
            .drafts()
            .set_item(&draft_key(tournament_id, user_id), raw.to_string());
        Ok(())
    }

    pub async fn load_draft(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RegistrationDraft>, AppError> {
        let Some(raw) = self
            .state
            .drafts()
            .get_item(&draft_key(tournament_id, user_id))
        else {
            return Ok(None);
        };
        let form = self.forms().get_form(tournament_id).await?;
        let draft = parse_draft(&form, &raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(Some(draft))
    }

    /// Payment sub-state is irrelevant when the form does not require
    /// payment; transitions on it are refused outright.
    async fn ensure_payment_tracked(&self, registration_id: Uuid) -> Result<(), AppError> {
        let registration = self
            .registrations()
            .get(registration_id)
            .await?
            .ok_or(DomainError::NotFound("registration"))?;

        let config = self
            .forms()
            .get_config_row(registration.tournament_id)
            .await?
            .ok_or(DomainError::NotFound("registration form"))?;

        if !config.requires_payment {
            return Err(AppError::BadRequest(
                "this tournament does not require payment".to_string(),
            ));
        }
        Ok(())
    }
}
