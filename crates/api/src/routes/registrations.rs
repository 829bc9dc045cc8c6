use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::CallerId;
use crate::services::{RegistrationService, SubmitRegistration};
use crate::state::AppState;
use infra::{
    draft::RegistrationDraft,
    error::DomainError,
    form::PaymentInfo,
    models::{RegistrationResponseRow, RegistrationRow, TeamRow},
    pagination::LimitOffset,
    repos::RegistrationRepo,
};

#[derive(Deserialize)]
pub struct SubmitRegistrationBody {
    pub tournament_id: Uuid,
    pub team_name: String,
    pub contact_email: Option<String>,
    #[serde(default)]
    pub responses: BTreeMap<Uuid, String>,
    #[serde(default)]
    pub payment: PaymentInfo,
}

#[derive(Deserialize)]
pub struct UpdateDraftBody {
    pub team_name: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentEvidenceBody {
    pub transaction_id: Option<String>,
    pub proof_url: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    fn page(&self) -> Option<LimitOffset> {
        Some(LimitOffset::clamped(self.limit, self.offset))
    }
}

#[derive(Serialize)]
pub struct RegistrationDetail {
    pub registration: RegistrationRow,
    pub responses: Vec<RegistrationResponseRow>,
}

#[derive(Serialize)]
pub struct ApprovedRegistration {
    pub registration: RegistrationRow,
    pub team: TeamRow,
}

pub async fn submit(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(body): Json<SubmitRegistrationBody>,
) -> Result<(StatusCode, Json<RegistrationRow>), AppError> {
    let row = RegistrationService::new(state)
        .submit(
            body.tournament_id,
            user_id,
            SubmitRegistration {
                team_name: body.team_name,
                contact_email: body.contact_email,
                responses: body.responses,
                payment: body.payment,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationDetail>, AppError> {
    let repo = RegistrationRepo::new(state.db.clone());
    let registration = repo
        .get(id)
        .await?
        .ok_or(DomainError::NotFound("registration"))?;
    let responses = repo.responses(id).await?;
    Ok(Json(RegistrationDetail {
        registration,
        responses,
    }))
}

pub async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDraftBody>,
) -> Result<Json<RegistrationRow>, AppError> {
    let row = RegistrationRepo::new(state.db.clone())
        .update_draft_basics(id, body.team_name, body.contact_email)
        .await?;
    Ok(Json(row))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApprovedRegistration>, AppError> {
    let (registration, team) = RegistrationService::new(state).approve(id).await?;
    Ok(Json(ApprovedRegistration { registration, team }))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationRow>, AppError> {
    let row = RegistrationService::new(state).reject(id).await?;
    Ok(Json(row))
}

pub async fn submit_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentEvidenceBody>,
) -> Result<Json<RegistrationRow>, AppError> {
    let row = RegistrationService::new(state)
        .submit_payment(
            id,
            PaymentInfo {
                transaction_id: body.transaction_id,
                proof_url: body.proof_url,
            },
        )
        .await?;
    Ok(Json(row))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationRow>, AppError> {
    let row = RegistrationService::new(state).verify_payment(id).await?;
    Ok(Json(row))
}

pub async fn reject_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationRow>, AppError> {
    let row = RegistrationService::new(state).reject_payment(id).await?;
    Ok(Json(row))
}

/// Organizer review queue: payments awaiting verification.
pub async fn payment_review_queue(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<RegistrationRow>>, AppError> {
    let rows = RegistrationService::new(state)
        .payment_review_queue(query.page())
        .await?;
    Ok(Json(rows))
}

/// Payments verified whose registration was never approved.
pub async fn payment_unreconciled(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistrationRow>>, AppError> {
    let rows = RegistrationService::new(state).verified_unapproved().await?;
    Ok(Json(rows))
}

pub async fn save_draft(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(tournament_id): Path<Uuid>,
    body: String,
) -> Result<StatusCode, AppError> {
    RegistrationService::new(state)
        .save_draft(tournament_id, user_id, &body)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn load_draft(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<RegistrationDraft>, AppError> {
    let draft = RegistrationService::new(state)
        .load_draft(tournament_id, user_id)
        .await?
        .ok_or(DomainError::NotFound("registration draft"))?;
    Ok(Json(draft))
}
