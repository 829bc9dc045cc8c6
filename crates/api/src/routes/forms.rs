use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use infra::{
    form::{FieldKind, FormConfig},
    models::{FormFieldRow, FormStepRow, RegistrationFormConfigRow},
    repos::{CreateFormConfig, CreateFormField, CreateFormStep, RegistrationFormRepo},
};

#[derive(Deserialize)]
pub struct CreateFormConfigBody {
    #[serde(default)]
    pub requires_payment: bool,
    #[serde(default)]
    pub entry_fee_cents: i32,
    pub payment_url: Option<String>,
    pub payment_instructions: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateStepBody {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateFieldBody {
    pub field_type: String,
    pub label: String,
    #[serde(default)]
    pub is_required: bool,
    pub options: Option<String>,
}

#[derive(Serialize)]
pub struct FormFieldPayload {
    pub id: Uuid,
    pub label: String,
    pub is_required: bool,
    pub field_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct FormStepPayload {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FormFieldPayload>,
}

#[derive(Serialize)]
pub struct FormConfigPayload {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub requires_payment: bool,
    pub entry_fee_cents: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_instructions: Option<String>,
    pub total_steps: usize,
    pub steps: Vec<FormStepPayload>,
}

impl From<FormConfig> for FormConfigPayload {
    fn from(form: FormConfig) -> Self {
        let total_steps = form.total_steps();
        FormConfigPayload {
            id: form.id,
            tournament_id: form.tournament_id,
            requires_payment: form.requires_payment,
            entry_fee_cents: form.entry_fee_cents,
            payment_url: form.payment_url,
            payment_instructions: form.payment_instructions,
            total_steps,
            steps: form
                .steps
                .into_iter()
                .map(|step| FormStepPayload {
                    id: step.id,
                    title: step.title,
                    description: step.description,
                    fields: step
                        .fields
                        .into_iter()
                        .map(|field| {
                            let (field_type, options) = match field.kind {
                                FieldKind::Text => ("text", None),
                                FieldKind::YesNo => ("yesno", None),
                                FieldKind::Dropdown(options) => ("dropdown", Some(options)),
                            };
                            FormFieldPayload {
                                id: field.id,
                                label: field.label,
                                is_required: field.is_required,
                                field_type,
                                options,
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

pub async fn get_form(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<FormConfigPayload>, AppError> {
    let form = RegistrationFormRepo::new(state.db.clone())
        .get_form(tournament_id)
        .await?;
    Ok(Json(form.into()))
}

pub async fn create_form(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
    Json(body): Json<CreateFormConfigBody>,
) -> Result<(StatusCode, Json<RegistrationFormConfigRow>), AppError> {
    let row = RegistrationFormRepo::new(state.db.clone())
        .create_config(CreateFormConfig {
            tournament_id,
            requires_payment: body.requires_payment,
            entry_fee_cents: body.entry_fee_cents,
            payment_url: body.payment_url,
            payment_instructions: body.payment_instructions,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn add_step(
    State(state): State<AppState>,
    Path(config_id): Path<Uuid>,
    Json(body): Json<CreateStepBody>,
) -> Result<(StatusCode, Json<FormStepRow>), AppError> {
    let row = RegistrationFormRepo::new(state.db.clone())
        .add_step(
            config_id,
            CreateFormStep {
                title: body.title,
                description: body.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete_step(
    State(state): State<AppState>,
    Path(step_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    RegistrationFormRepo::new(state.db.clone())
        .delete_step(step_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_field(
    State(state): State<AppState>,
    Path(step_id): Path<Uuid>,
    Json(body): Json<CreateFieldBody>,
) -> Result<(StatusCode, Json<FormFieldRow>), AppError> {
    if FieldKind::from_row(&body.field_type, body.options.as_deref()).is_none() {
        return Err(AppError::BadRequest(format!(
            "unknown field type {:?}",
            body.field_type
        )));
    }

    let row = RegistrationFormRepo::new(state.db.clone())
        .add_field(
            step_id,
            CreateFormField {
                field_type: body.field_type,
                label: body.label,
                is_required: body.is_required,
                options: body.options,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn delete_field(
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    RegistrationFormRepo::new(state.db.clone())
        .delete_field(field_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
