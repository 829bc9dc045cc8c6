//! Registration form model: the organizer-authored schema of steps and
//! fields a team must fill in, plus pure validation over a submission.
//!
//! Step indexing mirrors what registrants see: step 0 is the implicit
//! "basic info" step (team name, contact email), configured steps follow at
//! `1..=steps.len()`, and when the config requires payment a synthetic
//! payment step sits at `steps.len() + 1`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FormFieldRow, FormStepRow, RegistrationFormConfigRow};

/// Closed set of field types. Adding a variant is a compile-time-checked
/// change: every match below must handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Dropdown(Vec<String>),
    YesNo,
}

impl FieldKind {
    /// Decodes the stored `field_type` / comma-separated `options` pair.
    pub fn from_row(field_type: &str, options: Option<&str>) -> Option<FieldKind> {
        match field_type {
            "text" => Some(FieldKind::Text),
            "yesno" => Some(FieldKind::YesNo),
            "dropdown" => {
                let options = options
                    .unwrap_or_default()
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                Some(FieldKind::Dropdown(options))
            }
            _ => None,
        }
    }

    /// Per-variant value check for a non-empty response.
    fn accepts(&self, value: &str) -> Result<(), String> {
        match self {
            FieldKind::Text => Ok(()),
            FieldKind::YesNo => Ok(()),
            FieldKind::Dropdown(options) => {
                if options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err("Select one of the listed options".to_string())
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub id: Uuid,
    pub label: String,
    pub is_required: bool,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub struct FormStep {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone)]
pub struct FormConfig {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub requires_payment: bool,
    pub entry_fee_cents: i32,
    pub payment_url: Option<String>,
    pub payment_instructions: Option<String>,
    pub steps: Vec<FormStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasicInfo {
    pub team_name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInfo {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub proof_url: Option<String>,
}

impl PaymentInfo {
    pub fn has_evidence(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.transaction_id) || filled(&self.proof_url)
    }
}

/// Field-id (or `"teamName"` / `"contactEmail"` / `"payment"`) to message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub errors: BTreeMap<String, String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(key.into()).or_insert_with(|| message.into());
    }
}

impl FormConfig {
    pub fn from_rows(
        config: RegistrationFormConfigRow,
        steps: Vec<FormStepRow>,
        mut fields: Vec<FormFieldRow>,
    ) -> FormConfig {
        fields.sort_by_key(|f| f.position);

        let steps = {
            let mut out: Vec<FormStep> = Vec::with_capacity(steps.len());
            let mut rows = steps;
            rows.sort_by_key(|s| s.position);
            for step in rows {
                let step_fields = fields
                    .iter()
                    .filter(|f| f.step_id == step.id)
                    .filter_map(|f| {
                        Some(FormField {
                            id: f.id,
                            label: f.label.clone(),
                            is_required: f.is_required,
                            kind: FieldKind::from_row(&f.field_type, f.options.as_deref())?,
                        })
                    })
                    .collect();
                out.push(FormStep {
                    id: step.id,
                    title: step.title,
                    description: step.description,
                    fields: step_fields,
                });
            }
            out
        };

        FormConfig {
            id: config.id,
            tournament_id: config.tournament_id,
            requires_payment: config.requires_payment,
            entry_fee_cents: config.entry_fee_cents,
            payment_url: config.payment_url,
            payment_instructions: config.payment_instructions,
            steps,
        }
    }

    /// Configured steps plus the synthetic payment step; the implicit basic
    /// info step is not counted here.
    pub fn total_steps(&self) -> usize {
        self.steps.len() + usize::from(self.requires_payment)
    }

    /// Progress through the wizard, basic info step included.
    pub fn progress(&self, current_step: usize) -> f64 {
        (current_step + 1) as f64 / (self.total_steps() + 1) as f64
    }

    /// Validates a single step of the submission. Pure; the caller persists
    /// a draft after each successful step transition.
    pub fn validate_step(
        &self,
        current_step: usize,
        basic: &BasicInfo,
        responses: &BTreeMap<Uuid, String>,
        payment: &PaymentInfo,
    ) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        if current_step == 0 {
            if basic.team_name.trim().is_empty() {
                outcome.push("teamName", "Team name is required");
            }
            if let Some(email) = basic.contact_email.as_deref() {
                if !email.trim().is_empty() && !is_plausible_email(email.trim()) {
                    outcome.push("contactEmail", "Enter a valid email address");
                }
            }
            return outcome;
        }

        if let Some(step) = self.steps.get(current_step - 1) {
            for field in &step.fields {
                let value = responses
                    .get(&field.id)
                    .map(|v| v.trim())
                    .unwrap_or_default();

                if value.is_empty() {
                    if field.is_required {
                        outcome.push(field.id.to_string(), format!("{} is required", field.label));
                    }
                    continue;
                }

                if let Err(message) = field.kind.accepts(value) {
                    outcome.push(field.id.to_string(), message);
                }
            }
            return outcome;
        }

        if self.requires_payment && current_step == self.steps.len() + 1 {
            if !payment.has_evidence() {
                outcome.push(
                    "payment",
                    "Provide a transaction ID or upload proof of payment",
                );
            }
        }

        outcome
    }

    /// Folds `validate_step` over every step including the payment step.
    /// Gates the draft -> submitted transition.
    pub fn validate_all(
        &self,
        basic: &BasicInfo,
        responses: &BTreeMap<Uuid, String>,
        payment: &PaymentInfo,
    ) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for step in 0..=self.total_steps() {
            let step_outcome = self.validate_step(step, basic, responses, payment);
            for (key, message) in step_outcome.errors {
                outcome.push(key, message);
            }
        }
        outcome
    }
}

/// Structural email check: one '@', non-empty local part, dotted domain.
fn is_plausible_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !s.contains(char::is_whitespace)
        && !domain.contains('@')
}
