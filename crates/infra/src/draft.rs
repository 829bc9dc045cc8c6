//! In-progress registration drafts. Registrants autosave a JSON blob into a
//! key-value store keyed by `registration-draft-{tournamentId}-{userId}`;
//! this module owns the key format, the blob schema, and schema-checked
//! parsing so a malformed draft is rejected instead of silently adopted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::form::{BasicInfo, FormConfig, PaymentInfo};

/// Keys are scoped per registrant: two users drafting for the same
/// tournament must never see or clobber each other's blobs.
pub fn draft_key(tournament_id: Uuid, user_id: Uuid) -> String {
    format!("registration-draft-{tournament_id}-{user_id}")
}

/// The key-value contract the client-side store implements.
pub trait DraftStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryDraftStore {
    items: Mutex<HashMap<String, String>>,
}

impl DraftStore for MemoryDraftStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        self.items.lock().unwrap().insert(key.to_string(), value);
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().unwrap().remove(key);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistrationDraft {
    pub team_name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub responses: BTreeMap<Uuid, String>,
    #[serde(default)]
    pub payment: PaymentInfo,
}

impl RegistrationDraft {
    pub fn basic(&self) -> BasicInfo {
        BasicInfo {
            team_name: self.team_name.clone(),
            contact_email: self.contact_email.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft blob is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("draft step {step} is out of range for this form")]
    StepOutOfRange { step: usize },
    #[error("draft references unknown field {field_id}")]
    UnknownField { field_id: Uuid },
}

/// Parses a stored draft blob and checks it against the form schema it will
/// be submitted through.
pub fn parse_draft(config: &FormConfig, raw: &str) -> Result<RegistrationDraft, DraftError> {
    let draft: RegistrationDraft = serde_json::from_str(raw)?;

    if draft.current_step > config.total_steps() {
        return Err(DraftError::StepOutOfRange {
            step: draft.current_step,
        });
    }

    for field_id in draft.responses.keys() {
        let known = config
            .steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .any(|f| f.id == *field_id);
        if !known {
            return Err(DraftError::UnknownField {
                field_id: *field_id,
            });
        }
    }

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FieldKind, FormField, FormStep};
    use serde_json::json;

    fn config_with_field(field_id: Uuid, requires_payment: bool) -> FormConfig {
        FormConfig {
            id: Uuid::new_v4(),
            tournament_id: Uuid::new_v4(),
            requires_payment,
            entry_fee_cents: 0,
            payment_url: None,
            payment_instructions: None,
            steps: vec![FormStep {
                id: Uuid::new_v4(),
                title: "Roster".to_string(),
                description: None,
                fields: vec![FormField {
                    id: field_id,
                    label: "Captain".to_string(),
                    is_required: true,
                    kind: FieldKind::Text,
                }],
            }],
        }
    }

    #[test]
    fn round_trips_a_well_formed_draft() {
        let field_id = Uuid::new_v4();
        let config = config_with_field(field_id, false);
        let raw = format!(
            r#"{{"teamName":"Alpha","contactEmail":"a@example.org","currentStep":1,"responses":{{"{field_id}":"Jo"}}}}"#
        );

        let draft = parse_draft(&config, &raw).unwrap();
        assert_eq!(draft.team_name, "Alpha");
        assert_eq!(draft.basic().contact_email.as_deref(), Some("a@example.org"));
        assert_eq!(draft.current_step, 1);
        assert_eq!(draft.responses.get(&field_id).map(String::as_str), Some("Jo"));
    }

    #[test]
    fn rejects_non_json_and_unknown_keys() {
        let config = config_with_field(Uuid::new_v4(), false);
        assert!(matches!(
            parse_draft(&config, "{not json"),
            Err(DraftError::Malformed(_))
        ));
        let raw = json!({ "teamName": "Alpha", "legacyBlob": 1 }).to_string();
        assert!(matches!(
            parse_draft(&config, &raw),
            Err(DraftError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_step_beyond_the_form() {
        let config = config_with_field(Uuid::new_v4(), false);
        let raw = json!({ "teamName": "Alpha", "currentStep": 5 }).to_string();
        assert!(matches!(
            parse_draft(&config, &raw),
            Err(DraftError::StepOutOfRange { step: 5 })
        ));
    }

    #[test]
    fn rejects_responses_for_fields_the_form_does_not_have() {
        let config = config_with_field(Uuid::new_v4(), false);
        let stray = Uuid::new_v4();
        let raw = format!(r#"{{"teamName":"Alpha","responses":{{"{stray}":"x"}}}}"#);
        assert!(matches!(
            parse_draft(&config, &raw),
            Err(DraftError::UnknownField { field_id }) if field_id == stray
        ));
    }

    #[test]
    fn memory_store_honors_the_kv_contract() {
        let store = MemoryDraftStore::default();
        let key = draft_key(Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(store.get_item(&key), None);
        store.set_item(&key, "{}".to_string());
        assert_eq!(store.get_item(&key).as_deref(), Some("{}"));
        store.remove_item(&key);
        assert_eq!(store.get_item(&key), None);
        // Removing again is a no-op.
        store.remove_item(&key);
    }

    #[test]
    fn drafts_are_isolated_per_registrant() {
        let store = MemoryDraftStore::default();
        let tournament = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        store.set_item(
            &draft_key(tournament, alice),
            r#"{"teamName":"Alpha"}"#.to_string(),
        );
        store.set_item(
            &draft_key(tournament, bob),
            r#"{"teamName":"Bravo"}"#.to_string(),
        );

        // Two registrants for the same tournament never clobber each other.
        assert_eq!(
            store.get_item(&draft_key(tournament, alice)).as_deref(),
            Some(r#"{"teamName":"Alpha"}"#)
        );
        assert_eq!(
            store.get_item(&draft_key(tournament, bob)).as_deref(),
            Some(r#"{"teamName":"Bravo"}"#)
        );

        // Clearing one registrant's draft leaves the other's intact.
        store.remove_item(&draft_key(tournament, bob));
        assert!(store.get_item(&draft_key(tournament, alice)).is_some());
        assert_eq!(store.get_item(&draft_key(tournament, bob)), None);
    }
}
