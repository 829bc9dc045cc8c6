mod common;

use std::collections::BTreeMap;

use api::error::AppError;
use api::services::{RegistrationService, SubmitRegistration};
use common::*;
use infra::error::DomainError;
use infra::form::PaymentInfo;
use infra::repos::{CreateRegistration, RegistrationRepo};
use uuid::Uuid;

fn submission(team_name: &str, field_id: Uuid, captain: &str) -> SubmitRegistration {
    let mut responses = BTreeMap::new();
    responses.insert(field_id, captain.to_string());
    SubmitRegistration {
        team_name: team_name.to_string(),
        contact_email: Some("captain@example.com".to_string()),
        responses,
        payment: PaymentInfo::default(),
    }
}

#[tokio::test]
async fn test_submit_and_approve_creates_team() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Lifecycle Cup").await;
    let (_, field_id) = create_test_form(&app_state, tournament_id, false).await;

    let service = RegistrationService::new(app_state.clone());
    let registration = service
        .submit(
            tournament_id,
            Uuid::new_v4(),
            submission("The Rounders", field_id, "Alex"),
        )
        .await
        .expect("Submission should succeed");

    assert_eq!(registration.status, "submitted");
    assert_eq!(registration.payment_status, "pending");

    let (approved, team) = service
        .approve(registration.id)
        .await
        .expect("Approval should succeed");

    assert_eq!(approved.status, "approved");
    assert_eq!(team.registration_id, registration.id);
    assert_eq!(team.name, "The Rounders");
    assert_eq!(team.tournament_id, tournament_id);
}

#[tokio::test]
async fn test_submit_missing_required_field_fails_validation() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Validation Cup").await;
    let (_, field_id) = create_test_form(&app_state, tournament_id, false).await;

    let service = RegistrationService::new(app_state.clone());
    let mut sub = submission("No Captain", field_id, "Alex");
    sub.responses.clear();

    let err = service
        .submit(tournament_id, Uuid::new_v4(), sub)
        .await
        .expect_err("Missing required field should fail");

    match err {
        AppError::Domain(DomainError::Validation(outcome)) => {
            assert!(outcome.errors.contains_key(&field_id.to_string()));
        }
        other => panic!("Expected validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_team_name_conflicts() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Duplicate Cup").await;
    let (_, field_id) = create_test_form(&app_state, tournament_id, false).await;

    let service = RegistrationService::new(app_state.clone());
    service
        .submit(
            tournament_id,
            Uuid::new_v4(),
            submission("Sharks", field_id, "Alex"),
        )
        .await
        .expect("First submission should succeed");

    // Uniqueness is case-insensitive and enforced by the database.
    let err = service
        .submit(
            tournament_id,
            Uuid::new_v4(),
            submission("SHARKS", field_id, "Brook"),
        )
        .await
        .expect_err("Second submission with the same name should conflict");

    match err {
        AppError::Domain(DomainError::DuplicateTeamName(name)) => {
            assert_eq!(name, "SHARKS");
        }
        other => panic!("Expected duplicate team name, got {other:?}"),
    }
}

#[tokio::test]
async fn test_approve_draft_is_invalid_transition() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Skip Cup").await;
    create_test_form(&app_state, tournament_id, false).await;

    let repo = RegistrationRepo::new(app_state.db.clone());
    let draft = repo
        .create_draft(CreateRegistration {
            tournament_id,
            user_id: Uuid::new_v4(),
            team_name: "Too Eager".to_string(),
            contact_email: None,
        })
        .await
        .expect("Draft creation should succeed");

    let err = repo
        .approve(draft.id)
        .await
        .expect_err("Approving a draft should be refused");
    assert!(matches!(err, DomainError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_payment_verification_workflow() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Paid Cup").await;
    let (_, field_id) = create_test_form(&app_state, tournament_id, true).await;

    let service = RegistrationService::new(app_state.clone());
    let mut sub = submission("Payers", field_id, "Alex");
    sub.payment = PaymentInfo {
        transaction_id: Some("txn-123".to_string()),
        proof_url: None,
    };

    let registration = service
        .submit(tournament_id, Uuid::new_v4(), sub)
        .await
        .expect("Submission with evidence should succeed");
    assert_eq!(registration.payment_status, "submitted");

    // The review queue sees it until the organizer acts.
    let queue = service.payment_review_queue(None).await.unwrap();
    assert!(queue.iter().any(|r| r.id == registration.id));

    let verified = service.verify_payment(registration.id).await.unwrap();
    assert_eq!(verified.payment_status, "verified");

    let queue = service.payment_review_queue(None).await.unwrap();
    assert!(!queue.iter().any(|r| r.id == registration.id));

    // Verified but not yet approved: shows up in reconciliation.
    let pending = service.verified_unapproved().await.unwrap();
    assert!(pending.iter().any(|r| r.id == registration.id));

    service.approve(registration.id).await.unwrap();
    let pending = service.verified_unapproved().await.unwrap();
    assert!(!pending.iter().any(|r| r.id == registration.id));
}

#[tokio::test]
async fn test_payment_review_is_terminal() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Terminal Cup").await;
    let (_, field_id) = create_test_form(&app_state, tournament_id, true).await;

    let service = RegistrationService::new(app_state.clone());
    let mut sub = submission("One Shot", field_id, "Alex");
    sub.payment = PaymentInfo {
        transaction_id: Some("txn-456".to_string()),
        proof_url: None,
    };

    let registration = service
        .submit(tournament_id, Uuid::new_v4(), sub)
        .await
        .unwrap();

    let rejected = service.reject_payment(registration.id).await.unwrap();
    assert_eq!(rejected.payment_status, "rejected");

    let err = service
        .verify_payment(registration.id)
        .await
        .expect_err("Rejected payment cannot be verified afterwards");
    assert!(matches!(
        err,
        AppError::Domain(DomainError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn test_approve_with_pending_payment_is_allowed() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Trust Cup").await;
    create_test_form(&app_state, tournament_id, true).await;

    // Organizer may approve before the payment clears; the sub-states are
    // independent.
    let repo = RegistrationRepo::new(app_state.db.clone());
    let draft = repo
        .create_draft(CreateRegistration {
            tournament_id,
            user_id: Uuid::new_v4(),
            team_name: "On Credit".to_string(),
            contact_email: None,
        })
        .await
        .unwrap();
    let submitted = repo
        .submit(draft.id, &BTreeMap::new(), &PaymentInfo::default(), false)
        .await
        .unwrap();
    assert_eq!(submitted.payment_status, "pending");

    let (approved, _team) = repo.approve(draft.id).await.unwrap();
    assert_eq!(approved.status, "approved");
    assert_eq!(approved.payment_status, "pending");
}

#[tokio::test]
async fn test_payment_endpoints_refused_when_form_is_free() {
    let Some(app_state) = setup_test_db().await else { return };

    let tournament_id = create_test_tournament(&app_state, "Free Cup").await;
    let (_, field_id) = create_test_form(&app_state, tournament_id, false).await;

    let service = RegistrationService::new(app_state.clone());
    let registration = service
        .submit(
            tournament_id,
            Uuid::new_v4(),
            submission("Freeloaders", field_id, "Alex"),
        )
        .await
        .unwrap();

    let err = service
        .verify_payment(registration.id)
        .await
        .expect_err("Payment review on a free tournament should be refused");
    assert!(matches!(err, AppError::BadRequest(_)));
}
