use std::env;

use api::AppState;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use infra::repos::{CreateFormConfig, CreateFormField, CreateFormStep, RegistrationFormRepo};

/// Connects to the test database named by TEST_DATABASE_URL. Returns None
/// when the variable is unset so the suite can run without Postgres.
pub async fn setup_test_db() -> Option<AppState> {
    let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    infra::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(AppState::new(pool).expect("Failed to create AppState"))
}

/// Create a test tournament and return its ID.
pub async fn create_test_tournament(app_state: &AppState, name: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO tournaments (organizer_id, name, description, start_time) \
         VALUES ($1, $2, $3, NOW() + INTERVAL '7 days') \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind("Test tournament")
    .fetch_one(&app_state.db)
    .await
    .expect("Failed to create test tournament")
}

/// Create a registration form with one configured step ("Roster") holding a
/// required text field, and return (config_id, field_id).
#[allow(dead_code)]
pub async fn create_test_form(
    app_state: &AppState,
    tournament_id: Uuid,
    requires_payment: bool,
) -> (Uuid, Uuid) {
    let repo = RegistrationFormRepo::new(app_state.db.clone());

    let config = repo
        .create_config(CreateFormConfig {
            tournament_id,
            requires_payment,
            entry_fee_cents: if requires_payment { 2500 } else { 0 },
            payment_url: requires_payment.then(|| "https://pay.example/t".to_string()),
            payment_instructions: None,
        })
        .await
        .expect("Failed to create form config");

    let step = repo
        .add_step(
            config.id,
            CreateFormStep {
                title: "Roster".to_string(),
                description: None,
            },
        )
        .await
        .expect("Failed to add form step");

    let field = repo
        .add_field(
            step.id,
            CreateFormField {
                field_type: "text".to_string(),
                label: "Captain name".to_string(),
                is_required: true,
                options: None,
            },
        )
        .await
        .expect("Failed to add form field");

    (config.id, field.id)
}

/// Create a match in a tournament and return its ID.
#[allow(dead_code)]
pub async fn create_test_match(app_state: &AppState, tournament_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO matches (tournament_id, round) VALUES ($1, 1) RETURNING id",
    )
    .bind(tournament_id)
    .fetch_one(&app_state.db)
    .await
    .expect("Failed to create test match")
}
