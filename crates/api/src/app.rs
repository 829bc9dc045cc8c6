use std::time::Duration;

use axum::{
    extract::State,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::routes::{forms, messages, registrations, threads};
use crate::state::AppState;

/// Build the Axum router: health endpoint plus the registration and
/// messaging surface.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Simple liveness check; also proves DB connectivity.
        .route("/health", get(health))
        // Organizer-authored registration forms
        .route(
            "/tournaments/{id}/registration-form",
            get(forms::get_form).post(forms::create_form),
        )
        .route("/registration-forms/{id}/steps", post(forms::add_step))
        .route("/form-steps/{id}", delete(forms::delete_step))
        .route("/form-steps/{id}/fields", post(forms::add_field))
        .route("/form-fields/{id}", delete(forms::delete_field))
        // Registration lifecycle
        .route("/registrations", post(registrations::submit))
        .route(
            "/registrations/payment-review",
            get(registrations::payment_review_queue),
        )
        .route(
            "/registrations/payment-review/unreconciled",
            get(registrations::payment_unreconciled),
        )
        .route(
            "/registrations/{id}",
            get(registrations::get).patch(registrations::update_draft),
        )
        .route("/registrations/{id}/approve", post(registrations::approve))
        .route("/registrations/{id}/reject", post(registrations::reject))
        .route(
            "/registrations/{id}/payment",
            post(registrations::submit_payment),
        )
        .route(
            "/registrations/{id}/payment/verify",
            post(registrations::verify_payment),
        )
        .route(
            "/registrations/{id}/payment/reject",
            post(registrations::reject_payment),
        )
        // Client draft autosave passthrough
        .route(
            "/tournaments/{id}/registration-draft",
            put(registrations::save_draft).get(registrations::load_draft),
        )
        // Conversation threads
        .route(
            "/message-threads",
            get(threads::list).post(threads::create_direct),
        )
        .route("/message-threads/{id}/read", post(threads::mark_read))
        .route(
            "/message-threads/{id}/messages",
            get(threads::list_messages).post(threads::send_message),
        )
        .route(
            "/matches/{id}/messages",
            get(messages::match_messages).post(messages::send_match_message),
        )
        .route(
            "/messages/{id}",
            patch(messages::edit_message).delete(messages::delete_message),
        )
        // App state (PgPool, draft store)
        .with_state(state)
        // Useful default middlewares
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive()) // tighten later
}

/// Liveness + quick DB probe.
async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    infra::db::ping(&state.db).await?;
    Ok("ok")
}
