pub mod app;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;
pub mod state;

pub use state::AppState;
