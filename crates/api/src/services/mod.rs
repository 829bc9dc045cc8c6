pub mod registration_service;
pub mod thread_service;

pub use registration_service::{RegistrationService, SubmitRegistration};
pub use thread_service::ThreadService;
