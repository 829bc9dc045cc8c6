pub mod registration_forms;
pub mod registrations;
pub mod teams;
pub mod threads;

pub use registration_forms::{
    CreateFormConfig, CreateFormField, CreateFormStep, RegistrationFormRepo,
};
pub use registrations::{CreateRegistration, RegistrationRepo};
pub use teams::TeamRepo;
pub use threads::{NewThreadMessage, ThreadRepo};
