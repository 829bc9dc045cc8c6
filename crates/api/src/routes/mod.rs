pub mod forms;
pub mod messages;
pub mod registrations;
pub mod threads;
