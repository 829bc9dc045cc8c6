pub mod conversation;
pub mod db;
pub mod draft;
pub mod error;
pub mod form;
pub mod lifecycle;
pub mod models;
pub mod pagination;
pub mod repos;

pub use error::DomainError;
