//! Master key storage and service

mod postgres_repository;
mod repository;
mod service;

pub use postgres_repository::PostgresMasterKeyRepository;
pub use repository::InMemoryMasterKeyRepository;
pub use service::{CreatedMasterKey, MasterKeyService};
