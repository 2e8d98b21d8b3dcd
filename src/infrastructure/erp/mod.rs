//! ERP gateway implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryErpGateway;
pub use postgres::PostgresErpGateway;
