//! API token storage, rate limiting and service

mod postgres_repository;
mod rate_limiter;
mod repository;
mod service;

pub use postgres_repository::PostgresApiTokenRepository;
pub use rate_limiter::{RateLimitResult, RateLimiter};
pub use repository::InMemoryApiTokenRepository;
pub use service::{ApiTokenService, CreatedApiToken};
