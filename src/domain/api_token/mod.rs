//! API token domain
//!
//! API tokens authorize calls to the versioned business endpoints. They can be
//! scoped by abilities, bound to one IP address and rate limited.

mod entity;
mod repository;

pub use entity::{
    ApiToken, ApiTokenChanges, ApiTokenSummary, ApiTokenView, NewApiToken, DEFAULT_RATE_LIMIT,
    WILDCARD_ABILITY,
};
pub use repository::ApiTokenRepository;

#[cfg(test)]
pub use repository::MockApiTokenRepository;
