//! Domain layer - Core entities, repository traits and shared rules

pub mod api_token;
pub mod erp;
pub mod error;
pub mod master_key;
pub mod pagination;
pub mod validation;

pub use api_token::{
    ApiToken, ApiTokenChanges, ApiTokenRepository, ApiTokenSummary, ApiTokenView, NewApiToken,
    DEFAULT_RATE_LIMIT, WILDCARD_ABILITY,
};
pub use erp::{ErpError, ErpGateway, ItemPayload, OrderPayload};
pub use error::{AuthError, DomainError};
pub use master_key::{MasterKey, MasterKeyRepository, MasterKeyView};
pub use pagination::{Page, PageRequest, PaginationMeta};
