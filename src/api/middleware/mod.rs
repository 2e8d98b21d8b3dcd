//! HTTP middleware

pub mod api_token;
pub mod client_ip;
pub mod logging;
pub mod master_key;
pub mod security;

pub use api_token::{require_api_token, AuthenticatedToken, CurrentApiToken};
pub use logging::request_logging_middleware;
pub use master_key::{require_master_key, CurrentMasterKey};
pub use security::security_headers_middleware;
