//! Infrastructure layer - Storage backends, services and external systems

pub mod api_token;
pub mod credentials;
pub mod erp;
pub mod logging;
pub mod master_key;
pub mod seed;
pub mod storage;
