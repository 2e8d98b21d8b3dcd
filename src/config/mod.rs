//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, BackendKind, ErpSettings, LogFormat, LoggingConfig, ServerConfig, StorageSettings,
    TokenSettings,
};
