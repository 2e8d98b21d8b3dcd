//! ERP passthrough domain

mod gateway;
mod payload;

pub use gateway::{ErpError, ErpGateway};
pub use payload::{ItemPayload, OrderPayload};

#[cfg(test)]
pub use gateway::MockErpGateway;
