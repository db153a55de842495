//! docforge HTTP gateway
//!
//! Upload form, document processing endpoint and a health probe.

pub mod attachments;
pub mod control_ui;
pub mod health_api;
pub mod server;

pub use server::{router, start_server, GatewayState};
