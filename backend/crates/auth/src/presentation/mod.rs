//! Presentation Layer
//!
//! HTTP handlers, form/query DTOs, views, and the router.

pub mod dto;
pub mod handlers;
pub mod router;
pub mod views;

pub use handlers::GatewayState;
pub use router::gateway_router;
