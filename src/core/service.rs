//! Remote GAP service client

pub mod client;
pub mod types;

pub use client::GapServiceClient;
pub use types::{
    EntityUpdateRequest, HealthStatus, ThreadContext, TransformRequest, WrapRequest, DEFAULT_ENTITY_TYPE,
    DEFAULT_ROLE,
};
