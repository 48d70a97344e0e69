pub mod auth;
pub mod cache;
mod future;
pub mod headers;
pub mod metrics;
mod otlp_tracing_bridge;
pub mod subscription;
pub mod tracing;
