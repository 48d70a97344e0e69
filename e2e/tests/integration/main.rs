pub mod helpers;

pub mod actix_web;
pub mod axum;
pub mod custom_tracing_layer;
pub mod poem;
pub mod rocket;
pub mod salvo;
pub mod thruster;
pub mod tide;
pub mod tower;
pub mod warp;
