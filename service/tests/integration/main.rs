pub mod helpers;

#[cfg(all(feature = "sqlx-postgres", feature = "loader"))]
mod loader;

#[cfg(feature = "loader")]
mod build_crate;
