//! Helpers for integration tests: build an AppState, then an initialized
//! Actix test service on top of it.

pub mod app_builder;

pub use app_builder::{create_test_app_builder, TestAppBuilder};
