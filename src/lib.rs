// Library exports for binaries and integration tests
pub mod app_store;
pub mod attributes;
pub mod config;
pub mod error;
pub mod locale;
pub mod locator;
pub mod sync;
pub mod validator;
