//! Core building blocks for the Testrig harness.
//!
//! This crate provides:
//! - The unified [`error::AppError`] type and [`result::AppResult`] alias
//! - Configuration schemas loaded from TOML files and `TESTRIG_*`
//!   environment variables

pub mod config;
pub mod error;
pub mod result;

pub use config::HarnessConfig;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
