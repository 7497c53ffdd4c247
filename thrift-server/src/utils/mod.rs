//! Shared server utilities

pub mod error;
pub mod logger;

pub use error::{ok, ok_with_message, ApiResponse, AppError, AppResult};
