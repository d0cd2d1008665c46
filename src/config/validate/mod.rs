//! Configuration validation
//!
//! Checks run specifications before any data is loaded.

mod error;
mod validator;


pub use error::ValidationError;
pub use validator::{validate_config, validate_paths};
