//! Shared types for the codekit workspace
//!
//! `Secret` keeps client secrets and OAuth tokens out of logs and error
//! output; `Error` covers configuration loading for the binaries.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
