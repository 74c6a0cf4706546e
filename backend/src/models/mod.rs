//! Database models for the warehouse backend
//!
//! Re-exports models from the shared crate and adds backend-specific models

pub use shared::models::*;
