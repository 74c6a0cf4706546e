//! Shared types and domain logic for the Firesafe Warehouse Management System
//!
//! This crate contains the movement/batch ledger domain model and the pure
//! arithmetic it is built on (unit conversion, batch depletion, stock
//! projection, price resolution). The backend wraps these rules in
//! transactions; nothing in here touches the database.

pub mod error;
pub mod models;
pub mod units;
pub mod validation;

pub use error::*;
pub use models::*;
pub use units::*;
pub use validation::*;
