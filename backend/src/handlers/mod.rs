//! HTTP handlers for the warehouse backend

pub mod batches;
pub mod health;
pub mod items;
pub mod jobs;
pub mod movements;
pub mod stock;

pub use batches::*;
pub use health::*;
pub use items::*;
pub use jobs::*;
pub use movements::*;
pub use stock::*;
