//! Domain models for the warehouse movement and batch ledger

pub mod batch;
pub mod item;
pub mod job;
pub mod movement;

pub use batch::*;
pub use item::*;
pub use job::*;
pub use movement::*;
