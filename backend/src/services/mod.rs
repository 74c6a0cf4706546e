//! Business logic services for the warehouse movement and batch ledger

pub mod batch;
pub mod item;
pub mod job;
pub mod job_cost;
pub mod movement;
pub mod pricing;
pub mod stock;

pub use batch::BatchLedgerService;
pub use item::ItemService;
pub use job::JobService;
pub use job_cost::JobCostService;
pub use movement::MovementService;
pub use pricing::PricingService;
pub use stock::StockService;
