pub mod chart_store;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod scheduler;
pub mod time_sync;
pub mod use_cases;

pub use chart_store::*;
pub use config::*;
pub use controller::*;
pub use coordinator::*;
pub use scheduler::*;
pub use time_sync::*;
pub use use_cases::*;
