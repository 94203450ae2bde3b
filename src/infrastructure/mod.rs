//! Browser-facing adapters: console logging, timers, REST candle source.

pub mod http;
pub mod services;
pub mod timers;

pub use http::*;
pub use services::*;
pub use timers::*;
