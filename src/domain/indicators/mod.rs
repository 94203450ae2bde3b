//! Indicator aggregate: kinds, parameters and the math over candles.

pub mod config;
pub mod services;
pub mod value_objects;

pub use config::*;
pub use value_objects::*;
