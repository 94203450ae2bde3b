pub mod js_time_scale;
pub mod wasm_api;

pub use js_time_scale::*;
pub use wasm_api::*;
