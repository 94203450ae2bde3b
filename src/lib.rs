use wasm_bindgen::prelude::*;

use crate::domain::logging::LogComponent;

#[macro_use]
pub mod macros;

pub mod app;
pub mod application;
pub mod domain;
pub mod global_state;
pub mod infrastructure;
pub mod presentation;

pub use presentation::ChartReplayApi;

/// Install browser logging, clock and panic hook.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console_logger = if cfg!(debug_assertions) {
        infrastructure::services::ConsoleLogger::new_development()
    } else {
        infrastructure::services::ConsoleLogger::new_production()
    };
    domain::logging::init_logger(Box::new(console_logger));

    let browser_time_provider = Box::new(infrastructure::services::BrowserTimeProvider::new());
    domain::logging::init_time_provider(browser_time_provider);

    log_info!(LogComponent::Presentation("Initialize"), "chart replay module ready");
}
