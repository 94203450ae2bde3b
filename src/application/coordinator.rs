use super::controller::ChartController;
use crate::domain::logging::LogComponent;
use crate::log_info;
use std::cell::RefCell;

// Global chart controller (thread-local for WASM)
thread_local! {
    static GLOBAL_CONTROLLER: RefCell<Option<ChartController>> = const { RefCell::new(None) };
}

/// Install the page's chart controller; replaces any previous one.
pub fn install_global_controller(controller: ChartController) {
    log_info!(LogComponent::Application("Coordinator"), "chart controller installed");
    // Release the previous handle outside the borrow; other clones keep it alive.
    let previous = GLOBAL_CONTROLLER.with(|global| global.borrow_mut().replace(controller));
    drop(previous);
}

/// Run `f` against the global controller, if one is installed.
pub fn with_global_controller<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&ChartController) -> R,
{
    let controller = GLOBAL_CONTROLLER.with(|global| global.borrow().clone())?;
    Some(f(&controller))
}
