//! Pure chart-replay domain: candles, indicator math, derived series and the
//! replay state machine. Nothing here touches the browser.

pub mod chart;
pub mod errors;
pub mod events;
pub mod indicators;
pub mod logging;
pub mod market_data;
pub mod replay;
