//! Replay aggregate: scrubber state and its transitions.

pub mod state;

pub use state::*;
