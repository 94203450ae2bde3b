//! Chart aggregate: display modes, derived series and the builder producing them.

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;
