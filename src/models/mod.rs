pub mod eclipse;
pub mod lunar;
pub mod weather;

pub use eclipse::*;
pub use lunar::*;
pub use weather::*;
