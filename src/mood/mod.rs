pub mod extract;
pub mod presets;

pub use extract::*;
pub use presets::*;
