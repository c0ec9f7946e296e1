pub mod config;
pub mod fallback;
pub mod generator;
pub mod metadata;
pub mod playlist;
pub mod scoring;
pub mod sources;
pub mod sourcing;


pub use config::*;
pub use fallback::*;
pub use generator::*;
pub use metadata::*;
pub use playlist::*;
pub use scoring::*;
pub use sources::*;
pub use sourcing::*;
