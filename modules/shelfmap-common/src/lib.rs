pub mod config;
pub mod normalize;
pub mod types;

pub use config::Config;
pub use normalize::normalize_name;
pub use types::*;
