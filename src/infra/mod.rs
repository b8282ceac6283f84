pub mod config;
pub mod error;
pub mod memory_blacklist;
pub mod redis_blacklist;
pub mod setup;

pub use error::InfraError;
