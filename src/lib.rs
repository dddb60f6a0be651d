
pub mod config;
pub mod error;
pub mod publisher;
pub mod scheduler;
pub mod source;
pub mod stats;
pub mod store;
