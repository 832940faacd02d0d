pub mod config;
pub mod error;
pub mod listener;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod smtp;
pub mod staging;

pub use tracing;
