pub mod audio;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod narrate;
pub mod platform;
pub mod service;
pub mod stt;
pub mod tasks;
mod telemetry;
pub mod transcript;
pub mod wake;

pub use service::{ServiceLoop, ServiceState};
pub use telemetry::init_tracing;
