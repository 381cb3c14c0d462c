//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from the environment (`RUST_LOG`).
pub fn init() {
    let _ = env_logger::builder().try_init();
}
