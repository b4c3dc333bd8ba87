//! Global tracing initialization.
//!
//! Lives in its own test binary because it installs the process-wide dispatcher.

use sweeper::config::Settings;
use sweeper::logging::{self, TracingConfig};
use tracing::Level;

#[test]
fn test_init_is_idempotent() {
    let settings = Settings::default();
    assert!(logging::init_from_settings(&settings).is_ok());
    assert!(logging::init(TracingConfig::new(Level::WARN)).is_ok());
}
