//! Shared test utilities

use std::sync::Arc;

use slotline::{AssistantFactory, BroadcastNotifier, Config};
use tempfile::TempDir;

/// Config, notifier, and factory rooted in a temporary data directory
pub struct TestEnv {
    /// Keeps the data directory alive for the test
    pub dir: TempDir,
    pub config: Arc<Config>,
    pub events: Arc<BroadcastNotifier>,
    pub factory: AssistantFactory,
}

/// Set up a fresh data directory with default settings
#[must_use]
pub fn setup_test_env() -> TestEnv {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = Arc::new(Config::with_data_dir(dir.path()));
    let events = Arc::new(BroadcastNotifier::new());
    let factory = AssistantFactory::new(config.clone(), events.clone());
    TestEnv {
        dir,
        config,
        events,
        factory,
    }
}
