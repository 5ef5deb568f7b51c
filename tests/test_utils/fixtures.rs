//! Test fixtures

use portal_launcher::config::Config;
use portal_launcher::models::ExecutionResult;
use portal_launcher::{ExecutionDispatcher, ResultSink, ScrollbackFactory};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{MockBridge, MockPtyBackend};

/// Sink keeping every reported result
#[derive(Default)]
pub struct RecordingSink {
    results: Mutex<Vec<ExecutionResult>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn results(&self) -> Vec<ExecutionResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    /// Wait until at least `n` results arrived or `timeout` passes
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> Vec<ExecutionResult> {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.count() < n && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.results()
    }
}

impl ResultSink for RecordingSink {
    fn report(&self, result: ExecutionResult) {
        self.results.lock().unwrap().push(result);
    }
}

/// Default config with a short probe timeout and a fixed working directory
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.probe.timeout_ms = 100;
    config.embedded.working_directory = Some(std::env::temp_dir());
    config
}

/// Dispatcher wired to mocks
pub fn dispatcher_with(
    config: Config,
    bridge: Arc<MockBridge>,
    backend: Arc<MockPtyBackend>,
    sink: Arc<RecordingSink>,
) -> (ExecutionDispatcher, Arc<ScrollbackFactory>) {
    let surfaces = Arc::new(ScrollbackFactory::from_config(&config.embedded));
    let dispatcher = ExecutionDispatcher::builder()
        .config(config)
        .bridge(bridge)
        .pty_backend(backend)
        .sink(sink)
        .surfaces(surfaces.clone())
        .build()
        .unwrap();
    (dispatcher, surfaces)
}
