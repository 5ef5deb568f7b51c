//! Mock PTY backend for embedded terminal tests

use portal_launcher::error::{Error, Result};
use portal_launcher::pty::{ProcessWaiter, PtyBackend, PtyStreams, SpawnConfig, SpawnedPty};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Exits with a fixed code after an optional delay
struct MockWaiter {
    exit_code: i32,
    delay: Duration,
}

impl ProcessWaiter for MockWaiter {
    fn wait(self: Box<Self>) -> Result<i32> {
        thread::sleep(self.delay);
        Ok(self.exit_code)
    }
}

/// PTY backend that never touches the OS
///
/// Each spawn writes the configured output and closes the stream, then
/// exits with the configured code.
#[derive(Default)]
pub struct MockPtyBackend {
    exit_code: i32,
    delay: Duration,
    output: Vec<u8>,
    failure: Option<String>,
    spawns: Mutex<Vec<Vec<String>>>,
    configs: Mutex<Vec<SpawnConfig>>,
    inputs: Mutex<Vec<Receiver<Vec<u8>>>>,
}

impl MockPtyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exiting_with(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::default()
        }
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.as_bytes().to_vec();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every spawn fails with `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Argv of every spawn, in order
    pub fn spawns(&self) -> Vec<Vec<String>> {
        self.spawns.lock().unwrap().clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.lock().unwrap().len()
    }

    pub fn last_config(&self) -> Option<SpawnConfig> {
        self.configs.lock().unwrap().last().cloned()
    }

    /// Input written to the `index`-th spawned process so far
    pub fn input_of(&self, index: usize) -> Vec<u8> {
        let inputs = self.inputs.lock().unwrap();
        inputs
            .get(index)
            .map(|rx| rx.try_iter().flatten().collect())
            .unwrap_or_default()
    }
}

impl PtyBackend for MockPtyBackend {
    fn spawn(&self, argv: &[String], config: &SpawnConfig) -> Result<SpawnedPty> {
        self.spawns.lock().unwrap().push(argv.to_vec());
        self.configs.lock().unwrap().push(config.clone());

        if let Some(reason) = &self.failure {
            return Err(Error::CommandSpawnFailed {
                command: argv[0].clone(),
                reason: reason.clone(),
            });
        }

        let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();
        let (input_tx, input_rx) = std::sync::mpsc::channel();
        if !self.output.is_empty() {
            let _ = output_tx.send(self.output.clone());
        }
        drop(output_tx);
        self.inputs.lock().unwrap().push(input_rx);

        Ok(SpawnedPty {
            pid: Some(1000 + self.spawn_count() as u32),
            waiter: Box::new(MockWaiter {
                exit_code: self.exit_code,
                delay: self.delay,
            }),
            streams: PtyStreams::from_channels(output_rx, input_tx),
            master: None,
        })
    }
}
