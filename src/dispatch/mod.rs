//! Action Execution Dispatcher
//!
//! Decides where a script runs. Each invocation probes the ranked host
//! terminal candidates and launches the first one available. When none can
//! be launched it falls back to an embedded pseudoterminal whose process is
//! monitored until it exits.
//!
//! ```ignore
//! use portal_launcher::{ExecutionDispatcher, DispatchOutcome};
//!
//! let dispatcher = ExecutionDispatcher::builder().build()?;
//! match dispatcher.run("Update", "sudo dnf upgrade").await {
//!     DispatchOutcome::Embedded(mut handle) => println!("{}", handle.wait().await),
//!     other => println!("{:?}", other),
//! }
//! ```

pub mod embedded;
pub mod handle;
pub mod launcher;
pub mod monitor;
pub mod probe;

pub use embedded::{EmbeddedSession, EmbeddedSpawn, EmbeddedTerminal};
pub use handle::ExecutionHandle;
pub use launcher::HostLauncher;
pub use monitor::{ChannelSink, LogSink, ProcessMonitor, ResultSink, WatchInfo, WatchTicket};
pub use probe::TerminalProbe;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigLoader};
use crate::error::{Error, Result};
use crate::models::{Action, ExecutionRequest, ExecutionResult, ExecutionTier};
use crate::platform::{HostBridge, Platform};
use crate::pty::{NativePtyBackend, PtyBackend, ScrollbackFactory, SurfaceFactory};

/// Marks scripts that must never fall back to the embedded terminal
pub type HostOnlyPolicy = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// What a single `run` did
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The script was empty; a "no script" result was reported
    NothingToRun,
    /// A host terminal was launched; nothing further is reported
    HostLaunched { program: String },
    /// The script runs in the embedded terminal
    Embedded(ExecutionHandle),
    /// Nothing could be started; the result was reported
    Failed(ExecutionResult),
}

impl DispatchOutcome {
    pub fn tier(&self) -> Option<ExecutionTier> {
        match self {
            DispatchOutcome::HostLaunched { .. } => Some(ExecutionTier::Host),
            DispatchOutcome::Embedded(_) => Some(ExecutionTier::Embedded),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DispatchOutcome::Failed(_))
    }

    /// The embedded execution handle, if any
    pub fn into_handle(self) -> Option<ExecutionHandle> {
        match self {
            DispatchOutcome::Embedded(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Orchestrates probing, host launch, embedded fallback and monitoring
pub struct ExecutionDispatcher {
    config: Config,
    bridge: Arc<dyn HostBridge>,
    probe: TerminalProbe,
    launcher: HostLauncher,
    embedded: EmbeddedTerminal,
    monitor: ProcessMonitor,
    sink: Arc<dyn ResultSink>,
    surfaces: Arc<dyn SurfaceFactory>,
    host_only: Option<HostOnlyPolicy>,
    working_directory: PathBuf,
}

impl ExecutionDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Build with the host bridge chosen by sandbox detection
    pub fn from_environment(
        config: Config,
        sink: Arc<dyn ResultSink>,
        surfaces: Arc<dyn SurfaceFactory>,
    ) -> Result<Self> {
        Self::builder()
            .config(config)
            .sink(sink)
            .surfaces(surfaces)
            .build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn monitor(&self) -> &ProcessMonitor {
        &self.monitor
    }

    pub fn bridge_name(&self) -> &str {
        self.bridge.name()
    }

    /// Run an action from the registry
    pub async fn run_action(&self, action: &Action) -> DispatchOutcome {
        let request = action.request();
        self.dispatch(request).await
    }

    /// Run `script` under `title`
    ///
    /// Returns as soon as the script is launched; embedded executions report
    /// their result later through the handle and the sink.
    pub async fn run(&self, title: &str, script: &str) -> DispatchOutcome {
        self.dispatch(ExecutionRequest::new(title, script)).await
    }

    async fn dispatch(&self, request: ExecutionRequest) -> DispatchOutcome {
        if request.is_empty() {
            info!("'{}': {}", request.title, Error::EmptyScript);
            self.sink
                .report(ExecutionResult::nothing_to_run(request.title.clone()));
            return DispatchOutcome::NothingToRun;
        }

        let host_only = self
            .host_only
            .as_ref()
            .is_some_and(|policy| policy(&request.script));

        if !self.config.embedded.force || host_only {
            match self
                .launcher
                .launch_first_available(&self.probe, &self.config.terminals, &request.script)
                .await
            {
                Ok(candidate) => {
                    info!("'{}' launched in {}", request.title, candidate.program);
                    return DispatchOutcome::HostLaunched {
                        program: candidate.program.clone(),
                    };
                }
                Err(e) if e.is_recoverable() && !host_only => {
                    info!("{}; using embedded terminal for '{}'", e, request.title);
                }
                Err(e) => {
                    let result = ExecutionResult::launch_failed(request.title, e.to_string());
                    error!("{}", result);
                    self.sink.report(result.clone());
                    return DispatchOutcome::Failed(result);
                }
            }
        } else {
            debug!("Embedded terminal forced for '{}'", request.title);
        }

        self.spawn_embedded(request).await
    }

    async fn spawn_embedded(&self, request: ExecutionRequest) -> DispatchOutcome {
        let ticket = self
            .monitor
            .begin(&request.title, ExecutionTier::Embedded)
            .await;
        let surface = self.surfaces.open(&request.title);

        match self
            .embedded
            .spawn(&request.script, &self.working_directory, surface)
        {
            Ok(spawn) => {
                let id = ticket.id();
                let handle = self
                    .monitor
                    .running(ticket, spawn.pid, Some(spawn.session))
                    .await;
                self.monitor.watch(id, spawn.waiter);
                DispatchOutcome::Embedded(handle)
            }
            Err(e) => {
                let result = self.monitor.launch_failed(ticket, &e.to_string()).await;
                DispatchOutcome::Failed(result)
            }
        }
    }
}

/// Builder for [`ExecutionDispatcher`]
///
/// Anything not supplied falls back to the environment: sandbox detection for
/// the bridge, the native PTY, a logging sink and in-memory scrollback.
#[derive(Default)]
pub struct DispatcherBuilder {
    config: Option<Config>,
    bridge: Option<Arc<dyn HostBridge>>,
    pty_backend: Option<Arc<dyn PtyBackend>>,
    sink: Option<Arc<dyn ResultSink>>,
    surfaces: Option<Arc<dyn SurfaceFactory>>,
    host_only: Option<HostOnlyPolicy>,
}

impl DispatcherBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn bridge(mut self, bridge: Arc<dyn HostBridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn pty_backend(mut self, backend: Arc<dyn PtyBackend>) -> Self {
        self.pty_backend = Some(backend);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn surfaces(mut self, surfaces: Arc<dyn SurfaceFactory>) -> Self {
        self.surfaces = Some(surfaces);
        self
    }

    pub fn host_only<F>(mut self, policy: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.host_only = Some(Arc::new(policy));
        self
    }

    pub fn build(self) -> Result<ExecutionDispatcher> {
        let config = self.config.unwrap_or_default();
        ConfigLoader::validate(&config)?;

        let bridge = self
            .bridge
            .unwrap_or_else(|| Platform::host_bridge(&config.bridge));
        let backend = self
            .pty_backend
            .unwrap_or_else(|| Arc::new(NativePtyBackend) as Arc<dyn PtyBackend>);
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(LogSink) as Arc<dyn ResultSink>);
        let surfaces = self
            .surfaces
            .unwrap_or_else(|| {
                Arc::new(ScrollbackFactory::from_config(&config.embedded)) as Arc<dyn SurfaceFactory>
            });
        let working_directory = config.embedded.working_directory();

        info!(
            "Dispatcher ready (bridge: {}, terminals: {}, force embedded: {})",
            bridge.name(),
            config.terminals.len(),
            config.embedded.force
        );

        Ok(ExecutionDispatcher {
            probe: TerminalProbe::new(Arc::clone(&bridge), &config.probe),
            launcher: HostLauncher::new(
                Arc::clone(&bridge),
                config.shell.clone(),
                working_directory.clone(),
            ),
            embedded: EmbeddedTerminal::new(
                backend,
                Arc::clone(&bridge),
                config.shell.clone(),
                config.embedded.clone(),
            ),
            monitor: ProcessMonitor::new(Arc::clone(&sink)),
            bridge,
            sink,
            surfaces,
            host_only: self.host_only,
            working_directory,
            config,
        })
    }
}
