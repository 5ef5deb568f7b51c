//! Host terminal probing
//!
//! Resolves which interactive terminal programs exist on the host by running
//! a lookup command (`which` by default) through the host bridge. Nothing is
//! launched and no window is shown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ProbeConfig;
use crate::models::TerminalCandidate;
use crate::platform::HostBridge;

/// Finds the first available terminal candidate on the host
pub struct TerminalProbe {
    bridge: Arc<dyn HostBridge>,
    lookup_command: String,
    timeout: Duration,
    /// Per-program availability, present when caching is enabled
    cache: Option<Mutex<HashMap<String, bool>>>,
}

impl TerminalProbe {
    pub fn new(bridge: Arc<dyn HostBridge>, config: &ProbeConfig) -> Self {
        Self {
            bridge,
            lookup_command: config.lookup_command.clone(),
            timeout: config.timeout(),
            cache: config.cache_results.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether `candidate` resolves on the host
    ///
    /// Errors, timeouts and non-zero exits all count as "not found".
    pub async fn is_available(&self, candidate: &TerminalCandidate) -> bool {
        if let Some(known) = self.cached(&candidate.program) {
            debug!("Probe cache hit for {}: {}", candidate.program, known);
            return known;
        }

        let argv = vec![self.lookup_command.clone(), candidate.program.clone()];
        let available = match self.bridge.run_on_host(&argv, self.timeout).await {
            Ok(0) => true,
            Ok(code) => {
                debug!("{} not found on host (lookup exited {})", candidate.program, code);
                false
            }
            Err(e) => {
                debug!("Probe for {} failed: {}", candidate.program, e);
                false
            }
        };

        self.remember(&candidate.program, available);
        available
    }

    /// First candidate, in priority order, that resolves on the host
    pub async fn probe<'a>(
        &self,
        candidates: &'a [TerminalCandidate],
    ) -> Option<&'a TerminalCandidate> {
        for candidate in candidates {
            if self.is_available(candidate).await {
                debug!("Probe resolved {}", candidate.program);
                return Some(candidate);
            }
        }
        None
    }

    fn cached(&self, program: &str) -> Option<bool> {
        let cache = self.cache.as_ref()?;
        let cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(program).copied()
    }

    fn remember(&self, program: &str, available: bool) {
        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(program.to_string(), available);
        }
    }
}
