//! Exit-time lifecycle cleanup.
//!
//! The entry point injects this capability explicitly; nothing registers
//! handlers as a side effect of opening a store. An uncatchable kill skips
//! both paths here, which is exactly the case the lifecycle sweep repairs.

use std::thread;

use ctxhist_core::Config;
use ctxhist_core::LifecycleTracker;
use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Signals;
use tracing::warn;

/// Removes this shell identity's lifecycle marker on drop and on
/// SIGINT/SIGTERM.
pub struct CleanupGuard {
    config: Config,
    identifier: String,
}

impl CleanupGuard {
    pub fn register(config: &Config, identifier: &str) -> Self {
        match Signals::new([SIGINT, SIGTERM]) {
            Ok(mut signals) => {
                let config = config.clone();
                let identifier = identifier.to_string();
                let spawned = thread::Builder::new()
                    .name("signal-cleanup".to_string())
                    .spawn(move || {
                        if let Some(sig) = signals.forever().next() {
                            LifecycleTracker::new(config).mark_inactive(&identifier);
                            std::process::exit(128 + sig);
                        }
                    });
                if let Err(e) = spawned {
                    warn!(error = %e, "Failed to spawn signal cleanup thread");
                }
            }
            Err(e) => warn!(error = %e, "Failed to register signal handlers"),
        }

        Self {
            config: config.clone(),
            identifier: identifier.to_string(),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        LifecycleTracker::new(self.config.clone()).mark_inactive(&self.identifier);
    }
}
