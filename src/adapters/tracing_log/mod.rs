// Tracing log adapter - Structured logging using tracing crate

use tracing::{debug, error, info, warn};

use crate::ports::LogPort;

/// Log port backed by `tracing`
#[derive(Debug, Clone)]
pub struct TracingLogAdapter {
    component: &'static str,
}

impl Default for TracingLogAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogAdapter {
    /// Create new tracing log adapter
    pub fn new() -> Self {
        Self::for_component("extraction")
    }

    /// Tag every record with a component name
    pub fn for_component(component: &'static str) -> Self {
        Self { component }
    }
}

impl LogPort for TracingLogAdapter {
    fn debug(&self, message: &str) {
        debug!(component = self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        info!(component = self.component, "{}", message);
    }

    fn warning(&self, message: &str) {
        warn!(component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        error!(component = self.component, "{}", message);
    }
}

/// Log port for silent operation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

impl LogPort for NoopLog {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
