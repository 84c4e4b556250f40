//! Tool execution with failure isolation.
//!
//! A failing tool must degrade the exchange gracefully instead of aborting
//! it: the model can narrate the problem if it is told about it through the
//! normal tool-result channel. The executor therefore never propagates
//! capability failures; every execution produces a result string.

use super::registry::{ToolOutput, ToolRegistry};
use crate::error::{CorsoError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default per-invocation timeout (30 seconds).
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Executes registered tools on behalf of the loop.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }

    /// Set a custom per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute a tool by name. Never fails: lookup errors, capability
    /// errors, and timeouts all become a descriptive result string.
    pub async fn execute(&self, name: &str, input: &serde_json::Value) -> ToolOutput {
        info!(tool = name, args = %input, "Executing tool");

        match self.try_execute(name, input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                ToolOutput::text(format!("Tool execution failed: {}", e))
            }
        }
    }

    async fn try_execute(&self, name: &str, input: &serde_json::Value) -> Result<ToolOutput> {
        let tool = self.registry.lookup(name)?;
        tokio::time::timeout(self.timeout, tool.execute(input))
            .await
            .map_err(|_| {
                CorsoError::Tool(format!(
                    "'{}' timed out after {} seconds",
                    name,
                    self.timeout.as_secs()
                ))
            })?
    }
}
