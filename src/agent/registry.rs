//! Tool registry for the answer-generation loop.

use crate::error::{CorsoError, Result};
use crate::llm::ToolSchema;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A source citation produced by a tool invocation.
///
/// Sources are returned as part of each execution's output and threaded
/// through the exchange, so concurrent exchanges never share citation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    /// Display text, e.g. "Python Basics - Lesson 2".
    pub text: String,
    /// Link to the cited lesson or course, when known.
    pub link: Option<String>,
}

/// Result of one tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Text handed back to the model as the tool result.
    pub content: String,
    /// Citations gathered while producing the result.
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// A result with content only, no sources.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// A capability the model can ask to have invoked mid-exchange.
#[async_trait]
pub trait CourseTool: Send + Sync {
    /// The schema declared to the model.
    fn schema(&self) -> ToolSchema;

    /// Execute with the model-supplied JSON arguments.
    async fn execute(&self, input: &serde_json::Value) -> Result<ToolOutput>;
}

/// Maps tool names to capabilities. Read-mostly and safe to share across
/// concurrent exchanges; registration happens once at startup.
#[derive(Default)]
pub struct ToolRegistry {
    // Vec keeps registration order, which is the order schemas are listed in.
    tools: Vec<Arc<dyn CourseTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if a tool with the same name is already present.
    pub fn register(&mut self, tool: Arc<dyn CourseTool>) -> Result<()> {
        let name = tool.schema().name;
        if self.tools.iter().any(|t| t.schema().name == name) {
            return Err(CorsoError::DuplicateTool(name));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn CourseTool>> {
        self.tools
            .iter()
            .find(|t| t.schema().name == name)
            .cloned()
            .ok_or_else(|| CorsoError::UnknownTool(name.to_string()))
    }

    /// Declared schemas, in registration order.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl CourseTool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name.to_string(),
                description: "Echo the input".to_string(),
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&self, input: &serde_json::Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text(input.to_string()))
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool { name: "echo" })).unwrap();
        let err = registry
            .register(Arc::new(EchoTool { name: "echo" }))
            .unwrap_err();
        assert!(matches!(err, CorsoError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn test_unknown_lookup_fails() {
        let registry = ToolRegistry::new();
        let err = registry.lookup("missing").err().unwrap();
        assert!(matches!(err, CorsoError::UnknownTool(name) if name == "missing"));
    }

    #[test]
    fn test_schemas_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool { name: "beta" })).unwrap();
        registry.register(Arc::new(EchoTool { name: "alpha" })).unwrap();

        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
    }
}
