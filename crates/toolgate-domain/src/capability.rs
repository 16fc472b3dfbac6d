//! Capability contracts
//!
//! A capability is a named, invocable unit of functionality owned by an
//! identity. How capability code is packaged, loaded, or sandboxed is the
//! tool-loading collaborator's concern; the gateway sees only this narrow
//! list/resolve/invoke contract.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Describes an invocable capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySpec {
    /// Capability name (unique within its namespace)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON-schema properties object for the arguments
    pub parameters: Value,
    /// Names of required arguments
    pub required: Vec<String>,
}

impl CapabilitySpec {
    /// Render the MCP-style input schema for tool listings
    pub fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": self.parameters,
            "required": self.required,
        })
    }
}

/// Result of a capability invocation
#[derive(Debug, Clone)]
pub enum CapabilityOutput {
    /// Plain text result
    Text(String),
    /// Structured JSON result
    Structured(Value),
}

impl CapabilityOutput {
    /// Render the output as text for the uniform content envelope
    ///
    /// Structured values are pretty-printed.
    pub fn render_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// An invocable capability
#[async_trait]
pub trait Capability: Send + Sync {
    /// Describe this capability
    fn spec(&self) -> CapabilitySpec;

    /// Invoke with the supplied arguments and the caller's merged environment
    async fn invoke(
        &self,
        args: Value,
        env: &HashMap<String, String>,
    ) -> Result<CapabilityOutput>;
}

/// Tool-loading collaborator port
///
/// `identity_id` scopes resolution to the caller's own capability
/// namespace; `None` is an anonymous caller and sees only whatever the
/// host chooses to expose publicly.
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// List the capabilities visible to an identity
    async fn list_capabilities(&self, identity_id: Option<&str>) -> Result<Vec<CapabilitySpec>>;

    /// Resolve a capability by name within an identity's namespace
    async fn resolve(
        &self,
        identity_id: Option<&str>,
        name: &str,
    ) -> Result<Option<Arc<dyn Capability>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema_shape() {
        let spec = CapabilitySpec {
            name: "weather".into(),
            description: "Current weather".into(),
            parameters: json!({"city": {"type": "string"}}),
            required: vec!["city".into()],
        };
        let schema = spec.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["required"][0], "city");
    }

    #[test]
    fn test_render_text_passthrough() {
        let out = CapabilityOutput::Text("hello".into());
        assert_eq!(out.render_text(), "hello");
    }

    #[test]
    fn test_render_structured_pretty_prints() {
        let out = CapabilityOutput::Structured(json!({"a": 1}));
        let text = out.render_text();
        assert!(text.contains("\"a\": 1"));
    }
}
