//! Built-in capabilities
//!
//! The demo capability set the static host ships with: a timestamp
//! reporter, an id generator, a text transformer, and a calculator whose
//! evaluation runs on the CPU-offload pool.

use crate::crypto::generate_hex_secret;
use crate::exec::OffloadPool;
use crate::tools::expr::eval_expression;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use toolgate_domain::{Capability, CapabilityOutput, CapabilitySpec, Error, Result};
use uuid::Uuid;

/// Returns the current server timestamp
pub struct TimestampTool;

#[async_trait]
impl Capability for TimestampTool {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec {
            name: "timestamp".into(),
            description: "Returns the current server timestamp.".into(),
            parameters: json!({}),
            required: vec![],
        }
    }

    async fn invoke(&self, _args: Value, _env: &HashMap<String, String>) -> Result<CapabilityOutput> {
        Ok(CapabilityOutput::Text(format!(
            "Server time: {}",
            Utc::now().to_rfc3339()
        )))
    }
}

/// Generates unique identifiers of various shapes
pub struct UuidTool;

#[async_trait]
impl Capability for UuidTool {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec {
            name: "uuid".into(),
            description: "Generates unique identifiers.".into(),
            parameters: json!({
                "type": {
                    "type": "string",
                    "description": "Identifier kind",
                    "enum": ["uuid4", "short", "hex"],
                    "default": "uuid4"
                },
                "count": {
                    "type": "integer",
                    "description": "How many to generate",
                    "minimum": 1,
                    "maximum": 100,
                    "default": 1
                },
                "prefix": {
                    "type": "string",
                    "description": "Optional prefix"
                }
            }),
            required: vec![],
        }
    }

    async fn invoke(&self, args: Value, _env: &HashMap<String, String>) -> Result<CapabilityOutput> {
        let kind = args["type"].as_str().unwrap_or("uuid4");
        let count = args["count"].as_u64().unwrap_or(1);
        let prefix = args["prefix"].as_str().unwrap_or("");

        if !(1..=100).contains(&count) {
            return Err(Error::invalid_argument("Count must be between 1 and 100"));
        }

        let ids: Vec<String> = (0..count)
            .map(|_| {
                let id = match kind {
                    "uuid4" => Uuid::new_v4().to_string(),
                    "short" => generate_hex_secret(4),
                    "hex" => generate_hex_secret(8),
                    other => return Err(Error::invalid_argument(format!("Unsupported id type: {other}"))),
                };
                Ok(format!("{prefix}{id}"))
            })
            .collect::<Result<_>>()?;

        Ok(CapabilityOutput::Structured(json!({
            "type": kind,
            "count": count,
            "ids": ids,
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }
}

/// Transforms text: passthrough, case folding, reversal
pub struct EchoTool;

#[async_trait]
impl Capability for EchoTool {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec {
            name: "echo".into(),
            description: "Echoes text with an optional transform.".into(),
            parameters: json!({
                "text": {
                    "type": "string",
                    "description": "The text to transform"
                },
                "mode": {
                    "type": "string",
                    "enum": ["plain", "upper", "lower", "reverse"],
                    "default": "plain"
                }
            }),
            required: vec!["text".into()],
        }
    }

    async fn invoke(&self, args: Value, _env: &HashMap<String, String>) -> Result<CapabilityOutput> {
        let text = args["text"]
            .as_str()
            .ok_or_else(|| Error::invalid_argument("Missing or invalid text parameter"))?;

        let transformed = match args["mode"].as_str().unwrap_or("plain") {
            "plain" => text.to_string(),
            "upper" => text.to_uppercase(),
            "lower" => text.to_lowercase(),
            "reverse" => text.chars().rev().collect(),
            other => return Err(Error::invalid_argument(format!("Unsupported mode: {other}"))),
        };

        Ok(CapabilityOutput::Text(transformed))
    }
}

/// Evaluates arithmetic expressions on the offload pool
pub struct CalculatorTool {
    offload: OffloadPool,
}

impl CalculatorTool {
    /// Create a calculator backed by the given offload pool
    pub fn new(offload: OffloadPool) -> Self {
        Self { offload }
    }
}

#[async_trait]
impl Capability for CalculatorTool {
    fn spec(&self) -> CapabilitySpec {
        CapabilitySpec {
            name: "calculator".into(),
            description: "Evaluates arithmetic expressions.".into(),
            parameters: json!({
                "expression": {
                    "type": "string",
                    "description": "Expression to evaluate, e.g. 2 + 2, sqrt(16) + pow(2, 3)"
                }
            }),
            required: vec!["expression".into()],
        }
    }

    async fn invoke(&self, args: Value, _env: &HashMap<String, String>) -> Result<CapabilityOutput> {
        let expression = args["expression"]
            .as_str()
            .ok_or_else(|| Error::invalid_argument("Missing or invalid expression parameter"))?
            .to_string();

        let input = expression.clone();
        let result = self.offload.run(move || eval_expression(&input)).await?;

        Ok(CapabilityOutput::Structured(json!({
            "expression": expression,
            "result": result,
            "formatted": format!("{expression} = {result}"),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_timestamp_tool() {
        let out = TimestampTool
            .invoke(json!({}), &no_env())
            .await
            .expect("invoke");
        assert!(out.render_text().starts_with("Server time: "));
    }

    #[tokio::test]
    async fn test_uuid_tool_count_and_prefix() {
        let out = UuidTool
            .invoke(json!({"type": "hex", "count": 3, "prefix": "task_"}), &no_env())
            .await
            .expect("invoke");
        let CapabilityOutput::Structured(value) = out else {
            panic!("expected structured output");
        };
        let ids = value["ids"].as_array().expect("ids");
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| id.as_str().unwrap().starts_with("task_")));
    }

    #[tokio::test]
    async fn test_uuid_tool_rejects_bad_count() {
        assert!(UuidTool
            .invoke(json!({"count": 101}), &no_env())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_echo_modes() {
        let out = EchoTool
            .invoke(json!({"text": "AbC", "mode": "reverse"}), &no_env())
            .await
            .expect("invoke");
        assert_eq!(out.render_text(), "CbA");
    }

    #[tokio::test]
    async fn test_echo_requires_text() {
        assert!(EchoTool.invoke(json!({}), &no_env()).await.is_err());
    }

    #[tokio::test]
    async fn test_calculator_evaluates_on_pool() {
        let tool = CalculatorTool::new(OffloadPool::new(2));
        let out = tool
            .invoke(json!({"expression": "sqrt(16) + pow(2, 3)"}), &no_env())
            .await
            .expect("invoke");
        let CapabilityOutput::Structured(value) = out else {
            panic!("expected structured output");
        };
        assert_eq!(value["result"], 12.0);
    }

    #[tokio::test]
    async fn test_calculator_surfaces_bad_expression() {
        let tool = CalculatorTool::new(OffloadPool::new(2));
        assert!(tool
            .invoke(json!({"expression": "2 +"}), &no_env())
            .await
            .is_err());
    }
}
