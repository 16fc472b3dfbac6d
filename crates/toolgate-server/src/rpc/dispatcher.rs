//! Protocol dispatcher
//!
//! Drives every inbound envelope through the same stages regardless of
//! transport: parse, authenticate, authorize, rate-check, execute,
//! respond. The first failing stage short-circuits into an error
//! envelope; every request envelope yields exactly one response envelope,
//! and batches preserve order.

use crate::rpc::credentials::CredentialResolver;
use crate::rpc::envelope::{
    RpcError, RpcRequest, RpcResponse, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, UNAUTHENTICATED,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use toolgate_core::{has_permission, AuthContext, SettingsService, SlidingWindowLimiter};
use toolgate_domain::{Error, RateLimitSpec, ToolHost};
use tracing::{debug, error};

/// Methods allowed to proceed without a credential
const UNAUTHENTICATED_METHODS: &[&str] = &["initialize", "server/ping"];

/// Transport-supplied request context
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Raw credential extracted by the transport, if any
    pub credential: Option<String>,
    /// Network origin, used as the rate key for anonymous callers
    pub origin: String,
}

/// The protocol dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    resolver: CredentialResolver,
    limiter: Arc<SlidingWindowLimiter>,
    tool_host: Arc<dyn ToolHost>,
    settings: Option<SettingsService>,
    default_limit: RateLimitSpec,
    exec_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(
        resolver: CredentialResolver,
        limiter: Arc<SlidingWindowLimiter>,
        tool_host: Arc<dyn ToolHost>,
        settings: Option<SettingsService>,
        default_limit: RateLimitSpec,
        exec_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            limiter,
            tool_host,
            settings,
            default_limit,
            exec_timeout,
        }
    }

    /// The credential resolver shared with the transports
    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Dispatch a parsed JSON body - a single envelope or a batch
    ///
    /// A batch yields one response envelope per element, order-preserving;
    /// elements execute concurrently.
    pub async fn dispatch_value(&self, body: Value, ctx: &DispatchContext) -> Value {
        match body {
            Value::Array(elements) => {
                let responses = futures::future::join_all(
                    elements
                        .into_iter()
                        .map(|element| self.dispatch_element(element, ctx)),
                )
                .await;
                Value::Array(responses)
            }
            element => self.dispatch_element(element, ctx).await,
        }
    }

    /// Dispatch one envelope-shaped JSON value
    async fn dispatch_element(&self, element: Value, ctx: &DispatchContext) -> Value {
        let id = element.get("id").cloned().unwrap_or(Value::Null);
        let request: RpcRequest = match serde_json::from_value(element) {
            Ok(request) => request,
            Err(_) => {
                return RpcResponse::failure(id, RpcError::new(INVALID_REQUEST, "Invalid Request"))
                    .to_value();
            }
        };
        self.dispatch_request(request, ctx).await.to_value()
    }

    /// Run one request through the dispatch stages
    pub async fn dispatch_request(&self, request: RpcRequest, ctx: &DispatchContext) -> RpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);

        // Parse: the envelope must declare the protocol version
        if request.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return RpcResponse::failure(id, RpcError::new(INVALID_REQUEST, "Invalid Request"));
        }

        // Authenticate
        let auth_ctx = match self.resolver.resolve(ctx.credential.as_deref()).await {
            Ok(auth_ctx) => auth_ctx,
            Err(error) => return RpcResponse::failure(id, RpcError::from(&error)),
        };
        let needs_credential =
            self.resolver.auth_enabled() && !UNAUTHENTICATED_METHODS.contains(&request.method.as_str());
        if needs_credential && auth_ctx.is_none() {
            return RpcResponse::failure(
                id,
                RpcError::new(UNAUTHENTICATED, "Authentication required"),
            );
        }

        // Authorize: capability-invoking methods check the permission scope
        if request.method == "tools/call" {
            let Some(name) = tool_name(request.params.as_ref()) else {
                return RpcResponse::failure(
                    id,
                    RpcError::new(INVALID_PARAMS, "Invalid params: missing tool name"),
                );
            };
            if let Some(auth_ctx) = &auth_ctx {
                if !has_permission(auth_ctx, &name) {
                    debug!(identity = %auth_ctx.identity_id, tool = %name, "Permission denied");
                    return RpcResponse::failure(
                        id,
                        RpcError::from(&Error::permission_denied(format!(
                            "Insufficient permissions for tool: {name}"
                        ))),
                    );
                }
            }
        }

        // Rate-check: keyed by the credential, or the origin when anonymous
        let (rate_key, limit_spec) = match &auth_ctx {
            Some(auth_ctx) => (
                auth_ctx.rate_key.clone(),
                auth_ctx.rate_limit.unwrap_or(self.default_limit),
            ),
            None => (format!("origin:{}", ctx.origin), self.default_limit),
        };
        let decision = self.limiter.check_and_record(&rate_key, limit_spec);
        if !decision.allowed {
            return RpcResponse::failure(
                id,
                RpcError::from(&Error::RateLimited {
                    limit: decision.limit,
                    reset_at: decision.reset_at.timestamp(),
                }),
            );
        }

        // Execute
        let result = match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "server/ping" => Ok(json!({ "pong": true, "timestamp": Utc::now().timestamp_millis() })),
            "tools/list" => self.handle_tools_list(auth_ctx.as_ref()).await,
            "tools/call" => self.handle_tool_call(request.params.as_ref(), auth_ctx.as_ref()).await,
            _ => {
                return RpcResponse::failure(id, RpcError::new(METHOD_NOT_FOUND, "Method not found"));
            }
        };

        // Respond
        match result {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => {
                if matches!(error, Error::Storage { .. } | Error::Internal { .. }) {
                    error!(method = %request.method, %error, "Request failed");
                }
                RpcResponse::failure(id, RpcError::from(&error))
            }
        }
    }

    /// List the capabilities visible to the caller, permission-filtered
    async fn handle_tools_list(&self, auth_ctx: Option<&AuthContext>) -> Result<Value, Error> {
        let identity_id = auth_ctx.map(|a| a.identity_id.as_str());
        let specs = self.tool_host.list_capabilities(identity_id).await?;

        let visible: Vec<Value> = specs
            .into_iter()
            .filter(|spec| auth_ctx.is_none_or(|a| has_permission(a, &spec.name)))
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "inputSchema": spec.input_schema(),
                })
            })
            .collect();

        Ok(json!({ "tools": visible }))
    }

    /// Resolve and invoke a capability with the caller's merged environment
    async fn handle_tool_call(
        &self,
        params: Option<&Value>,
        auth_ctx: Option<&AuthContext>,
    ) -> Result<Value, Error> {
        let name = tool_name(params)
            .ok_or_else(|| Error::invalid_argument("Invalid params: missing tool name"))?;
        let identity_id = auth_ctx.map(|a| a.identity_id.as_str());

        let capability = self
            .tool_host
            .resolve(identity_id, &name)
            .await?
            .ok_or_else(|| Error::capability_not_found(&name))?;

        let env = match (&self.settings, identity_id) {
            (Some(settings), Some(identity_id)) => settings.environment(identity_id).await?,
            _ => HashMap::new(),
        };
        let args = params
            .and_then(|p| p.get("arguments"))
            .cloned()
            .unwrap_or_else(|| json!({}));

        // any execution-time failure becomes an execution error with the
        // collaborator's message preserved
        let output = tokio::time::timeout(self.exec_timeout, capability.invoke(args, &env))
            .await
            .map_err(|_| Error::execution(format!("Tool execution timed out: {name}")))?
            .map_err(|error| match error {
                Error::ExecutionFailure { .. } => error,
                other => Error::execution(other.to_string()),
            })?;

        Ok(json!({
            "content": [
                { "type": "text", "text": output.render_text() }
            ]
        }))
    }
}

/// Extract the tool name from call params
fn tool_name(params: Option<&Value>) -> Option<String> {
    params
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Capability-negotiation result
fn initialize_result() -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {},
            "resources": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": "Toolgate",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}
