//! Tool Dispatcher - the error-containment boundary for tool calls.
//!
//! Whatever happens below this point (unknown names, bad arguments, adapter
//! failures, panics) comes back as a [`ToolCallResponse`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::{ToolCallRequest, ToolCallResponse, ToolDefinition, ToolError, ToolRegistry};
use crate::core::session::SessionContext;

/// Object-safe view of a dispatcher, independent of its adapter type.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Advertised tools in registration order.
    fn list_tools(&self) -> Vec<ToolDefinition>;

    /// Route one call; never fails.
    async fn call_tool(&self, request: ToolCallRequest, session: &SessionContext) -> ToolCallResponse;
}

/// Routes calls through a registry to a bound adapter.
pub struct ToolDispatcher<A> {
    registry: Arc<ToolRegistry<A>>,
    adapter: Arc<A>,
}

impl<A: Send + Sync + 'static> ToolDispatcher<A> {
    pub fn new(registry: ToolRegistry<A>, adapter: Arc<A>) -> Self {
        Self {
            registry: Arc::new(registry),
            adapter,
        }
    }

    pub fn registry(&self) -> &ToolRegistry<A> {
        &self.registry
    }

    #[instrument(skip_all, fields(tool = %request.name, session = %session.id()))]
    pub async fn dispatch(&self, request: ToolCallRequest, session: &SessionContext) -> ToolCallResponse {
        match self.route(request).await {
            Ok(value) => {
                info!("Tool call succeeded");
                ToolCallResponse::success(&value)
            }
            Err(err) => {
                warn!("Tool call failed: {}", err);
                ToolCallResponse::from(&err)
            }
        }
    }

    async fn route(&self, request: ToolCallRequest) -> Result<Value, ToolError> {
        let entry = self
            .registry
            .get(&request.name)
            .ok_or_else(|| ToolError::unknown_tool(&request.name))?;

        entry.definition().validate(&request.arguments)?;

        let call = entry.invoke(self.adapter.clone(), request.arguments);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(tool = %request.name, "Tool handler panicked: {}", detail);
                Err(ToolError::Panicked(request.name))
            }
        }
    }
}

#[async_trait]
impl<A: Send + Sync + 'static> ToolService for ToolDispatcher<A> {
    fn list_tools(&self) -> Vec<ToolDefinition> {
        self.registry.list()
    }

    async fn call_tool(&self, request: ToolCallRequest, session: &SessionContext) -> ToolCallResponse {
        self.dispatch(request, session).await
    }
}
