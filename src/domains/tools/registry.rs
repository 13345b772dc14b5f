//! Tool Registry - one table for listing and routing.
//!
//! Each tool is registered together with its handler, so a listed tool always
//! has a route and a route always has a listed definition.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{AdapterError, ToolDefinition, ToolError};

/// Type-erased handler bound to an adapter of type `A`.
pub type ToolHandler<A> =
    Arc<dyn Fn(Arc<A>, JsonObject) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// A registered tool: its definition plus its handler.
pub struct ToolEntry<A> {
    definition: ToolDefinition,
    handler: ToolHandler<A>,
}

impl<A> ToolEntry<A> {
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Start the handler; the returned future owns everything it needs.
    pub fn invoke(&self, adapter: Arc<A>, arguments: JsonObject) -> BoxFuture<'static, Result<Value, ToolError>> {
        (self.handler)(adapter, arguments)
    }
}

/// Ordered set of tools for one logical server.
pub struct ToolRegistry<A> {
    entries: Vec<ToolEntry<A>>,
    index: HashMap<&'static str, usize>,
}

impl<A: Send + Sync + 'static> ToolRegistry<A> {
    pub fn builder() -> ToolRegistryBuilder<A> {
        ToolRegistryBuilder {
            entries: Vec::new(),
        }
    }

    /// All definitions in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    /// Routing lookup.
    pub fn get(&self, name: &str) -> Option<&ToolEntry<A>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder collecting tools before the routing index is frozen.
pub struct ToolRegistryBuilder<A> {
    entries: Vec<ToolEntry<A>>,
}

impl<A: Send + Sync + 'static> ToolRegistryBuilder<A> {
    /// Register a tool whose arguments decode into `P`.
    pub fn tool<P, R, F, Fut>(
        mut self,
        name: &'static str,
        description: &'static str,
        handler: F,
    ) -> Self
    where
        P: DeserializeOwned + JsonSchema + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<A>, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, AdapterError>> + Send + 'static,
    {
        let handler: ToolHandler<A> = Arc::new(move |adapter, arguments| {
            let params = match serde_json::from_value::<P>(Value::Object(arguments)) {
                Ok(params) => params,
                Err(e) => {
                    return futures::future::ready(Err(ToolError::invalid_arguments(
                        name,
                        e.to_string(),
                    )))
                    .boxed();
                }
            };
            let call = handler(adapter, params);
            async move {
                let output = call
                    .await
                    .map_err(|e| ToolError::execution_failed(name, e))?;
                serde_json::to_value(output).map_err(|e| {
                    ToolError::execution_failed(
                        name,
                        AdapterError::external(format!("result is not serializable: {e}")),
                    )
                })
            }
            .boxed()
        });

        self.entries.push(ToolEntry {
            definition: ToolDefinition::for_params::<P>(name, description),
            handler,
        });
        self
    }

    /// Freeze the table; duplicate names are rejected.
    pub fn build(self) -> Result<ToolRegistry<A>, ToolError> {
        let mut index = HashMap::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            if index.insert(entry.definition.name, i).is_some() {
                return Err(ToolError::DuplicateTool(entry.definition.name.to_string()));
            }
        }
        Ok(ToolRegistry {
            entries: self.entries,
            index,
        })
    }
}
