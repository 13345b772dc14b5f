//! Tools domain module.
//!
//! This module handles tool listing and invocation for every logical server.
//!
//! ## Architecture
//!
//! - `definitions/` - Parameter structs and registries, one file per server
//! - `registry.rs` - Ordered tool table used for both listing and routing
//! - `dispatcher.rs` - Validation, invocation and error containment
//! - `envelope.rs` - Request and response envelopes
//! - `error.rs` - Tool and adapter error types
//!
//! ## Adding a New Tool
//!
//! 1. Add a params struct and constants to the server's file in `definitions/`
//! 2. Add the adapter method it calls
//! 3. Register it with `.tool(NAME, DESCRIPTION, handler)` in that file's registry

mod definition;
pub mod definitions;
mod dispatcher;
mod envelope;
mod error;
mod registry;

pub use definition::ToolDefinition;
pub use definitions::build_tool_service;
pub use dispatcher::{ToolDispatcher, ToolService};
pub use envelope::{ContentBlock, ToolCallRequest, ToolCallResponse};
pub use error::{AdapterError, ToolError};
pub use registry::{ToolEntry, ToolHandler, ToolRegistry, ToolRegistryBuilder};
