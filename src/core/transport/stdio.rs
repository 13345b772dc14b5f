//! STDIO transport implementation.
//!
//! Serves exactly one logical server over stdin/stdout. The whole stream is a
//! single session, opened before the first message and closed when rmcp stops.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::server::{HostedServer, McpServer};
use crate::core::session::{ClientInfo, SessionInit, SessionManager};

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client disconnects.
    pub async fn run(hosted: HostedServer) -> TransportResult<()> {
        let sessions = SessionManager::new();
        let session = sessions
            .create(SessionInit {
                protocol_version: String::new(),
                client: ClientInfo {
                    name: "stdio".to_string(),
                    version: None,
                },
            })
            .await;
        info!(server = hosted.name(), "Ready - communicating via stdin/stdout");

        let server = McpServer::new(hosted, session.clone());
        let result = match server.serve(rmcp::transport::stdio()).await {
            Ok(service) => service
                .waiting()
                .await
                .map(|_| ())
                .map_err(|e| TransportError::service(e.to_string())),
            Err(e) => Err(TransportError::init(e.to_string())),
        };

        sessions.close(session.id(), "transport closed").await;
        info!("STDIO transport finished");
        result
    }
}
