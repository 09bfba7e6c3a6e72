//! MCP (Model Context Protocol) server implementation.
//!
//! This module provides an MCP server that exposes stocklog functionality as tools for AI agent
//! integration. The server communicates via JSON-RPC over stdio.

mod mcp_utils;
mod tools;

use crate::error::{ErrorType, IntoResult};
use crate::inventory::Inventory;
use crate::{Config, Mode};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::{tool_handler, ServerHandler, ServiceExt};
use std::sync::Arc;
use tracing::info;

/// The stocklog MCP server.
///
/// Every request is served by the same `Inventory`, so the connection is made once and the
/// record cache is shared between tool calls.
#[derive(Debug, Clone)]
pub struct StockServer {
    inventory: Arc<Inventory>,
    tool_router: ToolRouter<StockServer>,
}

impl StockServer {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self {
            inventory,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_handler]
impl ServerHandler for StockServer {
    /// Returns server information sent to the MCP client during initialization.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "stocklog".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(include_str!("docs/INTRO.md").into()),
        }
    }
}

/// Transport type for the MCP server.
#[derive(Debug, Default)]
pub(crate) enum Io {
    #[default]
    Stdio,
    /// Mock transport for testing - holds one end of a duplex channel.
    #[cfg(test)]
    Mock(tokio::io::DuplexStream),
}

/// Connects to the worksheet, then runs the MCP server until the client disconnects or an error
/// occurs. A connection failure is returned before the server starts.
///
/// # Arguments
/// - `config`: The `Config` object
/// - `mode`: Whether we are running with a live Google sheet or with a test sheet
/// - `io`: Whether we are using stdio as the transport or using mock io for testing
///
pub(crate) async fn run_server(config: Config, mode: Mode, io: Io) -> crate::Result<()> {
    let inventory = Arc::new(Inventory::open(&config, mode).await?);
    let server = StockServer::new(inventory);
    info!("Starting MCP server...");

    let service = match io {
        Io::Stdio => server
            .serve(stdio())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Service)?,
        #[cfg(test)]
        Io::Mock(stream) => server
            .serve(stream)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Service)?,
    };

    info!("MCP server running, waiting for requests...");

    // Wait for the server to complete (client disconnects or error)
    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))
        .pub_result(ErrorType::Service)?;

    info!("MCP server shut down");
    Ok(())
}
