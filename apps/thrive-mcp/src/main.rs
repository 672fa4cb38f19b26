//! # Thrive MCP Server
//!
//! Entry point for the MCP (Model Context Protocol) bridge to Thrive.
//!
//! Reads configuration from environment variables:
//! - `THRIVE_URL`: Thrive server URL (default: `http://127.0.0.1:8080`)
//! - `THRIVE_API_KEY`: optional Bearer token for authentication
//!
//! Talks MCP over stdio and forwards the read-only tools to the Thrive
//! HTTP API.

mod client;
mod server;

use client::ThriveClient;
use rmcp::{ServiceExt, transport::stdio};
use server::ThriveMcp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout belongs to the MCP transport.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let url = std::env::var("THRIVE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());
    let api_key = std::env::var("THRIVE_API_KEY").ok().filter(|k| !k.is_empty());

    tracing::info!("Thrive MCP server starting, target: {}", url);

    let client = ThriveClient::new(url, api_key);
    let mcp = ThriveMcp::new(client);

    let service = mcp.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("MCP serve error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
