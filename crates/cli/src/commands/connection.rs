//! Connection check command.
//!
//! # Usage
//!
//! ```bash
//! # Probe the configured endpoint
//! sb-cli test-connection
//! ```
//!
//! # Environment Variables
//!
//! - `BRIDGE_ENDPOINT` / `BRIDGE_API_USER` / `BRIDGE_API_KEY` - Channel
//!   credentials; without them the in-process demo remote is probed.

use tracing::info;

use storebridge_engine::remote::ConnectionStatus;

use crate::demo::DemoEnv;

/// Probe the remote platform with the channel credentials.
///
/// Exits non-zero when the endpoint is unreachable or rejects the
/// credentials, so the command slots into health checks.
///
/// # Errors
///
/// Returns an error when the connection cannot be established.
pub async fn test() -> Result<(), Box<dyn std::error::Error>> {
    let env = DemoEnv::new().await?;
    let channel = env.engine.channel();
    info!(endpoint = %channel.endpoint, user = %channel.api_user, "Probing remote platform");

    match env.engine.test_connection().await {
        ConnectionStatus::Connected => {
            info!("Connection OK");
            Ok(())
        }
        ConnectionStatus::Unreachable { detail } => {
            Err(format!("endpoint unreachable: {detail}").into())
        }
        ConnectionStatus::Rejected { detail } => {
            Err(format!("connection rejected: {detail}").into())
        }
    }
}
