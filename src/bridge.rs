//! Remote-procedure bridge to the native support agent
//!
//! The agent owns the actual diagnostics and fix logic; this side only
//! knows how to ask for them and hand back a string or a failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local endpoint the native support agent listens on.
pub const AGENT_ENDPOINT: &str = "http://127.0.0.1:13377/rpc";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("support agent unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed agent reply: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
    #[error("support agent sent an empty reply")]
    EmptyReply,
}

/// The two operations the native agent exposes.
pub trait SupportBridge: Send + Sync {
    /// Generate a debug report and return the support token.
    fn run_diagnostics(&self) -> Result<String, BridgeError>;

    /// Apply the common-issue fixes and return a summary of what was done.
    fn run_fixes(&self) -> Result<String, BridgeError>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON-over-HTTP client for the local agent.
pub struct RpcBridge {
    endpoint: String,
}

impl RpcBridge {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn call(&self, method: &str) -> Result<String, BridgeError> {
        // Debug runs upload logs and fixes reinstall the runtime, both of
        // which can take minutes. The panel shows its own wait dialog, so
        // the client carries no timeout of its own.
        let client = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()?;

        let body = client
            .post(&self.endpoint)
            .json(&RpcRequest { method })
            .send()?
            .error_for_status()?
            .text()?;

        decode_reply(serde_json::from_str(&body)?)
    }
}

impl SupportBridge for RpcBridge {
    fn run_diagnostics(&self) -> Result<String, BridgeError> {
        self.call("RunDebug")
    }

    fn run_fixes(&self) -> Result<String, BridgeError> {
        self.call("RunCommonFixes")
    }
}

fn decode_reply(reply: RpcReply) -> Result<String, BridgeError> {
    if let Some(message) = reply.error {
        return Err(BridgeError::Backend(message));
    }
    reply.result.ok_or(BridgeError::EmptyReply)
}
