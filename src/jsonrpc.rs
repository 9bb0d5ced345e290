//! Locally synthesized JSON-RPC error responses
//!
//! When the bridge cannot reach a backend it still answers in protocol, so
//! the client sees a well-formed message instead of silence.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::backend::candidates::BACKEND_PACKAGE;
use crate::Result;

/// JSON-RPC "Internal error" code
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// JSON-RPC error envelope not attributable to any request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    jsonrpc: &'static str,
    pub error: JsonRpcError,
    id: JsonValue,
}

impl ErrorResponse {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            error: JsonRpcError {
                code: INTERNAL_ERROR,
                message: message.into(),
            },
            id: JsonValue::Null,
        }
    }

    /// Response for a session where no candidate could be started
    pub fn backend_unavailable(install_hint: &str) -> Self {
        Self::internal(format!(
            "Failed to start {} server. Please install it with: {}",
            BACKEND_PACKAGE, install_hint
        ))
    }

    /// Response for a backend that failed after it was started
    pub fn server_error(error: impl Display) -> Self {
        Self::internal(format!("Server error: {}", error))
    }

    /// Write the response as a single line and flush it
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');

        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_shape() {
        let json = serde_json::to_string(&ErrorResponse::server_error("boom")).unwrap();
        assert_eq!(
            json,
            r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Server error: boom"},"id":null}"#
        );
    }

    #[test]
    fn test_backend_unavailable_message() {
        let response = ErrorResponse::backend_unavailable("pip install google-automation-mcp");
        assert_eq!(response.error.code, INTERNAL_ERROR);
        assert_eq!(
            response.error.message,
            "Failed to start google-automation-mcp server. Please install it with: pip install google-automation-mcp"
        );
    }

    #[tokio::test]
    async fn test_write_to_emits_one_line() {
        let mut out: Vec<u8> = Vec::new();
        ErrorResponse::server_error("boom")
            .write_to(&mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));

        let value: JsonValue = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["error"]["code"], -32603);
        assert!(value["id"].is_null());
    }
}
