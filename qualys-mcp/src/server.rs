//! Line-delimited JSON-RPC loop over an async reader/writer pair.

use qualys_kernel::Dispatcher;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, Tool, ToolCallParams, ToolCallResult,
    ToolsListResult,
};

/// Serves the dispatcher's operations to one protocol client.
#[derive(Debug)]
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Wraps a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Returns the underlying dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Reads requests line by line until EOF, writing one reply line per
    /// request. Requests are handled strictly in arrival order.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the reader or writer.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(reply) = self.handle_line(line).await {
                let mut encoded = serde_json::to_string(&reply).map_err(io::Error::other)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        debug!("input closed; stopping");
        Ok(())
    }

    /// Parses and handles one line.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "unparsable message");
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {err}"),
                ));
            }
        };

        let id = message.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.handle(request).await,
            Err(err) => Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {err}"),
            )),
        }
    }

    /// Handles one request; notifications produce no reply.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "request received");
        let notification = request.is_notification();
        let reply = match request.method.as_str() {
            "initialize" => to_result(request.id.clone(), &InitializeResult::default()),
            "ping" => JsonRpcResponse::success(request.id.clone(), json!({})),
            "tools/list" => {
                let tools = self
                    .dispatcher
                    .definitions()
                    .into_iter()
                    .map(Tool::from)
                    .collect();
                to_result(request.id.clone(), &ToolsListResult { tools })
            }
            "tools/call" => self.call_tool(request.id.clone(), request.params).await,
            method if method.starts_with("notifications/") => return None,
            method => JsonRpcResponse::error(
                request.id.clone(),
                METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        };

        (!notification).then_some(reply)
    }

    async fn call_tool(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(err) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {err}"),
                );
            }
        };

        let output = self.dispatcher.dispatch(&params.name, &params.arguments).await;
        to_result(id, &ToolCallResult::text(output.into_text()))
    }
}

fn to_result<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => JsonRpcResponse::error(id, INTERNAL_ERROR, err.to_string()),
    }
}
