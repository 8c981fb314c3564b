//! Supervised MCP search session.
//!
//! [`SearchBridge`] owns at most one server process at a time. Callers
//! never see the process lifecycle: `call` starts the session on first
//! use and respawns it transparently if the child has died. Without a
//! configured credential the bridge refuses to spawn at all and every
//! call fails fast with [`ServiceError::MissingCredential`].

pub mod search;
pub mod transport;
pub mod types;

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use leasewise_types::config::{SearchConfig, SEARCH_KEY_ENV};

use crate::error::{Result, ServiceError};
use transport::StdioTransport;

/// MCP protocol revision spoken during the handshake.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Budget for the initialize round-trip. First use may download the
/// server package, which dominates this.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget for a tool call.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(45);

struct Session {
    transport: StdioTransport,
    /// Tool names the server advertised; empty when discovery failed.
    tools: Vec<String>,
}

/// Supervisor for the search server session.
pub struct SearchBridge {
    config: SearchConfig,
    session: Mutex<Option<Session>>,
}

impl SearchBridge {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    /// Whether a credential is configured. Without one, [`start`]
    /// returns `Ok(false)` and [`call`] errors.
    ///
    /// [`start`]: Self::start
    /// [`call`]: Self::call
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Ensure a live session exists.
    ///
    /// Returns `Ok(false)` without spawning when no credential is
    /// configured, `Ok(true)` when a session is ready (including the
    /// already-running case). A dead child is replaced.
    pub async fn start(&self) -> Result<bool> {
        if !self.is_configured() {
            return Ok(false);
        }
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_mut()
            && session.transport.is_alive()
        {
            return Ok(true);
        }
        if let Some(dead) = guard.take() {
            warn!("search server died; respawning");
            dead.transport.shutdown().await;
        }
        *guard = Some(self.spawn_session().await?);
        Ok(true)
    }

    async fn spawn_session(&self) -> Result<Session> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential)?;
        info!(command = %self.config.command, "starting search server");
        let env = vec![(SEARCH_KEY_ENV.to_string(), key.to_string())];
        let mut transport =
            StdioTransport::spawn(&self.config.command, &self.config.args, &env)?;

        let init = transport
            .request(
                "initialize",
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "leasewise",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
                HANDSHAKE_TIMEOUT,
            )
            .await;
        let init = match init {
            Ok(response) => response,
            Err(err) => {
                transport.shutdown().await;
                return Err(err);
            }
        };
        if let Some(rpc_err) = init.error {
            transport.shutdown().await;
            return Err(ServiceError::Protocol(rpc_err.message));
        }
        transport
            .notify("notifications/initialized", serde_json::json!({}))
            .await?;

        // Discovery is best-effort: alias resolution falls back to a
        // known default when the server will not enumerate its tools.
        let tools = match transport
            .request("tools/list", serde_json::json!({}), HANDSHAKE_TIMEOUT)
            .await
        {
            Ok(response) => response
                .result
                .as_ref()
                .and_then(|r| r.get("tools"))
                .and_then(|t| t.as_array())
                .map(|list| {
                    list.iter()
                        .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "tool discovery failed; using default tool names");
                Vec::new()
            }
        };
        debug!(tools = ?tools, "search server ready");
        Ok(Session { transport, tools })
    }

    /// Resolve a tool alias list against the discovered tools.
    ///
    /// The first alias the server advertises wins; when discovery came
    /// back empty the first alias is used as-is.
    pub async fn resolve_tool(&self, aliases: &[&str]) -> Option<String> {
        let guard = self.session.lock().await;
        let session = guard.as_ref()?;
        if session.tools.is_empty() {
            return aliases.first().map(|a| (*a).to_string());
        }
        aliases
            .iter()
            .find(|a| session.tools.iter().any(|t| t == *a))
            .map(|a| (*a).to_string())
    }

    /// Invoke a server tool with the default timeout.
    pub async fn call(&self, tool: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        self.call_with_timeout(tool, args, CALL_TIMEOUT).await
    }

    /// Invoke a server tool, starting or respawning the session first.
    ///
    /// A JSON-RPC error from the server is surfaced verbatim as
    /// [`ServiceError::Protocol`].
    pub async fn call_with_timeout(
        &self,
        tool: &str,
        args: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        if !self.start().await? {
            return Err(ServiceError::MissingCredential);
        }
        let mut guard = self.session.lock().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| ServiceError::Transport("session vanished".into()))?;
        let response = session
            .transport
            .request(
                "tools/call",
                serde_json::json!({"name": tool, "arguments": args}),
                timeout,
            )
            .await?;
        if let Some(rpc_err) = response.error {
            return Err(ServiceError::Protocol(rpc_err.message));
        }
        response
            .result
            .ok_or_else(|| ServiceError::Protocol("response had neither result nor error".into()))
    }

    /// Shut the session down. Safe to call when nothing is running.
    pub async fn stop(&self) {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            info!("stopping search server");
            session.transport.shutdown().await;
        }
    }

    /// Human-readable session status for diagnostics.
    pub async fn status(&self) -> &'static str {
        if !self.is_configured() {
            return "unconfigured";
        }
        let mut guard = self.session.lock().await;
        match guard.as_mut() {
            Some(session) => {
                if session.transport.is_alive() {
                    "ready"
                } else {
                    "dead"
                }
            }
            None => "stopped",
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Shell stand-in for the search server: answers initialize,
    /// tools/list, and tools/call with ids counting up from 1.
    const FAKE_SERVER: &str = r#"
        i=0
        while read line; do
            case "$line" in
                *'"id"'*)
                    i=$((i+1))
                    printf '{"jsonrpc":"2.0","id":%d,"result":{"tools":[{"name":"web_search_exa"}],"content":[{"type":"text","text":"market data"}]}}\n' "$i"
                    ;;
            esac
        done
    "#;

    fn config(key: Option<&str>) -> SearchConfig {
        SearchConfig {
            api_key: key.map(str::to_string),
            command: "sh".into(),
            args: vec!["-c".into(), FAKE_SERVER.into()],
        }
    }

    #[tokio::test]
    async fn start_without_credential_is_a_no_op() {
        let bridge = SearchBridge::new(config(None));
        assert!(!bridge.is_configured());
        assert!(!bridge.start().await.unwrap());
        assert_eq!(bridge.status().await, "unconfigured");
    }

    #[tokio::test]
    async fn call_without_credential_fails_fast() {
        let bridge = SearchBridge::new(config(None));
        let err = bridge
            .call("web_search_exa", serde_json::json!({"query": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingCredential));
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let bridge = SearchBridge::new(config(Some("test-key")));
        assert!(bridge.start().await.unwrap());
        assert!(bridge.start().await.unwrap());
        assert_eq!(bridge.status().await, "ready");
        bridge.stop().await;
        assert_eq!(bridge.status().await, "stopped");
    }

    #[tokio::test]
    async fn call_returns_server_result() {
        let bridge = SearchBridge::new(config(Some("test-key")));
        let result = bridge
            .call("web_search_exa", serde_json::json!({"query": "azure pricing"}))
            .await
            .unwrap();
        assert_eq!(result["content"][0]["text"], "market data");
        bridge.stop().await;
    }

    #[tokio::test]
    async fn resolve_prefers_advertised_alias() {
        let bridge = SearchBridge::new(config(Some("test-key")));
        bridge.start().await.unwrap();
        let name = bridge
            .resolve_tool(&["search", "web_search_exa", "webSearch"])
            .await
            .unwrap();
        assert_eq!(name, "web_search_exa");
        // Nothing matching: no resolution.
        assert!(bridge.resolve_tool(&["crawl_only"]).await.is_none());
        bridge.stop().await;
    }

    #[tokio::test]
    async fn call_respawns_after_server_death() {
        let bridge = SearchBridge::new(config(Some("test-key")));
        bridge.start().await.unwrap();
        bridge.stop().await;
        let result = bridge
            .call("web_search_exa", serde_json::json!({"query": "x"}))
            .await
            .unwrap();
        assert!(result.get("content").is_some());
        bridge.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let bridge = SearchBridge::new(config(Some("test-key")));
        bridge.stop().await;
        bridge.start().await.unwrap();
        bridge.stop().await;
        bridge.stop().await;
    }
}
