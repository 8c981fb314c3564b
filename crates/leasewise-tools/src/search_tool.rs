//! Live research tools over the search bridge.
//!
//! Both tools degrade to an error string rather than panicking when
//! the bridge is unavailable; the pipeline embeds that text in the
//! stage output so the user sees why research was skipped.

use std::sync::Arc;

use async_trait::async_trait;

use leasewise_core::tools::{names, Tool, ToolError};
use leasewise_services::mcp::search::{
    digest_crawl, digest_search, CRAWL_TOOL_ALIASES, SEARCH_TOOL_ALIASES,
};
use leasewise_services::SearchBridge;

/// `exa_web_search`: run a web search and digest the top results.
pub struct WebSearchTool {
    bridge: Arc<SearchBridge>,
}

impl WebSearchTool {
    pub fn new(bridge: Arc<SearchBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        names::WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the web for current market information; returns a digest \
         of the top results"
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let query = args
            .get("query")
            .and_then(|q| q.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("missing 'query'".into()))?;

        let ready = self
            .bridge
            .start()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        if !ready {
            return Err(ToolError::ExecutionFailed(
                "search is not configured: set the EXA_API_KEY environment variable".into(),
            ));
        }
        let tool = self
            .bridge
            .resolve_tool(SEARCH_TOOL_ALIASES)
            .await
            .ok_or_else(|| {
                ToolError::ExecutionFailed("search server exposes no search tool".into())
            })?;
        let result = self
            .bridge
            .call(&tool, serde_json::json!({"query": query, "numResults": 5}))
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(format!(
            "\n## WEB SEARCH: {query}\n\n{}",
            digest_search(&result)
        ))
    }
}

/// `exa_crawl_url`: fetch one page's content through the bridge.
pub struct CrawlUrlTool {
    bridge: Arc<SearchBridge>,
}

impl CrawlUrlTool {
    pub fn new(bridge: Arc<SearchBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl Tool for CrawlUrlTool {
    fn name(&self) -> &str {
        names::CRAWL_URL
    }

    fn description(&self) -> &str {
        "Fetch a specific page's content for detailed pricing figures"
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let url = args
            .get("url")
            .and_then(|u| u.as_str())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("missing 'url'".into()))?;

        let ready = self
            .bridge
            .start()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        if !ready {
            return Err(ToolError::ExecutionFailed(
                "search is not configured: set the EXA_API_KEY environment variable".into(),
            ));
        }
        let tool = self
            .bridge
            .resolve_tool(CRAWL_TOOL_ALIASES)
            .await
            .ok_or_else(|| {
                ToolError::ExecutionFailed("search server exposes no crawl tool".into())
            })?;
        let result = self
            .bridge
            .call(&tool, serde_json::json!({"url": url}))
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        Ok(format!("\n## PAGE CONTENT: {url}\n\n{}", digest_crawl(&result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasewise_types::config::SearchConfig;

    fn unconfigured_bridge() -> Arc<SearchBridge> {
        Arc::new(SearchBridge::new(SearchConfig::default()))
    }

    #[tokio::test]
    async fn search_requires_query() {
        let tool = WebSearchTool::new(unconfigured_bridge());
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[tokio::test]
    async fn search_without_credential_reports_unconfigured() {
        let tool = WebSearchTool::new(unconfigured_bridge());
        let err = tool
            .execute(serde_json::json!({"query": "azure pricing"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("EXA_API_KEY"));
    }

    #[tokio::test]
    async fn crawl_requires_url() {
        let tool = CrawlUrlTool::new(unconfigured_bridge());
        let err = tool.execute(serde_json::json!({"url": "  "})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[cfg(unix)]
    mod with_fake_server {
        use super::*;

        const FAKE_SERVER: &str = r#"
            i=0
            while read line; do
                case "$line" in
                    *'"id"'*)
                        i=$((i+1))
                        printf '{"jsonrpc":"2.0","id":%d,"result":{"tools":[{"name":"search"},{"name":"crawl"}],"content":[{"type":"text","text":"Azure D4s v3: $140.16/month"}]}}\n' "$i"
                        ;;
                esac
            done
        "#;

        fn bridge() -> Arc<SearchBridge> {
            Arc::new(SearchBridge::new(SearchConfig {
                api_key: Some("test-key".into()),
                command: "sh".into(),
                args: vec!["-c".into(), FAKE_SERVER.into()],
            }))
        }

        #[tokio::test]
        async fn search_digests_results() {
            let bridge = bridge();
            let tool = WebSearchTool::new(bridge.clone());
            let out = tool
                .execute(serde_json::json!({"query": "azure vm pricing"}))
                .await
                .unwrap();
            assert!(out.contains("WEB SEARCH: azure vm pricing"));
            assert!(out.contains("$140.16"));
            bridge.stop().await;
        }

        #[tokio::test]
        async fn crawl_digests_page() {
            let bridge = bridge();
            let tool = CrawlUrlTool::new(bridge.clone());
            let out = tool
                .execute(serde_json::json!({"url": "https://azure.example/pricing"}))
                .await
                .unwrap();
            assert!(out.contains("PAGE CONTENT: https://azure.example/pricing"));
            assert!(out.contains("$140.16"));
            bridge.stop().await;
        }
    }
}
