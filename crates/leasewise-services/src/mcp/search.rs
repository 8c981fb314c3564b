//! Search result digesting.
//!
//! Exa-style servers expose their search under a handful of names
//! depending on the package version, and return either structured
//! result lists or plain text blocks. This module owns the alias lists
//! and boils a raw tool result down to a short markdown digest with
//! hard character caps, so one search cannot flood a stage's context.

use serde_json::Value;

/// Known names for the web search tool, in preference order.
pub const SEARCH_TOOL_ALIASES: &[&str] = &["web_search_exa", "search", "exa_search", "webSearch"];

/// Known names for the page crawl tool, in preference order.
pub const CRAWL_TOOL_ALIASES: &[&str] = &["crawling_exa", "crawl", "getContents", "extract"];

/// Results kept from a search response.
const MAX_RESULTS: usize = 5;

/// Character cap per search snippet.
const SNIPPET_CAP: usize = 400;

/// Character cap for crawled page text.
const CRAWL_CAP: usize = 2000;

/// Truncate on a char boundary, marking the cut.
fn truncate(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        return text.to_string();
    }
    let cut: String = text.chars().take(cap).collect();
    format!("{cut}...")
}

/// Text blocks from an MCP tool result's `content` array.
fn text_blocks(result: &Value) -> Vec<&str> {
    result
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

/// Digest a search result into a numbered markdown list.
///
/// Structured `{"results": [...]}` payloads (possibly JSON-encoded
/// inside a text block) become title/url/snippet entries; anything else
/// is passed through as capped plain text.
pub fn digest_search(result: &Value) -> String {
    let blocks = text_blocks(result);
    if blocks.is_empty() {
        return "No search results returned.".to_string();
    }
    let mut out = String::new();
    for block in blocks {
        if let Ok(parsed) = serde_json::from_str::<Value>(block)
            && let Some(results) = parsed.get("results").and_then(|r| r.as_array())
        {
            for (i, item) in results.iter().take(MAX_RESULTS).enumerate() {
                let title = item.get("title").and_then(|t| t.as_str()).unwrap_or("(untitled)");
                let url = item.get("url").and_then(|u| u.as_str()).unwrap_or("");
                let snippet = item
                    .get("text")
                    .or_else(|| item.get("snippet"))
                    .and_then(|s| s.as_str())
                    .unwrap_or("");
                out.push_str(&format!("{}. **{}**\n", i + 1, title));
                if !url.is_empty() {
                    out.push_str(&format!("   {url}\n"));
                }
                if !snippet.is_empty() {
                    out.push_str(&format!("   {}\n", truncate(snippet.trim(), SNIPPET_CAP)));
                }
            }
            continue;
        }
        out.push_str(&truncate(block.trim(), SNIPPET_CAP));
        out.push('\n');
    }
    if out.is_empty() {
        "No search results returned.".to_string()
    } else {
        out
    }
}

/// Digest a crawl result: the page text, capped.
pub fn digest_crawl(result: &Value) -> String {
    let blocks = text_blocks(result);
    if blocks.is_empty() {
        return "No page content returned.".to_string();
    }
    truncate(blocks.join("\n").trim(), CRAWL_CAP)
}
