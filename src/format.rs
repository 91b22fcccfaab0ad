//! Stateless rendering of search-style tool results. The turn loop works
//! without this; it only affects the user-visible fragments.

use serde_json::Value;

use crate::error::AgentError;

const MAX_RESULTS_SHOWN: usize = 3;
const SNIPPET_MAX_CHARS: usize = 200;

/// Render a ranked search-results summary from a tool result value.
///
/// `Ok(None)` means the value is not search-shaped (no `results` array) and
/// nothing should be shown. `Err(MalformedToolResult)` means it claimed to be
/// search-shaped but no entry could be rendered.
pub fn search_summary(value: &Value) -> Result<Option<String>, AgentError> {
    let Some(results) = value.get("results").and_then(|v| v.as_array()) else {
        return Ok(None);
    };
    let mut lines = Vec::new();
    for (i, entry) in results.iter().take(MAX_RESULTS_SHOWN).enumerate() {
        let Some(title) = entry.get("title").and_then(|v| v.as_str()) else { continue };
        let Some(url) = entry.get("url").and_then(|v| v.as_str()) else { continue };
        let snippet = entry.get("content").and_then(|v| v.as_str()).unwrap_or("");
        lines.push(format!("{}. {} - {}\n   {}", i + 1, title, url, truncate(snippet)));
    }
    if lines.is_empty() {
        return Err(AgentError::MalformedToolResult(
            "results array had no renderable entries".into(),
        ));
    }
    Ok(Some(format!("Search results:\n{}", lines.join("\n"))))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SNIPPET_MAX_CHARS).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_entry(title: &str, url: &str, content: &str) -> Value {
        serde_json::json!({ "title": title, "url": url, "content": content })
    }

    #[test]
    fn non_search_values_render_nothing() {
        assert!(search_summary(&serde_json::json!({ "answer": 42 })).unwrap().is_none());
        assert!(search_summary(&serde_json::json!("plain text")).unwrap().is_none());
    }

    #[test]
    fn caps_at_three_results() {
        let value = serde_json::json!({
            "results": (0..5).map(|i| result_entry(&format!("t{i}"), "https://x", "s")).collect::<Vec<_>>(),
        });
        let summary = search_summary(&value).unwrap().unwrap();
        assert!(summary.contains("3. t2"));
        assert!(!summary.contains("t3"));
    }

    #[test]
    fn long_snippets_are_truncated_with_ellipsis() {
        let long = "x".repeat(SNIPPET_MAX_CHARS + 50);
        let value = serde_json::json!({ "results": [result_entry("t", "https://x", &long)] });
        let summary = search_summary(&value).unwrap().unwrap();
        assert!(summary.ends_with('…'));
        assert!(!summary.contains(&long));
    }

    #[test]
    fn multibyte_snippets_truncate_on_char_boundaries() {
        let long = "é".repeat(SNIPPET_MAX_CHARS + 1);
        let value = serde_json::json!({ "results": [result_entry("t", "https://x", &long)] });
        let summary = search_summary(&value).unwrap().unwrap();
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn unusable_entries_are_skipped() {
        let value = serde_json::json!({
            "results": [
                { "content": "no title or url" },
                result_entry("good", "https://x", "s"),
            ],
        });
        let summary = search_summary(&value).unwrap().unwrap();
        assert!(summary.contains("good"));
        assert!(!summary.contains("no title"));
    }

    #[test]
    fn search_shaped_but_unrenderable_is_malformed() {
        let value = serde_json::json!({ "results": [{ "score": 0.5 }] });
        let err = search_summary(&value).unwrap_err();
        assert!(matches!(err, AgentError::MalformedToolResult(_)));
    }
}
