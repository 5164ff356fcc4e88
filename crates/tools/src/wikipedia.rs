//! Wikipedia lookup through the MediaWiki action API.
//!
//! A lookup is two requests: a full-text search for the best matching
//! titles, then one batched `extracts` query for the intro of each title.
//! Hits are rendered as
//!
//! ```text
//! Page: <title>
//! Summary: <intro>
//! ```
//!
//! separated by blank lines, in search rank order.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use docchat_core::error::KnowledgeError;
use docchat_core::knowledge::KnowledgeSource;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_CHARS: usize = 4000;

/// MediaWiki rejects requests without a descriptive agent.
const USER_AGENT: &str = concat!("docchat/", env!("CARGO_PKG_VERSION"));

pub struct WikipediaLookup {
    api_url: String,
    top_k: usize,
    max_chars: usize,
    client: reqwest::Client,
}

impl WikipediaLookup {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, KnowledgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| KnowledgeError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_url: api_url.into(),
            top_k: DEFAULT_TOP_K,
            max_chars: DEFAULT_MAX_CHARS,
            client,
        })
    }

    /// Maximum number of pages summarized per lookup (minimum 1).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Upper bound on the characters of a lookup result.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, KnowledgeError> {
        let limit = self.top_k.to_string();
        let response: SearchResponse = self
            .get(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("srprop", ""),
            ])
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// Intro extracts for `titles`, keyed by the requested title.
    async fn extracts(&self, titles: &[String]) -> Result<HashMap<String, String>, KnowledgeError> {
        let joined = titles.join("|");
        let limit = titles.len().to_string();
        let response: ExtractsResponse = self
            .get(&[
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("exlimit", &limit),
                ("titles", &joined),
            ])
            .await?;

        let Some(query) = response.query else {
            return Ok(HashMap::new());
        };

        // Map requested titles through normalization and redirects to the
        // page title the API actually answered with.
        let renames: HashMap<String, String> = query
            .normalized
            .into_iter()
            .chain(query.redirects)
            .map(|r| (r.from, r.to))
            .collect();
        let by_title: HashMap<String, String> = query
            .pages
            .into_iter()
            .filter_map(|page| Some((page.title, page.extract?)))
            .collect();

        let mut extracts = HashMap::new();
        for title in titles {
            let mut resolved = title.as_str();
            // Normalization can be followed by a redirect.
            for _ in 0..2 {
                if let Some(next) = renames.get(resolved) {
                    resolved = next.as_str();
                }
            }
            if let Some(extract) = by_title.get(resolved) {
                extracts.insert(title.clone(), extract.clone());
            }
        }
        Ok(extracts)
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, KnowledgeError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| KnowledgeError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::ApiError {
                status_code: status,
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| KnowledgeError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaLookup {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn lookup(&self, query: &str) -> Result<Option<String>, KnowledgeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let titles = self.search(query).await?;
        debug!(query, hits = titles.len(), "Wikipedia search");
        if titles.is_empty() {
            return Ok(None);
        }

        let extracts = self.extracts(&titles).await?;
        let hits: Vec<(&str, &str)> = titles
            .iter()
            .filter_map(|title| {
                let extract = extracts.get(title)?.trim();
                (!extract.is_empty()).then_some((title.as_str(), extract))
            })
            .collect();

        if hits.is_empty() {
            warn!(query, "Wikipedia search hits had no summaries");
            return Ok(None);
        }

        Ok(Some(truncate_chars(&format_hits(&hits), self.max_chars)))
    }
}

fn format_hits(hits: &[(&str, &str)]) -> String {
    hits.iter()
        .map(|(title, summary)| format!("Page: {title}\nSummary: {summary}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cut `text` to at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// --- MediaWiki API types (formatversion=2) ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractsResponse {
    query: Option<ExtractsQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractsQuery {
    #[serde(default)]
    normalized: Vec<Rename>,
    #[serde(default)]
    redirects: Vec<Rename>,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Rename {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    extract: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/w/api.php")
    }

    /// A tiny MediaWiki: two articles about Rust, nothing else.
    async fn fake_api(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        assert_eq!(params.get("action").map(String::as_str), Some("query"));
        assert_eq!(params.get("formatversion").map(String::as_str), Some("2"));

        if params.get("list").map(String::as_str) == Some("search") {
            let term = params.get("srsearch").cloned().unwrap_or_default();
            if term.contains("boom") {
                return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
            }
            let limit: usize = params.get("srlimit").and_then(|l| l.parse().ok()).unwrap_or(10);
            let hits: Vec<Value> = if term.to_lowercase().contains("rust") {
                ["Rust (programming language)", "Rust", "Cargo (software)"]
                    .iter()
                    .take(limit)
                    .map(|t| json!({"ns": 0, "title": t}))
                    .collect()
            } else {
                Vec::new()
            };
            return (StatusCode::OK, Json(json!({"query": {"search": hits}})));
        }

        assert_eq!(params.get("prop").map(String::as_str), Some("extracts"));
        let titles = params.get("titles").cloned().unwrap_or_default();
        // Pages come back in a different order than requested.
        let mut pages = Vec::new();
        for title in titles.split('|').rev() {
            let extract = match title {
                "Rust (programming language)" => "Rust is a general-purpose programming language.",
                "Rust" => "Rust is an iron oxide.",
                _ => "",
            };
            pages.push(json!({"pageid": 1, "ns": 0, "title": title, "extract": extract}));
        }
        (StatusCode::OK, Json(json!({"query": {"pages": pages}})))
    }

    async fn fake_wikipedia() -> WikipediaLookup {
        let url = spawn(Router::new().route("/w/api.php", get(fake_api))).await;
        WikipediaLookup::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn formats_hits_in_order() {
        let text = format_hits(&[("A", "first"), ("B", "second")]);
        assert_eq!(text, "Page: A\nSummary: first\n\nPage: B\nSummary: second");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn parses_extracts_with_redirects() {
        let data = r#"{"batchcomplete":true,"query":{
            "normalized":[{"fromencoded":false,"from":"rust","to":"Rust"}],
            "redirects":[{"from":"Rust","to":"Rust (disambiguation)"}],
            "pages":[{"pageid":7,"ns":0,"title":"Rust (disambiguation)","extract":"Many things."}]}}"#;
        let parsed: ExtractsResponse = serde_json::from_str(data).unwrap();
        let query = parsed.query.unwrap();
        assert_eq!(query.normalized[0].to, "Rust");
        assert_eq!(query.redirects[0].to, "Rust (disambiguation)");
        assert_eq!(query.pages[0].extract.as_deref(), Some("Many things."));
    }

    #[tokio::test]
    async fn lookup_summarizes_hits_in_rank_order() {
        let wiki = fake_wikipedia().await;
        let text = wiki.lookup("what is rust").await.unwrap().unwrap();
        assert_eq!(
            text,
            "Page: Rust (programming language)\nSummary: Rust is a general-purpose programming language.\n\n\
             Page: Rust\nSummary: Rust is an iron oxide."
        );
    }

    #[tokio::test]
    async fn lookup_respects_top_k() {
        let wiki = fake_wikipedia().await.with_top_k(1);
        let text = wiki.lookup("rust").await.unwrap().unwrap();
        assert!(text.starts_with("Page: Rust (programming language)"));
        assert!(!text.contains("iron oxide"));
    }

    #[tokio::test]
    async fn lookup_truncates_to_max_chars() {
        let wiki = fake_wikipedia().await.with_max_chars(20);
        let text = wiki.lookup("rust").await.unwrap().unwrap();
        assert_eq!(text.chars().count(), 20);
    }

    #[tokio::test]
    async fn no_hits_is_none() {
        let wiki = fake_wikipedia().await;
        assert!(wiki.lookup("zzqx").await.unwrap().is_none());
        assert!(wiki.lookup("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let wiki = fake_wikipedia().await;
        let err = wiki.lookup("boom").await.unwrap_err();
        assert!(matches!(err, KnowledgeError::ApiError { status_code: 503, .. }));
    }

    #[tokio::test]
    async fn unreachable_api_is_network_error() {
        let wiki = WikipediaLookup::new("http://127.0.0.1:1/w/api.php", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            wiki.lookup("rust").await,
            Err(KnowledgeError::Network(_))
        ));
    }
}
