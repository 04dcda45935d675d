//! Remote search-engine suggestions (OpenSearch JSON format)

use futures_util::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;

use crate::error::SuggestError;
use crate::input::search_url;
use crate::item::{SuggestItem, SuggestKind};
use crate::source::{SuggestQuery, SuggestionSource};
use crate::Result;

pub struct RemoteSuggestSource {
    client: reqwest::Client,
    /// Suggestion endpoint, `%s` replaced with the query
    template: String,
}

impl RemoteSuggestSource {
    pub fn new(template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Harbor Suggest)")
            .build()?;

        Ok(Self {
            client,
            template: template.into(),
        })
    }

    /// Share an already configured client.
    pub fn with_client(client: reqwest::Client, template: impl Into<String>) -> Self {
        Self {
            client,
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    async fn fetch(&self, prefix: &str) -> Result<Vec<String>> {
        let url = search_url(&self.template, prefix);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;
        parse_suggestions(&body)
    }
}

impl SuggestionSource for RemoteSuggestSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn kind(&self) -> SuggestKind {
        SuggestKind::RemoteSuggestion
    }

    fn query(&self, query: SuggestQuery) -> BoxFuture<'_, Result<Vec<SuggestItem>>> {
        Box::pin(async move {
            // Typed text never leaves the device for incognito tabs
            if query.incognito || query.limit == 0 || query.prefix.trim().is_empty() {
                return Ok(Vec::new());
            }

            let suggestions = self.fetch(query.prefix.trim()).await?;
            tracing::debug!(count = suggestions.len(), "Remote suggestions received");

            Ok(suggestions
                .into_iter()
                .take(query.limit)
                .map(|text| SuggestItem::new(SuggestKind::RemoteSuggestion, text, None))
                .collect())
        })
    }
}

/// Parse an OpenSearch suggestion body: `["query", ["s1", "s2", ...], ...]`.
pub fn parse_suggestions(body: &str) -> Result<Vec<String>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SuggestError::Malformed(e.to_string()))?;

    let list = value
        .as_array()
        .and_then(|parts| parts.get(1))
        .and_then(Value::as_array)
        .ok_or_else(|| SuggestError::Malformed("expected [query, [suggestions]]".to_string()))?;

    Ok(list
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{SuggestLayout, SuggestionAggregator};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request; the task yields the request line.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{addr}/complete?q=%s"), server)
    }

    fn local_source(template: String) -> RemoteSuggestSource {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        RemoteSuggestSource::with_client(client, template)
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let (template, server) =
            serve_once("200 OK", r#"["goo",["google","goodreads","goose"]]"#).await;
        let source = local_source(template);

        let items = source
            .query(SuggestQuery {
                prefix: " goo ".to_string(),
                limit: 2,
                incognito: false,
            })
            .await
            .unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["google", "goodreads"]);
        assert!(items.iter().all(|i| i.kind == SuggestKind::RemoteSuggestion));

        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /complete?q=goo "));
    }

    #[tokio::test]
    async fn test_server_error_falls_back_to_web_search() {
        let (template, server) = serve_once("500 Internal Server Error", "oops").await;
        let mut aggregator = SuggestionAggregator::new(SuggestLayout::Portrait { lines: 3 });
        aggregator.register(Arc::new(local_source(template)));

        let items: Vec<SuggestItem> = aggregator.query("goo", false).await.collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_web_search());
        assert_eq!(items[0].text(), "goo");
        server.await.unwrap();
    }

    #[test]
    fn test_parse_suggestions() {
        let body = r#"["goo",["google","goodreads"," ",42],["desc"]]"#;
        assert_eq!(
            parse_suggestions(body).unwrap(),
            vec!["google".to_string(), "goodreads".to_string()]
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_suggestions("{\"q\":1}"),
            Err(SuggestError::Malformed(_))
        ));
        assert!(matches!(
            parse_suggestions("not json"),
            Err(SuggestError::Malformed(_))
        ));
        assert!(parse_suggestions(r#"["q"]"#).is_err());
    }

    #[tokio::test]
    async fn test_incognito_skips_network() {
        // Unroutable endpoint: a request would fail, so Ok means no request
        let source =
            RemoteSuggestSource::new("http://127.0.0.1:9/?q=%s", Duration::from_millis(50))
                .unwrap();
        let items = source
            .query(SuggestQuery {
                prefix: "goo".to_string(),
                limit: 3,
                incognito: true,
            })
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
