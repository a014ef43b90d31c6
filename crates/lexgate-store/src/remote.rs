//! HTTP client for indices served by a remote search service.
//!
//! `POST {base}/indices/{id}/search` with `{"query": ..., "limit": ...}`
//! answers `{"hits": [{"id", "score", "metadata"}]}`.

use async_trait::async_trait;
use lexgate_core::types::meta;
use lexgate_core::{IndexHandle, IndexScope, RetrievalHit};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{IndexBackend, StoreError};

pub struct RemoteIndex {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<RetrievalHit>,
}

impl RemoteIndex {
    /// `base_url` like `http://localhost:8080`; a trailing slash is dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, index: &IndexHandle) -> String {
        format!("{}/indices/{}/search", self.base_url, index.id)
    }
}

#[async_trait]
impl IndexBackend for RemoteIndex {
    async fn search(
        &self,
        index: &IndexHandle,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalHit>, StoreError> {
        let url = self.search_url(index);
        debug!(url = %url, limit, "remote index search");

        let resp = self
            .client
            .post(&url)
            .json(&SearchRequest { query, limit })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let SearchResponse { mut hits } = resp.json().await?;
        hits.truncate(limit);
        for hit in &mut hits {
            stamp_provenance(hit, index);
        }
        Ok(hits)
    }
}

/// Fill in `index` and `jurisdiction` metadata the server left out.
fn stamp_provenance(hit: &mut RetrievalHit, index: &IndexHandle) {
    hit.metadata
        .entry(meta::INDEX.to_string())
        .or_insert_with(|| index.id.clone().into());
    if let IndexScope::Jurisdiction(code) = &index.scope {
        hit.metadata
            .entry(meta::JURISDICTION.to_string())
            .or_insert_with(|| code.as_str().into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgate_core::Registry;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn boja() -> IndexHandle {
        let registry = Registry::builtin().unwrap();
        let code = registry.resolve("ES-AN").unwrap();
        registry.get(&code).unwrap().index.clone().unwrap()
    }

    /// Serve exactly one HTTP request with a canned status and body.
    /// Returns the base URL and a handle yielding the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/"), handle)
    }

    #[test]
    fn trims_trailing_slash() {
        let remote = RemoteIndex::new("http://localhost:8080/");
        assert_eq!(remote.base_url, "http://localhost:8080");
        assert_eq!(
            remote.search_url(&boja()),
            "http://localhost:8080/indices/es-an-boja/search"
        );
    }

    #[tokio::test]
    async fn search_posts_query_and_stamps_provenance() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"hits":[{"id":"boja-7","score":0.82,"metadata":{"article":"3"}},{"id":"boja-9","score":0.4}]}"#,
        )
        .await;
        let remote = RemoteIndex::new(base);
        let hits = remote.search(&boja(), "licencia de obra", 5).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "boja-7");
        assert_eq!(hits[0].meta_str(meta::ARTICLE), Some("3"));
        assert_eq!(hits[0].meta_str(meta::INDEX), Some("es-an-boja"));
        assert_eq!(hits[1].meta_str(meta::JURISDICTION), Some("ES-AN"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /indices/es-an-boja/search"));
        assert!(request.contains(r#""query":"licencia de obra""#));
        assert!(request.contains(r#""limit":5"#));
    }

    #[tokio::test]
    async fn non_success_status_is_server_error() {
        let (base, _server) = serve_once("503 Service Unavailable", r#"{"error":"down"}"#).await;
        let remote = RemoteIndex::new(base);
        let result = remote.search(&boja(), "plazo", 5).await;
        assert!(matches!(result, Err(StoreError::Server { status: 503, .. })));
    }
}
