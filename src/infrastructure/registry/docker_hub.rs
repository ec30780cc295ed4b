//! Docker Hub tag listing adapter

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{ImageRegistry, RegistryError};

/// Upper bound on followed `next` links
const MAX_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct TagPage {
    next: Option<String>,
    #[serde(default)]
    results: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

/// Docker Hub registry client
pub struct DockerHubRegistry {
    url: String,
    client: reqwest::Client,
}

impl DockerHubRegistry {
    /// `url` is the repository's tags endpoint, e.g.
    /// `https://hub.docker.com/v2/repositories/<org>/<repo>/tags?page_size=100`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<TagPage, RegistryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ImageRegistry for DockerHubRegistry {
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        let mut tags = Vec::new();
        let mut next = Some(self.url.clone());

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else {
                break;
            };
            let page = self.fetch_page(&url).await?;
            tags.extend(page.results.into_iter().map(|t| t.name));
            next = page.next.filter(|n| !n.is_empty());
        }

        debug!(count = tags.len(), "Registry tags fetched");
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_tag_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/repositories/jangdokang/poabot/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 3,
                "next": null,
                "results": [{"name": "latest"}, {"name": "1.2.0"}, {"name": "1.10.0"}]
            })))
            .mount(&server)
            .await;

        let registry = DockerHubRegistry::new(format!(
            "{}/v2/repositories/jangdokang/poabot/tags?page_size=100",
            server.uri()
        ));
        let tags = registry.list_tags().await.unwrap();
        assert_eq!(tags, vec!["latest", "1.2.0", "1.10.0"]);
    }

    #[tokio::test]
    async fn follows_next_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tags"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "next": null,
                "results": [{"name": "1.0.0"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tags"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "next": format!("{}/tags?page=2", server.uri()),
                "results": [{"name": "1.1.0"}]
            })))
            .mount(&server)
            .await;

        let registry = DockerHubRegistry::new(format!("{}/tags?page=1", server.uri()));
        assert_eq!(registry.list_tags().await.unwrap(), vec!["1.1.0", "1.0.0"]);
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let registry = DockerHubRegistry::new(format!("{}/tags", server.uri()));
        let err = registry.list_tags().await.unwrap_err();
        assert!(matches!(err, RegistryError::HttpStatus { status: 503 }));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let registry = DockerHubRegistry::new(format!("{}/tags", server.uri()));
        assert!(matches!(
            registry.list_tags().await.unwrap_err(),
            RegistryError::ParseError(_)
        ));
    }
}
