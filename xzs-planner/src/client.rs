//! Topic backend REST client
//!
//! [`TopicRepository`] and [`MaterialGenerator`] are the seams the views
//! and the workflow session depend on; [`HttpTopicClient`] implements both
//! against the backend's `/api` surface.

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use xzs_common::api::{
    CollectResponse, ErrorResponse, FavoriteToggleResponse, FavoritesFullResponse,
    GenerateMaterialsRequest, GenerateMaterialsResponse, Material, MarkDoneRequest, SkipRequest,
};
use xzs_common::topic::{DiscoveryStatus, TopicCandidate};

const USER_AGENT: &str = concat!("xzs-planner/", env!("CARGO_PKG_VERSION"));

/// Backend client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Topic records: discovery pool, favorites pool and their mutations
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// `GET /api/topics`
    async fn list_discovery(&self) -> Result<Vec<TopicCandidate>, ClientError>;

    /// `GET /api/favorites/full`
    async fn list_favorites(&self) -> Result<Vec<TopicCandidate>, ClientError>;

    /// `GET /api/status`
    async fn discovery_status(&self) -> Result<DiscoveryStatus, ClientError>;

    /// `POST /api/collect`
    async fn collect(&self) -> Result<CollectResponse, ClientError>;

    /// `POST /api/topics/{id}/favorite`, returns the new favorite state
    async fn toggle_favorite(&self, topic_id: &str) -> Result<bool, ClientError>;

    /// `POST /api/topics/done`
    async fn mark_done(&self, work_name: &str, dish_name: &str) -> Result<(), ClientError>;

    /// `POST /api/topics/skip`
    async fn skip(&self, request: &SkipRequest) -> Result<(), ClientError>;

    /// `GET /api/topics/{id}`
    async fn get_topic(&self, topic_id: &str) -> Result<TopicCandidate, ClientError>;
}

/// AI material generation for the materials step
#[async_trait]
pub trait MaterialGenerator: Send + Sync {
    /// `POST /api/workflow/{id}/generate-materials`
    async fn generate_materials(
        &self,
        topic_id: &str,
        request: &GenerateMaterialsRequest,
    ) -> Result<Vec<Material>, ClientError>;
}

/// reqwest-backed client for the topic backend
#[derive(Debug, Clone)]
pub struct HttpTopicClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpTopicClient {
    /// Create a client for `base_url` (e.g. "http://127.0.0.1:8000")
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Network(format!("Invalid base URL {}: {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::Network(format!("Invalid base URL {}", base_url)));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/api/<segments...>` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, ClientError> {
        debug!(url = %url, "GET");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_json(check_status(response, what).await?).await
    }
}

/// Map non-success responses to [`ClientError`], surfacing the `detail` body
async fn check_status(response: Response, what: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        let detail = if detail.is_empty() { what.to_string() } else { detail };
        return Err(ClientError::NotFound(detail));
    }

    Err(ClientError::Api(status.as_u16(), detail))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json()
        .await
        .map_err(|e| ClientError::Parse(e.to_string()))
}

#[async_trait]
impl TopicRepository for HttpTopicClient {
    async fn list_discovery(&self) -> Result<Vec<TopicCandidate>, ClientError> {
        self.get_json(self.endpoint(&["topics"]), "topics").await
    }

    async fn list_favorites(&self) -> Result<Vec<TopicCandidate>, ClientError> {
        let body: FavoritesFullResponse = self
            .get_json(self.endpoint(&["favorites", "full"]), "favorites")
            .await?;
        Ok(body.topics)
    }

    async fn discovery_status(&self) -> Result<DiscoveryStatus, ClientError> {
        self.get_json(self.endpoint(&["status"]), "status").await
    }

    async fn collect(&self) -> Result<CollectResponse, ClientError> {
        let url = self.endpoint(&["collect"]);
        debug!(url = %url, "POST");

        let response = self
            .http_client
            .post(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        parse_json(check_status(response, "collect").await?).await
    }

    async fn toggle_favorite(&self, topic_id: &str) -> Result<bool, ClientError> {
        let url = self.endpoint(&["topics", topic_id, "favorite"]);
        debug!(topic_id = %topic_id, url = %url, "POST");

        let response = self
            .http_client
            .post(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body: FavoriteToggleResponse =
            parse_json(check_status(response, topic_id).await?).await?;
        Ok(body.is_favorited)
    }

    async fn mark_done(&self, work_name: &str, dish_name: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["topics", "done"]);
        debug!(work_name = %work_name, url = %url, "POST");

        // The backend reads query parameters; the JSON body carries the same fields
        let body = MarkDoneRequest {
            work_name: work_name.to_string(),
            dish_name: dish_name.to_string(),
        };
        let response = self
            .http_client
            .post(url)
            .query(&[("work_name", work_name), ("dish_name", dish_name)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_status(response, work_name).await?;
        Ok(())
    }

    async fn skip(&self, request: &SkipRequest) -> Result<(), ClientError> {
        let url = self.endpoint(&["topics", "skip"]);
        debug!(topic_id = %request.topic_id, reason = request.reason.as_str(), url = %url, "POST");

        let response = self
            .http_client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_status(response, &request.topic_id).await?;
        Ok(())
    }

    async fn get_topic(&self, topic_id: &str) -> Result<TopicCandidate, ClientError> {
        self.get_json(self.endpoint(&["topics", topic_id]), topic_id)
            .await
    }
}

#[async_trait]
impl MaterialGenerator for HttpTopicClient {
    async fn generate_materials(
        &self,
        topic_id: &str,
        request: &GenerateMaterialsRequest,
    ) -> Result<Vec<Material>, ClientError> {
        let url = self.endpoint(&["workflow", topic_id, "generate-materials"]);
        debug!(topic_id = %topic_id, url = %url, "POST");

        let response = self
            .http_client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body: GenerateMaterialsResponse =
            parse_json(check_status(response, topic_id).await?).await?;
        Ok(body.materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments() {
        let client = HttpTopicClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(
            client.endpoint(&["topics", "abc", "favorite"]).as_str(),
            "http://127.0.0.1:8000/api/topics/abc/favorite"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpTopicClient::new("http://host.test/xzs/").unwrap();
        assert_eq!(
            client.endpoint(&["status"]).as_str(),
            "http://host.test/xzs/api/status"
        );
    }

    #[test]
    fn test_endpoint_encodes_topic_id() {
        let client = HttpTopicClient::new("http://host.test").unwrap();
        let url = client.endpoint(&["topics", "a b/c"]);
        assert_eq!(url.path(), "/api/topics/a%20b%2Fc");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpTopicClient::new("not a url"),
            Err(ClientError::Network(_))
        ));
        assert!(HttpTopicClient::new("mailto:someone@example.com").is_err());
    }
}
