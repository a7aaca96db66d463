//! Marketplace REST client

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ConversationSummary, Message, NewOffer, Offer};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned {status}")]
    Status { path: String, status: StatusCode },
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid conversation id {0:?}")]
    InvalidId(String),
    #[error("http client setup failed: {0}")]
    Setup(#[source] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the sync worker needs from the backend
#[async_trait::async_trait]
pub trait MarketplaceApi: Send + Sync + 'static {
    /// `GET /conversations`
    async fn list_conversations(&self) -> ApiResult<Vec<ConversationSummary>>;

    /// `POST /conversations/{id}/read`
    async fn mark_read(&self, conversation_id: &str) -> ApiResult<()>;

    /// `GET /conversations/{id}/messages`
    async fn list_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>>;

    /// `POST /conversations/{id}/messages`
    async fn send_message(&self, conversation_id: &str, content: &str) -> ApiResult<Message>;

    /// `GET /offers`
    async fn list_offers(&self) -> ApiResult<Vec<Offer>>;

    /// `POST /offers`
    async fn create_offer(&self, offer: &NewOffer) -> ApiResult<Offer>;
}

/// List endpoints answer either with a bare array or `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) | ListBody::Wrapped { data: items } => items,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    content: &'a str,
}

/// `/conversations/{id}/{tail}`, refusing ids that would leave that path
fn conversation_path(conversation_id: &str, tail: &str) -> ApiResult<String> {
    let unsafe_id = conversation_id.is_empty()
        || conversation_id == "."
        || conversation_id == ".."
        || conversation_id
            .chars()
            .any(|ch| matches!(ch, '/' | '\\' | '?' | '#' | '%') || ch.is_whitespace());
    if unsafe_id {
        return Err(ApiError::InvalidId(conversation_id.to_string()));
    }
    Ok(format!("/conversations/{conversation_id}/{tail}"))
}

/// reqwest-backed implementation
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, token: Option<String>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(ApiError::Setup)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        debug!(path, "api request");
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> ApiResult<T> {
        response.json::<T>().await.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let response = self.execute(path, self.http.get(self.url(path))).await?;
        let body: ListBody<T> = Self::decode(path, response).await?;
        Ok(body.into_vec())
    }
}

#[async_trait::async_trait]
impl MarketplaceApi for HttpApi {
    async fn list_conversations(&self) -> ApiResult<Vec<ConversationSummary>> {
        self.get_list("/conversations").await
    }

    async fn mark_read(&self, conversation_id: &str) -> ApiResult<()> {
        let path = conversation_path(conversation_id, "read")?;
        self.execute(&path, self.http.post(self.url(&path))).await?;
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str) -> ApiResult<Vec<Message>> {
        let path = conversation_path(conversation_id, "messages")?;
        self.get_list(&path).await
    }

    async fn send_message(&self, conversation_id: &str, content: &str) -> ApiResult<Message> {
        let path = conversation_path(conversation_id, "messages")?;
        let request = self.http.post(self.url(&path)).json(&SendBody { content });
        let response = self.execute(&path, request).await?;
        Self::decode(&path, response).await
    }

    async fn list_offers(&self) -> ApiResult<Vec<Offer>> {
        self.get_list("/offers").await
    }

    async fn create_offer(&self, offer: &NewOffer) -> ApiResult<Offer> {
        let path = "/offers";
        let request = self.http.post(self.url(path)).json(offer);
        let response = self.execute(path, request).await?;
        Self::decode(path, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_body_accepts_both_shapes() {
        let bare: ListBody<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);

        let wrapped: ListBody<u32> = serde_json::from_str(r#"{ "data": [3] }"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![3]);
    }

    #[test]
    fn test_base_url_and_token_normalized() {
        let api = HttpApi::new("http://localhost:5000/api/", Some("  ".to_string())).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(api.url("/offers"), "http://localhost:5000/api/offers");
        assert!(api.token.is_none());
    }

    #[test]
    fn test_conversation_path_rejects_traversal() {
        assert_eq!(
            conversation_path("65f0c1a2", "read").unwrap(),
            "/conversations/65f0c1a2/read"
        );
        for id in ["../offers", "..", "", "a/b", "c1?x=1", "c1#frag", "c%2F", "c 1"] {
            assert!(
                matches!(conversation_path(id, "read"), Err(ApiError::InvalidId(_))),
                "{id:?} should be rejected"
            );
        }
    }
}
