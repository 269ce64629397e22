use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.challonge.com/v1";

/// Status and raw body of one HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Anything above 300 counts as a rejection.
    pub fn is_failure(&self) -> bool {
        self.status > 300
    }
}

pub type Query = [(String, String)];

/// The four HTTP primitives the entity wrappers are built on. Paths are
/// relative to the API root, e.g. `tournaments/12.json`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str, query: &Query) -> Result<Response, Error>;
    async fn post(&self, path: &str, query: &Query, body: &Value) -> Result<Response, Error>;
    async fn put(&self, path: &str, query: &Query, body: &Value) -> Result<Response, Error>;
    async fn delete(&self, path: &str, query: &Query) -> Result<Response, Error>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()?,
            base_url: base_url.trim_end_matches('/').into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(Response { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Response, Error> {
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    async fn post(&self, path: &str, query: &Query, body: &Value) -> Result<Response, Error> {
        self.send(self.client.post(self.url(path)).query(query).json(body)).await
    }

    async fn put(&self, path: &str, query: &Query, body: &Value) -> Result<Response, Error> {
        self.send(self.client.put(self.url(path)).query(query).json(body)).await
    }

    async fn delete(&self, path: &str, query: &Query) -> Result<Response, Error> {
        self.send(self.client.delete(self.url(path)).query(query)).await
    }
}

/// The API key. Sent as the `api_key` query parameter on every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(api_key.into())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

impl From<&str> for Credential {
    fn from(api_key: &str) -> Self {
        Self::new(api_key)
    }
}

impl From<String> for Credential {
    fn from(api_key: String) -> Self {
        Self(api_key)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<String>,
}

/// A transport paired with the credential, shared by every wrapper that
/// came from the same client.
#[derive(Clone)]
pub(crate) struct Connection {
    credential: Credential,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub(crate) fn new(credential: Credential, transport: Arc<dyn Transport>) -> Self {
        Self {
            credential,
            transport,
        }
    }

    fn query(&self, params: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut query = vec![("api_key".to_string(), self.credential.0.clone())];
        query.extend(params);
        query
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<String, Error> {
        debug!(method = "GET", path, "challonge request");
        let response = self.transport.get(path, &self.query(params)).await?;
        Self::accept(response, path)
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<String, Error> {
        debug!(method = "POST", path, "challonge request");
        let response = self.transport.post(path, &self.query(vec![]), body).await?;
        Self::accept(response, path)
    }

    pub(crate) async fn put(&self, path: &str, body: &Value) -> Result<String, Error> {
        debug!(method = "PUT", path, "challonge request");
        let response = self.transport.put(path, &self.query(vec![]), body).await?;
        Self::accept(response, path)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<String, Error> {
        debug!(method = "DELETE", path, "challonge request");
        let response = self.transport.delete(path, &self.query(vec![])).await?;
        Self::accept(response, path)
    }

    /// Passes the body through, or turns a rejection into `Error::Remote`
    /// after logging each message the server sent.
    fn accept(response: Response, path: &str) -> Result<String, Error> {
        if !response.is_failure() {
            return Ok(response.body);
        }

        let messages = match serde_json::from_str::<ErrorBody>(&response.body) {
            Ok(body) => body.errors,
            Err(_) if response.body.trim().is_empty() => vec![format!("HTTP {}", response.status)],
            Err(_) => vec![response.body.trim().to_string()],
        };
        for message in &messages {
            error!(status = response.status, path, "{message}");
        }

        Err(Error::Remote {
            status: response.status,
            messages,
        })
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_http_transport_sends_key_and_body() {
        let mut server = mockito::Server::new_async().await;
        let transport = HttpTransport::new(&format!("{}/", server.url())).unwrap();
        let connection = Connection::new("asdf1234".into(), Arc::new(transport));

        let mock = server
            .mock("PUT", "/tournaments/9.json")
            .match_query(mockito::Matcher::UrlEncoded(
                "api_key".into(),
                "asdf1234".into(),
            ))
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(json!({"tournament": {"name": "Cup"}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tournament": {"id": 9, "name": "Cup"}}"#)
            .create_async()
            .await;

        let body = connection
            .put("tournaments/9.json", &json!({"tournament": {"name": "Cup"}}))
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(body, r#"{"tournament": {"id": 9, "name": "Cup"}}"#);
    }

    #[tokio::test]
    async fn test_http_transport_passes_filters() {
        let mut server = mockito::Server::new_async().await;
        let transport = HttpTransport::new(&server.url()).unwrap();
        let connection = Connection::new("asdf1234".into(), Arc::new(transport));

        let mock = server
            .mock("GET", "/tournaments.json")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("api_key".into(), "asdf1234".into()),
                mockito::Matcher::UrlEncoded("state".into(), "pending".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let body = connection
            .get("tournaments.json", vec![("state".into(), "pending".into())])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_rejection_surfaces_each_message() {
        let mut server = mockito::Server::new_async().await;
        let transport = HttpTransport::new(&server.url()).unwrap();
        let connection = Connection::new("asdf1234".into(), Arc::new(transport));

        let mock = server
            .mock("POST", "/tournaments/9/start.json")
            .match_query(mockito::Matcher::Any)
            .with_status(422)
            .with_body(r#"{"errors": ["Not enough participants", "Already started"]}"#)
            .create_async()
            .await;

        let err = connection
            .post("tournaments/9/start.json", &json!({}))
            .await
            .unwrap_err();
        mock.assert_async().await;

        match err {
            Error::Remote { status, messages } => {
                assert_eq!(status, 422);
                assert_eq!(messages, vec!["Not enough participants", "Already started"]);
            }
            other => panic!("expected a remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_without_error_list() {
        let err = Connection::accept(Response::new(500, ""), "tournaments.json").unwrap_err();
        assert!(
            matches!(err, Error::Remote { status: 500, ref messages } if messages == &["HTTP 500"])
        );

        let err = Connection::accept(Response::new(404, "Not Found"), "x.json").unwrap_err();
        assert!(
            matches!(err, Error::Remote { status: 404, ref messages } if messages == &["Not Found"])
        );

        assert_eq!(
            Connection::accept(Response::new(300, "{}"), "x.json").unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_credential_is_not_printed() {
        let credential = Credential::from("secret");
        assert_eq!(format!("{credential:?}"), "Credential(..)");
    }
}
