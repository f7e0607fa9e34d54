//! HTTP client for the platform API.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use modelwatch_core::ApiUrl;
use modelwatch_core::error::{
    AuthorizationError, Error, ServerError, TransportError, ValidationError,
};

use crate::endpoints::ApiErrorBody;

/// HTTP client pinned to one platform API base URL.
///
/// The client classifies responses into the crate's error taxonomy and
/// nothing more: policy actions such as token deletion or redirects belong
/// to the session manager.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    api: ApiUrl,
}

impl RestClient {
    /// Create a new client for the given API base URL.
    pub fn new(api: ApiUrl) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("modelwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self { client, api }
    }

    /// Returns the API base URL this client is configured for.
    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// Make an unauthenticated POST request.
    #[instrument(skip(self, body), fields(api = %self.api))]
    pub(crate) async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.api.endpoint_url(path);
        debug!(path, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// Make an authenticated GET request.
    #[instrument(skip(self, token), fields(api = %self.api))]
    pub(crate) async fn get_authed<R>(&self, path: &str, token: &str) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let url = self.api.endpoint_url(path);
        debug!(path, "authenticated GET");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers(token))
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request.
    #[instrument(skip(self, body, token), fields(api = %self.api))]
    pub(crate) async fn post_authed<B, R>(
        &self,
        path: &str,
        body: &B,
        token: &str,
    ) -> Result<R, Error>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.api.endpoint_url(path);
        debug!(path, "authenticated POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .headers(self.auth_headers(token))
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request with no request body.
    /// Used for endpoints like refresh that don't accept one.
    #[instrument(skip(self, token), fields(api = %self.api))]
    pub(crate) async fn post_authed_no_body<R>(&self, path: &str, token: &str) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let url = self.api.endpoint_url(path);
        debug!(path, "authenticated POST (no body)");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// Make an authenticated POST request whose response body is ignored.
    #[instrument(skip(self, token), fields(api = %self.api))]
    pub(crate) async fn post_authed_empty(&self, path: &str, token: &str) -> Result<(), Error> {
        let url = self.api.endpoint_url(path);
        debug!(path, "authenticated POST (no response)");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.error_from_response(response).await)
        }
    }

    /// Create authorization headers for authenticated requests.
    fn auth_headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).expect("invalid token characters"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Handle a response, parsing the body or classifying the error.
    async fn handle_response<R: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<R, Error> {
        let status = response.status();
        trace!(status = %status, "response");

        if status.is_success() {
            let body = response.json::<R>().await.map_err(transport_error)?;
            Ok(body)
        } else {
            Err(self.error_from_response(response).await)
        }
    }

    /// Classify a non-success response into the error taxonomy.
    async fn error_from_response(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let detail = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail_message());

        match status {
            401 | 403 => Error::Authorization(AuthorizationError::new(status, detail)),
            500..=599 => Error::Server(ServerError::new(status, detail)),
            _ => Error::Validation(ValidationError::new(status, detail)),
        }
    }
}

/// Map a reqwest failure into the transport error class.
fn transport_error(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}
