//! HTTP client for the K-Smart backend.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

/// Message shown when the backend gives no usable explanation.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

/// Message shown for failures that are worth retrying.
pub const TRANSIENT_FAILURE: &str =
    "Could not reach K-Smart, please check your connection and try again.";

/// Configuration for connecting to the backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `"https://api.ksmart.example"`.
    pub base_url: String,

    /// Bearer token for authenticated endpoints.
    pub token: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure, timeout or body decoding error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a business message.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,

        /// Response body, possibly empty
        body: String,
    },

    /// The backend refused the request on business grounds.
    #[error("request rejected: {}", message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Rejected {
        /// Message to show the member, if the backend sent one
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),

    /// The endpoint URL could not be built.
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            Self::Status { status, .. } => {
                *status >= 500
                    || *status == StatusCode::REQUEST_TIMEOUT.as_u16()
                    || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
            }
            Self::Rejected { .. } | Self::UnexpectedResponse(_) | Self::InvalidUrl(_) => false,
        }
    }

    /// Text to show the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            error if error.is_transient() => TRANSIENT_FAILURE.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Shape of the message the backend sends with a rejection.
#[derive(Debug, Deserialize)]
struct RejectionBody {
    message: Option<String>,
}

/// `{success, data, message}` envelope used by several endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default = "succeeded")]
    success: bool,

    #[serde(default)]
    message: Option<String>,

    data: Option<T>,
}

fn succeeded() -> bool {
    true
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into a rejection.
    pub(crate) fn into_data(self) -> Result<T, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected {
                message: self.message,
            });
        }

        self.data
            .ok_or_else(|| BackendError::UnexpectedResponse("missing data".to_string()))
    }
}

/// Shared HTTP client for all backend services.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base: Url,
    token: Option<String>,
    http: Client,
}

impl BackendClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.base_url)
            .map_err(|error| BackendError::InvalidUrl(format!("{}: {error}", config.base_url)))?;

        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url));
        }

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base,
            token: config.token,
            http,
        })
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if the base URL cannot take a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an unexpected body.
    pub async fn get<Q, T>(&self, segments: &[&str], query: &Q) -> Result<T, BackendError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;

        debug!(%url, "GET");

        let response = self.execute(self.http.get(url).query(query)).await?;

        Ok(response.json().await?)
    }

    /// Send a JSON body and decode a JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an unexpected body.
    pub async fn send<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;

        debug!(%url, %method, "sending");

        let response = self.execute(self.http.request(method, url).json(body)).await?;

        Ok(response.json().await?)
    }

    /// Send a request whose response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn send_unit<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<(), BackendError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;

        debug!(%url, %method, "sending");

        let mut request = self.http.request(method, url);

        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request).await?;

        Ok(())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        Err(classify_failure(status, body))
    }
}

/// Turn a non-success response into a [`BackendError`].
fn classify_failure(status: StatusCode, body: String) -> BackendError {
    let retryable = status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS;

    if status.is_client_error() && !retryable {
        if let Ok(RejectionBody {
            message: Some(message),
        }) = serde_json::from_str::<RejectionBody>(&body)
        {
            return BackendError::Rejected {
                message: Some(message),
            };
        }
    }

    BackendError::Status {
        status: status.as_u16(),
        body,
    }
}
