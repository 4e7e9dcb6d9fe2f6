use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::UNKNOWN_ERROR_CODE;

use super::error::ApiError;

/// Shared plumbing behind every typed client: one HTTP client, the
/// rest-server base URI, and the bearer token presented on
/// authenticated routes.
#[derive(Debug, Clone)]
pub(crate) struct Http {
    client: Client,
    base_uri: String,
    token: String,
}

impl Http {
    pub(crate) fn new(base_uri: impl Into<String>, token: impl Into<String>) -> Self {
        let base_uri = base_uri.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_uri,
            token: token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_uri, path);
        let mut builder = self.client.request(method, url);
        if !self.token.is_empty() {
            builder = builder.bearer_auth(&self.token);
        }
        builder
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        Self::decode(path, response).await
    }

    /// GET for routes whose success body is plain text, not JSON.
    pub(crate) async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self.request(Method::GET, path).send().await?;
        let response = Self::check(path, response).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::decode(path, response).await
    }

    /// POST with no request body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path).send().await?;
        Self::decode(path, response).await
    }

    /// POST an urlencoded form, as the basic login route expects.
    pub(crate) async fn post_form<B, T>(&self, path: &str, form: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).form(form).send().await?;
        Self::decode(path, response).await
    }

    /// POST a YAML document verbatim, as the job submission route expects.
    pub(crate) async fn post_yaml<T: DeserializeOwned>(
        &self,
        path: &str,
        yaml: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .request(Method::POST, path)
            .header("content-type", "text/yaml")
            .body(yaml.to_string())
            .send()
            .await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::decode(path, response).await
    }

    async fn check(path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        debug!(%status, path, "rest-server response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::error_from_body(status, &body))
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
        let response = Self::check(path, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        // Some mutating routes reply with an empty body on success.
        let bytes: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Decodes the service's `{code, message}` error body. Anything that
    /// does not match that shape is kept verbatim as the message.
    fn error_from_body(status: StatusCode, body: &str) -> ApiError {
        #[derive(Deserialize)]
        struct ErrorBody {
            code: String,
            message: String,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ApiError::Response {
                status: status.as_u16(),
                code: parsed.code,
                message: parsed.message,
            },
            Err(_) => ApiError::Response {
                status: status.as_u16(),
                code: UNKNOWN_ERROR_CODE.to_string(),
                message: body.to_string(),
            },
        }
    }
}
