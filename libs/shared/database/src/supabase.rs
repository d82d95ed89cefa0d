use std::time::Duration;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION_CODE: &str = "23505";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SupabaseError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SupabaseError::Timeout
        } else if e.is_decode() {
            SupabaseError::Decode(e.to_string())
        } else {
            SupabaseError::Http(e.to_string())
        }
    }
}

/// Map a non-success PostgREST response onto an error kind.
pub fn classify_error(status: StatusCode, body: &str) -> SupabaseError {
    let pg_code = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("code").and_then(Value::as_str).map(str::to_string));

    if status == StatusCode::CONFLICT || pg_code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
        return SupabaseError::UniqueViolation(body.to_string());
    }

    match status.as_u16() {
        401 | 403 => SupabaseError::Auth(body.to_string()),
        404 => SupabaseError::NotFound(body.to_string()),
        408 | 504 => SupabaseError::Timeout,
        code => SupabaseError::Api {
            status: code,
            message: body.to_string(),
        },
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let timeout = Duration::from_secs(config.storage_timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with timeout ({}), using defaults", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.anon_key))
                .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?,
        );

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = classify_error(status, &error_text);
            match &err {
                SupabaseError::UniqueViolation(_) => {
                    debug!("Unique constraint rejected write to {}: {}", path, error_text)
                }
                _ => error!("API error ({}): {}", status, error_text),
            }
            return Err(err);
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
