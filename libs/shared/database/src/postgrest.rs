use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum DbError {
    /// Unique-constraint violation (HTTP 409 / Postgres 23505). Surfaced as
    /// its own variant so services can map it onto their Conflict results.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("store error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Thin client for the PostgREST interface of the relational store. The
/// store is the single source of truth shared by all requests; nothing is
/// cached here.
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    anon_key: HeaderValue,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        let anon_key = HeaderValue::from_str(&config.supabase_anon_key)
            .unwrap_or_else(|_| HeaderValue::from_static(""));

        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key,
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", self.anon_key.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    /// Same as `request` but with extra headers, used for PostgREST `Prefer:`
    /// directives (return=representation, resolution=merge-duplicates).
    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers(auth_token);
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
            error!("Store error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DbError::Auth(error_text),
                StatusCode::NOT_FOUND => DbError::NotFound(error_text),
                StatusCode::CONFLICT => DbError::Conflict(error_text),
                _ => DbError::Api {
                    status: status.as_u16(),
                    body: error_text,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Call a Postgres function exposed under `/rest/v1/rpc/`. This is the
    /// seam for operations that must commit atomically (the function body
    /// runs in a single transaction).
    pub async fn rpc<T>(
        &self,
        function: &str,
        auth_token: Option<&str>,
        args: Value,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, auth_token, Some(args))
            .await
    }

    /// Insert a row and return its stored representation.
    pub async fn insert_returning<T>(
        &self,
        path: &str,
        auth_token: Option<&str>,
        body: Value,
    ) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::POST, path, auth_token, Some(body), Some(headers))
            .await
    }

    /// Patch rows matching the path's filters and return the updated
    /// representations. An empty result means no row matched the filters.
    pub async fn update_returning<T>(
        &self,
        path: &str,
        auth_token: Option<&str>,
        body: Value,
    ) -> Result<Vec<T>, DbError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::PATCH, path, auth_token, Some(body), Some(headers))
            .await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
