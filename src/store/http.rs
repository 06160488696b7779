//! HTTP implementation of the signage API channels.
//!
//! Speaks the JSON-LD flavoured REST API (`/v1/...`) with [`reqwest`].
//! Every failure is folded into an [`ErrorDetail`] so callers can surface it
//! the same way whether the request never left the machine or the server
//! rejected it.

use crate::config::ApiConfig;
use crate::model::{
    ErrorDetail, Id, Screen, ScreenGroup, UpdateRegionPlaylistsRequest, UpdateScreenGroupRequest,
    UpdateScreenGroupsRequest, UpdateScreenRequest,
};
use crate::store::traits::{ScreenGroupChannel, ScreenReader, WriteChannel};
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const JSON_LD: &str = "application/ld+json";

pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApiClient {
    /// Client with default settings against `base_url`, e.g. `http://host:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, None)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling across clients).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.token.clone(),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, JSON_LD);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ErrorDetail> {
        let response = Self::ensure_success(builder.send().await.map_err(transport)?).await?;
        response.json::<T>().await.map_err(transport)
    }

    async fn send_ack(builder: RequestBuilder) -> Result<(), ErrorDetail> {
        Self::ensure_success(builder.send().await.map_err(transport)?).await?;
        Ok(())
    }

    /// Pass a 2xx response through; turn anything else into an [`ErrorDetail`]
    /// carrying the status and whatever body the server sent.
    async fn ensure_success(response: Response) -> Result<Response, ErrorDetail> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let data = if body.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(&body)
                    .unwrap_or_else(|_| serde_json::json!({ "message": body })),
            )
        };
        log::debug!("API responded {}: {}", status, body);
        Err(ErrorDetail::http(status.as_u16(), data))
    }
}

fn transport(err: reqwest::Error) -> ErrorDetail {
    ErrorDetail::transport(err.to_string())
}

#[async_trait::async_trait]
impl ScreenReader for HttpApiClient {
    async fn get_screen(&self, id: &Id) -> Result<Screen, ErrorDetail> {
        Self::send_json(self.request(Method::GET, &format!("/v1/screens/{}", id))).await
    }
}

#[async_trait::async_trait]
impl WriteChannel for HttpApiClient {
    async fn update_screen(&self, request: UpdateScreenRequest) -> Result<Screen, ErrorDetail> {
        let builder = self
            .request(Method::PUT, &format!("/v1/screens/{}", request.id))
            .json(&request.body);
        Self::send_json(builder).await
    }

    async fn update_screen_groups(&self, request: UpdateScreenGroupsRequest) -> Result<(), ErrorDetail> {
        let builder = self
            .request(Method::PUT, &format!("/v1/screens/{}/screen-groups", request.id))
            .json(&request.body);
        Self::send_ack(builder).await
    }

    async fn update_region_playlists(
        &self,
        request: UpdateRegionPlaylistsRequest,
    ) -> Result<(), ErrorDetail> {
        let path = format!(
            "/v1/screens/{}/regions/{}/playlists",
            request.screen_id, request.region_id
        );
        let builder = self.request(Method::PUT, &path).json(&request.body);
        Self::send_ack(builder).await
    }
}

#[async_trait::async_trait]
impl ScreenGroupChannel for HttpApiClient {
    async fn get_screen_group(&self, id: &Id) -> Result<ScreenGroup, ErrorDetail> {
        Self::send_json(self.request(Method::GET, &format!("/v1/screen-groups/{}", id))).await
    }

    async fn update_screen_group(
        &self,
        request: UpdateScreenGroupRequest,
    ) -> Result<ScreenGroup, ErrorDetail> {
        let builder = self
            .request(Method::PUT, &format!("/v1/screen-groups/{}", request.id))
            .json(&request.body);
        Self::send_json(builder).await
    }
}
