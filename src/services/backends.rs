// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Backend service client (token check, available balance).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{BackendApi, ClientError};
use crate::models::User;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstream responses arrive wrapped in a `{result}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub(crate) fn build_url(&self, resource_path: &str) -> String {
        if resource_path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, resource_path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status { status: status.as_u16(), body });
    }
    response
        .json()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl BackendApi for Client {
    async fn user_check(&self, token: &str) -> Result<User, ClientError> {
        let envelope: ResultEnvelope<User> = self
            .get_json(&self.build_url("auth/check"), &[("token", token)])
            .await?;
        Ok(envelope.result)
    }

    async fn available_balance(&self, token: &str) -> Result<u64, ClientError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {token}")
            .parse()
            .map_err(|_| ClientError::Transport("invalid bearer token".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        let envelope: ResultEnvelope<u64> = self
            .post_json(
                &self.build_url("reserve/get-available-withdraw"),
                headers,
                &json!({}),
            )
            .await?;
        Ok(envelope.result)
    }
}
