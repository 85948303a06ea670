//! Token exchange against the cloud identity service.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use verstbot_core::ServiceAccountKey;

use crate::claims::{TokenClaims, sign_claims};
use crate::error::AuthError;

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce a fresh bearer token.
///
/// The production implementation is [`IamTokenSource`]; tests inject fakes to
/// observe how often the cache actually reaches for the network.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn issue(&self) -> Result<String, AuthError>;
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    jwt: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResponse {
    iam_token: String,
}

/// Exchanges a PS256-signed claim set for a bearer token over HTTP.
pub struct IamTokenSource {
    http: Client,
    endpoint: String,
    key: ServiceAccountKey,
}

impl IamTokenSource {
    pub fn new(key: ServiceAccountKey, endpoint: impl Into<String>) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(EXCHANGE_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            key,
        })
    }
}

#[async_trait]
impl TokenSource for IamTokenSource {
    async fn issue(&self) -> Result<String, AuthError> {
        let claims = TokenClaims::for_account(&self.key, &self.endpoint, Utc::now());
        let jwt = sign_claims(&self.key, &claims)?;

        debug!(endpoint = %self.endpoint, "exchanging signed claims for a bearer token");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ExchangeRequest { jwt: &jwt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let body: ExchangeResponse = response.json().await?;
        Ok(body.iam_token)
    }
}
