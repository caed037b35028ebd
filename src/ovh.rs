//! OVH API client for DNS zone operations
//!
//! Uses reqwest with rustls for HTTP requests. Every call is signed with
//! the application secret and consumer key as the OVH API requires:
//!
//! ```text
//! X-Ovh-Signature = "$1$" + hex(sha1(AS + "+" + CK + "+" + METHOD + "+" + URL + "+" + BODY + "+" + TIMESTAMP))
//! ```
//!
//! Timestamps are taken from the API clock (`GET /auth/time`) so that local
//! clock drift does not invalidate signatures.

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio::sync::OnceCell;
use tracing::debug;
use urlencoding::encode;
use zeroize::Zeroizing;

use crate::constants::{
    HTTP_STATUS_FORBIDDEN, HTTP_STATUS_NOT_FOUND, HTTP_STATUS_TOO_MANY_REQUESTS,
    HTTP_STATUS_UNAUTHORIZED, OVH_SIGNATURE_PREFIX, OVH_USER_AGENT,
};
use crate::zone_api::{NewRecord, RawRecord, ZoneApi};

//==============================================================================
// Types
//==============================================================================

/// Application and consumer credentials for the OVH API
///
/// The consumer key must be granted `GET`, `POST` and `DELETE` on
/// `/domain/zone/<zone>/*`.
#[derive(Clone)]
pub struct OvhCredentials {
    pub application_key: String,
    pub application_secret: Zeroizing<String>,
    pub consumer_key: Zeroizing<String>,
}

impl fmt::Debug for OvhCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OvhCredentials")
            .field("application_key", &self.application_key)
            .field("application_secret", &"***")
            .field("consumer_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    #[serde(default)]
    class: Option<String>,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "[{}] {}", class, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: u64,
}

//==============================================================================
// Client
//==============================================================================

pub struct OvhClient {
    base_url: String,
    credentials: OvhCredentials,
    client: reqwest::Client,
    /// Seconds to add to the local clock to get the API clock
    time_delta: OnceCell<i64>,
}

impl OvhClient {
    pub fn new(base_url: &str, credentials: OvhCredentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(OVH_USER_AGENT)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
            time_delta: OnceCell::new(),
        })
    }

    fn record_path(zone: &str) -> String {
        format!("/domain/zone/{}/record", encode(zone))
    }

    /// Computes the request signature for the given timestamp
    fn sign(&self, method: &Method, url: &str, body: &str, timestamp: i64) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.credentials.application_secret.as_bytes());
        for part in [
            self.credentials.consumer_key.as_str(),
            method.as_str(),
            url,
            body,
            timestamp.to_string().as_str(),
        ] {
            hasher.update(b"+");
            hasher.update(part.as_bytes());
        }
        format!("{}{}", OVH_SIGNATURE_PREFIX, hex::encode(hasher.finalize()))
    }

    /// Current API time, synchronizing with `/auth/time` on first use
    async fn timestamp(&self) -> Result<i64> {
        let delta = self
            .time_delta
            .get_or_try_init(|| async {
                let url = format!("{}/auth/time", self.base_url);
                debug!("GET {}", url);
                let resp = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .context("GET /auth/time failed")?;
                let server_time: i64 = check_status(resp)
                    .await?
                    .parse()
                    .context("Failed to parse API time")?;
                anyhow::Ok(server_time - Utc::now().timestamp())
            })
            .await?;
        Ok(Utc::now().timestamp() + delta)
    }

    /// Sends a signed request and returns the raw response body
    async fn call_raw(&self, method: Method, path: &str, body: Option<String>) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let body = body.unwrap_or_default();
        let timestamp = self.timestamp().await?;
        let signature = self.sign(&method, &url, &body, timestamp);

        debug!("{} {}", method, path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("X-Ovh-Application", &self.credentials.application_key)
            .header("X-Ovh-Consumer", self.credentials.consumer_key.as_str())
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature);
        if !body.is_empty() {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("{method} {path} request failed"))?;
        check_status(resp)
            .await
            .with_context(|| format!("{method} {path}"))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T> {
        let text = self.call_raw(method, path, body).await?;
        serde_json::from_str(&text).context("Failed to parse response")
    }
}

/// Maps non-2xx responses to errors and returns the body otherwise
async fn check_status(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let text = resp.text().await.context("Failed to read response body")?;
    if status.is_success() {
        return Ok(text);
    }

    let detail = serde_json::from_str::<ApiError>(&text)
        .map(|e| e.to_string())
        .unwrap_or_else(|_| text.trim().to_string());
    match status.as_u16() {
        HTTP_STATUS_UNAUTHORIZED => bail!("Authentication failed (HTTP 401): {}", detail),
        HTTP_STATUS_FORBIDDEN => bail!("Permission denied (HTTP 403): {}", detail),
        HTTP_STATUS_NOT_FOUND => bail!("Not found (HTTP 404): {}", detail),
        HTTP_STATUS_TOO_MANY_REQUESTS => bail!("Rate limited by OVH: {}", detail),
        _ if status.is_server_error() => bail!("OVH server error: {}: {}", status.as_u16(), detail),
        _ => bail!("API error (HTTP {}): {}", status.as_u16(), detail),
    }
}

#[async_trait]
impl ZoneApi for OvhClient {
    async fn list(&self, zone: &str) -> Result<Vec<RawRecord>> {
        let path = Self::record_path(zone);
        let ids: Vec<u64> = self.call(Method::GET, &path, None).await?;
        debug!("Zone {} lists {} records", zone, ids.len());

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record: RawRecord = self
                .call(Method::GET, &format!("{path}/{id}"), None)
                .await
                .with_context(|| format!("fetch record {id}"))?;
            records.push(record);
        }
        Ok(records)
    }

    async fn create(&self, zone: &str, record: &NewRecord) -> Result<u64> {
        let payload = serde_json::to_string(record)?;
        let created: CreatedRecord = self
            .call(Method::POST, &Self::record_path(zone), Some(payload))
            .await?;
        Ok(created.id)
    }

    async fn delete(&self, zone: &str, id: u64) -> Result<()> {
        let path = format!("{}/{}", Self::record_path(zone), id);
        self.call_raw(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn refresh(&self, zone: &str) -> Result<()> {
        let path = format!("/domain/zone/{}/refresh", encode(zone));
        self.call_raw(Method::POST, &path, None).await?;
        Ok(())
    }
}

//==============================================================================
// Tests
//==============================================================================
