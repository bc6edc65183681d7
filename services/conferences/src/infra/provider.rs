use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context as _, bail};
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use tokio::sync::OnceCell;
use tracing::warn;

use crate::domain::repository::ConferenceProvider;
use crate::domain::types::{CallHistory, retain_phone_numbers};
use crate::error::ConfServiceError;

/// Credentials and tuning for the provider API.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// API root without trailing slash (e.g. "https://eu.api.ovh.com/1.0").
    pub endpoint: String,
    pub app_key: String,
    pub app_secret: String,
    pub consumer_key: String,
    /// Telephony billing account owning the conference numbers.
    pub account: String,
    pub timeout: Duration,
    /// Extra attempts for idempotent calls on transport errors and 5xx.
    pub max_retries: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InformationsDto {
    members_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryDto {
    id: u64,
    date_begin: DateTime<FixedOffset>,
    date_end: DateTime<FixedOffset>,
    count_participants: i32,
    count_connections: i32,
    duration: i32,
}

impl From<HistoryDto> for CallHistory {
    fn from(dto: HistoryDto) -> Self {
        CallHistory {
            call_id: dto.id,
            date_begin: dto.date_begin.with_timezone(&Utc),
            date_end: dto.date_end.with_timezone(&Utc),
            count_participants: dto.count_participants,
            count_connections: dto.count_connections,
            duration_minutes: dto.duration,
        }
    }
}

/// `"$1$" + sha1(secret+consumer+METHOD+url+body+timestamp)`, fields joined by `+`.
pub fn sign(
    app_secret: &str,
    consumer_key: &str,
    method: &Method,
    url: &str,
    body: &str,
    timestamp: i64,
) -> String {
    let payload = format!("{app_secret}+{consumer_key}+{method}+{url}+{body}+{timestamp}");
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    format!("$1${:x}", hasher.finalize())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Signed HTTP client for the provider's telephony conference API.
#[derive(Clone)]
pub struct OvhConferenceProvider {
    http: Client,
    settings: ProviderSettings,
    /// Provider clock minus local clock, fetched once.
    time_delta: std::sync::Arc<OnceCell<i64>>,
}

impl OvhConferenceProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfServiceError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ConfServiceError::provider("build HTTP client", e))?;
        Ok(Self {
            http,
            settings,
            time_delta: Default::default(),
        })
    }

    fn conference_path(&self, rest: &str) -> String {
        format!("/telephony/{}/conference{rest}", self.settings.account)
    }

    async fn timestamp(&self) -> anyhow::Result<i64> {
        let delta = self
            .time_delta
            .get_or_try_init(|| async {
                let url = format!("{}/auth/time", self.settings.endpoint);
                let server_time: i64 = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .and_then(Response::error_for_status)
                    .context("GET /auth/time")?
                    .json()
                    .await
                    .context("decode /auth/time")?;
                Ok::<_, anyhow::Error>(server_time - unix_now())
            })
            .await?;
        Ok(unix_now() + delta)
    }

    async fn send_once(&self, method: &Method, url: &str, body: &str) -> anyhow::Result<Response> {
        let timestamp = self.timestamp().await?;
        let signature = sign(
            &self.settings.app_secret,
            &self.settings.consumer_key,
            method,
            url,
            body,
            timestamp,
        );
        let mut request = self
            .http
            .request(method.clone(), url)
            .header("X-Ovh-Application", &self.settings.app_key)
            .header("X-Ovh-Consumer", &self.settings.consumer_key)
            .header("X-Ovh-Timestamp", timestamp.to_string())
            .header("X-Ovh-Signature", signature)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if !body.is_empty() {
            request = request.body(body.to_owned());
        }
        Ok(request.send().await?)
    }

    /// Send a signed request. GET and PUT are retried on transport errors and
    /// 5xx; the final response is returned whatever its status.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<Response> {
        let url = format!("{}{path}", self.settings.endpoint);
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let retries = if method == Method::GET || method == Method::PUT {
            self.settings.max_retries
        } else {
            0
        };

        let mut attempt = 0;
        loop {
            let outcome = self.send_once(&method, &url, &body).await;
            let retryable = match &outcome {
                Ok(resp) => resp.status().is_server_error(),
                Err(_) => true,
            };
            if !retryable || attempt >= retries {
                return outcome.with_context(|| format!("{method} {path}"));
            }
            attempt += 1;
            match &outcome {
                Ok(resp) => {
                    warn!(%method, path, status = %resp.status(), attempt, "retrying provider call");
                }
                Err(e) => {
                    let chain = format!("{e:#}");
                    warn!(%method, path, error = %chain, attempt, "retrying provider call");
                }
            }
            tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
        }
    }

    async fn expect_success(
        method: &Method,
        path: &str,
        resp: Response,
    ) -> anyhow::Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        bail!("{method} {path} returned {status}: {text}")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self.send(Method::GET, path, None).await?;
        let resp = Self::expect_success(&Method::GET, path, resp).await?;
        resp.json()
            .await
            .with_context(|| format!("decode GET {path}"))
    }
}

impl ConferenceProvider for OvhConferenceProvider {
    async fn list_phone_numbers(&self) -> Result<Vec<String>, ConfServiceError> {
        let path = self.conference_path("");
        let entries: Vec<String> = self
            .get_json(&path)
            .await
            .map_err(|e| ConfServiceError::provider("list phone numbers", e))?;
        Ok(retain_phone_numbers(entries))
    }

    async fn online_participants(&self, phone_number: &str) -> Result<u32, ConfServiceError> {
        let path = self.conference_path(&format!("/{phone_number}/informations"));
        let result: anyhow::Result<u32> = async {
            let resp = self.send(Method::GET, &path, None).await?;
            // The provider answers 404 while nobody is connected.
            if resp.status() == StatusCode::NOT_FOUND {
                return Ok(0);
            }
            let resp = Self::expect_success(&Method::GET, &path, resp).await?;
            let info: InformationsDto = resp
                .json()
                .await
                .with_context(|| format!("decode GET {path}"))?;
            Ok(info.members_count)
        }
        .await;
        result.map_err(|e| ConfServiceError::provider("online participants", e))
    }

    async fn set_pin(&self, phone_number: &str, pin: &str) -> Result<(), ConfServiceError> {
        let path = self.conference_path(&format!("/{phone_number}/settings"));
        let body = serde_json::json!({ "pin": pin, "recordStatus": false });
        let result: anyhow::Result<()> = async {
            let resp = self.send(Method::PUT, &path, Some(body)).await?;
            Self::expect_success(&Method::PUT, &path, resp).await?;
            Ok(())
        }
        .await;
        result.map_err(|e| ConfServiceError::provider("change pin", e))
    }

    async fn participant_ids(&self, phone_number: &str) -> Result<Vec<u64>, ConfServiceError> {
        let path = self.conference_path(&format!("/{phone_number}/participants"));
        self.get_json(&path)
            .await
            .map_err(|e| ConfServiceError::provider("list participants", e))
    }

    async fn kick_participant(
        &self,
        phone_number: &str,
        participant_id: u64,
    ) -> Result<(), ConfServiceError> {
        let path =
            self.conference_path(&format!("/{phone_number}/participants/{participant_id}/kick"));
        let result: anyhow::Result<()> = async {
            let resp = self.send(Method::POST, &path, None).await?;
            Self::expect_success(&Method::POST, &path, resp).await?;
            Ok(())
        }
        .await;
        result.map_err(|e| ConfServiceError::provider("kick participant", e))
    }

    async fn call_ids(&self, phone_number: &str) -> Result<Vec<u64>, ConfServiceError> {
        let path = self.conference_path(&format!("/{phone_number}/histories"));
        self.get_json(&path)
            .await
            .map_err(|e| ConfServiceError::provider("list call histories", e))
    }

    async fn call_history(
        &self,
        phone_number: &str,
        call_id: u64,
    ) -> Result<CallHistory, ConfServiceError> {
        let path = self.conference_path(&format!("/{phone_number}/histories/{call_id}"));
        let dto: HistoryDto = self
            .get_json(&path)
            .await
            .map_err(|e| ConfServiceError::provider("get call history", e))?;
        Ok(dto.into())
    }
}
