use std::time::Duration;

use engine_logging::engine_warn;
use grabber_core::Candidate;
use reqwest::header::{AUTHORIZATION, COOKIE, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;

use crate::{ClaimOutcome, Credentials, ListResponse, TransportError, TransportFailure};

/// Application code the service uses for "ok".
const SUCCESS_CODE: i64 = 0;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// The listing is read one page at a time and only the first page is used.
    pub page_size: u32,
    pub list_path: String,
    pub claim_path: String,
    pub user_info_path: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(5),
            page_size: 30,
            list_path: "/prod-api/lws/agentOrder/rushOrderList".to_string(),
            claim_path: "/prod-api/lws/agentOrder/rushOrder".to_string(),
            user_info_path: "/prod-api/getInfo".to_string(),
        }
    }
}

/// The remote calls the poll loop depends on.
#[async_trait::async_trait]
pub trait ClaimClient: Send + Sync {
    async fn list_candidates(
        &self,
        site: &str,
        min_price: u64,
        max_price: u64,
        credentials: &Credentials,
    ) -> Result<ListResponse, TransportError>;

    async fn claim(
        &self,
        site: &str,
        order_id: &str,
        credentials: &Credentials,
    ) -> Result<ClaimOutcome, TransportError>;

    async fn user_info(
        &self,
        _site: &str,
        _credentials: &Credentials,
    ) -> Result<serde_json::Value, TransportError> {
        Err(TransportError::new(
            TransportFailure::Network,
            "account info is not available from this client",
        ))
    }
}

#[derive(Deserialize)]
struct ListBody {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<ListData>,
}

#[derive(Deserialize)]
struct ListData {
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ClaimBody {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestClaimClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestClaimClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(TransportFailure::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn get(
        &self,
        site: &str,
        path: &str,
        credentials: &Credentials,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let url = endpoint(site, path)?;
        let mut request = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.bearer_token));
        if !credentials.user_agent.is_empty() {
            request = request.header(USER_AGENT, credentials.user_agent.as_str());
        }
        if let Some(cookies) = credentials.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        Ok(request)
    }

    async fn send_for_body(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<bytes::Bytes, TransportError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                TransportFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        response.bytes().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl ClaimClient for ReqwestClaimClient {
    async fn list_candidates(
        &self,
        site: &str,
        min_price: u64,
        max_price: u64,
        credentials: &Credentials,
    ) -> Result<ListResponse, TransportError> {
        let request = self
            .get(site, &self.settings.list_path, credentials)?
            .query(&[
                ("pageNum", 1),
                ("pageSize", u64::from(self.settings.page_size)),
                ("startAmount", min_price),
                ("endAmount", max_price),
            ]);
        let body: ListBody = decode(&self.send_for_body(request).await?)?;

        if body.code != SUCCESS_CODE {
            return Ok(ListResponse::Rejected {
                code: body.code,
                reason: body.msg.unwrap_or_default(),
            });
        }

        let records = body.data.map(|data| data.records).unwrap_or_default();
        let candidates = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Candidate>(record) {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    engine_warn!("Skipping undecodable order record: {}", err);
                    None
                }
            })
            .collect();
        Ok(ListResponse::Candidates(candidates))
    }

    async fn claim(
        &self,
        site: &str,
        order_id: &str,
        credentials: &Credentials,
    ) -> Result<ClaimOutcome, TransportError> {
        let request = self
            .get(site, &self.settings.claim_path, credentials)?
            .query(&[("orderNo", order_id)]);
        let body: ClaimBody = decode(&self.send_for_body(request).await?)?;

        if body.code == SUCCESS_CODE {
            Ok(ClaimOutcome::Success)
        } else {
            let reason = body
                .msg
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| format!("application code {}", body.code));
            Ok(ClaimOutcome::Failure(reason))
        }
    }

    async fn user_info(
        &self,
        site: &str,
        credentials: &Credentials,
    ) -> Result<serde_json::Value, TransportError> {
        let request = self.get(site, &self.settings.user_info_path, credentials)?;
        decode(&self.send_for_body(request).await?)
    }
}

fn endpoint(site: &str, path: &str) -> Result<Url, TransportError> {
    let base = site.trim().trim_end_matches('/');
    Url::parse(&format!("{base}{path}"))
        .map_err(|err| TransportError::new(TransportFailure::InvalidUrl, err.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(bytes)
        .map_err(|err| TransportError::new(TransportFailure::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportFailure::Timeout, err.to_string());
    }
    TransportError::new(TransportFailure::Network, err.to_string())
}
