//! REST client for a single member endpoint.

mod types;

pub use types::{
    AccountResponse, LedgerInfoResponse, SubmitTransferRequest, SubmitTransferResponse,
    TransactionStatusResponse,
};

use crate::error::ClientError;
use localnet_types::LedgerSnapshot;
use reqwest::StatusCode;
use std::time::Duration;

/// HTTP client bound to one member's REST API.
///
/// Every request carries a hard timeout so a single unresponsive member
/// cannot stall the orchestration.
#[derive(Clone, Debug)]
pub struct MemberClient {
    http: reqwest::Client,
    base_url: String,
}

impl MemberClient {
    /// Create a client for the member API at `base_url`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// The member API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a fresh ledger snapshot from `GET /v1`.
    pub async fn ledger_info(&self) -> Result<LedgerSnapshot, ClientError> {
        let url = format!("{}/v1", self.base_url);
        let info: LedgerInfoResponse = self.get_json(&url).await?;
        Ok(info.into())
    }

    /// Fetch account state (sequence number, balance).
    pub async fn account(&self, address: &str) -> Result<AccountResponse, ClientError> {
        let url = format!("{}/v1/accounts/{}", self.base_url, address);
        self.get_json(&url).await
    }

    /// Fetch the spendable balance of `address`.
    pub async fn balance(&self, address: &str) -> Result<u64, ClientError> {
        Ok(self.account(address).await?.balance)
    }

    /// Fetch the next sequence number for `address`.
    pub async fn sequence_number(&self, address: &str) -> Result<u64, ClientError> {
        Ok(self.account(address).await?.sequence_number)
    }

    /// Submit a signed transfer to `POST /v1/transactions`.
    pub async fn submit_transfer(
        &self,
        request: &SubmitTransferRequest,
    ) -> Result<SubmitTransferResponse, ClientError> {
        let url = format!("{}/v1/transactions", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;
        Self::check_status(&url, response)
            .await?
            .json()
            .await
            .map_err(|source| ClientError::Http { url, source })
    }

    /// Look up a committed transaction by hash. `None` until included.
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionStatusResponse>, ClientError> {
        let url = format!("{}/v1/transactions/by_hash/{}", self.base_url, hash);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check_status(&url, response)
            .await?
            .json()
            .await
            .map(Some)
            .map_err(|source| ClientError::Http { url, source })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.to_string(),
                source,
            })?;
        Self::check_status(url, response)
            .await?
            .json()
            .await
            .map_err(|source| ClientError::Http {
                url: url.to_string(),
                source,
            })
    }

    async fn check_status(
        url: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
