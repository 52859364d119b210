// 🌐 BrasilAPI Client - the four upstream collections
//
// Document numbers are validated locally first: a malformed CEP or CNPJ
// never reaches the network. Retryable failures (network, timeout, 5xx)
// are retried with doubling backoff; everything else fails at once.

use crate::config::ApiConfig;
use crate::documents::{postal_code, registry_number};
use crate::entities::{Address, Bank, Company, Rate};
use crate::error::{ApiError, Resource};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

pub const CEP_PATH: &str = "/cep/v2";
pub const BANKS_PATH: &str = "/banks/v1";
pub const CNPJ_PATH: &str = "/cnpj/v1";
pub const RATES_PATH: &str = "/taxas/v1";

#[derive(Debug, Clone)]
pub struct BrasilApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl BrasilApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("brasil-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(BrasilApiClient { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Address for a postal code (any punctuation accepted)
    pub async fn lookup_postal_code(&self, raw: &str) -> Result<Address, ApiError> {
        let code = postal_code::validate(raw).map_err(|e| ApiError::validation(&e, CEP_PATH))?;
        let path = format!("{}/{}", CEP_PATH, code.digits());
        self.get_json(Resource::PostalCode, &path).await
    }

    /// Company record for a registry number; check digits are verified first
    pub async fn lookup_company(&self, raw: &str) -> Result<Company, ApiError> {
        let number =
            registry_number::validate(raw).map_err(|e| ApiError::validation(&e, CNPJ_PATH))?;
        let path = format!("{}/{}", CNPJ_PATH, number.digits());
        self.get_json(Resource::RegistryNumber, &path).await
    }

    pub async fn list_banks(&self) -> Result<Vec<Bank>, ApiError> {
        self.get_json(Resource::Banks, BANKS_PATH).await
    }

    pub async fn list_rates(&self) -> Result<Vec<Rate>, ApiError> {
        self.get_json(Resource::Rates, RATES_PATH).await
    }

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        path: &str,
    ) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "brasilapi",
            %request_id,
            resource = resource.as_str(),
            path
        );

        async move {
            let mut attempt: u32 = 0;
            loop {
                match self.fetch_once(resource, path).await {
                    Ok(value) => {
                        tracing::debug!(attempt, "upstream call succeeded");
                        return Ok(value);
                    }
                    Err(error) if error.retryable && attempt < self.config.retries => {
                        attempt += 1;
                        let delay = self.config.backoff_for(attempt);
                        tracing::warn!(
                            code = error.code(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying upstream call"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    Err(error) => {
                        if error.retryable {
                            tracing::warn!(code = error.code(), status = ?error.http_status, "retryable error: {}", error.message);
                        } else {
                            tracing::error!(code = error.code(), status = ?error.http_status, "non-retryable error: {}", error.message);
                        }
                        return Err(error);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn fetch_once<T: DeserializeOwned>(
        &self,
        resource: Resource,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = self.config.url(path);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e, path))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(resource, status.as_u16(), path));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(path)
            } else {
                ApiError::decode(resource, path, e)
            }
        })
    }
}

fn transport_error(error: &reqwest::Error, endpoint: &str) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(endpoint)
    } else {
        ApiError::network(endpoint)
    }
}
