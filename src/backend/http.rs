//! HTTP client for the remote modulation service.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{AnalogRequest, AnalogResponse, DigitalRequest, DigitalResponse, ErrorBody};
use super::ModulationBackend;
use crate::config::BackendConfig;
use crate::error::{ScopeError, ScopeResult};

/// Posts JSON requests to the analog and digital endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    analog_url: String,
    digital_url: String,
}

impl HttpBackend {
    pub fn from_config(config: &BackendConfig) -> ScopeResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            analog_url: config.analog_url.clone(),
            digital_url: config.digital_url.clone(),
        })
    }

    async fn post<Req, Resp>(&self, url: &str, body: &Req) -> ScopeResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        tracing::debug!(url, "posting modulation request");
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<Resp>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::warn!(url, %status, "modulation service returned an error");
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(body.into()),
            Err(_) if status == StatusCode::BAD_REQUEST => Err(ScopeError::Backend(text)),
            Err(_) => Err(ScopeError::Backend(format!("{} from {}", status, url))),
        }
    }
}

#[async_trait]
impl ModulationBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn analog(&self, request: &AnalogRequest) -> ScopeResult<AnalogResponse> {
        self.post(&self.analog_url, request).await
    }

    async fn digital(&self, request: &DigitalRequest) -> ScopeResult<DigitalResponse> {
        self.post(&self.digital_url, request).await
    }
}
