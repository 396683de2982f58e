use crate::config::CrmConfig;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url, header::ACCEPT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::crm::CrmClient;

const APP_KEY_HEADER: &str = "X-Auth-App-Key";

/// HTTP client for the UCRM / UISP CRM REST API.
#[derive(Debug)]
pub struct UcrmApi {
    client: Client,
    endpoint: Url,
    app_key: String,
}

impl UcrmApi {
    pub fn new(config: &CrmConfig) -> Result<Self> {
        if config.app_key.trim().is_empty() {
            bail!("CRM app key is not configured");
        }

        let mut endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("invalid CRM endpoint {:?}", config.endpoint))?;
        if endpoint.cannot_be_a_base() {
            bail!("CRM endpoint {} cannot be used as a base URL", endpoint);
        }
        // Url::join replaces the last segment unless the base ends with a slash
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            app_key: config.app_key.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.endpoint
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid CRM path {:?}", path))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(APP_KEY_HEADER, &self.app_key)
            .header(ACCEPT, "application/json")
    }
}

#[async_trait]
impl CrmClient for UcrmApi {
    fn name(&self) -> &'static str {
        "UCRM"
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path)?;
        info!("CRM Request URL: GET {}", url);

        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await
            .with_context(|| format!("failed to GET {} from CRM API", path))?
            .error_for_status() // 4xx/5xx → error
            .with_context(|| format!("error status from CRM API for GET {}", path))?
            .text()
            .await
            .context("Failed to get response body")?;

        debug!("CRM Response: {}", resp);
        parse_body(&resp)
    }

    #[tracing::instrument(skip(self, body))]
    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path)?;
        info!("CRM Request URL: POST {}", url);
        debug!("CRM Request: {}", body);

        let resp = self
            .authorized(self.client.post(url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to POST {} to CRM API", path))?
            .error_for_status()
            .with_context(|| format!("error status from CRM API for POST {}", path))?
            .text()
            .await
            .context("Failed to get response body")?;

        debug!("CRM Response: {}", resp);
        parse_body(&resp)
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).context("CRM API returned invalid JSON")
}
