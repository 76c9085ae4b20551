use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::KhaltiConfig,
    data_objects::{PaymentLookup, PaymentSession, PaymentSessionRequest},
    KhaltiApiError,
};

#[derive(Clone)]
pub struct KhaltiApi {
    config: KhaltiConfig,
    client: Arc<Client>,
}

impl KhaltiApi {
    pub fn new(config: KhaltiConfig) -> Result<Self, KhaltiApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let key = format!("key {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&key).map_err(|e| KhaltiApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| KhaltiApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &KhaltiConfig {
        &self.config
    }

    async fn post_query<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, KhaltiApiError> {
        let url = self.url(path);
        trace!("Sending gateway query: {url}");
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            if e.is_timeout() {
                KhaltiApiError::Timeout
            } else {
                KhaltiApiError::RequestError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("Gateway query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| KhaltiApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| KhaltiApiError::RequestError(e.to_string()))?;
            Err(KhaltiApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Opens a payment session on the gateway, returning the `pidx` session handle and redirect URL.
    pub async fn initiate(&self, request: &PaymentSessionRequest) -> Result<PaymentSession, KhaltiApiError> {
        debug!("Initiating payment session for order {}", request.purchase_order_id);
        let session: PaymentSession = self.post_query("/epayment/initiate/", request).await?;
        info!("Payment session {} opened for order {}", session.pidx, request.purchase_order_id);
        Ok(session)
    }

    /// Fetches the gateway's view of the payment. This is the ground truth for reconciliation.
    pub async fn lookup(&self, pidx: &str) -> Result<PaymentLookup, KhaltiApiError> {
        #[derive(Serialize)]
        struct LookupRequest<'a> {
            pidx: &'a str,
        }
        debug!("Looking up payment session {pidx}");
        let result: PaymentLookup = self.post_query("/epayment/lookup/", &LookupRequest { pidx }).await?;
        trace!("Lookup for {pidx} returned status {}", result.status);
        Ok(result)
    }
}
