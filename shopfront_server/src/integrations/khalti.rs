//! Adapts the Khalti e-payment client to the engine's gateway interface.
use std::str::FromStr;

use khalti_tools::{AmountBreakdown, CustomerInfo, KhaltiApi, KhaltiApiError, PaymentSessionRequest, ProductDetail};
use shopfront_common::Money;
use shopfront_engine::traits::{
    GatewayError,
    GatewayLookup,
    GatewaySession,
    GatewaySessionRequest,
    GatewayStatus,
    PaymentGateway,
};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct KhaltiGateway {
    api: KhaltiApi,
}

impl KhaltiGateway {
    pub fn new(config: &ServerConfig) -> Result<Self, KhaltiApiError> {
        let api = KhaltiApi::new(config.khalti.clone())?;
        Ok(Self { api })
    }
}

impl PaymentGateway for KhaltiGateway {
    async fn initiate(&self, request: GatewaySessionRequest) -> Result<GatewaySession, GatewayError> {
        let config = self.api.config();
        let wire = PaymentSessionRequest {
            return_url: config.return_url.clone(),
            website_url: config.website_url.clone(),
            amount: request.amount.value(),
            purchase_order_id: request.order_number.to_string(),
            purchase_order_name: request.order_name.clone(),
            customer_info: CustomerInfo {
                name: request.customer.name.clone(),
                email: request.customer.email.clone(),
                phone: request.customer.phone.clone(),
            },
            amount_breakdown: vec![AmountBreakdown {
                label: request.order_name.clone(),
                amount: request.amount.value(),
            }],
            product_details: request
                .items
                .iter()
                .map(|i| ProductDetail::new(&i.product_id.to_string(), &i.name, i.unit_price, i.quantity))
                .collect(),
        };
        let session = self.api.initiate(&wire).await.map_err(gateway_error)?;
        Ok(GatewaySession {
            pidx: session.pidx,
            payment_url: session.payment_url,
            expires_at: session.expires_at,
            expires_in: session.expires_in,
        })
    }

    async fn lookup(&self, pidx: &str) -> Result<GatewayLookup, GatewayError> {
        let lookup = self.api.lookup(pidx).await.map_err(gateway_error)?;
        let status = GatewayStatus::from_str(&lookup.status)?;
        Ok(GatewayLookup {
            pidx: lookup.pidx,
            status,
            transaction_id: lookup.transaction_id,
            total_amount: Money::from(lookup.total_amount),
            fee: Money::from(lookup.fee),
            refunded: lookup.refunded,
        })
    }
}

fn gateway_error(e: KhaltiApiError) -> GatewayError {
    match e {
        KhaltiApiError::Timeout => GatewayError::Timeout,
        KhaltiApiError::JsonError(m) => GatewayError::InvalidResponse(m),
        KhaltiApiError::UnknownStatus(s) => GatewayError::UnknownStatus(s),
        e => GatewayError::RequestFailed(e.to_string()),
    }
}
