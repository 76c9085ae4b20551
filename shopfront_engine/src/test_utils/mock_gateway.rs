use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use shopfront_common::Money;

use crate::traits::{
    GatewayError,
    GatewayLookup,
    GatewaySession,
    GatewaySessionRequest,
    GatewayStatus,
    PaymentGateway,
};

#[derive(Debug, Default)]
struct GatewayState {
    sessions: HashMap<String, GatewayLookup>,
    next_pidx: u64,
    fail_next_initiate: bool,
}

/// A scripted payment gateway. `initiate` mints sessions in the `Initiated` state; tests then
/// move them along with [`MockGateway::set_status`] to simulate the customer paying, cancelling,
/// or the session expiring.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `initiate` call will fail with a timeout.
    pub fn fail_next_initiate(&self) {
        self.state.lock().unwrap().fail_next_initiate = true;
    }

    /// Moves a session to `status`, attaching `transaction_id` (the gateway assigns one when a
    /// payment completes).
    pub fn set_status(&self, pidx: &str, status: GatewayStatus, transaction_id: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        if let Some(lookup) = state.sessions.get_mut(pidx) {
            lookup.status = status;
            lookup.transaction_id = transaction_id.map(String::from);
            lookup.refunded = matches!(status, GatewayStatus::Refunded | GatewayStatus::PartiallyRefunded);
        }
    }

    /// Registers a session the mock did not mint itself, for driving the lookup path directly.
    pub fn script_lookup(&self, lookup: GatewayLookup) {
        self.state.lock().unwrap().sessions.insert(lookup.pidx.clone(), lookup);
    }

    /// Test-side peek at a session's current state. Panics on an unknown pidx.
    pub fn lookup_unchecked(&self, pidx: &str) -> GatewayLookup {
        self.state.lock().unwrap().sessions.get(pidx).cloned().expect("unknown pidx")
    }
}

impl PaymentGateway for MockGateway {
    async fn initiate(&self, request: GatewaySessionRequest) -> Result<GatewaySession, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_initiate {
            state.fail_next_initiate = false;
            return Err(GatewayError::Timeout);
        }
        state.next_pidx += 1;
        let pidx = format!("pidx-{:04}", state.next_pidx);
        state.sessions.insert(pidx.clone(), GatewayLookup {
            pidx: pidx.clone(),
            status: GatewayStatus::Initiated,
            transaction_id: None,
            total_amount: request.amount,
            fee: Money::default(),
            refunded: false,
        });
        Ok(GatewaySession {
            pidx: pidx.clone(),
            payment_url: format!("https://gateway.test/pay/{pidx}"),
            expires_at: Utc::now() + Duration::minutes(30),
            expires_in: 1800,
        })
    }

    async fn lookup(&self, pidx: &str) -> Result<GatewayLookup, GatewayError> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .get(pidx)
            .cloned()
            .ok_or_else(|| GatewayError::RequestFailed(format!("No session with pidx {pidx}")))
    }
}
