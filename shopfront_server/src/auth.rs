//! Access-token handling.
//!
//! Access tokens are standard HS256 JWTs signed with the shared `SFS_JWT_SECRET`. Issuing normally
//! happens in the identity service at login time; [`TokenIssuer`] exists so that this server (and
//! its tests) can mint tokens with the same secret. Validation happens here, via the
//! [`JwtClaims`] extractor, which reads the `sfs_access_token` header.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shopfront_common::Secret;

use crate::{config::AuthConfig, errors::{AuthError, ServerError}};

pub const AUTH_HEADER: &str = "sfs_access_token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    #[serde(default)]
    pub admin: bool,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_claims(req))
    }
}

fn extract_claims(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let config = req
        .app_data::<web::Data<AuthConfig>>()
        .ok_or_else(|| ServerError::InitializeError("Auth configuration is not registered".to_string()))?;
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    let claims = validate_token(token, &config.jwt_secret)?;
    Ok(claims)
}

/// Verifies the token's signature and expiry and returns its claims.
pub fn validate_token(token: &str, secret: &Secret<String>) -> Result<JwtClaims, AuthError> {
    let mut parts = token.split('.');
    let (header_b64, claims_b64, sig_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s), None) => (h, c, s),
        _ => return Err(AuthError::PoorlyFormattedToken("Expected three dot-separated segments".to_string())),
    };
    let header = decode_segment(header_b64)?;
    let header: serde_json::Value =
        serde_json::from_slice(&header).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    if header.get("alg").and_then(|a| a.as_str()) != Some("HS256") {
        return Err(AuthError::ValidationError("Unsupported signing algorithm".to_string()));
    }
    let signature = decode_segment(sig_b64)?;
    let mut mac = new_mac(secret);
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature).map_err(|_| AuthError::ValidationError("Signature mismatch".to_string()))?;
    let claims = decode_segment(claims_b64)?;
    let claims: JwtClaims =
        serde_json::from_slice(&claims).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    if claims.exp <= Utc::now().timestamp() {
        return Err(AuthError::TokenExpired);
    }
    debug!("🔑️ Access token validated for user {}", claims.user_id);
    Ok(claims)
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Secret<String>,
    expiry: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.jwt_secret.clone(), expiry: config.token_expiry }
    }

    /// Mints a signed access token for the given user.
    pub fn issue_token(&self, user_id: i64, admin: bool) -> String {
        let claims = JwtClaims { user_id, admin, exp: (Utc::now() + self.expiry).timestamp() };
        sign_claims(&claims, &self.secret)
    }
}

pub fn sign_claims(claims: &JwtClaims, secret: &Secret<String>) -> String {
    let header = encode_segment(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = serde_json::to_vec(claims).unwrap_or_default();
    let payload = format!("{header}.{}", encode_segment(&body));
    let mut mac = new_mac(secret);
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();
    format!("{payload}.{}", encode_segment(&signature))
}

fn new_mac(secret: &Secret<String>) -> HmacSha256 {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    HmacSha256::new_from_slice(secret.reveal().as_bytes()).unwrap_or_else(|_| unreachable!())
}

fn encode_segment(bytes: &[u8]) -> String {
    base64::encode_config(bytes, base64::URL_SAFE_NO_PAD)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    base64::decode_config(segment, base64::URL_SAFE_NO_PAD)
        .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))
}
