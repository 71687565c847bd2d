//! Bearer-token principal extraction.
//!
//! Tokens are HS256 JWTs minted by the identity provider, which shares the
//! signing secret with this service. The `sub` claim carries the user id.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::error::ServiceError;
use crate::models::UserId;
use crate::routes::AppState;

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies access tokens against the shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<String>, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_secs;
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
        }
    }

    /// Verify a token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<UserId, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::warn!("Rejected access token: {}", e);
            ServiceError::Unauthorized("Invalid or expired token".to_string())
        })?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ServiceError::Unauthorized("Token subject is not a user id".to_string()))
    }

    /// Mint a token for `user_id`. Used by the identity provider's tooling
    /// and by tests.
    pub fn issue(&self, user_id: UserId, ttl: Duration) -> Result<String, ServiceError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(signing_failure)
    }
}

fn signing_failure(e: jsonwebtoken::errors::Error) -> ServiceError {
    ServiceError::Internal(format!("Failed to sign token: {}", e))
}

/// The verified identity of the calling user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
}

fn extract_principal(req: &HttpRequest) -> Result<Principal, ServiceError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ServiceError::Unauthorized("Authentication is not configured".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))?;

    let user_id = state.auth.verify(token.trim())?;

    Ok(Principal { user_id })
}

impl FromRequest for Principal {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_principal(req))
    }
}
