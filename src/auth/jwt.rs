use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token signing failed")]
    Signing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Doctor,
    Guest,
    Anonymous,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Doctor => "doctor",
            Role::Guest => "guest",
            Role::Anonymous => "anonymous",
        }
    }

    fn parse(s: &str) -> Role {
        match s {
            "user" => Role::User,
            "doctor" => Role::Doctor,
            "guest" => Role::Guest,
            _ => Role::Anonymous,
        }
    }

    /// Registered accounts have no AI quota.
    pub fn is_registered(&self) -> bool {
        matches!(self, Role::User | Role::Doctor)
    }
}

/// Verified token contents.
#[derive(Debug, Clone)]
pub struct Claims {
    pub user_id: Option<i64>,
    pub guest_id: Option<String>,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guest_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    /// Legacy claim: early tokens carried the user id as `sub`
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<i64>,
    exp: i64,
    iat: i64,
}

/// Issues and verifies HS256 tokens.
#[derive(Debug, Clone)]
pub struct JwtIssuer {
    secret: String,
    user_ttl: Duration,
    guest_ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>, user_ttl_hours: i64, guest_ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            user_ttl: Duration::hours(user_ttl_hours),
            guest_ttl: Duration::hours(guest_ttl_hours),
        }
    }

    pub fn user_ttl_secs(&self) -> i64 {
        self.user_ttl.num_seconds()
    }

    pub fn guest_ttl_secs(&self) -> i64 {
        self.guest_ttl.num_seconds()
    }

    /// Token for an authenticated account.
    pub fn create_token(&self, user_id: i64, role: Role) -> Result<String, AuthError> {
        self.sign(RawClaims {
            user_id: Some(user_id),
            guest_id: None,
            role: Some(role.as_str().to_string()),
            sub: None,
            exp: (Utc::now() + self.user_ttl).timestamp(),
            iat: Utc::now().timestamp(),
        })
    }

    /// Short-lived token for an unregistered guest.
    pub fn create_guest_token(&self, guest_id: &str) -> Result<String, AuthError> {
        self.sign(RawClaims {
            user_id: None,
            guest_id: Some(guest_id.to_string()),
            role: Some(Role::Guest.as_str().to_string()),
            sub: None,
            exp: (Utc::now() + self.guest_ttl).timestamp(),
            iat: Utc::now().timestamp(),
        })
    }

    fn sign(&self, claims: RawClaims) -> Result<String, AuthError> {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| AuthError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<RawClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::Invalid,
        })?;

        let raw = data.claims;
        let mut role = raw.role.as_deref().map(Role::parse).unwrap_or(Role::Anonymous);
        let mut user_id = raw.user_id;

        // Legacy tokens: numeric `sub`, no explicit role
        if user_id.is_none() {
            if let Some(sub) = raw.sub {
                user_id = Some(sub);
                if role == Role::Anonymous {
                    role = Role::User;
                }
            }
        }

        if user_id.is_none() && raw.guest_id.is_none() {
            return Err(AuthError::Invalid);
        }

        Ok(Claims {
            user_id,
            guest_id: raw.guest_id,
            role,
        })
    }

    #[cfg(test)]
    fn sign_raw(&self, claims: RawClaims) -> String {
        self.sign(claims).unwrap()
    }
}
