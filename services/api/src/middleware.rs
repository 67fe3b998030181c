//! Authentication middleware for JWT token validation
//!
//! Tokens are issued by the hosted identity provider; this service only
//! verifies them. The verified identity is stored in request extensions as an
//! [`AuthUser`]. Role checks happen later, in [`crate::guard`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Metadata captured at signup and carried in the token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Role chosen at signup
    pub role: Option<String>,
    pub full_name: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    /// Issued at time
    pub iat: Option<u64>,
    /// Expiration time
    pub exp: u64,
}

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub metadata: UserMetadata,
}

/// How tokens are signed
#[derive(Debug, Clone)]
pub enum JwtKey {
    /// Shared secret, HS256
    Secret(String),
    /// RSA public key in PEM format, RS256
    PublicKey(String),
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub key: JwtKey,
    /// Expected `aud` claim, if any
    pub audience: Option<String>,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: shared HS256 secret; takes precedence when set
    /// - `JWT_PUBLIC_KEY`: RS256 public key (PEM) or path to a PEM file
    /// - `JWT_AUDIENCE`: expected audience (optional)
    pub fn from_env() -> Result<Self, String> {
        let audience = env::var("JWT_AUDIENCE").ok();

        if let Ok(secret) = env::var("JWT_SECRET") {
            return Ok(JwtConfig {
                key: JwtKey::Secret(secret),
                audience,
            });
        }

        let public_key = env::var("JWT_PUBLIC_KEY")
            .map_err(|_| "Neither JWT_SECRET nor JWT_PUBLIC_KEY is set".to_string())?;

        // If the public key looks like a file path, read from file (try CWD, then project root)
        let public_key = if public_key.starts_with("-----BEGIN") {
            public_key
        } else {
            std::fs::read_to_string(&public_key)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&public_key);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| format!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Ok(JwtConfig {
            key: JwtKey::PublicKey(public_key),
            audience,
        })
    }
}

/// Verifies bearer tokens; built once at startup
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        let (decoding_key, algorithm) = match &config.key {
            JwtKey::Secret(secret) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            JwtKey::PublicKey(pem) => (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Validate a token and return the authenticated user
    pub fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Failed to validate token: {}", e);
                ApiError::Unauthenticated
            })?;

        Ok(AuthUser {
            id: token_data.claims.sub,
            email: token_data.claims.email,
            metadata: token_data.claims.user_metadata,
        })
    }
}

/// Authentication middleware: rejects requests without a valid bearer token
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthenticated)?;

    let user = state.jwt_verifier.verify(bearer.token())?;

    // Insert the user into the request extensions
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Like [`auth_middleware`] but lets anonymous requests through
///
/// An invalid token is treated the same as no token.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        match state.jwt_verifier.verify(bearer.token()) {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(_) => debug!("Ignoring invalid bearer token on public route"),
        }
    }

    next.run(req).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            error!("AuthUser requested on a route without auth_middleware");
            ApiError::Unauthenticated
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) const TEST_SECRET: &str = "test-secret-for-campus-hub";

    pub(crate) fn test_verifier() -> JwtVerifier {
        JwtVerifier::new(&JwtConfig {
            key: JwtKey::Secret(TEST_SECRET.to_string()),
            audience: None,
        })
        .unwrap()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    pub(crate) fn token_for(user_id: Uuid, role: Option<&str>, expires_in: i64) -> String {
        let claims = serde_json::json!({
            "sub": user_id,
            "email": "student@campus.edu",
            "user_metadata": { "role": role, "full_name": "Sam Student" },
            "aud": "authenticated",
            "iat": now(),
            "exp": (now() as i64 + expires_in) as u64,
        });

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn verifies_valid_token() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, Some("organizer"), 3600);

        let user = test_verifier().verify(&token).unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.email.as_deref(), Some("student@campus.edu"));
        assert_eq!(user.metadata.role.as_deref(), Some("organizer"));
    }

    #[test]
    fn rejects_expired_token() {
        let token = token_for(Uuid::new_v4(), None, -3600);
        assert!(matches!(
            test_verifier().verify(&token),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let claims = serde_json::json!({ "sub": Uuid::new_v4(), "exp": now() + 600 });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"someone-else"),
        )
        .unwrap();

        assert!(test_verifier().verify(&token).is_err());
    }

    #[test]
    fn enforces_audience_when_configured() {
        let verifier = JwtVerifier::new(&JwtConfig {
            key: JwtKey::Secret(TEST_SECRET.to_string()),
            audience: Some("campus-hub".to_string()),
        })
        .unwrap();

        let token = token_for(Uuid::new_v4(), None, 600);
        assert!(verifier.verify(&token).is_err());
    }
}
