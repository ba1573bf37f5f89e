use crate::config::Credentials;
use crate::error::KlingError;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Lifetime of a signed token, in seconds.
const TOKEN_TTL_SECS: i64 = 1800;
/// Clock skew allowance applied to `nbf`.
const NOT_BEFORE_SKEW_SECS: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub exp: i64,
    pub nbf: i64,
}

/// Produces the value for the `Authorization: Bearer` header.
pub fn bearer_token(credentials: &Credentials) -> Result<String, KlingError> {
    match credentials {
        Credentials::ApiKey(key) => Ok(key.clone()),
        Credentials::AccessKey {
            access_key,
            secret_key,
        } => sign_token(access_key, secret_key),
    }
}

fn sign_token(access_key: &str, secret_key: &str) -> Result<String, KlingError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: access_key.to_string(),
        exp: now + TOKEN_TTL_SECS,
        nbf: now - NOT_BEFORE_SKEW_SECS,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn api_key_is_passed_through() {
        let token = bearer_token(&Credentials::ApiKey("plain-key".into())).unwrap();
        assert_eq!(token, "plain-key");
    }

    #[test]
    fn access_key_pair_is_signed_with_the_secret() {
        let creds = Credentials::AccessKey {
            access_key: "ak".into(),
            secret_key: "sk".into(),
        };
        let token = bearer_token(&creds).unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"sk"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims.iss, "ak");
        assert_eq!(
            decoded.claims.exp - decoded.claims.nbf,
            TOKEN_TTL_SECS + NOT_BEFORE_SKEW_SECS
        );

        let wrong_key = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(wrong_key.is_err());
    }
}
