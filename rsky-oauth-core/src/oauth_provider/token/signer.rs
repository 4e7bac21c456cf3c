use crate::oauth_provider::account::subject::{Claim, CLAIM_AUTH_TIME, CLAIM_CLIENT_ID};
use crate::oauth_provider::client::client::AccessTokenType;
use crate::oauth_provider::config::SigningOptions;
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::token::token::{Token, TOKEN_TYPE_ACCESS_TOKEN, TOKEN_TYPE_ID_TOKEN};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const JWT_TYPE_ACCESS_TOKEN: &str = "at+jwt";

/// Signs and verifies self-contained tokens with the provider's HMAC key.
pub struct Signer {
    pub issuer: String,
    key_id: Option<String>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Signer {
    pub fn new(issuer: impl Into<String>, options: &SigningOptions) -> Self {
        Signer {
            issuer: issuer.into(),
            key_id: options.key_id.clone(),
            encoding_key: EncodingKey::from_secret(&options.secret),
            decoding_key: DecodingKey::from_secret(&options.secret),
        }
    }

    pub fn sign(&self, token: &Token) -> Result<String, OAuthError> {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = self.key_id.clone();
        if token.access_token_type == AccessTokenType::Jwt
            && token.token_type == TOKEN_TYPE_ACCESS_TOKEN
        {
            header.typ = Some(JWT_TYPE_ACCESS_TOKEN.to_string());
        }
        encode(&header, &to_payload(token), &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            OAuthError::RuntimeError(format!("Failed to sign token: {e}"))
        })
    }

    /// Verify signature, issuer and expiry, and optionally the audience. Returns
    /// the token rebuilt from its payload.
    pub fn verify(&self, jwt: &str, audience: Option<&str>) -> Result<Token, OAuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        match audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        let data = decode::<Map<String, Value>>(jwt, &self.decoding_key, &validation)
            .map_err(|e| OAuthError::InvalidTokenError(format!("Invalid JWT: {e}")))?;
        let typ = data.header.typ.unwrap_or_default();
        from_payload(data.claims, &typ)
    }
}

fn to_payload(token: &Token) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("iss".to_string(), Value::from(token.issuer.clone()));
    match token.audiences.as_slice() {
        [] => {}
        [single] => {
            payload.insert("aud".to_string(), Value::from(single.clone()));
        }
        many => {
            payload.insert("aud".to_string(), Value::from(many.to_vec()));
        }
    }
    let iat = token.creation_time.timestamp();
    payload.insert("iat".to_string(), Value::from(iat));
    payload.insert("nbf".to_string(), Value::from(iat));
    payload.insert("exp".to_string(), Value::from(token.expiration().timestamp()));
    payload.insert(CLAIM_CLIENT_ID.to_string(), Value::from(token.client_id.clone()));

    let mut grouped: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
    for claim in token.claims.iter().filter(|c| c.claim_type != CLAIM_CLIENT_ID) {
        grouped
            .entry(claim.claim_type.as_str())
            .or_default()
            .push(claim_value(claim));
    }
    for (claim_type, mut values) in grouped {
        let value = if values.len() == 1 && claim_type != "scope" && claim_type != "amr" {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        payload.insert(claim_type.to_string(), value);
    }
    payload
}

fn claim_value(claim: &Claim) -> Value {
    if claim.claim_type == CLAIM_AUTH_TIME {
        if let Ok(seconds) = claim.value.parse::<i64>() {
            return Value::from(seconds);
        }
    }
    Value::from(claim.value.clone())
}

fn from_payload(mut payload: Map<String, Value>, typ: &str) -> Result<Token, OAuthError> {
    let malformed = || OAuthError::InvalidTokenError("Malformed token payload".to_string());

    let issuer = payload
        .remove("iss")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(malformed)?;
    let exp = payload.remove("exp").and_then(|v| v.as_i64()).ok_or_else(malformed)?;
    let iat = payload.remove("iat").and_then(|v| v.as_i64()).unwrap_or(exp);
    payload.remove("nbf");
    let client_id = payload
        .remove(CLAIM_CLIENT_ID)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let audiences = match payload.remove("aud") {
        Some(Value::String(aud)) => vec![aud],
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => vec![],
    };
    let creation_time = DateTime::<Utc>::from_timestamp(iat, 0).ok_or_else(malformed)?;

    let mut claims = vec![];
    for (claim_type, value) in payload {
        match value {
            Value::Array(values) => {
                for value in values {
                    claims.push(Claim::new(claim_type.clone(), value_to_string(value)));
                }
            }
            value => claims.push(Claim::new(claim_type, value_to_string(value))),
        }
    }

    let token_type = if typ == JWT_TYPE_ACCESS_TOKEN {
        TOKEN_TYPE_ACCESS_TOKEN
    } else {
        TOKEN_TYPE_ID_TOKEN
    };
    let mut token = Token::new(token_type, client_id, creation_time);
    token.issuer = issuer;
    token.audiences = audiences;
    token.lifetime = (exp - iat).max(0) as u64;
    token.claims = claims;
    Ok(token)
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn access_token() -> Token {
        let mut token = Token::new(TOKEN_TYPE_ACCESS_TOKEN, "client", Utc::now());
        token.issuer = "https://localhost".to_string();
        token.lifetime = 3600;
        token.audiences = vec!["api".to_string()];
        token.claims = vec![
            Claim::new("sub", "bob"),
            Claim::new("scope", "api1"),
            Claim::new("scope", "openid"),
            Claim::new("jti", "abc"),
        ];
        token
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = Signer::new("https://localhost", &SigningOptions::default());
        let jwt = signer.sign(&access_token()).unwrap();
        let token = signer.verify(&jwt, Some("api")).unwrap();
        assert_eq!(token.token_type, TOKEN_TYPE_ACCESS_TOKEN);
        assert_eq!(token.client_id, "client");
        assert_eq!(token.subject_id(), Some("bob"));
        assert_eq!(
            token.scopes(),
            BTreeSet::from(["api1".to_string(), "openid".to_string()])
        );
        assert_eq!(token.lifetime, 3600);
    }

    #[test]
    fn test_verify_rejects_other_key_and_audience() {
        let signer = Signer::new("https://localhost", &SigningOptions::default());
        let jwt = signer.sign(&access_token()).unwrap();
        assert!(signer.verify(&jwt, Some("other")).is_err());

        let other = Signer::new(
            "https://localhost",
            &SigningOptions {
                secret: b"another-secret".to_vec(),
                key_id: None,
            },
        );
        assert!(matches!(
            other.verify(&jwt, None),
            Err(OAuthError::InvalidTokenError(_))
        ));
    }
}
