use crate::oauth_provider::config::InputLengthRestrictions;
use crate::oauth_provider::request::request_parameters::RequestParameters;
use crate::oauth_types::CLIENT_ASSERTION_TYPE_JWT_BEARER;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::HeaderMap;

/// The credential a client presented, before it is checked against the client's
/// registered secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    SharedSecret(String),
    JwtBearer(String),
    X509Thumbprint(String),
    /// Public client identifying itself with `client_id` only
    NoSecret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSecret {
    pub client_id: String,
    pub credential: Credential,
}

impl ParsedSecret {
    pub fn method(&self) -> &'static str {
        match self.credential {
            Credential::SharedSecret(_) => "shared_secret",
            Credential::JwtBearer(_) => "private_key_jwt",
            Credential::X509Thumbprint(_) => "tls_client_auth",
            Credential::NoSecret => "none",
        }
    }
}

/// Extracts client credentials from a token request. The first method that finds a
/// credential wins, in this order: HTTP Basic, form body, JWT client assertion,
/// client certificate, bare `client_id`.
pub struct SecretParser {
    limits: InputLengthRestrictions,
}

impl SecretParser {
    pub fn new(limits: InputLengthRestrictions) -> Self {
        SecretParser { limits }
    }

    pub fn parse(
        &self,
        headers: &HeaderMap,
        parameters: &RequestParameters,
        certificate_thumbprint: Option<&str>,
    ) -> Option<ParsedSecret> {
        if let Some(parsed) = self.parse_basic(headers) {
            return Some(parsed);
        }
        if let Some(parsed) = self.parse_post_body(parameters) {
            return Some(parsed);
        }
        if let Some(parsed) = self.parse_jwt_bearer(parameters) {
            return Some(parsed);
        }
        let client_id = parameters
            .get("client_id")
            .filter(|id| id.len() <= self.limits.client_id)?;
        let credential = match certificate_thumbprint {
            Some(thumbprint) if !thumbprint.is_empty() => {
                Credential::X509Thumbprint(thumbprint.to_string())
            }
            _ => Credential::NoSecret,
        };
        Some(ParsedSecret {
            client_id: client_id.to_string(),
            credential,
        })
    }

    fn parse_basic(&self, headers: &HeaderMap) -> Option<ParsedSecret> {
        let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, value) = header.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(value.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (client_id, secret) = decoded.split_once(':')?;
        let client_id = form_decode(client_id)?;
        let secret = form_decode(secret)?;
        if client_id.is_empty()
            || client_id.len() > self.limits.client_id
            || secret.len() > self.limits.client_secret
        {
            return None;
        }
        let credential = if secret.is_empty() {
            Credential::NoSecret
        } else {
            Credential::SharedSecret(secret)
        };
        Some(ParsedSecret {
            client_id,
            credential,
        })
    }

    fn parse_post_body(&self, parameters: &RequestParameters) -> Option<ParsedSecret> {
        let client_id = parameters.get("client_id")?;
        let secret = parameters.get("client_secret")?;
        if client_id.len() > self.limits.client_id || secret.len() > self.limits.client_secret {
            return None;
        }
        Some(ParsedSecret {
            client_id: client_id.to_string(),
            credential: Credential::SharedSecret(secret.to_string()),
        })
    }

    fn parse_jwt_bearer(&self, parameters: &RequestParameters) -> Option<ParsedSecret> {
        if parameters.get("client_assertion_type")? != CLIENT_ASSERTION_TYPE_JWT_BEARER {
            return None;
        }
        let assertion = parameters.get("client_assertion")?;
        if assertion.len() > self.limits.jwt {
            return None;
        }
        // client_id is optional here, the assertion's own `sub` names the client
        let client_id = match parameters.get("client_id") {
            Some(client_id) => client_id.to_string(),
            None => unverified_subject(assertion)?,
        };
        if client_id.len() > self.limits.client_id {
            return None;
        }
        Some(ParsedSecret {
            client_id,
            credential: Credential::JwtBearer(assertion.to_string()),
        })
    }
}

fn form_decode(value: &str) -> Option<String> {
    urlencoding::decode(&value.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn unverified_subject(assertion: &str) -> Option<String> {
    let payload = assertion.split('.').nth(1)?;
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&payload).ok()?;
    claims.get("sub")?.as_str().map(str::to_string)
}
