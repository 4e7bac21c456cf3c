use crate::oauth_provider::account::profile_service::{
    ProfileDataCaller, ProfileDataRequest, ProfileService,
};
use crate::oauth_provider::account::subject::{
    Claim, Subject, CLAIM_CLIENT_ID, CLAIM_JWT_ID, CLAIM_SCOPE, CLAIM_SESSION_ID,
};
use crate::oauth_provider::client::client::{AccessTokenType, Client};
use crate::oauth_provider::errors::OAuthError;
use crate::oauth_provider::grant::reference_token_store::ReferenceTokenStore;
use crate::oauth_provider::resource::resources::ResourceValidationResult;
use crate::oauth_provider::token::signer::Signer;
use crate::oauth_provider::token::token::{Token, TOKEN_TYPE_ACCESS_TOKEN, TOKEN_TYPE_ID_TOKEN};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Inputs for building one access or identity token.
#[derive(Debug, Clone, Copy)]
pub struct TokenCreationRequest<'a> {
    pub client: &'a Client,
    pub subject: Option<&'a Subject>,
    pub session_id: Option<&'a str>,
    pub resources: &'a ResourceValidationResult,
    pub nonce: Option<&'a str>,
    /// Serialized access token issued alongside an identity token, for `at_hash`
    pub access_token_to_hash: Option<&'a str>,
}

pub struct TokenService {
    signer: Arc<Signer>,
    reference_tokens: ReferenceTokenStore,
    profile: Arc<dyn ProfileService>,
}

impl TokenService {
    pub fn new(
        signer: Arc<Signer>,
        reference_tokens: ReferenceTokenStore,
        profile: Arc<dyn ProfileService>,
    ) -> Self {
        TokenService {
            signer,
            reference_tokens,
            profile,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.signer.issuer
    }

    pub async fn create_access_token(
        &self,
        request: TokenCreationRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<Token, OAuthError> {
        let client = request.client;
        let mut claims = vec![Claim::new(CLAIM_CLIENT_ID, client.client_id.clone())];
        for scope in request.resources.raw_scope_values() {
            claims.push(Claim::new(CLAIM_SCOPE, scope));
        }

        if let Some(subject) = request.subject {
            claims.extend(subject.authentication_claims());
            if let Some(session_id) = request.session_id {
                claims.push(Claim::new(CLAIM_SESSION_ID, session_id));
            }
            let requested = request.resources.resources.api_claim_types();
            if !requested.is_empty() {
                claims.extend(
                    self.user_claims(subject, client, ProfileDataCaller::ClaimsProviderAccessToken, requested)
                        .await?,
                );
            }
        }

        if client.always_send_client_claims || request.subject.is_none() {
            claims.extend(client.prefixed_claims());
        }

        if client.include_jwt_id {
            let mut jti = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut jti);
            claims.push(Claim::new(CLAIM_JWT_ID, hex::encode(jti)));
        }

        let mut token = Token::new(TOKEN_TYPE_ACCESS_TOKEN, client.client_id.clone(), now);
        token.issuer = self.issuer().to_string();
        token.audiences = request.resources.resources.audiences();
        token.lifetime = client.access_token_lifetime;
        token.access_token_type = client.access_token_type;
        token.claims = claims;
        Ok(token)
    }

    pub async fn create_identity_token(
        &self,
        request: TokenCreationRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<Token, OAuthError> {
        let client = request.client;
        let Some(subject) = request.subject else {
            return Err(OAuthError::RuntimeError(
                "An identity token requires a subject".to_string(),
            ));
        };

        let mut claims = subject.authentication_claims();
        if let Some(nonce) = request.nonce {
            claims.push(Claim::new("nonce", nonce));
        }
        if let Some(session_id) = request.session_id {
            claims.push(Claim::new(CLAIM_SESSION_ID, session_id));
        }
        if let Some(access_token) = request.access_token_to_hash {
            claims.push(Claim::new("at_hash", left_half_hash(access_token)));
        }

        // without an access token the user claims go into the identity token
        if client.always_include_user_claims_in_id_token || request.access_token_to_hash.is_none() {
            let requested = request.resources.resources.identity_claim_types();
            if !requested.is_empty() {
                claims.extend(
                    self.user_claims(subject, client, ProfileDataCaller::ClaimsProviderIdentityToken, requested)
                        .await?,
                );
            }
        }

        let mut token = Token::new(TOKEN_TYPE_ID_TOKEN, client.client_id.clone(), now);
        token.issuer = self.issuer().to_string();
        token.audiences = vec![client.client_id.clone()];
        token.lifetime = client.identity_token_lifetime;
        token.access_token_type = AccessTokenType::Jwt;
        token.claims = claims;
        Ok(token)
    }

    /// Serialize a token: reference access tokens are stored and their handle
    /// returned, everything else is signed.
    pub async fn create_security_token(&self, token: &Token) -> Result<String, OAuthError> {
        if token.token_type == TOKEN_TYPE_ACCESS_TOKEN
            && token.access_token_type == AccessTokenType::Reference
        {
            return self.reference_tokens.store_reference_token(token).await;
        }
        self.signer.sign(token)
    }

    async fn user_claims(
        &self,
        subject: &Subject,
        client: &Client,
        caller: ProfileDataCaller,
        requested_claim_types: BTreeSet<String>,
    ) -> Result<Vec<Claim>, OAuthError> {
        let claims = self
            .profile
            .get_claims(ProfileDataRequest {
                subject,
                client,
                caller,
                requested_claim_types,
            })
            .await
            .map_err(|error| {
                tracing::error!(%error, subject_id = %subject.subject_id, "profile service failed to return claims");
                OAuthError::RuntimeError(format!("Profile service failed: {error}"))
            })?;
        // protocol claims are never taken from the profile
        Ok(claims
            .into_iter()
            .filter(|c| {
                !matches!(
                    c.claim_type.as_str(),
                    "sub" | "iss" | "aud" | "exp" | "iat" | "nbf" | CLAIM_CLIENT_ID | CLAIM_SCOPE
                )
            })
            .collect())
    }
}

/// OpenID Connect `at_hash`: base64url of the left half of SHA-256(token).
pub fn left_half_hash(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_half_hash_length() {
        // 16 bytes encode to 22 characters
        assert_eq!(left_half_hash("token").len(), 22);
        assert_ne!(left_half_hash("token"), left_half_hash("other"));
    }
}
