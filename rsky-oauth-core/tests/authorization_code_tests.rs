mod common;

use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common::{basic_auth, bob, build_provider, error_code, form, TestProvider, REDIRECT_URI};
use rsky_oauth_core::oauth_provider::clock::Clock;
use rsky_oauth_core::oauth_provider::request::authorization_code::AuthorizationCode;
use rsky_oauth_core::oauth_provider::token::token_service::left_half_hash;
use rsky_oauth_core::oauth_types::{OAuthCodeChallengeMethod, OAuthErrorCode};
use std::collections::BTreeSet;

const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

fn scopes(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

async fn issue_code(test: &TestProvider, requested: &[&str]) -> Result<String> {
    let code = AuthorizationCode::new(
        "codeclient",
        bob(),
        REDIRECT_URI,
        scopes(requested),
        test.clock.now(),
        300,
    )
    .with_pkce(CHALLENGE, OAuthCodeChallengeMethod::S256)
    .with_nonce("n-0S6_WzA2Mj");
    Ok(test.provider.create_authorization_code(&code).await?)
}

fn redeem_body(code: &str, verifier: &str) -> String {
    form(&[
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", REDIRECT_URI),
        ("code_verifier", verifier),
    ])
}

fn jwt_payload(jwt: &str) -> Result<serde_json::Value> {
    let payload = jwt
        .split('.')
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("not a JWT"))?;
    Ok(serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload)?)?)
}

#[tokio::test]
async fn test_code_exchange_issues_all_tokens() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["openid", "profile", "api1", "offline_access"]).await?;

    let response = test
        .provider
        .token(&basic_auth("codeclient", "secret"), &redeem_body(&code, VERIFIER), None)
        .await?;
    assert!(response.refresh_token.is_some());

    let id_token = response
        .id_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("no id_token"))?;
    let claims = jwt_payload(id_token)?;
    assert_eq!(claims["sub"], "bob");
    assert_eq!(claims["aud"], "codeclient");
    assert_eq!(claims["nonce"], "n-0S6_WzA2Mj");
    assert_eq!(claims["at_hash"], left_half_hash(&response.access_token));

    let access = jwt_payload(&response.access_token)?;
    assert_eq!(access["client_id"], "codeclient");
    assert_eq!(access["sub"], "bob");
    Ok(())
}

#[tokio::test]
async fn test_code_is_redeemed_at_most_once() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["openid", "api1"]).await?;
    let headers = basic_auth("codeclient", "secret");

    test.provider
        .token(&headers, &redeem_body(&code, VERIFIER), None)
        .await?;
    let second = test
        .provider
        .token(&headers, &redeem_body(&code, VERIFIER), None)
        .await;
    assert_eq!(error_code(second), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_wrong_verifier_burns_the_code() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["openid", "api1"]).await?;
    let headers = basic_auth("codeclient", "secret");

    let wrong = test
        .provider
        .token(&headers, &redeem_body(&code, &"a".repeat(43)), None)
        .await;
    assert_eq!(error_code(wrong), Some(OAuthErrorCode::InvalidGrant));

    let retry = test
        .provider
        .token(&headers, &redeem_body(&code, VERIFIER), None)
        .await;
    assert_eq!(error_code(retry), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_missing_verifier() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["api1"]).await?;
    let body = form(&[
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
    ]);
    let result = test
        .provider
        .token(&basic_auth("codeclient", "secret"), &body, None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_redirect_uri_must_match() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["api1"]).await?;
    let body = form(&[
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", "https://evil.example.com/callback"),
        ("code_verifier", VERIFIER),
    ]);
    let result = test
        .provider
        .token(&basic_auth("codeclient", "secret"), &body, None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_expired_code() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["api1"]).await?;
    test.clock.advance(301);
    let result = test
        .provider
        .token(&basic_auth("codeclient", "secret"), &redeem_body(&code, VERIFIER), None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_unknown_code() {
    let test = build_provider();
    let result = test
        .provider
        .token(
            &basic_auth("codeclient", "secret"),
            &redeem_body("code-does-not-exist", VERIFIER),
            None,
        )
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidGrant));
}

#[tokio::test]
async fn test_refresh_token_rotation() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["openid", "api1", "offline_access"]).await?;
    let headers = basic_auth("codeclient", "secret");
    let first = test
        .provider
        .token(&headers, &redeem_body(&code, VERIFIER), None)
        .await?;
    let first_refresh = first
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("no refresh token"))?;

    test.clock.advance(60);
    let refresh_body = |handle: &str| {
        form(&[("grant_type", "refresh_token"), ("refresh_token", handle)])
    };
    let second = test
        .provider
        .token(&headers, &refresh_body(&first_refresh), None)
        .await?;
    let second_refresh = second
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("no rotated refresh token"))?;
    assert_ne!(first_refresh, second_refresh);
    assert!(second.id_token.is_some());
    assert_ne!(second.access_token, first.access_token);

    let reused = test
        .provider
        .token(&headers, &refresh_body(&first_refresh), None)
        .await;
    assert_eq!(error_code(reused), Some(OAuthErrorCode::InvalidGrant));

    test.provider
        .token(&headers, &refresh_body(&second_refresh), None)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_refresh_with_narrower_scope() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["openid", "api1", "api2", "offline_access"]).await?;
    let headers = basic_auth("codeclient", "secret");
    let first = test
        .provider
        .token(&headers, &redeem_body(&code, VERIFIER), None)
        .await?;
    let handle = first
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("no refresh token"))?;

    let narrowed = test
        .provider
        .token(
            &headers,
            &form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", handle.as_str()),
                ("scope", "api1"),
            ]),
            None,
        )
        .await?;
    assert_eq!(narrowed.scope.as_deref(), Some("api1"));
    assert!(narrowed.id_token.is_none());
    Ok(())
}

#[tokio::test]
async fn test_refresh_token_of_other_client() -> Result<()> {
    let test = build_provider();
    let password = test
        .provider
        .token(
            &basic_auth("roclient", "secret"),
            &form(&[
                ("grant_type", "password"),
                ("username", "bob"),
                ("password", "bob-password"),
                ("scope", "api1 offline_access"),
            ]),
            None,
        )
        .await?;
    let handle = password
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("no refresh token"))?;

    let result = test
        .provider
        .token(
            &basic_auth("codeclient", "secret"),
            &form(&[("grant_type", "refresh_token"), ("refresh_token", handle.as_str())]),
            None,
        )
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_reusable_refresh_token_keeps_its_handle() -> Result<()> {
    let test = build_provider();
    let headers = basic_auth("roclient.reuse", "secret");
    let first = test
        .provider
        .token(
            &headers,
            &form(&[
                ("grant_type", "password"),
                ("username", "bob"),
                ("password", "bob-password"),
                ("scope", "api1 offline_access"),
            ]),
            None,
        )
        .await?;
    let handle = first
        .refresh_token
        .ok_or_else(|| anyhow::anyhow!("no refresh token"))?;

    for _ in 0..2 {
        let refreshed = test
            .provider
            .token(
                &headers,
                &form(&[("grant_type", "refresh_token"), ("refresh_token", handle.as_str())]),
                None,
            )
            .await?;
        assert_eq!(refreshed.refresh_token.as_deref(), Some(handle.as_str()));
    }
    Ok(())
}

#[tokio::test]
async fn test_user_info_returns_profile_claims() -> Result<()> {
    let test = build_provider();
    let code = issue_code(&test, &["openid", "profile", "api1"]).await?;
    let response = test
        .provider
        .token(&basic_auth("codeclient", "secret"), &redeem_body(&code, VERIFIER), None)
        .await?;

    let claims = test.provider.user_info(&response.access_token).await?;
    assert_eq!(claims["sub"], "bob");
    assert_eq!(claims["name"], "Bob Smith");
    assert_eq!(claims["given_name"], "Bob");
    Ok(())
}

#[tokio::test]
async fn test_user_info_requires_openid() -> Result<()> {
    let test = build_provider();
    let response = test
        .provider
        .token(
            &basic_auth("client", "secret"),
            &form(&[("grant_type", "client_credentials")]),
            None,
        )
        .await?;
    let result = test.provider.user_info(&response.access_token).await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InsufficientScope));

    let garbage = test.provider.user_info("not-a-token").await;
    assert_eq!(error_code(garbage), Some(OAuthErrorCode::InvalidToken));
    Ok(())
}
