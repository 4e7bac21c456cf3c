mod common;

use anyhow::Result;
use common::{basic_auth, build_provider, client_assertion, error_code, form};
use http::HeaderMap;
use rsky_oauth_core::oauth_types::{
    OAuthErrorCode, OAuthGrantType, CLIENT_ASSERTION_TYPE_JWT_BEARER,
};
use std::collections::BTreeSet;

fn scope_set(scope: Option<&str>) -> BTreeSet<String> {
    scope
        .unwrap_or_default()
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_client_credentials_without_scope() -> Result<()> {
    let test = build_provider();
    let headers = basic_auth("client", "secret");
    let body = form(&[("grant_type", "client_credentials")]);

    let request = test
        .provider
        .validate_token_request(&headers, &body, None)
        .await?;
    assert_eq!(request.grant_type, OAuthGrantType::ClientCredentials);
    assert!(request.subject.is_none());
    assert_eq!(
        request.requested_scopes,
        BTreeSet::from(["api1".to_string(), "api2".to_string()])
    );

    let response = test.provider.token(&headers, &body, None).await?;
    assert_eq!(response.access_token.split('.').count(), 3);
    assert!(response.refresh_token.is_none());
    assert!(response.id_token.is_none());
    assert_eq!(
        scope_set(response.scope.as_deref()),
        BTreeSet::from(["api1".to_string(), "api2".to_string()])
    );
    Ok(())
}

#[tokio::test]
async fn test_client_credentials_with_explicit_scope() -> Result<()> {
    let test = build_provider();
    let response = test
        .provider
        .token(
            &basic_auth("client", "secret"),
            &form(&[("grant_type", "client_credentials"), ("scope", "api1")]),
            None,
        )
        .await?;
    assert_eq!(response.scope.as_deref(), Some("api1"));
    Ok(())
}

#[tokio::test]
async fn test_client_credentials_rejects_unusable_scopes() {
    let test = build_provider();
    let headers = basic_auth("client", "secret");
    for scope in ["offline_access", "openid", "api1 unknown", "api3"] {
        let body = form(&[("grant_type", "client_credentials"), ("scope", scope)]);
        assert_eq!(
            error_code(test.provider.token(&headers, &body, None).await),
            Some(OAuthErrorCode::InvalidScope),
            "scope {scope}"
        );
    }
}

#[tokio::test]
async fn test_missing_grant_type() {
    let test = build_provider();
    let result = test
        .provider
        .token(&basic_auth("client", "secret"), &form(&[("scope", "api1")]), None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidRequest));
}

#[tokio::test]
async fn test_unknown_or_oversized_grant_type() {
    let test = build_provider();
    let headers = basic_auth("client", "secret");
    let too_long = "g".repeat(101);
    for grant_type in ["made_up", too_long.as_str()] {
        let result = test
            .provider
            .token(&headers, &form(&[("grant_type", grant_type)]), None)
            .await;
        assert_eq!(error_code(result), Some(OAuthErrorCode::UnsupportedGrantType));
    }
}

#[tokio::test]
async fn test_grant_type_not_allowed_for_client() {
    let test = build_provider();
    let result = test
        .provider
        .token(
            &basic_auth("client", "secret"),
            &form(&[
                ("grant_type", "password"),
                ("username", "bob"),
                ("password", "bob-password"),
            ]),
            None,
        )
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::UnauthorizedClient));
}

#[tokio::test]
async fn test_client_authentication_failures() {
    let test = build_provider();
    let body = form(&[("grant_type", "client_credentials")]);
    for headers in [
        basic_auth("client", "wrong"),
        basic_auth("nobody", "secret"),
        HeaderMap::new(),
    ] {
        let result = test.provider.token(&headers, &body, None).await;
        assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidClient));
    }
}

#[tokio::test]
async fn test_client_secret_in_form_body() -> Result<()> {
    let test = build_provider();
    let body = form(&[
        ("grant_type", "client_credentials"),
        ("client_id", "client"),
        ("client_secret", "secret"),
    ]);
    let response = test.provider.token(&HeaderMap::new(), &body, None).await?;
    assert!(!response.access_token.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_private_key_jwt_assertion_is_single_use() -> Result<()> {
    let test = build_provider();
    let assertion = client_assertion("assertion-1", "https://localhost/connect/token")?;
    let body = form(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT_BEARER),
        ("client_assertion", assertion.as_str()),
    ]);

    let response = test.provider.token(&HeaderMap::new(), &body, None).await?;
    assert_eq!(response.scope.as_deref(), Some("api1"));

    let replayed = test.provider.token(&HeaderMap::new(), &body, None).await;
    assert_eq!(error_code(replayed), Some(OAuthErrorCode::InvalidClient));
    Ok(())
}

#[tokio::test]
async fn test_private_key_jwt_wrong_audience() -> Result<()> {
    let test = build_provider();
    let assertion = client_assertion("assertion-2", "https://elsewhere.example.com")?;
    let body = form(&[
        ("grant_type", "client_credentials"),
        ("client_assertion_type", CLIENT_ASSERTION_TYPE_JWT_BEARER),
        ("client_assertion", assertion.as_str()),
    ]);
    let result = test.provider.token(&HeaderMap::new(), &body, None).await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidClient));
    Ok(())
}

#[tokio::test]
async fn test_password_grant() -> Result<()> {
    let test = build_provider();
    let response = test
        .provider
        .token(
            &basic_auth("roclient", "secret"),
            &form(&[
                ("grant_type", "password"),
                ("username", "bob"),
                ("password", "bob-password"),
                ("scope", "openid api1 offline_access"),
            ]),
            None,
        )
        .await?;
    assert!(response.refresh_token.is_some());
    assert!(response.id_token.is_none());
    assert_eq!(
        scope_set(response.scope.as_deref()),
        BTreeSet::from([
            "api1".to_string(),
            "offline_access".to_string(),
            "openid".to_string()
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_password_grant_failures() {
    let test = build_provider();
    let headers = basic_auth("roclient", "secret");
    let cases = [
        form(&[("grant_type", "password"), ("username", "bob"), ("password", "nope")]),
        form(&[("grant_type", "password"), ("username", "bob")]),
        form(&[
            ("grant_type", "password"),
            ("username", "mallory"),
            ("password", "mallory-password"),
        ]),
    ];
    for body in cases {
        let result = test.provider.token(&headers, &body, None).await;
        assert_eq!(error_code(result), Some(OAuthErrorCode::InvalidGrant), "{body}");
    }
}

#[tokio::test]
async fn test_password_grant_without_offline_access_issues_no_refresh_token() -> Result<()> {
    let test = build_provider();
    let response = test
        .provider
        .token(
            &basic_auth("roclient", "secret"),
            &form(&[
                ("grant_type", "password"),
                ("username", "bob"),
                ("password", "bob-password"),
                ("scope", "api1"),
            ]),
            None,
        )
        .await?;
    assert!(response.refresh_token.is_none());
    Ok(())
}

#[tokio::test]
async fn test_extension_grant() -> Result<()> {
    let test = build_provider();
    let headers = basic_auth("extension", "secret");
    let response = test
        .provider
        .token(
            &headers,
            &form(&[("grant_type", "custom"), ("user", "alice")]),
            None,
        )
        .await?;
    assert_eq!(
        response.custom.get("custom_field"),
        Some(&serde_json::json!("custom"))
    );

    let missing_user = test
        .provider
        .token(&headers, &form(&[("grant_type", "custom")]), None)
        .await;
    assert_eq!(error_code(missing_user), Some(OAuthErrorCode::InvalidGrant));

    let failing = test
        .provider
        .token(
            &headers,
            &form(&[("grant_type", "custom"), ("explode", "1")]),
            None,
        )
        .await;
    assert_eq!(error_code(failing), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_unregistered_extension_grant() {
    let test = build_provider();
    let result = test
        .provider
        .token(
            &basic_auth("extension", "secret"),
            &form(&[("grant_type", "other_custom")]),
            None,
        )
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::UnsupportedGrantType));
}
