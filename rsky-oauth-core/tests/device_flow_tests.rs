mod common;

use anyhow::Result;
use chrono::Duration;
use common::{basic_auth, bob, build_provider, error_code, form};
use http::HeaderMap;
use rsky_oauth_core::oauth_provider::clock::Clock;
use rsky_oauth_core::oauth_provider::device::device_code::{DeviceCode, DeviceCodeState};
use rsky_oauth_core::oauth_provider::device::device_flow_store::DeviceFlowStore;
use rsky_oauth_core::oauth_types::{OAuthErrorCode, GRANT_TYPE_DEVICE_CODE};
use std::collections::BTreeSet;

fn poll_body(device_code: &str) -> String {
    form(&[
        ("grant_type", GRANT_TYPE_DEVICE_CODE),
        ("device_code", device_code),
        ("client_id", "device"),
    ])
}

fn scopes(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_device_flow_end_to_end() -> Result<()> {
    let test = build_provider();
    let headers = HeaderMap::new();
    let authorization = test
        .provider
        .device_authorize(
            &headers,
            &form(&[("client_id", "device"), ("scope", "openid profile api1 offline_access")]),
        )
        .await?;
    assert_eq!(authorization.interval, 5);
    assert_eq!(authorization.user_code.len(), 9);
    assert!(authorization.user_code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(authorization.verification_uri, "https://localhost/device");
    assert_eq!(
        authorization.verification_uri_complete.as_deref(),
        Some(format!("https://localhost/device?userCode={}", authorization.user_code).as_str())
    );

    let body = poll_body(&authorization.device_code);
    let pending = test.provider.token(&headers, &body, None).await;
    assert_eq!(error_code(pending), Some(OAuthErrorCode::AuthorizationPending));

    let too_fast = test.provider.token(&headers, &body, None).await;
    assert_eq!(error_code(too_fast), Some(OAuthErrorCode::SlowDown));

    let context = test
        .provider
        .device_interaction
        .get_authorization_context(&authorization.user_code)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no pending authorization"))?;
    assert_eq!(context.client_id, "device");
    assert_eq!(context.state, DeviceCodeState::Pending);

    test.provider
        .device_interaction
        .approve(
            &authorization.user_code,
            bob(),
            Some("session-1".to_string()),
            scopes(&["openid", "api1", "offline_access"]),
        )
        .await?;

    test.clock.advance(5);
    let response = test.provider.token(&headers, &body, None).await?;
    assert!(response.id_token.is_some());
    assert!(response.refresh_token.is_some());
    assert_eq!(
        response.scope.as_deref().map(|s| s.split(' ').map(str::to_string).collect()),
        Some(scopes(&["openid", "api1", "offline_access"]))
    );

    test.clock.advance(5);
    let again = test.provider.token(&headers, &body, None).await;
    assert_eq!(error_code(again), Some(OAuthErrorCode::InvalidGrant));
    Ok(())
}

#[tokio::test]
async fn test_denied_device_authorization() -> Result<()> {
    let test = build_provider();
    let headers = HeaderMap::new();
    let authorization = test
        .provider
        .device_authorize(&headers, &form(&[("client_id", "device"), ("scope", "api1")]))
        .await?;

    test.provider
        .device_interaction
        .deny(&authorization.user_code)
        .await?;

    let result = test
        .provider
        .token(&headers, &poll_body(&authorization.device_code), None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::AccessDenied));

    let twice = test
        .provider
        .device_interaction
        .deny(&authorization.user_code)
        .await;
    assert_eq!(error_code(twice), Some(OAuthErrorCode::InvalidRequest));
    Ok(())
}

#[tokio::test]
async fn test_approving_no_requested_scope_denies() -> Result<()> {
    let test = build_provider();
    let headers = HeaderMap::new();
    let authorization = test
        .provider
        .device_authorize(&headers, &form(&[("client_id", "device"), ("scope", "api1")]))
        .await?;

    test.provider
        .device_interaction
        .approve(&authorization.user_code, bob(), None, scopes(&["openid"]))
        .await?;

    let result = test
        .provider
        .token(&headers, &poll_body(&authorization.device_code), None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::AccessDenied));
    Ok(())
}

#[tokio::test]
async fn test_expired_device_code() -> Result<()> {
    let test = build_provider();
    let created = test.clock.now() - Duration::seconds(3600);
    test.device_flow_store.write().await.store_device_authorization(
        "device-code-expired",
        "123456789",
        DeviceCode::new("device", scopes(&["api1"]), created, 300),
    )?;

    let result = test
        .provider
        .token(&HeaderMap::new(), &poll_body("device-code-expired"), None)
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::ExpiredToken));

    let gone = test
        .device_flow_store
        .read()
        .await
        .find_by_device_code("device-code-expired")?;
    assert!(gone.is_none());
    Ok(())
}

#[tokio::test]
async fn test_device_authorization_failures() {
    let test = build_provider();
    let headers = HeaderMap::new();

    let bad_scope = test
        .provider
        .device_authorize(&headers, &form(&[("client_id", "device"), ("scope", "api2")]))
        .await;
    assert_eq!(error_code(bad_scope), Some(OAuthErrorCode::InvalidScope));

    let not_allowed = test
        .provider
        .device_authorize(&basic_auth("client", "secret"), &form(&[]))
        .await;
    assert_eq!(error_code(not_allowed), Some(OAuthErrorCode::UnauthorizedClient));

    let unknown = test
        .provider
        .token(&headers, &poll_body("no-such-device-code"), None)
        .await;
    assert_eq!(error_code(unknown), Some(OAuthErrorCode::InvalidGrant));
}

#[tokio::test]
async fn test_device_code_of_another_client() -> Result<()> {
    let test = build_provider();
    let authorization = test
        .provider
        .device_authorize(
            &HeaderMap::new(),
            &form(&[("client_id", "device"), ("scope", "api1")]),
        )
        .await?;

    // the code client may not use the device grant at all
    let result = test
        .provider
        .token(
            &basic_auth("codeclient", "secret"),
            &form(&[
                ("grant_type", GRANT_TYPE_DEVICE_CODE),
                ("device_code", authorization.device_code.as_str()),
            ]),
            None,
        )
        .await;
    assert_eq!(error_code(result), Some(OAuthErrorCode::UnauthorizedClient));
    Ok(())
}
