use chrono::{Duration, Utc};
use trustline_core::{AppError, UserId};
use trustline_domain::{Scope, ScopeSet};
use url::Url;

use crate::test_support::{ACME_REDIRECT, OAuthHarness, S256_CHALLENGE, VERIFIER};
use crate::{AuthorizationRequest, RedeemRequest};

async fn approve(harness: &OAuthHarness, user_id: UserId, scope: &str) -> String {
    let request = AuthorizationRequest {
        client_identifier: "acme".to_owned(),
        redirect_uri: ACME_REDIRECT.to_owned(),
        scope: scope.to_owned(),
        state: None,
        code_challenge: Some(S256_CHALLENGE.to_owned()),
        code_challenge_method: Some("S256".to_owned()),
    };
    let redirect = harness
        .authorization
        .issue(user_id, &request, true)
        .await
        .unwrap_or_else(|error| panic!("approval should succeed: {error}"));

    Url::parse(&redirect.redirect_url)
        .unwrap_or_else(|error| panic!("redirect should parse: {error}"))
        .query_pairs()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| panic!("redirect should carry a code"))
}

fn redeem_request(code: &str) -> RedeemRequest {
    RedeemRequest {
        code: code.to_owned(),
        client_identifier: "acme".to_owned(),
        redirect_uri: ACME_REDIRECT.to_owned(),
        code_verifier: VERIFIER.to_owned(),
    }
}

fn scopes(raw: &str) -> ScopeSet {
    ScopeSet::parse(raw).unwrap_or_else(|error| panic!("scopes should parse: {error}"))
}

#[tokio::test]
async fn redeem_issues_a_bearer_token_with_the_code_scopes() {
    let harness = OAuthHarness::new();
    let user_id = UserId::new();
    let code = approve(&harness, user_id, "profile:read connections:degree").await;

    let issued = harness
        .token_service
        .redeem(&redeem_request(&code))
        .await
        .unwrap_or_else(|error| panic!("redeem should succeed: {error}"));

    assert_eq!(issued.token_type, "Bearer");
    assert_eq!(issued.expires_in, 3600);
    assert_eq!(issued.scopes, scopes("profile:read connections:degree"));

    let context = harness
        .token_service
        .validate(&issued.access_token)
        .await
        .unwrap_or_else(|error| panic!("token should validate: {error}"));
    assert_eq!(context.user_id, user_id);
    assert_eq!(context.client_id, harness.acme.id());
    assert!(context.require_scope(Scope::ConnectionsDegree).is_ok());
    assert!(matches!(
        context.require_scope(Scope::JournalRead),
        Err(AppError::InsufficientScope(_))
    ));

    let stored = harness.tokens.tokens.lock().await;
    assert!(stored.iter().all(|(hash, _)| hash != &issued.access_token));
}

#[tokio::test]
async fn a_code_redeems_exactly_once() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;

    let first = harness.token_service.redeem(&redeem_request(&code)).await;
    let second = harness.token_service.redeem(&redeem_request(&code)).await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::InvalidGrant(_))));
}

#[tokio::test]
async fn concurrent_redemptions_have_a_single_winner() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;
    let request = redeem_request(&code);

    let (first, second, third) = tokio::join!(
        harness.token_service.redeem(&request),
        harness.token_service.redeem(&request),
        harness.token_service.redeem(&request),
    );

    let winners = [&first, &second, &third]
        .iter()
        .filter(|result| result.is_ok())
        .count();
    assert_eq!(winners, 1);
    assert_eq!(harness.tokens.tokens.lock().await.len(), 1);
}

#[tokio::test]
async fn expired_codes_are_rejected() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;
    harness.codes.expire_all().await;

    let result = harness.token_service.redeem(&redeem_request(&code)).await;

    assert!(matches!(result, Err(AppError::InvalidGrant(_))));
}

#[tokio::test]
async fn a_wrong_verifier_burns_the_code() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;
    let mut wrong = redeem_request(&code);
    wrong.code_verifier = "a".repeat(43);

    let rejected = harness.token_service.redeem(&wrong).await;
    let retried = harness.token_service.redeem(&redeem_request(&code)).await;

    assert!(matches!(rejected, Err(AppError::InvalidGrant(_))));
    assert!(matches!(retried, Err(AppError::InvalidGrant(_))));
    assert!(harness.tokens.tokens.lock().await.is_empty());
}

#[tokio::test]
async fn redirect_and_client_must_match_the_code() {
    let harness = OAuthHarness::new();

    let code = approve(&harness, UserId::new(), "profile:read").await;
    let mut other_redirect = redeem_request(&code);
    other_redirect.redirect_uri = format!("{ACME_REDIRECT}/other");
    assert!(matches!(
        harness.token_service.redeem(&other_redirect).await,
        Err(AppError::InvalidGrant(_))
    ));

    let code = approve(&harness, UserId::new(), "profile:read").await;
    let mut other_client = redeem_request(&code);
    other_client.client_identifier = harness.unverified.client_identifier().to_owned();
    assert!(matches!(
        harness.token_service.redeem(&other_client).await,
        Err(AppError::InvalidGrant(_))
    ));

    let mut unknown_client = redeem_request("whatever");
    unknown_client.client_identifier = "nobody".to_owned();
    assert!(matches!(
        harness.token_service.redeem(&unknown_client).await,
        Err(AppError::InvalidClient(_))
    ));
}

#[tokio::test]
async fn unknown_and_expired_tokens_are_invalid() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;
    let issued = harness
        .token_service
        .redeem(&redeem_request(&code))
        .await
        .unwrap_or_else(|error| panic!("redeem should succeed: {error}"));

    assert!(matches!(
        harness.token_service.validate("deadbeef").await,
        Err(AppError::InvalidToken(_))
    ));
    assert!(matches!(
        harness.token_service.validate("   ").await,
        Err(AppError::InvalidToken(_))
    ));

    for (_, record) in harness.tokens.tokens.lock().await.iter_mut() {
        record.expires_at = Utc::now() - Duration::seconds(1);
    }
    assert!(matches!(
        harness.token_service.validate(&issued.access_token).await,
        Err(AppError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn revocation_is_final_and_scoped_to_the_owning_client() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;
    let issued = harness
        .token_service
        .redeem(&redeem_request(&code))
        .await
        .unwrap_or_else(|error| panic!("redeem should succeed: {error}"));

    harness
        .token_service
        .revoke_token(&issued.access_token, "sketchy")
        .await
        .unwrap_or_else(|error| panic!("foreign revoke should be a no-op: {error}"));
    assert!(
        harness
            .token_service
            .validate(&issued.access_token)
            .await
            .is_ok()
    );

    for _ in 0..2 {
        harness
            .token_service
            .revoke_token(&issued.access_token, "acme")
            .await
            .unwrap_or_else(|error| panic!("revoke should succeed: {error}"));
    }
    harness
        .token_service
        .revoke_token("never-issued", "acme")
        .await
        .unwrap_or_else(|error| panic!("unknown token revoke should succeed: {error}"));

    assert!(matches!(
        harness.token_service.validate(&issued.access_token).await,
        Err(AppError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn narrowing_the_grant_narrows_live_tokens() {
    let harness = OAuthHarness::new();
    let user_id = UserId::new();
    let code = approve(&harness, user_id, "profile:read connections:read").await;
    let issued = harness
        .token_service
        .redeem(&redeem_request(&code))
        .await
        .unwrap_or_else(|error| panic!("redeem should succeed: {error}"));

    approve(&harness, user_id, "profile:read").await;

    let context = harness
        .token_service
        .validate(&issued.access_token)
        .await
        .unwrap_or_else(|error| panic!("token should validate: {error}"));
    assert_eq!(context.scopes, scopes("profile:read"));
    assert!(context.require_scope(Scope::ConnectionsRead).is_err());

    harness.grants.grants.lock().await.clear();
    assert!(matches!(
        harness.token_service.validate(&issued.access_token).await,
        Err(AppError::InvalidToken(_))
    ));
}

#[tokio::test]
async fn purge_removes_only_rows_past_the_cutoff() {
    let harness = OAuthHarness::new();
    let code = approve(&harness, UserId::new(), "profile:read").await;
    harness
        .token_service
        .redeem(&redeem_request(&code))
        .await
        .unwrap_or_else(|error| panic!("redeem should succeed: {error}"));
    approve(&harness, UserId::new(), "profile:read").await;

    let nothing = harness
        .token_service
        .purge_expired(Utc::now() - Duration::days(1))
        .await
        .unwrap_or_else(|error| panic!("purge should succeed: {error}"));
    assert_eq!(nothing.codes, 0);
    assert_eq!(nothing.tokens, 0);

    let everything = harness
        .token_service
        .purge_expired(Utc::now() + Duration::days(1))
        .await
        .unwrap_or_else(|error| panic!("purge should succeed: {error}"));
    assert_eq!(everything.codes, 2);
    assert_eq!(everything.tokens, 1);
}
