use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{
    AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, SET_COOKIE,
    WWW_AUTHENTICATE,
};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use trustline_application::{HometownRecord, JournalEntryRecord, ProfileRecord, UserRef};
use trustline_core::{NonEmptyString, UserId};
use trustline_domain::{
    Client, ClientId, ClientMetadata, FriendshipEdge, FriendshipLevel, TrustTier, Visibility,
};
use trustline_infrastructure::{InMemoryOAuthRepository, InMemorySocialDirectory};

use crate::api_services::build_in_memory_app_state;

use super::build_router;

const FRONTEND: &str = "http://localhost:3000";
const BOOTSTRAP_TOKEN: &str = "local-bootstrap-token";
const REDIRECT: &str = "https://acme.example/cb";
const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

struct TestApp {
    router: Router,
}

fn user(handle: &str) -> UserRef {
    UserRef {
        user_id: UserId::new(),
        handle: handle.to_owned(),
        display_name: format!("{handle} display"),
        avatar_url: Some(format!("https://cdn.example/{handle}.png")),
    }
}

async fn test_app(bootstrap_token: Option<&str>) -> TestApp {
    let oauth = Arc::new(InMemoryOAuthRepository::new());
    let acme = Client::new(
        ClientId::new(),
        "acme",
        vec![REDIRECT.to_owned()],
        ClientMetadata {
            display_name: NonEmptyString::new("Acme")
                .unwrap_or_else(|error| panic!("{error}")),
            description: Some("Acme travel planner".to_owned()),
            logo_url: None,
            homepage_url: Some("https://acme.example".to_owned()),
        },
        TrustTier::Verified,
    )
    .unwrap_or_else(|error| panic!("client should be valid: {error}"));
    oauth
        .register_client(acme)
        .await
        .unwrap_or_else(|error| panic!("client should register: {error}"));

    let social = Arc::new(InMemorySocialDirectory::new());
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    let dave = user("dave");
    for member in [&alice, &bob, &carol, &dave] {
        social
            .add_user(member.clone())
            .await
            .unwrap_or_else(|error| panic!("user should be added: {error}"));
    }

    social
        .upsert_profile(ProfileRecord {
            user: alice.clone(),
            bio: Some("Cartographer".to_owned()),
            link: Some("https://alice.example".to_owned()),
            profile_visibility: Visibility::Public,
            email: Some("alice@example.com".to_owned()),
            hometown: Some(HometownRecord {
                name: "Lisbon".to_owned(),
                latitude: Some(38.72),
                longitude: Some(-9.14),
                visibility: Visibility::Public,
            }),
        })
        .await;
    social
        .add_journal_entry(
            alice.user_id,
            JournalEntryRecord {
                id: uuid::Uuid::new_v4(),
                title: "First light".to_owned(),
                excerpt: "Morning over the river".to_owned(),
                visibility: Visibility::Public,
                published_at: Utc::now(),
            },
        )
        .await;

    for (from, to, level) in [
        (&alice, &bob, FriendshipLevel::Friend),
        (&alice, &carol, FriendshipLevel::Secret),
        (&bob, &dave, FriendshipLevel::CloseFriend),
    ] {
        social
            .add_friendship(FriendshipEdge {
                user_id: from.user_id,
                friend_id: to.user_id,
                level,
            })
            .await
            .unwrap_or_else(|error| panic!("edge should be added: {error}"));
    }

    let state = build_in_memory_app_state(oauth, social, FRONTEND, bootstrap_token);
    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    let router = build_router(state, FRONTEND, session_layer)
        .unwrap_or_else(|error| panic!("router should build: {error}"));

    TestApp { router }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|error| match error {})
    }

    async fn sign_in(&self, handle: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/auth/bootstrap",
                None,
                &json!({ "handle": handle, "token": BOOTSTRAP_TOKEN }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| panic!("bootstrap should set a session cookie"))
    }

    async fn approve(&self, cookie: &str, scope: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/authorize",
                Some(cookie),
                &json!({
                    "client_id": "acme",
                    "redirect_uri": REDIRECT,
                    "scope": scope,
                    "state": "xyz",
                    "code_challenge": CHALLENGE,
                    "code_challenge_method": "S256",
                    "approved": true,
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let redirect_url = body["redirect_url"]
            .as_str()
            .unwrap_or_else(|| panic!("decision should return a redirect"));
        assert_eq!(query_param(redirect_url, "state").as_deref(), Some("xyz"));
        query_param(redirect_url, "code").unwrap_or_else(|| panic!("redirect should carry a code"))
    }

    async fn redeem(&self, code: &str) -> Response {
        self.send(form_request(
            "/token",
            &format!(
                "grant_type=authorization_code&code={code}&client_id=acme&redirect_uri={REDIRECT}&code_verifier={VERIFIER}"
            ),
        ))
        .await
    }

    async fn access_token(&self, scope: &str) -> String {
        let cookie = self.sign_in("alice").await;
        let code = self.approve(&cookie, scope).await;
        let response = self.redeem(&code).await;
        assert_eq!(response.status(), StatusCode::OK);

        json_body(response).await["access_token"]
            .as_str()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| panic!("token response should carry an access token"))
    }
}

fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(ORIGIN, FRONTEND);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }

    builder
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|error| panic!("request should build: {error}"))
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap_or_else(|error| panic!("request should build: {error}"))
}

fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }

    builder
        .body(Body::empty())
        .unwrap_or_else(|error| panic!("request should build: {error}"))
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|error| panic!("body should be readable: {error}"));
    serde_json::from_slice(&bytes).unwrap_or_else(|error| panic!("body should be json: {error}"))
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

#[tokio::test]
async fn acme_end_to_end_flow_returns_only_granted_fields() {
    let app = test_app(Some(BOOTSTRAP_TOKEN)).await;
    let cookie = app.sign_in("alice").await;

    let preview = app
        .send(get_request(
            &format!(
                "/authorize?response_type=code&client_id=acme&redirect_uri={REDIRECT}&scope=profile:read%20connections:read&state=xyz&code_challenge={CHALLENGE}&code_challenge_method=S256"
            ),
            None,
        ))
        .await;
    assert_eq!(preview.status(), StatusCode::OK);
    let consent = json_body(preview).await;
    assert_eq!(consent["client"]["display_name"], "Acme");
    assert_eq!(consent["scopes"].as_array().map(Vec::len), Some(2));
    assert_eq!(consent["already_granted"], false);

    let code = app.approve(&cookie, "profile:read connections:read").await;
    let token_response = app.redeem(&code).await;
    assert_eq!(token_response.status(), StatusCode::OK);
    assert_eq!(
        token_response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|value| value.to_str().ok()),
        Some("no-store")
    );
    let token = json_body(token_response).await;
    assert_eq!(token["token_type"], "Bearer");
    let mut scopes: Vec<&str> = token["scope"]
        .as_str()
        .unwrap_or_default()
        .split(' ')
        .collect();
    scopes.sort_unstable();
    assert_eq!(scopes, vec!["connections:read", "profile:read"]);
    let access_token = token["access_token"].as_str().unwrap_or_default();

    let userinfo = app.send(get_request("/userinfo", Some(access_token))).await;
    assert_eq!(userinfo.status(), StatusCode::OK);
    let body = json_body(userinfo).await;
    assert_eq!(body["handle"], "alice");
    assert_eq!(body["name"], "alice display");
    assert_eq!(body["bio"], "Cartographer");
    assert_eq!(body["link"], "https://alice.example");
    assert!(body["avatar_url"].is_string());
    assert!(body.get("email").is_none());
    assert!(body.get("hometown").is_none());
    assert!(body.get("journal").is_none());

    let connections: Vec<&str> = body["connections"]
        .as_array()
        .unwrap_or_else(|| panic!("connections should be listed"))
        .iter()
        .filter_map(|connection| connection["handle"].as_str())
        .collect();
    assert_eq!(connections, vec!["bob"]);

    let replay = app.redeem(&code).await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(replay).await["error"], "invalid_grant");
}

#[tokio::test]
async fn revoked_tokens_are_challenged() {
    let app = test_app(Some(BOOTSTRAP_TOKEN)).await;
    let access_token = app.access_token("profile:read connections:degree").await;

    let before = app
        .send(get_request("/connection-degree?handle=bob", Some(&access_token)))
        .await;
    assert_eq!(before.status(), StatusCode::OK);

    let revoke = app
        .send(form_request(
            "/revoke",
            &format!("token={access_token}&client_id=acme"),
        ))
        .await;
    assert_eq!(revoke.status(), StatusCode::OK);

    let userinfo = app.send(get_request("/userinfo", Some(&access_token))).await;
    assert_eq!(userinfo.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        userinfo
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok()),
        Some(r#"Bearer error="invalid_token""#)
    );
    assert_eq!(json_body(userinfo).await["error"], "invalid_token");

    let degree = app
        .send(get_request("/connection-degree?handle=bob", Some(&access_token)))
        .await;
    assert_eq!(degree.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        degree
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok()),
        Some(r#"Bearer error="invalid_token""#)
    );
    assert_eq!(json_body(degree).await["error"], "invalid_token");

    let missing = app.send(get_request("/userinfo", None)).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn connection_degree_is_scope_gated() {
    let app = test_app(Some(BOOTSTRAP_TOKEN)).await;

    let narrow = app.access_token("profile:read").await;
    let forbidden = app
        .send(get_request("/connection-degree?handle=dave", Some(&narrow)))
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(forbidden).await["error"], "insufficient_scope");

    let scoped = app.access_token("connections:degree").await;
    let response = app
        .send(get_request("/connection-degree?handle=dave", Some(&scoped)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["degree"], 2);
    let path: Vec<&str> = body["path"]
        .as_array()
        .unwrap_or_else(|| panic!("path should be present"))
        .iter()
        .filter_map(|hop| hop["handle"].as_str())
        .collect();
    assert_eq!(path, vec!["alice", "bob", "dave"]);

    let secret = app
        .send(get_request("/connection-degree?handle=carol", Some(&scoped)))
        .await;
    let body = json_body(secret).await;
    assert_eq!(body["connected"], false);
    assert!(body["degree"].is_null());

    let unknown = app
        .send(get_request("/connection-degree?handle=nobody", Some(&scoped)))
        .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let ambiguous = app
        .send(get_request("/connection-degree", Some(&scoped)))
        .await;
    assert_eq!(ambiguous.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(ambiguous).await["error"], "invalid_request");
}

#[tokio::test]
async fn consent_decisions_need_a_same_origin_session() {
    let app = test_app(Some(BOOTSTRAP_TOKEN)).await;
    let decision = json!({
        "client_id": "acme",
        "redirect_uri": REDIRECT,
        "scope": "profile:read",
        "code_challenge": CHALLENGE,
        "approved": true,
    });

    let anonymous = app
        .send(json_request(Method::POST, "/authorize", None, &decision))
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(anonymous).await["error"], "unauthorized");

    let cookie = app.sign_in("alice").await;
    let mut cross_origin = json_request(Method::POST, "/authorize", Some(&cookie), &decision);
    cross_origin.headers_mut().insert(
        ORIGIN,
        axum::http::HeaderValue::from_static("https://evil.example"),
    );
    let blocked = app.send(cross_origin).await;
    assert_eq!(blocked.status(), StatusCode::UNAUTHORIZED);

    let mut look_alike = json_request(Method::POST, "/authorize", Some(&cookie), &decision);
    look_alike.headers_mut().remove(ORIGIN);
    look_alike.headers_mut().insert(
        REFERER,
        axum::http::HeaderValue::from_static("http://localhost:3000.evil.example/x"),
    );
    let blocked = app.send(look_alike).await;
    assert_eq!(blocked.status(), StatusCode::UNAUTHORIZED);

    let mut same_site_referer =
        json_request(Method::POST, "/authorize", Some(&cookie), &decision);
    same_site_referer.headers_mut().remove(ORIGIN);
    same_site_referer.headers_mut().insert(
        REFERER,
        axum::http::HeaderValue::from_static("http://localhost:3000/consent?client_id=acme"),
    );
    let allowed = app.send(same_site_referer).await;
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn denial_redirects_back_with_access_denied() {
    let app = test_app(Some(BOOTSTRAP_TOKEN)).await;
    let cookie = app.sign_in("alice").await;

    let response = app
        .send(json_request(
            Method::POST,
            "/authorize",
            Some(&cookie),
            &json!({
                "client_id": "acme",
                "redirect_uri": REDIRECT,
                "scope": "profile:read",
                "state": "keep-me",
                "code_challenge": CHALLENGE,
                "approved": false,
            }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let redirect_url = json_body(response).await["redirect_url"]
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    assert!(redirect_url.starts_with(REDIRECT));
    assert_eq!(query_param(&redirect_url, "error").as_deref(), Some("access_denied"));
    assert_eq!(query_param(&redirect_url, "state").as_deref(), Some("keep-me"));
}

#[tokio::test]
async fn preview_rejects_unregistered_redirects() {
    let app = test_app(None).await;

    let response = app
        .send(get_request(
            &format!(
                "/authorize?client_id=acme&redirect_uri={REDIRECT}/&scope=profile:read&code_challenge={CHALLENGE}"
            ),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_redirect_uri");
}

#[tokio::test]
async fn token_endpoint_rejects_other_grant_types() {
    let app = test_app(None).await;

    let response = app
        .send(form_request("/token", "grant_type=client_credentials&client_id=acme"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn revoking_a_grant_ends_its_tokens() {
    let app = test_app(Some(BOOTSTRAP_TOKEN)).await;
    let access_token = app
        .access_token("profile:read journal:read connections:degree")
        .await;
    let cookie = app.sign_in("alice").await;

    let mut list = get_request("/api/grants", None);
    list.headers_mut().insert(
        COOKIE,
        cookie
            .parse()
            .unwrap_or_else(|error| panic!("cookie should be a header value: {error}")),
    );
    let listed = app.send(list).await;
    assert_eq!(listed.status(), StatusCode::OK);
    let apps = json_body(listed).await;
    assert_eq!(apps[0]["client"]["client_id"], "acme");

    let revoked = app
        .send(json_request(
            Method::DELETE,
            "/api/grants/acme",
            Some(&cookie),
            &json!({}),
        ))
        .await;
    assert_eq!(revoked.status(), StatusCode::OK);
    let body = json_body(revoked).await;
    assert_eq!(body["grant_removed"], true);
    assert_eq!(body["tokens_revoked"], 1);

    let userinfo = app.send(get_request("/userinfo", Some(&access_token))).await;
    assert_eq!(userinfo.status(), StatusCode::UNAUTHORIZED);

    let degree = app
        .send(get_request("/connection-degree?handle=bob", Some(&access_token)))
        .await;
    assert_eq!(degree.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(degree).await["error"], "invalid_token");
}

#[tokio::test]
async fn bootstrap_is_guarded_by_its_token() {
    let disabled = test_app(None).await;
    let response = disabled
        .send(json_request(
            Method::POST,
            "/auth/bootstrap",
            None,
            &json!({ "handle": "alice", "token": BOOTSTRAP_TOKEN }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let enabled = test_app(Some(BOOTSTRAP_TOKEN)).await;
    let response = enabled
        .send(json_request(
            Method::POST,
            "/auth/bootstrap",
            None,
            &json!({ "handle": "alice", "token": "guess" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = enabled.sign_in("@alice").await;
    let mut me = get_request("/auth/me", None);
    me.headers_mut().insert(
        COOKIE,
        cookie
            .parse()
            .unwrap_or_else(|error| panic!("cookie should be a header value: {error}")),
    );
    let response = enabled.send(me).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["handle"], "alice");
}

#[tokio::test]
async fn health_reports_disabled_database_for_in_memory_state() {
    let app = test_app(None).await;

    let response = app.send(get_request("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["postgres"]["status"], "disabled");
}
