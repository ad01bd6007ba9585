//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variable: DATABASE_URL
//!
//! Stripe and Discord are served by a local mock.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::mock_providers::REJECTED_CODE;
use integration_tests::{
    assert_json, assert_status, check_test_env, fixtures::*, location, set_cookie,
    set_cookie_header, TestServer, FRONTEND_URL,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Log in and link a fresh Discord account through the OAuth endpoints
async fn linked_user(server: &TestServer) -> (LoginResponse, String) {
    let login = LoginRequest::unique();
    let response = server.post("/auth/login", &login).await.unwrap();
    let auth: LoginResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let discord_id = unique_discord_id();
    server.providers.set_profile(&discord_id, Some(&login.email));

    let start = server.get("/discord/start").await.unwrap();
    let state = set_cookie(&start, "discord_state").expect("state cookie");

    let callback = server
        .get_with_cookies(
            &format!("/discord/callback?code=ok&state={state}"),
            &[("discord_state", &state)],
        )
        .await
        .unwrap();
    assert_eq!(callback.status(), StatusCode::FOUND);

    (auth, discord_id)
}

async fn access_status(server: &TestServer, token: &str) -> AccessStatus {
    let response = server.get_auth("/access/status", token).await.unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");
}

#[tokio::test]
async fn test_version() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/version").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["app_name"], "PGR Backend");
    assert_eq!(body["environment"], "development");
    assert!(body["version"].as_str().is_some_and(|v| !v.is_empty()));
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_login_twice_returns_same_user() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let request = LoginRequest::unique();

    let first: LoginResponse = assert_json(
        server.post("/auth/login", &request).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    let second: LoginResponse = assert_json(
        server
            .post("/auth/login", &json!({ "email": request.email.to_uppercase() }))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();

    assert_eq!(first.user_id, second.user_id);
    assert_eq!(second.email, request.email);
    assert!(!first.token.is_empty());
    assert!(!second.token.is_empty());
}

#[tokio::test]
async fn test_login_invalid_email() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server
        .post("/auth/login", &json!({ "email": "not-an-email" }))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_get_current_user() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let request = LoginRequest::unique();
    let auth: LoginResponse = assert_json(
        server.post("/auth/login", &request).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();

    let response = server.get_auth("/auth/me", &auth.token).await.unwrap();
    let user: UserResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(user.id, auth.user_id);
    assert_eq!(user.email, request.email);
    assert_eq!(user.access_level, "free");
    assert!(!user.created_at.is_empty());
}

#[tokio::test]
async fn test_repeated_bearer_prefix_is_accepted() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let auth: LoginResponse = assert_json(
        server.post("/auth/login", &LoginRequest::unique()).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();

    let response = server
        .get_auth("/auth/me", &format!("Bearer {}", auth.token))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_get_current_user_unauthorized() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/auth/me").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server.get_auth("/auth/me", "not.a.token").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server.get_auth("/access/status", "").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

// ============================================================================
// Discord linking
// ============================================================================

#[tokio::test]
async fn test_discord_start_sets_state_cookie() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/discord/start").await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let state = set_cookie(&response, "discord_state").expect("state cookie");
    let header = set_cookie_header(&response, "discord_state").unwrap();
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Lax"));
    assert!(header.contains("Max-Age=600"));

    let target = location(&response).unwrap();
    assert!(target.starts_with(&format!(
        "{}/oauth2/authorize?",
        server.providers.discord_api_base()
    )));
    assert!(target.contains(&format!("state={state}")));
    assert!(target.contains("client_id=client-id"));
    assert!(target.contains("response_type=code"));
}

#[tokio::test]
async fn test_discord_callback_links_account() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let email = unique_email();
    let discord_id = unique_discord_id();
    server.providers.set_profile(&discord_id, Some(&email));

    let response = server
        .get_with_cookies(
            "/discord/callback?code=ok&state=expected",
            &[("discord_state", "expected")],
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response).unwrap(),
        format!("{FRONTEND_URL}/discord/linked?success=1")
    );
    assert_eq!(set_cookie(&response, "pgr_discord_id"), Some(discord_id));
    let removal = set_cookie_header(&response, "discord_state").unwrap();
    assert!(removal.contains("Max-Age=0"));

    // The account created by the callback can log in by email
    let auth: LoginResponse = assert_json(
        server
            .post("/auth/login", &json!({ "email": email }))
            .await
            .unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();
    assert_eq!(auth.email, email);
}

#[tokio::test]
async fn test_discord_callback_state_mismatch() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .get_with_cookies(
            "/discord/callback?code=ok&state=forged",
            &[("discord_state", "expected")],
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .get("/discord/callback?code=ok&state=expected")
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_discord_callback_rejected_code() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server
        .get_with_cookies(
            &format!("/discord/callback?code={REJECTED_CODE}&state=s"),
            &[("discord_state", "s")],
        )
        .await
        .unwrap();

    let body: ErrorBody = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert!(body.error.message.contains("invalid_grant"));
}

#[tokio::test]
async fn test_discord_callback_requires_email() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    server.providers.set_profile(&unique_discord_id(), None);

    let response = server
        .get_with_cookies("/discord/callback?code=ok&state=s", &[("discord_state", "s")])
        .await
        .unwrap();

    let body: ErrorBody = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(
        body.error.message,
        "Discord email missing (ensure scope includes email)"
    );
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_create_checkout() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, discord_id) = linked_user(&server).await;

    let response = server
        .post("/stripe/checkout", &json!({ "discord_id": discord_id }))
        .await
        .unwrap();
    let checkout: CheckoutResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert!(checkout.checkout_url.ends_with(&checkout.id));
    let sent = server.providers.checkouts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["mode"], "subscription");
    assert_eq!(sent[0]["line_items[0][price]"], "price_399");
    assert_eq!(sent[0]["client_reference_id"], discord_id);
    assert_eq!(sent[0]["metadata[discord_id]"], discord_id);
    assert_eq!(sent[0]["subscription_data[metadata][discord_id]"], discord_id);
}

#[tokio::test]
async fn test_create_checkout_alias_and_plan() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, discord_id) = linked_user(&server).await;
    let response = server
        .post(
            "/stripe/create-checkout-session",
            &json!({ "discord_id": discord_id, "plan": "premium_999" }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let sent = server.providers.checkouts();
    assert_eq!(sent[0]["line_items[0][price]"], "price_999");
    assert_eq!(sent[0]["metadata[plan]"], "premium_999");
}

#[tokio::test]
async fn test_create_checkout_validation() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");

    let response = server
        .post("/stripe/checkout", &json!({ "discord_id": "../roles" }))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    let response = server
        .post(
            "/stripe/checkout",
            &json!({ "discord_id": unique_discord_id(), "plan": "gold" }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    assert!(server.providers.checkouts().is_empty());
}

#[tokio::test]
async fn test_create_checkout_requires_linked_discord() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server
        .post("/stripe/checkout", &json!({ "discord_id": unique_discord_id() }))
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();

    assert_eq!(body.error.code, "INVALID_INPUT");
    assert!(server.providers.checkouts().is_empty());
}

#[tokio::test]
async fn test_checkout_redirect_uses_cookie() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, discord_id) = linked_user(&server).await;

    let response = server
        .get_with_cookies("/stripe/checkout", &[("pgr_discord_id", &discord_id)])
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response)
        .unwrap()
        .starts_with("https://checkout.stripe.test/c/"));
    assert_eq!(server.providers.checkouts()[0]["client_reference_id"], discord_id);
}

#[tokio::test]
async fn test_checkout_redirect_requires_discord_id() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/stripe/checkout").await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

// ============================================================================
// Webhook
// ============================================================================

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, discord_id) = linked_user(&server).await;
    let event = checkout_completed(&unique_event_id(), Some(&discord_id), "cus_bad_sig");
    let (payload, _) = signed(&event);

    let response = server
        .post_webhook(payload.clone(), Some("t=1,v1=deadbeef"))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    let response = server.post_webhook(payload, None).await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    assert!(server.providers.role_grants().is_empty());
}

#[tokio::test]
async fn test_webhook_checkout_grants_premium_once() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (auth, discord_id) = linked_user(&server).await;
    let event_id = unique_event_id();
    let (payload, signature) = signed(&checkout_completed(&event_id, Some(&discord_id), "cus_grant"));

    let response = server
        .post_webhook(payload.clone(), Some(&signature))
        .await
        .unwrap();
    let ack: WebhookAck = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(ack.received);
    assert_eq!(ack.status, "processed");
    assert_eq!(ack.event_id, event_id);

    let status = access_status(&server, &auth.token).await;
    assert_eq!(status.user_id, auth.user_id);
    assert_eq!(status.access_level, "premium");
    assert_eq!(server.providers.role_grants(), vec![discord_id.clone()]);

    // Redelivery is acknowledged without a second grant
    let response = server.post_webhook(payload, Some(&signature)).await.unwrap();
    let ack: WebhookAck = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(ack.status, "duplicate");
    assert_eq!(server.providers.role_grants(), vec![discord_id]);
}

#[tokio::test]
async fn test_webhook_without_correlation_is_ignored() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let event = checkout_completed(&unique_event_id(), None, "");
    let (payload, signature) = signed(&event);

    let response = server.post_webhook(payload, Some(&signature)).await.unwrap();
    let ack: WebhookAck = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(ack.status, "ignored");
    assert!(ack.detail.is_some());
    assert!(server.providers.role_grants().is_empty());
}

#[tokio::test]
async fn test_webhook_subscription_deleted_revokes() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (auth, discord_id) = linked_user(&server).await;
    let subscription_id = format!("sub_{}", unique_event_id());
    let customer = format!("cus_{}", unique_event_id());

    let created = subscription_event(
        &unique_event_id(),
        "customer.subscription.created",
        &subscription_id,
        &discord_id,
        &customer,
        "active",
    );
    let (payload, signature) = signed(&created);
    let response = server.post_webhook(payload, Some(&signature)).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let status = access_status(&server, &auth.token).await;
    assert_eq!(status.access_level, "premium");
    assert_eq!(status.subscription_status.as_deref(), Some("active"));
    assert_eq!(status.subscription_plan.as_deref(), Some("premium_399"));

    let deleted = subscription_event(
        &unique_event_id(),
        "customer.subscription.deleted",
        &subscription_id,
        &discord_id,
        &customer,
        "canceled",
    );
    let (payload, signature) = signed(&deleted);
    let response = server.post_webhook(payload, Some(&signature)).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let status = access_status(&server, &auth.token).await;
    assert_eq!(status.access_level, "free");
    assert_eq!(status.subscription_status.as_deref(), Some("canceled"));
    assert_eq!(server.providers.role_revokes(), vec![discord_id]);
}

#[tokio::test]
async fn test_webhook_unhandled_type_is_acknowledged() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let event = stripe_event(&unique_event_id(), "charge.refunded", json!({ "id": "ch_1" }));
    let (payload, signature) = signed(&event);

    let response = server.post_webhook(payload, Some(&signature)).await.unwrap();
    let ack: WebhookAck = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(ack.status, "ignored");
}

// ============================================================================
// Billing portal
// ============================================================================

#[tokio::test]
async fn test_portal_requires_customer() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let auth: LoginResponse = assert_json(
        server.post("/auth/login", &LoginRequest::unique()).await.unwrap(),
        StatusCode::OK,
    )
    .await
    .unwrap();

    let response = server
        .post_auth("/stripe/portal", &auth.token, &json!({}))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert!(server.providers.portals().is_empty());
}

#[tokio::test]
async fn test_portal_after_checkout() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (auth, discord_id) = linked_user(&server).await;
    let customer = format!("cus_{}", unique_event_id());
    let (payload, signature) = signed(&checkout_completed(
        &unique_event_id(),
        Some(&discord_id),
        &customer,
    ));
    let response = server.post_webhook(payload, Some(&signature)).await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server
        .post_auth("/stripe/portal", &auth.token, &json!({}))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["url"], "https://billing.stripe.test/p/session");
    let sent = server.providers.portals();
    assert_eq!(sent[0]["customer"], customer);
    assert_eq!(sent[0]["return_url"], format!("{FRONTEND_URL}/account"));
}
