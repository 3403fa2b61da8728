mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_requires_both_fields() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for payload in [
        json!({}),
        json!({ "email": "kai@example.com" }),
        json!({ "password": "hunter22" }),
        json!({ "email": "", "password": "" }),
    ] {
        let res = client
            .post(format!("{}/auth/login", server.base_url))
            .json(&payload)
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(
            body["message"], "Please provide email and password",
            "payload {}: {}",
            payload, body
        );
    }

    Ok(())
}

#[tokio::test]
async fn registration_payloads_are_validated() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let cases = [
        (json!({}), "Please provide name, email and password"),
        (
            json!({ "name": "Kai", "email": "not-an-email", "password": "hunter22" }),
            "Please enter a valid email address",
        ),
        (
            json!({ "name": "Kai", "email": "kai@example.com", "password": "short" }),
            "Password must be at least 6 characters",
        ),
    ];

    for (payload, message) in cases {
        let res = client
            .post(format!("{}/auth/register", server.base_url))
            .json(&payload)
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["message"], message, "payload {}: {}", payload, body);
    }

    Ok(())
}

#[tokio::test]
async fn registration_then_login_round_trip() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Unique email per run so reruns do not collide on the unique index
    let email = format!("roundtrip-{}@example.com", uuid::Uuid::new_v4());
    let password = "correct-horse-battery";

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({ "name": "Roundtrip", "email": email, "password": password }))
        .send()
        .await?;

    // Without a reachable database the endpoint degrades to 503; that is
    // all we can check from this environment
    if res.status() == StatusCode::SERVICE_UNAVAILABLE {
        return Ok(());
    }

    assert_eq!(res.status(), StatusCode::CREATED, "register failed");
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true, "{}", body);
    assert_eq!(body["message"], "Registration successful", "{}", body);
    assert!(body["token"].is_string(), "missing token: {}", body);
    assert_eq!(body["user"]["email"], email, "{}", body);

    // Same password logs in; wrong password does not
    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Login successful", "{}", body);
    assert!(body["token"].is_string(), "missing token: {}", body);
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Invalid email or password", "{}", body);

    // The issued token opens the protected tree
    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["email"], email, "{}", body);

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let email = format!("duplicate-{}@example.com", uuid::Uuid::new_v4());
    let payload = json!({ "name": "Dup", "email": email, "password": "hunter22" });

    let first = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&payload)
        .send()
        .await?;
    if first.status() == StatusCode::SERVICE_UNAVAILABLE {
        return Ok(());
    }
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&payload)
        .send()
        .await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = second.json::<serde_json::Value>().await?;
    assert_eq!(
        body["message"], "An account with this email already exists",
        "{}",
        body
    );

    Ok(())
}
