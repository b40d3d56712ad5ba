mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn protected_routes_reject_missing_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/api/posts", "/api/tags", "/api/auth/whoami", "/api/admin/users"] {
        let res = client.get(format!("{}{}", server.base_url, path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} gave {}", path, res.status());

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["success"], false, "{}: {}", path, body);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_non_bearer_scheme() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/posts", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn reset_password_rejects_malformed_keys() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Valid base64, but the payload is not a reset request
    let not_a_payload = "aGVsbG8gd29ybGQ=";

    for key in ["***", not_a_payload] {
        let res = client
            .post(format!("{}/auth/reset-password", server.base_url))
            .json(&json!({ "key": key, "password": "another-password" }))
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "key {:?}", key);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["error"], "the reset key is not valid");
        assert_eq!(body["code"], "BAD_REQUEST");
    }
    Ok(())
}

#[tokio::test]
async fn login_requires_json_body() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.post(format!("{}/auth/login", server.base_url)).send().await?;

    assert!(res.status().is_client_error(), "expected client error, got {}", res.status());
    Ok(())
}
