use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{TestApp, ALLOWED_ORIGINS};

const ALLOW_ORIGIN: &str = "access-control-allow-origin";
const ALLOW_METHODS: &str = "access-control-allow-methods";
const ALLOW_HEADERS: &str = "access-control-allow-headers";

#[tokio::test]
async fn cors_allowed_origin_is_echoed_back() -> Result<()> {
    let app = TestApp::spawn().await?;

    for origin in ALLOWED_ORIGINS {
        let res = app
            .http_client
            .post(app.url("/v1/subscribe"))
            .header("Origin", origin)
            .json(&json!({"email": "a@b.com", "questions": []}))
            .send()
            .await?;

        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(
            Some(origin),
            headers.get(ALLOW_ORIGIN).and_then(|v| v.to_str().ok())
        );
        assert_eq!(
            Some("POST, GET, OPTIONS, PUT, DELETE"),
            headers.get(ALLOW_METHODS).and_then(|v| v.to_str().ok())
        );
        assert_eq!(
            Some("Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization"),
            headers.get(ALLOW_HEADERS).and_then(|v| v.to_str().ok())
        );
    }

    Ok(())
}

#[tokio::test]
async fn cors_allowed_origin_is_echoed_back_on_errors() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .http_client
        .post(app.url("/v1/subscribe"))
        .header("Origin", "https://codercat.tk")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        Some("https://codercat.tk"),
        res.headers().get(ALLOW_ORIGIN).and_then(|v| v.to_str().ok())
    );

    Ok(())
}

#[tokio::test]
async fn cors_unknown_or_missing_origin_gets_no_header() -> Result<()> {
    let app = TestApp::spawn().await?;

    let origins = [
        Some("https://evil.example"),
        Some("http://localhost:3001"),
        Some("https://codercat.tk/"),
        None,
    ];

    for origin in origins {
        let mut req = app
            .http_client
            .post(app.url("/v1/subscribe"))
            .json(&json!({"email": "a@b.com", "questions": []}));
        if let Some(origin) = origin {
            req = req.header("Origin", origin);
        }
        let res = req.send().await?;

        assert_eq!(res.status(), StatusCode::OK);
        for name in [ALLOW_ORIGIN, ALLOW_METHODS, ALLOW_HEADERS, "vary"] {
            assert!(
                res.headers().get(name).is_none(),
                "Unexpected {name} header for origin: {origin:?}"
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn cors_preflight_from_allowed_origin() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .http_client
        .request(Method::OPTIONS, app.url("/v1/subscribe"))
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(
        Some("http://localhost:3000"),
        headers.get(ALLOW_ORIGIN).and_then(|v| v.to_str().ok())
    );
    let methods = headers
        .get(ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(methods.contains("POST") && methods.contains("OPTIONS"), "{methods}");
    // Preflight requests never reach the handler.
    assert!(app.store.documents().is_empty());

    Ok(())
}

#[tokio::test]
async fn cors_preflight_from_unknown_origin_gets_no_header() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .http_client
        .request(Method::OPTIONS, app.url("/v1/subscribe"))
        .header("Origin", "https://evil.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    for name in [ALLOW_ORIGIN, ALLOW_METHODS, ALLOW_HEADERS, "vary"] {
        assert!(
            res.headers().get(name).is_none(),
            "Unexpected {name} header on a preflight from an unknown origin"
        );
    }
    // Not answered as a preflight, so it reaches the router which only takes POST.
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    Ok(())
}
