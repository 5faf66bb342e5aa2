mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use hat_store::{
    middleware::auth::AuthUser, routes::create_api_router, services::auth_service::issue_token,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{TEST_SECRET, create_product, create_user, setup_state};

fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_api_router())
        .with_state(state)
}

fn bearer(user: &AuthUser) -> String {
    let token = issue_token(TEST_SECRET, user.user_id, &user.role, user.name.clone())
        .expect("token");
    format!("Bearer {token}")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

fn error_text(body: &Value) -> &str {
    body["data"]["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn post_returns_created_review() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "wool-trilby", 4500, "Classics").await?;
    let app = app(state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        None,
        Some(json!({ "productId": product.id, "rating": 4, "title": "Snug" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["review"]["productId"], json!(product.id));
    assert_eq!(body["review"]["rating"], json!(4));
    assert_eq!(body["review"]["userName"], json!("Anonymous"));
    assert_eq!(body["review"]["verified"], json!(false));
    Ok(())
}

#[tokio::test]
async fn non_integer_ratings_are_bad_requests() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "wool-trilby", 4500, "Classics").await?;
    let app = app(state);

    for rating in [json!(3.5), json!("4")] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/reviews",
            None,
            Some(json!({ "productId": product.id, "rating": rating })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {rating}");
        assert!(error_text(&body).contains("rating"), "{body}");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_bearer_on_post_is_unauthorized() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "wool-trilby", 4500, "Classics").await?;
    let app = app(state);

    for auth in ["Bearer not-a-jwt", "Token abc"] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/reviews",
            Some(auth),
            Some(json!({ "productId": product.id, "rating": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{auth}");
    }
    Ok(())
}

#[tokio::test]
async fn mutations_without_session_are_unauthorized() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "wool-trilby", 4500, "Classics").await?;
    let app = app(state);

    let (_, created) = send(
        &app,
        Method::POST,
        "/api/reviews",
        None,
        Some(json!({ "productId": product.id, "rating": 5 })),
    )
    .await;
    let review_id = created["review"]["id"].as_str().expect("review id").to_string();

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/reviews",
        None,
        Some(json!({ "reviewId": review_id, "title": "Changed" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/reviews?reviewId={review_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::DELETE, "/api/reviews", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_text(&body).contains("reviewId"), "{body}");
    Ok(())
}

#[tokio::test]
async fn owner_updates_then_deletes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let product = create_product(&state, "wool-trilby", 4500, "Classics").await?;
    let owner = create_user(&state, "user", "Hat Owner").await?;
    let stranger = create_user(&state, "user", "Passer By").await?;
    let owner_auth = bearer(&owner);
    let app = app(state);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&owner_auth),
        Some(json!({ "productId": product.id, "rating": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["review"]["verified"], json!(true));
    assert_eq!(created["review"]["userName"], json!("Hat Owner"));
    let review_id = created["review"]["id"].as_str().expect("review id").to_string();

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/reviews",
        Some(&bearer(&stranger)),
        Some(json!({ "reviewId": review_id, "rating": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        "/api/reviews",
        Some(&owner_auth),
        Some(json!({ "reviewId": review_id, "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["success"], json!(true));
    assert_eq!(updated["review"]["rating"], json!(5));

    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/api/reviews?reviewId={review_id}"),
        Some(&owner_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({ "success": true }));

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/api/reviews?productId={}", product.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
    Ok(())
}
