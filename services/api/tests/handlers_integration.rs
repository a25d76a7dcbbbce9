//! End-to-end handler tests for favorites, the shopping cart and subscriptions
//!
//! Requests go through the full router with a signed bearer token. They need
//! `TEST_DATABASE_URL` and are skipped when it is not set.

use api::{
    AppState, create_router,
    middleware::Claims,
    models::recipe::{IngredientAmount, RecipeDraft},
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod support;

use support::{JWT_SECRET, TestResult, create_ingredient, create_tag, create_user, setup};

fn bearer(user_id: i64) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

async fn send(app: &Router, method: Method, uri: &str, user_id: i64) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(user_id))
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_recipe(state: &AppState, author_id: i64) -> Result<i64, Box<dyn std::error::Error>> {
    let pool = &state.db_pool;
    let tag = create_tag(pool).await?;
    let flour = create_ingredient(pool, "flour", "g").await?;

    let draft = RecipeDraft {
        name: "Flatbread".to_string(),
        text: "Mix and fry.".to_string(),
        image: Some("data:image/png;base64,AAAA".to_string()),
        cooking_time: 15,
        tags: vec![tag],
        ingredients: vec![IngredientAmount { id: flour, amount: 250 }],
    };
    Ok(state.recipe_repository.create(author_id, &draft).await?)
}

#[tokio::test]
async fn test_favorite_twice_is_rejected() -> TestResult {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let author = create_user(&state).await?;
    let fan = create_user(&state).await?;
    let recipe_id = create_recipe(&state, author.id).await?;
    let app = create_router(state);
    let uri = format!("/api/recipes/{recipe_id}/favorite");

    let response = send(&app, Method::POST, &uri, fan.id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], recipe_id);
    assert_eq!(body["name"], "Flatbread");

    let response = send(&app, Method::POST, &uri, fan.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = send(&app, Method::DELETE, &uri, fan.id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, Method::DELETE, &uri, fan.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_cart_add_twice_and_remove_absent() -> TestResult {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let author = create_user(&state).await?;
    let shopper = create_user(&state).await?;
    let recipe_id = create_recipe(&state, author.id).await?;
    let app = create_router(state);
    let uri = format!("/api/recipes/{recipe_id}/shopping_cart");

    let response = send(&app, Method::DELETE, &uri, shopper.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = send(&app, Method::POST, &uri, shopper.id).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, Method::POST, &uri, shopper.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_relations_on_missing_recipe_are_not_found() -> TestResult {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let app = create_router(state);

    let response = send(&app, Method::POST, "/api/recipes/0/favorite", user.id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_subscribe_twice_and_unsubscribe_absent() -> TestResult {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let author = create_user(&state).await?;
    let reader = create_user(&state).await?;
    let app = create_router(state);
    let uri = format!("/api/users/{}/subscribe", author.id);

    let response = send(&app, Method::DELETE, &uri, reader.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = send(&app, Method::POST, &uri, reader.id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], author.id);
    assert_eq!(body["is_subscribed"], true);

    let response = send(&app, Method::POST, &uri, reader.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = send(&app, Method::DELETE, &uri, reader.id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn test_subscribing_to_yourself_is_a_field_error() -> TestResult {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;
    let app = create_router(state);
    let uri = format!("/api/users/{}/subscribe", user.id);

    let response = send(&app, Method::POST, &uri, user.id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["author"][0].is_string());

    Ok(())
}

#[tokio::test]
async fn test_password_update_reports_missing_user() -> TestResult {
    let Some(state) = setup().await? else {
        return Ok(());
    };
    let user = create_user(&state).await?;

    assert!(state.user_repository.update_password(user.id, "new-hash").await?);
    assert!(!state.user_repository.update_password(0, "new-hash").await?);

    Ok(())
}
