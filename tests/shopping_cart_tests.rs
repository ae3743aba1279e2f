mod common;

use axum::http::{StatusCode, header};
use common::{build, ingredient_id, spawn_app, tag_id};
use http_body_util::BodyExt;
use serde_json::json;

#[tokio::test]
async fn test_download_sums_amounts_per_ingredient() {
    let app = spawn_app().await;
    let (_, token) = app.user("quinn").await;
    let salt = ingredient_id(&app, "Salt").await;
    let milk = ingredient_id(&app, "Milk").await;
    let dinner = tag_id(&app, "dinner").await;

    let soup = app.recipe(&token, "Soup", &[dinner], &[(salt, 5)]).await;
    let stew = app
        .recipe(&token, "Stew", &[dinner], &[(salt, 10), (milk, 200)])
        .await;
    // not in the cart
    app.recipe(&token, "Pie", &[dinner], &[(salt, 100)]).await;

    for id in [soup, stew] {
        let (status, _) = app
            .post(&format!("/api/recipes/{id}/shopping_cart"), Some(&token), json!({}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = app
        .send(build(
            "GET",
            "/api/recipes/download_shopping_cart",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("attachment")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.starts_with("Shopping list for quinn"));
    assert!(text.contains("- Salt, g - 15\n"), "{text}");
    assert!(text.contains("- Milk, ml - 200\n"), "{text}");
    assert_eq!(text.matches("Salt").count(), 1);
}

#[tokio::test]
async fn test_download_with_empty_cart_is_not_found() {
    let app = spawn_app().await;
    let (_, token) = app.user("rosa").await;

    let (status, body) = app
        .get("/api/recipes/download_shopping_cart", Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/recipes/download_shopping_cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_filter_follows_membership() {
    let app = spawn_app().await;
    let (_, token) = app.user("sam").await;
    let sugar = ingredient_id(&app, "Sugar").await;
    let breakfast = tag_id(&app, "breakfast").await;

    let id = app.recipe(&token, "Pancakes", &[breakfast], &[(sugar, 30)]).await;
    app.post(&format!("/api/recipes/{id}/shopping_cart"), Some(&token), json!({}))
        .await;

    let (_, page) = app
        .get("/api/recipes?is_in_shopping_cart=1", Some(&token))
        .await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["is_in_shopping_cart"], true);

    app.delete(&format!("/api/recipes/{id}/shopping_cart"), Some(&token))
        .await;

    let (_, page) = app
        .get("/api/recipes?is_in_shopping_cart=1", Some(&token))
        .await;
    assert_eq!(page["count"], 0);
}
