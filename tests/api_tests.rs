mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{PNG, ingredient_id, read_json, spawn_app, tag_id};
use foodgram::entities::{
    favorite_recipes, ingredient_amounts,
    prelude::{FavoriteRecipes, IngredientAmounts, ShoppingCartRecipes},
    shopping_cart_recipes,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = spawn_app().await;

    let (id, token) = app.user("alice").await;

    let (status, body) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_subscribed"], false);
    assert!(body.get("password").is_none());

    let (status, _) = app.get("/api/users/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/users/me", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_rejects_duplicates_and_bad_fields() {
    let app = spawn_app().await;
    app.user("bob").await;

    let (status, body) = app
        .post(
            "/api/users",
            None,
            json!({
                "email": "bob@example.com",
                "username": "bobby",
                "first_name": "Bob",
                "last_name": "Smith",
                "password": "another-pass",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    let (status, body) = app
        .post(
            "/api/users",
            None,
            json!({
                "email": "me@example.com",
                "username": "me",
                "first_name": "Me",
                "last_name": "Me",
                "password": "another-pass",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "username");

    let (status, body) = app
        .post("/api/users", None, json!({"email": "x@example.com"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = spawn_app().await;
    app.user("carol").await;

    let (status, _) = app
        .post(
            "/api/auth/token/login",
            None,
            json!({"email": "carol@example.com", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = spawn_app().await;
    let (_, token) = app.user("dave").await;

    let (status, _) = app.post("/api/auth/token/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_set_password() {
    let app = spawn_app().await;
    let (_, token) = app.user("erin").await;

    let (status, _) = app
        .post(
            "/api/users/set_password",
            Some(&token),
            json!({"current_password": "wrong", "new_password": "brand-new-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/users/set_password",
            Some(&token),
            json!({"current_password": "s3cret-pass", "new_password": "brand-new-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(
            "/api/auth/token/login",
            None,
            json!({"email": "erin@example.com", "password": "brand-new-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = spawn_app().await;

    let (status, tags) = app.get("/api/tags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 2);

    let (status, found) = app.get("/api/ingredients?name=su", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Sugar"]);

    let (status, _) = app.get("/api/ingredients/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/tags/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_create_and_read() {
    let app = spawn_app().await;
    let (author_id, token) = app.user("frank").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;

    let id = app.recipe(&token, "Soup", &[dinner], &[(salt, 5)]).await;

    let (status, recipe) = app.get(&format!("/api/recipes/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recipe["name"], "Soup");
    assert_eq!(recipe["author"]["id"], author_id);
    assert_eq!(recipe["tags"][0]["slug"], "dinner");
    assert_eq!(recipe["ingredients"][0]["name"], "Salt");
    assert_eq!(recipe["ingredients"][0]["amount"], 5);
    assert_eq!(recipe["is_favorited"], false);
    assert_eq!(recipe["is_in_shopping_cart"], false);
    assert!(
        recipe["image"]
            .as_str()
            .unwrap()
            .starts_with("/media/recipes/images/")
    );
}

#[tokio::test]
async fn test_recipe_validation() {
    let app = spawn_app().await;
    let (_, token) = app.user("grace").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;

    let base = json!({
        "name": "Stew",
        "text": "Slow cook.",
        "cooking_time": 60,
        "image": PNG,
        "tags": [dinner],
        "ingredients": [{"id": salt, "amount": 3}],
    });

    let cases = [
        ("tags", json!([])),
        ("tags", json!([dinner, dinner])),
        ("tags", json!([9999])),
        (
            "ingredients",
            json!([{"id": salt, "amount": 1}, {"id": salt, "amount": 2}]),
        ),
        ("ingredients", json!([])),
        ("ingredients", json!([{"id": 9999, "amount": 1}])),
        ("ingredients", json!([{"id": salt, "amount": 0}])),
        ("cooking_time", json!(0)),
        ("image", json!("not-an-image")),
    ];

    for (field, value) in cases {
        let mut payload = base.clone();
        payload[field] = value.clone();
        let (status, body) = app.post("/api/recipes", Some(&token), payload).await;
        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "{field} = {value} should be rejected"
        );
        assert_eq!(body["field"], field, "{field} = {value}: {body}");
    }

    let (status, _) = app.post("/api/recipes", None, base).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let app = spawn_app().await;
    let (_, token) = app.user("xena").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;

    let (status, body) = app
        .post(
            "/api/recipes",
            Some(&token),
            json!({
                "name": "Stew",
                "text": "Slow cook.",
                "cooking_time": 60,
                "image": PNG,
                "tags": [dinner],
                "ingredients": [{"id": salt, "amount": "lots"}],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");
    assert!(body["error"].is_string());

    let (status, body) = app
        .post("/api/users", None, json!({"email": ["not", "a", "string"]}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/token/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"email\": "))
                .unwrap(),
        )
        .await;
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_only_author_may_edit() {
    let app = spawn_app().await;
    let (_, owner) = app.user("heidi").await;
    let (_, other) = app.user("ivan").await;
    let salt = ingredient_id(&app, "Salt").await;
    let sugar = ingredient_id(&app, "Sugar").await;
    let dinner = tag_id(&app, "dinner").await;
    let breakfast = tag_id(&app, "breakfast").await;

    let id = app.recipe(&owner, "Porridge", &[breakfast], &[(salt, 1)]).await;
    let uri = format!("/api/recipes/{id}");

    let update = json!({
        "name": "Sweet porridge",
        "tags": [breakfast, dinner],
        "ingredients": [{"id": sugar, "amount": 20}],
    });

    let (status, _) = app.patch(&uri, Some(&other), update.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&uri, Some(&owner), update).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Sweet porridge");
    assert_eq!(body["tags"].as_array().unwrap().len(), 2);
    assert_eq!(body["ingredients"][0]["name"], "Sugar");
    assert_eq!(body["cooking_time"], 10);

    let (status, body) = app
        .patch(&uri, Some(&owner), json!({"name": "No links"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "ingredients");
}

#[tokio::test]
async fn test_delete_cascades() {
    let app = spawn_app().await;
    let (_, token) = app.user("judy").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;

    let id = app.recipe(&token, "Broth", &[dinner], &[(salt, 2)]).await;
    let uri = format!("/api/recipes/{id}");

    for kind in ["favorite", "shopping_cart"] {
        let (status, _) = app
            .post(&format!("{uri}/{kind}"), Some(&token), json!({}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app.delete(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let conn = &app.store().conn;
    let recipe_id = i32::try_from(id).unwrap();
    let lines = IngredientAmounts::find()
        .filter(ingredient_amounts::Column::RecipeId.eq(recipe_id))
        .count(conn)
        .await
        .unwrap();
    let favorites = FavoriteRecipes::find()
        .filter(favorite_recipes::Column::RecipeId.eq(recipe_id))
        .count(conn)
        .await
        .unwrap();
    let cart = ShoppingCartRecipes::find()
        .filter(shopping_cart_recipes::Column::RecipeId.eq(recipe_id))
        .count(conn)
        .await
        .unwrap();
    assert_eq!((lines, favorites, cart), (0, 0, 0));

    let (_, page) = app.get("/api/recipes?is_favorited=1", Some(&token)).await;
    assert_eq!(page["count"], 0);

    let (status, _) = app
        .get("/api/recipes/download_shopping_cart", Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for kind in ["favorite", "shopping_cart"] {
        let (status, _) = app
            .post(&format!("{uri}/{kind}"), Some(&token), json!({}))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{kind} on a deleted recipe");
    }
}

#[tokio::test]
async fn test_favorites_and_cart_conflicts() {
    let app = spawn_app().await;
    let (_, author) = app.user("ken").await;
    let (_, fan) = app.user("lena").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;

    let id = app.recipe(&author, "Fries", &[dinner], &[(salt, 4)]).await;

    for kind in ["favorite", "shopping_cart"] {
        let uri = format!("/api/recipes/{id}/{kind}");

        let (status, body) = app.post(&uri, Some(&fan), json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], id);
        assert_eq!(body["name"], "Fries");
        assert!(body.get("tags").is_none());

        let (status, _) = app.post(&uri, Some(&fan), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.delete(&uri, Some(&fan)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.delete(&uri, Some(&fan)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.post(&uri, None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = app
        .post("/api/recipes/9999/favorite", Some(&fan), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_viewer_flags_and_filters() {
    let app = spawn_app().await;
    let (author_id, author) = app.user("mia").await;
    let (_, fan) = app.user("ned").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;
    let breakfast = tag_id(&app, "breakfast").await;

    let eggs = app.recipe(&author, "Eggs", &[breakfast], &[(salt, 1)]).await;
    let steak = app.recipe(&author, "Steak", &[dinner], &[(salt, 2)]).await;

    app.post(&format!("/api/recipes/{steak}/favorite"), Some(&fan), json!({}))
        .await;

    let (_, recipe) = app.get(&format!("/api/recipes/{steak}"), Some(&fan)).await;
    assert_eq!(recipe["is_favorited"], true);

    let (_, recipe) = app.get(&format!("/api/recipes/{steak}"), None).await;
    assert_eq!(recipe["is_favorited"], false);

    let (_, page) = app.get("/api/recipes?is_favorited=1", Some(&fan)).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["id"], steak);

    // ignored for anonymous viewers
    let (_, page) = app.get("/api/recipes?is_favorited=1", None).await;
    assert_eq!(page["count"], 2);

    let (_, page) = app.get("/api/recipes?tags=breakfast", None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["id"], eggs);

    let (_, page) = app
        .get("/api/recipes?tags=breakfast&tags=dinner", None)
        .await;
    assert_eq!(page["count"], 2);
    // newest first
    assert_eq!(page["results"][0]["id"], steak);

    let (_, page) = app
        .get(&format!("/api/recipes?author={author_id}"), None)
        .await;
    assert_eq!(page["count"], 2);
}

#[tokio::test]
async fn test_subscriptions() {
    let app = spawn_app().await;
    let (author_id, author) = app.user("olga").await;
    let (me_id, me) = app.user("pete").await;
    let salt = ingredient_id(&app, "Salt").await;
    let dinner = tag_id(&app, "dinner").await;

    for name in ["One", "Two", "Three"] {
        app.recipe(&author, name, &[dinner], &[(salt, 1)]).await;
    }

    let uri = format!("/api/users/{author_id}/subscribe?recipes_limit=2");
    let (status, body) = app.post(&uri, Some(&me), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], author_id);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 3);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);

    let (status, _) = app.post(&uri, Some(&me), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(&format!("/api/users/{me_id}/subscribe"), Some(&me), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "author");

    let (status, _) = app
        .post("/api/users/9999/subscribe", Some(&me), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, page) = app
        .get("/api/users/subscriptions?recipes_limit=1", Some(&me))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["recipes"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .delete(&format!("/api/users/{me_id}/subscribe"), Some(&me))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "author");

    let (_, profile) = app.get(&format!("/api/users/{author_id}"), Some(&me)).await;
    assert_eq!(profile["is_subscribed"], true);

    let (_, profile) = app.get(&format!("/api/users/{author_id}"), None).await;
    assert_eq!(profile["is_subscribed"], false);

    let (_, page) = app.get("/api/users", None).await;
    assert!(
        page["results"]
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["is_subscribed"] == false)
    );

    let unsubscribe = format!("/api/users/{author_id}/subscribe");
    let (status, _) = app.delete(&unsubscribe, Some(&me)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.delete(&unsubscribe, Some(&me)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = app.get("/api/users/subscriptions", Some(&me)).await;
    assert_eq!(page["count"], 0);
    assert!(page["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pagination() {
    let app = spawn_app().await;
    for i in 0..5 {
        app.user(&format!("user{i}")).await;
    }

    let (status, page) = app.get("/api/users?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 5);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert!(page["previous"].is_null());
    assert!(page["next"].as_str().unwrap().contains("page=2"));

    let (_, last) = app.get("/api/users?limit=2&page=3", None).await;
    assert_eq!(last["results"].as_array().unwrap().len(), 1);
    assert!(last["next"].is_null());
    assert!(last["previous"].as_str().unwrap().contains("page=2"));

    let (status, _) = app.get("/api/users?limit=2&page=4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/users?page=abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_huge_page_numbers_are_not_found() {
    let app = spawn_app().await;
    app.user("tina").await;

    for uri in [
        "/api/users?page=18446744073709551615",
        "/api/users?page=9223372036854775807&limit=2",
        "/api/recipes?page=18446744073709551615&limit=100",
    ] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"], "Invalid page");
    }

    let (_, token) = app.user("uma").await;
    let (status, _) = app
        .get("/api/users/subscriptions?page=18446744073709551615", Some(&token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipes_limit_out_of_range() {
    let app = spawn_app().await;
    let (author_id, _) = app.user("vera").await;
    let (_, me) = app.user("walt").await;

    let (status, body) = app
        .post(
            &format!("/api/users/{author_id}/subscribe?recipes_limit=18446744073709551615"),
            Some(&me),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "recipes_limit");

    // rejected before anything was written
    let (_, profile) = app.get(&format!("/api/users/{author_id}"), Some(&me)).await;
    assert_eq!(profile["is_subscribed"], false);

    let (status, body) = app
        .get(
            "/api/users/subscriptions?recipes_limit=18446744073709551615",
            Some(&me),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "recipes_limit");

    let (status, _) = app
        .post(
            &format!("/api/users/{author_id}/subscribe?recipes_limit=4294967295"),
            Some(&me),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_trailing_slash_is_accepted() {
    let app = spawn_app().await;

    let (status, _) = app.get("/api/tags/", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/recipes/", None).await;
    assert_eq!(status, StatusCode::OK);
}
