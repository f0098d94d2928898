//! Central module for organizing the application's HTTP API.
//!
//! Builds the complete router: authentication, the customer cart and order
//! endpoints, staff tooling and the internal catalog gate. Shared state is
//! attached once at the top so every handler and middleware can reach it.

pub mod cart;
pub mod catalog;
pub mod common;
pub mod order;

use crate::api::common::ApiResponse;
use crate::auth::middleware::{jwt_auth, staff_auth};
use crate::state::AppState;
use axum::{Extension, Router, middleware, response::Json, routing::get};

/// Assembles every route of the service around the given state
pub fn router(state: AppState) -> Router {
    let staff = Router::new()
        .nest("/catalog", catalog::routes::staff_catalog_router())
        .nest("/order", order::routes::staff_order_router())
        .route_layer(middleware::from_fn(staff_auth))
        .route_layer(middleware::from_fn(jwt_auth));

    Router::new()
        .route("/", get(root_handler))
        .nest("/auth", crate::auth::routes::auth_router())
        .nest("/cart", cart::routes::cart_router())
        .nest("/order", order::routes::order_router())
        .nest("/staff", staff)
        .nest("/internal/catalog", catalog::routes::internal_catalog_router())
        .layer(Extension(state))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Storefront Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the Storefront API",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::Database;
    use crate::services::reservation_gate::{HttpReservationGate, ReservationGate, SERVICE_KEY_HEADER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_app() -> (Router, AppState) {
        let db = Database::in_memory().await.unwrap();
        let state = AppState::new(db.pool().clone(), Config::for_tests()).unwrap();
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, path: &str, login: &str) -> Value {
        let (status, body) = send(
            app,
            "POST",
            path,
            None,
            Some(json!({"login": login, "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn user_token(app: &Router, login: &str) -> String {
        register(app, "/auth/register", login).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn staff_token(app: &Router, login: &str) -> String {
        register(app, "/auth/staff/register", login).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn create_item(app: &Router, staff: &str, quantity: i64) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/staff/catalog/items",
            Some(staff),
            Some(json!({
                "name": "Kettle",
                "price": 2500,
                "category": "kitchen",
                "quantity": quantity
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["item_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, "GET", "/", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["service"], "Storefront Backend");
    }

    #[tokio::test]
    async fn test_auth_endpoints() {
        let (app, _) = test_app().await;
        let credentials = json!({"login": "abc", "password": "abc"});

        let (status, _) = send(&app, "POST", "/auth/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/auth/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["error_type"], "already_exists");

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"login": "abc", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/auth/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_refresh_replay_is_bad_request() {
        let (app, _) = test_app().await;
        let tokens = register(&app, "/auth/register", "abc").await;
        let refresh = json!({"refresh_token": tokens["refresh_token"]});

        let (status, rotated) = send(&app, "POST", "/auth/refresh", None, Some(refresh.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(rotated["refresh_token"], tokens["refresh_token"]);

        let (status, body) = send(&app, "POST", "/auth/refresh", None, Some(refresh)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (app, _) = test_app().await;

        let (status, _) = send(&app, "GET", "/cart/list", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "POST", "/order/place", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_staff_routes_reject_user_tokens() {
        let (app, _) = test_app().await;
        let user = user_token(&app, "shopper").await;

        let (status, body) = send(
            &app,
            "POST",
            "/staff/catalog/items",
            Some(&user),
            Some(json!({"name": "x", "price": 1, "category": "y", "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["error_type"], "permission_denied");
    }

    #[tokio::test]
    async fn test_customer_routes_reject_staff_tokens() {
        let (app, _) = test_app().await;
        let staff = staff_token(&app, "clerk").await;

        let (status, body) = send(
            &app,
            "POST",
            "/cart/add",
            Some(&staff),
            Some(json!({"item_id": "x", "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["error_type"], "permission_denied");

        let (status, _) = send(&app, "POST", "/order/place", Some(&staff), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "GET", "/order/list", Some(&staff), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cart_endpoints() {
        let (app, _) = test_app().await;
        let user = user_token(&app, "shopper").await;

        for (path, qty) in [("/cart/add", 2), ("/cart/increase", 3), ("/cart/decrease", 1)] {
            let (status, body) = send(
                &app,
                "POST",
                path,
                Some(&user),
                Some(json!({"item_id": "x", "quantity": qty})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
        }

        let (_, listed) = send(&app, "GET", "/cart/list", Some(&user), None).await;
        assert_eq!(listed, json!({"item_ids": ["x"], "quantities": [4]}));

        let (status, body) = send(
            &app,
            "POST",
            "/cart/add",
            Some(&user),
            Some(json!({"item_id": "y", "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["error_type"], "validation_error");

        let (status, body) = send(
            &app,
            "POST",
            "/cart/increase",
            Some(&user),
            Some(json!({"item_id": "x", "quantity": i64::MAX})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["error_type"], "validation_error");

        let (status, body) = send(
            &app,
            "POST",
            "/cart/add",
            Some(&user),
            Some(json!({"item_id": "x", "quantity": 1000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["error_type"], "invalid_operation");

        let (status, _) = send(
            &app,
            "POST",
            "/cart/remove",
            Some(&user),
            Some(json!({"item_id": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/cart/clear", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, listed) = send(&app, "GET", "/cart/list", Some(&user), None).await;
        assert_eq!(listed, json!({"item_ids": [], "quantities": []}));
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let (app, _) = test_app().await;
        let staff = staff_token(&app, "clerk").await;
        let item_id = create_item(&app, &staff, 1).await;

        let tokens = register(&app, "/auth/register", "shopper").await;
        let user = tokens["access_token"].as_str().unwrap().to_string();
        let user_id = crate::utils::jwt::JwtUtils::new(&Config::for_tests())
            .validate_token(&user)
            .unwrap()
            .sub;

        send(
            &app,
            "POST",
            "/cart/add",
            Some(&user),
            Some(json!({"item_id": item_id, "quantity": 3})),
        )
        .await;

        let (status, placed) = send(&app, "POST", "/order/place", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(placed["status"], "ok");
        assert_eq!(placed["order_id"], 1);
        assert_eq!(placed["items"][0]["requested"], 3);
        assert_eq!(placed["items"][0]["reserved"], 1);

        let (_, cart) = send(&app, "GET", "/cart/list", Some(&user), None).await;
        assert_eq!(cart["item_ids"], json!([]));

        let (_, items) = send(&app, "GET", "/order/items?order_id=1", Some(&user), None).await;
        assert_eq!(items, json!({"item_ids": [item_id], "quantities": [1]}));

        let (_, status_body) = send(&app, "GET", "/order/status?order_id=1", Some(&user), None).await;
        assert_eq!(status_body["status"], "CREATED");

        for expected in ["PREPARING", "DELIVERY", "FINISHED"] {
            let (status, body) = send(
                &app,
                "POST",
                "/staff/order/advance",
                Some(&staff),
                Some(json!({"user_id": user_id, "order_id": 1})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], expected);
        }

        let (status, body) = send(
            &app,
            "POST",
            "/order/remove",
            Some(&user),
            Some(json!({"order_id": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["error_type"], "already_finished");

        let (_, listed) = send(&app, "GET", "/order/list?status=finished", Some(&user), None).await;
        assert_eq!(listed, json!({"order_ids": [1], "statuses": ["FINISHED"]}));

        let (status, _) = send(&app, "GET", "/order/list?status=LOST", Some(&user), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cancel_returns_stock() {
        let (app, _) = test_app().await;
        let staff = staff_token(&app, "clerk").await;
        let item_id = create_item(&app, &staff, 2).await;
        let user = user_token(&app, "shopper").await;

        send(
            &app,
            "POST",
            "/cart/add",
            Some(&user),
            Some(json!({"item_id": item_id, "quantity": 2})),
        )
        .await;
        send(&app, "POST", "/order/place", Some(&user), None).await;

        let item_uri = format!("/staff/catalog/item?item_id={}", item_id);
        let (_, item) = send(&app, "GET", &item_uri, Some(&staff), None).await;
        assert_eq!(item["data"]["quantity"], 0);

        let (status, _) = send(
            &app,
            "POST",
            "/order/remove",
            Some(&user),
            Some(json!({"order_id": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, item) = send(&app, "GET", &item_uri, Some(&staff), None).await;
        assert_eq!(item["data"]["quantity"], 2);

        let (_, listed) = send(&app, "GET", "/order/list", Some(&user), None).await;
        assert_eq!(listed["statuses"], json!(["CANCELLED"]));
    }

    #[tokio::test]
    async fn test_internal_routes_require_service_key() {
        let (app, state) = test_app().await;
        let staff = staff_token(&app, "clerk").await;
        let item_id = create_item(&app, &staff, 1).await;
        let body = json!({"item_ids": [item_id.clone(), item_id]});

        let (status, _) = send(&app, "POST", "/internal/catalog/reserve", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let forged = Request::builder()
            .method("POST")
            .uri("/internal/catalog/reserve")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SERVICE_KEY_HEADER, format!("{}x", state.config.service_key))
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let response = app.clone().oneshot(forged).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::builder()
            .method("POST")
            .uri("/internal/catalog/reserve")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SERVICE_KEY_HEADER, state.config.service_key.as_str())
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let reply: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(reply["data"]["successful"], json!([true, false]));
    }

    #[tokio::test]
    async fn test_http_gate_against_live_catalog() {
        let (app, state) = test_app().await;
        let item = state
            .catalog
            .create_item(
                "staff-1",
                crate::database::models::CreateCatalogItem {
                    name: "Teapot".to_string(),
                    description: String::new(),
                    price: 1200,
                    category: "kitchen".to_string(),
                    quantity: 1,
                },
            )
            .await
            .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let gate = HttpReservationGate::new(&base_url, &state.config.service_key, 2000).unwrap();
        let ids = vec![item.item_id.clone(), item.item_id.clone()];

        assert_eq!(gate.reserve(&ids).await.unwrap(), vec![true, false]);
        gate.release(&ids[..1]).await.unwrap();
        assert_eq!(
            state.catalog.get_item_required(&item.item_id).await.unwrap().quantity,
            1
        );

        let intruder = HttpReservationGate::new(&base_url, "wrong-key", 2000).unwrap();
        let err = intruder.reserve(&ids).await.unwrap_err();
        assert!(matches!(err, crate::errors::ServiceError::ExternalService { .. }));
    }
}
