use axum::{
    body::{Body, BodyDataStream},
    http::{Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use starlinker_api::{app, auth::mint_token, state::{AppState, AuthConfig}, BroadcastEventSink};
use starlinker_catalog::{NewProduct, Product, ProductCondition, ProductRepository};
use starlinker_core::Role;
use starlinker_order::{MemoryStore, OrderTracker, TrackerConfig};
use starlinker_store::app_config::BusinessRules;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    buyer: String,
    stranger: String,
    admin: String,
}

fn token(role: Role) -> String {
    mint_token(SECRET, Uuid::new_v4(), role, 300).unwrap()
}

fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let (delivery_tx, _) = broadcast::channel(16);
    let tracker = OrderTracker::new(
        store.clone(),
        Arc::new(BroadcastEventSink::new(delivery_tx.clone())),
        TrackerConfig::default(),
    )
    .unwrap();

    let state = AppState {
        tracker: Arc::new(tracker),
        redis: None,
        delivery_tx,
        auth: AuthConfig { secret: SECRET.to_string(), expiration: 300 },
        business_rules: BusinessRules::default(),
    };

    TestApp {
        router: app(state),
        store,
        buyer: token(Role::User),
        stranger: token(Role::User),
        admin: token(Role::Admin),
    }
}

async fn listed(store: &MemoryStore, price: i64, stock: i32) -> Product {
    let product = NewProduct {
        seller_id: Uuid::new_v4(),
        title: format!("Listing at {}", price),
        description: None,
        category: "Electronics".to_string(),
        condition: ProductCondition::Good,
        price,
        stock_quantity: stock,
        location: None,
    }
    .into_product()
    .unwrap();
    store.create_product(&product).await.unwrap();
    product
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn order_body(lines: &[(&Product, u32)]) -> Value {
    json!({
        "items": lines
            .iter()
            .map(|(p, q)| json!({"product_id": p.id, "quantity": q}))
            .collect::<Vec<_>>(),
        "delivery": {
            "address": "9 Tom Mboya Street",
            "city": "Nairobi",
            "phone": "+254722000000",
            "notes": null
        }
    })
}

async fn place(t: &TestApp, lines: &[(&Product, u32)]) -> Value {
    let (status, body) =
        send(&t.router, "POST", "/v1/orders", Some(&t.buyer), Some(order_body(lines))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn advance(t: &TestApp, delivery_id: &str, status: &str) -> (StatusCode, Value) {
    send(
        &t.router,
        "POST",
        &format!("/v1/admin/deliveries/{}/status", delivery_id),
        Some(&t.admin),
        Some(json!({"status": status, "location": "Mombasa Road hub"})),
    )
    .await
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let t = test_app();
    let (status, body) = send(&t.router, "GET", "/v1/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&t.router, "GET", "/v1/orders", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_place_order_and_view_it() {
    let t = test_app();
    let p = listed(&t.store, 1000, 5).await;
    let q = listed(&t.store, 500, 5).await;

    let placed = place(&t, &[(&p, 2), (&q, 1)]).await;
    assert_eq!(placed["order"]["total"], 2500);
    assert_eq!(placed["order"]["status"], "pending");
    assert_eq!(placed["delivery"]["status"], "pending");
    assert_eq!(t.store.stock_of(p.id).await, Some(3));

    let order_id = placed["order"]["id"].as_str().unwrap();
    let (status, view) =
        send(&t.router, "GET", &format!("/v1/orders/{}", order_id), Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["items"].as_array().unwrap().len(), 2);
    assert_eq!(view["progress"]["steps"][0]["label"], "Order Placed");
    assert_eq!(view["progress"]["steps"][0]["state"], "current");
    assert_eq!(view["reconciled"], true);

    let (status, list) = send(&t.router, "GET", "/v1/orders", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_users_cannot_see_an_order() {
    let t = test_app();
    let p = listed(&t.store, 1000, 5).await;
    let placed = place(&t, &[(&p, 1)]).await;
    let order_id = placed["order"]["id"].as_str().unwrap();

    let (status, _) =
        send(&t.router, "GET", &format!("/v1/orders/{}", order_id), Some(&t.stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insufficient_stock_is_a_bad_request() {
    let t = test_app();
    let p = listed(&t.store, 1000, 2).await;

    let (status, _) = send(
        &t.router,
        "POST",
        "/v1/orders",
        Some(&t.buyer),
        Some(order_body(&[(&p, 2), (&p, 1)])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.store.stock_of(p.id).await, Some(2));
}

#[tokio::test]
async fn test_delivery_progression_and_review_flow() {
    let t = test_app();
    let p = listed(&t.store, 1200, 3).await;
    let placed = place(&t, &[(&p, 1)]).await;
    let order_id = placed["order"]["id"].as_str().unwrap().to_string();
    let delivery_id = placed["delivery"]["id"].as_str().unwrap().to_string();
    let review_uri = format!("/v1/orders/{}/reviews", order_id);
    let review = json!({"product_id": p.id, "rating": 5, "comment": "Fast courier"});

    // Not delivered yet
    let (status, _) =
        send(&t.router, "POST", &review_uri, Some(&t.buyer), Some(review.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Buyers cannot move deliveries
    let (status, _) = send(
        &t.router,
        "POST",
        &format!("/v1/admin/deliveries/{}/status", delivery_id),
        Some(&t.buyer),
        Some(json!({"status": "picked_up"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = advance(&t, &delivery_id, "picked_up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_location"], "Mombasa Road hub");

    let (status, _) = advance(&t, &delivery_id, "teleported").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = advance(&t, &delivery_id, "pending").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = advance(&t, &delivery_id, "delivered").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["delivered_at"].is_string());

    let (_, view) =
        send(&t.router, "GET", &format!("/v1/orders/{}", order_id), Some(&t.buyer), None).await;
    assert_eq!(view["order"]["status"], "delivered");
    assert_eq!(view["items"][0]["can_review"], true);

    let (status, created) =
        send(&t.router, "POST", &review_uri, Some(&t.buyer), Some(review.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rating"], 5);

    let (status, _) = send(&t.router, "POST", &review_uri, Some(&t.buyer), Some(review)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, reviews) =
        send(&t.router, "GET", &format!("/v1/products/{}/reviews", p.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews["summary"]["count"], 1);
    assert_eq!(reviews["summary"]["average"], 5.0);
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let t = test_app();
    let p = listed(&t.store, 300, 3).await;
    let placed = place(&t, &[(&p, 1)]).await;
    let order_id = placed["order"]["id"].as_str().unwrap();
    let delivery_id = placed["delivery"]["id"].as_str().unwrap();
    advance(&t, delivery_id, "delivered").await;

    let (status, _) = send(
        &t.router,
        "POST",
        &format!("/v1/orders/{}/reviews", order_id),
        Some(&t.buyer),
        Some(json!({"product_id": p.id, "rating": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_restocks_and_freezes_the_order() {
    let t = test_app();
    let p = listed(&t.store, 700, 4).await;
    let placed = place(&t, &[(&p, 3)]).await;
    let order_id = placed["order"]["id"].as_str().unwrap();
    let delivery_id = placed["delivery"]["id"].as_str().unwrap();
    assert_eq!(t.store.stock_of(p.id).await, Some(1));

    let (status, view) = send(
        &t.router,
        "POST",
        &format!("/v1/orders/{}/cancel", order_id),
        Some(&t.buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["order"]["status"], "cancelled");
    assert_eq!(view["progress"]["halted"], true);
    assert_eq!(t.store.stock_of(p.id).await, Some(4));

    let (status, _) = advance(&t, delivery_id, "picked_up").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &t.router,
        "PATCH",
        &format!("/v1/admin/deliveries/{}", delivery_id),
        Some(&t.admin),
        Some(json!({"current_location": "Returned to seller"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_deliveries_and_creates_products() {
    let t = test_app();
    let p = listed(&t.store, 100, 1).await;
    place(&t, &[(&p, 1)]).await;

    let (status, _) = send(&t.router, "GET", "/v1/admin/deliveries", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listing) =
        send(&t.router, "GET", "/v1/admin/deliveries", Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["order_total"], 100);

    let product = json!({
        "title": "Starlink Mini",
        "category": "Internet",
        "condition": "like_new",
        "price": 45000,
        "stock_quantity": 2
    });
    let (status, _) =
        send(&t.router, "POST", "/v1/admin/products", Some(&t.buyer), Some(product.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) =
        send(&t.router, "POST", "/v1/admin/products", Some(&t.admin), Some(product)).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/v1/products/{}", created["id"].as_str().unwrap());
    let (status, fetched) = send(&t.router, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Starlink Mini");
    assert_eq!(fetched["condition"], "like_new");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let t = test_app();
    let (status, _) =
        send(&t.router, "GET", &format!("/v1/products/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Reads one server-sent event and returns its name and JSON data.
async fn next_event(body: &mut BodyDataStream) -> (String, Value) {
    let mut text = String::new();
    loop {
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("no event within 5s")
            .expect("stream ended")
            .unwrap();
        text.push_str(std::str::from_utf8(&chunk).unwrap());
        if text.ends_with("\n\n") {
            // Keep-alive comments carry no event.
            if !text.starts_with(':') {
                break;
            }
            text.clear();
        }
    }

    let field = |name: &str| {
        text.lines()
            .find_map(|l| l.strip_prefix(name))
            .map(|v| v.trim_start().to_string())
            .unwrap_or_default()
    };
    let data = serde_json::from_str(&field("data:")).unwrap_or(Value::Null);
    (field("event:"), data)
}

#[tokio::test]
async fn test_delivery_stream_reports_only_this_order() {
    let t = test_app();
    let p = listed(&t.store, 700, 5).await;
    let mine = place(&t, &[(&p, 1)]).await;
    let other = place(&t, &[(&p, 1)]).await;
    let order_id = mine["order"]["id"].as_str().unwrap().to_string();
    let uri = format!("/v1/orders/{}/delivery/stream", order_id);

    let (status, _) = send(&t.router, "GET", &uri, Some(&t.stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri(&uri)
        .header("Authorization", format!("Bearer {}", t.buyer))
        .body(Body::empty())
        .unwrap();
    let response = t.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));
    let mut body = response.into_body().into_data_stream();

    let (event, progress) = next_event(&mut body).await;
    assert_eq!(event, "progress");
    assert_eq!(progress["status"], "pending");

    let (status, _) = advance(&t, other["delivery"]["id"].as_str().unwrap(), "picked_up").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = advance(&t, mine["delivery"]["id"].as_str().unwrap(), "in_transit").await;
    assert_eq!(status, StatusCode::OK);

    let (event, change) = next_event(&mut body).await;
    assert_eq!(event, "delivery_status");
    assert_eq!(change["order_id"], order_id.as_str());
    assert_eq!(change["from_status"], "pending");
    assert_eq!(change["to_status"], "in_transit");
    assert_eq!(change["current_location"], "Mombasa Road hub");
}

#[tokio::test]
async fn test_admin_stats() {
    let t = test_app();
    let p = listed(&t.store, 1500, 5).await;
    place(&t, &[(&p, 2)]).await;

    let (status, _) = send(&t.router, "GET", "/v1/admin/stats", Some(&t.buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, stats) = send(&t.router, "GET", "/v1/admin/stats", Some(&t.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["order_count"], 1);
    assert_eq!(stats["revenue"], 3000);
    assert_eq!(stats["average_order_value"], 3000);
    assert_eq!(stats["cancelled_count"], 0);
}
