//! Order and item endpoint integration tests, including cache coherence.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::{login, sample_order, send, test_app};

#[tokio::test]
async fn create_then_get_order() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-1001")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["orderNumber"], "ORD-1001");
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["paymentStatus"], "UNPAID");
    assert_eq!(created["totalAmount"], 200.0);
    assert_eq!(created["items"].as_array().unwrap().len(), 1);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/orders/{id}"), Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_sets_location_header() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(sample_order("ORD-LOC").to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("/api/orders/"));
}

#[tokio::test]
async fn create_rejects_invalid_payload_with_field_errors() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(json!({
            "orderNumber": "  ",
            "customerName": "",
            "items": [{
                "sku": "",
                "name": "Widget",
                "quantity": 0,
                "unitPrice": -1.0
            }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    let errors = &body["validationErrors"];
    assert!(errors["orderNumber"].is_string());
    assert!(errors["customerName"].is_string());
    assert!(errors["items[0].sku"].is_string());
    assert!(errors["items[0].quantity"].is_string());
    assert!(errors["items[0].unitPrice"].is_string());
}

#[tokio::test]
async fn create_rejects_empty_items() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(json!({
            "orderNumber": "ORD-EMPTY",
            "customerName": "Test Customer",
            "items": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["validationErrors"]["items"].is_string());
}

#[tokio::test]
async fn duplicate_order_number_conflicts() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-DUP")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-DUP")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (status, body) = send(&app, "GET", "/api/orders/9999", Some(&access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/orders/9999",
        Some(&access),
        Some(sample_order("ORD-MISS")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/orders/9999", Some(&access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_paginates_and_reports_totals() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    for n in 0..5 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/orders",
            Some(&access),
            Some(sample_order(&format!("ORD-PAGE-{n}"))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "GET",
        "/api/orders?page=1&size=2&sortBy=orderNumber&sortDir=asc",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 2);
    assert_eq!(body["totalElements"], 5);
    assert_eq!(body["totalPages"], 3);
    let content = body["content"].as_array().unwrap();
    assert_eq!(content.len(), 2);
    assert_eq!(content[0]["orderNumber"], "ORD-PAGE-2");
    assert_eq!(content[1]["orderNumber"], "ORD-PAGE-3");
}

#[tokio::test]
async fn list_reflects_orders_created_after_it_was_cached() {
    let (app, state) = test_app().await;
    let (access, _) = login(&app).await;

    let (_, first) = send(&app, "GET", "/api/orders", Some(&access), None).await;
    assert_eq!(first["totalElements"], 0);
    assert!(!state.cache.read().await.is_empty());

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-FRESH")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, second) = send(&app, "GET", "/api/orders", Some(&access), None).await;
    assert_eq!(second["totalElements"], 1);
    assert_eq!(second["content"][0]["orderNumber"], "ORD-FRESH");
}

#[tokio::test]
async fn get_reflects_updates_made_after_it_was_cached() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-UPD")),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    // Prime the per-order cache entry.
    let (_, _) = send(&app, "GET", &format!("/api/orders/{id}"), Some(&access), None).await;

    let mut updated = sample_order("ORD-UPD");
    updated["customerName"] = json!("Renamed Customer");
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}"),
        Some(&access),
        Some(updated),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customerName"], "Renamed Customer");

    let (_, fetched) = send(&app, "GET", &format!("/api/orders/{id}"), Some(&access), None).await;
    assert_eq!(fetched["customerName"], "Renamed Customer");
}

#[tokio::test]
async fn update_to_existing_order_number_conflicts() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (_, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-A")),
    )
    .await;
    let (_, second) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-B")),
    )
    .await;
    let id = second["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}"),
        Some(&access),
        Some(sample_order("ORD-A")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Keeping its own number is not a conflict.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{id}"),
        Some(&access),
        Some(sample_order("ORD-B")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_removes_order() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-DEL")),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/api/orders/{id}"), Some(&access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/orders/{id}"), Some(&access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_mutations_keep_cached_order_in_sync() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-ITEMS")),
    )
    .await;
    let order_id = created["id"].as_i64().unwrap();

    // Prime the per-order cache entry before each mutation.
    let (_, _) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&access), None).await;

    let (status, item) = send(
        &app,
        "POST",
        &format!("/api/items/order/{order_id}"),
        Some(&access),
        Some(json!({
            "sku": "SKU-EXTRA",
            "name": "Extra Widget",
            "quantity": 1,
            "unitPrice": 50.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_i64().unwrap();

    let (_, order) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&access), None).await;
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["totalAmount"], 250.0);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/items/{item_id}"),
        Some(&access),
        Some(json!({
            "sku": "SKU-EXTRA",
            "name": "Extra Widget",
            "quantity": 3,
            "unitPrice": 50.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&access), None).await;
    assert_eq!(order["totalAmount"], 350.0);

    let (status, _) = send(&app, "DELETE", &format!("/api/items/{item_id}"), Some(&access), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, order) = send(&app, "GET", &format!("/api/orders/{order_id}"), Some(&access), None).await;
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["totalAmount"], 200.0);
}

#[tokio::test]
async fn item_on_missing_order_is_not_found() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/items/order/9999",
        Some(&access),
        Some(json!({
            "sku": "SKU-X",
            "name": "Widget",
            "quantity": 1,
            "unitPrice": 10.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/items/9999", Some(&access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_validation_errors_are_reported() {
    let (app, _) = test_app().await;
    let (access, _) = login(&app).await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&access),
        Some(sample_order("ORD-BADITEM")),
    )
    .await;
    let order_id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/items/order/{order_id}"),
        Some(&access),
        Some(json!({
            "sku": "",
            "name": "",
            "quantity": 0,
            "unitPrice": 0.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = &body["validationErrors"];
    assert!(errors["sku"].is_string());
    assert!(errors["name"].is_string());
    assert!(errors["quantity"].is_string());
    assert!(errors["unitPrice"].is_string());
}
