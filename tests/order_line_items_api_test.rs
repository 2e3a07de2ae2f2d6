mod common;

use axum::http::StatusCode;
use common::{decimal, line, order_payload, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn order_total(app: &TestApp, order_id: i64) -> rust_decimal::Decimal {
    let (status, order) = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    decimal(&order["totalAmount"])
}

fn add_line(order_id: i64, name: &str, quantity: f64, unit_price: f64) -> Value {
    let mut body = line(name, quantity, unit_price);
    body["orderId"] = json!(order_id);
    body
}

#[tokio::test]
async fn order_total_follows_line_item_changes() {
    let app = TestApp::new().await;
    let order = app
        .create_order(order_payload("Acme", vec![line("Bolts", 10.0, 25.5)]))
        .await;
    let order_id = order["id"].as_i64().unwrap();
    let first_id = order["orderLineItems"][0]["id"].as_i64().unwrap();
    assert_eq!(order_total(&app, order_id).await, dec!(255.00));

    let (status, added) = app
        .post("/api/orderlineitems", add_line(order_id, "Nuts", 5.0, 12.75))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{added}");
    assert_eq!(decimal(&added["lineTotal"]), dec!(63.75));
    assert_eq!(added["orderId"], json!(order_id));
    assert_eq!(order_total(&app, order_id).await, dec!(318.75));

    let (status, _) = app.delete(&format!("/api/orderlineitems/{first_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(order_total(&app, order_id).await, dec!(63.75));

    let (_, items) = app.get(&format!("/api/orders/{order_id}/items")).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn updating_a_line_recomputes_line_and_order_totals() {
    let app = TestApp::new().await;
    let order = app
        .create_order(order_payload(
            "Acme",
            vec![line("Bolts", 10.0, 25.5), line("Nuts", 5.0, 12.75)],
        ))
        .await;
    let order_id = order["id"].as_i64().unwrap();
    let nuts_id = order["orderLineItems"][1]["id"].as_i64().unwrap();
    let uri = format!("/api/orderlineitems/{nuts_id}");

    let (status, _) = app.put(&uri, json!({"quantity": 2})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, nuts) = app.get(&uri).await;
    assert_eq!(decimal(&nuts["lineTotal"]), dec!(25.50));
    assert_eq!(nuts["productName"], json!("Nuts"));
    assert_eq!(order_total(&app, order_id).await, dec!(280.50));

    let (status, _) = app
        .patch(&uri, json!({"unitPrice": 0.5, "unit": "Box", "productCode": "NUT-8"}))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, nuts) = app.get(&uri).await;
    assert_eq!(decimal(&nuts["lineTotal"]), dec!(1.00));
    assert_eq!(nuts["productCode"], json!("NUT-8"));
    assert_eq!(decimal(&nuts["quantity"]), dec!(2));
    assert_eq!(order_total(&app, order_id).await, dec!(256.00));
}

#[tokio::test]
async fn zero_priced_lines_are_accepted() {
    let app = TestApp::new().await;
    let order = app
        .create_order(order_payload("Acme", vec![line("Sample", 3.0, 0.0)]))
        .await;
    assert_eq!(decimal(&order["totalAmount"]), dec!(0));
}

#[tokio::test]
async fn invalid_line_items_are_rejected() {
    let app = TestApp::new().await;
    let order = app
        .create_order(order_payload("Acme", vec![line("Bolts", 1.0, 1.0)]))
        .await;
    let order_id = order["id"].as_i64().unwrap();
    let item_id = order["orderLineItems"][0]["id"].as_i64().unwrap();

    let (status, _) = app
        .post("/api/orderlineitems", add_line(order_id, "Nuts", 0.0, 1.0))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/orderlineitems", add_line(order_id, "", 1.0, 1.0))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            &format!("/api/orderlineitems/{item_id}"),
            json!({"unitPrice": -1}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(order_total(&app, order_id).await, dec!(1));
}

#[tokio::test]
async fn line_item_for_missing_order_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post("/api/orderlineitems", add_line(4242, "Bolts", 1.0, 1.0))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/orderlineitems/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.put("/api/orderlineitems/77", json!({"quantity": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/orderlineitems/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_line_items_applies_filters() {
    let app = TestApp::new().await;

    let mut coded = line("Hex bolts", 1.0, 1.0);
    coded["productCode"] = json!("BLT-100");
    let first = app
        .create_order(order_payload("Acme", vec![coded, line("Washers", 1.0, 1.0)]))
        .await;
    let second = app
        .create_order(order_payload("Globex", vec![line("Carriage bolts", 1.0, 1.0)]))
        .await;
    let first_id = first["id"].as_i64().unwrap();

    let names = |v: &Value| -> Vec<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|i| i["productName"].as_str().unwrap().to_string())
            .collect()
    };

    // newest line first
    let (status, all) = app.get("/api/orderlineitems").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&all), vec!["Carriage bolts", "Washers", "Hex bolts"]);

    let (_, of_first) = app
        .get(&format!("/api/orderlineitems?orderId={first_id}"))
        .await;
    assert_eq!(names(&of_first), vec!["Washers", "Hex bolts"]);

    let (_, bolts) = app.get("/api/orderlineitems?productName=bolts").await;
    assert_eq!(names(&bolts), vec!["Carriage bolts", "Hex bolts"]);

    let (_, by_code) = app.get("/api/orderlineitems?productCode=BLT").await;
    assert_eq!(names(&by_code), vec!["Hex bolts"]);

    let (_, wrong_case) = app.get("/api/orderlineitems?productName=BOLTS").await;
    assert!(names(&wrong_case).is_empty());

    let (_, underscore) = app.get("/api/orderlineitems?productCode=BLT_100").await;
    assert!(names(&underscore).is_empty());

    let (_, combined) = app
        .get(&format!(
            "/api/orderlineitems?orderId={}&productName=bolts",
            second["id"]
        ))
        .await;
    assert_eq!(names(&combined), vec!["Carriage bolts"]);

    let (status, _) = app.get("/api/orderlineitems?orderId=first").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn amounts_keep_their_digits_and_oversized_ones_are_rejected() {
    let app = TestApp::new().await;
    let order = app
        .create_order(order_payload("Acme", vec![line("Bolts", 1.0, 1.0)]))
        .await;
    let order_id = order["id"].as_i64().unwrap();

    let mut body = add_line(order_id, "Turbine", 1.0, 1.0);
    body["unitPrice"] = json!("1234567.8901");
    let (status, added) = app.post("/api/orderlineitems", body).await;
    assert_eq!(status, StatusCode::CREATED, "{added}");

    let (_, stored) = app
        .get(&format!("/api/orderlineitems/{}", added["id"]))
        .await;
    assert_eq!(decimal(&stored["unitPrice"]), dec!(1234567.8901));
    assert_eq!(decimal(&stored["lineTotal"]), dec!(1234567.8901));
    assert_eq!(order_total(&app, order_id).await, dec!(1234568.8901));

    let mut body = add_line(order_id, "Reactor", 1.0, 1.0);
    body["unitPrice"] = json!("12345678901234.5678");
    let (status, _) = app.post("/api/orderlineitems", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = add_line(order_id, "Reactor", 1.0, 1.0);
    body["quantity"] = json!("79228162514264337593543950335");
    let (status, _) = app.post("/api/orderlineitems", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // each factor fits, the product does not
    let (status, body) = app
        .patch(
            &format!("/api/orderlineitems/{}", added["id"]),
            json!({"quantity": "98765.4321"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(order_total(&app, order_id).await, dec!(1234568.8901));
}
