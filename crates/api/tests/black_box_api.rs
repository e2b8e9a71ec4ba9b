use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a fresh in-memory store, on an ephemeral port.
        let app = stockroom_api::app::build_in_memory_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn create(&self, path: &str, body: Value) -> String {
        let (status, created) = self.post(path, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {path}: {created}");
        created["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn relocation_scenario_over_http() {
    let srv = TestServer::spawn().await;

    let a1 = srv.create("/locations", json!({ "code": "LOC-A1", "row": "A" })).await;
    let b1 = srv.create("/locations", json!({ "code": "LOC-B1", "row": "B" })).await;
    let user = srv
        .create("/users", json!({ "username": "operator1", "role": "operator", "password_hash": "h" }))
        .await;
    let item = srv
        .create("/items", json!({ "name": "Widget Pro", "sku": "WDGT-001", "quantity": 50 }))
        .await;

    for (to, note) in [(&a1, "received"), (&b1, "restock")] {
        let (status, movement) = srv
            .post(
                "/move",
                json!({ "item_id": item, "to_location_id": to, "user_id": user, "note": note }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{movement}");
    }

    let (status, history) = srv.get(&format!("/items/{item}/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total"], 2);
    assert_eq!(history["movements"][0]["to_location_id"], b1.as_str());
    assert_eq!(history["movements"][0]["from_location_id"], a1.as_str());
    assert_eq!(history["movements"][1]["from_location_id"], Value::Null);
    assert_eq!(history["movements"][0]["from_location_code"], "LOC-A1");
    assert_eq!(history["movements"][0]["to_location_code"], "LOC-B1");
    assert_eq!(history["movements"][0]["username"], "operator1");

    let (_, stored) = srv.get(&format!("/items/{item}")).await;
    assert_eq!(stored["location_id"], b1.as_str());
    assert_eq!(stored["location"]["code"], "LOC-B1");

    let (status, user_body) = srv.get(&format!("/users/{user}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(user_body.get("password_hash").is_none());
}

#[tokio::test]
async fn work_order_issue_over_http() {
    let srv = TestServer::spawn().await;
    let item = srv
        .create("/items", json!({ "name": "Widget Pro", "sku": "WDGT-001", "quantity": 50 }))
        .await;

    let (status, order) = srv
        .post(
            "/orders",
            json!({
                "equipment": "Excavator CAT 320",
                "equipment_number": "INV-0042",
                "work_type": "repair",
                "lines": [
                    { "item_id": item, "name": "Widget Pro", "quantity": 10 },
                    { "name": "Custom bracket", "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["items_count"], 2);
    let order_id = order["id"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("WO-"));

    let (status, _) = srv
        .put(&format!("/orders/{order_id}/lines/1/status"), json!({ "status": "collected" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, issued) = srv.post(&format!("/orders/{order_id}/issue"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{issued}");
    assert_eq!(issued["status"], "issued");

    let (status, again) = srv.post(&format!("/orders/{order_id}/issue"), json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(again["error"], "invalid_state");

    let (_, stored) = srv.get(&format!("/items/{item}")).await;
    assert_eq!(stored["quantity"], 40);
}

#[tokio::test]
async fn errors_use_documented_statuses_and_shape() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/items/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv.get("/items/0190a6f2-7b1c-7d3e-8f00-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    srv.create("/items", json!({ "name": "Widget", "sku": "DUP-1" })).await;
    let (status, body) = srv.post("/items", json!({ "name": "Widget 2", "sku": "DUP-1" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let item = srv.create("/items", json!({ "name": "Gadget", "sku": "GDGT-002", "quantity": 3 })).await;
    let (status, body) = srv
        .post(&format!("/items/{item}/adjust"), json!({ "delta": -4 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_state");

    let (status, body) = srv
        .post(&format!("/items/{item}/adjust"), json!({ "delta": "lots" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn item_listing_supports_search_and_category() {
    let srv = TestServer::spawn().await;
    srv.create("/items", json!({ "name": "Oil filter", "sku": "FLT-1", "category": "filters" }))
        .await;
    srv.create("/items", json!({ "name": "V-belt", "sku": "BLT-1", "category": "belts" }))
        .await;

    let (status, body) = srv.get("/items?search=oil").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["sku"], "FLT-1");

    let (_, body) = srv.get("/items?category=belts").await;
    assert_eq!(body["items"][0]["sku"], "BLT-1");

    let (_, categories) = srv.get("/categories").await;
    assert_eq!(categories, json!(["belts", "filters"]));
}
