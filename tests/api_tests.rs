use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use menu_today::{
    catalog::Catalog,
    config::RecommendSettings,
    db::{KeyValueStore, MemoryStore, StoreError},
    routes::{create_router, AppState},
};

/// Memory store that refuses every history write
#[derive(Default)]
struct HistoryWriteFailingStore {
    inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for HistoryWriteFailingStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.ends_with(":history") {
            return Err(StoreError::Unavailable("history shard offline".into()));
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    fn name(&self) -> &'static str {
        "history-write-failing"
    }
}

fn create_server_with(catalog: Catalog) -> TestServer {
    let state = AppState::new(
        catalog,
        Arc::new(MemoryStore::new()),
        RecommendSettings::default(),
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn create_test_server() -> TestServer {
    create_server_with(Catalog::builtin().unwrap())
}

fn lunch_request() -> Value {
    json!({
        "meal_time": "lunch",
        "people": 2,
        "spice": "normal",
        "budget_per_person": 12000,
        "cooking_minutes_max": 30
    })
}

async fn register_device(server: &TestServer) -> String {
    let response = server.post("/api/v1/devices").await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["device_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-42"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "trace-42");
}

#[tokio::test]
async fn test_catalog_listing() {
    let server = create_test_server();

    let response = server.get("/api/v1/catalog").await;
    response.assert_status_ok();
    let items: Vec<Value> = response.json();
    assert_eq!(items.len(), Catalog::builtin().unwrap().len());

    let response = server
        .get("/api/v1/catalog")
        .add_query_param("meal_time", "breakfast")
        .await;
    response.assert_status_ok();
    let breakfast: Vec<Value> = response.json();
    assert!(!breakfast.is_empty());
    assert!(breakfast.len() < items.len());
    for item in &breakfast {
        let meal_times = item["meal_times"].as_array().unwrap();
        assert!(meal_times.contains(&json!("breakfast")));
    }
}

#[tokio::test]
async fn test_catalog_item_lookup() {
    let server = create_test_server();

    let response = server.get("/api/v1/catalog/pho").await;
    response.assert_status_ok();
    let item: Value = response.json();
    assert_eq!(item["name"], "Pho");

    let response = server.get("/api/v1/catalog/deep-fried-moon").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_recommendation_flow_until_quota_exhausted() {
    let server = create_test_server();
    let device_id = register_device(&server).await;
    let path = format!("/api/v1/devices/{}/recommendations", device_id);

    for attempt in 1..=4u64 {
        let response = server.post(&path).json(&lunch_request()).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["recommendation"]["attempt"], attempt);
        assert_eq!(body["attempts_remaining"], 4 - attempt);
        assert_eq!(body["max_attempts"], 4);
        assert!(body["explanation"].as_str().is_some());

        let picked = &body["recommendation"]["picked"];
        let meal_times = picked["meal_times"].as_array().unwrap();
        assert!(meal_times.contains(&json!("lunch")));

        let used_ids = body["recommendation"]["used_ids"].as_array().unwrap();
        assert_eq!(used_ids[0], picked["id"]);
    }

    let response = server.post(&path).json(&lunch_request()).await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["code"], "quota_exhausted");

    // A different request has its own quota
    let mut dinner = lunch_request();
    dinner["meal_time"] = json!("dinner");
    let response = server.post(&path).json(&dinner).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendation"]["attempt"], 1);
}

#[tokio::test]
async fn test_status_is_read_only() {
    let server = create_test_server();
    let device_id = register_device(&server).await;
    let status_path = format!("/api/v1/devices/{}/recommendations/status", device_id);

    let response = server.post(&status_path).json(&lunch_request()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["attempt"], 0);
    assert_eq!(body["attempts_remaining"], 4);

    server
        .post(&format!("/api/v1/devices/{}/recommendations", device_id))
        .json(&lunch_request())
        .await
        .assert_status_ok();

    for _ in 0..2 {
        let response = server.post(&status_path).json(&lunch_request()).await;
        let body: Value = response.json();
        assert_eq!(body["attempt"], 1);
        assert_eq!(body["attempts_remaining"], 3);
        assert_eq!(body["used_ids"].as_array().unwrap().len(), 1);
    }

    let mut other = lunch_request();
    other["people"] = json!(5);
    let response = server.post(&status_path).json(&other).await;
    let body: Value = response.json();
    assert_eq!(body["attempt"], 0);
}

#[tokio::test]
async fn test_reset_restores_quota() {
    let server = create_test_server();
    let device_id = register_device(&server).await;
    let path = format!("/api/v1/devices/{}/recommendations", device_id);

    for _ in 0..4 {
        server
            .post(&path)
            .json(&lunch_request())
            .await
            .assert_status_ok();
    }

    let response = server
        .post(&format!("{}/reset", path))
        .json(&lunch_request())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["attempt"], 0);
    assert_eq!(body["attempts_remaining"], 4);
    assert!(body["used_ids"].as_array().unwrap().is_empty());

    let response = server.post(&path).json(&lunch_request()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendation"]["attempt"], 1);

    // Reset keeps history
    let response = server
        .get(&format!("/api/v1/devices/{}/history", device_id))
        .await;
    let history: Vec<Value> = response.json();
    assert_eq!(history.len(), 5);
}

#[tokio::test]
async fn test_pool_preview() {
    let server = create_test_server();
    let device_id = register_device(&server).await;

    let response = server
        .post(&format!(
            "/api/v1/devices/{}/recommendations/pool",
            device_id
        ))
        .json(&lunch_request())
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let stages = body["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 5);
    assert_eq!(stages[0]["stage"], "strict");
    assert!(body["selected_stage"].is_string());

    // Previewing consumes nothing
    let response = server
        .post(&format!(
            "/api/v1/devices/{}/recommendations/status",
            device_id
        ))
        .json(&lunch_request())
        .await;
    let status: Value = response.json();
    assert_eq!(status["attempt"], 0);
}

#[tokio::test]
async fn test_history_and_stats() {
    let server = create_test_server();
    let device_id = register_device(&server).await;
    let history_path = format!("/api/v1/devices/{}/history", device_id);

    let response = server.get(&history_path).await;
    response.assert_status_ok();
    let history: Vec<Value> = response.json();
    assert!(history.is_empty());

    let mut picked_names = Vec::new();
    for _ in 0..3 {
        let response = server
            .post(&format!("/api/v1/devices/{}/recommendations", device_id))
            .json(&lunch_request())
            .await;
        let body: Value = response.json();
        picked_names.push(body["recommendation"]["picked"]["name"].clone());
    }

    let history: Vec<Value> = server.get(&history_path).await.json();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["item_name"], picked_names[2]);
    assert_eq!(history[0]["attempt"], 3);
    assert_eq!(history[2]["item_name"], picked_names[0]);

    let response = server
        .get(&format!("/api/v1/devices/{}/stats", device_id))
        .await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["total_count"], 3);
    assert_eq!(stats["avg_people"], 2.0);
    assert_eq!(stats["top_meal_times"][0]["label"], "lunch");
    assert_eq!(stats["top_meal_times"][0]["count"], 3);

    server
        .delete(&history_path)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let history: Vec<Value> = server.get(&history_path).await.json();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_favorites_toggle_and_remove() {
    let server = create_test_server();
    let device_id = register_device(&server).await;
    let favorites_path = format!("/api/v1/devices/{}/favorites", device_id);

    let response = server.put(&format!("{}/bibimbap", favorites_path)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["favorite"], true);
    assert_eq!(body["count"], 1);

    server
        .put(&format!("{}/pho", favorites_path))
        .await
        .assert_status_ok();

    let body: Value = server.get(&favorites_path).await.json();
    assert_eq!(body["ids"], json!(["bibimbap", "pho"]));
    assert_eq!(body["items"][1]["name"], "Pho");

    let response = server.put(&format!("{}/bibimbap", favorites_path)).await;
    let body: Value = response.json();
    assert_eq!(body["favorite"], false);
    assert_eq!(body["count"], 1);

    server
        .delete(&format!("{}/pho", favorites_path))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let body: Value = server.get(&favorites_path).await.json();
    assert_eq!(body["ids"], json!([]));

    let response = server.put(&format!("{}/deep-fried-moon", favorites_path)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_device_id_rejected() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/devices/bad:device/recommendations")
        .json(&lunch_request())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn test_empty_catalog() {
    let server = create_server_with(Catalog::default());

    let response = server
        .post("/api/v1/devices/device-1/recommendations")
        .json(&lunch_request())
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "empty_catalog");
}

#[tokio::test]
async fn test_no_candidates_for_meal_time() {
    let catalog = Catalog::from_json(
        r#"[{
            "id": "toast",
            "name": "Toast",
            "cuisine": "western",
            "meal_times": ["breakfast"],
            "spice": "mild",
            "cooking_minutes": 5,
            "serves_min": 1,
            "serves_max": 2,
            "price_tier": "low",
            "difficulty": "easy"
        }]"#,
    )
    .unwrap();
    let server = create_server_with(catalog);

    let mut request = lunch_request();
    request["meal_time"] = json!("late_night");
    let response = server
        .post("/api/v1/devices/device-1/recommendations")
        .json(&request)
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["code"], "no_candidates");

    // A failed call consumes no attempt
    let response = server
        .post("/api/v1/devices/device-1/recommendations/status")
        .json(&request)
        .await;
    let status: Value = response.json();
    assert_eq!(status["attempt"], 0);
}

#[tokio::test]
async fn test_history_write_failure_keeps_recommendation() {
    let state = AppState::new(
        Catalog::builtin().unwrap(),
        Arc::new(HistoryWriteFailingStore::default()),
        RecommendSettings::default(),
    );
    let server = TestServer::new(create_router(state)).unwrap();
    let path = "/api/v1/devices/device-1/recommendations";

    for attempt in 1..=4u64 {
        let response = server.post(path).json(&lunch_request()).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["recommendation"]["attempt"], attempt);
    }

    server
        .post(path)
        .json(&lunch_request())
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    let status: Value = server
        .post("/api/v1/devices/device-1/recommendations/status")
        .json(&lunch_request())
        .await
        .json();
    assert_eq!(status["attempt"], 4);

    let history: Vec<Value> = server
        .get("/api/v1/devices/device-1/history")
        .await
        .json();
    assert!(history.is_empty());
}
