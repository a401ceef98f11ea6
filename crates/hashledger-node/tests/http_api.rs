use axum_test::TestServer;
use hashledger_core::LedgerConfig;
use hashledger_node::{router, AppState};
use serde_json::{json, Value};

fn server() -> TestServer {
    let state = AppState::new(LedgerConfig::with_difficulty(1));
    TestServer::new(router(state)).expect("test server")
}

async fn create_chain(server: &TestServer) -> String {
    let response = server.post("/chain").await;
    assert_eq!(response.status_code().as_u16(), 201);
    let body: Value = response.json();
    body["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn test_health() {
    let server = server();
    let response = server.get("/health").await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_create_append_fetch_validate() {
    let server = server();
    let id = create_chain(&server).await;

    let chain: Value = server.get(&format!("/chain/{id}")).await.json();
    assert_eq!(chain.as_array().map(Vec::len), Some(1));

    let response = server
        .post(&format!("/chain/{id}/block"))
        .json(&json!({
            "transactions": [{"from": "bank", "to": "Ipsum", "amount": 1}],
            "timestamp": 1_600_000_000_000u64
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    let chain: Value = response.json();
    let blocks = chain.as_array().expect("blocks");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1]["prevHash"], blocks[0]["hash"]);
    assert_eq!(blocks[1]["timestamp"], 1_600_000_000_000u64);
    assert!(blocks[1]["hash"].as_str().unwrap().starts_with('0'));

    let validity: Value = server.get(&format!("/chain/{id}/isvalid")).await.json();
    assert_eq!(validity["valid"], true);
}

#[tokio::test]
async fn test_create_with_difficulty() {
    let server = server();
    let response = server.post("/chain").json(&json!({"difficulty": 2})).await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
    let chain: Value = server.get(&format!("/chain/{id}")).await.json();
    assert!(chain[0]["hash"].as_str().unwrap().starts_with("00"));
}

#[tokio::test]
async fn test_non_array_payload_is_rejected() {
    let server = server();
    let id = create_chain(&server).await;
    let response = server
        .post(&format!("/chain/{id}/block"))
        .json(&json!({"transactions": "Ipsum"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("malformed input"));

    let chain: Value = server.get(&format!("/chain/{id}")).await.json();
    assert_eq!(chain.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_transfer_flow_and_balances() {
    let server = server();
    let id = create_chain(&server).await;

    let response = server
        .post(&format!("/chain/{id}/transactions"))
        .json(&json!({"from": "bank", "to": "A", "amount": 100}))
        .await;
    assert_eq!(response.status_code().as_u16(), 202);
    assert_eq!(response.json::<Value>()["pending"], 1);

    let response = server
        .post(&format!("/chain/{id}/mine"))
        .json(&json!({"rewardAddress": "A"}))
        .await;
    assert_eq!(response.status_code().as_u16(), 200);
    let block: Value = response.json();
    assert_eq!(block["transactions"][0]["to"], "A");

    let response = server
        .post(&format!("/chain/{id}/transactions"))
        .json(&json!({"from": "A", "to": "B", "amount": 30}))
        .await;
    assert_eq!(response.status_code().as_u16(), 202);
    server
        .post(&format!("/chain/{id}/mine"))
        .json(&json!({"rewardAddress": "B"}))
        .await;

    let balance: Value = server.get(&format!("/chain/{id}/balance/A")).await.json();
    // 100 airdrop + 100 deferred reward - 30 transfer
    assert_eq!(balance["balance"], 170);
    assert_eq!(balance["display"], "170 LGR");
    let balance: Value = server.get(&format!("/chain/{id}/balance/B")).await.json();
    assert_eq!(balance["balance"], 30);
}

#[tokio::test]
async fn test_transaction_errors() {
    let server = server();
    let id = create_chain(&server).await;

    let response = server
        .post(&format!("/chain/{id}/transactions"))
        .json(&json!({"from": "A", "to": "B", "amount": 5}))
        .await;
    assert_eq!(response.status_code().as_u16(), 422);

    let response = server
        .post(&format!("/chain/{id}/transactions"))
        .json(&json!({"from": "bank", "to": "B", "amount": -5}))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn test_unknown_chain() {
    let server = server();
    let response = server.get("/chain/deadbeef").await;
    assert_eq!(response.status_code().as_u16(), 404);
    let response = server.get("/chain/deadbeef/isvalid").await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn test_mining_cap_maps_to_unavailable() {
    let state = AppState::new(LedgerConfig {
        difficulty: 0,
        max_mining_attempts: Some(1),
        ..LedgerConfig::default()
    });
    let server = TestServer::new(router(state)).expect("test server");
    // Difficulty 6 is all but impossible to meet within a single attempt.
    let response = server.post("/chain").json(&json!({"difficulty": 6})).await;
    assert_eq!(response.status_code().as_u16(), 503);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("gave up"));
}

#[tokio::test]
async fn test_unreachable_difficulty_is_refused_with_default_settings() {
    let server = TestServer::new(router(AppState::new(LedgerConfig::default())))
        .expect("test server");
    let response = server.post("/chain").json(&json!({"difficulty": 64})).await;
    assert_eq!(response.status_code().as_u16(), 400);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("exceeds the node maximum"));
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() {
    let server = server();
    let id = create_chain(&server).await;

    let cases = [
        ("block", "{not json"),
        ("transactions", r#"{"from": "bank", "to": "A"}"#),
        ("transactions", r#"{"from": "bank", "to": "A", "amount": "lots"}"#),
        ("mine", "{}"),
    ];
    for (route, body) in cases {
        let response = server
            .post(&format!("/chain/{id}/{route}"))
            .text(body)
            .await;
        assert_eq!(response.status_code().as_u16(), 400, "{route} {body}");
        let error: Value = response.json();
        assert!(error["error"].as_str().unwrap().starts_with("bad request"));
    }

    let chain: Value = server.get(&format!("/chain/{id}")).await.json();
    assert_eq!(chain.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_balance_beyond_i64_range() {
    let server = server();
    let id = create_chain(&server).await;

    for amount in [i64::MAX, 1] {
        let response = server
            .post(&format!("/chain/{id}/transactions"))
            .json(&json!({"from": "bank", "to": "A", "amount": amount}))
            .await;
        assert_eq!(response.status_code().as_u16(), 202);
        let response = server
            .post(&format!("/chain/{id}/mine"))
            .json(&json!({"rewardAddress": "M"}))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);
    }

    let response = server.get(&format!("/chain/{id}/balance/A")).await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.json::<Value>()["balance"], 9_223_372_036_854_775_808u64);

    // The node keeps serving the chain afterwards.
    let response = server.get(&format!("/chain/{id}/isvalid")).await;
    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.json::<Value>()["valid"], true);
}
