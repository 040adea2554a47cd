//! REST event log tests against an in-memory backend.

#![allow(clippy::panic)]

use std::net::SocketAddr;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_test::assert_ok;

use peeper_gateway::app_state::AppState;
use peeper_gateway::config::RelaySettings;
use peeper_gateway::persistence::EventLog;
use peeper_gateway::server;

async fn spawn_server() -> String {
    let state = AppState::new(RelaySettings::default(), EventLog::in_memory());
    let listener = assert_ok!(TcpListener::bind("127.0.0.1:0").await);
    let addr: SocketAddr = assert_ok!(listener.local_addr());
    tokio::spawn(server::serve(listener, state, std::future::pending()));
    format!("http://{addr}/api/v1")
}

async fn json_body(resp: reqwest::Response) -> Value {
    assert_ok!(resp.json::<Value>().await)
}

#[tokio::test]
async fn event_crud_round_trip() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = assert_ok!(client.post(format!("{base}/events")).json(&json!({})).send().await);
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["description"], "N/A");
    assert_eq!(created["event_type"]["name"], "Turn On");
    let id = created["id"].as_i64().unwrap_or_default();
    assert!(id > 0);

    let resp = assert_ok!(
        client
            .put(format!("{base}/events/{id}"))
            .json(&json!({ "description": "door opened", "raw_timestamp": 1700000000.5 }))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["description"], "door opened");
    assert_eq!(updated["raw_timestamp"], 1_700_000_000.5);
    assert_eq!(updated["event_type"]["name"], "Turn On");

    let resp = assert_ok!(client.get(format!("{base}/events")).send().await);
    let list = json_body(resp).await;
    assert_eq!(list["pagination"]["total"], 1);
    assert_eq!(list["data"][0]["id"], id);

    let resp = assert_ok!(client.delete(format!("{base}/events/{id}")).send().await);
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = assert_ok!(client.get(format!("{base}/events/{id}")).send().await);
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err = json_body(resp).await;
    assert_eq!(err["error"]["code"], 2001);
}

#[tokio::test]
async fn unknown_event_type_name_is_not_found() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = assert_ok!(
        client
            .post(format!("{base}/events"))
            .json(&json!({ "event_type": "Ultrasonic" }))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"]["code"], 2003);
}

#[tokio::test]
async fn event_type_lifecycle() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = assert_ok!(
        client
            .post(format!("{base}/event-types"))
            .json(&json!({ "name": "Ultrasonic" }))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ultra = json_body(resp).await;
    let type_id = ultra["id"].as_i64().unwrap_or_default();

    let resp = assert_ok!(
        client
            .post(format!("{base}/event-types"))
            .json(&json!({ "name": "Ultrasonic" }))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = assert_ok!(
        client
            .post(format!("{base}/events"))
            .json(&json!({ "description": "obstacle", "event_type": "Ultrasonic" }))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let event_id = json_body(resp).await["id"].as_i64().unwrap_or_default();

    let resp = assert_ok!(
        client
            .delete(format!("{base}/event-types/{type_id}"))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = assert_ok!(client.delete(format!("{base}/events/{event_id}")).send().await);
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = assert_ok!(
        client
            .delete(format!("{base}/event-types/{type_id}"))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = assert_ok!(client.get(format!("{base}/event-types")).send().await);
    let types = json_body(resp).await;
    assert_eq!(types.as_array().map(Vec::len), Some(1));
    assert_eq!(types[0]["name"], "Turn On");
}

#[tokio::test]
async fn invalid_timestamp_is_bad_request() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = assert_ok!(
        client
            .post(format!("{base}/events"))
            .json(&json!({ "raw_timestamp": 1e300 }))
            .send()
            .await
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], 1001);
}
