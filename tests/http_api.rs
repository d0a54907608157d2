mod common;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::json;

use common::{test_config, StubLlm};
use sqlchat::api::models::{AskResponse, ConnectResponse, SessionResponse};
use sqlchat::api::{routes, SessionRegistry};
use sqlchat::chat::{ChatMessage, Role};
use sqlchat::llm::LlmProvider;
use std::sync::Arc;

fn registry(llm: Arc<dyn LlmProvider>) -> web::Data<SessionRegistry> {
    web::Data::new(SessionRegistry::new(test_config(), llm))
}

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().app_data(registry(StubLlm::new(&[]))).configure(routes::configure)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn session_lifecycle() {
    let llm = StubLlm::new(&[
        "```sql\nSELECT 'Pune' AS city, 2 AS customers\n```",
        "| city | customers |\n| Pune | 2 |",
    ]);
    let app = test::init_service(App::new().app_data(registry(llm.clone())).configure(routes::configure)).await;

    let req = test::TestRequest::post().uri("/sessions").to_request();
    let created: SessionResponse = test::call_and_read_body_json(&app, req).await;
    assert!(!created.connected);
    assert_eq!(created.messages.len(), 1);
    assert_eq!(created.messages[0].role, Role::Assistant);

    // Asking before connecting is refused.
    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/messages", created.id))
        .set_json(json!({"content": "How many customers per city?"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/connect", created.id))
        .set_json(json!({"backend": "duckdb", "database": ":memory:", "password": "ignored"}))
        .to_request();
    let connected: ConnectResponse = test::call_and_read_body_json(&app, req).await;
    assert!(connected.connected);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/messages", created.id))
        .set_json(json!({"content": "How many customers per city?"}))
        .to_request();
    let answer: AskResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(answer.query, "SELECT 'Pune' AS city, 2 AS customers");
    assert!(answer.answer.contains("| Pune | 2 |"));
    assert!(llm.prompts()[1].contains("SQL query response: [('Pune', 2)]"));

    let req = test::TestRequest::get()
        .uri(&format!("/sessions/{}/messages", created.id))
        .to_request();
    let messages: Vec<ChatMessage> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], ChatMessage::human("How many customers per city?"));

    let req = test::TestRequest::delete()
        .uri(&format!("/sessions/{}", created.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/sessions/{}", created.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn errors_map_to_status_codes() {
    let llm = StubLlm::new(&["SELECT missing FROM nowhere"]);
    let app = test::init_service(App::new().app_data(registry(llm)).configure(routes::configure)).await;

    let req = test::TestRequest::post().uri("/sessions").to_request();
    let created: SessionResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/connect", created.id))
        .set_json(json!({"backend": "postgres", "host": "127.0.0.1", "port": 1}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/connect", created.id))
        .set_json(json!({"backend": "duckdb", "database": ":memory:"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/messages", created.id))
        .set_json(json!({"content": "  "}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/messages", created.id))
        .set_json(json!({"content": "What is missing?"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The script is exhausted, so the model call fails.
    let req = test::TestRequest::post()
        .uri(&format!("/sessions/{}/messages", created.id))
        .set_json(json!({"content": "Try again"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_GATEWAY);

    let req = test::TestRequest::get()
        .uri(&format!("/sessions/{}/messages", uuid::Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
