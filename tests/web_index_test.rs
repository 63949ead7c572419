use axum_test::TestServer;

use garcon::gemini::SessionConfig;
use garcon::web_server::build_router;

fn offline_config() -> SessionConfig {
    SessionConfig {
        api_key: "test-key".to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
        model: "test-model".to_string(),
    }
}

#[tokio::test]
async fn index_page_renders_the_chat_widget() {
    let app = build_router(offline_config()).unwrap();
    let server = TestServer::new(app).unwrap();

    let response = server.get("/").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("Garçon"));
    assert!(body.contains("chat-form"));
    assert!(body.contains("/static/app.js"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let app = build_router(offline_config()).unwrap();
    let server = TestServer::new(app).unwrap();

    let response = server.get("/static/app.js").await;
    response.assert_status_ok();
    assert!(response.text().contains("WebSocket"));
}
