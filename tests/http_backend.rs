use orion_chat::api::admin::AdminClient;
use orion_chat::api::{ BackendError, ChatBackend, HttpBackend };
use orion_chat::conversation::{
    ClientOptions,
    ConversationClient,
    CONNECTION_ERROR_MESSAGE,
    INVALID_RESPONSE_MESSAGE,
};
use orion_chat::identity::{ Identity, IdentityKind };
use orion_chat::models::chat::Role;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{ body_partial_json, method, path, query_param };
use wiremock::{ Mock, MockServer, ResponseTemplate };

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn guest() -> Identity {
    Identity {
        id: "guest-42".into(),
        display_name: "Ada".into(),
        kind: IdentityKind::Guest,
    }
}

fn backend(uri: &str) -> HttpBackend {
    HttpBackend::new(uri, Some(Duration::from_secs(5))).expect("valid backend url")
}

fn client(uri: &str) -> ConversationClient {
    let options = ClientOptions {
        title_refresh_delay: Duration::from_millis(20),
        ..ClientOptions::new(Url::parse("https://chat.example.com/").unwrap())
    };
    ConversationClient::new(Arc::new(backend(uri)), guest(), options)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sending
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_posts_identity_and_appends_reply() {
    let server = MockServer::start().await;
    let client = client(&server.uri());
    let conversation_id = client.active_id();

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(
            body_partial_json(
                json!({
                    "message": "What is a thesis?",
                    "conversation_id": conversation_id,
                    "user_email": "guest-42",
                    "user_name": "Ada",
                })
            )
        )
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "A claim." })))
        .expect(1)
        .mount(&server).await;
    let titles = HashMap::from([(conversation_id.clone(), "Thesis basics".to_string())]);
    Mock::given(method("GET"))
        .and(path("/conversations/guest-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({ "conversations": [conversation_id], "titles": titles })
            )
        )
        .mount(&server).await;

    let reply = client.send_message("What is a thesis?").await.unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "A claim.");

    let messages = client.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "What is a thesis?");

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(client.title(&conversation_id), "Thesis basics");
}

#[tokio::test]
async fn non_success_status_is_embedded_in_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server).await;
    let client = client(&server.uri());

    let reply = client.send_message("hello").await.unwrap();

    assert_eq!(reply.content, "Server error: 500. Please try again.");
    assert_eq!(client.messages().len(), 2);
}

#[tokio::test]
async fn malformed_body_becomes_generic_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server).await;
    let client = client(&server.uri());

    let reply = client.send_message("hello").await.unwrap();
    assert_eq!(reply.content, INVALID_RESPONSE_MESSAGE);
}

#[tokio::test]
async fn unreachable_backend_becomes_connection_error() {
    // Port 1 (tcpmux) is closed on test hosts.
    let client = client("http://127.0.0.1:1");

    let reply = client.send_message("hello").await.unwrap();

    assert_eq!(reply.content, CONNECTION_ERROR_MESSAGE);
    assert_eq!(client.messages().len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// History and listing
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn opening_a_conversation_loads_history_and_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/conv_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "history": [
                    { "user": "hi", "assistant": "hello", "timestamp": "2024-01-01T00:00:00Z" },
                    { "user": "bye", "assistant": "see you", "timestamp": null },
                ]
            })
            )
        )
        .mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/conversations/guest-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "conversations": ["conv_1", "conv_2"],
                "titles": { "conv_1": "Greetings" },
            })
            )
        )
        .mount(&server).await;
    let client = client(&server.uri());

    client.open_conversation("conv_1").await.unwrap();

    let contents: Vec<(Role, String)> = client
        .messages()
        .into_iter()
        .map(|m| (m.role, m.content))
        .collect();
    assert_eq!(contents, vec![
        (Role::User, "hi".to_string()),
        (Role::Assistant, "hello".to_string()),
        (Role::User, "bye".to_string()),
        (Role::Assistant, "see you".to_string())
    ]);
    assert_eq!(client.conversations(), vec!["conv_1".to_string(), "conv_2".to_string()]);
    assert_eq!(client.title("conv_1"), "Greetings");
    assert_eq!(client.title("conv_2"), "New conversation");
    assert_eq!(client.location().as_str(), "https://chat.example.com/?id=conv_1");
}

#[tokio::test]
async fn history_error_status_yields_empty_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/conv_gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server).await;
    let client = client(&server.uri());

    client.open_conversation("conv_gone").await.unwrap();
    assert!(client.messages().is_empty());
}

#[tokio::test]
async fn failed_list_keeps_previous_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/guest-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({ "conversations": ["conv_1"], "titles": {} })
            )
        )
        .up_to_n_times(1)
        .mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/conversations/guest-42"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server).await;
    let client = client(&server.uri());

    assert!(client.list_conversations().await);
    assert!(!client.list_conversations().await);
    assert_eq!(client.conversations(), vec!["conv_1".to_string()]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Deleting
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_is_optimistic_even_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/guest-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "conversations": ["conv_1", "conv_2"],
                "titles": { "conv_1": "One", "conv_2": "Two" },
            })
            )
        )
        .mount(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/conversations/conv_1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server).await;
    let client = client(&server.uri());
    client.list_conversations().await;

    client.delete_conversation("conv_1").await.unwrap();

    assert_eq!(client.conversations(), vec!["conv_2".to_string()]);
    assert!(!client.titles().contains_key("conv_1"));
}

#[tokio::test]
async fn http_backend_reports_status_codes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/conversations/conv_9"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server).await;

    let err = backend(&server.uri()).delete_conversation("conv_9").await.unwrap_err();
    assert!(matches!(err, BackendError::Status(403)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_requests_carry_operator_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/stats"))
        .and(query_param("admin_email", "ops@example.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "total_users": 3,
                "total_messages": 40,
                "total_conversations": 7,
                "today_messages": 5,
                "active_users": 2,
            })
            )
        )
        .expect(1)
        .mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/admin/search"))
        .and(query_param("admin_email", "ops@example.com"))
        .and(query_param("query", "thesis outline"))
        .and(query_param("user_email", "ada@example.com"))
        .and(query_param("limit", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({
                "messages": [{
                    "user_email": "ada@example.com",
                    "user_message": "thesis outline?",
                    "assistant_response": "Start with the question.",
                    "timestamp": "2024-02-01T10:00:00",
                }]
            })
            )
        )
        .expect(1)
        .mount(&server).await;

    let operator = Identity {
        id: "ops@example.com".into(),
        display_name: "Ops".into(),
        kind: IdentityKind::Session,
    };
    let admin = AdminClient::for_identity(
        backend(&server.uri()),
        &operator,
        Some("ops@example.com")
    ).unwrap();

    let stats = admin.stats().await.unwrap();
    assert_eq!(stats.total_messages, 40);
    assert_eq!(stats.active_users, 2);

    let hits = admin.search("thesis outline", Some("ada@example.com"), 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].assistant_response, "Start with the question.");
}
