mod common;

use std::io::Cursor;

use common::{test_config, StubLlm};
use sqlchat::chat::{ChatSession, Role};
use sqlchat::cli::run_repl;
use sqlchat::config::AppConfig;

async fn drive(config: &AppConfig, session: &mut ChatSession, script: &str) -> String {
    let mut out = Vec::new();
    run_repl(
        session,
        &config.database.connection_params(),
        config.chat.show_query,
        Cursor::new(script.to_string()),
        &mut out,
    )
    .await
    .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn questions_before_connect_append_nothing() {
    let config = test_config();
    let llm = StubLlm::new(&["SELECT 1", "one"]);
    let mut session = ChatSession::from_config(&config, llm.clone());

    let output = drive(&config, &mut session, "How many tables?\n/exit\n").await;

    assert!(output.contains("Connect to the database to start chatting"));
    assert!(output.contains("Error: Not connected."));
    assert_eq!(session.messages().len(), 1);
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn connect_then_ask_renders_answer() {
    let mut config = test_config();
    config.chat.show_query = true;
    let llm = StubLlm::new(&["SELECT 40 + 2 AS answer", "The answer is 42."]);
    let mut session = ChatSession::from_config(&config, llm.clone());

    let script = "/connect backend=duckdb database=:memory:\n\nWhat is the answer?\n/history\n/quit\n";
    let output = drive(&config, &mut session, script).await;

    assert!(output.contains("Connected to database"));
    assert!(output.contains("SQL> SELECT 40 + 2 AS answer"));
    assert!(output.contains("Assistant> The answer is 42."));
    assert!(output.contains("You> What is the answer?"));

    let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::Human, Role::Assistant]);
}

#[tokio::test]
async fn bad_connect_arguments_are_reported() {
    let config = test_config();
    let mut session = ChatSession::from_config(&config, StubLlm::new(&[]));

    let output = drive(&config, &mut session, "/connect password=oops\n/nope\n").await;

    assert!(output.contains("Error: the password is read from config or the environment only"));
    assert!(output.contains("Unknown command /nope"));
    assert!(!session.is_connected());
}
