use mentorflow::config::Config;
use mentorflow::conversation::{DayPlan, DirectiveAction, Phase};
use mentorflow::llm::{ChatMessage, Generator, OpenAiCompatibleGenerator, ReliableGenerator};
use mentorflow::session::{
    InMemoryStateStore, JsonFileStateStore, SessionKey, StateStore, TurnEngine, TurnRequest,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(text: &str, history: &[ChatMessage]) -> TurnRequest {
    TurnRequest {
        user_text: text.to_string(),
        recent_turns: history.to_vec(),
        participant_name: "Sam".into(),
        day: DayPlan::new("Write 3 gratitudes", "Build positive affect"),
    }
}

async fn replying_server(reply: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": reply}}]
        })))
        .mount(&server)
        .await;
    server
}

fn generator_for(server: &MockServer) -> Arc<dyn Generator> {
    Arc::new(OpenAiCompatibleGenerator::new(
        "mock",
        &server.uri(),
        Some("test-key"),
        "test-model",
        0.7,
        5,
    ))
}

#[tokio::test]
async fn turns_persist_to_disk_and_resume() {
    let server = replying_server("What's on your mind today?").await;
    let tmp = TempDir::new().unwrap();
    let config = Config::default();
    let key = SessionKey::new("sam", 1);
    let mut rng = StdRng::seed_from_u64(3);

    let engine = TurnEngine::from_config(
        &config,
        generator_for(&server),
        Arc::new(JsonFileStateStore::new(tmp.path())),
    );
    let first = engine.run_turn(&key, request("hi", &[]), &mut rng).await.unwrap();
    assert_eq!(first.decision.action, DirectiveAction::AskQuestion);

    let history = vec![ChatMessage::user("hi"), ChatMessage::assistant(first.reply)];
    let resumed = TurnEngine::from_config(
        &config,
        generator_for(&server),
        Arc::new(JsonFileStateStore::new(tmp.path())),
    );
    let second = resumed
        .run_turn(&key, request("I feel sad", &history), &mut rng)
        .await
        .unwrap();
    assert_eq!(second.decision.action, DirectiveAction::Reflect);
    assert_eq!(second.state.phase, Phase::Reflection);
    assert_eq!(second.state.total_message_count, 2);

    let stored = JsonFileStateStore::new(tmp.path()).load(&key).await.unwrap();
    assert_eq!(stored, Some(second.state));
}

#[tokio::test]
async fn request_carries_compiled_prompt_and_history() {
    let server = replying_server("Noted.").await;
    let engine = TurnEngine::from_config(
        &Config::default(),
        generator_for(&server),
        Arc::new(InMemoryStateStore::new()),
    );
    let history = vec![
        ChatMessage::user("morning"),
        ChatMessage::assistant("How are you arriving?"),
    ];
    let mut rng = StdRng::seed_from_u64(1);
    engine
        .run_turn(&SessionKey::new("sam", 1), request("hi", &history), &mut rng)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"].as_str().unwrap().contains("## Rules"));
    assert_eq!(messages[1]["content"], "morning");
    assert_eq!(messages.last().unwrap()["content"], "hi");
}

#[tokio::test]
async fn failing_generator_never_touches_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStateStore::new(tmp.path()));
    let primary: Box<dyn Generator> = Box::new(OpenAiCompatibleGenerator::new(
        "mock",
        &server.uri(),
        Some("k"),
        "m",
        0.7,
        5,
    ));
    let generator: Arc<dyn Generator> = Arc::new(ReliableGenerator::new(
        vec![("mock".into(), primary)],
        1,
        1,
    ));
    let shared: Arc<dyn StateStore> = store.clone();
    let engine = TurnEngine::from_config(&Config::default(), generator, shared);
    let key = SessionKey::new("sam", 1);
    let mut rng = StdRng::seed_from_u64(1);

    let err = engine
        .run_turn(&key, request("I feel sad", &[]), &mut rng)
        .await
        .unwrap_err();
    assert!(err.is_retryable_turn());
    assert!(err.to_string().contains("All generators failed"));
    assert!(!store.path_for(&key).exists());
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(2));
}

#[tokio::test]
async fn same_key_turns_are_serialized() {
    let server = replying_server("Noted.").await;
    let store = Arc::new(InMemoryStateStore::new());
    let shared: Arc<dyn StateStore> = store.clone();
    let engine = TurnEngine::from_config(&Config::default(), generator_for(&server), shared);
    let key = SessionKey::new("sam", 1);
    let other = SessionKey::new("alex", 1);
    let (mut a, mut b, mut c) = (
        StdRng::seed_from_u64(1),
        StdRng::seed_from_u64(2),
        StdRng::seed_from_u64(3),
    );

    let (first, second, third) = tokio::join!(
        engine.run_turn(&key, request("hi", &[]), &mut a),
        engine.run_turn(&key, request("hello", &[]), &mut b),
        engine.run_turn(&other, request("hey", &[]), &mut c),
    );
    first.unwrap();
    second.unwrap();
    third.unwrap();

    let state = store.load(&key).await.unwrap().unwrap();
    assert_eq!(state.total_message_count, 2);
    let other_state = store.load(&other).await.unwrap().unwrap();
    assert_eq!(other_state.total_message_count, 1);
}
