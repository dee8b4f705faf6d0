use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use llmchess::board::{Color, STARTING_FEN};
use llmchess::game::{GameSession, RulesAuthority, SuggestionOutcome};
use llmchess::oracle::{
    play_ticket, suggest_and_play, MemoryStore, MoveOracle, MoveSuggestionClient, OracleRequest, Settings,
};
use llmchess::{ChessError, Result};
use tokio::sync::Mutex;

// Integration tests for requesting and applying language-model moves

/// Oracle answering from a fixed script and recording what it was asked
struct ScriptedOracle {
    replies: StdMutex<VecDeque<Result<String>>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<StdMutex<Vec<OracleRequest>>>,
}

#[async_trait]
impl MoveOracle for ScriptedOracle {
    async fn ask(&self, request: &OracleRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChessError::SuggestionUnavailable("no reply scripted".to_string())))
    }
}

struct Harness {
    client: MoveSuggestionClient<ScriptedOracle>,
    session: Mutex<GameSession>,
    calls: Arc<AtomicUsize>,
    requests: Arc<StdMutex<Vec<OracleRequest>>>,
}

impl Harness {
    fn new(api_key: &str, replies: Vec<Result<String>>) -> Self {
        Self::with_session(api_key, replies, GameSession::new().unwrap())
    }

    fn with_session(api_key: &str, replies: Vec<Result<String>>, session: GameSession) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(StdMutex::new(Vec::new()));
        let oracle = ScriptedOracle {
            replies: StdMutex::new(replies.into()),
            calls: Arc::clone(&calls),
            requests: Arc::clone(&requests),
        };
        let settings = Settings {
            api_key: api_key.to_string(),
            white_model: "gemini-1.5-flash".to_string(),
            black_model: "gemini-1.5-pro".to_string(),
        };
        Harness {
            client: MoveSuggestionClient::new(oracle, Arc::new(MemoryStore::new(settings))),
            session: Mutex::new(session),
            calls,
            requests,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> OracleRequest {
        self.requests.lock().unwrap().last().cloned().expect("a recorded request")
    }
}

fn reply(text: &str) -> Result<String> {
    Ok(text.to_string())
}

#[tokio::test]
async fn test_suggestion_in_prose_is_played() {
    let harness = Harness::new("test-key", vec![reply("I recommend e2e4 as the best move.")]);

    let outcome = suggest_and_play(&harness.session, &harness.client).await.unwrap();
    match outcome {
        SuggestionOutcome::Played(descriptor) => assert_eq!(descriptor.san, "e4"),
        other => panic!("expected a played move, got {:?}", other),
    }

    let request = harness.last_request();
    assert_eq!(request.position, STARTING_FEN);
    assert_eq!(request.credential, "test-key");
    assert_eq!(request.model, "gemini-1.5-flash");

    let session = harness.session.lock().await;
    assert_eq!(session.rules().current_turn(), Color::Black);
    assert!(!session.awaiting_suggestion());
    assert!(session.layout().matches(&session.rules().current_position()));
}

#[tokio::test]
async fn test_each_side_uses_its_own_model() {
    let harness = Harness::new("test-key", vec![reply("e2e4"), reply("c7c5")]);

    suggest_and_play(&harness.session, &harness.client).await.unwrap();
    assert_eq!(harness.last_request().model, "gemini-1.5-flash");

    suggest_and_play(&harness.session, &harness.client).await.unwrap();
    assert_eq!(harness.last_request().model, "gemini-1.5-pro");

    let session = harness.session.lock().await;
    assert_eq!(session.rules().history_entries().to_vec(), vec!["e4".to_string(), "c5".to_string()]);
}

#[tokio::test]
async fn test_empty_reply_is_invalid_format() {
    let harness = Harness::new("test-key", vec![reply("")]);

    let err = suggest_and_play(&harness.session, &harness.client).await.unwrap_err();
    assert!(matches!(err, ChessError::InvalidSuggestionFormat(_)));

    let session = harness.session.lock().await;
    assert_eq!(session.rules().current_position(), STARTING_FEN);
    assert!(!session.awaiting_suggestion());
}

#[tokio::test]
async fn test_missing_credential_makes_no_request() {
    let harness = Harness::new("", vec![reply("e2e4")]);

    let err = suggest_and_play(&harness.session, &harness.client).await.unwrap_err();
    assert!(matches!(err, ChessError::MissingCredential));
    assert_eq!(harness.calls(), 0);

    let err = harness
        .client
        .request_move_with(STARTING_FEN, "  ", "gemini-1.5-pro")
        .await
        .unwrap_err();
    assert!(matches!(err, ChessError::MissingCredential));
    assert_eq!(harness.calls(), 0);

    assert!(!harness.session.lock().await.awaiting_suggestion());
}

#[tokio::test]
async fn test_illegal_suggestion_is_rejected() {
    let harness = Harness::new("test-key", vec![reply("e2e5")]);

    let err = suggest_and_play(&harness.session, &harness.client).await.unwrap_err();
    assert!(matches!(err, ChessError::IllegalMoveRejected { .. }));

    let session = harness.session.lock().await;
    assert_eq!(session.rules().current_position(), STARTING_FEN);
    assert!(session.rules().history_entries().is_empty());
    assert_eq!(session.layout().len(), 32);
}

#[tokio::test]
async fn test_transport_failure_leaves_state_unchanged() {
    let failure = Err(ChessError::SuggestionUnavailable("connection refused".to_string()));
    let harness = Harness::new("test-key", vec![failure]);

    let err = suggest_and_play(&harness.session, &harness.client).await.unwrap_err();
    assert!(matches!(err, ChessError::SuggestionUnavailable(_)));
    assert_eq!(harness.calls(), 1);

    let session = harness.session.lock().await;
    assert_eq!(session.rules().current_position(), STARTING_FEN);
    assert!(!session.awaiting_suggestion());
}

#[tokio::test]
async fn test_second_request_while_outstanding_is_refused() {
    let harness = Harness::new("test-key", vec![reply("e2e4")]);
    let ticket = harness.session.lock().await.begin_suggestion().unwrap();

    let err = suggest_and_play(&harness.session, &harness.client).await.unwrap_err();
    assert!(matches!(err, ChessError::SuggestionInFlight));
    assert_eq!(harness.calls(), 0);

    let outcome = play_ticket(&harness.session, &harness.client, ticket).await.unwrap();
    assert!(matches!(outcome, SuggestionOutcome::Played(_)));
    assert_eq!(harness.calls(), 1);
}

#[tokio::test]
async fn test_reply_after_reset_is_discarded() {
    let harness = Harness::new("test-key", vec![reply("e2e4")]);
    let ticket = harness.session.lock().await.begin_suggestion().unwrap();

    harness.session.lock().await.reset().unwrap();
    assert!(!harness.session.lock().await.awaiting_suggestion());

    let outcome = play_ticket(&harness.session, &harness.client, ticket).await.unwrap();
    assert_eq!(outcome, SuggestionOutcome::Discarded);

    let session = harness.session.lock().await;
    assert_eq!(session.rules().current_position(), STARTING_FEN);
    assert!(session.rules().history_entries().is_empty());
}

#[tokio::test]
async fn test_no_request_once_the_game_is_over() {
    let mut session = GameSession::new().unwrap();
    for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        session.submit_move(mv.parse().unwrap()).unwrap();
    }
    let harness = Harness::with_session("test-key", vec![reply("e1f2")], session);

    let err = suggest_and_play(&harness.session, &harness.client).await.unwrap_err();
    assert!(matches!(err, ChessError::GameOver));
    assert_eq!(harness.calls(), 0);
}

#[tokio::test]
async fn test_updated_settings_apply_to_later_requests() {
    let harness = Harness::new("", vec![reply("e2e4")]);

    let mut settings = harness.client.settings().unwrap();
    settings.api_key = "fresh-key".to_string();
    settings.white_model = "gemini-2.0-flash-exp".to_string();
    harness.client.update_settings(settings).unwrap();

    let mv = harness.client.request_move(STARTING_FEN, Color::White).await.unwrap();
    assert_eq!(mv.to_string(), "e2e4");

    let request = harness.last_request();
    assert_eq!(request.credential, "fresh-key");
    assert_eq!(request.model, "gemini-2.0-flash-exp");
}
