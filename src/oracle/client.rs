use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use tokio::sync::Mutex;

use super::settings::{Settings, SettingsStore};
use crate::board::{Color, CoordinateMove};
use crate::error::{ChessError, Result};
use crate::game::{GameSession, RulesAuthority, SuggestionOutcome, SuggestionTicket};

lazy_static! {
    static ref COORDINATE_MOVE: Regex = Regex::new(r"[a-h][1-8][a-h][1-8][qrbn]?").unwrap();
}

/// One question put to a move oracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub position: String,
    pub credential: String,
    pub model: String,
}

/// Anything that answers a position with free text naming a move
#[async_trait]
pub trait MoveOracle: Send + Sync {
    async fn ask(&self, request: &OracleRequest) -> Result<String>;
}

/// First coordinate move found anywhere in an oracle reply
pub fn extract_coordinate_move(reply: &str) -> Result<CoordinateMove> {
    let found = COORDINATE_MOVE
        .find(reply)
        .ok_or_else(|| ChessError::InvalidSuggestionFormat(reply.to_string()))?;
    found.as_str().parse()
}

pub struct MoveSuggestionClient<O: MoveOracle> {
    oracle: O,
    settings: Arc<dyn SettingsStore>,
}

impl<O: MoveOracle> MoveSuggestionClient<O> {
    pub fn new(oracle: O, settings: Arc<dyn SettingsStore>) -> Self {
        MoveSuggestionClient { oracle, settings }
    }

    pub fn settings(&self) -> Result<Settings> {
        self.settings.load()
    }

    /// Replace the stored settings; later requests use the new values
    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        for model in [&settings.white_model, &settings.black_model] {
            if !Settings::is_known_model(model) {
                warn!("Model {} is not one of the offered choices", model);
            }
        }
        self.settings.save(&settings)
    }

    /// Ask for a move for `side`, using the credential and model from settings
    pub async fn request_move(&self, position: &str, side: Color) -> Result<CoordinateMove> {
        let settings = self.settings.load()?;
        let credential = settings.credential().ok_or(ChessError::MissingCredential)?;
        self.request_move_with(position, credential, settings.model_for(side))
            .await
    }

    pub async fn request_move_with(
        &self,
        position: &str,
        credential: &str,
        model: &str,
    ) -> Result<CoordinateMove> {
        if credential.trim().is_empty() {
            error!("Move requested without an API key");
            return Err(ChessError::MissingCredential);
        }

        let request = OracleRequest {
            position: position.to_string(),
            credential: credential.trim().to_string(),
            model: model.to_string(),
        };
        info!("Requesting move from {} for {}", model, position);

        let reply = self.oracle.ask(&request).await.map_err(|e| {
            error!("Move request to {} failed: {}", model, e);
            e
        })?;

        extract_coordinate_move(&reply).map_err(|e| {
            error!("Could not read a move from reply {:?}", reply);
            e
        })
    }
}

/// Ask the oracle for the side to move and play its answer.
///
/// The session lock is only held to reserve the suggestion slot and to apply
/// the answer, never across the request itself.
pub async fn suggest_and_play<R, O>(
    session: &Mutex<GameSession<R>>,
    client: &MoveSuggestionClient<O>,
) -> Result<SuggestionOutcome>
where
    R: RulesAuthority + Send,
    O: MoveOracle,
{
    let ticket = session.lock().await.begin_suggestion()?;
    play_ticket(session, client, ticket).await
}

/// Request and apply the move for an already reserved suggestion slot
pub async fn play_ticket<R, O>(
    session: &Mutex<GameSession<R>>,
    client: &MoveSuggestionClient<O>,
    ticket: SuggestionTicket,
) -> Result<SuggestionOutcome>
where
    R: RulesAuthority + Send,
    O: MoveOracle,
{
    let suggestion = client.request_move(&ticket.position, ticket.side).await;
    session.lock().await.finish_suggestion(ticket, suggestion)
}
