use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use llmchess::board::{render_board, Color, CoordinateMove, Square};
use llmchess::game::{ClickOutcome, GameSession, RulesAuthority, SuggestionOutcome};
use llmchess::oracle::{play_ticket, GeminiOracle, JsonFileStore, MoveSuggestionClient, Settings, MODEL_CHOICES};
use llmchess::pgn::PgnExporter;
use llmchess::Result;

const HELP: &str = "\
Commands:
  <square>            select a piece, or move the selected piece there (e2, then e4)
  <move>              play a coordinate move (e2e4, e7e8q)
  ai                  ask the configured model to play the side to move
  cancel              abandon the outstanding model request
  auto white|black    toggle automatic model play for a side
  reset               start a new game
  load <fen>          load a position
  board               show the board
  history             show the move list
  export [file]       write the game as PGN (default game.pgn)
  settings            show the API key and models
  set key <key>       store the API key
  set white <model>   model used for white
  set black <model>   model used for black
  help                show this text
  quit                leave";

/// Terminal chess against language models
///
/// Moves are entered as square clicks (`e2` then `e4`) or coordinate moves
/// (`e2e4`). Either side can be handed to a Gemini model, which is asked for
/// its move with the current FEN.
///
/// ## Usage Examples:
/// ```bash
/// # Human against human, ask the model for hints with `ai`
/// ./llmchess
///
/// # Play white against gemini-1.5-pro
/// ./llmchess --api-key KEY --black-model gemini-1.5-pro --auto-black
///
/// # Watch two models play from a custom position
/// ./llmchess --fen "8/P7/8/8/8/8/8/k6K w - - 0 1" --auto-white --auto-black
/// ```
#[derive(Parser)]
#[command(name = "llmchess")]
#[command(about = "Play chess against large language models in the terminal")]
#[command(version = "0.1.0")]
struct Args {
    /// Settings file holding the API key and the model for each side
    #[arg(long, value_name = "FILE", default_value = "llmchess-settings.json")]
    settings: PathBuf,

    /// Start from this FEN instead of the initial position
    #[arg(long, value_name = "FEN")]
    fen: Option<String>,

    /// API key to store in the settings file
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,

    /// Model that plays white
    #[arg(long, value_name = "MODEL")]
    white_model: Option<String>,

    /// Model that plays black
    #[arg(long, value_name = "MODEL")]
    black_model: Option<String>,

    /// Let the white model move automatically
    #[arg(long)]
    auto_white: bool,

    /// Let the black model move automatically
    #[arg(long)]
    auto_black: bool,

    /// Seconds before a model request is abandoned (0 = no limit)
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Click(Square),
    Move(CoordinateMove),
    Suggest,
    Cancel,
    Auto(Color),
    Reset,
    Load(String),
    Board,
    History,
    Export(PathBuf),
    ShowSettings,
    SetKey(String),
    SetModel(Color, String),
    Help,
    Quit,
}

fn parse_color(word: &str) -> std::result::Result<Color, String> {
    match word.to_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        other => Err(format!("Unknown side '{}', expected white or black", other)),
    }
}

fn parse_set(args: &str) -> std::result::Result<Command, String> {
    let (field, value) = args
        .split_once(char::is_whitespace)
        .map(|(f, v)| (f, v.trim()))
        .ok_or_else(|| "Usage: set key|white|black <value>".to_string())?;

    match field.to_lowercase().as_str() {
        "key" => Ok(Command::SetKey(value.to_string())),
        "white" => Ok(Command::SetModel(Color::White, value.to_string())),
        "black" => Ok(Command::SetModel(Color::Black, value.to_string())),
        other => Err(format!("Unknown setting '{}'", other)),
    }
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word.to_lowercase().as_str(), rest) {
        ("ai", "") => Ok(Command::Suggest),
        ("cancel", "") => Ok(Command::Cancel),
        ("reset" | "new", "") => Ok(Command::Reset),
        ("board", "") => Ok(Command::Board),
        ("history", "") => Ok(Command::History),
        ("settings", "") => Ok(Command::ShowSettings),
        ("help" | "?", "") => Ok(Command::Help),
        ("quit" | "exit", "") => Ok(Command::Quit),
        ("export", "") => Ok(Command::Export(PathBuf::from("game.pgn"))),
        ("export", path) => Ok(Command::Export(PathBuf::from(path))),
        ("load", fen) if !fen.is_empty() => Ok(Command::Load(fen.to_string())),
        ("auto", side) => parse_color(side).map(Command::Auto),
        ("set", args) => parse_set(args),
        ("move", mv) => mv.parse::<CoordinateMove>().map(Command::Move).map_err(|e| e.to_string()),
        (token, "") if token.len() == 2 => token.parse::<Square>().map(Command::Click).map_err(|e| e.to_string()),
        (token, "") if token.len() == 4 || token.len() == 5 => {
            token.parse::<CoordinateMove>().map(Command::Move).map_err(|e| e.to_string())
        }
        _ => Err(format!("Unknown command '{}'. Type 'help' for a list.", line)),
    }
}

type SuggestionResult = Result<SuggestionOutcome>;

struct App {
    session: Arc<Mutex<GameSession>>,
    client: Arc<MoveSuggestionClient<GeminiOracle>>,
    auto_white: bool,
    auto_black: bool,
    pending: Option<JoinHandle<()>>,
    results: mpsc::UnboundedSender<SuggestionResult>,
}

impl App {
    fn is_auto(&self, side: Color) -> bool {
        match side {
            Color::White => self.auto_white,
            Color::Black => self.auto_black,
        }
    }

    /// Run one command; returns false when the user asked to leave
    async fn run_command(&mut self, command: Command) -> bool {
        match command {
            Command::Click(square) => {
                let outcome = self.session.lock().await.click(square);
                match outcome {
                    Ok(ClickOutcome::Moved(descriptor)) => {
                        println!("Played {}", descriptor.san);
                        self.after_move().await;
                    }
                    Ok(ClickOutcome::Rejected { from, to }) => eprintln!("Illegal move {}{}", from, to),
                    Ok(ClickOutcome::Selected { square, destinations }) => {
                        self.print_board().await;
                        println!("{} selected, {} legal destinations", square, destinations);
                    }
                    Ok(ClickOutcome::Cleared) => println!("Selection cleared"),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Command::Move(mv) => {
                let result = self.session.lock().await.submit_move(mv);
                match result {
                    Ok(descriptor) => {
                        println!("Played {}", descriptor.san);
                        self.after_move().await;
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Command::Suggest => self.request_suggestion().await,
            Command::Cancel => self.cancel().await,
            Command::Auto(side) => {
                let enabled = match side {
                    Color::White => {
                        self.auto_white = !self.auto_white;
                        self.auto_white
                    }
                    Color::Black => {
                        self.auto_black = !self.auto_black;
                        self.auto_black
                    }
                };
                println!("Automatic play for {} {}", side, if enabled { "on" } else { "off" });
                self.auto_play().await;
            }
            Command::Reset => {
                self.abort_pending();
                let result = self.session.lock().await.reset();
                self.after_reload(result).await;
            }
            Command::Load(fen) => {
                let result = self.session.lock().await.load_position(&fen);
                match result {
                    Ok(()) => {
                        self.abort_pending();
                        self.after_reload(Ok(())).await;
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Command::Board => self.print_board().await,
            Command::History => self.print_history().await,
            Command::Export(path) => self.export(&path).await,
            Command::ShowSettings => self.show_settings(),
            Command::SetKey(key) => self.update_settings(move |settings| settings.api_key = key),
            Command::SetModel(side, model) => self.update_settings(move |settings| match side {
                Color::White => settings.white_model = model,
                Color::Black => settings.black_model = model,
            }),
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
        }
        true
    }

    async fn after_move(&mut self) {
        self.print_board().await;
        self.auto_play().await;
    }

    async fn after_reload(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.after_move().await,
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    /// Reserve the suggestion slot, then run the request in the background
    async fn request_suggestion(&mut self) {
        let ticket = match self.session.lock().await.begin_suggestion() {
            Ok(ticket) => ticket,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };

        if let Ok(settings) = self.client.settings() {
            println!("Asking {} for {}'s move...", settings.model_for(ticket.side), ticket.side);
        }

        debug!("Spawning request for suggestion {}", ticket.id());
        let session = Arc::clone(&self.session);
        let client = Arc::clone(&self.client);
        let results = self.results.clone();
        self.pending = Some(tokio::spawn(async move {
            let outcome = play_ticket(&*session, &*client, ticket).await;
            let _ = results.send(outcome);
        }));
    }

    async fn cancel(&mut self) {
        let cancelled = self.session.lock().await.cancel_suggestion();
        self.abort_pending();
        if cancelled {
            println!("Model request cancelled");
        } else {
            println!("No model request to cancel");
        }
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    async fn on_suggestion(&mut self, result: SuggestionResult) {
        if self.pending.as_ref().map_or(false, |handle| handle.is_finished()) {
            self.pending = None;
        }

        match result {
            Ok(SuggestionOutcome::Played(descriptor)) => {
                println!("Model played {}", descriptor.san);
                self.after_move().await;
            }
            Ok(SuggestionOutcome::Discarded) => debug!("Discarded a stale move suggestion"),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    /// Start a model request when the side to move is played automatically
    async fn auto_play(&mut self) {
        let (side, idle) = {
            let session = self.session.lock().await;
            let idle = !session.awaiting_suggestion() && !session.status().is_over();
            (session.rules().current_turn(), idle)
        };
        if idle && self.is_auto(side) {
            self.request_suggestion().await;
        }
    }

    async fn print_board(&self) {
        let session = self.session.lock().await;
        let surface = session.surface();
        print!("{}", render_board(session.layout(), surface.selected, &surface.highlights));
        println!("{}", surface.status);
        if surface.awaiting_suggestion {
            println!("Waiting for the model's move...");
        }
    }

    async fn print_history(&self) {
        let history = self.session.lock().await.surface().history;
        if history.is_empty() {
            println!("No moves yet");
        }
        for pair in history {
            println!("{:>3}. {:<8} {}", pair.number, pair.white, pair.black);
        }
    }

    async fn export(&self, path: &Path) {
        let settings = self.client.settings().unwrap_or_default();
        let player = |side: Color| {
            if self.is_auto(side) {
                settings.model_for(side).to_string()
            } else {
                "Human".to_string()
            }
        };
        let exporter = PgnExporter::new()
            .with_white(&player(Color::White))
            .with_black(&player(Color::Black));

        let session = self.session.lock().await;
        match exporter.export(
            session.rules().history_entries(),
            session.status(),
            session.start_position(),
            path,
        ) {
            Ok(()) => println!("Saved game to '{}'", path.display()),
            Err(e) => eprintln!("Error exporting to PGN: {}", e),
        }
    }

    fn show_settings(&self) {
        match self.client.settings() {
            Ok(settings) => {
                println!("API key:     {}", settings.masked_key());
                println!("White model: {}", settings.white_model);
                println!("Black model: {}", settings.black_model);
                println!("Available:   {}", MODEL_CHOICES.join(", "));
            }
            Err(e) => eprintln!("Error reading settings: {}", e),
        }
    }

    fn update_settings<F: FnOnce(&mut Settings)>(&self, change: F) {
        let mut settings = match self.client.settings() {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error reading settings: {}", e);
                return;
            }
        };
        change(&mut settings);
        match self.client.update_settings(settings) {
            Ok(()) => println!("Settings saved"),
            Err(e) => eprintln!("Error saving settings: {}", e),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let store = match JsonFileStore::open(&args.settings) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error loading settings '{}': {}", args.settings.display(), e);
            process::exit(1);
        }
    };

    let oracle = if args.timeout_secs > 0 {
        GeminiOracle::with_timeout(Duration::from_secs(args.timeout_secs))
    } else {
        Ok(GeminiOracle::new())
    };
    let oracle = match oracle {
        Ok(oracle) => oracle,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            process::exit(1);
        }
    };
    let client = Arc::new(MoveSuggestionClient::new(oracle, store));

    if args.api_key.is_some() || args.white_model.is_some() || args.black_model.is_some() {
        let mut settings = match client.settings() {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error reading settings: {}", e);
                process::exit(1);
            }
        };
        if let Some(key) = args.api_key {
            settings.api_key = key;
        }
        if let Some(model) = args.white_model {
            settings.white_model = model;
        }
        if let Some(model) = args.black_model {
            settings.black_model = model;
        }
        if let Err(e) = client.update_settings(settings) {
            eprintln!("Error saving settings: {}", e);
            process::exit(1);
        }
    }

    let session = match args.fen.as_deref() {
        Some(fen) => GameSession::from_fen(fen),
        None => GameSession::new(),
    };
    let session = match session {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let mut app = App {
        session: Arc::new(Mutex::new(session)),
        client,
        auto_white: args.auto_white,
        auto_black: args.auto_black,
        pending: None,
        results: results_tx,
    };

    println!("LLM Chess. Type 'help' for commands.");
    app.print_board().await;
    app.auto_play().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(command) => {
                            if !app.run_command(command).await {
                                break;
                            }
                        }
                        Err(message) => eprintln!("{}", message),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    break;
                }
            },
            Some(result) = results_rx.recv() => app.on_suggestion(result).await,
        }
    }

    app.abort_pending();
    info!("Session ended");
}
