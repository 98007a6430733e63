//! Interactive Play Loop
//!
//! Reads player actions from stdin and renders narration to stdout. In
//! streaming mode fragments are printed as they arrive and the finished turn
//! is appended to the transcript; in one-shot mode each reply is printed
//! whole.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use narrator_core::{
    AdventureSettings, ClientConfig, ClientError, NarrationBuffer, SessionClient,
    StreamController, StreamHandle, StreamObserver, StreamOutcome, Transcript,
};

const HELP: &str = "Type what you want to do. Commands: /state, /health, /help, /quit";

/// Run an adventure until the player quits or stdin closes
pub async fn run(config: &ClientConfig, settings: AdventureSettings, streaming: bool) -> Result<()> {
    let session = Arc::new(SessionClient::from_config(config));
    let mut game = Game {
        session: Arc::clone(&session),
        streams: StreamController::from_config(config, session),
        transcript: Transcript::new(),
        streaming,
    };

    println!(
        "A {} adventure: {} as {}.",
        settings.genre, settings.setting, settings.player_character
    );
    println!("{HELP}");
    println!();

    game.begin(&settings).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/state" => game.show_state().await,
            "/health" => game.show_health().await,
            action => game.act(action).await,
        }
    }

    game.streams.cancel().await;
    debug!(messages = game.transcript.len(), "Adventure ended");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

struct Game {
    session: Arc<SessionClient>,
    streams: StreamController,
    transcript: Transcript,
    streaming: bool,
}

impl Game {
    async fn begin(&mut self, settings: &AdventureSettings) {
        if self.streaming {
            let handle = self.streams.start_adventure(settings).await;
            self.render(handle).await;
            return;
        }

        if let Err(e) = self.session.configure(settings).await {
            self.report(&e);
            return;
        }
        match self.session.start(settings).await {
            Ok(text) => self.narrate(text),
            Err(e) => self.report(&e),
        }
    }

    async fn act(&mut self, action: &str) {
        self.transcript.push_user(action);

        if self.streaming {
            let handle = self.streams.submit_action(action).await;
            self.render(handle).await;
            return;
        }

        match self.session.send_action(action).await {
            Ok(text) => self.narrate(text),
            Err(e) => self.report(&e),
        }
    }

    /// Print a stream as it arrives; Ctrl-C stops it
    async fn render(&mut self, mut handle: StreamHandle) {
        let mut live = LiveNarration::new(&mut self.transcript);

        let outcome = tokio::select! {
            outcome = handle.drive(&mut live) => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };

        match outcome {
            Some(StreamOutcome::Completed) | Some(StreamOutcome::Failed(_)) => {}
            Some(StreamOutcome::Cancelled) | None => {
                handle.cancel();
                println!();
                println!("(narration stopped)");
            }
        }
    }

    async fn show_state(&mut self) {
        match self.session.game_state().await {
            Ok(Some(state)) => {
                println!("Scene: {}", state.current_scene);
                println!("In game: {}", if state.is_in_game { "yes" } else { "no" });
                println!("Turns so far: {}", state.history.len());
            }
            Ok(None) => println!("No active session."),
            Err(e) => self.report(&e),
        }
    }

    async fn show_health(&mut self) {
        match self.session.check_health().await {
            Ok(status) => println!("Backend: {status}"),
            Err(e) => self.report(&e),
        }
    }

    fn narrate(&mut self, text: String) {
        println!("{text}");
        println!();
        self.transcript.push_system(text);
    }

    fn report(&mut self, error: &ClientError) {
        let message = self.transcript.push_error(error);
        eprintln!("{}", message.content);
    }
}

/// Observer that echoes fragments to the terminal and records the turn
struct LiveNarration<'a> {
    buffer: NarrationBuffer<'a>,
}

impl<'a> LiveNarration<'a> {
    fn new(transcript: &'a mut Transcript) -> Self {
        Self {
            buffer: NarrationBuffer::new(transcript),
        }
    }
}

impl StreamObserver for LiveNarration<'_> {
    fn on_fragment(&mut self, text: &str) {
        print!("{text}");
        let _ = std::io::stdout().flush();
        self.buffer.on_fragment(text);
    }

    fn on_complete(&mut self) {
        println!();
        println!();
        self.buffer.on_complete();
    }

    fn on_error(&mut self, error: &ClientError) {
        if !self.buffer.pending().is_empty() {
            println!();
        }
        eprintln!("{}", error.user_message());
        self.buffer.on_error(error);
    }
}
