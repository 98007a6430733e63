//! Narrator - Terminal Front End for the Adventure Backend
//!
//! Plays a server-narrated text adventure in the terminal. Narrative text
//! is streamed as it is generated unless `--no-stream` is given.
//!
//! # Usage
//!
//! ```bash
//! # Play the default fantasy adventure against http://127.0.0.1:8080
//! narrator
//!
//! # Pick a preset and add details
//! narrator play --theme horror --details "a lighthouse on a cliff"
//!
//! # Through the development proxy
//! narrator --dev play
//!
//! # Probe the backend
//! narrator health
//!
//! # Verbose logging
//! RUST_LOG=narrator_core=debug narrator
//! ```
//!
//! # In-game commands
//!
//! - `/state`: show the server's game state
//! - `/health`: probe the backend
//! - `/quit`: leave
//!
//! Ctrl-C while narration is streaming stops that stream; Ctrl-D leaves.

mod play;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use tracing::info;

use narrator_core::{load_config, AdventureSettings, ConfigOverrides, SessionClient, ThemePreset};

/// Narrator - play a server-narrated text adventure
#[derive(Parser, Debug)]
#[command(name = "narrator")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "NARRATOR_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and NARRATOR_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Route requests through the development proxy
    #[arg(long)]
    dev: bool,

    /// Timeout for one-shot requests in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Timeout for each stream connection attempt in milliseconds
    #[arg(long, value_name = "MS")]
    connect_timeout_ms: Option<u64>,

    /// Stream connection attempts before giving up
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "NARRATOR_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play an adventure (default)
    Play(PlayArgs),
    /// Check that the backend is up
    Health,
    /// List the stock adventure themes
    Themes,
}

/// Adventure selection
#[derive(ClapArgs, Debug, Default)]
pub struct PlayArgs {
    /// Stock adventure to start from
    #[arg(short = 't', long, value_enum, default_value_t = Theme::Fantasy)]
    theme: Theme,

    /// World or era
    #[arg(long)]
    setting: Option<String>,

    /// Story genre
    #[arg(long)]
    genre: Option<String>,

    /// Who the player is
    #[arg(long)]
    player: Option<String>,

    /// Central theme of the story
    #[arg(long = "story-theme", value_name = "THEME")]
    story_theme: Option<String>,

    /// Narrative tone
    #[arg(long)]
    tone: Option<String>,

    /// Free-form extra instructions for the narrator
    #[arg(short = 'd', long)]
    details: Option<String>,

    /// Use plain request/response calls instead of streaming
    #[arg(long)]
    no_stream: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Theme {
    #[default]
    Fantasy,
    SciFi,
    Horror,
}

impl From<Theme> for ThemePreset {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Fantasy => ThemePreset::Fantasy,
            Theme::SciFi => ThemePreset::SciFi,
            Theme::Horror => ThemePreset::Horror,
        }
    }
}

impl PlayArgs {
    /// Preset settings with any explicit fields applied on top
    fn settings(&self) -> AdventureSettings {
        let mut settings = AdventureSettings::preset(self.theme.into());
        let fields = [
            (&self.setting, &mut settings.setting),
            (&self.genre, &mut settings.genre),
            (&self.player, &mut settings.player_character),
            (&self.story_theme, &mut settings.theme),
            (&self.tone, &mut settings.tone_style),
            (&self.details, &mut settings.additional_details),
        ];
        for (flag, field) in fields {
            if let Some(value) = flag {
                field.clone_from(value);
            }
        }
        settings
    }
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            dev_mode: self.dev.then_some(true),
            timeout_ms: self.timeout_ms,
            connect_timeout_ms: self.connect_timeout_ms,
            max_attempts: self.max_attempts,
        }
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so they never interleave with narration on stdout.
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("narrator={level},narrator_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    let (config, source) = load_config(args.config.as_deref(), &args.overrides())
        .await
        .context("Failed to load configuration")?;
    info!(source = ?source, base_url = %config.base_url(), "Configuration loaded");

    match args.command.unwrap_or(Command::Play(PlayArgs::default())) {
        Command::Health => {
            let client = SessionClient::from_config(&config);
            match client.check_health().await {
                Ok(status) => {
                    println!("{}: {status}", client.base_url());
                    Ok(())
                }
                Err(e) => anyhow::bail!("{}", e.user_message()),
            }
        }
        Command::Themes => {
            for preset in ThemePreset::ALL {
                let settings = AdventureSettings::preset(preset);
                println!(
                    "{:<8} {} / {} / {}",
                    preset.label(),
                    settings.setting,
                    settings.genre,
                    settings.tone_style
                );
            }
            Ok(())
        }
        Command::Play(play) => {
            let settings = play.settings();
            play::run(&config, settings, !play.no_stream).await
        }
    }
}
