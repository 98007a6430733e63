//! Wire Types
//!
//! Request and response shapes exchanged with the adventure backend.
//!
//! Every one-shot endpoint answers with the same envelope:
//!
//! ```json
//! { "success": true, "data": "...", "error": null }
//! ```
//!
//! Narrative payloads arrive either as a bare string or as an object
//! carrying the text under `response` (older backends also echo the
//! `sessionId` there).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Header the server uses to issue a session identifier
pub const SESSION_HEADER: &str = "x-session-id";

// ============================================================================
// Session Identifier
// ============================================================================

/// Opaque session identifier issued by the server
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Wrap a server-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Adventure Settings
// ============================================================================

/// Parameters describing the adventure to generate
///
/// Created by the UI, sent once per configuration; the server is the source
/// of truth afterwards. No client-side validation is performed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureSettings {
    /// World or era, e.g. "medieval fantasy"
    pub setting: String,
    /// Story genre
    pub genre: String,
    /// Who the player is
    pub player_character: String,
    /// Central theme
    pub theme: String,
    /// Narrative tone
    pub tone_style: String,
    /// Free-form extra instructions
    #[serde(default)]
    pub additional_details: String,
}

impl Default for AdventureSettings {
    fn default() -> Self {
        Self {
            setting: "medieval fantasy".to_string(),
            genre: "fantasy".to_string(),
            player_character: "adventurer".to_string(),
            theme: "heroic".to_string(),
            tone_style: "classic fantasy".to_string(),
            additional_details: String::new(),
        }
    }
}

impl AdventureSettings {
    /// Settings for one of the stock themes
    #[must_use]
    pub fn preset(theme: ThemePreset) -> Self {
        match theme {
            ThemePreset::Fantasy => Self::default(),
            ThemePreset::SciFi => Self {
                setting: "distant-future starship".to_string(),
                genre: "science fiction".to_string(),
                player_character: "ship's engineer".to_string(),
                theme: "exploration".to_string(),
                tone_style: "hard sci-fi".to_string(),
                additional_details: String::new(),
            },
            ThemePreset::Horror => Self {
                setting: "abandoned manor".to_string(),
                genre: "horror".to_string(),
                player_character: "investigator".to_string(),
                theme: "dread".to_string(),
                tone_style: "gothic horror".to_string(),
                additional_details: String::new(),
            },
        }
    }

    /// Replace the additional details
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.additional_details = details.into();
        self
    }
}

/// Stock adventure themes offered by the front end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemePreset {
    /// Medieval fantasy (the default adventure)
    #[default]
    Fantasy,
    /// Science fiction
    SciFi,
    /// Horror
    Horror,
}

impl ThemePreset {
    /// All presets in display order
    pub const ALL: [ThemePreset; 3] = [Self::Fantasy, Self::SciFi, Self::Horror];

    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fantasy => "Fantasy",
            Self::SciFi => "Sci-Fi",
            Self::Horror => "Horror",
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of the `action` endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// What the player does next
    pub action: String,
}

impl ActionRequest {
    /// Create an action request
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Envelope wrapping every one-shot response
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the server handled the request
    pub success: bool,
    /// Payload on success
    pub data: Option<T>,
    /// Server-supplied failure description
    #[serde(default)]
    pub error: Option<String>,
}

/// Narrative text as sent by the server
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NarrativePayload {
    /// Bare narrative string
    Text(String),
    /// Narrative wrapped with session metadata
    Turn {
        /// Narrative text
        response: String,
        /// Session echoed in the body
        #[serde(rename = "sessionId", default)]
        session_id: Option<String>,
    },
}

impl NarrativePayload {
    /// The narrative text
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Turn { response, .. } => response,
        }
    }

    /// Session identifier carried in the body, if any
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            Self::Turn {
                session_id: Some(id),
                ..
            } if !id.is_empty() => Some(SessionId::new(id.clone())),
            _ => None,
        }
    }

    /// Consume into the narrative text
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Turn { response, .. } => response,
        }
    }
}

/// Acknowledgement of a configuration call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ack {
    /// Server acknowledgement text
    pub message: String,
    /// Session issued by this call, if any
    pub session_id: Option<SessionId>,
}

/// Server-side view of the running adventure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Narrative turns so far
    #[serde(default)]
    pub history: Vec<String>,
    /// The scene the player is in
    #[serde(default)]
    pub current_scene: String,
    /// Whether an adventure is running
    #[serde(default)]
    pub is_in_game: bool,
}
