//! Wire protocol for the holdem event channel.
//!
//! Every frame on the wire is a JSON object `{"event": "...", "data": {...}}`
//! — the event name selects the variant, the payload fills it. Unknown
//! payload fields are ignored so the client tolerates server-side additions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Card suit. Serialized under the wire field name `color`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Diamonds,
    Spades,
    Clubs,
}

impl Suit {
    /// Display glyph for this suit.
    pub fn glyph(self) -> &'static str {
        match self {
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Spades => "♠",
            Suit::Clubs => "♣",
        }
    }
}

/// A single card as the server deals it. Immutable once received.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    /// 2–14, where 11–14 are J/Q/K/A.
    pub value: u8,
    #[serde(rename = "color")]
    pub suit: Suit,
}

impl Card {
    pub fn value_str(&self) -> &'static str {
        match self.value {
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            6 => "6",
            7 => "7",
            8 => "8",
            9 => "9",
            10 => "10",
            11 => "J",
            12 => "Q",
            13 => "K",
            14 => "A",
            _ => "?",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value_str(), self.suit.glyph())
    }
}

// ---------------------------------------------------------------------------
// Players and the table snapshot
// ---------------------------------------------------------------------------

/// One player as rendered in a table snapshot.
///
/// `cards` is only populated for the receiving player's own entry; everyone
/// else's hand arrives empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub name: String,
    pub human: bool,
    pub chips: u32,
    pub chips_added_to_table: u32,
    pub folded: bool,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// The authoritative table snapshot.
///
/// Every field is replaced wholesale on receipt — a partial merge cannot
/// distinguish "field omitted" from "field reset to empty" when a new round
/// shrinks the community cards or the player list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableState {
    pub rounds: u32,
    pub table_chips: u32,
    pub highest_bid: u32,
    pub cards_on_table: Vec<Card>,
    pub players: Vec<PlayerView>,
    #[serde(default)]
    pub current_player: Option<String>,
}

impl TableState {
    /// Look up a player by display name.
    pub fn player(&self, name: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Betting street derived from the community-card count.
    pub fn street(&self) -> &'static str {
        match self.cards_on_table.len() {
            0 => "Pre-flop",
            3 => "Flop",
            4 => "Turn",
            5 => "River",
            _ => "Dealing",
        }
    }
}

// ---------------------------------------------------------------------------
// Action tokens
// ---------------------------------------------------------------------------

/// Error produced when an action token string does not match the closed
/// vocabulary.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized action token {0:?}")]
pub struct ActionTokenError(pub String);

/// A player action exactly as the server offers it.
///
/// The wire form is `FOLD`, `CALL`, or `RAISE<amount>` with no separator
/// (e.g. `RAISE200`). The client never synthesizes amounts — it echoes back
/// one of the tokens the server declared legal at offer time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionToken {
    Fold,
    Call,
    Raise(u32),
}

impl ActionToken {
    /// Human-readable label for UI display ("Raise 200" etc).
    pub fn label(self) -> String {
        match self {
            ActionToken::Fold => "Fold".to_string(),
            ActionToken::Call => "Call".to_string(),
            ActionToken::Raise(amount) => format!("Raise {amount}"),
        }
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionToken::Fold => f.write_str("FOLD"),
            ActionToken::Call => f.write_str("CALL"),
            ActionToken::Raise(amount) => write!(f, "RAISE{amount}"),
        }
    }
}

impl FromStr for ActionToken {
    type Err = ActionTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOLD" => Ok(ActionToken::Fold),
            "CALL" => Ok(ActionToken::Call),
            _ => {
                let amount = s
                    .strip_prefix("RAISE")
                    .and_then(|rest| rest.parse::<u32>().ok())
                    .ok_or_else(|| ActionTokenError(s.to_string()))?;
                Ok(ActionToken::Raise(amount))
            }
        }
    }
}

impl Serialize for ActionToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActionToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection acknowledgment. The `sid` is diagnostic only — it carries
    /// no game semantics.
    Connected { sid: String },

    /// A game we requested was created; we are its first player.
    GameCreated { game_id: String, message: String },

    /// Join acknowledgment, broadcast to the whole session as players
    /// arrive.
    JoinedGame {
        game_id: String,
        players_joined: u32,
        players_needed: u32,
        message: String,
    },

    /// A new round began; carries the opening snapshot.
    RoundStarted(TableState),

    /// Full table snapshot.
    GameState(TableState),

    /// The named player may act, choosing from the listed tokens.
    RequestAction {
        player_name: String,
        available_actions: Vec<ActionToken>,
    },

    /// A player acted. Informational — chip counts are only authoritative
    /// in the next snapshot.
    ActionTaken {
        player: String,
        action: String,
        #[serde(default)]
        chips: Option<u32>,
    },

    /// Community cards revealed ahead of the next full snapshot.
    CardsDealt { cards: Vec<Card>, message: String },

    /// The round ended; carries the final snapshot.
    RoundEnded {
        winner: String,
        chips_won: u32,
        game_state: TableState,
    },

    /// The game ended.
    GameOver { winner: String },

    /// Server-reported domain error, surfaced verbatim.
    Error { message: String },
}

/// Intents sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Request a new session.
    CreateGame {
        player_name: String,
        player_count: u32,
        human_count: u32,
        chips_per_player: u32,
        bet_limit: u32,
    },

    /// Request to join an existing session by code.
    JoinGame { game_id: String, player_name: String },

    /// Request the first round (host only; not enforced client-side).
    StartGame { game_id: String },

    /// Submit an action token the server offered.
    PlayerAction { game_id: String, action: ActionToken },

    /// Request the next round after the user confirmed.
    NextRound { game_id: String },
}
