//! The reconciliation core.
//!
//! [`GameView`] folds the stream of heterogeneous server events into one
//! render-consistent structure: the authoritative table snapshot, the
//! transient action offer, any pending end-of-round decision, and a bounded
//! event log. Every mutation happens inside exactly one `apply_*` operation
//! and reports [`StateChanged`] flags so the frontend can decide what to
//! redraw. No other component writes this state.

use std::collections::VecDeque;

use crate::session::Session;
use holdem_core::protocol::{ActionToken, Card, TableState};

/// Cap on retained log entries.
const MAX_LOG_ENTRIES: usize = 100;

// ---------------------------------------------------------------------------
// Log entries
// ---------------------------------------------------------------------------

/// Semantic category for log entries. The frontend decides how to style
/// each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    System,
    Action,
    Winner,
    Error,
    Info,
}

/// A structured entry in the game event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Create/join acknowledged; carries the server's message verbatim.
    SessionEstablished { message: String },
    /// A new round began.
    RoundStarted { round: u32 },
    /// It is our turn; these tokens are on offer.
    YourTurn { actions: Vec<ActionToken> },
    /// Another player is up.
    WaitingFor { name: String },
    /// A player acted. Informational only.
    ActionTaken {
        player: String,
        action: String,
        chips: Option<u32>,
    },
    /// Community cards revealed; carries the server's message ("Flop dealt").
    CardsDealt { message: String },
    /// The round ended.
    RoundEnded { winner: String, chips_won: u32 },
    /// The game ended.
    GameOver { winner: String },
    /// Server-reported domain error, surfaced verbatim.
    ServerError { message: String },
    /// The connection dropped.
    Disconnected,
    /// Local feedback from the frontend.
    Text { text: String, category: LogCategory },
}

impl LogEntry {
    /// Semantic category for styling purposes.
    pub fn category(&self) -> LogCategory {
        match self {
            Self::SessionEstablished { .. } | Self::RoundStarted { .. } | Self::YourTurn { .. } => {
                LogCategory::System
            }
            Self::ActionTaken { .. } => LogCategory::Action,
            Self::RoundEnded { .. } | Self::GameOver { .. } => LogCategory::Winner,
            Self::ServerError { .. } | Self::Disconnected => LogCategory::Error,
            Self::WaitingFor { .. } | Self::CardsDealt { .. } => LogCategory::Info,
            Self::Text { category, .. } => *category,
        }
    }
}

// ---------------------------------------------------------------------------
// Transient view state
// ---------------------------------------------------------------------------

/// The current action offer. Valid only until superseded by the next offer,
/// the next snapshot, or round end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOffer {
    pub actor: String,
    pub actions: Vec<ActionToken>,
}

/// An end-of-lifecycle decision the frontend surfaces after a fixed display
/// delay. Created by `round_ended` / `game_over`; cleared by the user's
/// choice or by the next round starting without us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDecision {
    NextRound { winner: String, chips_won: u32 },
    GameOver { winner: String },
}

/// Joined/needed player counts for the waiting screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitingStatus {
    pub joined: u32,
    pub needed: u32,
}

/// Which aspects of the view an `apply_*` call modified.
///
/// Frontends inspect these to decide what to re-render. All flags default
/// to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChanged {
    /// The visible screen changed.
    pub screen: bool,
    /// The table snapshot was replaced.
    pub table: bool,
    /// The community cards changed.
    pub cards: bool,
    /// The action offer was replaced or cleared.
    pub offer: bool,
    /// A pending decision was created.
    pub decision: bool,
    /// A log entry was appended.
    pub log: bool,
}

impl StateChanged {
    /// Returns `true` if any flag is set.
    pub fn any(self) -> bool {
        self.screen || self.table || self.cards || self.offer || self.decision || self.log
    }
}

// ---------------------------------------------------------------------------
// GameView
// ---------------------------------------------------------------------------

/// Everything the presentation layer renders from.
pub struct GameView {
    /// Authoritative snapshot; default-empty until the first round starts.
    pub table: TableState,
    /// Current action offer, if any.
    pub offer: Option<ActionOffer>,
    /// Decision awaiting the user after round end / game over.
    pub pending: Option<PendingDecision>,
    /// Waiting-screen counts from join acknowledgments.
    pub waiting: Option<WaitingStatus>,
    /// Bounded event log, oldest first.
    pub entries: VecDeque<LogEntry>,
    /// False once the channel has closed.
    pub connected: bool,
}

impl GameView {
    pub fn new() -> Self {
        Self {
            table: TableState::default(),
            offer: None,
            pending: None,
            waiting: None,
            entries: VecDeque::new(),
            connected: true,
        }
    }

    /// Append a log entry, keeping the last [`MAX_LOG_ENTRIES`].
    pub fn add_entry(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        if self.entries.len() > MAX_LOG_ENTRIES {
            self.entries.pop_front();
        }
    }

    /// Convenience for ad-hoc local feedback.
    pub fn add_message(&mut self, text: String, category: LogCategory) {
        self.add_entry(LogEntry::Text { text, category });
    }

    // ------------------------------------------------------------------
    // apply_* — one operation per inbound event kind
    // ------------------------------------------------------------------

    /// Create/join acknowledged. Waiting counts arrive only on joins.
    pub fn apply_session_established(
        &mut self,
        message: String,
        waiting: Option<WaitingStatus>,
    ) -> StateChanged {
        if waiting.is_some() {
            self.waiting = waiting;
        }
        self.add_entry(LogEntry::SessionEstablished { message });
        StateChanged {
            log: true,
            ..Default::default()
        }
    }

    /// A new round began: wholesale snapshot, stale offer and any pending
    /// decision gone (the server progressed without waiting for us), the
    /// waiting screen is over.
    pub fn apply_round_started(&mut self, table: TableState) -> StateChanged {
        let round = table.rounds;
        let mut changed = self.apply_snapshot(table);
        self.pending = None;
        self.waiting = None;
        self.add_entry(LogEntry::RoundStarted { round });
        changed.log = true;
        changed
    }

    /// Unconditional wholesale replace of the table snapshot.
    ///
    /// Partial merging is rejected outright: community cards and player
    /// lists shrink on a new round as well as grow, and a merge cannot tell
    /// "field omitted" from "field reset to empty". The snapshot also
    /// supersedes any held action offer. A pending decision is deliberately
    /// left alone — snapshots may arrive while the user is still deciding,
    /// and the view must stay current without retracting the prompt.
    pub fn apply_snapshot(&mut self, table: TableState) -> StateChanged {
        let cards = self.table.cards_on_table != table.cards_on_table;
        self.table = table;
        let offer = self.offer.take().is_some();
        StateChanged {
            table: true,
            cards,
            offer,
            ..Default::default()
        }
    }

    /// Community-card reveal ahead of the next full snapshot. Touches only
    /// the card sequence — players, pot and bids keep their last
    /// authoritative values.
    pub fn apply_cards_revealed(&mut self, cards: Vec<Card>, message: String) -> StateChanged {
        self.table.cards_on_table = cards;
        self.add_entry(LogEntry::CardsDealt { message });
        StateChanged {
            cards: true,
            log: true,
            ..Default::default()
        }
    }

    /// Replace the held action offer.
    ///
    /// Whether the offer is actionable is decided at render time through
    /// [`actionable_offer`](Self::actionable_offer), so a non-local offer
    /// hides any stale controls by construction. The actor may name a
    /// player missing from the current roster — that is a benign race with
    /// a snapshot still in flight, rendered as "waiting".
    pub fn apply_action_offer(
        &mut self,
        actor: String,
        actions: Vec<ActionToken>,
        session: &Session,
    ) -> StateChanged {
        if session.is_local(&actor) {
            self.add_entry(LogEntry::YourTurn {
                actions: actions.clone(),
            });
        } else {
            self.add_entry(LogEntry::WaitingFor {
                name: actor.clone(),
            });
        }
        self.offer = Some(ActionOffer { actor, actions });
        StateChanged {
            offer: true,
            log: true,
            ..Default::default()
        }
    }

    /// Append-only record of a player's action. Never authoritative for
    /// chip counts — the next snapshot reconciles those.
    pub fn apply_action_taken(
        &mut self,
        player: String,
        action: String,
        chips: Option<u32>,
    ) -> StateChanged {
        self.add_entry(LogEntry::ActionTaken {
            player,
            action,
            chips,
        });
        StateChanged {
            log: true,
            ..Default::default()
        }
    }

    /// Round over: final snapshot, offer cleared, next-round decision
    /// queued for the frontend to surface after its display delay.
    pub fn apply_round_ended(
        &mut self,
        winner: String,
        chips_won: u32,
        table: TableState,
    ) -> StateChanged {
        let mut changed = self.apply_snapshot(table);
        changed.offer = true;
        self.pending = Some(PendingDecision::NextRound {
            winner: winner.clone(),
            chips_won,
        });
        self.add_entry(LogEntry::RoundEnded { winner, chips_won });
        changed.decision = true;
        changed.log = true;
        changed
    }

    /// Game over: queue the delayed reset decision.
    pub fn apply_game_over(&mut self, winner: String) -> StateChanged {
        let offer = self.offer.take().is_some();
        self.pending = Some(PendingDecision::GameOver {
            winner: winner.clone(),
        });
        self.add_entry(LogEntry::GameOver { winner });
        StateChanged {
            offer,
            decision: true,
            log: true,
            ..Default::default()
        }
    }

    /// Server-reported domain error: surfaced, logged, no state transition.
    pub fn apply_server_error(&mut self, message: String) -> StateChanged {
        self.add_entry(LogEntry::ServerError { message });
        StateChanged {
            log: true,
            ..Default::default()
        }
    }

    /// The channel closed. All semantic state is now presumed stale.
    pub fn note_disconnected(&mut self) -> StateChanged {
        self.connected = false;
        self.add_entry(LogEntry::Disconnected);
        StateChanged {
            log: true,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // Mutation helpers for the controller
    // ------------------------------------------------------------------

    /// Drop the held offer (an intent was just submitted; controls hide
    /// immediately, the server's next events reconcile).
    pub fn clear_offer(&mut self) -> StateChanged {
        let offer = self.offer.take().is_some();
        StateChanged {
            offer,
            ..Default::default()
        }
    }

    /// Resolve the pending decision without acting on it.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Full reset to the pre-session state. The log survives so the user
    /// can still read how the game ended.
    pub fn reset(&mut self) {
        self.table = TableState::default();
        self.offer = None;
        self.pending = None;
        self.waiting = None;
    }

    // ------------------------------------------------------------------
    // Pure derivations, recomputed per render
    // ------------------------------------------------------------------

    /// The local player's dealt cards, if present in the snapshot.
    pub fn local_hand(&self, session: &Session) -> &[Card] {
        self.table
            .player(session.player_name())
            .map(|p| p.cards.as_slice())
            .unwrap_or(&[])
    }

    /// The held offer, iff it is addressed to the local player.
    ///
    /// This is the sole source for rendering action controls; every other
    /// offer renders as a waiting indicator.
    pub fn actionable_offer(&self, session: &Session) -> Option<&ActionOffer> {
        self.offer
            .as_ref()
            .filter(|offer| session.is_local(&offer.actor))
    }

    /// Name to show in the "waiting for X" indicator, when the offer is
    /// someone else's.
    pub fn waiting_on<'a>(&'a self, session: &Session) -> Option<&'a str> {
        self.offer
            .as_ref()
            .filter(|offer| !session.is_local(&offer.actor))
            .map(|offer| offer.actor.as_str())
    }
}

impl Default for GameView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdem_core::protocol::{PlayerView, Suit};

    fn card(value: u8, suit: Suit) -> Card {
        Card { value, suit }
    }

    fn player(name: &str, chips: u32, cards: Vec<Card>) -> PlayerView {
        PlayerView {
            name: name.to_string(),
            human: true,
            chips,
            chips_added_to_table: 0,
            folded: false,
            cards,
        }
    }

    fn two_player_table(rounds: u32) -> TableState {
        TableState {
            rounds,
            table_chips: 150,
            highest_bid: 100,
            cards_on_table: Vec::new(),
            players: vec![
                player("Alice", 900, Vec::new()),
                player(
                    "Bob",
                    950,
                    vec![card(14, Suit::Spades), card(13, Suit::Spades)],
                ),
            ],
            current_player: Some("Alice".to_string()),
        }
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut view = GameView::new();
        let table = two_player_table(1);
        view.apply_snapshot(table.clone());
        let first = view.table.clone();
        view.apply_snapshot(table);
        assert_eq!(view.table, first);
        assert_eq!(view.table.players.len(), 2);
    }

    #[test]
    fn gating_hides_controls_for_other_actors() {
        // Scenario B: local identity "Bob", offer addressed to "Alice".
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));
        view.apply_action_offer(
            "Alice".to_string(),
            vec![ActionToken::Fold, ActionToken::Call],
            &session,
        );

        assert!(view.actionable_offer(&session).is_none());
        assert_eq!(view.waiting_on(&session), Some("Alice"));
        assert!(matches!(
            view.entries.back(),
            Some(LogEntry::WaitingFor { name }) if name == "Alice"
        ));
    }

    #[test]
    fn gating_exposes_controls_for_local_actor() {
        // Scenario C: offer addressed to the local player.
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));
        view.apply_action_offer(
            "Bob".to_string(),
            vec![ActionToken::Fold, ActionToken::Call, ActionToken::Raise(50)],
            &session,
        );

        let offer = view.actionable_offer(&session).expect("offer is ours");
        assert_eq!(offer.actions.len(), 3);
        assert_eq!(offer.actions[2].label(), "Raise 50");
        assert!(view.waiting_on(&session).is_none());
    }

    #[test]
    fn offer_supersession_keeps_only_latest_actor() {
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_action_offer("Bob".to_string(), vec![ActionToken::Fold], &session);
        view.apply_action_offer("Alice".to_string(), vec![ActionToken::Call], &session);

        assert!(view.actionable_offer(&session).is_none());
        assert_eq!(view.waiting_on(&session), Some("Alice"));

        view.apply_action_offer("Bob".to_string(), vec![ActionToken::Call], &session);
        let offer = view.actionable_offer(&session).unwrap();
        assert_eq!(offer.actions, vec![ActionToken::Call]);
    }

    #[test]
    fn offer_for_unknown_player_is_benign() {
        // The offer may race a snapshot that has not arrived yet.
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_action_offer("Mallory".to_string(), vec![ActionToken::Fold], &session);
        assert!(view.table.player("Mallory").is_none());
        assert_eq!(view.waiting_on(&session), Some("Mallory"));
    }

    #[test]
    fn reveal_then_snapshot_is_monotonic_within_round() {
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));

        let flop = vec![
            card(2, Suit::Hearts),
            card(7, Suit::Clubs),
            card(11, Suit::Spades),
        ];
        view.apply_cards_revealed(flop.clone(), "Flop dealt".to_string());
        assert_eq!(view.table.cards_on_table.len(), 3);
        // Player and pot fields kept their last authoritative values.
        assert_eq!(view.table.players.len(), 2);
        assert_eq!(view.table.table_chips, 150);

        // Snapshot with a superset of the revealed cards.
        let mut table = two_player_table(1);
        table.cards_on_table = flop;
        table.cards_on_table.push(card(5, Suit::Diamonds));
        view.apply_snapshot(table);
        assert_eq!(view.table.cards_on_table.len(), 4);

        // A new round's snapshot is the only allowed decrease.
        view.apply_round_started(two_player_table(2));
        assert!(view.table.cards_on_table.is_empty());
        assert_eq!(view.table.rounds, 2);
    }

    #[test]
    fn action_taken_never_mutates_chips() {
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));
        let before = view.table.clone();

        let changed =
            view.apply_action_taken("Alice".to_string(), "called".to_string(), Some(100));
        assert_eq!(view.table, before);
        assert!(changed.log);
        assert!(!changed.table);
    }

    #[test]
    fn round_ended_clears_offer_and_queues_decision() {
        // Scenario D: table fields update immediately; the next-round intent
        // waits for explicit confirmation (controller side).
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));
        view.apply_action_offer("Bob".to_string(), vec![ActionToken::Fold], &session);

        let mut final_table = two_player_table(1);
        final_table.table_chips = 0;
        let changed = view.apply_round_ended("Alice".to_string(), 120, final_table);

        assert!(changed.decision);
        assert!(view.offer.is_none());
        assert_eq!(view.table.table_chips, 0);
        assert_eq!(
            view.pending,
            Some(PendingDecision::NextRound {
                winner: "Alice".to_string(),
                chips_won: 120
            })
        );
    }

    #[test]
    fn snapshot_during_pending_decision_leaves_it_untouched() {
        let mut view = GameView::new();
        view.apply_round_ended("Alice".to_string(), 120, two_player_table(1));
        assert!(view.pending.is_some());

        // Server-side auto-progression keeps the view current while the
        // user decides.
        let mut table = two_player_table(1);
        table.table_chips = 40;
        view.apply_snapshot(table);
        assert_eq!(view.table.table_chips, 40);
        assert!(view.pending.is_some());
    }

    #[test]
    fn round_started_clears_pending_decision() {
        let mut view = GameView::new();
        view.apply_round_ended("Alice".to_string(), 120, two_player_table(1));
        view.apply_round_started(two_player_table(2));
        assert!(view.pending.is_none());
    }

    #[test]
    fn snapshot_supersedes_offer() {
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_action_offer("Bob".to_string(), vec![ActionToken::Fold], &session);
        let changed = view.apply_snapshot(two_player_table(1));
        assert!(changed.offer);
        assert!(view.offer.is_none());
    }

    #[test]
    fn local_hand_derivation() {
        let session = Session::new("Bob");
        let mut view = GameView::new();
        assert!(view.local_hand(&session).is_empty());

        view.apply_snapshot(two_player_table(1));
        let hand = view.local_hand(&session);
        assert_eq!(hand.len(), 2);
        assert_eq!(hand[0].to_string(), "A♠");

        // Other players' hands stay empty on the wire.
        let other = Session::new("Alice");
        assert!(view.local_hand(&other).is_empty());
    }

    #[test]
    fn server_error_leaves_state_unchanged() {
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));
        view.apply_action_offer("Bob".to_string(), vec![ActionToken::Fold], &session);
        let before_table = view.table.clone();

        let changed = view.apply_server_error("Game not found".to_string());
        assert!(changed.log && !changed.table && !changed.offer);
        assert_eq!(view.table, before_table);
        assert!(view.actionable_offer(&session).is_some());
    }

    #[test]
    fn log_is_bounded() {
        let mut view = GameView::new();
        for i in 0..250 {
            view.add_message(format!("entry {i}"), LogCategory::Info);
        }
        assert_eq!(view.entries.len(), MAX_LOG_ENTRIES);
        assert!(matches!(
            view.entries.front(),
            Some(LogEntry::Text { text, .. }) if text == "entry 150"
        ));
    }

    #[test]
    fn reset_keeps_log_but_drops_session_state() {
        let session = Session::new("Bob");
        let mut view = GameView::new();
        view.apply_snapshot(two_player_table(1));
        view.apply_action_offer("Bob".to_string(), vec![ActionToken::Fold], &session);
        view.apply_game_over("Alice".to_string());

        view.reset();
        assert_eq!(view.table, TableState::default());
        assert!(view.offer.is_none());
        assert!(view.pending.is_none());
        assert!(!view.entries.is_empty());
    }
}
