//! Single dispatch point for the client.
//!
//! [`ClientController`] owns the channel, the session identity, the
//! reconciliation core and the screen machine. Every inbound event is
//! routed to exactly one handler; every outbound intent goes through a
//! helper here so gating and session checks live in one place. Frontends
//! never write view state directly.

use tracing::debug;

use crate::channel::ChannelClient;
use crate::screen::{Screen, ScreenController, ScreenTrigger};
use crate::session::Session;
use crate::transport::{Transport, TransportError};
use crate::view::{GameView, LogCategory, StateChanged, WaitingStatus};
use holdem_core::protocol::{ActionToken, ClientEvent, ServerEvent};

/// Outcome of processing one channel event.
#[derive(Debug)]
pub enum PollResult {
    /// An event was applied; the flags describe what changed.
    Updated(StateChanged),
    /// The server closed the connection. State is presumed stale; the
    /// recommended policy is a full reset, not reconciliation.
    Disconnected,
    /// No event was available.
    Empty,
}

/// Parameters for a `create_game` request.
#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub player_count: u32,
    pub human_count: u32,
    pub chips_per_player: u32,
    pub bet_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 4,
            human_count: 1,
            chips_per_player: 1000,
            bet_limit: 100,
        }
    }
}

pub struct ClientController {
    channel: ChannelClient,
    pub session: Session,
    pub view: GameView,
    pub screen: ScreenController,
}

impl ClientController {
    /// Build a controller over any [`Transport`] implementation.
    pub fn from_transport<T: Transport>(transport: T, name: &str) -> Self {
        Self {
            channel: ChannelClient::from_transport(transport),
            session: Session::new(name),
            view: GameView::new(),
            screen: ScreenController::new(),
        }
    }

    /// Connect to a WebSocket server.
    pub async fn connect_ws(url: &str, name: &str) -> Result<Self, TransportError> {
        let channel = ChannelClient::connect_ws(url).await?;
        Ok(Self {
            channel,
            session: Session::new(name),
            view: GameView::new(),
            screen: ScreenController::new(),
        })
    }

    /// Await the next channel event. Useful in `tokio::select!` loops.
    pub async fn recv(&mut self) -> PollResult {
        match self.channel.incoming.recv().await {
            Some(event) => PollResult::Updated(self.apply(event)),
            None => {
                self.view.note_disconnected();
                PollResult::Disconnected
            }
        }
    }

    /// Process one channel event without blocking.
    pub fn try_recv(&mut self) -> PollResult {
        use tokio::sync::mpsc::error::TryRecvError;
        match self.channel.incoming.try_recv() {
            Ok(event) => PollResult::Updated(self.apply(event)),
            Err(TryRecvError::Empty) => PollResult::Empty,
            Err(TryRecvError::Disconnected) => {
                self.view.note_disconnected();
                PollResult::Disconnected
            }
        }
    }

    /// Append local frontend feedback through the controller, keeping it
    /// the single mutation gateway.
    pub fn add_message(&mut self, text: String, category: LogCategory) {
        self.view.add_message(text, category);
    }

    // ------------------------------------------------------------------
    // Inbound routing
    // ------------------------------------------------------------------

    fn apply(&mut self, event: ServerEvent) -> StateChanged {
        match event {
            ServerEvent::Connected { sid } => {
                // Diagnostic only; no game semantics, no render change.
                debug!(sid = %sid, "channel connected");
                self.session.set_connection_id(sid);
                StateChanged::default()
            }
            ServerEvent::GameCreated { game_id, message } => {
                self.session.establish(game_id);
                let screen = self.screen.apply(ScreenTrigger::SessionEstablished);
                let mut changed = self.view.apply_session_established(message, None);
                changed.screen = screen;
                changed
            }
            ServerEvent::JoinedGame {
                game_id,
                players_joined,
                players_needed,
                message,
            } => {
                self.session.establish(game_id);
                let screen = self.screen.apply(ScreenTrigger::SessionEstablished);
                let mut changed = self.view.apply_session_established(
                    message,
                    Some(WaitingStatus {
                        joined: players_joined,
                        needed: players_needed,
                    }),
                );
                changed.screen = screen;
                changed
            }
            ServerEvent::RoundStarted(table) => {
                let screen = self.screen.apply(ScreenTrigger::RoundStarted);
                let mut changed = self.view.apply_round_started(table);
                changed.screen = screen;
                changed
            }
            ServerEvent::GameState(table) => self.view.apply_snapshot(table),
            ServerEvent::RequestAction {
                player_name,
                available_actions,
            } => self
                .view
                .apply_action_offer(player_name, available_actions, &self.session),
            ServerEvent::ActionTaken {
                player,
                action,
                chips,
            } => self.view.apply_action_taken(player, action, chips),
            ServerEvent::CardsDealt { cards, message } => {
                self.view.apply_cards_revealed(cards, message)
            }
            ServerEvent::RoundEnded {
                winner,
                chips_won,
                game_state,
            } => self.view.apply_round_ended(winner, chips_won, game_state),
            ServerEvent::GameOver { winner } => self.view.apply_game_over(winner),
            ServerEvent::Error { message } => self.view.apply_server_error(message),
        }
    }

    // ------------------------------------------------------------------
    // Outbound intents
    // ------------------------------------------------------------------

    /// Request a new session.
    pub fn create_game(&self, config: GameConfig) {
        self.channel.send(ClientEvent::CreateGame {
            player_name: self.session.player_name().to_string(),
            player_count: config.player_count,
            human_count: config.human_count,
            chips_per_player: config.chips_per_player,
            bet_limit: config.bet_limit,
        });
    }

    /// Request to join an existing session by code.
    pub fn join_game(&self, code: &str) {
        self.channel.send(ClientEvent::JoinGame {
            game_id: code.to_string(),
            player_name: self.session.player_name().to_string(),
        });
    }

    /// Ask the server to start the first round. Host-only by convention;
    /// the server enforces it.
    pub fn start_game(&mut self) {
        match self.session.game_id() {
            Some(game_id) => self.channel.send(ClientEvent::StartGame {
                game_id: game_id.to_string(),
            }),
            None => self.add_message("No game to start yet.".to_string(), LogCategory::Error),
        }
    }

    /// Submit an action the server offered.
    ///
    /// Sends only when the held offer is addressed to us AND contains the
    /// token, preserving the guarantee that every submitted action is one
    /// the server declared legal at offer time. The offer is cleared
    /// immediately so controls disappear upon submission; the server's next
    /// events reconcile.
    pub fn submit_action(&mut self, token: ActionToken) -> StateChanged {
        let Some(game_id) = self.session.game_id().map(str::to_string) else {
            self.add_message("Not in a game.".to_string(), LogCategory::Error);
            return StateChanged {
                log: true,
                ..Default::default()
            };
        };
        let offered = self
            .view
            .actionable_offer(&self.session)
            .is_some_and(|offer| offer.actions.contains(&token));
        if !offered {
            self.add_message(
                format!("{} is not available right now.", token.label()),
                LogCategory::Error,
            );
            return StateChanged {
                log: true,
                ..Default::default()
            };
        }
        self.channel.send(ClientEvent::PlayerAction {
            game_id,
            action: token,
        });
        self.view.clear_offer()
    }

    /// The user confirmed the next round.
    pub fn confirm_next_round(&mut self) {
        if let Some(game_id) = self.session.game_id() {
            self.channel.send(ClientEvent::NextRound {
                game_id: game_id.to_string(),
            });
        }
        self.view.clear_pending();
    }

    /// The user declined the next round; the final table stays visible.
    pub fn decline_next_round(&mut self) {
        self.view.clear_pending();
    }

    /// Full reset: session identity destroyed, view cleared, screen back
    /// to the lobby.
    pub fn reset_to_lobby(&mut self) -> StateChanged {
        self.session.clear();
        self.view.reset();
        let screen = self.screen.reset();
        StateChanged {
            screen,
            table: true,
            offer: true,
            ..Default::default()
        }
    }

    /// Convenience for render code.
    pub fn current_screen(&self) -> Screen {
        self.screen.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportReader, TransportWriter};
    use crate::view::PendingDecision;
    use tokio::sync::mpsc;

    // In-memory transport: the test feeds frames in and captures frames
    // out, exercising the same reader/writer tasks as the WebSocket path.

    struct MockReader(mpsc::UnboundedReceiver<String>);

    impl TransportReader for MockReader {
        async fn recv(&mut self) -> Result<Option<String>, TransportError> {
            Ok(self.0.recv().await)
        }
    }

    struct MockWriter(mpsc::UnboundedSender<String>);

    impl TransportWriter for MockWriter {
        async fn send(&mut self, text: &str) -> Result<(), TransportError> {
            self.0
                .send(text.to_string())
                .map_err(|_| TransportError::ConnectionClosed)
        }
    }

    struct MockTransport {
        reader: MockReader,
        writer: MockWriter,
    }

    impl Transport for MockTransport {
        type Reader = MockReader;
        type Writer = MockWriter;

        fn split(self) -> (Self::Reader, Self::Writer) {
            (self.reader, self.writer)
        }
    }

    struct Harness {
        ctrl: ClientController,
        server_tx: mpsc::UnboundedSender<String>,
        sent_rx: mpsc::UnboundedReceiver<String>,
    }

    fn harness(name: &str) -> Harness {
        let (server_tx, frames_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let transport = MockTransport {
            reader: MockReader(frames_rx),
            writer: MockWriter(sent_tx),
        };
        Harness {
            ctrl: ClientController::from_transport(transport, name),
            server_tx,
            sent_rx,
        }
    }

    impl Harness {
        fn push(&self, frame: &str) {
            self.server_tx.send(frame.to_string()).unwrap();
        }

        async fn pump(&mut self) -> StateChanged {
            match self.ctrl.recv().await {
                PollResult::Updated(changed) => changed,
                other => panic!("expected an update, got {other:?}"),
            }
        }

        async fn sent_frame(&mut self) -> String {
            self.sent_rx.recv().await.expect("a frame was sent")
        }
    }

    fn table_json(rounds: u32) -> String {
        format!(
            r#"{{
                "rounds": {rounds}, "table_chips": 0, "highest_bid": 0,
                "cards_on_table": [],
                "players": [
                    {{"name": "Alice", "human": true, "chips": 1000,
                      "chips_added_to_table": 0, "folded": false, "cards": []}},
                    {{"name": "Bob", "human": true, "chips": 1000,
                      "chips_added_to_table": 0, "folded": false, "cards": []}}
                ],
                "current_player": "Alice"
            }}"#
        )
    }

    fn snapshot_frame(event: &str, rounds: u32) -> String {
        format!(r#"{{"event":"{event}","data":{}}}"#, table_json(rounds))
    }

    #[tokio::test]
    async fn game_created_moves_to_waiting_with_code() {
        // Scenario A.
        let mut h = harness("Bob");
        h.push(r#"{"event":"game_created","data":{"game_id":"ABCD","message":"ok"}}"#);

        let changed = h.pump().await;
        assert!(changed.screen);
        assert_eq!(h.ctrl.current_screen(), Screen::Waiting);
        assert_eq!(h.ctrl.session.game_id(), Some("ABCD"));
    }

    #[tokio::test]
    async fn full_lifecycle_routes_each_event() {
        let mut h = harness("Bob");
        h.push(r#"{"event":"connected","data":{"sid":"sid-1"}}"#);
        h.push(
            r#"{"event":"joined_game","data":{"game_id":"ABCD","players_joined":2,"players_needed":2,"message":"joined"}}"#,
        );
        h.push(&snapshot_frame("round_started", 1));

        let changed = h.pump().await;
        assert!(!changed.any()); // connected is diagnostic only
        assert_eq!(h.ctrl.session.connection_id(), Some("sid-1"));

        h.pump().await;
        assert_eq!(h.ctrl.current_screen(), Screen::Waiting);
        assert_eq!(
            h.ctrl.view.waiting,
            Some(WaitingStatus {
                joined: 2,
                needed: 2
            })
        );

        let changed = h.pump().await;
        assert!(changed.screen && changed.table);
        assert_eq!(h.ctrl.current_screen(), Screen::InGame);
        assert_eq!(h.ctrl.view.table.rounds, 1);
        assert!(h.ctrl.view.waiting.is_none());
    }

    #[tokio::test]
    async fn submit_sends_offered_token_and_clears_controls() {
        let mut h = harness("Bob");
        h.push(r#"{"event":"game_created","data":{"game_id":"ABCD","message":"ok"}}"#);
        h.push(
            r#"{"event":"request_action","data":{"player_name":"Bob","available_actions":["FOLD","CALL","RAISE50"]}}"#,
        );
        h.pump().await;
        h.pump().await;
        assert!(h.ctrl.view.actionable_offer(&h.ctrl.session).is_some());

        let changed = h.ctrl.submit_action(ActionToken::Raise(50));
        assert!(changed.offer);
        assert!(h.ctrl.view.offer.is_none());

        let frame = h.sent_frame().await;
        assert_eq!(
            frame,
            r#"{"event":"player_action","data":{"game_id":"ABCD","action":"RAISE50"}}"#
        );
    }

    #[tokio::test]
    async fn submit_rejects_unoffered_token() {
        let mut h = harness("Bob");
        h.push(r#"{"event":"game_created","data":{"game_id":"ABCD","message":"ok"}}"#);
        h.push(
            r#"{"event":"request_action","data":{"player_name":"Bob","available_actions":["FOLD","CALL"]}}"#,
        );
        h.pump().await;
        h.pump().await;

        // The client never synthesizes raise amounts the server did not offer.
        h.ctrl.submit_action(ActionToken::Raise(9999));
        assert!(h.ctrl.view.offer.is_some(), "offer survives a rejected submit");

        // Confirm nothing went out: a subsequent legal submit is the first
        // frame on the wire.
        h.ctrl.submit_action(ActionToken::Call);
        let frame = h.sent_frame().await;
        assert!(frame.contains(r#""action":"CALL""#));
    }

    #[tokio::test]
    async fn malformed_frame_is_skipped_preserving_offer() {
        // Scenario E.
        let mut h = harness("Bob");
        h.push(
            r#"{"event":"request_action","data":{"player_name":"Bob","available_actions":["FOLD"]}}"#,
        );
        // Missing available_actions: skipped at the channel layer.
        h.push(r#"{"event":"request_action","data":{"player_name":"Alice"}}"#);
        h.push(r#"{"event":"error","data":{"message":"sentinel"}}"#);

        h.pump().await;
        let changed = h.pump().await; // sentinel arrives next: bad frame never dispatched
        assert!(changed.log);
        let offer = h.ctrl.view.offer.as_ref().unwrap();
        assert_eq!(offer.actor, "Bob");
    }

    #[tokio::test]
    async fn round_end_confirmation_is_explicit() {
        // Scenario D: next_round goes out only on explicit confirmation.
        let mut h = harness("Bob");
        h.push(r#"{"event":"game_created","data":{"game_id":"ABCD","message":"ok"}}"#);
        h.push(&format!(
            r#"{{"event":"round_ended","data":{{"winner":"Alice","chips_won":120,"game_state":{}}}}}"#,
            table_json(1)
        ));
        h.pump().await;
        let changed = h.pump().await;
        assert!(changed.decision);
        assert!(matches!(
            h.ctrl.view.pending,
            Some(PendingDecision::NextRound { ref winner, chips_won: 120 }) if winner == "Alice"
        ));

        h.ctrl.confirm_next_round();
        assert!(h.ctrl.view.pending.is_none());
        let frame = h.sent_frame().await;
        assert_eq!(
            frame,
            r#"{"event":"next_round","data":{"game_id":"ABCD"}}"#
        );
    }

    #[tokio::test]
    async fn game_over_then_reset_returns_to_lobby() {
        let mut h = harness("Bob");
        h.push(r#"{"event":"game_created","data":{"game_id":"ABCD","message":"ok"}}"#);
        h.push(&snapshot_frame("round_started", 1));
        h.push(r#"{"event":"game_over","data":{"winner":"Alice"}}"#);
        h.pump().await;
        h.pump().await;
        let changed = h.pump().await;
        assert!(changed.decision);
        assert_eq!(h.ctrl.current_screen(), Screen::InGame);

        // The frontend performs the reset after its display delay.
        let changed = h.ctrl.reset_to_lobby();
        assert!(changed.screen);
        assert_eq!(h.ctrl.current_screen(), Screen::Lobby);
        assert!(!h.ctrl.session.is_established());
        assert_eq!(h.ctrl.view.table.rounds, 0);
    }

    #[tokio::test]
    async fn dropped_channel_reports_disconnect() {
        let mut h = harness("Bob");
        drop(h.server_tx);
        // Reader task ends, the incoming channel closes.
        assert!(matches!(h.ctrl.recv().await, PollResult::Disconnected));
        assert!(!h.ctrl.view.connected);
    }
}
