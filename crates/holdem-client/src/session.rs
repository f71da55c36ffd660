//! Locally-known identity for one client tab.
//!
//! [`Session`] is the single owned context object holding who we are and
//! which game we are in. It is mutated only by channel acknowledgments and
//! the full-reset path — no ambient globals. [`Session::is_local`] is the
//! one identity-comparison site every "is it my turn" decision routes
//! through.

use tracing::warn;

/// Identity and session state for the local player.
#[derive(Debug, Clone)]
pub struct Session {
    player_name: String,
    game_id: Option<String>,
    connection_id: Option<String>,
}

impl Session {
    pub fn new(player_name: &str) -> Self {
        Self {
            player_name: player_name.to_string(),
            game_id: None,
            connection_id: None,
        }
    }

    /// The local player's display name.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// The current game code, once a create/join has been acknowledged.
    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    /// Whether a create/join acknowledgment has been received.
    pub fn is_established(&self) -> bool {
        self.game_id.is_some()
    }

    /// Record the game id from a create/join acknowledgment.
    ///
    /// Join acknowledgments are broadcast as each player arrives, so
    /// repeating the same id is normal. A different id while established
    /// means the server and client disagree; the server wins.
    pub fn establish(&mut self, game_id: String) {
        if let Some(current) = &self.game_id
            && *current != game_id
        {
            warn!(current = %current, new = %game_id, "session re-established with a different game id");
        }
        self.game_id = Some(game_id);
    }

    /// Drop the session identity (game over or disconnect → full reset).
    pub fn clear(&mut self) {
        self.game_id = None;
    }

    /// Diagnostic connection identifier from the `connected` event. Carries
    /// no game semantics.
    pub fn set_connection_id(&mut self, sid: String) {
        self.connection_id = Some(sid);
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Gating check: is the named player the local player?
    ///
    /// All action-control visibility decisions go through here so there is
    /// exactly one copy of the comparison.
    pub fn is_local(&self, name: &str) -> bool {
        self.player_name == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gating_compares_names() {
        let session = Session::new("Bob");
        assert!(session.is_local("Bob"));
        assert!(!session.is_local("Alice"));
        assert!(!session.is_local("bob"));
    }

    #[test]
    fn establish_and_clear_lifecycle() {
        let mut session = Session::new("Bob");
        assert!(!session.is_established());

        session.establish("ABCD".to_string());
        assert!(session.is_established());
        assert_eq!(session.game_id(), Some("ABCD"));

        // Repeated join broadcasts carry the same id.
        session.establish("ABCD".to_string());
        assert_eq!(session.game_id(), Some("ABCD"));

        session.clear();
        assert!(!session.is_established());
        assert_eq!(session.game_id(), None);
    }

    #[test]
    fn connection_id_is_independent_of_session() {
        let mut session = Session::new("Bob");
        session.set_connection_id("sid-1".to_string());
        session.establish("ABCD".to_string());
        session.clear();
        // The diagnostic id survives a session reset; it belongs to the
        // connection, not the game.
        assert_eq!(session.connection_id(), Some("sid-1"));
    }
}
