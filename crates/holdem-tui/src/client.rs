//! Client orchestrator — wires the controller to the TUI event loop.
//!
//! Owns the only clock in the client: the fixed display delays after round
//! end and game over. The select loop keeps absorbing channel events while
//! a delay runs, so the view is current the moment the decision surfaces.

use std::time::Duration;

use tokio::time::{Instant, sleep, sleep_until};
use tracing::info;

use crate::tui::{Tui, UserIntent};
use holdem_client::controller::{ClientController, GameConfig, PollResult};
use holdem_client::view::PendingDecision;

/// Display delay before the next-round prompt appears.
const ROUND_END_DISPLAY_DELAY: Duration = Duration::from_secs(2);
/// Display delay before the game-over reset back to the lobby.
const GAME_OVER_DISPLAY_DELAY: Duration = Duration::from_secs(3);
/// How long the final frame stays up after a disconnect.
const DISCONNECT_LINGER: Duration = Duration::from_secs(2);
/// Keyboard poll cadence.
const INPUT_TICK: Duration = Duration::from_millis(50);

/// How the user enters a game: host a new one or join by code.
pub enum Entry {
    Create(GameConfig),
    Join(String),
}

/// Connect, send the lobby intent, and run the TUI until quit or
/// disconnect.
pub async fn start_client(
    server_url: &str,
    name: &str,
    entry: Entry,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctrl = ClientController::connect_ws(server_url, name).await?;
    info!(url = %server_url, "connected");

    match &entry {
        Entry::Create(config) => ctrl.create_game(*config),
        Entry::Join(code) => ctrl.join_game(code),
    }

    let mut tui = Tui::setup()?;
    let result = run_event_loop(&mut tui, &mut ctrl).await;
    tui.teardown()?;
    result
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

async fn run_event_loop(
    tui: &mut Tui,
    ctrl: &mut ClientController,
) -> Result<(), Box<dyn std::error::Error>> {
    // When set, the pending decision surfaces at this instant.
    let mut decision_at: Option<Instant> = None;

    loop {
        tui.render(ctrl)?;

        tokio::select! {
            poll = ctrl.recv() => match poll {
                PollResult::Updated(changed) => {
                    if changed.decision {
                        let delay = match ctrl.view.pending {
                            Some(PendingDecision::GameOver { .. }) => GAME_OVER_DISPLAY_DELAY,
                            _ => ROUND_END_DISPLAY_DELAY,
                        };
                        decision_at = Some(Instant::now() + delay);
                        tui.hide_decision();
                    } else if ctrl.view.pending.is_none() {
                        // The server progressed past the decision on its own.
                        decision_at = None;
                        tui.hide_decision();
                    }
                }
                PollResult::Disconnected => {
                    tui.render(ctrl)?;
                    sleep(DISCONNECT_LINGER).await;
                    break;
                }
                PollResult::Empty => {}
            },

            _ = maybe_sleep_until(decision_at) => {
                decision_at = None;
                match &ctrl.view.pending {
                    Some(PendingDecision::NextRound { .. }) => tui.surface_decision(),
                    Some(PendingDecision::GameOver { winner }) => {
                        tui.set_notice(format!("Game over — {winner} wins!"));
                        ctrl.reset_to_lobby();
                    }
                    None => {}
                }
            },

            _ = sleep(INPUT_TICK) => {
                match tui.poll_and_handle_input(ctrl)? {
                    UserIntent::Quit => break,
                    UserIntent::StartGame => ctrl.start_game(),
                    UserIntent::Submit(token) => {
                        ctrl.submit_action(token);
                    }
                    UserIntent::ConfirmNextRound => {
                        ctrl.confirm_next_round();
                        tui.hide_decision();
                    }
                    UserIntent::DeclineNextRound => {
                        ctrl.decline_next_round();
                        tui.hide_decision();
                    }
                    UserIntent::None => {}
                }
            }
        }
    }

    Ok(())
}

/// Sleep until the deadline, or forever when there is none.
async fn maybe_sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
