//! Ratatui frontend.
//!
//! Pure UI module: terminal lifecycle, rendering, and input → intent
//! mapping. All synchronization state lives in `holdem-client`; this module
//! only reads it. Which screen renders is decided entirely by the screen
//! machine, and action controls are built only from the actionable offer,
//! so stale controls cannot survive a state change.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::io::{self, Stdout};

use holdem_client::controller::ClientController;
use holdem_client::screen::Screen;
use holdem_client::view::{LogCategory, LogEntry, PendingDecision};
use holdem_core::protocol::{ActionToken, Card, Suit};

// ---------------------------------------------------------------------------
// UserIntent — result of processing user input
// ---------------------------------------------------------------------------

/// What the user asked for, translated from a key event.
#[derive(Debug)]
pub enum UserIntent {
    /// Nothing to do.
    None,
    /// Close the application.
    Quit,
    /// Ask the server to start the first round.
    StartGame,
    /// Submit one of the offered action tokens.
    Submit(ActionToken),
    /// Confirm the next round after round end.
    ConfirmNextRound,
    /// Dismiss the next-round prompt.
    DeclineNextRound,
}

// ---------------------------------------------------------------------------
// UI-only state
// ---------------------------------------------------------------------------

struct TuiState {
    /// Index of the highlighted action control.
    selected_action: usize,
    /// True once the event loop's display delay has elapsed and the
    /// pending decision should be shown.
    decision_visible: bool,
    /// One-line notice shown on the lobby screen after a reset.
    notice: Option<String>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            selected_action: 0,
            decision_visible: false,
            notice: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API — Tui struct
// ---------------------------------------------------------------------------

/// Owns the ratatui terminal and the UI-layer state.
///
/// The orchestrator (`crate::client`) drives this: [`Tui::render`] each
/// frame, [`Tui::poll_and_handle_input`] on the input tick, and
/// [`Tui::surface_decision`] when the display delay elapses.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: TuiState,
}

impl Tui {
    /// Set up the terminal (raw mode, alternate screen).
    pub fn setup() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            state: TuiState::default(),
        })
    }

    /// Restore the terminal to its original state.
    pub fn teardown(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Draw the current frame.
    pub fn render(&mut self, ctrl: &ClientController) -> io::Result<()> {
        let count = action_count(ctrl);
        if count == 0 {
            self.state.selected_action = 0;
        } else if self.state.selected_action >= count {
            self.state.selected_action = count - 1;
        }
        self.terminal.draw(|f| ui(f, ctrl, &self.state))?;
        Ok(())
    }

    /// The display delay elapsed; show the pending decision.
    pub fn surface_decision(&mut self) {
        self.state.decision_visible = true;
    }

    /// Hide the decision prompt (resolved, superseded, or rearmed).
    pub fn hide_decision(&mut self) {
        self.state.decision_visible = false;
    }

    /// Set the lobby notice shown after a post-game reset.
    pub fn set_notice(&mut self, text: String) {
        self.state.notice = Some(text);
    }

    /// Poll for a key event and translate it into a [`UserIntent`].
    /// Never blocks — returns [`UserIntent::None`] when nothing is pending.
    pub fn poll_and_handle_input(&mut self, ctrl: &ClientController) -> io::Result<UserIntent> {
        if !event::poll(std::time::Duration::from_millis(0))? {
            return Ok(UserIntent::None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(UserIntent::None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(UserIntent::None);
        }
        Ok(self.handle_key_event(key, ctrl))
    }

    // -- private -----------------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent, ctrl: &ClientController) -> UserIntent {
        if key.code == KeyCode::Esc {
            return UserIntent::Quit;
        }

        // A surfaced next-round prompt captures Y/N first.
        if self.state.decision_visible
            && matches!(ctrl.view.pending, Some(PendingDecision::NextRound { .. }))
        {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return UserIntent::ConfirmNextRound,
                KeyCode::Char('n') | KeyCode::Char('N') => return UserIntent::DeclineNextRound,
                _ => return UserIntent::None,
            }
        }

        match ctrl.current_screen() {
            Screen::Lobby => UserIntent::None,
            Screen::Waiting => match key.code {
                KeyCode::Enter => UserIntent::StartGame,
                _ => UserIntent::None,
            },
            Screen::InGame => self.handle_game_key(key, ctrl),
        }
    }

    fn handle_game_key(&mut self, key: KeyEvent, ctrl: &ClientController) -> UserIntent {
        let count = action_count(ctrl);
        match key.code {
            KeyCode::Left if count > 0 => {
                self.state.selected_action = (self.state.selected_action + count - 1) % count;
                UserIntent::None
            }
            KeyCode::Right if count > 0 => {
                self.state.selected_action = (self.state.selected_action + 1) % count;
                UserIntent::None
            }
            KeyCode::Enter => {
                let token = ctrl
                    .view
                    .actionable_offer(&ctrl.session)
                    .and_then(|offer| offer.actions.get(self.state.selected_action))
                    .copied();
                match token {
                    Some(token) => UserIntent::Submit(token),
                    None => UserIntent::None,
                }
            }
            _ => UserIntent::None,
        }
    }
}

fn action_count(ctrl: &ClientController) -> usize {
    ctrl.view
        .actionable_offer(&ctrl.session)
        .map(|offer| offer.actions.len())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn ui(frame: &mut Frame, ctrl: &ClientController, tui: &TuiState) {
    match ctrl.current_screen() {
        Screen::Lobby => render_lobby(frame, ctrl, tui),
        Screen::Waiting => render_waiting(frame, ctrl),
        Screen::InGame => render_game(frame, ctrl, tui),
    }

    if tui.decision_visible
        && let Some(PendingDecision::NextRound { winner, chips_won }) = &ctrl.view.pending
    {
        render_decision_popup(frame, winner, *chips_won);
    }
}

fn render_lobby(frame: &mut Frame, ctrl: &ClientController, tui: &TuiState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let mut lines = vec![Line::from("")];
    if let Some(notice) = &tui.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow).bold(),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from("Press ESC to exit."));
    } else if ctrl.view.connected {
        lines.push(Line::from("Contacting server..."));
    } else {
        lines.push(Line::from(Span::styled(
            "Disconnected.",
            Style::default().fg(Color::Red),
        )));
    }

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Holdem "));
    frame.render_widget(body, layout[0]);

    render_status_bar(frame, ctrl, layout[1]);
}

fn render_waiting(frame: &mut Frame, ctrl: &ClientController) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let code = ctrl.session.game_id().unwrap_or("----");
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Game code: "),
            Span::styled(code.to_string(), Style::default().fg(Color::Cyan).bold()),
        ]),
    ];
    if let Some(status) = ctrl.view.waiting {
        lines.push(Line::from(format!(
            "{} / {} players ready",
            status.joined, status.needed
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Share the code, then press Enter to start the game.",
        Style::default().fg(Color::Gray),
    )));

    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Waiting for players "));
    frame.render_widget(panel, layout[0]);

    render_log(frame, ctrl, layout[1]);
    render_status_bar(frame, ctrl, layout[2]);
}

fn render_game(frame: &mut Frame, ctrl: &ClientController, tui: &TuiState) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Board + players + log
            Constraint::Length(3), // Controls
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(28), // Players
            Constraint::Min(50),    // Board + log
        ])
        .split(main_layout[0]);

    render_players_panel(frame, ctrl, content_layout[0]);

    let board_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Board
            Constraint::Min(3),    // Log
        ])
        .split(content_layout[1]);

    render_board(frame, ctrl, board_layout[0]);
    render_log(frame, ctrl, board_layout[1]);

    render_controls(frame, ctrl, tui, main_layout[1]);
    render_status_bar(frame, ctrl, main_layout[2]);
}

fn render_players_panel(frame: &mut Frame, ctrl: &ClientController, area: Rect) {
    let table = &ctrl.view.table;

    let items: Vec<ListItem> = table
        .players
        .iter()
        .map(|p| {
            let is_actor = table.current_player.as_deref() == Some(p.name.as_str());
            let is_me = ctrl.session.is_local(&p.name);

            let marker = if is_actor { "→ " } else { "  " };
            let name_style = if is_me {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(p.name.clone(), name_style),
            ];
            if !p.human {
                spans.push(Span::styled(" [bot]", Style::default().fg(Color::DarkGray)));
            }
            spans.push(Span::styled(
                format!(" ${}", p.chips),
                Style::default().fg(Color::Green),
            ));
            if p.chips_added_to_table > 0 {
                spans.push(Span::styled(
                    format!(" +{}", p.chips_added_to_table),
                    Style::default().fg(Color::Yellow),
                ));
            }
            if p.folded {
                spans.push(Span::styled(" FOLDED", Style::default().fg(Color::Red)));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Players "),
    );
    frame.render_widget(list, area);
}

fn render_board(frame: &mut Frame, ctrl: &ClientController, area: Rect) {
    let table = &ctrl.view.table;

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!(" {} ", table.street()),
            Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
        ),
        Span::raw("  "),
        Span::styled("Round: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("#{}", table.rounds),
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled("Pot: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("${}", table.table_chips),
            Style::default().fg(Color::Green).bold(),
        ),
        Span::raw("  "),
        Span::styled("Bid: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("${}", table.highest_bid),
            Style::default().fg(Color::White),
        ),
    ])];

    lines.push(Line::from(""));

    // Five community slots, face-down until revealed.
    let mut community = Vec::new();
    for i in 0..5 {
        match table.cards_on_table.get(i) {
            Some(card) => community.push(card_span(card)),
            None => community.push(Span::styled("[ ? ]", Style::default().fg(Color::DarkGray))),
        }
        community.push(Span::raw(" "));
    }
    lines.push(Line::from(community));

    lines.push(Line::from(""));

    let hand = ctrl.view.local_hand(&ctrl.session);
    let mut hand_spans = vec![Span::styled("Your hand: ", Style::default().fg(Color::Gray))];
    if hand.is_empty() {
        hand_spans.push(Span::styled("--", Style::default().fg(Color::DarkGray)));
    } else {
        for card in hand {
            hand_spans.push(card_span(card));
            hand_spans.push(Span::raw(" "));
        }
    }
    lines.push(Line::from(hand_spans));

    let board = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Table "),
    );
    frame.render_widget(board, area);
}

fn render_log(frame: &mut Frame, ctrl: &ClientController, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let entries = &ctrl.view.entries;
    let skip = entries.len().saturating_sub(visible);

    let items: Vec<ListItem> = entries
        .iter()
        .skip(skip)
        .map(|entry| {
            let color = category_color(entry.category());
            ListItem::new(Line::from(Span::styled(
                entry_text(entry),
                Style::default().fg(color),
            )))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Log "));
    frame.render_widget(list, area);
}

fn render_controls(frame: &mut Frame, ctrl: &ClientController, tui: &TuiState, area: Rect) {
    let line = match ctrl.view.actionable_offer(&ctrl.session) {
        Some(offer) => {
            let mut spans = Vec::new();
            for (i, action) in offer.actions.iter().enumerate() {
                let style = if i == tui.selected_action {
                    Style::default().fg(Color::Black).bg(Color::Yellow).bold()
                } else {
                    Style::default().fg(Color::White)
                };
                spans.push(Span::styled(format!("[ {} ]", action.label()), style));
                spans.push(Span::raw("  "));
            }
            Line::from(spans)
        }
        None => match ctrl.view.waiting_on(&ctrl.session) {
            Some(name) => Line::from(Span::styled(
                format!("Waiting for {name}..."),
                Style::default().fg(Color::Gray),
            )),
            None => Line::from(""),
        },
    };

    let controls = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Actions "));
    frame.render_widget(controls, area);
}

fn render_status_bar(frame: &mut Frame, ctrl: &ClientController, area: Rect) {
    let (status_text, status_color) = if ctrl.view.connected {
        ("● Connected", Color::Green)
    } else {
        ("● Disconnected", Color::Red)
    };

    let mut spans = vec![
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw(" | You: "),
        Span::styled(
            ctrl.session.player_name().to_string(),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if let Some(code) = ctrl.session.game_id() {
        spans.push(Span::raw(" | Game: "));
        spans.push(Span::styled(
            code.to_string(),
            Style::default().fg(Color::Cyan),
        ));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled("ESC", Style::default().fg(Color::Cyan).bold()));
    spans.push(Span::raw(": Quit"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_decision_popup(frame: &mut Frame, winner: &str, chips_won: u32) {
    let area = centered_rect(44, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{winner} won {chips_won} chips!"),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(vec![
            Span::raw("Start next round?  "),
            Span::styled("[Y]es", Style::default().fg(Color::Green).bold()),
            Span::raw("  "),
            Span::styled("[N]o", Style::default().fg(Color::Red).bold()),
        ]),
    ];

    let popup = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Round over "),
        );
    frame.render_widget(popup, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn card_span(card: &Card) -> Span<'static> {
    let color = match card.suit {
        Suit::Hearts | Suit::Diamonds => Color::Red,
        Suit::Spades | Suit::Clubs => Color::White,
    };
    Span::styled(format!("[ {card} ]"), Style::default().fg(color))
}

fn category_color(category: LogCategory) -> Color {
    match category {
        LogCategory::System => Color::Cyan,
        LogCategory::Action => Color::White,
        LogCategory::Winner => Color::Yellow,
        LogCategory::Error => Color::Red,
        LogCategory::Info => Color::Gray,
    }
}

fn entry_text(entry: &LogEntry) -> String {
    match entry {
        LogEntry::SessionEstablished { message } => message.clone(),
        LogEntry::RoundStarted { round } => format!("Round {round} started!"),
        LogEntry::YourTurn { actions } => {
            let labels: Vec<String> = actions.iter().map(|a| a.label()).collect();
            format!("Your turn! Available: {}", labels.join(", "))
        }
        LogEntry::WaitingFor { name } => format!("Waiting for {name}..."),
        LogEntry::ActionTaken {
            player,
            action,
            chips,
        } => match chips {
            Some(chips) => format!("{player} {action} ({chips} chips)"),
            None => format!("{player} {action}"),
        },
        LogEntry::CardsDealt { message } => message.clone(),
        LogEntry::RoundEnded { winner, chips_won } => {
            format!("{winner} won {chips_won} chips!")
        }
        LogEntry::GameOver { winner } => format!("Game over! {winner} wins!"),
        LogEntry::ServerError { message } => format!("Error: {message}"),
        LogEntry::Disconnected => "Disconnected from server.".to_string(),
        LogEntry::Text { text, .. } => text.clone(),
    }
}
