//! Core TUI application state and event loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use skimmer_core::{ResultStore, SubmitOutcome};
use skimmer_shared::ResultSet;
use tokio::sync::{mpsc, watch};

use crate::widgets::{CARD_HEIGHT, query_input, result_card, status_bar};

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Submit(String),
    Quit,
}

/// Application state.
pub(crate) struct App {
    /// Query being typed.
    pub input: String,
    /// Latest store snapshot.
    pub results: ResultSet,
    /// Index of the first visible card.
    pub scroll: usize,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Advances once per loop iteration; drives the loading spinner.
    pub tick: usize,
}

impl App {
    pub(crate) fn new() -> Self {
        Self {
            input: String::new(),
            results: ResultSet::default(),
            scroll: 0,
            status: "Type a query and press Enter — F1 for help".to_string(),
            show_help: false,
            tick: 0,
        }
    }

    /// Replace the displayed results, resetting the scroll on a new generation.
    pub(crate) fn update_results(&mut self, results: ResultSet) {
        if results.generation != self.results.generation {
            self.scroll = 0;
        }
        self.results = results;
        self.scroll = self.scroll.min(self.results.len().saturating_sub(1));
    }

    pub(crate) fn apply_outcome(&mut self, outcome: SubmitOutcome) {
        self.status = match outcome {
            SubmitOutcome::Cleared { .. } => "Cleared".to_string(),
            SubmitOutcome::Started { results, .. } => {
                format!("{results} results, summarizing…")
            }
            SubmitOutcome::BackendFailed { error } => {
                format!("Search failed, showing previous results: {error}")
            }
        };
    }

    /// Status line, with live progress while summaries are arriving.
    pub(crate) fn status_line(&self) -> String {
        let pending = self.results.pending();
        if pending == 0 || self.results.is_empty() {
            return self.status.clone();
        }
        let done = self.results.len() - pending;
        format!(
            "\"{}\": {done}/{} summarized",
            self.results.query,
            self.results.len()
        )
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        // Global keybindings (always active)
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Action::Quit;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return Action::None;
            }
            KeyCode::Esc => return Action::Quit,
            KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Action::None;
            }
            _ => {}
        }

        // If help is showing, consume any key to dismiss
        if self.show_help {
            self.show_help = false;
            return Action::None;
        }

        match code {
            KeyCode::Enter => {
                let query = self.input.trim().to_string();
                self.status = if query.is_empty() {
                    "Clearing…".to_string()
                } else {
                    format!("Searching for \"{query}\"…")
                };
                Action::Submit(query)
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                Action::None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Down => {
                if self.scroll + 1 < self.results.len() {
                    self.scroll += 1;
                }
                Action::None
            }
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            _ => Action::None,
        }
    }
}

/// Entry point — sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(
    store: Arc<ResultStore>,
    queries: mpsc::UnboundedSender<String>,
    outcomes: mpsc::UnboundedReceiver<SubmitOutcome>,
) -> Result<()> {
    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, store.subscribe(), queries, outcomes);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut updates: watch::Receiver<ResultSet>,
    queries: mpsc::UnboundedSender<String>,
    mut outcomes: mpsc::UnboundedReceiver<SubmitOutcome>,
) -> Result<()> {
    let mut app = App::new();

    loop {
        if updates.has_changed().unwrap_or(false) {
            let snapshot = updates.borrow_and_update().clone();
            app.update_results(snapshot);
        }
        while let Ok(outcome) = outcomes.try_recv() {
            app.apply_outcome(outcome);
        }

        terminal.draw(|f| draw(f, &app))?;
        app.tick = app.tick.wrapping_add(1);

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.handle_key(key.code, key.modifiers) {
                    Action::None => {}
                    Action::Submit(query) => {
                        if queries.send(query).is_err() {
                            app.status = "Query worker stopped".to_string();
                        }
                    }
                    Action::Quit => break,
                }
            }
        }
    }

    Ok(())
}

pub(crate) fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(1),    // Result cards
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    f.render_widget(query_input(&app.input), chunks[0]);
    draw_results(f, app, chunks[1]);
    f.render_widget(status_bar(&app.status_line()), chunks[2]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    if app.results.is_empty() {
        let hint = if app.results.query.is_empty() {
            "No query yet."
        } else {
            "No results."
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(empty, area);
        return;
    }

    let visible = (area.height / CARD_HEIGHT).max(1) as usize;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible])
        .split(area);

    for (slot, (index, record)) in app
        .results
        .records
        .iter()
        .enumerate()
        .skip(app.scroll)
        .take(visible)
        .enumerate()
    {
        f.render_widget(result_card(index, record, app.tick), rows[slot]);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 50, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  Enter        Search (empty query clears)"),
        Line::from("  Ctrl-U       Clear the input"),
        Line::from("  ↑/↓          Scroll results"),
        Line::from("  F1           Toggle this help"),
        Line::from("  Esc / Ctrl-C Quit"),
        Line::from(""),
        Line::from("Cards show a spinner until their summary arrives."),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help — press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use skimmer_shared::{
        EnrichedRecord, Generation, Record, SUMMARY_FAILED_PLACEHOLDER, SummaryState,
    };

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    fn results(generation: u64, n: usize) -> ResultSet {
        ResultSet {
            generation: Generation(generation),
            query: "cats".into(),
            records: (0..n)
                .map(|i| {
                    EnrichedRecord::pending(Record::new(format!("https://cats.example/{i}"), "body"))
                })
                .collect(),
            search_time_ms: Some(4),
        }
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn enter_submits_trimmed_input() {
        let mut app = App::new();
        type_text(&mut app, "  cats ");
        let action = app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(action, Action::Submit("cats".into()));
        assert!(app.status.contains("cats"));
    }

    #[test]
    fn empty_enter_submits_empty_query() {
        let mut app = App::new();
        let action = app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(action, Action::Submit(String::new()));
    }

    #[test]
    fn editing_keys() {
        let mut app = App::new();
        type_text(&mut app, "dogz");
        app.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.input, "dog");
        app.handle_key(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(app.input.is_empty());
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new();
        assert_eq!(
            app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Action::Quit
        );
        assert_eq!(app.handle_key(KeyCode::Esc, KeyModifiers::NONE), Action::Quit);
    }

    #[test]
    fn help_overlay_swallows_next_key() {
        let mut app = App::new();
        app.handle_key(KeyCode::F(1), KeyModifiers::NONE);
        assert!(app.show_help);
        app.handle_key(KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(!app.show_help);
        assert!(app.input.is_empty());
    }

    #[test]
    fn scroll_is_clamped_and_reset_on_new_generation() {
        let mut app = App::new();
        app.update_results(results(1, 3));
        for _ in 0..10 {
            app.handle_key(KeyCode::Down, KeyModifiers::NONE);
        }
        assert_eq!(app.scroll, 2);

        app.update_results(results(1, 3));
        assert_eq!(app.scroll, 2);

        app.update_results(results(2, 5));
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn status_shows_progress_while_pending() {
        let mut app = App::new();
        let mut set = results(1, 2);
        set.records[0].state = SummaryState::Ready;
        set.records[0].summary = Some("About cats.".into());
        app.update_results(set);
        assert_eq!(app.status_line(), "\"cats\": 1/2 summarized");

        app.results.records[1].state = SummaryState::Failed;
        app.apply_outcome(SubmitOutcome::Started {
            generation: Generation(1),
            results: 2,
        });
        assert_eq!(app.status_line(), "2 results, summarizing…");
    }

    #[test]
    fn backend_failure_is_reported_in_status() {
        let mut app = App::new();
        app.apply_outcome(SubmitOutcome::BackendFailed {
            error: "connection refused".into(),
        });
        assert!(app.status.contains("connection refused"));
    }

    #[test]
    fn cards_render_each_state() {
        let mut app = App::new();
        let mut set = results(1, 3);
        set.records[0].state = SummaryState::Ready;
        set.records[0].summary = Some("Cats are small carnivores.".into());
        set.records[1].state = SummaryState::Failed;
        set.records[1].summary = Some(SUMMARY_FAILED_PLACEHOLDER.into());
        app.update_results(set);

        let screen = render(&app);
        assert!(screen.contains("https://cats.example/0"));
        assert!(screen.contains("Cats are small carnivores."));
        assert!(screen.contains(SUMMARY_FAILED_PLACEHOLDER));
        assert!(screen.contains("Summarizing"));
    }

    #[test]
    fn empty_state_renders_hint() {
        let app = App::new();
        assert!(render(&app).contains("No query yet."));
    }
}
