//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use skimmer_shared::{EnrichedRecord, SUMMARY_FAILED_PLACEHOLDER, SummaryState};

/// Rows taken by one result card, borders included.
pub(crate) const CARD_HEIGHT: u16 = 6;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// Query input box with a trailing cursor.
pub(crate) fn query_input(input: &str) -> Paragraph<'_> {
    Paragraph::new(Line::from(vec![
        Span::raw(input),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .border_style(Style::default().fg(Color::Yellow)),
    )
}

/// One result: URL as the title, summary (or its state) as the body.
pub(crate) fn result_card(index: usize, record: &EnrichedRecord, tick: usize) -> Paragraph<'static> {
    let (body, border) = match record.state {
        SummaryState::Pending => (
            Line::from(Span::styled(
                format!("{} Summarizing…", SPINNER[tick % SPINNER.len()]),
                Style::default().fg(Color::DarkGray),
            )),
            Color::DarkGray,
        ),
        SummaryState::Ready => (
            Line::from(record.summary.clone().unwrap_or_default()),
            Color::Cyan,
        ),
        SummaryState::Failed => (
            Line::from(Span::styled(
                record
                    .summary
                    .clone()
                    .unwrap_or_else(|| SUMMARY_FAILED_PLACEHOLDER.to_string()),
                Style::default().fg(Color::Red),
            )),
            Color::Red,
        ),
    };

    Paragraph::new(body).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {}. {} ", index + 1, record.url()))
            .border_style(Style::default().fg(border)),
    )
}
