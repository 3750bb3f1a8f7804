//! UI rendering module for the national sites browser
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod nearby_list;
pub mod region_prompt;
pub mod site_list;

pub use help_overlay::render as render_help_overlay;
pub use nearby_list::render as render_nearby_list;
pub use region_prompt::render as render_region_prompt;
pub use site_list::render as render_site_list;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppState};

/// Draws the current view, then the help overlay if it is open
pub fn render(frame: &mut Frame, app: &App) {
    match app.state {
        AppState::Loading => render_loading(frame),
        AppState::RegionPrompt => render_region_prompt(frame, app),
        AppState::SiteList => render_site_list(frame, app),
        AppState::NearbyList => render_nearby_list(frame, app),
    }

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_loading(frame: &mut Frame) {
    let block = Block::default()
        .title(" npsites ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "Loading...",
        Style::default().fg(Color::Yellow),
    )))
    .block(block)
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, frame.area());
}

/// Renders the one-line status message, if any
///
/// Queued work takes precedence: the frame drawn before it runs says so.
pub(crate) fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    if app.pending.is_some() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )));
        frame.render_widget(paragraph, area);
    } else if let Some(status) = &app.status {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Red),
        )));
        frame.render_widget(paragraph, area);
    }
}

/// Renders a key hint bar from (key, description) pairs
pub(crate) fn render_key_hints(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, description)| {
            [
                Span::styled(key.to_string(), Style::default().fg(Color::Yellow)),
                Span::raw(format!(" {}  ", description)),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Bold cyan title line used at the top of each view
pub(crate) fn title_line(title: String) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}
