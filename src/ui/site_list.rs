//! Site list rendering
//!
//! Renders the numbered sites of the chosen state, one `Site::info` line each.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{render_key_hints, render_status, title_line};
use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Min(3),    // Site list
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let region = app.region_name.as_deref().unwrap_or_default();
    frame.render_widget(
        Paragraph::new(title_line(format!("National Sites in {}", title_case(region)))),
        chunks[0],
    );

    render_list(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_key_hints(
        frame,
        chunks[3],
        &[
            ("↑/↓", "Navigate"),
            ("Enter", "Nearby places"),
            ("Esc", "Back"),
            ("?", "Help"),
            ("q", "Quit"),
        ],
    );
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    // Keep the selection in view once the list outgrows the area.
    let visible = area.height.saturating_sub(2) as usize;
    let offset = if visible > 0 && app.selected_index >= visible {
        app.selected_index + 1 - visible
    } else {
        0
    };

    let lines: Vec<Line> = if app.sites.is_empty() {
        vec![Line::from(Span::styled(
            "No sites listed for this state",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.sites
            .iter()
            .enumerate()
            .skip(offset)
            .map(|(index, site)| {
                let is_selected = index == app.selected_index;
                let cursor = if is_selected { "\u{25B8} " } else { "  " }; // ▸
                let style = if is_selected {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(vec![
                    Span::styled(cursor, Style::default().fg(Color::Cyan)),
                    Span::styled(format!("[{}] {}", index + 1, site.info()), style),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .title(format!(" {} sites ", app.site_count()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// "new york" -> "New York"
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
