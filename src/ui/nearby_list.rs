//! Nearby places rendering

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
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
            Constraint::Min(3),    // Places
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let site_name = app
        .selected_site()
        .map(|site| site.name.as_str())
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(title_line(format!("Places near {}", site_name))),
        chunks[0],
    );

    let lines: Vec<Line> = if app.nearby.is_empty() {
        vec![Line::from(Span::styled(
            "No places found nearby",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.nearby
            .iter()
            .enumerate()
            .map(|(index, place)| Line::from(format!("[{}] {}", index + 1, place.info())))
            .collect()
    };
    let block = Block::default()
        .title(" Nearby ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), chunks[1]);

    render_status(frame, app, chunks[2]);
    render_key_hints(frame, chunks[3], &[("Esc", "Back"), ("?", "Help"), ("q", "Quit")]);
}

#[cfg(test)]
mod tests {
    use crate::app::tests::create_listed_app;
    use crate::app::AppState;
    use crate::ui::tests::screen_text;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[tokio::test]
    async fn test_nearby_places_listed_with_sentinels() {
        let (mut app, _temp_dir) = create_listed_app().await;
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        app.run_pending().await;
        assert_eq!(app.state, AppState::NearbyList);

        let content = screen_text(&app);

        assert!(content.contains("Places near Isle Royale"));
        assert!(content.contains("[1] Cafe X (no category): no address, Houghton"));
    }

    #[tokio::test]
    async fn test_empty_nearby_list_shows_placeholder() {
        let (mut app, _temp_dir) = create_listed_app().await;
        app.state = AppState::NearbyList;

        let content = screen_text(&app);

        assert!(content.contains("No places found nearby"));
    }
}
