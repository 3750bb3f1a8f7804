//! State prompt rendering
//!
//! Shows a text input for the state name, along with the status line that
//! reports unknown states and load failures.

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
            Constraint::Length(3), // Input
            Constraint::Min(1),    // Filler
            Constraint::Length(1), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(title_line("National Park Sites".to_string())),
        chunks[0],
    );

    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(app.input.clone()),
        Span::styled("_", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .title(" Enter a state name (or 'exit') ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(input, chunks[1]);

    render_status(frame, app, chunks[3]);
    render_key_hints(frame, chunks[4], &[("Enter", "Search"), ("Esc", "Clear / Quit")]);
}

#[cfg(test)]
mod tests {
    use crate::app::tests::create_test_app;
    use crate::app::AppState;
    use crate::ui::tests::screen_text;

    #[tokio::test]
    async fn test_prompt_shows_typed_text_and_status() {
        let (mut app, _temp_dir) = create_test_app(true);
        app.run_pending().await;
        assert_eq!(app.state, AppState::RegionPrompt);
        app.input = "mich".to_string();
        app.status = Some("Enter a proper state name".to_string());

        let content = screen_text(&app);

        assert!(content.contains("> mich"));
        assert!(content.contains("Enter a proper state name"));
        assert!(!content.contains("Loading..."));
    }
}
