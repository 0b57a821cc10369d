pub mod header;
pub mod home;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
        ])
        .split(frame.area());

    header::render_header(frame, app, chunks[0]);
    home::render_home(frame, chunks[1], app);

    // Game modal (renders on top of the home screen)
    if let Some(mounted) = app.mounted.as_mut() {
        let area = modal_area(chunks[1]);
        frame.render_widget(Clear, area);
        mounted.game.render(frame, area);
    }
}

/// Centred rectangle covering most of `area`, leaving the home screen visible
/// around it.
pub fn modal_area(area: Rect) -> Rect {
    let w = (area.width * 9 / 10).max(area.width.min(40));
    let h = (area.height * 9 / 10).max(area.height.min(20));
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}
