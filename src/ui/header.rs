use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::App;
use crate::games::GameKind;

pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.mounted.as_ref().map(|m| m.kind);
    let titles: Vec<Line> = GameKind::all()
        .iter()
        .map(|k| {
            let style = if Some(*k) == active {
                Style::default()
                    .fg(Color::Rgb(255, 220, 80))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(120, 120, 140))
            };
            Line::from(Span::styled(format!(" {} ", k.title()), style))
        })
        .collect();

    let status = if app.high_scores.is_persistent() {
        Span::styled(" 💾 scores saved ", Style::default().fg(Color::Rgb(80, 200, 120)))
    } else {
        Span::styled(" ⚠ high scores not saved ", Style::default().fg(Color::Rgb(255, 140, 60)))
    };

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
                .border_type(BorderType::Rounded)
                .title(" 🕹 RustCade Folio ")
                .title_style(
                    Style::default()
                        .fg(Color::Rgb(200, 120, 255))
                        .add_modifier(Modifier::BOLD),
                )
                .title(Line::from(status).right_aligned()),
        )
        .select(active.map(GameKind::index).unwrap_or(app.selected))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Rgb(255, 220, 80))
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80))));

    frame.render_widget(tabs, area);
}
