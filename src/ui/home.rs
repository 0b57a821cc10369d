use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, TILE_COLS};
use crate::games::GameKind;
use crate::scores::HighScores;

const BANNER: &str = r#"
 ╔══════════════════════════════════════════════╗
 ║   R U S T C A D E   ·   F O L I O   ·   8    ║
 ╚══════════════════════════════════════════════╝"#;

/// Tile palette: (text color, border color).
fn tile_colors(kind: GameKind) -> (Color, Color) {
    match kind {
        GameKind::FlappyBird => (Color::Rgb(255, 215, 0), Color::Rgb(140, 120, 20)),
        GameKind::Snake => (Color::Rgb(80, 220, 80), Color::Rgb(40, 120, 40)),
        GameKind::Game2048 => (Color::Rgb(237, 194, 46), Color::Rgb(140, 110, 30)),
        GameKind::TicTacToe => (Color::Rgb(100, 180, 255), Color::Rgb(50, 90, 140)),
        GameKind::MemoryMatch => (Color::Rgb(40, 190, 200), Color::Rgb(20, 100, 110)),
        GameKind::WhackAMole => (Color::Rgb(200, 140, 80), Color::Rgb(110, 70, 40)),
        GameKind::TypingTest => (Color::Rgb(200, 120, 255), Color::Rgb(100, 60, 140)),
        GameKind::MiniPlatformer => (Color::Rgb(255, 120, 80), Color::Rgb(140, 60, 40)),
    }
}

fn render_game_tile(frame: &mut Frame, area: Rect, kind: GameKind, best: u32, selected: bool) {
    let (color, tile_border) = tile_colors(kind);
    let border_color = if selected { Color::Rgb(255, 220, 80) } else { tile_border };
    let border_type = if selected { BorderType::Double } else { BorderType::Rounded };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 { return; }

    let mut lines: Vec<Line> = Vec::new();

    let name_color = if selected { Color::Rgb(255, 255, 255) } else { color };
    lines.push(Line::from(vec![
        Span::styled(format!("[{}] ", kind.index() + 1), Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{} ", kind.icon()), Style::default()),
        Span::styled(kind.title(), Style::default().fg(name_color).add_modifier(Modifier::BOLD)),
    ]));

    for desc_line in kind.description().split('\n') {
        lines.push(Line::from(vec![
            Span::styled(desc_line, Style::default().fg(if selected { Color::Rgb(180, 180, 200) } else { Color::Rgb(120, 120, 140) })),
        ]));
    }

    if kind.score_key().is_some() && best > 0 {
        lines.push(Line::from(Span::styled(format!("🏆 {best}"), Style::default().fg(Color::Rgb(255, 215, 0)))));
    } else if selected {
        lines.push(Line::from(vec![
            Span::styled("▶ Enter to play", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        ]));
    }

    let p = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(p, inner);
}

fn game_controls(kind: GameKind) -> Vec<Line<'static>> {
    let (color, _) = tile_colors(kind);
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {} {}", kind.icon(), kind.title()), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
    ];
    for step in kind.instructions() {
        lines.push(Line::from(vec![
            Span::styled("    • ", Style::default().fg(Color::Rgb(80, 200, 255))),
            Span::styled(*step, Style::default().fg(Color::Rgb(140, 140, 140))),
        ]));
    }
    lines
}

fn key_line(key: &'static str, label: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {key:<17}"), Style::default().fg(Color::Rgb(80, 200, 255))),
        Span::styled(label, Style::default().fg(Color::Rgb(140, 140, 140))),
    ])
}

pub fn render_home(frame: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // Banner
            Constraint::Length(2),  // Subtitle
            Constraint::Length(12), // Game tiles (2 rows)
            Constraint::Min(8),     // Controls area
            Constraint::Length(2),  // Footer
        ])
        .split(area);

    let banner = Paragraph::new(BANNER)
        .style(Style::default().fg(Color::Rgb(80, 200, 255)))
        .alignment(Alignment::Center);
    frame.render_widget(banner, chunks[0]);

    let subtitle = Paragraph::new(Line::from(vec![
        Span::styled(
            "  ⚡ Mini-games from the portfolio, now in your terminal ⚡  ",
            Style::default()
                .fg(Color::Rgb(255, 220, 80))
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(subtitle, chunks[1]);

    let games_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" 🎮 Games: ↑↓←→ Select, Enter to Play ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    let games_inner = games_block.inner(chunks[2]);
    frame.render_widget(games_block, chunks[2]);

    let rows = GameKind::COUNT / TILE_COLS;
    let tile_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(games_inner);

    for (r, row_area) in tile_rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, TILE_COLS as u32); TILE_COLS])
            .split(*row_area);
        for (c, cell) in cols.iter().enumerate() {
            let idx = r * TILE_COLS + c;
            let kind = GameKind::all()[idx];
            let best = app.high_scores.best(kind);
            render_game_tile(frame, *cell, kind, best, app.selected == idx);
        }
    }

    let ctrl_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(60),
        ])
        .split(chunks[3]);

    let controls = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  🔧 Navigation", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        ]),
        key_line("1-8", "Launch game"),
        key_line("↑ ↓ ← →", "Select game"),
        key_line("Enter", "Play selected"),
        key_line("Esc", "Close game"),
        key_line("H", "High scores"),
        key_line("q / Ctrl+C", "Quit"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
            .title(" ⌨ Navigation ")
            .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(controls, ctrl_cols[0]);

    let kind = app.selected_kind();
    let (color, _) = tile_colors(kind);
    let game_ctrl = Paragraph::new(game_controls(kind))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(50, 100, 140)))
                .title(format!(" 🎮 How to play {} ", kind.title()))
                .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
        );
    frame.render_widget(game_ctrl, ctrl_cols[1]);

    let mut footer = vec![
        Span::styled("  🦀 ", Style::default().fg(Color::Rgb(255, 100, 50))),
        Span::styled(concat!("v", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))),
        Span::styled("H", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" High Scores", Style::default().fg(Color::Rgb(100, 100, 130))),
    ];
    if !app.high_scores.is_persistent() {
        footer.push(Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))));
        footer.push(Span::styled("high score not saved", Style::default().fg(Color::Rgb(255, 140, 60))));
    }
    frame.render_widget(Paragraph::new(Line::from(footer)).alignment(Alignment::Center), chunks[4]);

    if app.show_high_scores {
        render_high_scores_overlay(frame, area, &mut app.high_scores);
    }
}

fn render_high_scores_overlay(frame: &mut Frame, area: Rect, high_scores: &mut HighScores) {
    let overlay_w = 44u16.min(area.width.saturating_sub(4));
    let overlay_h = 16u16.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(255, 200, 80)))
        .title(" 🏆 High Scores ")
        .title_style(Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Rgb(15, 15, 25)));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines: Vec<Line> = vec![Line::from("")];
    for kind in GameKind::all().iter().filter(|k| k.score_key().is_some()) {
        let (color, _) = tile_colors(*kind);
        let best = high_scores.best(*kind);
        let value = if best > 0 {
            Span::styled(format!("{best}"), Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD))
        } else {
            Span::styled("No scores yet", Style::default().fg(Color::Rgb(60, 60, 80)))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", kind.icon()), Style::default()),
            Span::styled(format!("{:<16}", kind.title()), Style::default().fg(color).add_modifier(Modifier::BOLD)),
            value,
        ]));
    }

    lines.push(Line::from(""));
    if !high_scores.is_persistent() {
        lines.push(Line::from(Span::styled(
            "  ⚠ Scores are kept for this session only",
            Style::default().fg(Color::Rgb(255, 140, 60)),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("  Press ", Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("H", Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(" to close", Style::default().fg(Color::Rgb(80, 80, 100))),
    ]));

    let p = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(15, 15, 25)));
    frame.render_widget(p, inner);
}
