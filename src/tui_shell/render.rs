use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::controller::MappingEntry;
use crate::model::Mode;

use super::app::{App, EntryKind};
use super::modal;

/// Widest source label, in chars, so the arrows line up.
fn source_width(rows: &[MappingEntry]) -> usize {
    rows.iter()
        .map(|r| r.source().chars().count())
        .max()
        .unwrap_or(0)
}

pub(super) fn draw(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(frame, app, chunks[0]);
    draw_file(frame, app, chunks[1]);
    draw_mappings(frame, app, chunks[2]);
    draw_activity(frame, app, chunks[3]);
    draw_prompt(frame, app, chunks[4]);

    if let Some(message) = app.screen.alerts.front() {
        modal::draw_alert(frame, message);
    }
}

fn draw_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let mut spans = vec![
        Span::styled(
            "fluxconv",
            Style::default().fg(Color::Black).bg(Color::White),
        ),
        Span::raw("  "),
    ];
    for mode in Mode::ALL {
        let style = if mode == app.screen.active_mode {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", mode), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(" "));
    spans.push(Span::raw(app.base_url.as_str()));

    let pending = app.ctl.in_flight();
    if pending > 0 {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} pending", pending),
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_file(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let line = match (app.ctl.selected_file(), app.file_path.as_deref()) {
        (Some(file), Some(path)) => Line::from(vec![
            Span::raw(path),
            Span::styled(
                format!("  {} bytes", file.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        (Some(file), None) => Line::from(file.name.as_str()),
        (None, _) => Line::from(Span::styled(
            "(no file; press f to pick one)",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("File")),
        area,
    );
}

fn draw_mappings(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    if !app.screen.mapping_visible {
        let hint = Paragraph::new(Line::from(Span::styled(
            "normal mode: the file is converted as-is (press a for field mapping)",
            Style::default().fg(Color::DarkGray),
        )))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(hint, area);
        return;
    }

    let rows = app.ctl.mappings().rows();
    let width = source_width(rows);
    let items: Vec<ListItem> = rows
        .iter()
        .map(|r| {
            let target = if r.target().is_empty() {
                Span::styled("Target key (optional)", Style::default().fg(Color::DarkGray))
            } else {
                Span::styled(r.target(), Style::default().fg(Color::Green))
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:width$}", r.source(), width = width)),
                Span::styled(" → ", Style::default().fg(Color::Cyan)),
                target,
            ]))
        })
        .collect();

    let title = format!("Field mapping ({})", rows.len());
    let block = Block::default().borders(Borders::ALL).title(title);
    if items.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "(no fields yet; pick a file to analyze it)",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(app.selected_row.min(rows.len() - 1)));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_activity(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = app.screen.log.len().saturating_sub(visible);
    let lines: Vec<Line> = app.screen.log[start..]
        .iter()
        .map(|l| {
            let style = match l.kind {
                EntryKind::Output => Style::default().fg(Color::White),
                EntryKind::Error => Style::default().fg(Color::Red),
            };
            Line::from(vec![
                Span::styled(format!("{} ", l.ts), Style::default().fg(Color::DarkGray)),
                Span::styled(l.text.as_str(), style),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Activity")),
        area,
    );
}

fn draw_prompt(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(prompt) = &app.prompt else {
        let hint = "n normal  a advanced  f file  ↑/↓ row  enter edit  x clear  s convert  q quit";
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::DarkGray),
            )))
            .block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };

    let label = prompt.label();
    let input_line = Line::from(vec![
        Span::styled(label.as_str(), Style::default().fg(Color::Yellow)),
        Span::raw(prompt.input.buf.as_str()),
    ]);
    frame.render_widget(
        Paragraph::new(input_line).block(Block::default().borders(Borders::ALL).title("Edit")),
        area,
    );
    let x = label.chars().count() as u16 + prompt.input.cursor as u16;
    frame.set_cursor_position((area.x + 1 + x, area.y + 1));
}
