use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::app::AddForm;

/// Rectangle of `width` x `height` centred in `area`, clipped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn render_add_form(form: &AddForm, roles: &[String], area: Rect, buf: &mut Buffer) {
    let height = roles.len() as u16 + 7;
    let popup = centered_rect(50, height, area);
    Clear.render(popup, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Check in candidate")
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(popup);
    block.render(popup, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // label
            Constraint::Length(1), // input
            Constraint::Length(1), // error
            Constraint::Min(1),    // roles
            Constraint::Length(1), // hints
        ])
        .split(inner);

    Paragraph::new("Name").render(chunks[0], buf);
    Paragraph::new(Line::from(vec![
        Span::styled(
            form.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .render(chunks[1], buf);

    if let Some(error) = &form.error {
        Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::Red)))
            .render(chunks[2], buf);
    }

    let role_lines: Vec<Line> = roles
        .iter()
        .enumerate()
        .map(|(i, role)| {
            if i == form.role_idx {
                Line::from(Span::styled(
                    format!("● {role}"),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("○ {role}"))
            }
        })
        .collect();
    Paragraph::new(role_lines).render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(tab) role / (enter) add / (esc) cancel",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

pub fn render_confirm(question: &str, area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(46, 5, area);
    Clear.render(popup, buf);
    Paragraph::new(vec![
        Line::from(Span::styled(
            question.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "(y)es / any other key cancels",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .render(popup, buf);
}
