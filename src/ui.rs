pub mod card;
pub mod popup;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::{App, Mode};
use crate::backend::StorageBackend;
use crate::candidate::Stage;
use crate::clock::Clock;

use self::card::{card_lines, CARD_HEIGHT};

const HORIZONTAL_MARGIN: u16 = 1;

fn column_color(stage: Stage) -> Color {
    match stage {
        Stage::Waiting => Color::Gray,
        Stage::InChinese => Color::Blue,
        Stage::InEnglish => Color::Magenta,
        Stage::Completed => Color::Green,
    }
}

impl<B: StorageBackend, C: Clock> Widget for &App<B, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Min(3),    // columns
                Constraint::Length(1), // status / legend
            ])
            .split(area);

        Paragraph::new(Line::from(vec![
            Span::styled("Interview Board", bold_style.fg(Color::Cyan)),
            Span::styled(
                format!("  {} candidates", self.board().len()),
                Style::default().fg(Color::Gray),
            ),
        ]))
        .render(chunks[0], buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(chunks[1]);

        for (col, (stage, cards)) in self.board().columns().enumerate() {
            let focused = col == self.selection.column;
            let mut border = Style::default().fg(column_color(stage));
            if focused {
                border = border.add_modifier(Modifier::BOLD);
            }
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!(" {} ({}) ", stage.title(), cards.len()));
            let inner = block.inner(columns[col]);
            block.render(columns[col], buf);

            if cards.is_empty() {
                Paragraph::new(Span::styled(
                    "No candidates",
                    italic_style.fg(Color::DarkGray),
                ))
                .render(inner, buf);
                continue;
            }

            // Keep the selected card in view.
            let visible = (inner.height / CARD_HEIGHT).max(1) as usize;
            let offset = if focused {
                (self.selection.row + 1).saturating_sub(visible)
            } else {
                0
            };

            let lines: Vec<Line> = cards
                .iter()
                .enumerate()
                .skip(offset)
                .take(visible)
                .flat_map(|(row, c)| {
                    let selected = focused && row == self.selection.row;
                    card_lines(c, selected, inner.width, self.now_ms)
                })
                .collect();
            Paragraph::new(lines).render(inner, buf);
        }

        let footer = match &self.status {
            Some(status) => Span::styled(status.clone(), Style::default().fg(Color::Yellow)),
            None => Span::styled(
                "(a)dd / (1-4) action / (d)elete / (R)eset / (q)uit",
                italic_style,
            ),
        };
        Paragraph::new(footer).render(chunks[2], buf);

        match &self.mode {
            Mode::Board => {}
            Mode::Adding(form) => popup::render_add_form(form, &self.roles, area, buf),
            Mode::ConfirmDelete { name, .. } => {
                popup::render_confirm(&format!("Remove {name}?"), area, buf)
            }
            Mode::ConfirmReset => popup::render_confirm("Reset all data?", area, buf),
        }
    }
}
