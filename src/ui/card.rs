use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::board::{format_check_in, waiting_for};
use crate::candidate::Candidate;
use crate::routing::available_actions;

/// Lines per card, including the trailing spacer.
pub const CARD_HEIGHT: u16 = 5;

/// Cut `s` to at most `max` terminal columns, ending in `…` when shortened.
/// Wide (CJK) characters count as two columns.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn badge(label: &str, done: bool, color: Color) -> Span<'static> {
    if done {
        Span::styled(
            format!("{label} ✓"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!("{label} ·"),
            Style::default().fg(Color::DarkGray),
        )
    }
}

pub fn card_lines(candidate: &Candidate, selected: bool, width: u16, now_ms: i64) -> Vec<Line<'static>> {
    let width = width as usize;
    let dim = Style::default().fg(Color::Gray);
    let mut name_style = Style::default().add_modifier(Modifier::BOLD);
    if selected {
        name_style = name_style.add_modifier(Modifier::REVERSED);
    }

    let marker = if selected { "▶ " } else { "  " };
    let done = if candidate.is_done() { " ✓" } else { "" };
    let name = truncate_to_width(&candidate.name, width.saturating_sub(2 + done.width()));

    let meta = format!(
        "{} · {}",
        candidate.role,
        format_check_in(candidate.check_in_time)
    );

    let actions = available_actions(candidate)
        .iter()
        .enumerate()
        .map(|(i, a)| format!("[{}] {}", i + 1, a.label()))
        .collect::<Vec<_>>()
        .join(" ");

    vec![
        Line::from(vec![
            Span::raw(marker),
            Span::styled(name, name_style),
            Span::styled(done, Style::default().fg(Color::Green)),
        ]),
        Line::from(Span::styled(
            format!("  {}", truncate_to_width(&meta, width.saturating_sub(2))),
            dim,
        )),
        Line::from(vec![
            Span::raw("  "),
            badge("zh", candidate.has_completed_chinese, Color::Blue),
            Span::raw("  "),
            badge("en", candidate.has_completed_english, Color::Magenta),
            Span::styled(
                format!("  {}", waiting_for(now_ms, candidate.check_in_time)),
                dim,
            ),
        ]),
        Line::from(Span::styled(
            format!("  {}", truncate_to_width(&actions, width.saturating_sub(2))),
            if selected {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        )),
        Line::default(),
    ]
}
