use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::Algorithm;

fn key_line(keys: &[&'static str], action: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    let mut width = 0;
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" / "));
            width += 3;
        }
        spans.push(Span::styled(*k, Style::default().fg(Color::Magenta)));
        width += k.chars().count();
    }
    spans.push(Span::raw(" ".repeat(14usize.saturating_sub(width))));
    spans.push(Span::raw(action));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        key_line(&["q", "Ctrl-C"], "Quit"),
        key_line(&["Enter", "r"], "Run selected algorithm"),
        key_line(&["s"], "Shuffle"),
        key_line(&["x"], "Stop (sequence is shuffled afterwards)"),
        key_line(&["p"], "Pause"),
        key_line(&["c"], "Resume"),
        key_line(&["n"], "Next step (while paused)"),
        key_line(&["+", "-"], "Faster / slower"),
        key_line(&["←/→", "h/l"], "Choose algorithm"),
        key_line(&["1-8"], "Pick algorithm directly"),
        key_line(&["tab"], "Switch tabs"),
        key_line(&["?"], "Show this help"),
        Line::from(""),
        Line::from("Algorithms:"),
    ];
    for (i, a) in Algorithm::ALL.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{}", i + 1), Style::default().fg(Color::Magenta)),
            Span::raw(format!("  {a}")),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        "Red bars are the slots being compared or moved. Binary search sorts first.",
    ));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
