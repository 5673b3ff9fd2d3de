use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use crate::model::{self, Frame as BarFrame};

const BAR_COLOR: Color = Color::Blue;
const HIGHLIGHT_COLOR: Color = Color::Red;

/// Bar width and gap that fit `count` bars into `inner_width` columns.
pub fn bar_layout(inner_width: u16, count: usize) -> (u16, u16) {
    if count == 0 {
        return (1, 0);
    }
    let slot = (inner_width as usize / count).max(1) as u16;
    if slot >= 3 {
        (slot - 1, 1)
    } else {
        (slot, 0)
    }
}

/// Draw the sequence as vertical bars; the two highlighted slots are red.
pub fn draw_bars(area: Rect, f: &mut Frame, frame: &BarFrame, title: &str) {
    let bars: Vec<Bar> = frame
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let color = if frame.is_highlighted(i) {
                HIGHLIGHT_COLOR
            } else {
                BAR_COLOR
            };
            Bar::default()
                .value(u64::from(*v))
                .text_value(String::new())
                .style(Style::default().fg(color))
        })
        .collect();

    let (bar_width, bar_gap) = bar_layout(area.width.saturating_sub(2), bars.len());
    // Fixed scale so bar heights stay comparable across shuffles.
    let max = frame
        .values
        .iter()
        .copied()
        .max()
        .unwrap_or(0)
        .max(model::MAX_VALUE);

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(bar_gap)
        .max(u64::from(max));

    f.render_widget(chart, area);
}
