//! Beat energy meter.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};

pub fn render_energy(frame: &mut Frame, area: Rect, energy: f32, beats: usize) {
    let energy = energy.clamp(0.0, 1.0);
    // hot once a beat has just landed
    let color = if energy > 0.5 { Color::Magenta } else { Color::Blue };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(format!(" Beat energy · {beats} beats "))
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(color))
        .ratio(energy as f64)
        .label(format!("{:.0}%", energy * 100.0));

    frame.render_widget(gauge, area);
}
