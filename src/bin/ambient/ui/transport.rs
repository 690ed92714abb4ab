//! Status line: play state, preset, pattern, tempo, pitch and level.

use ambient_dsp::dsp::gain::{gain_to_db, volume_level_to_gain};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::ViewState;

fn level_label(volume: f32, muted: bool) -> String {
    if muted {
        return "muted".to_string();
    }
    let gain = volume_level_to_gain(volume);
    if gain <= 0.0 {
        "-inf dB".to_string()
    } else {
        format!("{:.0} dB", gain_to_db(gain))
    }
}

pub fn render_transport(frame: &mut Frame, area: Rect, view: &ViewState) {
    let (symbol, state, state_color) = if view.playing {
        ("▶", "Playing", Color::Green)
    } else {
        ("■", "Stopped", Color::Yellow)
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {symbol} {state}  "),
            Style::default().fg(state_color),
        ),
        Span::styled(
            format!("Preset: {}  ", view.preset),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Pattern: {}  ", view.pattern.name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("BPM: {:.0}  ", view.tempo),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Root: {:.0} Hz  ", view.frequency),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Level: {}", level_label(view.volume, view.muted)),
            Style::default().fg(if view.muted { Color::Red } else { Color::Magenta }),
        ),
    ]);

    let block = Block::default().title(" ambient ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}
