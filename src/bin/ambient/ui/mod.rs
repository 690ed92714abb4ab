//! Terminal layout: transport on top, scope and spectrum side by side, the
//! beat meter, then the key help.

pub mod energy;
pub mod spectrum;
pub mod transport;
pub mod waveform;

use ambient_dsp::PatternKind;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

const HELP: &str =
    " [Space] Play/Stop  [P] Pattern  [1-4] Preset  [↑↓] Pitch  [ ] Tempo  [+/-] Volume  [M] Mute  [Q] Quit";

/// Everything one frame draws, borrowed from the app for the draw call.
pub struct ViewState<'a> {
    pub preset: &'static str,
    pub pattern: PatternKind,
    pub tempo: f32,
    pub frequency: f32,
    pub volume: f32,
    pub muted: bool,
    pub playing: bool,
    pub energy: f32,
    pub beats: usize,
    pub waveform: &'a [f32],
    pub spectrum: &'a [(f64, f64)],
}

pub fn render(frame: &mut Frame, view: &ViewState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    transport::render_transport(frame, rows[0], view);

    let scopes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    waveform::render_waveform(frame, scopes[0], view.waveform);
    spectrum::render_spectrum(frame, scopes[1], view.spectrum);

    energy::render_energy(frame, rows[2], view.energy, view.beats);

    let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[3]);
}
