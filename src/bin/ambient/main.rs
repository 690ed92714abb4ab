//! ambient - terminal front-end for the ambient engine
//!
//! Run with: cargo run -- --preset dark --pattern dub

mod app;
mod presets;
mod ui;

use std::fs::File;
use std::path::PathBuf;

use ambient_dsp::PatternKind;
use clap::Parser;
use color_eyre::eyre::WrapErr;

use app::{App, Settings};
use presets::Preset;

#[derive(Parser, Debug)]
#[command(name = "ambient", version, about = "Ambient synthesis and beats in the terminal")]
struct Cli {
    /// Timbre preset to start with
    #[arg(long, value_enum, default_value_t = Preset::Ambient)]
    preset: Preset,

    /// Drum pattern: none, four-on-floor, dub, breakbeat, ambient
    #[arg(long, default_value = "none", value_parser = parse_pattern)]
    pattern: PatternKind,

    /// Drum tempo in BPM (clamped to 60-160)
    #[arg(long, default_value_t = 110.0)]
    tempo: f32,

    /// Input reading 0-100; the chord root is 200 + value × 5 Hz
    #[arg(long, default_value_t = 20.0)]
    value: f32,

    /// Input intensity 0-1; the cutoff modulator runs at intensity × 10 Hz
    #[arg(long, default_value_t = 0.3)]
    intensity: f32,

    /// Input mood 0-100; filter resonance is mood / 10
    #[arg(long, default_value_t = 50.0)]
    mood: f32,

    /// Output level 0-1
    #[arg(long, default_value_t = 0.75)]
    volume: f32,

    /// Start playing immediately
    #[arg(long)]
    autoplay: bool,

    /// Write log output here instead of discarding it (RUST_LOG sets the level)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_pattern(s: &str) -> Result<PatternKind, String> {
    s.parse().map_err(|err| format!("{err}"))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // stderr belongs to the terminal UI, so logs go to a file or nowhere
    if let Some(path) = &cli.log_file {
        let file = File::create(path).wrap_err("failed to create log file")?;
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }

    let settings = Settings {
        preset: cli.preset,
        pattern: cli.pattern,
        tempo: cli.tempo,
        value: cli.value,
        intensity: cli.intensity,
        mood: cli.mood,
        volume: cli.volume,
        autoplay: cli.autoplay,
    };

    let mut app = App::new(settings)?;
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result
}
