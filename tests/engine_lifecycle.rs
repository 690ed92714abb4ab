use std::time::{Duration, Instant};

use ambient_dsp::{
    ConfigPatch, Engine, Lifecycle, OfflineBackend, OscillatorType, SoundParameters, StartupError,
    TimbreConfig,
};

const SR: f32 = 48_000.0;

fn params() -> SoundParameters {
    SoundParameters::new(300.0, 2.0, 5.0)
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

#[test]
fn play_renders_the_chord() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.play(params()).unwrap();

    let out = engine.backend_mut().render_seconds(1.0);
    assert!(peak(&out[SR as usize / 2..]) > 0.01);
    assert!(out.iter().all(|s| s.is_finite()));
    assert!((engine.audio_time() - 1.0).abs() < 1e-6);
}

#[test]
fn failing_backend_leaves_engine_idle() {
    let mut engine = Engine::new(OfflineBackend::failing(StartupError::NoOutputDevice));

    assert_eq!(engine.initialize(), Err(StartupError::NoOutputDevice));
    assert_eq!(engine.play(params()), Err(StartupError::NoOutputDevice));
    assert_eq!(engine.lifecycle(), Lifecycle::Idle);
    assert!(engine.beat_energy_window().is_none());
    assert_eq!(engine.waveform(), vec![0.0; 1024]);
}

#[test]
fn dispose_twice_releases_once() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.play(params()).unwrap();
    engine.backend_mut().render_seconds(0.1);

    let start = Instant::now();
    engine.dispose_at(start);
    engine.dispose_at(start + Duration::from_millis(10));
    engine.tick_at(start + Duration::from_millis(200));
    engine.dispose();

    assert!(engine.is_released());
    assert_eq!(engine.backend().close_count(), 1);
    assert!(engine.beat_energy_window().is_none());
}

#[test]
fn dispose_before_initialize_is_terminal() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.dispose();
    engine.play(params()).unwrap();

    assert!(engine.is_released());
    assert!(!engine.backend().is_running());
}

#[test]
fn config_merges_and_reports_changes() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.play(params()).unwrap();
    let before = engine.timbre();

    let (timbre, drums) = engine.set_config(ConfigPatch::new().reverb_decay(8.0).reverb_wet(0.7));
    assert!(timbre.changed && timbre.decay_changed);
    assert!(!drums.any());
    assert_eq!(
        engine.timbre(),
        TimbreConfig {
            reverb_decay: 8.0,
            reverb_wet: 0.7,
            ..before
        }
    );

    let (timbre, _) = engine.set_config(ConfigPatch::new().reverb_decay(8.0));
    assert!(!timbre.changed);

    // the graph keeps rendering through the reverb swap
    let out = engine.backend_mut().render_seconds(0.5);
    assert!(out.iter().all(|s| s.is_finite()));
}

#[test]
fn out_of_range_config_is_clamped() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.set_config(
        ConfigPatch::new()
            .filter_frequency(1.0e6)
            .tempo(400.0)
            .oscillator_type(OscillatorType::Square),
    );

    assert_eq!(engine.timbre().filter_frequency, 20_000.0);
    assert_eq!(engine.drums().tempo, 160.0);
}

#[test]
fn setting_the_same_volume_twice_changes_nothing() {
    let render = |calls: usize| {
        let mut engine = Engine::new(OfflineBackend::new(SR));
        engine.play(params()).unwrap();
        for _ in 0..calls {
            engine.set_volume(0.4);
        }
        assert_eq!(engine.volume(), Some(0.4));
        engine.backend_mut().render_seconds(0.5)
    };

    assert_eq!(render(1), render(2));
}

#[test]
fn non_finite_volume_is_ignored() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.set_volume(0.6);
    engine.set_volume(f32::NAN);
    assert_eq!(engine.volume(), Some(0.6));
}

#[test]
fn mute_silences_and_unmute_restores() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.play(params()).unwrap();
    engine.backend_mut().render_seconds(0.5);

    engine.mute();
    let muted = engine.backend_mut().render_seconds(0.2);
    assert!(peak(&muted[SR as usize / 10..]) < 1e-6);

    engine.unmute();
    let restored = engine.backend_mut().render_seconds(0.2);
    assert!(peak(&restored[SR as usize / 10..]) > 0.001);
}

#[test]
fn stop_lets_the_release_ring_out() {
    let mut engine = Engine::new(OfflineBackend::new(SR));
    engine.set_config(ConfigPatch::new().release(0.5));
    engine.play(params()).unwrap();
    engine.backend_mut().render_seconds(1.0);

    engine.stop();
    let tail = engine.backend_mut().render_seconds(0.05);
    assert!(peak(&tail) > 0.001);
}

#[test]
fn stereo_output_duplicates_the_mono_signal() {
    let mut engine = Engine::new(OfflineBackend::new(SR).with_channels(2));
    engine.play(params()).unwrap();

    let out = engine.backend_mut().render(4096);
    assert_eq!(out.len(), 8192);
    for frame in out.chunks(2) {
        assert_eq!(frame[0], frame[1]);
    }
}
