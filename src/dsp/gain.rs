//! Decibel conversions and click-free gain changes.

/// Quietest gain the volume control produces before it snaps to silence.
pub const MIN_VOLUME_DB: f32 = -60.0;
pub const MAX_VOLUME_DB: f32 = 0.0;

/// Samples a gain change takes to settle (~5 ms at 48 kHz).
const RAMP_SAMPLES: u32 = 240;

#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

/// Map a linear slider position in [0, 1] to an output gain.
///
/// The slider is read on a squared-log scale (`40·log10(level)` dB) so the
/// lower half of its travel stays usable, then clamped to
/// [`MIN_VOLUME_DB`, `MAX_VOLUME_DB`]. Zero is true silence, not -60 dB.
pub fn volume_level_to_gain(level: f32) -> f32 {
    let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
    if level == 0.0 {
        return 0.0;
    }
    let db = (40.0 * level.log10()).clamp(MIN_VOLUME_DB, MAX_VOLUME_DB);
    db_to_gain(db)
}

/// Linear gain with a short ramp toward each new target.
#[derive(Debug, Clone)]
pub struct GainRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl GainRamp {
    pub fn new(gain: f32) -> Self {
        Self {
            current: gain,
            target: gain,
            step: 0.0,
            remaining: 0,
        }
    }

    pub fn set_target(&mut self, gain: f32) {
        if gain == self.target {
            return;
        }
        self.target = gain;
        self.remaining = RAMP_SAMPLES;
        self.step = (self.target - self.current) / RAMP_SAMPLES as f32;
    }

    /// Jump straight to `gain` (used before any audio has been rendered).
    pub fn snap(&mut self, gain: f32) {
        self.current = gain;
        self.target = gain;
        self.remaining = 0;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_level_is_silence() {
        assert_eq!(volume_level_to_gain(0.0), 0.0);
    }

    #[test]
    fn full_level_is_unity() {
        assert!((volume_level_to_gain(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn small_levels_floor_at_minimum_audible_gain() {
        let floor = db_to_gain(MIN_VOLUME_DB);
        assert!((volume_level_to_gain(0.001) - floor).abs() < 1e-7);
        assert!(volume_level_to_gain(0.001) > 0.0);
    }

    #[test]
    fn half_level_is_minus_twelve_db() {
        let db = gain_to_db(volume_level_to_gain(0.5));
        assert!((db + 12.04).abs() < 0.01, "got {db}");
    }

    #[test]
    fn out_of_range_levels_are_clamped() {
        assert_eq!(volume_level_to_gain(2.0), volume_level_to_gain(1.0));
        assert_eq!(volume_level_to_gain(-1.0), 0.0);
        assert_eq!(volume_level_to_gain(f32::NAN), 0.0);
    }

    #[test]
    fn ramp_reaches_target_exactly() {
        let mut ramp = GainRamp::new(0.0);
        ramp.set_target(1.0);
        let mut buffer = vec![1.0f32; RAMP_SAMPLES as usize + 10];
        ramp.process(&mut buffer);

        assert!(buffer[0] > 0.0 && buffer[0] < 0.01);
        assert_eq!(*buffer.last().unwrap(), 1.0);
        assert_eq!(ramp.current(), 1.0);
    }
}
