//! Block-rate parameter modulation.

/*
Block-Rate Modulation
=====================

The voice bank's companion sine never reaches the speakers. Its only job is to
nudge the chain's filter cutoff:

    cutoff = base_cutoff + average(modulator block) × depth

The filter coefficients are recomputed once per render block rather than per
sample. At 48 kHz with 512-sample blocks that is ~94 updates per second, far
faster than the modulator moves (its attack alone is half a second), so the
steps are inaudible.

Averaging the block rather than sampling its first value means a modulator
that is ramping up within the block contributes its mid-block level, which
keeps successive blocks continuous.

The chain scales the average by the depth and hands base and offset to the
filter through `Modulatable`. The modulated value can land outside a
parameter's legal range; the node that receives it clamps (the filter clamps
cutoff to 20 Hz..20 kHz).
*/

/// Mean of a control signal over one block. An empty block contributes nothing.
#[inline]
pub fn block_average(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

/// Mean absolute amplitude, the loudness measure used by beat detection.
#[inline]
pub fn mean_abs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_average_of_ramp() {
        assert_eq!(block_average(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(block_average(&[]), 0.0);
    }

    #[test]
    fn mean_abs_ignores_sign() {
        assert_eq!(mean_abs(&[1.0, -1.0, 0.5, -0.5]), 0.75);
        assert_eq!(mean_abs(&[]), 0.0);
    }
}
