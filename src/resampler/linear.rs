//! Linear interpolation resampler
//!
//! Each output frame is interpolated between the two source frames around its
//! position. The fractional position left over at the end of a call is carried
//! into the next one, so consecutive chunks join without a phase jump.

use super::{frame_at, Resampler, BYTES_PER_FRAME};

/// Stateful linear resampler
#[derive(Debug, Clone, Default)]
pub struct LinearResampler {
    /// Fractional source position, in units of 1/dst_freq frames
    phase: u64,
    /// Rate pair the phase was computed for
    rates: (u32, u32),
}

impl LinearResampler {
    /// Create a resampler with zero phase
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the carried phase
    pub fn reset(&mut self) {
        self.phase = 0;
    }
}

#[inline]
fn channels(frame: [u8; BYTES_PER_FRAME]) -> [i32; 2] {
    [
        i16::from_ne_bytes([frame[0], frame[1]]) as i32,
        i16::from_ne_bytes([frame[2], frame[3]]) as i32,
    ]
}

impl Resampler for LinearResampler {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn resample(&mut self, src: &[u8], src_freq: u32, dst: &mut [u8], dst_freq: u32) -> usize {
        let src_frames = src.len() / BYTES_PER_FRAME;
        if src_frames == 0 || src_freq == 0 || dst_freq == 0 {
            dst.fill(0);
            self.reset();
            return 0;
        }
        if self.rates != (src_freq, dst_freq) {
            self.rates = (src_freq, dst_freq);
            self.reset();
        }

        let last = src_frames - 1;
        let step = src_freq as u64;
        let den = dst_freq as u64;
        let mut pos = self.phase;

        for out in dst.chunks_exact_mut(BYTES_PER_FRAME) {
            let index = (pos / den) as usize;
            let frac = (pos % den) as i64;
            let a = channels(frame_at(src, index.min(last)));
            let b = channels(frame_at(src, (index + 1).min(last)));

            for (ch, bytes) in out.chunks_exact_mut(2).enumerate() {
                let value = a[ch] as i64 + (b[ch] - a[ch]) as i64 * frac / den as i64;
                bytes.copy_from_slice(&(value as i16).to_ne_bytes());
            }
            pos += step;
        }

        let advanced = (pos / den) as usize;
        if advanced > src_frames {
            // Ran past the available input; restart the phase on the next chunk
            self.phase = 0;
            return src_frames * BYTES_PER_FRAME;
        }
        self.phase = pos % den;
        advanced * BYTES_PER_FRAME
    }
}
