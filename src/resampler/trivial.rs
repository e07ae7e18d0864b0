//! Nearest-neighbor resampler
//!
//! Upsampling repeats source frames, spreading the repeats evenly with an
//! integer Bresenham accumulator. Downsampling picks `floor(i * src / dst)`
//! for every output frame independently.

use super::{frame_at, Resampler, BYTES_PER_FRAME};

/// Stateless nearest-neighbor resampler
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialResampler;

impl TrivialResampler {
    /// Create a new trivial resampler
    pub fn new() -> Self {
        TrivialResampler
    }
}

impl Resampler for TrivialResampler {
    fn name(&self) -> &'static str {
        "trivial"
    }

    fn resample(&mut self, src: &[u8], src_freq: u32, dst: &mut [u8], dst_freq: u32) -> usize {
        let src_frames = src.len() / BYTES_PER_FRAME;
        if src_frames == 0 || src_freq == 0 || dst_freq == 0 {
            dst.fill(0);
            return 0;
        }
        let last = src_frames - 1;
        let mut j: usize = 0;

        if dst_freq >= src_freq {
            let dpos = 2 * src_freq as i64;
            let dneg = dpos - 2 * dst_freq as i64;
            let mut criteria = dpos - dst_freq as i64;

            for out in dst.chunks_exact_mut(BYTES_PER_FRAME) {
                out.copy_from_slice(&frame_at(src, j.min(last)));

                if criteria >= 0 {
                    j += 1;
                    criteria += dneg;
                } else {
                    criteria += dpos;
                }
            }
        } else {
            // Happens when the speed factor pushes the effective input rate above the output rate
            for (i, out) in dst.chunks_exact_mut(BYTES_PER_FRAME).enumerate() {
                j = (i as u64 * src_freq as u64 / dst_freq as u64) as usize;
                out.copy_from_slice(&frame_at(src, j.min(last)));
            }
        }

        j.min(src_frames) * BYTES_PER_FRAME
    }
}
