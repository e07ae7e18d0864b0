//! Sample rate conversion
//!
//! All resamplers work on interleaved 16-bit stereo frames (4 bytes each) and
//! share one contract: fill the whole destination, report how many source
//! bytes were consumed. Unconsumed source bytes stay in the ring and are seen
//! again on the next call.
//!
//! Algorithms are looked up by identifier through [`ResamplerKind`], once per
//! session.

pub mod linear;
pub mod trivial;

pub use linear::LinearResampler;
pub use trivial::TrivialResampler;

use crate::{ResyncError, Result};
use std::fmt;

/// Bytes in one 16-bit stereo frame
pub const BYTES_PER_FRAME: usize = 4;

/// Rate converter for 16-bit stereo frames
pub trait Resampler: Send {
    /// Registry identifier of the algorithm
    fn name(&self) -> &'static str;

    /// Convert `src` (at `src_freq`) into exactly `dst.len()` bytes at `dst_freq`
    ///
    /// Returns the number of source bytes consumed, never more than `src.len()`.
    fn resample(&mut self, src: &[u8], src_freq: u32, dst: &mut [u8], dst_freq: u32) -> usize;
}

/// Registered resampling algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResamplerKind {
    /// Nearest-neighbor with Bresenham repeat distribution
    #[default]
    Trivial,
    /// Linear interpolation between neighboring frames
    Linear,
}

impl ResamplerKind {
    /// Every registered algorithm
    pub const ALL: [ResamplerKind; 2] = [ResamplerKind::Trivial, ResamplerKind::Linear];

    /// Look up an algorithm by identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "trivial" => Some(ResamplerKind::Trivial),
            "linear" => Some(ResamplerKind::Linear),
            _ => None,
        }
    }

    /// Identifier used in configuration
    pub fn id(&self) -> &'static str {
        match self {
            ResamplerKind::Trivial => "trivial",
            ResamplerKind::Linear => "linear",
        }
    }

    /// Instantiate the algorithm
    pub fn build(&self) -> Box<dyn Resampler> {
        match self {
            ResamplerKind::Trivial => Box::new(TrivialResampler::new()),
            ResamplerKind::Linear => Box::new(LinearResampler::new()),
        }
    }
}

impl fmt::Display for ResamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Instantiate a resampler from its configuration identifier
pub fn resampler_from_id(id: &str) -> Result<Box<dyn Resampler>> {
    ResamplerKind::from_id(id)
        .map(|kind| kind.build())
        .ok_or_else(|| ResyncError::UnknownResampler(id.to_string()))
}

/// Read frame `index` of `src` as a raw 32-bit word
#[inline]
pub(crate) fn frame_at(src: &[u8], index: usize) -> [u8; BYTES_PER_FRAME] {
    let offset = index * BYTES_PER_FRAME;
    [src[offset], src[offset + 1], src[offset + 2], src[offset + 3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_round_trip() {
        for kind in ResamplerKind::ALL {
            assert_eq!(ResamplerKind::from_id(kind.id()), Some(kind));
            assert_eq!(kind.build().name(), kind.id());
        }
    }

    #[test]
    fn test_identifier_is_case_insensitive() {
        assert_eq!(ResamplerKind::from_id(" Trivial "), Some(ResamplerKind::Trivial));
    }

    #[test]
    fn test_unknown_identifier() {
        let err = resampler_from_id("src-sinc-best-quality").err().unwrap();
        assert!(matches!(err, ResyncError::UnknownResampler(ref id) if id == "src-sinc-best-quality"));
    }
}
