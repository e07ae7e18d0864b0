//! Sample rate policy
//!
//! Output rate banding, ring sizing, and the input rate derived from the
//! emulated audio DAC.

use crate::resampler::BYTES_PER_FRAME;

/// Pick the device rate for an input rate
pub fn select_output_frequency(input_frequency: u32) -> u32 {
    if input_frequency <= 11_025 {
        11_025
    } else if input_frequency <= 22_050 {
        22_050
    } else {
        44_100
    }
}

/// Ring size in bytes holding `primary_buffer_size` output samples' worth of input
///
/// Rounded up to a whole frame so no frame straddles the wrap point.
pub fn primary_buffer_bytes(
    primary_buffer_size: usize,
    input_frequency: u32,
    output_frequency: u32,
    speed_factor: u32,
) -> usize {
    if output_frequency == 0 {
        return 0;
    }
    let bytes = BYTES_PER_FRAME as u64
        * (primary_buffer_size as u64 * input_frequency as u64 * speed_factor as u64)
        / (output_frequency as u64 * 100);
    let bytes = bytes as usize;
    bytes.div_ceil(BYTES_PER_FRAME) * BYTES_PER_FRAME
}

/// Television standard of the emulated machine, which fixes the DAC clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSystem {
    /// NTSC (48.68 MHz DAC clock)
    Ntsc,
    /// PAL (49.66 MHz DAC clock)
    Pal,
    /// Brazilian PAL-M (48.63 MHz DAC clock)
    Mpal,
}

impl VideoSystem {
    /// DAC clock in Hz
    pub fn dac_clock(&self) -> u32 {
        match self {
            VideoSystem::Ntsc => 48_681_812,
            VideoSystem::Pal => 49_656_530,
            VideoSystem::Mpal => 48_628_316,
        }
    }

    /// Sample rate produced by a DAC rate register value
    pub fn input_frequency(&self, dacrate: u32) -> u32 {
        self.dac_clock() / dacrate.saturating_add(1)
    }
}
