//! Drift correction
//!
//! After every push the controller predicts how many output samples will be
//! buffered when the device fires its next callback, and reacts:
//!
//! - more than the target plus a 10ms tolerance: the emulator is ahead, so
//!   make sure playback runs and put the producer to sleep for the excess;
//! - less than one device chunk: an underrun is coming, pause playback until
//!   the emulator catches up;
//! - anything in between: keep playing.

/// Tolerance above the target before the producer gets throttled
pub const TOLERANCE_MS: u64 = 10;

/// Snapshot of everything the estimate depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Contiguous readable bytes in the ring
    pub readable_bytes: usize,
    /// Source sample rate
    pub input_frequency: u32,
    /// Device sample rate
    pub output_frequency: u32,
    /// Speed factor in percent
    pub speed_factor: u32,
    /// Device chunk size in output samples
    pub secondary_buffer_size: usize,
    /// Time of the last device callback
    pub last_callback_ms: u64,
    /// Current time
    pub now_ms: u64,
}

/// What the controller should do after a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// Producer is ahead: run playback and sleep the producer
    Throttle {
        /// Sleep duration in milliseconds
        wait_ms: u64,
    },
    /// Underrun predicted: pause playback
    PauseForUnderrun,
    /// Within tolerance: keep playing
    Run,
}

impl SyncSnapshot {
    /// Expected ring fullness, in output samples, at the next device callback
    pub fn estimate_level_at_next_callback(&self) -> usize {
        let out = self.output_frequency as u64;
        let denominator = self.input_frequency as u64 * self.speed_factor as u64;
        if out == 0 || denominator == 0 {
            return 0;
        }

        let frames = (self.readable_bytes / 4) as u64;
        let mut level = frames * out * 100 / denominator;

        let next_callback_ms =
            self.last_callback_ms + 1000 * self.secondary_buffer_size as u64 / out;
        if self.now_ms < next_callback_ms {
            level += (next_callback_ms - self.now_ms) * out / 1000;
        }

        level as usize
    }
}

/// Pick the reaction for an estimated fullness
pub fn decide(
    expected_level: usize,
    target: usize,
    output_frequency: u32,
    secondary_buffer_size: usize,
    sync_enabled: bool,
) -> SyncDecision {
    let out = output_frequency as u64;
    let tolerance = (out * TOLERANCE_MS / 1000) as usize;

    if sync_enabled && out > 0 && expected_level > target + tolerance {
        let wait_ms = (expected_level - target) as u64 * 1000 / out;
        SyncDecision::Throttle { wait_ms }
    } else if expected_level < secondary_buffer_size {
        SyncDecision::PauseForUnderrun
    } else {
        SyncDecision::Run
    }
}
