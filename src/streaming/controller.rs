//! Playback session controller
//!
//! Owns the ring, the resampler and the volume state behind one mutex shared
//! with the sink's drain callback, and runs the drift correction loop on the
//! producer side after every push.

use super::frequency::{primary_buffer_bytes, select_output_frequency, VideoSystem};
use super::sync::{decide, SyncDecision, SyncSnapshot};
use super::{AudioSink, DeviceSpec, RingBuffer};
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::resampler::{resampler_from_id, Resampler, BYTES_PER_FRAME};
use crate::volume::VolumeControl;
use crate::{ResyncError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Nominal speed factor in percent
pub const NORMAL_SPEED: u32 = 100;

/// Accepted speed factor range in percent
pub const SPEED_RANGE: std::ops::RangeInclusive<u32> = 10..=300;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session, or the session has ended
    #[default]
    Stopped,
    /// Device callbacks are draining the ring
    Running,
    /// Device paused until the producer refills the ring
    PausedForSync,
    /// Device acquisition failed; the session is inert
    Failed,
}

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Samples were queued
    Accepted,
    /// Not enough free room; the samples were dropped
    Overflow,
    /// Session stopped or failed; nothing was done
    Inactive,
}

/// Playback statistics for monitoring overruns and buffer health
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStats {
    /// Device callbacks that found too little data and played silence
    pub underrun_count: usize,
    /// Pushes dropped for lack of ring space
    pub overflow_count: usize,
    /// Bytes accepted into the ring
    pub bytes_pushed: u64,
    /// Device callbacks served
    pub callbacks: usize,
    /// Ring size in bytes
    pub ring_capacity: usize,
    /// Current buffer fill percentage
    pub fill_percentage: f32,
}

/// State shared between the producer and the drain callback
struct Backend {
    ring: RingBuffer,
    mix_buffer: Vec<u8>,
    /// Wrapped input stitched into one run for the resampler
    staging: Vec<u8>,
    resampler: Box<dyn Resampler>,
    volume: VolumeControl,
    input_frequency: u32,
    output_frequency: u32,
    speed_factor: u32,
    last_callback_ms: u64,
    underrun_count: usize,
    callbacks: usize,
    active: bool,
}

impl Backend {
    /// Grow the ring to hold `primary_buffer_size` output samples of input
    fn resize_ring(&mut self, primary_buffer_size: usize) {
        let bytes = primary_buffer_bytes(
            primary_buffer_size,
            self.input_frequency,
            self.output_frequency,
            self.speed_factor,
        );
        if bytes <= self.ring.capacity() {
            return;
        }
        match self.ring.grow(bytes) {
            Ok(()) => debug!(bytes, "primary buffer resized"),
            Err(e) => error!("primary buffer resize failed: {e}"),
        }
    }
}

/// Device-side entry point into a session
///
/// Handed to the sink on open; the sink calls [`DrainHandle::drain`] from its
/// own thread once per period.
#[derive(Clone)]
pub struct DrainHandle {
    backend: Arc<Mutex<Backend>>,
    clock: Arc<dyn Clock>,
}

impl DrainHandle {
    /// Fill `out` with the next period of output audio
    ///
    /// Plays silence and counts an underrun when the ring cannot cover the
    /// whole period; nothing is consumed in that case.
    pub fn drain(&self, out: &mut [u8]) {
        let mut guard = self.backend.lock();
        if !guard.active {
            out.fill(0);
            return;
        }

        guard.last_callback_ms = self.clock.now_ms();
        guard.callbacks += 1;

        let Backend {
            ring,
            mix_buffer,
            staging,
            resampler,
            volume,
            input_frequency,
            output_frequency,
            speed_factor,
            underrun_count,
            ..
        } = &mut *guard;

        // Playing faster than real time is the same as a slower device
        let out_rate = *output_frequency * 100 / (*speed_factor).max(1);
        let in_rate = *input_frequency;
        if out_rate == 0 || in_rate == 0 {
            out.fill(0);
            return;
        }
        let needed = (out.len() as u64 * in_rate as u64 / out_rate as u64) as usize;

        let available = ring.len();
        if available == 0 || available < needed {
            *underrun_count += 1;
            trace!(available, needed, "audio underrun");
            out.fill(0);
            return;
        }

        let (first, second) = ring.readable_segments();
        let src: &[u8] = if first.len() >= needed || second.is_empty() {
            first
        } else {
            // Stitch the wrapped front on, with one frame of lookahead
            let wanted = needed.div_ceil(BYTES_PER_FRAME) * BYTES_PER_FRAME + BYTES_PER_FRAME;
            let take = second.len().min(wanted.saturating_sub(first.len()));
            staging.clear();
            staging.extend_from_slice(first);
            staging.extend_from_slice(&second[..take]);
            &staging[..]
        };

        if mix_buffer.len() < out.len() {
            mix_buffer.resize(out.len(), 0);
        }
        let mix = &mut mix_buffer[..out.len()];
        let consumed = resampler.resample(src, in_rate, mix, out_rate);
        volume.apply(mix, out);
        ring.advance_read(consumed);
    }
}

/// One playback session: ring, resampler, device and drift correction
pub struct PlaybackController {
    backend: Arc<Mutex<Backend>>,
    sink: Box<dyn AudioSink>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    state: PlaybackState,
    device_open: bool,
    /// Ring size in output samples
    primary_buffer_size: usize,
    /// Ring fullness target in output samples
    target: usize,
    /// Device chunk size in output samples
    secondary_buffer_size: usize,
    overflow_count: usize,
    bytes_pushed: u64,
}

impl PlaybackController {
    /// Start a session on `sink` using the wall clock
    ///
    /// # Errors
    ///
    /// Fails on an unknown resampler, invalid configuration, or when the ring
    /// cannot be allocated. A device that cannot be opened does not fail the
    /// call: the session starts in [`PlaybackState::Failed`].
    pub fn start_session(config: SessionConfig, sink: Box<dyn AudioSink>) -> Result<Self> {
        Self::with_clock(config, sink, Arc::new(SystemClock::new()))
    }

    /// Start a session with an explicit time source
    pub fn with_clock(
        config: SessionConfig,
        sink: Box<dyn AudioSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let resampler = resampler_from_id(&config.resampler)?;
        config.validate()?;
        debug!(resampler = resampler.name(), "starting audio session");

        let backend = Backend {
            ring: RingBuffer::new(0)?,
            mix_buffer: Vec::new(),
            staging: Vec::new(),
            resampler,
            volume: VolumeControl::from_config(&config),
            input_frequency: config.default_frequency,
            output_frequency: 0,
            speed_factor: NORMAL_SPEED,
            last_callback_ms: 0,
            underrun_count: 0,
            callbacks: 0,
            active: true,
        };

        let mut controller = PlaybackController {
            backend: Arc::new(Mutex::new(backend)),
            sink,
            clock,
            primary_buffer_size: config.primary_buffer_size,
            target: config.primary_buffer_target,
            secondary_buffer_size: config.secondary_buffer_size,
            config,
            state: PlaybackState::Stopped,
            device_open: false,
            overflow_count: 0,
            bytes_pushed: 0,
        };

        controller.init_audio_device()?;
        Ok(controller)
    }

    /// (Re)open the device for the current input frequency and size the buffers
    ///
    /// Only allocation failures are returned; device failures move the session
    /// to [`PlaybackState::Failed`].
    fn init_audio_device(&mut self) -> Result<()> {
        self.close_device();

        // The device opens paused
        self.state = PlaybackState::PausedForSync;

        self.primary_buffer_size = self.config.primary_buffer_size;
        self.target = self.config.primary_buffer_target;
        self.secondary_buffer_size = self.config.secondary_buffer_size;

        info!("Initializing audio device...");
        debug!("Primary buffer: {} output samples.", self.primary_buffer_size);
        debug!("Primary target fullness: {} output samples.", self.target);
        debug!("Secondary buffer: {} output samples.", self.secondary_buffer_size);

        let input_frequency = self.backend.lock().input_frequency;
        let desired = DeviceSpec::stereo(
            select_output_frequency(input_frequency),
            self.secondary_buffer_size,
        );
        debug!("Requesting frequency: {}Hz.", desired.frequency);

        let drain = self.drain_handle();
        let obtained = match self.sink.open(desired, drain) {
            Ok(spec) if spec.frequency == 0 || spec.samples == 0 => {
                self.sink.close();
                self.enter_failed(ResyncError::DeviceInit(format!(
                    "device granted an unusable format: {spec:?}"
                )));
                return Ok(());
            }
            Ok(spec) => spec,
            Err(e) => {
                self.enter_failed(e);
                return Ok(());
            }
        };
        self.device_open = true;

        if obtained.channels != desired.channels {
            warn!("Obtained {} channels, expected stereo.", obtained.channels);
        }
        if obtained.frequency != desired.frequency {
            warn!("Obtained frequency differs from requested.");
        }

        self.secondary_buffer_size = obtained.samples;
        if self.target < self.secondary_buffer_size {
            self.target = self.secondary_buffer_size;
        }
        if self.primary_buffer_size < self.target {
            self.primary_buffer_size = self.target;
        }
        if self.primary_buffer_size < self.secondary_buffer_size * 2 {
            self.primary_buffer_size = self.secondary_buffer_size * 2;
        }

        let mut backend = self.backend.lock();
        backend.output_frequency = obtained.frequency;
        backend.resize_ring(self.primary_buffer_size);

        let mix_bytes = self.secondary_buffer_size * BYTES_PER_FRAME;
        let extra = mix_bytes.saturating_sub(backend.mix_buffer.len());
        backend
            .mix_buffer
            .try_reserve_exact(extra)
            .map_err(|_| ResyncError::Allocation {
                requested: mix_bytes,
            })?;
        backend.mix_buffer.resize(mix_bytes, 0);

        if backend.last_callback_ms == 0 {
            backend.last_callback_ms = self.clock.now_ms();
        }

        debug!("Frequency: {}", obtained.frequency);
        debug!("Channels: {}", obtained.channels);
        debug!("Samples: {}", obtained.samples);
        Ok(())
    }

    fn enter_failed(&mut self, cause: ResyncError) {
        error!("Couldn't open audio: {cause}");
        self.state = PlaybackState::Failed;
        self.device_open = false;
        self.backend.lock().active = false;
    }

    fn close_device(&mut self) {
        if self.device_open {
            self.sink.set_paused(true);
            self.sink.close();
            self.device_open = false;
        }
    }

    /// Handle through which the device drains this session
    pub fn drain_handle(&self) -> DrainHandle {
        DrainHandle {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
        }
    }

    /// Queue raw interleaved 16-bit stereo bytes, then resynchronize
    ///
    /// Blocks that do not fit in the free space are dropped and counted as
    /// overflow. Accepted blocks may wrap past the end of the ring; the write
    /// cursor advances by the length rounded up to a whole frame.
    pub fn push_samples(&mut self, raw: &[u8]) -> PushOutcome {
        if !self.is_active() {
            return PushOutcome::Inactive;
        }

        let outcome = self.queue(raw);
        match outcome {
            PushOutcome::Accepted => self.bytes_pushed += raw.len() as u64,
            PushOutcome::Overflow => self.overflow_count += 1,
            PushOutcome::Inactive => {}
        }

        self.synchronize();
        outcome
    }

    fn queue(&mut self, raw: &[u8]) -> PushOutcome {
        let advance = raw.len().div_ceil(BYTES_PER_FRAME) * BYTES_PER_FRAME;
        let swap = self.config.swap_channels;

        let mut backend = self.backend.lock();
        let available = backend.ring.free_len();

        // Filling the gap completely would make head meet tail and read as empty
        if advance > 0 && advance >= available {
            warn!(
                size = raw.len(),
                available, "push_samples: audio buffer overflow, dropping samples"
            );
            return PushOutcome::Overflow;
        }

        // Both segments hold whole frames, so no frame straddles the wrap point
        let (first, second) = backend.ring.writable_segments();
        let frames = first
            .chunks_exact_mut(BYTES_PER_FRAME)
            .chain(second.chunks_exact_mut(BYTES_PER_FRAME));
        for (dst, src) in frames.zip(raw.chunks(BYTES_PER_FRAME)) {
            if swap && src.len() == BYTES_PER_FRAME {
                dst[..2].copy_from_slice(&src[2..]);
                dst[2..].copy_from_slice(&src[..2]);
            } else {
                dst[..src.len()].copy_from_slice(src);
                dst[src.len()..].fill(0);
            }
        }

        backend.ring.advance_write(advance);
        PushOutcome::Accepted
    }

    /// Predict the fullness at the next device callback and react to it
    ///
    /// Runs automatically after every push. May sleep the calling thread when
    /// audio sync is enabled and the producer is ahead.
    pub fn synchronize(&mut self) -> Option<SyncDecision> {
        if !self.is_active() || !self.device_open {
            return None;
        }

        let (snapshot, output_frequency) = {
            let backend = self.backend.lock();
            let snapshot = SyncSnapshot {
                readable_bytes: backend.ring.len(),
                input_frequency: backend.input_frequency,
                output_frequency: backend.output_frequency,
                speed_factor: backend.speed_factor,
                secondary_buffer_size: self.secondary_buffer_size,
                last_callback_ms: backend.last_callback_ms,
                now_ms: self.clock.now_ms(),
            };
            (snapshot, backend.output_frequency)
        };

        let expected_level = snapshot.estimate_level_at_next_callback();
        let decision = decide(
            expected_level,
            self.target,
            output_frequency,
            self.secondary_buffer_size,
            self.config.audio_sync,
        );

        match decision {
            SyncDecision::Throttle { wait_ms } => {
                self.resume_playback();
                trace!(expected_level, wait_ms, "producer ahead, delaying");
                self.clock.sleep_ms(wait_ms);
            }
            SyncDecision::PauseForUnderrun => {
                if self.state == PlaybackState::Running {
                    trace!(expected_level, "underrun predicted, pausing playback");
                    self.sink.set_paused(true);
                }
                self.state = PlaybackState::PausedForSync;
            }
            SyncDecision::Run => self.resume_playback(),
        }

        Some(decision)
    }

    fn resume_playback(&mut self) {
        if self.state == PlaybackState::PausedForSync {
            self.sink.set_paused(false);
        }
        self.state = PlaybackState::Running;
    }

    /// Change the emulation speed (10–300%)
    ///
    /// Grows the ring when the new speed needs more room; never shrinks it and
    /// never reopens the device. Returns `false` for out-of-range values.
    pub fn set_speed_factor(&mut self, percent: u32) -> bool {
        if !SPEED_RANGE.contains(&percent) {
            debug!(percent, "speed factor out of range, ignored");
            return false;
        }

        let mut backend = self.backend.lock();
        backend.speed_factor = percent;
        backend.resize_ring(self.primary_buffer_size);
        true
    }

    /// Change the source sample rate
    ///
    /// Reopens the device at the matching output band and grows the ring;
    /// queued samples are kept.
    pub fn set_input_frequency(&mut self, hz: u32) {
        if !self.is_active() {
            return;
        }
        if hz == 0 {
            warn!("ignoring input frequency of 0 Hz");
            return;
        }

        info!(hz, "input frequency changed");
        self.backend.lock().input_frequency = hz;
        if let Err(e) = self.init_audio_device() {
            error!("audio device reinitialization failed: {e}");
        }
    }

    /// Derive the input frequency from the emulated DAC rate register
    pub fn dac_rate_changed(&mut self, system: VideoSystem, dacrate: u32) {
        self.set_input_frequency(system.input_frequency(dacrate));
    }

    /// Set the volume level (clamped to 0–100); unmutes
    pub fn set_gain(&mut self, level: i32) {
        self.backend.lock().volume.set_level(level);
    }

    /// Raise the volume by the configured step
    pub fn volume_up(&mut self) {
        self.backend.lock().volume.volume_up();
    }

    /// Lower the volume by the configured step
    pub fn volume_down(&mut self) {
        self.backend.lock().volume.volume_down();
    }

    /// Toggle mute
    pub fn toggle_mute(&mut self) {
        self.backend.lock().volume.toggle_mute();
    }

    /// Effective volume level (0 while muted)
    pub fn volume_level(&self) -> u32 {
        self.backend.lock().volume.level()
    }

    /// Volume as shown to the user (`"Mute"` or `"80%"`)
    pub fn volume_string(&self) -> String {
        self.backend.lock().volume.display()
    }

    /// Current lifecycle state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    fn is_active(&self) -> bool {
        !matches!(self.state, PlaybackState::Failed | PlaybackState::Stopped)
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Source sample rate
    pub fn input_frequency(&self) -> u32 {
        self.backend.lock().input_frequency
    }

    /// Device sample rate (0 when no device was obtained)
    pub fn output_frequency(&self) -> u32 {
        self.backend.lock().output_frequency
    }

    /// Speed factor in percent
    pub fn speed_factor(&self) -> u32 {
        self.backend.lock().speed_factor
    }

    /// Ring fullness target in output samples
    pub fn target(&self) -> usize {
        self.target
    }

    /// Ring size policy in output samples
    pub fn primary_buffer_size(&self) -> usize {
        self.primary_buffer_size
    }

    /// Device chunk size in output samples
    pub fn secondary_buffer_size(&self) -> usize {
        self.secondary_buffer_size
    }

    /// Ring size in bytes
    pub fn ring_capacity(&self) -> usize {
        self.backend.lock().ring.capacity()
    }

    /// Get current playback statistics
    pub fn stats(&self) -> PlaybackStats {
        let backend = self.backend.lock();
        PlaybackStats {
            underrun_count: backend.underrun_count,
            overflow_count: self.overflow_count,
            bytes_pushed: self.bytes_pushed,
            callbacks: backend.callbacks,
            ring_capacity: backend.ring.capacity(),
            fill_percentage: backend.ring.fill_percentage(),
        }
    }

    /// Stop the device and release every session resource
    pub fn end_session(mut self) -> PlaybackStats {
        let stats = self.stats();
        self.shutdown();
        stats
    }

    fn shutdown(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }

        // Stop callbacks before the storage goes away
        self.close_device();

        let mut backend = self.backend.lock();
        backend.active = false;
        backend.ring.release();
        backend.mix_buffer = Vec::new();
        backend.staging = Vec::new();
        info!(
            underruns = backend.underrun_count,
            overflows = self.overflow_count,
            "audio session ended"
        );
        drop(backend);

        self.state = PlaybackState::Stopped;
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::streaming::ManualSink;

    fn session(config: SessionConfig) -> (PlaybackController, ManualSink, Arc<ManualClock>) {
        let sink = ManualSink::new();
        let clock = Arc::new(ManualClock::new(0));
        let controller =
            PlaybackController::with_clock(config, Box::new(sink.clone()), clock.clone())
                .unwrap();
        (controller, sink, clock)
    }

    #[test]
    fn test_session_starts_paused_with_banded_output() {
        let (controller, sink, _) = session(SessionConfig::default().default_frequency(32_000));

        assert_eq!(controller.state(), PlaybackState::PausedForSync);
        assert_eq!(controller.output_frequency(), 44_100);
        assert_eq!(controller.ring_capacity(), 47_556);
        assert!(sink.is_open());
        assert!(sink.is_paused());
    }

    #[test]
    fn test_obtained_chunk_size_raises_target_and_primary() {
        let sink = ManualSink::granting(DeviceSpec::stereo(48_000, 4096));
        let controller = PlaybackController::with_clock(
            SessionConfig::default()
                .primary_buffer_size(1024)
                .primary_buffer_target(512),
            Box::new(sink),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();

        assert_eq!(controller.output_frequency(), 48_000);
        assert_eq!(controller.secondary_buffer_size(), 4096);
        assert_eq!(controller.target(), 4096);
        assert_eq!(controller.primary_buffer_size(), 8192);
    }

    #[test]
    fn test_unknown_resampler_fails_construction() {
        let result = PlaybackController::start_session(
            SessionConfig::default().resampler("speex-fixed-10"),
            Box::new(ManualSink::new()),
        );
        assert!(matches!(result, Err(ResyncError::UnknownResampler(_))));
    }

    #[test]
    fn test_push_rounds_cursor_to_whole_frames() {
        let (mut controller, _, _) = session(SessionConfig::default().default_frequency(44_100));

        assert_eq!(controller.push_samples(&[1, 2, 3, 4, 5, 6]), PushOutcome::Accepted);

        let backend = controller.backend.lock();
        assert_eq!(backend.ring.head(), 8);
        assert_eq!(backend.ring.readable_view().0, &[1, 2, 3, 4, 5, 6, 0, 0]);
    }

    #[test]
    fn test_swap_channels_swaps_each_frame() {
        let (mut controller, _, _) = session(
            SessionConfig::default()
                .default_frequency(44_100)
                .swap_channels(true),
        );

        controller.push_samples(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let backend = controller.backend.lock();
        assert_eq!(backend.ring.readable_view().0, &[3, 4, 1, 2, 7, 8, 5, 6]);
    }

    #[test]
    fn test_overflow_drops_and_counts() {
        let (mut controller, _, _) = session(
            SessionConfig::default()
                .default_frequency(44_100)
                .primary_buffer_size(2048)
                .primary_buffer_target(1024)
                .secondary_buffer_size(512),
        );
        assert_eq!(controller.ring_capacity(), 8192);

        assert_eq!(controller.push_samples(&vec![0; 8192]), PushOutcome::Overflow);
        assert_eq!(controller.push_samples(&vec![0; 4096]), PushOutcome::Accepted);

        let stats = controller.stats();
        assert_eq!(stats.overflow_count, 1);
        assert_eq!(stats.bytes_pushed, 4096);
    }

    #[test]
    fn test_speed_factor_range() {
        let (mut controller, _, _) = session(SessionConfig::default());
        assert!(!controller.set_speed_factor(9));
        assert!(!controller.set_speed_factor(301));
        assert!(controller.set_speed_factor(10));
        assert!(controller.set_speed_factor(300));
        assert_eq!(controller.speed_factor(), 300);
    }

    #[test]
    fn test_drain_at_double_speed_consumes_twice_as_much() {
        let (mut controller, sink, clock) = session(
            SessionConfig::default()
                .default_frequency(44_100)
                .secondary_buffer_size(256),
        );
        controller.set_gain(100);
        controller.set_speed_factor(200);
        controller.push_samples(&vec![0x11; 4 * 2048]);
        clock.set(1_000);
        controller.synchronize();

        let mut out = vec![0u8; 4 * 256];
        assert!(sink.pull(&mut out));

        // 256 output frames pick every other input frame, up to index 510
        let backend = controller.backend.lock();
        assert_eq!(backend.ring.tail(), 4 * 510);
    }

    #[test]
    fn test_pushes_and_drains_wrap_around_the_ring() {
        let (mut controller, _, _) = session(
            SessionConfig::default()
                .default_frequency(44_100)
                .volume_default(100)
                .primary_buffer_size(2048)
                .primary_buffer_target(1024)
                .secondary_buffer_size(512),
        );
        assert_eq!(controller.ring_capacity(), 8192);
        let first: Vec<u8> = (0..6144).map(|i| (i * 7 % 251) as u8).collect();
        let second: Vec<u8> = (0..4096).map(|i| (i * 13 % 241) as u8 + 1).collect();
        let drain = controller.drain_handle();

        assert_eq!(controller.push_samples(&first), PushOutcome::Accepted);
        let mut out = vec![0u8; 2048];
        drain.drain(&mut out);
        drain.drain(&mut out);

        // Splits across the end of the ring
        assert_eq!(controller.push_samples(&second), PushOutcome::Accepted);
        assert_eq!(controller.backend.lock().ring.head(), 2048);

        let mut out = vec![0u8; 3072];
        drain.drain(&mut out);
        assert_eq!(&out[..2048], &first[4096..]);
        assert_eq!(&out[2048..], &second[..1024]);

        // Only 1024 bytes remain before the end; the rest is read from the front
        drain.drain(&mut out);
        assert_eq!(&out[..], &second[1024..]);

        let stats = controller.stats();
        assert_eq!(stats.underrun_count, 0);
        assert_eq!(stats.overflow_count, 0);
        assert!(controller.backend.lock().ring.is_empty());
    }
}
