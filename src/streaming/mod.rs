//! Audio streaming
//!
//! The producer pushes raw samples into a [`PlaybackController`]; a sink
//! (the host device, a WAV recorder, or a hand-driven test sink) drains them
//! through a [`DrainHandle`] at its own rate.
//!
//! # Architecture
//! ```text
//! emulator ──push_samples──> RingBuffer ──drain──> Resampler ──> Volume ──> AudioSink
//!                │                                                           │
//!                └──────── synchronize (pause / resume / throttle) ──────────┘
//! ```

pub mod controller;
pub mod frequency;
pub mod ring_buffer;
pub mod sink;
pub mod sync;

#[cfg(feature = "streaming")]
pub mod audio_device;

#[cfg(feature = "export-wav")]
pub mod wav_sink;

pub use controller::{
    DrainHandle, PlaybackController, PlaybackState, PlaybackStats, PushOutcome,
};
pub use frequency::VideoSystem;
pub use ring_buffer::RingBuffer;
pub use sink::{AudioSink, DeviceSpec, ManualSink};
pub use sync::SyncDecision;

#[cfg(feature = "streaming")]
pub use audio_device::RodioSink;

#[cfg(feature = "export-wav")]
pub use wav_sink::WavSink;
