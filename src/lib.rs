//! Audio resynchronization backend for emulators
//!
//! Streams the 16-bit stereo sample feed of an emulated machine into a host
//! audio device running at its own, independently clocked sample rate. The
//! emulator pushes raw frames into a growable ring buffer; the device drains
//! that ring from its real-time callback through a pluggable resampler. After
//! every push a small feedback controller predicts how full the ring will be at
//! the next device callback and either pauses the device (underrun ahead) or
//! puts the producer to sleep (too far ahead), keeping latency bounded.
//!
//! # Features
//! - Growable byte ring that preserves unread audio across resizes
//! - Resampler registry (`trivial`, `linear`) resolved once per session
//! - Drift correction with producer throttling and pause-for-sync
//! - Speed factor (10–300%) and dynamic input frequency changes
//! - Software gain with mute and step-wise volume control
//!
//! # Crate feature flags
//! - `streaming` (opt-in): rodio-backed [`streaming::RodioSink`] and the demo binary
//! - `export-wav` (opt-in): real-time WAV recording sink (`WavSink`)
//!
//! # Quick start
//! ```no_run
//! use resync_audio::streaming::{ManualSink, PlaybackController};
//! use resync_audio::SessionConfig;
//!
//! let sink = ManualSink::new();
//! let mut controller =
//!     PlaybackController::start_session(SessionConfig::default(), Box::new(sink.clone())).unwrap();
//! controller.set_input_frequency(32_000);
//! let frames = vec![0u8; 4 * 512];
//! controller.push_samples(&frames);
//! let mut out = vec![0u8; 4 * 1024];
//! sink.pull(&mut out);
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod resampler;
pub mod streaming;
pub mod volume;

/// Error types for the resync backend
#[derive(thiserror::Error, Debug)]
pub enum ResyncError {
    /// Ring or mix buffer storage could not be reserved
    #[error("Allocation failure: could not reserve {requested} bytes")]
    Allocation {
        /// Number of bytes that were requested
        requested: usize,
    },

    /// Audio device could not be acquired
    #[error("Audio device error: {0}")]
    DeviceInit(String),

    /// Resampler identifier is not in the registry
    #[error("Unknown resampler: {0}")]
    UnknownResampler(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be decoded
    #[error("Config decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ResyncError {
    /// Converts a String into `ResyncError::Other`.
    ///
    /// Prefer the specific variants (`DeviceInit`, `ConfigError`, ...) where the
    /// failure has a known cause.
    fn from(msg: String) -> Self {
        ResyncError::Other(msg)
    }
}

impl From<&str> for ResyncError {
    fn from(msg: &str) -> Self {
        ResyncError::Other(msg.to_string())
    }
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, ResyncError>;

// Public API exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SessionConfig, VolumeBackend};
pub use resampler::{Resampler, ResamplerKind};
pub use streaming::{
    AudioSink, DeviceSpec, DrainHandle, ManualSink, PlaybackController, PlaybackState,
    PlaybackStats, PushOutcome, RingBuffer, VideoSystem,
};
pub use volume::VolumeControl;
