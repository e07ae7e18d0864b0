//! Host audio output using rodio
//!
//! The device pulls interleaved `i16` samples from a [`DrainSource`], which
//! refills one device chunk at a time through the session's [`DrainHandle`].

use super::{AudioSink, DeviceSpec, DrainHandle};
use crate::{ResyncError, Result};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio source that drains the session one chunk at a time
struct DrainSource {
    drain: DrainHandle,
    sample_rate: u32,
    channels: u16,
    finished: Arc<AtomicBool>,
    /// One device chunk of native-endian 16-bit samples
    chunk: Vec<u8>,
    /// Read position in `chunk`, in bytes
    chunk_pos: usize,
}

impl DrainSource {
    fn new(drain: DrainHandle, spec: DeviceSpec, finished: Arc<AtomicBool>) -> Self {
        let chunk_bytes = spec.chunk_bytes();
        DrainSource {
            drain,
            sample_rate: spec.frequency,
            channels: spec.channels,
            finished,
            chunk: vec![0u8; chunk_bytes],
            // Start by draining a new chunk
            chunk_pos: chunk_bytes,
        }
    }
}

impl Source for DrainSource {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = (self.chunk.len() - self.chunk_pos) / 2;
        if remaining > 0 {
            Some(remaining)
        } else {
            Some(self.chunk.len() / 2)
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Iterator for DrainSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.finished.load(Ordering::Relaxed) || self.chunk.len() < 2 {
            return None;
        }

        if self.chunk_pos + 2 > self.chunk.len() {
            self.drain.drain(&mut self.chunk);
            self.chunk_pos = 0;
        }

        let pos = self.chunk_pos;
        let sample = i16::from_ne_bytes([self.chunk[pos], self.chunk[pos + 1]]);
        self.chunk_pos += 2;
        Some(sample)
    }
}

/// Open rodio stream and the sink playing the drain source
struct OpenDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

/// Default system output device
///
/// Rodio converts to the hardware rate itself, so the requested format is
/// always granted.
#[derive(Default)]
pub struct RodioSink {
    device: Option<OpenDevice>,
}

impl RodioSink {
    /// Sink for the default output device; nothing is opened until the
    /// session starts
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an output stream is open
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

impl AudioSink for RodioSink {
    fn open(&mut self, desired: DeviceSpec, drain: DrainHandle) -> Result<DeviceSpec> {
        self.close();

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| ResyncError::DeviceInit(format!("Failed to create audio stream: {e}")))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| ResyncError::DeviceInit(format!("Failed to create audio sink: {e}")))?;

        // Opened paused, like any other sink
        sink.pause();

        let finished = Arc::new(AtomicBool::new(false));
        sink.append(DrainSource::new(drain, desired, Arc::clone(&finished)));

        self.device = Some(OpenDevice {
            _stream: stream,
            sink,
            finished,
        });
        Ok(desired)
    }

    fn set_paused(&mut self, paused: bool) {
        if let Some(device) = &self.device {
            if paused {
                device.sink.pause();
            } else {
                device.sink.play();
            }
        }
    }

    fn close(&mut self) {
        if let Some(device) = self.device.take() {
            device.sink.pause();
            device.finished.store(true, Ordering::Relaxed);
            device.sink.stop();
        }
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        self.close();
    }
}
