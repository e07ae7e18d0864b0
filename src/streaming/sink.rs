//! Playback sink contract
//!
//! A sink is the host audio device seen from the controller: it is opened with
//! a desired format and a [`DrainHandle`], answers with the format it actually
//! obtained, and from then on calls [`DrainHandle::drain`] once per period with
//! a buffer of `obtained.samples` frames. Pausing a sink stops those calls.

use super::DrainHandle;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Stream format requested from or granted by a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    /// Sample rate in Hz
    pub frequency: u32,
    /// Chunk size of one callback, in stereo frames
    pub samples: usize,
    /// Channel count (always 2)
    pub channels: u16,
}

impl DeviceSpec {
    /// Interleaved 16-bit stereo at `frequency` with `samples` frames per callback
    pub fn stereo(frequency: u32, samples: usize) -> Self {
        DeviceSpec {
            frequency,
            samples,
            channels: 2,
        }
    }

    /// Callback buffer size in bytes
    pub fn chunk_bytes(&self) -> usize {
        self.samples * self.channels as usize * 2
    }
}

/// Host audio device driving the drain callback
pub trait AudioSink {
    /// Open the device; it starts paused
    ///
    /// The returned spec is authoritative over `desired`.
    fn open(&mut self, desired: DeviceSpec, drain: DrainHandle) -> Result<DeviceSpec>;

    /// Stop (`true`) or resume (`false`) the periodic callback
    fn set_paused(&mut self, paused: bool);

    /// Stop the callback for good and release the device
    fn close(&mut self);
}

#[derive(Default)]
struct ManualSinkState {
    drain: Option<DrainHandle>,
    open: bool,
    paused: bool,
    open_count: usize,
    fail_open: Option<String>,
    granted: Option<DeviceSpec>,
    pause_changes: Vec<bool>,
}

/// Sink whose callback is fired by hand
///
/// Cloning shares the same device, so a test can keep one clone and hand the
/// other to the controller. [`ManualSink::pull`] plays the role of the device
/// callback.
#[derive(Clone, Default)]
pub struct ManualSink {
    state: Arc<Mutex<ManualSinkState>>,
}

impl ManualSink {
    /// Sink that grants whatever is requested
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that grants `spec` regardless of the request
    pub fn granting(spec: DeviceSpec) -> Self {
        let sink = Self::default();
        sink.state.lock().granted = Some(spec);
        sink
    }

    /// Sink whose every `open` fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        let sink = Self::default();
        sink.state.lock().fail_open = Some(reason.into());
        sink
    }

    /// Fire one callback into `out`
    ///
    /// Returns `false` and writes silence when the device is closed or paused.
    pub fn pull(&self, out: &mut [u8]) -> bool {
        let drain = {
            let state = self.state.lock();
            if !state.open || state.paused {
                None
            } else {
                state.drain.clone()
            }
        };

        match drain {
            Some(drain) => {
                drain.drain(out);
                true
            }
            None => {
                out.fill(0);
                false
            }
        }
    }

    /// Whether the callback is currently stopped
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Whether the device is open
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    /// Every pause state change, in order
    pub fn pause_changes(&self) -> Vec<bool> {
        self.state.lock().pause_changes.clone()
    }

    /// Handle captured at the last open, if any
    pub fn drain_handle(&self) -> Option<DrainHandle> {
        self.state.lock().drain.clone()
    }
}

impl AudioSink for ManualSink {
    fn open(&mut self, desired: DeviceSpec, drain: DrainHandle) -> Result<DeviceSpec> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_open {
            return Err(crate::ResyncError::DeviceInit(reason.clone()));
        }

        state.drain = Some(drain);
        state.open = true;
        state.paused = true;
        state.open_count += 1;
        Ok(state.granted.unwrap_or(desired))
    }

    fn set_paused(&mut self, paused: bool) {
        let mut state = self.state.lock();
        if state.paused != paused {
            state.pause_changes.push(paused);
        }
        state.paused = paused;
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.open = false;
        state.paused = true;
        state.drain = None;
    }
}
