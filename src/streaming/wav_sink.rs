//! Real-time WAV recording sink
//!
//! Stands in for a sound card: a worker thread drains one chunk per device
//! period and appends it to a 16-bit stereo WAV file. The file's rate is fixed
//! by the first open, so later opens are granted that rate whatever they ask
//! for.

use super::{AudioSink, DeviceSpec, DrainHandle};
use crate::{ResyncError, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

type Writer = hound::WavWriter<BufWriter<File>>;

struct Worker {
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Sink recording everything the session plays into a WAV file
pub struct WavSink {
    path: PathBuf,
    frequency: Option<u32>,
    writer: Arc<Mutex<Option<Writer>>>,
    samples_written: Arc<AtomicU64>,
    worker: Option<Worker>,
}

impl WavSink {
    /// Record to `path`; the file is created on the first open
    pub fn new(path: impl AsRef<Path>) -> Self {
        WavSink {
            path: path.as_ref().to_path_buf(),
            frequency: None,
            writer: Arc::new(Mutex::new(None)),
            samples_written: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    /// Interleaved 16-bit samples written so far
    pub fn samples_written(&self) -> u64 {
        self.samples_written.load(Ordering::Relaxed)
    }

    /// Stop recording and write the WAV header
    pub fn finalize(&mut self) -> Result<()> {
        self.close();
        if let Some(writer) = self.writer.lock().take() {
            writer
                .finalize()
                .map_err(|e| format!("Failed to finalize WAV file: {e}"))?;
            debug!(path = %self.path.display(), "WAV recording finalized");
        }
        Ok(())
    }

    fn spawn_worker(&self, spec: DeviceSpec, drain: DrainHandle) -> Result<Worker> {
        let paused = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let writer = Arc::clone(&self.writer);
        let written = Arc::clone(&self.samples_written);
        let period = Duration::from_secs_f64(spec.samples as f64 / spec.frequency as f64);

        let thread = {
            let paused = Arc::clone(&paused);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("wav-sink".into())
                .spawn(move || {
                    let mut chunk = vec![0u8; spec.chunk_bytes()];
                    while !stop.load(Ordering::Relaxed) {
                        if !paused.load(Ordering::Relaxed) {
                            drain.drain(&mut chunk);
                            if let Err(e) = write_chunk(&writer, &chunk) {
                                error!("WAV recording stopped: {e}");
                                return;
                            }
                            written.fetch_add(chunk.len() as u64 / 2, Ordering::Relaxed);
                        }
                        thread::sleep(period);
                    }
                })
                .map_err(|e| ResyncError::DeviceInit(format!("Failed to start WAV worker: {e}")))?
        };

        Ok(Worker {
            paused,
            stop,
            thread,
        })
    }
}

fn write_chunk(writer: &Mutex<Option<Writer>>, chunk: &[u8]) -> std::result::Result<(), hound::Error> {
    let mut guard = writer.lock();
    if let Some(writer) = guard.as_mut() {
        for sample in chunk.chunks_exact(2) {
            writer.write_sample(i16::from_ne_bytes([sample[0], sample[1]]))?;
        }
    }
    Ok(())
}

impl AudioSink for WavSink {
    fn open(&mut self, desired: DeviceSpec, drain: DrainHandle) -> Result<DeviceSpec> {
        self.close();

        let frequency = *self.frequency.get_or_insert(desired.frequency);
        let granted = DeviceSpec::stereo(frequency, desired.samples);

        {
            let mut writer = self.writer.lock();
            if writer.is_none() {
                let spec = hound::WavSpec {
                    channels: 2,
                    sample_rate: frequency,
                    bits_per_sample: 16,
                    sample_format: hound::SampleFormat::Int,
                };
                let created = hound::WavWriter::create(&self.path, spec).map_err(|e| {
                    ResyncError::DeviceInit(format!(
                        "Failed to create {}: {e}",
                        self.path.display()
                    ))
                })?;
                *writer = Some(created);
            }
        }

        self.worker = Some(self.spawn_worker(granted, drain)?);
        Ok(granted)
    }

    fn set_paused(&mut self, paused: bool) {
        if let Some(worker) = &self.worker {
            worker.paused.store(paused, Ordering::Relaxed);
        }
    }

    fn close(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Relaxed);
            if worker.thread.join().is_err() {
                error!("WAV worker panicked");
            }
        }
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            error!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::SessionConfig;
    use crate::streaming::{ManualSink, PlaybackController};

    fn drain_handle() -> (PlaybackController, DrainHandle) {
        let controller = PlaybackController::with_clock(
            SessionConfig::default().default_frequency(22_050),
            Box::new(ManualSink::new()),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();
        let handle = controller.drain_handle();
        (controller, handle)
    }

    #[test]
    fn test_rate_fixed_by_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let (_controller, handle) = drain_handle();
        let mut sink = WavSink::new(dir.path().join("out.wav"));

        let first = sink
            .open(DeviceSpec::stereo(22_050, 256), handle.clone())
            .unwrap();
        assert_eq!(first.frequency, 22_050);

        let second = sink.open(DeviceSpec::stereo(44_100, 512), handle).unwrap();
        assert_eq!(second, DeviceSpec::stereo(22_050, 512));
    }

    #[test]
    fn test_paused_sink_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paused.wav");
        let (_controller, handle) = drain_handle();
        let mut sink = WavSink::new(&path);

        sink.open(DeviceSpec::stereo(22_050, 64), handle).unwrap();
        thread::sleep(Duration::from_millis(20));
        sink.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn test_running_sink_records_whole_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("running.wav");
        let (_controller, handle) = drain_handle();
        let mut sink = WavSink::new(&path);

        sink.open(DeviceSpec::stereo(22_050, 64), handle).unwrap();
        sink.set_paused(false);
        thread::sleep(Duration::from_millis(50));
        sink.finalize().unwrap();

        let written = sink.samples_written();
        assert!(written > 0);
        assert_eq!(written % 128, 0);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len() as u64, written);
    }
}
