#[cfg(not(feature = "streaming"))]
fn main() {
    eprintln!(
        "The resync-audio demo requires the \"streaming\" feature. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(feature = "streaming")]
mod cli {
    use std::env;
    use std::f32::consts::TAU;
    use std::time::{Duration, Instant};

    use anyhow::{bail, Context};
    use resync_audio::streaming::{AudioSink, PlaybackController, PlaybackState, RodioSink};
    use resync_audio::{ResamplerKind, SessionConfig};
    use tracing_subscriber::EnvFilter;

    /// Emulated video refresh; one block of samples is pushed per frame
    const FRAME_RATE: u32 = 60;
    const TONE_HZ: f32 = 440.0;

    struct Options {
        config: SessionConfig,
        input_frequency: Option<u32>,
        speed: u32,
        seconds: u32,
        wav_path: Option<String>,
    }

    fn usage() {
        eprintln!(
            "Usage:\n  resync-audio [options]\n\nOptions:\n  --config <file.json>   Load session configuration\n  --frequency <hz>       Input sample rate of the generated tone\n  --speed <percent>      Playback speed factor (10-300)\n  --resampler <id>       Resampler: {}\n  --seconds <n>          Run time (default 5)\n  --sync                 Throttle the producer to the device\n  --swap                 Swap left and right channels\n  --wav <file.wav>       Record to a WAV file instead of the speakers{}\n  -h, --help             Show this help\n\nSet RUST_LOG=debug for device negotiation details.",
            ResamplerKind::ALL
                .iter()
                .map(|k| k.id())
                .collect::<Vec<_>>()
                .join(", "),
            if cfg!(feature = "export-wav") {
                ""
            } else {
                " (needs export-wav)"
            }
        );
    }

    fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> anyhow::Result<T> {
        let value = value.with_context(|| format!("{flag} requires an argument"))?;
        value
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid value for {flag}: {value}"))
    }

    fn parse_args() -> anyhow::Result<Option<Options>> {
        let mut options = Options {
            config: SessionConfig::default(),
            input_frequency: None,
            speed: 100,
            seconds: 5,
            wav_path: None,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => {
                    usage();
                    return Ok(None);
                }
                "--config" => {
                    let path: String = parse_value("--config", args.next())?;
                    options.config = SessionConfig::load(&path)
                        .with_context(|| format!("Failed to load config '{path}'"))?;
                }
                "--frequency" => {
                    options.input_frequency = Some(parse_value("--frequency", args.next())?);
                }
                "--speed" => options.speed = parse_value("--speed", args.next())?,
                "--seconds" => options.seconds = parse_value("--seconds", args.next())?,
                "--resampler" => {
                    let id: String = parse_value("--resampler", args.next())?;
                    options.config = options.config.resampler(id);
                }
                "--sync" => options.config = options.config.audio_sync(true),
                "--swap" => options.config = options.config.swap_channels(true),
                "--wav" => options.wav_path = Some(parse_value("--wav", args.next())?),
                _ => {
                    eprintln!("Unknown flag: {arg}");
                    usage();
                    return Ok(None);
                }
            }
        }

        Ok(Some(options))
    }

    fn open_sink(wav_path: Option<&str>) -> anyhow::Result<Box<dyn AudioSink>> {
        match wav_path {
            #[cfg(feature = "export-wav")]
            Some(path) => Ok(Box::new(resync_audio::streaming::WavSink::new(path))),
            #[cfg(not(feature = "export-wav"))]
            Some(_) => bail!("--wav requires the \"export-wav\" feature"),
            None => Ok(Box::new(RodioSink::new())),
        }
    }

    /// Stereo tone generator: 440 Hz left, a fifth above on the right
    struct Tone {
        phase: f32,
    }

    impl Tone {
        fn fill(&mut self, frequency: u32, frames: usize, out: &mut Vec<u8>) {
            out.clear();
            let step = TAU * TONE_HZ / frequency as f32;
            for _ in 0..frames {
                let left = (self.phase.sin() * 8_000.0) as i16;
                let right = ((self.phase * 1.5).sin() * 8_000.0) as i16;
                out.extend_from_slice(&left.to_ne_bytes());
                out.extend_from_slice(&right.to_ne_bytes());
                self.phase = (self.phase + step) % (2.0 * TAU);
            }
        }
    }

    pub fn run() -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();

        let Some(options) = parse_args()? else {
            return Ok(());
        };

        println!("Audio Resync Backend - Tone Demo");
        println!("================================\n");

        let sink = open_sink(options.wav_path.as_deref())?;
        let mut controller = PlaybackController::start_session(options.config, sink)?;
        if controller.state() == PlaybackState::Failed {
            bail!("no audio device available");
        }

        if let Some(hz) = options.input_frequency {
            controller.set_input_frequency(hz);
        }
        if !controller.set_speed_factor(options.speed) {
            bail!("speed factor {} is outside 10-300", options.speed);
        }

        let input_frequency = controller.input_frequency();
        println!("Session:");
        println!("  Input frequency:  {} Hz", input_frequency);
        println!("  Output frequency: {} Hz", controller.output_frequency());
        println!("  Speed factor:     {}%", controller.speed_factor());
        println!("  Resampler:        {}", controller.config().resampler);
        println!("  Volume:           {}", controller.volume_string());
        println!("  Ring capacity:    {} bytes\n", controller.ring_capacity());

        // Pushed frames per emulated video frame, scaled by speed
        let frames_per_block =
            (input_frequency as u64 * controller.speed_factor() as u64 / 100 / FRAME_RATE as u64)
                as usize;
        let frame_period = Duration::from_secs(1) / FRAME_RATE;
        let total_blocks = options.seconds * FRAME_RATE;

        let mut tone = Tone { phase: 0.0 };
        let mut block = Vec::with_capacity(frames_per_block * 4);
        let start = Instant::now();

        for n in 0..total_blocks {
            tone.fill(input_frequency, frames_per_block, &mut block);
            controller.push_samples(&block);

            if !controller.config().audio_sync {
                // Without sync the producer keeps its own pace
                let due = start + frame_period * (n + 1);
                if let Some(wait) = due.checked_duration_since(Instant::now()) {
                    std::thread::sleep(wait);
                }
            }
        }

        let elapsed = start.elapsed();
        let stats = controller.end_session();

        println!("=== Playback Statistics ===");
        println!("Duration:          {:.2} seconds", elapsed.as_secs_f32());
        println!("Bytes pushed:      {}", stats.bytes_pushed);
        println!("Device callbacks:  {}", stats.callbacks);
        println!("Underruns:         {}", stats.underrun_count);
        println!("Overflows:         {}", stats.overflow_count);
        println!("Ring capacity:     {} bytes", stats.ring_capacity);
        println!("\nDone!");

        Ok(())
    }
}

#[cfg(feature = "streaming")]
fn main() -> anyhow::Result<()> {
    cli::run()
}
