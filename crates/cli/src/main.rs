use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::Parser;

use mjpeg_pump_core::pipeline::frame_sink::FrameSink;
use mjpeg_pump_core::pipeline::player::Player;
use mjpeg_pump_core::shared::frame::Frame;
use mjpeg_pump_core::shared::pixel_format::PixelFormat;
use mjpeg_pump_core::shared::pump_config::PumpConfig;
use mjpeg_pump_core::source::domain::source_descriptor::{ContainerKind, SourceDescriptor};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Play an MJPEG stream from a file, an AVI container or an HTTP endpoint.
#[derive(Parser)]
#[command(name = "mjpeg-pump")]
struct Cli {
    /// File path or http(s) URL. Falls back to `source` in the config file.
    source: Option<String>,

    /// Container format: avi or mjpeg (detected when omitted).
    #[arg(long)]
    format: Option<String>,

    /// JSON config file (default: the per-user config, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Largest compressed frame in bytes.
    #[arg(long)]
    buffer_size: Option<usize>,

    /// HTTP request timeout in milliseconds.
    #[arg(long)]
    http_timeout_ms: Option<u64>,

    /// Connection attempts per HTTP fetch.
    #[arg(long)]
    max_reconnects: Option<u32>,

    /// Restart raw MJPEG files when they end.
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Stop after this many seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Pixel format for dumped frames: passthrough, rgb888 or grayscale.
    #[arg(long, default_value = "rgb888")]
    pixel_format: String,

    /// Write decoded frames to this directory.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Dump every Nth frame.
    #[arg(long, default_value = "1")]
    dump_every: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    config.dump();

    let source = cli
        .source
        .clone()
        .or_else(|| config.source.clone())
        .ok_or("No source given and none configured")?;
    let descriptor = SourceDescriptor::parse(&source);
    let hint = cli.format.as_deref().and_then(ContainerKind::from_name);
    let pixel_format = PixelFormat::from_name(&cli.pixel_format)?;

    let mut player = Player::new(config);
    match &cli.dump_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let dumper = FrameDumper::new(dir.clone(), cli.dump_every, pixel_format);
            player.play(descriptor, hint, dumper)?;
        }
        None => player.play(descriptor, hint, |_: &Frame<'_>| {})?,
    }

    let deadline = cli.duration.map(|s| Instant::now() + Duration::from_secs_f64(s));
    loop {
        if let Some(finished) = player.poll() {
            println!("{}", finished.stats);
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            let stats = player.stats();
            player.stop();
            if let Some(stats) = stats {
                println!("{stats}");
            }
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(format) = &cli.format {
        if ContainerKind::from_name(format).is_none() {
            return Err(format!("Format must be 'avi' or 'mjpeg', got '{format}'").into());
        }
    }
    PixelFormat::from_name(&cli.pixel_format)?;
    if cli.dump_every == 0 {
        return Err("--dump-every must be at least 1".into());
    }
    if let Some(duration) = cli.duration {
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(format!("Duration must be a positive number of seconds, got {duration}").into());
        }
    }
    if let Some(SourceDescriptor::Path(path)) = cli.source.as_deref().map(SourceDescriptor::parse) {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

/// Config file (explicit or per-user) with command-line overrides on top.
fn build_config(cli: &Cli) -> Result<PumpConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PumpConfig::load(path)?,
        None => PumpConfig::load_or_default()?,
    };
    if let Some(fps) = cli.fps {
        config.target_fps = fps;
    }
    if let Some(size) = cli.buffer_size {
        config.scratch_capacity = size;
    }
    if let Some(ms) = cli.http_timeout_ms {
        config.http_timeout_ms = ms;
    }
    if let Some(attempts) = cli.max_reconnects {
        config.max_reconnect_attempts = attempts;
    }
    if cli.loop_playback {
        config.loop_playback = true;
    }
    config.validate()?;
    Ok(config)
}

/// Writes every Nth frame as PNG (or raw RGB565 for passthrough).
struct FrameDumper {
    dir: PathBuf,
    every: u64,
    format: PixelFormat,
}

impl FrameDumper {
    fn new(dir: PathBuf, every: u64, format: PixelFormat) -> Self {
        Self {
            dir,
            every: every.max(1),
            format,
        }
    }

    fn write(&self, frame: &Frame<'_>) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let (width, height) = (frame.width(), frame.height());
        let bytes = self.format.convert(frame.pixels());
        let stem = format!("frame_{:06}", frame.pts());
        let path = match self.format {
            PixelFormat::Passthrough => {
                let path = self.dir.join(format!("{stem}.rgb565"));
                std::fs::write(&path, bytes)?;
                path
            }
            PixelFormat::Rgb888 => {
                let path = self.dir.join(format!("{stem}.png"));
                image::RgbImage::from_raw(width, height, bytes)
                    .ok_or("Failed to create image from frame data")?
                    .save(&path)?;
                path
            }
            PixelFormat::Grayscale => {
                let path = self.dir.join(format!("{stem}.png"));
                image::GrayImage::from_raw(width, height, bytes)
                    .ok_or("Failed to create image from frame data")?
                    .save(&path)?;
                path
            }
        };
        Ok(path)
    }
}

impl FrameSink for FrameDumper {
    fn on_frame(&mut self, frame: &Frame<'_>) {
        if frame.pts() % self.every != 0 {
            return;
        }
        match self.write(frame) {
            Ok(path) => log::debug!("Wrote {}", path.display()),
            Err(e) => log::warn!("Failed to dump frame {}: {e}", frame.pts()),
        }
    }
}
