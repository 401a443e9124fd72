use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::decode::domain::jpeg_decoder::JpegDecoder;
use crate::demux::domain::frame_reader::FrameReader;
use crate::pipeline::frame_sink::FrameSink;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::session_stats::SessionCounters;
use crate::pipeline::stop_signal::StopSignal;
use crate::shared::frame::Frame;

/// Why the worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// The caller cleared the running flag.
    Stopped,
    /// The source has no more frames.
    EndOfStream,
    /// Too many consecutive failed reads.
    ErrorThreshold,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub pacing: Duration,
    pub error_threshold: u32,
}

/// What the worker hands back when it exits. The reader is only returned
/// after a caller stop, so a later start resumes where playback paused.
pub struct SchedulerParts {
    pub exit: SchedulerExit,
    pub reader: Option<Box<dyn FrameReader>>,
    pub decoder: Box<dyn JpegDecoder>,
    pub logger: Box<dyn PipelineLogger>,
}

/// Read → decode → deliver → sleep, until stopped or the stream gives out.
pub struct FrameScheduler {
    reader: Box<dyn FrameReader>,
    decoder: Box<dyn JpegDecoder>,
    sink: Box<dyn FrameSink>,
    logger: Box<dyn PipelineLogger>,
    signal: StopSignal,
    stats: Arc<SessionCounters>,
    settings: SchedulerSettings,
    pixels: Vec<u16>,
}

/// Clears the running flag however the worker leaves `run`, unwinding included.
struct ClearOnExit(StopSignal);

impl Drop for ClearOnExit {
    fn drop(&mut self) {
        self.0.clear();
    }
}

impl FrameScheduler {
    pub fn new(
        reader: Box<dyn FrameReader>,
        decoder: Box<dyn JpegDecoder>,
        sink: Box<dyn FrameSink>,
        logger: Box<dyn PipelineLogger>,
        signal: StopSignal,
        stats: Arc<SessionCounters>,
        settings: SchedulerSettings,
    ) -> Self {
        let meta = reader.metadata();
        let pixels = Vec::with_capacity(meta.width as usize * meta.height as usize);
        Self {
            reader,
            decoder,
            sink,
            logger,
            signal,
            stats,
            settings,
            pixels,
        }
    }

    pub fn run(mut self) -> SchedulerParts {
        self.logger
            .info(&format!("Playback started: {}", self.reader.metadata().source));
        let running = ClearOnExit(self.signal.clone());
        let exit = self.run_loop();
        drop(running);

        match exit {
            SchedulerExit::Stopped => self.logger.info("Playback stopped"),
            SchedulerExit::EndOfStream => self.logger.info("Playback completed"),
            SchedulerExit::ErrorThreshold => {
                log::error!("Playback aborted: stream ended after repeated read failures")
            }
        }
        self.logger.summary();

        SchedulerParts {
            exit,
            reader: (exit == SchedulerExit::Stopped).then_some(self.reader),
            decoder: self.decoder,
            logger: self.logger,
        }
    }

    fn run_loop(&mut self) -> SchedulerExit {
        let threshold = self.settings.error_threshold.max(1);
        let mut consecutive_errors: u32 = 0;
        let mut reset_granted = false;
        let mut pts = self.stats.last_pts();

        while self.signal.is_running() {
            let read_start = Instant::now();
            let read = self.reader.next_frame();
            // A stop that lands while the read blocks wins over its result.
            if !self.signal.is_running() {
                return SchedulerExit::Stopped;
            }
            match read {
                Err(e) if e.is_end_of_stream() => return SchedulerExit::EndOfStream,
                Err(e) => {
                    consecutive_errors += 1;
                    self.stats.read_failed(consecutive_errors);
                    log::warn!("Read failed ({consecutive_errors}/{threshold}): {e}");

                    if consecutive_errors >= threshold {
                        if self.reader.is_network() && !reset_granted {
                            // One more attempt on a fresh connection.
                            reset_granted = true;
                            self.stats.transport_reset();
                            log::warn!("Resetting transport after {consecutive_errors} consecutive read errors");
                            if let Err(e) = self.reader.reset_transport() {
                                log::error!("Transport reset failed: {e}");
                                return SchedulerExit::ErrorThreshold;
                            }
                        } else {
                            log::error!("Giving up after {consecutive_errors} consecutive read errors");
                            return SchedulerExit::ErrorThreshold;
                        }
                    }
                }
                Ok(jpeg) => {
                    let read_ms = read_start.elapsed().as_secs_f64() * 1000.0;
                    let frame_bytes = jpeg.len();
                    consecutive_errors = 0;
                    reset_granted = false;
                    self.stats.read_succeeded();
                    self.logger.timing("read", read_ms);
                    self.logger.metric("frame_bytes", frame_bytes as f64);

                    let decode_start = Instant::now();
                    let decoded = self.decoder.decode_into(jpeg, &mut self.pixels);
                    self.logger
                        .timing("decode", decode_start.elapsed().as_secs_f64() * 1000.0);

                    match decoded {
                        Ok((width, height)) if self.pixels.len() == width as usize * height as usize => {
                            pts += 1;
                            let sink_start = Instant::now();
                            self.sink.on_frame(&Frame::new(&self.pixels, width, height, pts));
                            self.logger
                                .timing("sink", sink_start.elapsed().as_secs_f64() * 1000.0);
                            self.stats.frame_delivered(pts);
                            self.logger.progress(pts);
                        }
                        Ok((width, height)) => {
                            self.stats.frame_dropped();
                            log::warn!(
                                "Dropping frame: decoder returned {} pixels for {width}x{height}",
                                self.pixels.len()
                            );
                        }
                        Err(e) => {
                            self.stats.frame_dropped();
                            log::warn!("Dropping undecodable {frame_bytes}-byte frame: {e}");
                        }
                    }
                }
            }

            if !self.signal.sleep(self.settings.pacing) {
                break;
            }
        }
        SchedulerExit::Stopped
    }
}
